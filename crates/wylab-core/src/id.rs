//! Identifier newtypes.
//!
//! Both IDs are distinct newtype wrappers over `u64`, so a `RequestId` cannot
//! be passed where a widget `MarkerId` is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one compile submission.
///
/// Issued in strictly increasing order by the controller; a response is only
/// rendered when its ID equals the most recently issued one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u64);

/// Handle to an underline marker owned by a text widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MarkerId(pub u64);

impl RequestId {
    /// The ID following this one.
    pub fn next(self) -> RequestId {
        RequestId(self.0 + 1)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
