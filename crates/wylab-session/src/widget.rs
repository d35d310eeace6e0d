//! The text widget capability and an in-memory implementation.
//!
//! [`TextWidget`] is the narrow surface the controller needs from an editor:
//! full-text access, a replaceable list of line/column annotations, and
//! individually removable underline markers. [`BufferWidget`] implements it
//! without any UI, for tests and for terminal hosts that render the state
//! themselves.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use wylab_core::MarkerId;

/// Severity tag carried by annotations and markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    /// Secondary locations that explain an error.
    Info,
}

/// Visual class of an underline marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MarkerClass {
    /// Underlines the span of a primary error.
    #[serde(rename = "error-message")]
    ErrorMessage,
    /// Underlines a secondary location attached to an error.
    #[serde(rename = "context-message")]
    ContextMessage,
}

impl MarkerClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerClass::ErrorMessage => "error-message",
            MarkerClass::ContextMessage => "context-message",
        }
    }
}

impl fmt::Display for MarkerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A 0-based row/column document position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub row: u32,
    pub column: u32,
}

impl Position {
    pub fn new(row: u32, column: u32) -> Self {
        Position { row, column }
    }
}

/// A half-open `[start, end)` document range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Range { start, end }
    }
}

/// A gutter annotation anchored at one position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    pub row: u32,
    pub column: u32,
    pub text: String,
    pub severity: Severity,
}

/// An underline marker as held by a widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Marker {
    pub id: MarkerId,
    pub range: Range,
    pub class: MarkerClass,
    pub severity: Severity,
}

/// Editor capability consumed by the controller and the error mapper.
pub trait TextWidget {
    /// Returns the full document text.
    fn text(&self) -> String;

    /// Replaces the full document text.
    fn set_text(&mut self, text: &str);

    /// Replaces the annotation list.
    fn set_annotations(&mut self, annotations: Vec<Annotation>);

    /// Removes every annotation.
    fn clear_annotations(&mut self);

    /// Adds an underline marker and returns a handle for later removal.
    fn add_marker(&mut self, range: Range, class: MarkerClass, severity: Severity) -> MarkerId;

    /// Removes one marker. Unknown handles are ignored.
    fn remove_marker(&mut self, marker: MarkerId);
}

/// A UI-less [`TextWidget`].
#[derive(Debug, Clone, Default)]
pub struct BufferWidget {
    text: String,
    annotations: Vec<Annotation>,
    markers: BTreeMap<MarkerId, Marker>,
    next_marker: u64,
}

impl BufferWidget {
    pub fn new() -> Self {
        BufferWidget::default()
    }

    pub fn with_text(text: &str) -> Self {
        BufferWidget {
            text: text.to_string(),
            ..BufferWidget::default()
        }
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Live markers in creation order.
    pub fn markers(&self) -> impl Iterator<Item = &Marker> {
        self.markers.values()
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }
}

impl TextWidget for BufferWidget {
    fn text(&self) -> String {
        self.text.clone()
    }

    fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }

    fn set_annotations(&mut self, annotations: Vec<Annotation>) {
        self.annotations = annotations;
    }

    fn clear_annotations(&mut self) {
        self.annotations.clear();
    }

    fn add_marker(&mut self, range: Range, class: MarkerClass, severity: Severity) -> MarkerId {
        let id = MarkerId(self.next_marker);
        self.next_marker += 1;
        self.markers.insert(
            id,
            Marker {
                id,
                range,
                class,
                severity,
            },
        );
        id
    }

    fn remove_marker(&mut self, marker: MarkerId) {
        self.markers.remove(&marker);
    }
}
