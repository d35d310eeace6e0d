//! The network seam between the controller and the compiler service.
//!
//! [`CompileTransport::dispatch`] must return immediately. Whatever the
//! transport later learns about the request is handed back to the
//! controller as a [`Delivery`] tagged with the same [`RequestId`]; the
//! controller alone decides whether that delivery is still current.

use thiserror::Error;

use wylab_core::{CompileRequest, CompileResult, ProtocolError, RequestId};

/// Errors where the request never produced a response.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The request could not be sent or its response could not be read.
    #[error("request failed: {0}")]
    Request(String),

    /// The configured request timeout elapsed.
    #[error("request timed out")]
    Timeout,

    /// The delivery channel closed before a response arrived.
    #[error("delivery channel closed")]
    Closed,
}

/// What a transport reports back for one request.
#[derive(Debug)]
pub enum Delivery {
    /// A response arrived, decoded or not.
    Response(Result<CompileResult, ProtocolError>),
    /// No response will arrive.
    Failed(TransportError),
}

impl Delivery {
    /// Decodes a raw response body.
    pub fn from_body(body: &str) -> Delivery {
        Delivery::Response(CompileResult::decode(body))
    }
}

/// Issues compile requests without blocking the caller.
pub trait CompileTransport {
    fn dispatch(&mut self, id: RequestId, request: CompileRequest);
}

impl<T: CompileTransport + ?Sized> CompileTransport for Box<T> {
    fn dispatch(&mut self, id: RequestId, request: CompileRequest) {
        (**self).dispatch(id, request)
    }
}
