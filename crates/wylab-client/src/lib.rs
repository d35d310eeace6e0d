//! Host environment for the compile-session controller.
//!
//! Supplies the capabilities the controller is built over when it runs as a
//! native client: an HTTP [`HttpTransport`](http::HttpTransport) that posts to
//! the compiler service on the tokio runtime, a
//! [`SessionDriver`](driver::SessionDriver) that feeds deliveries back into
//! the controller one at a time, and a [`NodeSink`](node::NodeSink) that runs
//! generated artifacts.

pub mod config;
pub mod driver;
pub mod error;
pub mod http;
pub mod node;

pub use config::{ClientConfig, RequestEncoding};
pub use driver::SessionDriver;
pub use error::DriverError;
pub use http::HttpTransport;
pub use node::NodeSink;
