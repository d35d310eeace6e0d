//! HTTP transport for `POST {server}/compile`.
//!
//! Each dispatch spawns one task on the tokio runtime and returns at once.
//! The task posts the request, decodes the answer, and sends a
//! [`Delivery`] tagged with the request ID down an unbounded channel. It
//! never decides staleness; the controller does that when the delivery is
//! applied.

use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;

use wylab_core::{CompileRequest, ProtocolError, RequestId};
use wylab_session::{CompileTransport, Delivery, TransportError};

use crate::config::{ClientConfig, RequestEncoding};
use crate::error::DriverError;

pub type DeliverySender = UnboundedSender<(RequestId, Delivery)>;

pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    encoding: RequestEncoding,
    deliveries: DeliverySender,
    runtime: Handle,
}

impl HttpTransport {
    /// Builds a transport on the current tokio runtime.
    pub fn new(config: &ClientConfig, deliveries: DeliverySender) -> Result<Self, DriverError> {
        let runtime = Handle::try_current()
            .map_err(|err| DriverError::Setup(format!("no tokio runtime: {}", err)))?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| DriverError::Setup(format!("failed to build HTTP client: {}", err)))?;

        Ok(HttpTransport {
            client,
            endpoint: config.compile_endpoint(),
            encoding: config.encoding,
            deliveries,
            runtime,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl CompileTransport for HttpTransport {
    fn dispatch(&mut self, id: RequestId, request: CompileRequest) {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let encoding = self.encoding;
        let deliveries = self.deliveries.clone();

        self.runtime.spawn(async move {
            let delivery = post_compile(&client, &endpoint, encoding, &request).await;
            if deliveries.send((id, delivery)).is_err() {
                tracing::debug!(request = %id, "session closed, dropping delivery");
            }
        });
    }
}

async fn post_compile(
    client: &reqwest::Client,
    endpoint: &str,
    encoding: RequestEncoding,
    request: &CompileRequest,
) -> Delivery {
    let builder = client.post(endpoint);
    let builder = match encoding {
        RequestEncoding::Form => builder.form(request),
        RequestEncoding::Json => builder.json(request),
    };

    let response = match builder.send().await {
        Ok(response) => response,
        Err(err) => return Delivery::Failed(transport_error(err)),
    };

    let status = response.status();
    let body = match response.text().await {
        Ok(body) => body,
        Err(err) => return Delivery::Failed(transport_error(err)),
    };

    if !status.is_success() {
        return Delivery::Response(Err(ProtocolError::HttpStatus {
            status: status.as_u16(),
            body,
        }));
    }

    Delivery::from_body(&body)
}

fn transport_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Request(err.to_string())
    }
}
