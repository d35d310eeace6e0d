//! Event loop gluing the HTTP transport to the controller.
//!
//! The controller stays single-threaded: spawned request tasks only ever
//! talk to it through the delivery channel, and [`SessionDriver`] applies
//! those deliveries one at a time on the caller's task.

use tokio::sync::mpsc::{self, UnboundedReceiver};

use wylab_core::{CompileFlags, RequestId};
use wylab_session::{Controller, Delivery, ExecutionSink, SessionStatus, TextWidget};
use wylab_storage::{KeyValueStore, SessionStore};

use crate::config::ClientConfig;
use crate::error::DriverError;
use crate::http::HttpTransport;

pub struct SessionDriver<W, S, X> {
    controller: Controller<W, S, HttpTransport, X>,
    deliveries: UnboundedReceiver<(RequestId, Delivery)>,
}

impl<W, S, X> SessionDriver<W, S, X>
where
    W: TextWidget,
    S: KeyValueStore,
    X: ExecutionSink,
{
    /// Restores the session and connects it to the configured service.
    pub fn connect(
        config: &ClientConfig,
        widget: W,
        store: SessionStore<S>,
        sink: X,
    ) -> Result<Self, DriverError> {
        let (sender, deliveries) = mpsc::unbounded_channel();
        let transport = HttpTransport::new(config, sender)?;
        tracing::debug!(endpoint = transport.endpoint(), "session transport ready");

        Ok(SessionDriver {
            controller: Controller::restore_on_startup(widget, store, transport, sink),
            deliveries,
        })
    }

    pub fn controller(&self) -> &Controller<W, S, HttpTransport, X> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut Controller<W, S, HttpTransport, X> {
        &mut self.controller
    }

    /// Waits for the next delivery and applies it, returning the request it
    /// belonged to. Stale deliveries are applied too (and dropped by the
    /// controller).
    pub async fn pump(&mut self) -> Option<RequestId> {
        let (id, delivery) = self.deliveries.recv().await?;
        self.controller.deliver(id, delivery);
        Some(id)
    }

    /// Submits the document and waits until that submission resolves.
    ///
    /// Deliveries for older requests that arrive meanwhile are applied (and
    /// ignored). If the request fails in transport the controller stays
    /// pending and the failure is returned.
    pub async fn compile(&mut self, flags: CompileFlags) -> Result<SessionStatus, DriverError> {
        let id = self.controller.submit(flags);

        loop {
            let Some((delivered, delivery)) = self.deliveries.recv().await else {
                return Err(wylab_session::TransportError::Closed.into());
            };

            if delivered == id {
                if let Delivery::Failed(err) = &delivery {
                    let err = err.clone();
                    self.controller.deliver(delivered, delivery);
                    return Err(err.into());
                }
                self.controller.deliver(delivered, delivery);
                return Ok(self.controller.status());
            }

            self.controller.deliver(delivered, delivery);
        }
    }
}
