//! `MessageClient`: the window-side façade.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use windowbridge_event::{EventEmitter, ListenerId};
use windowbridge_protocol::CannedMessage;
use windowbridge_transport::{ClientInbound, ClientTransport};

use crate::server::warn_if_reserved;

/// Window-side message client.
///
/// Sends go straight to the single backend peer. Every inbound message is
/// re-raised as a local event named after the message, with the message
/// data as payload. Canned messages are ordinary events under their
/// reserved names; [`on_canned`](Self::on_canned) parses them for you.
///
/// Dropping the client unsubscribes it from the transport.
pub struct MessageClient<T: ClientTransport> {
    transport: Arc<T>,
    events: Arc<EventEmitter<Value>>,
    subscription: ListenerId,
}

impl<T: ClientTransport> MessageClient<T> {
    pub fn new(transport: Arc<T>) -> Self {
        let events = Arc::new(EventEmitter::new());
        let sink = Arc::clone(&events);
        let subscription =
            transport.message_received().subscribe(move |msg: &ClientInbound| {
                let listeners = sink.dispatch(&msg.name, &msg.data);
                tracing::trace!(name = %msg.name, listeners, "inbound message dispatched");
            });

        Self {
            transport,
            events,
            subscription,
        }
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Sends one envelope to the backend.
    ///
    /// Canned names belong to backend-to-window traffic; sending one from
    /// a window logs a warning.
    pub fn send(&self, name: &str, data: &Value) -> Result<(), T::Error> {
        warn_if_reserved(name);
        self.transport.send(name, data)
    }

    /// Subscribes to inbound messages named `name`.
    pub fn on<F>(&self, name: impl Into<String>, listener: F) -> ListenerId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.events.on(name, listener)
    }

    /// Subscribes to canned message `M`, parsed from the payload.
    ///
    /// Payloads that don't parse as `M` are logged and skipped.
    pub fn on_canned<M, F>(&self, listener: F) -> ListenerId
    where
        M: CannedMessage + 'static,
        F: Fn(M) + Send + Sync + 'static,
    {
        self.events.on(M::NAME, move |data: &Value| {
            match M::from_data(data.clone()) {
                Ok(message) => listener(message),
                Err(e) => {
                    tracing::warn!(name = M::NAME, error = %e, "malformed canned message");
                }
            }
        })
    }

    pub fn off(&self, name: &str, id: ListenerId) -> bool {
        self.events.off(name, id)
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.events.listener_count(name)
    }
}

impl<T: ClientTransport> Drop for MessageClient<T> {
    fn drop(&mut self) {
        self.transport
            .message_received()
            .unsubscribe(self.subscription);
    }
}

impl<T: ClientTransport> fmt::Debug for MessageClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageClient")
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}
