//! `MessageServer`: the backend-side façade.
//!
//! Ties together the three things the backend needs to reach its windows:
//!
//! ```text
//! WindowRegistry ──(live windows)──→ WindowResolver ──(channels)──→ BackendTransport
//! ```
//!
//! and turns every inbound message into a local event named after the
//! message.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use windowbridge_event::{EventEmitter, ListenerId};
use windowbridge_protocol::{
    is_reserved_name, ActionMessage, BackendError, CannedMessage,
    ErrorMessage, NoticeMessage,
};
use windowbridge_registry::{WindowRegistry, WindowResolver};
use windowbridge_transport::{BackendInbound, BackendTransport};

/// Payload of a local event raised for an inbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendEvent<C> {
    /// Channel the message came in on. Pass it back to
    /// [`MessageServer::send`] to reply, or to
    /// [`MessageServer::window_by_sender`] to find the window.
    pub sender: C,
    pub data: Value,
}

/// Outcome of a fan-out send.
///
/// Every target is attempted even if an earlier one failed; failures are
/// collected here rather than aborting the batch.
#[derive(Debug)]
pub struct Fanout<C, E> {
    /// Targets the transport accepted.
    pub delivered: usize,
    /// Targets the transport rejected, with the transport's error.
    pub failures: Vec<(C, E)>,
}

impl<C, E> Fanout<C, E> {
    fn new() -> Self {
        Self {
            delivered: 0,
            failures: Vec::new(),
        }
    }

    /// Number of transport writes performed.
    pub fn attempted(&self) -> usize {
        self.delivered + self.failures.len()
    }

    /// Returns `true` if no target failed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Builder for a [`MessageServer`].
///
/// # Example
///
/// ```rust,ignore
/// let mut registry = WindowRegistry::new();
/// registry.append(main_window);
///
/// let server = MessageServerBuilder::new()
///     .registry(registry)
///     .build(resolver, transport);
/// ```
pub struct MessageServerBuilder<W> {
    registry: WindowRegistry<W>,
}

impl<W> MessageServerBuilder<W> {
    /// Starts with an empty registry.
    pub fn new() -> Self {
        Self {
            registry: WindowRegistry::new(),
        }
    }

    /// Uses an already populated registry.
    pub fn registry(mut self, registry: WindowRegistry<W>) -> Self {
        self.registry = registry;
        self
    }

    /// Builds the server and subscribes it to `transport`.
    pub fn build<T, R>(self, resolver: R, transport: Arc<T>) -> MessageServer<T, R>
    where
        T: BackendTransport,
        R: WindowResolver<Window = W, Channel = T::Channel>,
    {
        MessageServer::new(self.registry, resolver, transport)
    }
}

impl<W> Default for MessageServerBuilder<W> {
    fn default() -> Self {
        Self::new()
    }
}

/// Backend-side message server.
///
/// Owns the window registry and the resolver, shares the transport. It
/// keeps no other state: nothing is buffered, retried or acknowledged. Each
/// send is exactly one `transport.send` per resolved target, and a
/// transport error comes back to the caller as is.
///
/// Dropping the server unsubscribes it from the transport.
pub struct MessageServer<T, R>
where
    T: BackendTransport,
    R: WindowResolver<Channel = T::Channel>,
{
    registry: WindowRegistry<R::Window>,
    resolver: R,
    transport: Arc<T>,
    events: Arc<EventEmitter<BackendEvent<T::Channel>>>,
    subscription: ListenerId,
}

impl<T, R> MessageServer<T, R>
where
    T: BackendTransport,
    R: WindowResolver<Channel = T::Channel>,
{
    /// Creates a server and starts re-dispatching the transport's inbound
    /// messages as local events.
    pub fn new(
        registry: WindowRegistry<R::Window>,
        resolver: R,
        transport: Arc<T>,
    ) -> Self {
        let events = Arc::new(EventEmitter::new());
        let sink = Arc::clone(&events);
        let subscription = transport.message_received().subscribe(
            move |msg: &BackendInbound<T::Channel>| {
                let event = BackendEvent {
                    sender: msg.sender.clone(),
                    data: msg.data.clone(),
                };
                let listeners = sink.dispatch(&msg.name, &event);
                tracing::trace!(
                    name = %msg.name,
                    sender = ?msg.sender,
                    listeners,
                    "inbound message dispatched"
                );
            },
        );

        Self {
            registry,
            resolver,
            transport,
            events,
            subscription,
        }
    }

    // -- Accessors ----------------------------------------------------------

    pub fn registry(&self) -> &WindowRegistry<R::Window> {
        &self.registry
    }

    /// Mutable access for opening and closing windows.
    pub fn registry_mut(&mut self) -> &mut WindowRegistry<R::Window> {
        &mut self.registry
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// The window behind `channel`, if the resolver knows one.
    pub fn window_by_sender(&self, channel: &T::Channel) -> Option<R::Window> {
        self.resolver.window_by_sender(channel)
    }

    // -- Local events ------------------------------------------------------

    /// Subscribes to inbound messages named `name`.
    pub fn on<F>(&self, name: impl Into<String>, listener: F) -> ListenerId
    where
        F: Fn(&BackendEvent<T::Channel>) + Send + Sync + 'static,
    {
        self.events.on(name, listener)
    }

    /// Unsubscribes a listener registered with [`on`](Self::on).
    pub fn off(&self, name: &str, id: ListenerId) -> bool {
        self.events.off(name, id)
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.events.listener_count(name)
    }

    // -- Unicast -------------------------------------------------------------

    /// Sends one envelope to `channel`.
    ///
    /// The channel is not checked for liveness; a stale handle fails however
    /// the transport says it fails.
    ///
    /// `name` should not be one of the reserved canned names; use the
    /// `send_backend_*` methods for those. A reserved name is still sent,
    /// with a warning logged.
    pub fn send(
        &self,
        channel: &T::Channel,
        name: &str,
        data: &Value,
    ) -> Result<(), T::Error> {
        warn_if_reserved(name);
        self.write(channel, name, data)
    }

    /// Sends one envelope to the channel currently behind `window`.
    ///
    /// Returns `Ok(false)` without touching the transport if the window
    /// has no channel (it closed). A closed window is not an error for the
    /// sender.
    pub fn send_by_window(
        &self,
        window: &R::Window,
        name: &str,
        data: &Value,
    ) -> Result<bool, T::Error> {
        warn_if_reserved(name);
        self.write_by_window(window, name, data)
    }

    /// Looks the window up by id, then behaves like
    /// [`send_by_window`](Self::send_by_window).
    pub fn send_by_window_id(
        &self,
        id: &R::WindowId,
        name: &str,
        data: &Value,
    ) -> Result<bool, T::Error> {
        warn_if_reserved(name);
        match self.resolver.window_by_id(id) {
            Some(window) => self.write_by_window(&window, name, data),
            None => {
                tracing::debug!(name, "unknown window id, send skipped");
                Ok(false)
            }
        }
    }

    // -- Fan-out -------------------------------------------------------------

    /// Sends one envelope to each channel, in iteration order.
    pub fn send_multiple<I>(
        &self,
        channels: I,
        name: &str,
        data: &Value,
    ) -> Fanout<T::Channel, T::Error>
    where
        I: IntoIterator<Item = T::Channel>,
    {
        warn_if_reserved(name);
        self.write_multiple(channels, name, data)
    }

    /// Sends one envelope to every live window that resolves to a channel,
    /// in registry slot order.
    pub fn broadcast(
        &self,
        name: &str,
        data: &Value,
    ) -> Fanout<T::Channel, T::Error> {
        warn_if_reserved(name);
        self.write_multiple(self.resolve_available(), name, data)
    }

    /// Like [`broadcast`](Self::broadcast), but skips every resolved channel
    /// equal to `excluded`. The comparison is on channels, not windows.
    pub fn broadcast_except(
        &self,
        excluded: &T::Channel,
        name: &str,
        data: &Value,
    ) -> Fanout<T::Channel, T::Error> {
        warn_if_reserved(name);
        let targets = self
            .resolve_available()
            .into_iter()
            .filter(|channel| channel != excluded);
        self.write_multiple(targets, name, data)
    }

    // -- Transport writes ----------------------------------------------------
    //
    // The public sends above check the name once and then come here; the
    // canned sends come here directly.

    fn write(
        &self,
        channel: &T::Channel,
        name: &str,
        data: &Value,
    ) -> Result<(), T::Error> {
        self.transport.send(channel, name, data)
    }

    fn write_by_window(
        &self,
        window: &R::Window,
        name: &str,
        data: &Value,
    ) -> Result<bool, T::Error> {
        match self.resolver.sender_by_window(window) {
            Some(channel) => self.write(&channel, name, data).map(|()| true),
            None => {
                tracing::debug!(name, "window has no channel, send skipped");
                Ok(false)
            }
        }
    }

    fn write_multiple<I>(
        &self,
        channels: I,
        name: &str,
        data: &Value,
    ) -> Fanout<T::Channel, T::Error>
    where
        I: IntoIterator<Item = T::Channel>,
    {
        let mut fanout = Fanout::new();
        for channel in channels {
            match self.write(&channel, name, data) {
                Ok(()) => fanout.delivered += 1,
                Err(e) => {
                    tracing::debug!(
                        name,
                        channel = ?channel,
                        error = %e,
                        "fan-out target failed"
                    );
                    fanout.failures.push((channel, e));
                }
            }
        }
        fanout
    }

    fn resolve_available(&self) -> Vec<T::Channel> {
        self.registry
            .iter_available()
            .filter_map(|(index, window)| {
                let channel = self.resolver.sender_by_window(window);
                if channel.is_none() {
                    tracing::debug!(%index, "window has no channel, skipped");
                }
                channel
            })
            .collect()
    }

    // -- Canned messages -----------------------------------------------------

    /// Sends any canned message to `channel`.
    pub fn send_canned<M: CannedMessage>(
        &self,
        channel: &T::Channel,
        message: &M,
    ) -> Result<(), T::Error> {
        self.write(channel, M::NAME, &message.to_data())
    }

    /// Sends any canned message to the channel behind `window`.
    pub fn send_canned_by_window<M: CannedMessage>(
        &self,
        window: &R::Window,
        message: &M,
    ) -> Result<bool, T::Error> {
        self.write_by_window(window, M::NAME, &message.to_data())
    }

    /// Sends a `backendActionMessage` prompt.
    ///
    /// Build the message with [`ActionMessage::new`]; it defaults to no
    /// actions and no auto-hide.
    pub fn send_backend_action_message(
        &self,
        channel: &T::Channel,
        message: &ActionMessage,
    ) -> Result<(), T::Error> {
        self.send_canned(channel, message)
    }

    pub fn send_backend_action_message_by_window(
        &self,
        window: &R::Window,
        message: &ActionMessage,
    ) -> Result<bool, T::Error> {
        self.send_canned_by_window(window, message)
    }

    /// Sends a `backendNoticeMessage`. [`NoticeMessage::new`] leaves `hide`
    /// at `false`.
    pub fn send_backend_notice_message(
        &self,
        channel: &T::Channel,
        notice: &NoticeMessage,
    ) -> Result<(), T::Error> {
        self.send_canned(channel, notice)
    }

    pub fn send_backend_notice_message_by_window(
        &self,
        window: &R::Window,
        notice: &NoticeMessage,
    ) -> Result<bool, T::Error> {
        self.send_canned_by_window(window, notice)
    }

    /// Sends a `backendErrorMessage` carrying `backend_error`.
    pub fn send_backend_error_message(
        &self,
        channel: &T::Channel,
        backend_error: &BackendError,
    ) -> Result<(), T::Error> {
        self.send_canned(channel, &ErrorMessage::new(backend_error.clone()))
    }

    pub fn send_backend_error_message_by_window(
        &self,
        window: &R::Window,
        backend_error: &BackendError,
    ) -> Result<bool, T::Error> {
        self.send_canned_by_window(
            window,
            &ErrorMessage::new(backend_error.clone()),
        )
    }
}

/// Logs a warning when application code sends under a canned name.
///
/// Windows parse those names as canned shapes, so an application payload
/// sent under one would reach the wrong listener.
pub(crate) fn warn_if_reserved(name: &str) {
    if is_reserved_name(name) {
        tracing::warn!(name, "application message uses a reserved name");
    }
}

impl<T, R> Drop for MessageServer<T, R>
where
    T: BackendTransport,
    R: WindowResolver<Channel = T::Channel>,
{
    fn drop(&mut self) {
        self.transport
            .message_received()
            .unsubscribe(self.subscription);
    }
}

impl<T, R> fmt::Debug for MessageServer<T, R>
where
    T: BackendTransport,
    R: WindowResolver<Channel = T::Channel>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageServer")
            .field("slots", &self.registry.len())
            .field("available", &self.registry.available_count())
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fanout_counts() {
        let mut fanout = Fanout::<u8, &str>::new();
        assert!(fanout.is_complete());
        assert_eq!(fanout.attempted(), 0);

        fanout.delivered = 2;
        fanout.failures.push((3, "closed"));

        assert!(!fanout.is_complete());
        assert_eq!(fanout.attempted(), 3);
    }
}
