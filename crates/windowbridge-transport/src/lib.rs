//! Transport boundary for windowbridge.
//!
//! windowbridge never talks to an OS-level channel itself. The embedding
//! application supplies one [`BackendTransport`] in the backend process and
//! one [`ClientTransport`] per window, and the message server/client are
//! built on top of those two capabilities:
//!
//! - one outbound operation, `send`;
//! - one inbound notification, `messageReceived`, raised through
//!   [`MessageReceived`] whenever the underlying channel delivers data.
//!
//! The backend side addresses peers by an opaque channel handle (its
//! `Channel` associated type); the client side has a single peer and no
//! handle.
//!
//! ## Why associated types
//!
//! Each transport fixes its own channel handle and error type, so they
//! are associated types rather than generic parameters: a given transport
//! has exactly one of each, and code written against `T: BackendTransport`
//! names them as `T::Channel` and `T::Error` without threading extra type
//! parameters through the message server.
//!
//! ## Bounds on the handles
//!
//! - `Channel: Clone + PartialEq` so the server can copy a handle into a
//!   [`BackendInbound`] and compare it when excluding a sender from a
//!   broadcast. `Debug` is only there for log fields, and
//!   `Send + Sync + 'static` lets listeners capture handles. Nothing else
//!   is asked of it; the handle stays opaque.
//! - `Error: std::error::Error + Send + Sync + 'static` so transport
//!   failures can be wrapped by `thiserror` enums further up and carried
//!   across task boundaries.
//!
//! # Feature Flags
//!
//! - `memory` (default): an in-process transport over tokio channels,
//!   for tests, demos and single-process embeddings.

mod error;
#[cfg(feature = "memory")]
mod memory;

pub use error::TransportError;
#[cfg(feature = "memory")]
pub use memory::{MemoryBackend, MemoryClient, MemoryConfig};

use std::fmt;

use serde_json::Value;
use windowbridge_event::{EventEmitter, ListenerId};

/// Name of the single local event a transport raises.
pub const MESSAGE_RECEIVED: &str = "messageReceived";

/// Opaque identifier for one live channel.
///
/// Any `Clone + PartialEq` type works as a backend channel handle; this is
/// the one the memory transport hands out. Two handles are equal only if
/// they denote the same endpoint. A handle is meaningless once its
/// endpoint closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(u64);

impl ChannelId {
    /// Creates a new `ChannelId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Inbound payloads
// ---------------------------------------------------------------------------

/// A message that arrived at the backend from one of its windows.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendInbound<C> {
    /// Channel the message came in on.
    pub sender: C,
    pub name: String,
    pub data: Value,
}

/// A message that arrived at a window from the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientInbound {
    pub name: String,
    pub data: Value,
}

// ---------------------------------------------------------------------------
// MessageReceived
// ---------------------------------------------------------------------------

/// The `messageReceived` notification a transport raises.
///
/// A transport owns one of these and calls [`raise`](Self::raise) for every
/// inbound message; the message server or client subscribes to it.
pub struct MessageReceived<P> {
    emitter: EventEmitter<P>,
}

impl<P> MessageReceived<P> {
    pub fn new() -> Self {
        Self {
            emitter: EventEmitter::new(),
        }
    }

    /// Registers a callback for every inbound message.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        self.emitter.on(MESSAGE_RECEIVED, listener)
    }

    /// Removes a callback. Returns `false` if it wasn't subscribed.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.emitter.off(MESSAGE_RECEIVED, id)
    }

    /// Notifies every subscriber, returning how many were notified.
    pub fn raise(&self, payload: &P) -> usize {
        self.emitter.dispatch(MESSAGE_RECEIVED, payload)
    }

    pub fn subscriber_count(&self) -> usize {
        self.emitter.listener_count(MESSAGE_RECEIVED)
    }
}

impl<P> Default for MessageReceived<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for MessageReceived<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageReceived")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Capability traits
// ---------------------------------------------------------------------------

/// The backend process's view of the transport: many peers, each behind
/// a channel handle.
///
/// The trait itself is `Send + Sync + 'static` because the message server
/// keeps the transport in an `Arc` and its inbound subscription may fire
/// from any thread the transport delivers on.
///
/// A transport that records writes instead of moving them is enough to
/// drive a server in tests:
///
/// ```rust
/// use std::sync::Mutex;
///
/// use serde_json::{json, Value};
/// use windowbridge_transport::{
///     BackendInbound, BackendTransport, MessageReceived, TransportError,
/// };
///
/// #[derive(Default)]
/// struct Recorder {
///     sent: Mutex<Vec<(u32, String)>>,
///     received: MessageReceived<BackendInbound<u32>>,
/// }
///
/// impl BackendTransport for Recorder {
///     type Channel = u32;
///     type Error = TransportError;
///
///     fn send(&self, channel: &u32, name: &str, _data: &Value) -> Result<(), TransportError> {
///         self.sent.lock().unwrap().push((*channel, name.to_string()));
///         Ok(())
///     }
///
///     fn message_received(&self) -> &MessageReceived<BackendInbound<u32>> {
///         &self.received
///     }
/// }
///
/// let transport = Recorder::default();
/// transport.send(&7, "refresh", &json!(null)).unwrap();
/// assert_eq!(*transport.sent.lock().unwrap(), vec![(7, "refresh".to_string())]);
/// ```
pub trait BackendTransport: Send + Sync + 'static {
    /// Handle identifying one live window channel.
    type Channel: Clone + PartialEq + fmt::Debug + Send + Sync + 'static;
    /// Error returned by [`send`](Self::send). windowbridge passes it
    /// through to its callers untouched.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Writes one envelope to `channel`.
    ///
    /// What happens for a channel whose window already closed is up to the
    /// transport; the memory transport returns an error.
    fn send(
        &self,
        channel: &Self::Channel,
        name: &str,
        data: &Value,
    ) -> Result<(), Self::Error>;

    /// The inbound notification, carrying the originating channel.
    fn message_received(
        &self,
    ) -> &MessageReceived<BackendInbound<Self::Channel>>;
}

/// A window's view of the transport: exactly one peer, the backend.
pub trait ClientTransport: Send + Sync + 'static {
    /// Error returned by [`send`](Self::send).
    type Error: std::error::Error + Send + Sync + 'static;

    /// Writes one envelope to the backend.
    fn send(&self, name: &str, data: &Value) -> Result<(), Self::Error>;

    /// The inbound notification.
    fn message_received(&self) -> &MessageReceived<ClientInbound>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_channel_id_new_and_into_inner() {
        assert_eq!(ChannelId::new(42).into_inner(), 42);
    }

    #[test]
    fn test_channel_id_display() {
        assert_eq!(ChannelId::new(7).to_string(), "ch-7");
    }

    #[test]
    fn test_channel_id_equality() {
        assert_eq!(ChannelId::new(1), ChannelId::new(1));
        assert_ne!(ChannelId::new(1), ChannelId::new(2));
    }

    #[test]
    fn test_message_received_raise_reaches_every_subscriber() {
        let received = MessageReceived::<ClientInbound>::new();
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..2 {
            let hits = Arc::clone(&hits);
            received.subscribe(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }

        let n = received.raise(&ClientInbound {
            name: "greet".into(),
            data: Value::Null,
        });

        assert_eq!(n, 2);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_message_received_unsubscribe() {
        let received = MessageReceived::<ClientInbound>::new();
        let id = received.subscribe(|_| {});

        assert_eq!(received.subscriber_count(), 1);
        assert!(received.unsubscribe(id));
        assert_eq!(received.subscriber_count(), 0);
        assert!(!received.unsubscribe(id));
    }
}
