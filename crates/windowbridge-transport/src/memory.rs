//! In-process transport over tokio unbounded channels.
//!
//! One [`MemoryBackend`] hands out a [`MemoryClient`] per window via
//! [`connect`](MemoryBackend::connect). Envelopes travel as
//! `JsonCodec`-encoded frames, so what crosses the channel is exactly what a
//! real byte-oriented transport would carry.
//!
//! Sending never blocks: frames are queued. Delivery is explicit. Each side
//! raises `messageReceived` only when the embedding code calls `pump()`
//! (drain everything queued, synchronously) or awaits `deliver_next()`
//! (wait for one frame). Frames from one channel are delivered in the order
//! they were sent.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::mpsc;
use windowbridge_protocol::{Codec, Envelope, JsonCodec, ProtocolError};

use crate::{
    BackendInbound, BackendTransport, ChannelId, ClientInbound,
    ClientTransport, MessageReceived, TransportError,
};

type Frame = Vec<u8>;

/// Settings for the memory transport.
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Largest encoded envelope `send` accepts, in bytes.
    ///
    /// Default: 1 MiB.
    pub max_frame_len: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_frame_len: 1024 * 1024,
        }
    }
}

/// Frames an outbound envelope.
///
/// The name is checked here, on the sending side, so a bad envelope is an
/// `Err` from `send` instead of a frame the receiver silently drops.
fn encode_frame(
    config: &MemoryConfig,
    name: &str,
    data: &Value,
) -> Result<Frame, TransportError> {
    let envelope = Envelope::new(name, data.clone());
    envelope.validate()?;
    let frame = JsonCodec.encode(&envelope)?;
    if frame.len() > config.max_frame_len {
        return Err(ProtocolError::InvalidMessage(format!(
            "frame of {} bytes exceeds limit of {}",
            frame.len(),
            config.max_frame_len
        ))
        .into());
    }
    Ok(frame)
}

/// Inverse of [`encode_frame`]. Frames built by `encode_frame` always pass
/// validation; the check only matters for hand-made frames.
fn decode_frame(frame: &[u8]) -> Result<Envelope, ProtocolError> {
    let envelope: Envelope = JsonCodec.decode(frame)?;
    envelope.validate()?;
    Ok(envelope)
}

// ---------------------------------------------------------------------------
// MemoryBackend
// ---------------------------------------------------------------------------

/// Backend end of the memory transport.
///
/// ## Lifetime of a channel
///
/// ```text
/// connect() ──→ [live] ──client dropped──→ [closed] ──connect()/channels()──→ forgotten
///                  │                           │
///               send: Ok                  send: ChannelClosed      send: UnknownChannel
/// ```
///
/// A closed channel stays in the outbound map until the next `connect` or
/// `channels` call prunes it, so the first send after a window goes away
/// reports `ChannelClosed` rather than `UnknownChannel`.
///
/// ## Why two mutex kinds
///
/// `outbound` is a `std::sync::Mutex`: it is only held for a map lookup
/// and never across an `.await`. `inbound_rx` is a `tokio::sync::Mutex`
/// because [`deliver_next`](Self::deliver_next) holds it while waiting for
/// a frame.
pub struct MemoryBackend {
    config: MemoryConfig,
    next_channel_id: AtomicU64,
    /// Per-window queues, keyed by the channel the window was given.
    outbound: Mutex<HashMap<ChannelId, mpsc::UnboundedSender<Frame>>>,
    /// Shared queue every window writes into; tagged with the sender.
    inbound_tx: mpsc::UnboundedSender<(ChannelId, Frame)>,
    inbound_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<(ChannelId, Frame)>>,
    received: MessageReceived<BackendInbound<ChannelId>>,
}

impl MemoryBackend {
    pub fn new(config: MemoryConfig) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        Self {
            config,
            next_channel_id: AtomicU64::new(1),
            outbound: Mutex::new(HashMap::new()),
            inbound_tx,
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            received: MessageReceived::new(),
        }
    }

    /// Locks the outbound map after forgetting every channel whose
    /// `MemoryClient` was dropped.
    fn live_outbound(
        &self,
    ) -> MutexGuard<'_, HashMap<ChannelId, mpsc::UnboundedSender<Frame>>> {
        let mut outbound = self
            .outbound
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        outbound.retain(|id, tx| {
            let closed = tx.is_closed();
            if closed {
                tracing::debug!(%id, "memory channel closed by client");
            }
            !closed
        });
        outbound
    }

    /// Opens a channel for a new window and returns the window's end.
    ///
    /// Channels whose client was dropped are forgotten here, so the
    /// backend's bookkeeping stays bounded by the number of live windows
    /// no matter how many windows open and close.
    pub fn connect(&self) -> MemoryClient {
        let id = ChannelId::new(
            self.next_channel_id.fetch_add(1, Ordering::Relaxed),
        );
        let (tx, rx) = mpsc::unbounded_channel();
        self.live_outbound().insert(id, tx);
        tracing::debug!(%id, "memory channel connected");

        MemoryClient {
            id,
            config: self.config.clone(),
            to_backend: self.inbound_tx.clone(),
            from_backend: tokio::sync::Mutex::new(rx),
            received: MessageReceived::new(),
        }
    }

    /// Closes a channel from the backend side. The window's pending
    /// deliveries are still readable; after that it sees `Disconnected`.
    ///
    /// Returns `false` if the channel was not open.
    pub fn disconnect(&self, id: ChannelId) -> bool {
        let removed = self
            .outbound
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some();
        if removed {
            tracing::debug!(%id, "memory channel disconnected");
        }
        removed
    }

    /// Currently open channels, ascending. Channels whose client was
    /// dropped are not listed.
    pub fn channels(&self) -> Vec<ChannelId> {
        let mut ids: Vec<ChannelId> = self
            .live_outbound()
            .keys()
            .copied()
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Delivers every queued inbound frame and returns how many were
    /// raised as `messageReceived`.
    ///
    /// Returns 0 without delivering if another delivery is already in
    /// progress (e.g. `pump` called from inside a listener).
    pub fn pump(&self) -> usize {
        let Ok(mut rx) = self.inbound_rx.try_lock() else {
            return 0;
        };
        let mut delivered = 0;
        while let Ok((id, frame)) = rx.try_recv() {
            if self.deliver(id, &frame) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Waits for the next inbound frame and delivers it.
    ///
    /// Frames that are dropped (closed channel, undecodable) still count
    /// as "the next frame"; the call returns `Ok(())` after them too.
    ///
    /// The backend keeps its own handle on the inbound queue so that
    /// `connect` can always hand out a new sender. The queue therefore
    /// never closes: with no window connected this waits until one
    /// connects and sends. Wrap it in `tokio::time::timeout` or a
    /// `select!` to stop waiting.
    pub async fn deliver_next(&self) -> Result<(), TransportError> {
        let mut rx = self.inbound_rx.lock().await;
        // `recv` only yields `None` once every sender is gone, and
        // `self.inbound_tx` is one of them.
        let (id, frame) = rx.recv().await.ok_or(TransportError::Disconnected)?;
        self.deliver(id, &frame);
        Ok(())
    }

    fn deliver(&self, id: ChannelId, frame: &[u8]) -> bool {
        let open = self
            .outbound
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id);
        if !open {
            tracing::debug!(%id, "dropping frame from disconnected channel");
            return false;
        }

        let envelope = match decode_frame(frame) {
            Ok(env) => env,
            Err(e) => {
                tracing::warn!(%id, error = %e, "failed to decode frame");
                return false;
            }
        };

        self.received.raise(&BackendInbound {
            sender: id,
            name: envelope.name,
            data: envelope.data,
        });
        true
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new(MemoryConfig::default())
    }
}

impl BackendTransport for MemoryBackend {
    type Channel = ChannelId;
    type Error = TransportError;

    fn send(
        &self,
        channel: &ChannelId,
        name: &str,
        data: &Value,
    ) -> Result<(), TransportError> {
        let frame = encode_frame(&self.config, name, data)?;

        let mut outbound = self
            .outbound
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let tx = outbound
            .get(channel)
            .ok_or(TransportError::UnknownChannel(*channel))?;

        if tx.send(frame).is_err() {
            // The window dropped its end; forget the channel so later
            // sends report it as unknown.
            outbound.remove(channel);
            tracing::warn!(id = %channel, name, "send to closed channel");
            return Err(TransportError::ChannelClosed(*channel));
        }
        Ok(())
    }

    fn message_received(&self) -> &MessageReceived<BackendInbound<ChannelId>> {
        &self.received
    }
}

// ---------------------------------------------------------------------------
// MemoryClient
// ---------------------------------------------------------------------------

/// Window end of the memory transport. Dropping it (or calling
/// [`close`](Self::close)) closes the channel.
pub struct MemoryClient {
    id: ChannelId,
    config: MemoryConfig,
    to_backend: mpsc::UnboundedSender<(ChannelId, Frame)>,
    from_backend: tokio::sync::Mutex<mpsc::UnboundedReceiver<Frame>>,
    received: MessageReceived<ClientInbound>,
}

impl MemoryClient {
    /// The channel id the backend knows this window by.
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Delivers every queued frame from the backend; see
    /// [`MemoryBackend::pump`].
    pub fn pump(&self) -> usize {
        let Ok(mut rx) = self.from_backend.try_lock() else {
            return 0;
        };
        let mut delivered = 0;
        while let Ok(frame) = rx.try_recv() {
            if self.deliver(&frame) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Waits for the next frame from the backend and delivers it.
    ///
    /// # Errors
    /// [`TransportError::Disconnected`] once the backend closed this
    /// channel and everything queued before that was delivered.
    pub async fn deliver_next(&self) -> Result<(), TransportError> {
        let mut rx = self.from_backend.lock().await;
        let frame = rx.recv().await.ok_or(TransportError::Disconnected)?;
        self.deliver(&frame);
        Ok(())
    }

    /// Closes the channel.
    pub fn close(self) {
        tracing::debug!(id = %self.id, "memory client closed");
    }

    fn deliver(&self, frame: &[u8]) -> bool {
        match decode_frame(frame) {
            Ok(envelope) => {
                self.received.raise(&ClientInbound {
                    name: envelope.name,
                    data: envelope.data,
                });
                true
            }
            Err(e) => {
                tracing::warn!(id = %self.id, error = %e, "failed to decode frame");
                false
            }
        }
    }
}

impl ClientTransport for MemoryClient {
    type Error = TransportError;

    fn send(&self, name: &str, data: &Value) -> Result<(), TransportError> {
        let frame = encode_frame(&self.config, name, data)?;
        self.to_backend
            .send((self.id, frame))
            .map_err(|_| TransportError::Disconnected)
    }

    fn message_received(&self) -> &MessageReceived<ClientInbound> {
        &self.received
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_connect_assigns_distinct_channel_ids() {
        let backend = MemoryBackend::default();
        let a = backend.connect();
        let b = backend.connect();

        assert_ne!(a.id(), b.id());
        assert_eq!(backend.channels(), vec![a.id(), b.id()]);
    }

    #[test]
    fn test_send_unknown_channel_returns_error() {
        let backend = MemoryBackend::default();

        let result = backend.send(&ChannelId::new(99), "x", &Value::Null);

        assert!(matches!(
            result,
            Err(TransportError::UnknownChannel(id)) if id == ChannelId::new(99)
        ));
    }

    #[test]
    fn test_send_oversized_frame_is_rejected() {
        let backend = MemoryBackend::new(MemoryConfig { max_frame_len: 16 });
        let client = backend.connect();

        let result =
            backend.send(&client.id(), "big", &json!("0123456789abcdef"));

        assert!(matches!(
            result,
            Err(TransportError::Protocol(ProtocolError::InvalidMessage(_)))
        ));
        // Nothing was queued.
        assert_eq!(client.pump(), 0);
    }

    #[test]
    fn test_disconnect_twice_returns_false() {
        let backend = MemoryBackend::default();
        let client = backend.connect();

        assert!(backend.disconnect(client.id()));
        assert!(!backend.disconnect(client.id()));
    }

    #[test]
    fn test_send_empty_name_is_rejected_before_queueing() {
        let backend = MemoryBackend::default();
        let client = backend.connect();

        let result = backend.send(&client.id(), "", &json!(1));

        assert!(matches!(
            result,
            Err(TransportError::Protocol(ProtocolError::InvalidMessage(_)))
        ));
        assert_eq!(client.pump(), 0);
    }

    #[test]
    fn test_client_send_empty_name_is_rejected() {
        let backend = MemoryBackend::default();
        let client = backend.connect();

        assert!(matches!(
            client.send("", &json!(1)),
            Err(TransportError::Protocol(ProtocolError::InvalidMessage(_)))
        ));
        assert_eq!(backend.pump(), 0);
    }

    #[test]
    fn test_dropped_clients_are_forgotten_on_connect() {
        let backend = MemoryBackend::default();
        for _ in 0..10 {
            drop(backend.connect());
        }
        let live = backend.connect();

        assert_eq!(backend.outbound.lock().unwrap().len(), 1);
        assert_eq!(backend.channels(), vec![live.id()]);
    }

    #[test]
    fn test_decode_frame_rejects_empty_name() {
        let frame = br#"{"name":"","data":null}"#;

        assert!(matches!(
            decode_frame(frame),
            Err(ProtocolError::InvalidMessage(_))
        ));
    }

    #[test]
    fn test_pump_with_nothing_queued_returns_zero() {
        let backend = MemoryBackend::default();
        assert_eq!(backend.pump(), 0);
    }
}
