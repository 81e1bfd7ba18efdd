//! Codec trait and the JSON codec.
//!
//! windowbridge itself never needs bytes: the server and client hand
//! envelopes to a transport and let the transport decide how they travel.
//! Transports that *do* move bytes (a pipe, a socket, the in-memory
//! transport) use a [`Codec`] to frame envelopes.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes values to bytes and decodes them back.
///
/// A transport holds one codec and runs every outbound [`Envelope`] through
/// [`encode`](Codec::encode) before queueing it, and every inbound frame
/// through [`decode`](Codec::decode) before raising `messageReceived`.
/// Swapping the codec changes the wire format without touching the
/// message server or client.
///
/// ## Trait bounds explained
///
/// - `Send + Sync`: the transport that owns the codec sits behind an
///   `Arc` and is reached from whichever tokio worker runs the send or
///   delivery, so the codec must be shareable across threads.
/// - `'static`: a codec owns its configuration outright and borrows
///   nothing, which lets it be stored in long-lived transports and moved
///   into spawned tasks.
///
/// ## Generic methods
///
/// Both methods are generic over the value type rather than fixed to
/// [`Envelope`], so the same codec can frame canned message payloads or a
/// transport's own control records:
///
/// - `encode<T: Serialize>` accepts anything serde can write out;
/// - `decode<T: DeserializeOwned>` produces anything serde can build.
///
/// `DeserializeOwned` instead of `Deserialize<'de>` means the decoded
/// value holds no borrows into `data`. Frames are dropped as soon as they
/// are decoded, so borrowed output would not outlive its buffer anyway.
///
/// [`Envelope`]: crate::Envelope
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if the value can't be represented.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed or
    /// don't match `T`.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

/// A [`Codec`] using JSON via `serde_json`.
///
/// JSON keeps frames readable in logs and in browser devtools, which is
/// what a window-facing channel usually wants. Payloads are already
/// `serde_json::Value`s, so encoding never has to convert between data
/// models.
///
/// The cost is size and speed: numbers and field names travel as text,
/// and binary data has to be embedded as strings or arrays. A binary codec
/// can be slotted in through [`Codec`] if a transport ever needs one.
///
/// `JsonCodec` is a unit struct with no state, so it is `Copy` and every
/// transport can keep its own.
///
/// ```rust
/// use windowbridge_protocol::{Codec, Envelope, JsonCodec};
///
/// let codec = JsonCodec;
/// let env = Envelope::new("greet", serde_json::json!({ "x": 1 }));
///
/// let bytes = codec.encode(&env).unwrap();
/// let decoded: Envelope = codec.decode(&bytes).unwrap();
/// assert_eq!(env, decoded);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
