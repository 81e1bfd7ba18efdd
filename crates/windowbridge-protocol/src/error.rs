//! Error types for the protocol layer.

/// Errors that can occur while encoding, decoding, or validating envelopes.
///
/// Each windowbridge crate has its own error enum, so a `ProtocolError`
/// always means "the bytes or the JSON shape were wrong", never "the
/// window went away".
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into bytes or JSON).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes or JSON into a Rust value).
    ///
    /// Typical causes: malformed JSON, a canned message missing a
    /// required field, or a field of the wrong type.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message decoded fine but breaks a protocol rule, e.g. an
    /// envelope with an empty name or a frame over the size limit.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
