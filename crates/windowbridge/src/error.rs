//! Unified error type for windowbridge.

use windowbridge_protocol::ProtocolError;
use windowbridge_registry::RegistryError;
use windowbridge_transport::TransportError;

/// Wraps the error of every windowbridge layer.
///
/// The server and client return the transport's own error from their send
/// operations. This type is for application code that mixes registry
/// updates, codec calls and memory-transport sends and wants one error
/// type for `?`.
#[derive(Debug, thiserror::Error)]
pub enum WindowBridgeError {
    /// A memory-transport error (closed or unknown channel, framing).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An encode/decode/validation error.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A registry misuse (release of an empty slot, reuse of an occupied
    /// one, unknown index).
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
