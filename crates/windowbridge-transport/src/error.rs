use windowbridge_protocol::ProtocolError;

use crate::ChannelId;

/// Errors raised by the bundled in-memory transport.
///
/// Transports supplied by an application bring their own error type
/// through [`BackendTransport::Error`](crate::BackendTransport::Error)
/// and [`ClientTransport::Error`](crate::ClientTransport::Error).
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The peer behind this channel has gone away.
    #[error("channel {0} is closed")]
    ChannelClosed(ChannelId),

    /// No channel with this id was ever connected, or it was already
    /// disconnected by the backend.
    #[error("unknown channel {0}")]
    UnknownChannel(ChannelId),

    /// The client's backend is gone.
    #[error("disconnected from backend")]
    Disconnected,

    /// The envelope could not be framed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
