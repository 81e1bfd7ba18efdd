//! Envelope shapes for windowbridge.
//!
//! This crate defines what travels between the backend and its client
//! windows, without caring how it travels:
//!
//! - **Envelope** ([`Envelope`]): the `{ name, data }` pair that every
//!   logical message is made of.
//! - **Canned messages** ([`ActionMessage`], [`NoticeMessage`],
//!   [`ErrorMessage`]): the three reserved envelope shapes the backend
//!   uses to talk to the end user, plus the [`BackendError`] value carried
//!   by the error message.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how a transport that moves
//!   bytes turns envelopes into frames and back.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (bytes / channel) → Protocol (Envelope) → Server/Client (events)
//! ```

mod canned;
mod codec;
mod error;
mod types;

pub use canned::{
    Action, ActionMessage, BackendError, CannedMessage, ErrorMessage,
    NoticeMessage,
};
pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    is_reserved_name, Envelope, BACKEND_ACTION_MESSAGE,
    BACKEND_ERROR_MESSAGE, BACKEND_NOTICE_MESSAGE, RESERVED_NAMES,
};
