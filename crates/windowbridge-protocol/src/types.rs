//! The envelope: one logical message between the backend and a window.
//!
//! Every message, in either direction, is a `name` plus an arbitrary JSON
//! `data` value. The name doubles as the local event key on the receiving
//! side, so both ends have to agree on names, but the protocol layer does
//! not interpret them beyond the three reserved ones below.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Reserved names
// ---------------------------------------------------------------------------

/// Name of the canned "action prompt" message (see [`ActionMessage`](crate::ActionMessage)).
pub const BACKEND_ACTION_MESSAGE: &str = "backendActionMessage";

/// Name of the canned "notice" message (see [`NoticeMessage`](crate::NoticeMessage)).
pub const BACKEND_NOTICE_MESSAGE: &str = "backendNoticeMessage";

/// Name of the canned "error" message (see [`ErrorMessage`](crate::ErrorMessage)).
pub const BACKEND_ERROR_MESSAGE: &str = "backendErrorMessage";

/// All names owned by the framework. Application messages must not use
/// these, otherwise client-side listeners for the canned shapes would
/// receive payloads they can't parse.
pub const RESERVED_NAMES: [&str; 3] = [
    BACKEND_ACTION_MESSAGE,
    BACKEND_NOTICE_MESSAGE,
    BACKEND_ERROR_MESSAGE,
];

/// Returns `true` if `name` is one of the [`RESERVED_NAMES`].
pub fn is_reserved_name(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The `{ name, data }` pair that makes up one logical message.
///
/// ```text
/// { "name": "greet", "data": { "x": 1 } }
/// ```
///
/// `data` is a `serde_json::Value` because the payload is opaque at this
/// layer; only the application listening for `name` knows its shape.
/// A missing `data` field decodes as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Message type name, also the local event name on the receiver.
    pub name: String,

    /// Message body.
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// Creates an envelope from a name and a payload.
    pub fn new(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Checks the envelope is well formed: the name must not be empty.
    ///
    /// Transports call this before queueing a frame, so a nameless
    /// message fails at `send` rather than travelling to the other side.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.name.is_empty() {
            return Err(ProtocolError::InvalidMessage(
                "envelope name must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_json_format() {
        let env = Envelope::new("greet", json!({ "x": 1 }));
        let value = serde_json::to_value(&env).unwrap();

        assert_eq!(value, json!({ "name": "greet", "data": { "x": 1 } }));
    }

    #[test]
    fn test_envelope_missing_data_defaults_to_null() {
        // A client that sends a bare notification ("ping") with no body
        // should still decode.
        let env: Envelope = serde_json::from_str(r#"{"name":"ping"}"#).unwrap();

        assert_eq!(env.name, "ping");
        assert!(env.data.is_null());
    }

    #[test]
    fn test_envelope_missing_name_is_rejected() {
        let result: Result<Envelope, _> =
            serde_json::from_str(r#"{"data":{"x":1}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_empty_name_returns_invalid_message() {
        let env = Envelope::new("", Value::Null);

        assert!(matches!(
            env.validate(),
            Err(ProtocolError::InvalidMessage(_))
        ));
    }

    #[test]
    fn test_validate_normal_name_ok() {
        assert!(Envelope::new("save", Value::Null).validate().is_ok());
    }

    #[test]
    fn test_is_reserved_name_matches_only_canned_names() {
        assert!(is_reserved_name("backendActionMessage"));
        assert!(is_reserved_name("backendNoticeMessage"));
        assert!(is_reserved_name("backendErrorMessage"));
        assert!(!is_reserved_name("backendMessage"));
        assert!(!is_reserved_name("greet"));
    }
}
