//! The three canned backend → window messages.
//!
//! These are the only envelope shapes the framework itself defines. They
//! let the backend talk to the end user without every application
//! inventing its own prompt/notice/error messages:
//!
//! | Name                   | Type              | Shown as                              |
//! |------------------------|-------------------|---------------------------------------|
//! | `backendActionMessage` | [`ActionMessage`] | status-bar prompt with action buttons |
//! | `backendNoticeMessage` | [`NoticeMessage`] | popup that stays until dismissed      |
//! | `backendErrorMessage`  | [`ErrorMessage`]  | application error report              |
//!
//! Field names are camelCase on the wire (`autoHideMilliseconds`,
//! `iconClassName`, `backendError`) so browser-side code can read them
//! as plain objects.

use std::fmt;
use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::types::{
    BACKEND_ACTION_MESSAGE, BACKEND_ERROR_MESSAGE, BACKEND_NOTICE_MESSAGE,
};
use crate::{Envelope, ProtocolError};

/// A message shape with a fixed, reserved envelope name.
pub trait CannedMessage: Serialize + DeserializeOwned {
    /// The reserved envelope name.
    const NAME: &'static str;

    /// Builds the envelope `data` value.
    ///
    /// This never fails: every canned shape is made of strings, numbers,
    /// booleans and already-built JSON values.
    fn to_data(&self) -> Value;

    /// Parses an inbound `data` value back into the typed message.
    fn from_data(data: Value) -> Result<Self, ProtocolError> {
        serde_json::from_value(data).map_err(ProtocolError::Decode)
    }

    /// Wraps the message in its envelope.
    fn to_envelope(&self) -> Envelope {
        Envelope::new(Self::NAME, self.to_data())
    }
}

// ---------------------------------------------------------------------------
// BackendError
// ---------------------------------------------------------------------------

/// An application-level failure to show to the end user.
///
/// This is a plain value, not a Rust error: nothing in windowbridge
/// returns it as `Err`. The backend builds one when *its* operation failed
/// and ships it to a window inside an [`ErrorMessage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendError {
    /// Application-defined error code, e.g. `"EACCES"` or `"quota"`.
    pub code: String,

    /// Structured detail for the UI (file names, limits, ...).
    #[serde(default)]
    pub data: Value,

    /// Human-readable message.
    pub message: String,
}

impl BackendError {
    /// Creates a backend error.
    pub fn new(
        code: impl Into<String>,
        data: Value,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            data,
            message: message.into(),
        }
    }

    fn to_data(&self) -> Value {
        json!({
            "code": self.code,
            "data": self.data,
            "message": self.message,
        })
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

// ---------------------------------------------------------------------------
// ActionMessage
// ---------------------------------------------------------------------------

/// One button offered by an [`ActionMessage`].
///
/// When the user picks it, the window sends `id` and `data` back to the
/// backend in a message of the application's choosing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Identifies the action to the backend.
    pub id: String,

    /// Button label. The window falls back to `id` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Opaque payload returned with the action.
    #[serde(default)]
    pub data: Value,
}

impl Action {
    /// Creates an untitled action.
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            title: None,
            data,
        }
    }

    /// Sets the button label.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    fn to_data(&self) -> Value {
        let mut map = Map::new();
        map.insert("id".into(), Value::String(self.id.clone()));
        if let Some(title) = &self.title {
            map.insert("title".into(), Value::String(title.clone()));
        }
        map.insert("data".into(), self.data.clone());
        Value::Object(map)
    }
}

/// A prompt asking the user to pick an action, usually shown in a status
/// bar or notification corner. The user may also ignore it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionMessage {
    /// Text of the prompt.
    pub message: String,

    /// Offered actions, in display order. May be empty.
    #[serde(default)]
    pub actions: Vec<Action>,

    /// Hide the prompt after this many milliseconds. `0` means it stays
    /// until the user reacts; it does not mean "hide immediately".
    #[serde(default)]
    pub auto_hide_milliseconds: u64,
}

impl ActionMessage {
    /// Creates a prompt with no actions and no auto-hide.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            actions: Vec::new(),
            auto_hide_milliseconds: 0,
        }
    }

    /// Sets the offered actions.
    pub fn with_actions(mut self, actions: Vec<Action>) -> Self {
        self.actions = actions;
        self
    }

    /// Sets the auto-hide delay in milliseconds (`0` disables it).
    pub fn with_auto_hide_milliseconds(mut self, millis: u64) -> Self {
        self.auto_hide_milliseconds = millis;
        self
    }

    /// The auto-hide delay, or `None` when auto-hide is disabled.
    ///
    /// The delay is a hint for the window's UI; windowbridge never runs a
    /// timer for it.
    pub fn auto_hide(&self) -> Option<Duration> {
        match self.auto_hide_milliseconds {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

impl CannedMessage for ActionMessage {
    const NAME: &'static str = BACKEND_ACTION_MESSAGE;

    fn to_data(&self) -> Value {
        let actions: Vec<Value> =
            self.actions.iter().map(Action::to_data).collect();
        json!({
            "message": self.message,
            "actions": actions,
            "autoHideMilliseconds": self.auto_hide_milliseconds,
        })
    }
}

// ---------------------------------------------------------------------------
// NoticeMessage
// ---------------------------------------------------------------------------

/// A notice for something that isn't an application error but still needs
/// the user's attention (an operation couldn't be completed, a file is
/// read-only, ...). Windows typically show it as a popup that stays until
/// clicked.
///
/// A notice can later be withdrawn by sending the same notice again with
/// `hide: true`, e.g. once the user did what it asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticeMessage {
    /// Icon style, application-defined (e.g. `"icon-warn"`).
    pub icon_class_name: String,
    /// Notice title.
    pub title: String,
    /// Longer description.
    pub description: String,
    /// `true` asks the window to hide a previously shown notice.
    #[serde(default)]
    pub hide: bool,
}

impl NoticeMessage {
    /// Creates a visible notice.
    pub fn new(
        icon_class_name: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            icon_class_name: icon_class_name.into(),
            title: title.into(),
            description: description.into(),
            hide: false,
        }
    }

    /// Sets the `hide` flag.
    pub fn with_hide(mut self, hide: bool) -> Self {
        self.hide = hide;
        self
    }
}

impl CannedMessage for NoticeMessage {
    const NAME: &'static str = BACKEND_NOTICE_MESSAGE;

    fn to_data(&self) -> Value {
        json!({
            "iconClassName": self.icon_class_name,
            "title": self.title,
            "description": self.description,
            "hide": self.hide,
        })
    }
}

// ---------------------------------------------------------------------------
// ErrorMessage
// ---------------------------------------------------------------------------

/// Carries a [`BackendError`] to a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMessage {
    pub backend_error: BackendError,
}

impl ErrorMessage {
    pub fn new(backend_error: BackendError) -> Self {
        Self { backend_error }
    }
}

impl CannedMessage for ErrorMessage {
    const NAME: &'static str = BACKEND_ERROR_MESSAGE;

    fn to_data(&self) -> Value {
        json!({ "backendError": self.backend_error.to_data() })
    }
}

#[cfg(test)]
mod tests {
    //! The windows parse these shapes as plain JSON objects, so the exact
    //! field names matter more than anything else here.

    use super::*;

    // =====================================================================
    // ActionMessage
    // =====================================================================

    #[test]
    fn test_action_message_defaults_to_no_actions_and_no_auto_hide() {
        let msg = ActionMessage::new("Reload?");

        assert_eq!(
            msg.to_data(),
            json!({
                "message": "Reload?",
                "actions": [],
                "autoHideMilliseconds": 0,
            })
        );
        assert_eq!(msg.auto_hide(), None);
    }

    #[test]
    fn test_action_message_with_actions_json_format() {
        let msg = ActionMessage::new("File changed on disk")
            .with_actions(vec![
                Action::new("reload", json!({ "path": "/a" }))
                    .with_title("Reload"),
                Action::new("ignore", Value::Null),
            ])
            .with_auto_hide_milliseconds(5000);

        let data = msg.to_data();

        assert_eq!(data["actions"][0]["id"], "reload");
        assert_eq!(data["actions"][0]["title"], "Reload");
        assert_eq!(data["actions"][0]["data"]["path"], "/a");
        // An untitled action omits the key instead of sending null.
        assert!(data["actions"][1].get("title").is_none());
        assert_eq!(data["autoHideMilliseconds"], 5000);
    }

    #[test]
    fn test_action_message_to_data_matches_serde_shape() {
        // `to_data` is hand-built; it must agree with the derived
        // Serialize impl so `from_data` can read it back.
        let msg = ActionMessage::new("m")
            .with_actions(vec![Action::new("a", json!(1)).with_title("A")])
            .with_auto_hide_milliseconds(10);

        assert_eq!(msg.to_data(), serde_json::to_value(&msg).unwrap());
    }

    #[test]
    fn test_action_message_auto_hide_nonzero_is_duration() {
        let msg = ActionMessage::new("m").with_auto_hide_milliseconds(1500);
        assert_eq!(msg.auto_hide(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_action_message_from_data_fills_defaults() {
        // Older backends omitted `actions` and `autoHideMilliseconds`.
        let msg =
            ActionMessage::from_data(json!({ "message": "hi" })).unwrap();

        assert_eq!(msg, ActionMessage::new("hi"));
    }

    #[test]
    fn test_action_message_from_data_missing_message_is_decode_error() {
        let result = ActionMessage::from_data(json!({ "actions": [] }));
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_action_message_envelope_name() {
        let env = ActionMessage::new("m").to_envelope();
        assert_eq!(env.name, "backendActionMessage");
    }

    // =====================================================================
    // NoticeMessage
    // =====================================================================

    #[test]
    fn test_notice_message_hide_defaults_to_false() {
        let msg = NoticeMessage::new("icon-warn", "Title", "Desc");

        assert_eq!(
            msg.to_data(),
            json!({
                "iconClassName": "icon-warn",
                "title": "Title",
                "description": "Desc",
                "hide": false,
            })
        );
    }

    #[test]
    fn test_notice_message_with_hide() {
        let msg = NoticeMessage::new("i", "t", "d").with_hide(true);
        assert_eq!(msg.to_data()["hide"], true);
    }

    #[test]
    fn test_notice_message_from_data_without_hide() {
        let msg = NoticeMessage::from_data(json!({
            "iconClassName": "i",
            "title": "t",
            "description": "d",
        }))
        .unwrap();

        assert!(!msg.hide);
    }

    // =====================================================================
    // ErrorMessage / BackendError
    // =====================================================================

    #[test]
    fn test_error_message_json_format() {
        let err = BackendError::new(
            "EACCES",
            json!({ "path": "/etc/shadow" }),
            "permission denied",
        );
        let env = ErrorMessage::new(err).to_envelope();

        assert_eq!(env.name, "backendErrorMessage");
        assert_eq!(
            env.data,
            json!({
                "backendError": {
                    "code": "EACCES",
                    "data": { "path": "/etc/shadow" },
                    "message": "permission denied",
                }
            })
        );
    }

    #[test]
    fn test_error_message_from_data() {
        let msg = ErrorMessage::from_data(json!({
            "backendError": { "code": "x", "data": null, "message": "boom" }
        }))
        .unwrap();

        assert_eq!(msg.backend_error.code, "x");
        assert_eq!(msg.backend_error.message, "boom");
    }

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::new("quota", Value::Null, "disk full");
        assert_eq!(err.to_string(), "[quota] disk full");
    }

    #[test]
    fn test_backend_error_equality_is_by_fields() {
        let a = BackendError::new("c", json!(1), "m");
        let b = BackendError::new("c", json!(1), "m");
        let c = BackendError::new("c", json!(2), "m");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
