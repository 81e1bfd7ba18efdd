//! # windowbridge
//!
//! Message routing between a backend process and its client windows.
//!
//! A desktop-style application has one backend and any number of windows.
//! windowbridge keeps track of which windows are alive, maps each one to
//! the channel its messages travel on, and lets the backend address a
//! single window, a set of channels, every live window, or every live
//! window but one. Windows send to the backend and receive named events.
//!
//! The channel itself is not windowbridge's business: plug in any
//! [`BackendTransport`] / [`ClientTransport`]. The `memory` feature
//! (default) ships an in-process one.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use windowbridge::prelude::*;
//!
//! let backend = Arc::new(MemoryBackend::default());
//! let window = Arc::new(backend.connect());
//!
//! let mut server = MessageServer::new(WindowRegistry::new(), resolver, backend);
//! server.registry_mut().occupy(main_window);
//!
//! let client = MessageClient::new(window);
//! client.on_canned(|notice: NoticeMessage| println!("{}", notice.title));
//!
//! server.broadcast("themeChanged", &serde_json::json!({ "dark": true }));
//! ```

mod client;
mod error;
mod logging;
mod server;

pub use client::MessageClient;
pub use error::WindowBridgeError;
pub use logging::init_tracing;
pub use server::{BackendEvent, Fanout, MessageServer, MessageServerBuilder};

pub use windowbridge_event::{EventEmitter, ListenerId};
pub use windowbridge_protocol::{
    Action, ActionMessage, BackendError, CannedMessage, Envelope, ErrorMessage,
    NoticeMessage, ProtocolError,
};
pub use windowbridge_registry::{
    RegistryError, SlotIndex, WindowRegistry, WindowResolver, WindowSlot,
};
pub use windowbridge_transport::{
    BackendInbound, BackendTransport, ChannelId, ClientInbound, ClientTransport,
    MessageReceived, TransportError,
};
#[cfg(feature = "memory")]
pub use windowbridge_transport::{MemoryBackend, MemoryClient, MemoryConfig};

/// Everything an application usually needs, in one import.
pub mod prelude {
    pub use crate::{
        ActionMessage, BackendError, BackendEvent, BackendTransport,
        CannedMessage, ChannelId, ClientTransport, Fanout, MessageClient,
        MessageServer, MessageServerBuilder, NoticeMessage, SlotIndex,
        WindowBridgeError, WindowRegistry, WindowResolver,
    };
    #[cfg(feature = "memory")]
    pub use crate::{MemoryBackend, MemoryClient};
}
