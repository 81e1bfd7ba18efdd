//! Window bookkeeping for windowbridge.
//!
//! This crate answers "which windows are alive right now?":
//!
//! 1. **Registry**: [`WindowRegistry`] keeps every window in a slot whose
//!    index never changes while the window lives. Closed windows leave an
//!    empty slot behind that a later window can reuse.
//! 2. **Resolution**: [`WindowResolver`] is implemented by the embedding
//!    application and maps windows to transport channels and back.
//!
//! # How it fits in the stack
//!
//! ```text
//! Message Server (above)  ← iterates live windows, resolves each to a channel
//!     ↕
//! Registry layer (this crate)
//!     ↕
//! Application (beside)  ← appends/releases slots as windows open and close
//! ```

mod error;
mod registry;
mod resolver;
mod slot;

pub use error::RegistryError;
pub use registry::WindowRegistry;
pub use resolver::WindowResolver;
pub use slot::{SlotIndex, WindowSlot};
