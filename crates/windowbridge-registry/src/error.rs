//! Error types for the registry layer.

use crate::SlotIndex;

/// Errors that can occur while mutating a [`WindowRegistry`](crate::WindowRegistry).
///
/// Both variants are programming errors in the caller: the registry never
/// produces them on its own, and they are returned immediately rather than
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The slot is not in the state the operation requires: releasing an
    /// already-empty slot, or reusing an occupied one.
    #[error("invalid state for {index}: {reason}")]
    InvalidState {
        index: SlotIndex,
        reason: &'static str,
    },

    /// The index was never handed out by this registry.
    #[error("{0} does not exist")]
    UnknownSlot(SlotIndex),
}
