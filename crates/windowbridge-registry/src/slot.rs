//! Slot types: one cell of the registry and its index.

use std::fmt;

/// Position of a slot in a [`WindowRegistry`](crate::WindowRegistry).
///
/// Handed out by `append` and stable for as long as the registry lives:
/// slots are never removed or renumbered, only emptied and refilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotIndex(pub usize);

impl SlotIndex {
    /// Returns the underlying `usize` value.
    pub fn into_inner(self) -> usize {
        self.0
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot-{}", self.0)
    }
}

/// One registry cell: either holds a window or is a placeholder left
/// behind by a closed one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowSlot<W> {
    /// Placeholder, free for [`reuse`](crate::WindowRegistry::reuse).
    Empty,
    /// Holds a live window.
    Occupied(W),
}

impl<W> WindowSlot<W> {
    pub fn is_empty(&self) -> bool {
        matches!(self, WindowSlot::Empty)
    }

    pub fn is_occupied(&self) -> bool {
        matches!(self, WindowSlot::Occupied(_))
    }

    /// The window in this slot, if any.
    pub fn window(&self) -> Option<&W> {
        match self {
            WindowSlot::Occupied(w) => Some(w),
            WindowSlot::Empty => None,
        }
    }
}
