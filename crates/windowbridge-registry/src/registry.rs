//! The window registry: live windows in index-stable slots.
//!
//! An application can have several windows; some close while it runs and
//! new ones open. Removing a closed window from a `Vec` would shift every
//! later window down and break any index the application stored. Instead
//! the registry leaves an empty placeholder where the window was, and a new
//! window can later be put back into that placeholder.
//!
//! # Concurrency note
//!
//! `WindowRegistry` is a plain value with `&mut self` mutators. It is meant
//! to be owned by the single task that handles window lifecycle events (the
//! message server owns one). Sharing it across threads needs an outer
//! `Mutex`.

use crate::{RegistryError, SlotIndex, WindowSlot};

/// Dynamic, possibly sparse set of live windows.
///
/// ## Lifecycle of a slot
///
/// ```text
/// append(w) ──→ [Occupied(w)] ──release──→ [Empty] ──reuse(w2)──→ [Occupied(w2)]
///                                              ↑                       │
///                                              └───────release─────────┘
/// ```
///
/// The sequence only grows. "Available windows" are the occupied slots in
/// ascending index order, which is also the order broadcasts go out in.
#[derive(Debug, Clone)]
pub struct WindowRegistry<W> {
    slots: Vec<WindowSlot<W>>,
}

impl<W> WindowRegistry<W> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Adds `window` in a new slot at the end and returns its index.
    ///
    /// Always grows the registry, even when placeholders exist; use
    /// [`occupy`](Self::occupy) to fill a placeholder first.
    pub fn append(&mut self, window: W) -> SlotIndex {
        self.slots.push(WindowSlot::Occupied(window));
        let index = SlotIndex(self.slots.len() - 1);
        tracing::debug!(%index, "window appended");
        index
    }

    /// The window in the lowest occupied slot, or `None` if there is no
    /// live window.
    pub fn get_first_available_window(&self) -> Option<&W> {
        self.slots.iter().find_map(WindowSlot::window)
    }

    /// Every live window, in ascending slot order.
    pub fn get_all_available_windows(&self) -> Vec<&W> {
        self.slots.iter().filter_map(WindowSlot::window).collect()
    }

    /// Index of the lowest empty slot, or `None` if every slot is
    /// occupied.
    pub fn get_first_available_placeholder_index(&self) -> Option<SlotIndex> {
        self.slots
            .iter()
            .position(WindowSlot::is_empty)
            .map(SlotIndex)
    }

    /// Empties the slot at `index`.
    ///
    /// # Errors
    /// - [`RegistryError::InvalidState`] if the slot is already empty
    /// - [`RegistryError::UnknownSlot`] if `index` was never handed out
    pub fn release(&mut self, index: SlotIndex) -> Result<W, RegistryError> {
        let slot = self
            .slots
            .get_mut(index.0)
            .ok_or(RegistryError::UnknownSlot(index))?;

        match std::mem::replace(slot, WindowSlot::Empty) {
            WindowSlot::Occupied(window) => {
                tracing::debug!(%index, "window released");
                Ok(window)
            }
            WindowSlot::Empty => Err(RegistryError::InvalidState {
                index,
                reason: "slot is already empty",
            }),
        }
    }

    /// Puts `window` into the empty slot at `index`.
    ///
    /// # Errors
    /// - [`RegistryError::InvalidState`] if the slot is occupied
    /// - [`RegistryError::UnknownSlot`] if `index` was never handed out
    pub fn reuse(
        &mut self,
        index: SlotIndex,
        window: W,
    ) -> Result<(), RegistryError> {
        let slot = self
            .slots
            .get_mut(index.0)
            .ok_or(RegistryError::UnknownSlot(index))?;

        if slot.is_occupied() {
            return Err(RegistryError::InvalidState {
                index,
                reason: "slot is occupied",
            });
        }
        *slot = WindowSlot::Occupied(window);
        tracing::debug!(%index, "window placed in reused slot");
        Ok(())
    }

    /// Places `window` in the first placeholder if there is one, else
    /// appends it. Returns the slot it ended up in.
    pub fn occupy(&mut self, window: W) -> SlotIndex {
        match self.get_first_available_placeholder_index() {
            Some(index) => {
                self.slots[index.0] = WindowSlot::Occupied(window);
                tracing::debug!(%index, "window placed in reused slot");
                index
            }
            None => self.append(window),
        }
    }

    /// The window at `index`, if that slot exists and is occupied.
    pub fn get(&self, index: SlotIndex) -> Option<&W> {
        self.slots.get(index.0).and_then(WindowSlot::window)
    }

    /// The slot at `index`, if it exists.
    pub fn slot(&self, index: SlotIndex) -> Option<&WindowSlot<W>> {
        self.slots.get(index.0)
    }

    /// Live windows with their indices, ascending.
    pub fn iter_available(&self) -> impl Iterator<Item = (SlotIndex, &W)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.window().map(|w| (SlotIndex(i), w)))
    }

    /// Number of slots, empty ones included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no slot was ever created.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of occupied slots.
    pub fn available_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_occupied()).count()
    }
}

impl<W: PartialEq> WindowRegistry<W> {
    /// Index of the lowest slot holding `window`.
    pub fn position(&self, window: &W) -> Option<SlotIndex> {
        self.iter_available()
            .find(|(_, w)| *w == window)
            .map(|(index, _)| index)
    }
}

impl<W> Default for WindowRegistry<W> {
    fn default() -> Self {
        Self::new()
    }
}
