//! Local publish/subscribe for windowbridge.
//!
//! Both ends of windowbridge turn inbound messages into *local events*
//! named after the message: a window sending `{ name: "save", ... }` makes
//! the backend dispatch a `"save"` event to whoever subscribed to it.
//! [`EventEmitter`] is the small registry of listeners behind that.
//!
//! # Dispatch semantics
//!
//! - Listeners run synchronously, in registration order.
//! - Dispatch works on a snapshot of the listener list taken when it
//!   starts. A listener may subscribe or unsubscribe (itself or others)
//!   while running; the change applies from the next dispatch on.
//! - No lock is held while listeners run, so a listener may dispatch
//!   further events on the same emitter.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Callback invoked with a borrowed payload.
pub type Listener<P> = Arc<dyn Fn(&P) + Send + Sync>;

/// Handle returned by [`EventEmitter::on`], used to unsubscribe.
///
/// Ids are unique within one emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Maps event names to ordered listener lists.
///
/// `P` is the payload type every listener on this emitter receives.
pub struct EventEmitter<P> {
    listeners: RwLock<HashMap<String, Vec<(ListenerId, Listener<P>)>>>,
    next_id: AtomicU64,
}

impl<P> EventEmitter<P> {
    /// Creates an emitter with no listeners.
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Subscribes `listener` to events named `name`.
    pub fn on<F>(&self, name: impl Into<String>, listener: F) -> ListenerId
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let name = name.into();
        tracing::trace!(%id, event = %name, "listener added");

        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name)
            .or_default()
            .push((id, Arc::new(listener)));
        id
    }

    /// Unsubscribes a listener. Returns `false` if it wasn't subscribed
    /// to `name`.
    pub fn off(&self, name: &str, id: ListenerId) -> bool {
        let mut map = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let Some(list) = map.get_mut(name) else {
            return false;
        };
        let before = list.len();
        list.retain(|(lid, _)| *lid != id);
        let removed = list.len() != before;
        if list.is_empty() {
            map.remove(name);
        }
        removed
    }

    /// Removes every listener of `name`, returning how many there were.
    pub fn remove_all(&self, name: &str) -> usize {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .map_or(0, |list| list.len())
    }

    /// Number of listeners currently subscribed to `name`.
    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map_or(0, Vec::len)
    }

    /// Names that have at least one listener, in no particular order.
    pub fn event_names(&self) -> Vec<String> {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Invokes every listener of `name` with `payload`.
    ///
    /// Returns the number of listeners invoked. An event nobody listens
    /// to is not an error; it returns 0.
    pub fn dispatch(&self, name: &str, payload: &P) -> usize {
        // Clone the Arcs out so the lock is released before any listener
        // runs.
        let snapshot: Vec<Listener<P>> = match self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            Some(list) => list.iter().map(|(_, l)| Arc::clone(l)).collect(),
            None => return 0,
        };

        for listener in &snapshot {
            listener(payload);
        }
        snapshot.len()
    }
}

impl<P> Default for EventEmitter<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for EventEmitter<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let map = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let counts: HashMap<&str, usize> =
            map.iter().map(|(k, v)| (k.as_str(), v.len())).collect();
        f.debug_struct("EventEmitter")
            .field("listeners", &counts)
            .finish()
    }
}
