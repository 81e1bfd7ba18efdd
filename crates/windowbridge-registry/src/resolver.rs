//! Mapping between windows and transport channels.
//!
//! Only the embedding application knows which channel currently backs a
//! window (an Electron-style shell keeps one `webContents` per window, a
//! socket server one connection per tab, ...). It exposes that knowledge
//! through [`WindowResolver`].

/// Resolves windows to channels and back.
///
/// Every lookup may come back empty: a window whose channel already closed
/// has no channel, and a channel may not belong to any window. Callers in
/// windowbridge treat `None` as "skip this target", never as an error.
/// The mapping is not assumed to be one-to-one.
///
/// # Example
///
/// ```rust
/// use std::collections::HashMap;
/// use windowbridge_registry::WindowResolver;
///
/// /// Windows are named, channels are numbers.
/// struct Table(HashMap<String, u64>);
///
/// impl WindowResolver for Table {
///     type Window = String;
///     type WindowId = String;
///     type Channel = u64;
///
///     fn sender_by_window(&self, window: &String) -> Option<u64> {
///         self.0.get(window).copied()
///     }
///
///     fn window_by_sender(&self, channel: &u64) -> Option<String> {
///         self.0
///             .iter()
///             .find(|(_, c)| *c == channel)
///             .map(|(w, _)| w.clone())
///     }
///
///     fn window_by_id(&self, id: &String) -> Option<String> {
///         self.0.contains_key(id).then(|| id.clone())
///     }
/// }
/// ```
pub trait WindowResolver: Send + Sync + 'static {
    /// Application-level window reference.
    type Window;
    /// Unique, application-defined window identifier.
    type WindowId;
    /// Transport channel handle.
    type Channel;

    /// The channel currently backing `window`, or `None` if it closed.
    fn sender_by_window(&self, window: &Self::Window) -> Option<Self::Channel>;

    /// The window currently behind `channel`, or `None`.
    fn window_by_sender(&self, channel: &Self::Channel) -> Option<Self::Window>;

    /// Looks a window up by its identifier.
    fn window_by_id(&self, id: &Self::WindowId) -> Option<Self::Window>;
}
