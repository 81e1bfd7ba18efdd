//! Log output for binaries embedding windowbridge.
//!
//! The library crates only emit `tracing` events. Installing a subscriber
//! is left to the final binary, which can call [`init_tracing`] or set up
//! its own.

use tracing_subscriber::EnvFilter;

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive` (e.g. `"windowbridge=debug"`) when it is unset or
/// unparsable.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_second_call_returns_false() {
        // Tests share a process; whichever call comes first may win, but
        // the second one can never succeed.
        init_tracing("warn");
        assert!(!init_tracing("warn"));
    }
}
