//! Shared test helpers.

use std::sync::Once;

/// Install a fmt subscriber once per test binary. Output is opt-in
/// through `RUST_LOG`.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}
