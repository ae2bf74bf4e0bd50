//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::core::config::VaultConfig;

/// Install a `fmt` subscriber filtered by `RUST_LOG`, falling back to `filter`.
///
/// Returns `false` when a global subscriber was already installed.
pub fn init(filter: &str) -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init()
        .is_ok()
}

/// Install a subscriber using the config's log directive
pub fn init_from_config(config: &VaultConfig) -> bool {
    init(&config.log_filter)
}
