//! Logging setup for the runner.

use log::LevelFilter;

/// Initialize `env_logger`. `RUST_LOG` overrides the default `info` level.
pub fn init() {
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format_target(false)
        .init();
}
