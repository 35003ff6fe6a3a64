//! Logging setup.
//!
//! Diagnostics go to stderr through `env_logger` before any UI painting
//! starts; nothing logs while raw mode is active.

use env_logger::Env;

/// Initialize the process-wide logger. The default filter is `warn` so
/// unresolvable optional dependencies are visible without `RUST_LOG`.
pub fn init() {
	env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
		.format_timestamp(None)
		.format_target(false)
		.init();
}
