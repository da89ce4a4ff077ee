//! Logging helper
//!
//! Used for all binaries to implement consistent logging

// Imports
use {
	std::env,
	tracing::level_filters::LevelFilter,
	tracing_subscriber::{EnvFilter, prelude::*},
};

/// Initializes logging.
///
/// The filter is read from `RUST_LOG`, defaulting to `info`, and colors
/// may be disabled by setting `RUST_LOG_COLOR` to anything other than `1`, `yes` or `true`.
pub fn init() {
	// Check if we should use colors
	let log_use_color = env::var("RUST_LOG_COLOR").map_or(true, |value| self::parse_bool(&value));

	let filter = EnvFilter::builder()
		.with_default_directive(LevelFilter::INFO.into())
		.from_env_lossy();
	let layer = tracing_subscriber::fmt::layer()
		.with_ansi(log_use_color)
		.with_filter(filter);

	// Note: Another subscriber may already be set (e.g. in tests), in which case we keep it.
	if let Err(err) = tracing_subscriber::registry().with(layer).try_init() {
		tracing::debug!(%err, "Logging was already initialized");
	}
}

/// Parses a boolean environment variable
fn parse_bool(value: &str) -> bool {
	matches!(value.trim().to_uppercase().as_str(), "1" | "YES" | "TRUE")
}
