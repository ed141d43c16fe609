//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::{ConfigError, LogConfig, Result};

/// Builds the filter for `config`, letting `RUST_LOG` take precedence.
pub fn filter(config: &LogConfig) -> Result<EnvFilter> {
	if let Ok(filter) = EnvFilter::try_from_default_env() {
		return Ok(filter);
	}
	EnvFilter::try_new(&config.filter).map_err(|err| ConfigError::LogFilter {
		filter: config.filter.clone(),
		reason: err.to_string(),
	})
}

/// Installs a global fmt subscriber.
///
/// Returns `Ok(false)` if another subscriber was already installed, which
/// happens routinely in test binaries.
pub fn init(config: &LogConfig) -> Result<bool> {
	let filter = filter(config)?;
	Ok(tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(false)
		.try_init()
		.is_ok())
}
