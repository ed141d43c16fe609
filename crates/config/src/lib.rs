//! Configuration for the Trellis bridge.
//!
//! Configuration is written in TOML. Every section and key is optional; a
//! missing value falls back to the default shown below.
//!
//! ```toml
//! [ids]
//! prefix = "$"
//!
//! [batch]
//! max_len = 0          # 0 flushes only at processing points and before get/call
//! merge_sets = true
//!
//! [diagnostics]
//! history = 32
//!
//! [log]
//! filter = "warn"
//! ```
//!
//! Unknown keys are rejected so that typos surface at load time.

pub mod error;
pub mod logging;

use std::path::Path;

use serde::Deserialize;

pub use error::{ConfigError, Result};

/// Top-level bridge configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
	/// Identifier allocation.
	pub ids: IdConfig,
	/// Outbound batching.
	pub batch: BatchConfig,
	/// Soft-error reporting.
	pub diagnostics: DiagnosticsConfig,
	/// Tracing output.
	pub log: LogConfig,
}

/// Identifier allocation settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdConfig {
	/// Prefix placed before the counter in every proxy identifier.
	pub prefix: String,
}

impl Default for IdConfig {
	fn default() -> Self {
		Self { prefix: "$".into() }
	}
}

/// Outbound batching settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
	/// Queue length that forces a flush. Zero disables size-based flushing.
	pub max_len: usize,
	/// Merge consecutive property writes on the same target into one operation.
	pub merge_sets: bool,
}

impl Default for BatchConfig {
	fn default() -> Self {
		Self {
			max_len: 0,
			merge_sets: true,
		}
	}
}

/// Soft-error reporting settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiagnosticsConfig {
	/// Number of recent diagnostics retained for inspection.
	pub history: usize,
}

impl Default for DiagnosticsConfig {
	fn default() -> Self {
		Self { history: 32 }
	}
}

/// Tracing output settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
	/// `EnvFilter` directive, overridden by `RUST_LOG` when set.
	pub filter: String,
}

impl Default for LogConfig {
	fn default() -> Self {
		Self {
			filter: "warn".into(),
		}
	}
}

impl BridgeConfig {
	/// Parses and validates configuration from TOML text.
	pub fn from_toml_str(text: &str) -> Result<Self> {
		let config: Self = toml::from_str(text)?;
		config.validate()?;
		Ok(config)
	}

	/// Reads and parses a configuration file.
	pub fn load(path: &Path) -> Result<Self> {
		let text = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		let config = Self::from_toml_str(&text)?;
		tracing::debug!(path = %path.display(), "config.loaded");
		Ok(config)
	}

	fn validate(&self) -> Result<()> {
		if self.ids.prefix.is_empty() {
			return Err(ConfigError::Invalid("ids.prefix must not be empty".into()));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use std::io::Write;

	use super::*;

	#[test]
	fn empty_text_is_default() {
		assert_eq!(BridgeConfig::from_toml_str("").unwrap(), BridgeConfig::default());
	}

	#[test]
	fn partial_sections_keep_defaults() {
		let config = BridgeConfig::from_toml_str("[batch]\nmax_len = 16\n").unwrap();
		assert_eq!(config.batch.max_len, 16);
		assert!(config.batch.merge_sets);
		assert_eq!(config.ids.prefix, "$");
	}

	#[test]
	fn unknown_key_is_rejected() {
		let err = BridgeConfig::from_toml_str("[batch]\nmax = 1\n").unwrap_err();
		assert!(matches!(err, ConfigError::Toml(_)));
	}

	#[test]
	fn empty_prefix_is_invalid() {
		let err = BridgeConfig::from_toml_str("[ids]\nprefix = \"\"\n").unwrap_err();
		assert!(matches!(err, ConfigError::Invalid(_)));
	}

	#[test]
	fn load_reads_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[ids]\nprefix = \"w\"\n[diagnostics]\nhistory = 4").unwrap();
		let config = BridgeConfig::load(file.path()).unwrap();
		assert_eq!(config.ids.prefix, "w");
		assert_eq!(config.diagnostics.history, 4);
	}

	#[test]
	fn load_missing_file_reports_path() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("absent.toml");
		match BridgeConfig::load(&path) {
			Err(ConfigError::Io { path: reported, .. }) => assert_eq!(reported, path),
			other => panic!("expected Io error, got {other:?}"),
		}
	}
}
