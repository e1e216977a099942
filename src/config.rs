//! TOML configuration.
//!
//! ```toml
//! [hooks]
//! strict_hook_order = true
//!
//! [hooks.effect_queue]
//! name = "editor"
//! auto_drain = true
//! yield_between_effects = false
//!
//! [logging]
//! level = "refrain_hooks=debug,info"
//! with_target = true
//! ```
//!
//! Every key is optional; missing keys take the same defaults as the
//! corresponding builders.

use crate::logging::LoggingConfig;
use refrain_effects::EffectQueueConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration loading error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// The file could not be read
	#[error("Failed to read {}: {source}", .path.display())]
	Io {
		/// File that was being read
		path: PathBuf,
		/// Underlying I/O error
		#[source]
		source: std::io::Error,
	},

	/// The content is not valid configuration TOML
	#[error("TOML parse error: {0}")]
	Parse(#[from] toml::de::Error),
}

/// Effect queue section of [`RefrainConfig`]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EffectQueueSection {
	/// Queue name reported in tracing fields
	pub name: String,
	/// Spawn a drain on the ambient runtime when work arrives
	pub auto_drain: bool,
	/// Yield to the runtime after each handler
	pub yield_between_effects: bool,
}

impl Default for EffectQueueSection {
	fn default() -> Self {
		let defaults = EffectQueueConfig::default();
		Self {
			name: defaults.name().to_string(),
			auto_drain: defaults.auto_drain(),
			yield_between_effects: defaults.yield_between_effects(),
		}
	}
}

impl From<&EffectQueueSection> for EffectQueueConfig {
	fn from(section: &EffectQueueSection) -> Self {
		EffectQueueConfig::new()
			.with_name(section.name.clone())
			.with_auto_drain(section.auto_drain)
			.with_yield_between_effects(section.yield_between_effects)
	}
}

/// Hook registry section of [`RefrainConfig`]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HooksSection {
	/// Report hook order divergence between passes
	pub strict_hook_order: bool,
	/// Effect queue settings
	pub effect_queue: EffectQueueSection,
}

impl Default for HooksSection {
	fn default() -> Self {
		Self {
			strict_hook_order: cfg!(debug_assertions),
			effect_queue: EffectQueueSection::default(),
		}
	}
}

/// Runtime configuration loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RefrainConfig {
	/// Hook registry settings
	pub hooks: HooksSection,
	/// Logging settings
	pub logging: LoggingConfig,
}

impl RefrainConfig {
	/// Parse configuration from TOML text
	///
	/// # Examples
	///
	/// ```rust
	/// use refrain::RefrainConfig;
	///
	/// let config = RefrainConfig::from_toml_str("[hooks.effect_queue]\nname = \"toolbar\"").unwrap();
	/// assert_eq!(config.effect_queue_config().name(), "toolbar");
	/// assert_eq!(config.logging.level(), "info");
	/// ```
	pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(content)?)
	}

	/// Load configuration from a TOML file
	pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		Self::from_toml_str(&content)
	}

	/// Effect queue configuration described by this file
	pub fn effect_queue_config(&self) -> EffectQueueConfig {
		EffectQueueConfig::from(&self.hooks.effect_queue)
	}

	/// Hook registry configuration described by this file
	#[cfg(feature = "hooks")]
	pub fn hook_config(&self) -> refrain_hooks::HookConfig {
		refrain_hooks::HookConfig::new()
			.with_strict_hook_order(self.hooks.strict_hook_order)
			.with_effect_queue(self.effect_queue_config())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_empty_document_uses_defaults() {
		// Arrange
		let content = "";

		// Act
		let config = RefrainConfig::from_toml_str(content).unwrap();

		// Assert
		assert_eq!(config, RefrainConfig::default());
		assert_eq!(config.effect_queue_config(), EffectQueueConfig::default());
	}

	#[rstest]
	fn test_full_document() {
		// Arrange
		let content = r#"
[hooks]
strict_hook_order = false

[hooks.effect_queue]
name = "editor"
auto_drain = false
yield_between_effects = false

[logging]
level = "debug"
with_target = true
"#;

		// Act
		let config = RefrainConfig::from_toml_str(content).unwrap();

		// Assert
		assert!(!config.hooks.strict_hook_order);
		assert_eq!(
			config.effect_queue_config(),
			EffectQueueConfig::new()
				.with_name("editor")
				.with_auto_drain(false)
				.with_yield_between_effects(false)
		);
		assert_eq!(config.logging, LoggingConfig::new().with_level("debug").with_target_enabled(true));
	}

	#[rstest]
	fn test_wrong_type_is_parse_error() {
		// Arrange
		let content = "[hooks]\nstrict_hook_order = \"yes\"";

		// Act
		let result = RefrainConfig::from_toml_str(content);

		// Assert
		assert!(matches!(result, Err(ConfigError::Parse(_))));
	}
}
