//! Logging bootstrap.
//!
//! Every refrain crate logs through `tracing`. Hosts that do not install a
//! subscriber of their own can call [`init`] (feature `logging`) once at
//! startup.

/// Logging configuration
///
/// # Examples
///
/// ```rust
/// use refrain::LoggingConfig;
///
/// let config = LoggingConfig::new().with_level("refrain_effects=trace,info");
/// assert_eq!(config.level(), "refrain_effects=trace,info");
/// assert!(!config.with_target());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Deserialize), serde(default))]
pub struct LoggingConfig {
	/// Filter directive used when `RUST_LOG` is unset
	level: String,
	/// Include the event target in formatted lines
	with_target: bool,
}

impl LoggingConfig {
	/// Create a new logging configuration with default values
	///
	/// Defaults:
	/// - `level`: "info"
	/// - `with_target`: false
	pub fn new() -> Self {
		Self {
			level: "info".to_string(),
			with_target: false,
		}
	}

	/// Set the filter directive
	pub fn with_level(mut self, level: impl Into<String>) -> Self {
		self.level = level.into();
		self
	}

	/// Set whether event targets are printed
	pub fn with_target_enabled(mut self, with_target: bool) -> Self {
		self.with_target = with_target;
		self
	}

	/// Get the filter directive
	pub fn level(&self) -> &str {
		&self.level
	}

	/// Check if event targets are printed
	pub fn with_target(&self) -> bool {
		self.with_target
	}
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self::new()
	}
}

/// Install a global `fmt` subscriber filtered by `RUST_LOG` or `config`
///
/// Returns `false` when a global subscriber was already installed, in which
/// case nothing changes.
#[cfg(feature = "logging")]
pub fn init(config: &LoggingConfig) -> bool {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level()));
	let installed = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(config.with_target())
		.try_init()
		.is_ok();
	if installed {
		tracing::debug!(level = config.level(), "logging initialised");
	}
	installed
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_defaults() {
		// Arrange
		let config = LoggingConfig::default();

		// Act
		let level = config.level();

		// Assert
		assert_eq!(level, "info");
		assert!(!config.with_target());
	}

	#[cfg(feature = "logging")]
	#[rstest]
	fn test_second_init_is_harmless() {
		// Arrange
		let config = LoggingConfig::new().with_level("warn");

		// Act
		let _ = init(&config);
		let second = init(&config);

		// Assert
		assert!(!second);
	}
}
