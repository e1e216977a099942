//! Effect queue configuration

/// Effect queue configuration
///
/// # Examples
///
/// ```
/// use refrain_effects::EffectQueueConfig;
///
/// let config = EffectQueueConfig::new()
///     .with_name("settings-panel")
///     .with_auto_drain(false);
///
/// assert_eq!(config.name(), "settings-panel");
/// assert!(!config.auto_drain());
/// assert!(config.yield_between_effects());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectQueueConfig {
	/// Name reported in tracing fields
	name: String,
	/// Spawn a drain on the ambient runtime when work arrives
	auto_drain: bool,
	/// Yield to the runtime after each handler
	yield_between_effects: bool,
}

impl EffectQueueConfig {
	/// Create a new queue configuration with default values
	///
	/// Defaults:
	/// - `name`: "effects"
	/// - `auto_drain`: true
	/// - `yield_between_effects`: true
	pub fn new() -> Self {
		Self {
			name: "effects".to_string(),
			auto_drain: true,
			yield_between_effects: true,
		}
	}

	/// Set the queue name
	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = name.into();
		self
	}

	/// Set whether enqueueing spawns a drain
	///
	/// With auto drain off, or without an ambient tokio runtime, the host
	/// drives the queue through `EffectQueue::flush`.
	pub fn with_auto_drain(mut self, auto_drain: bool) -> Self {
		self.auto_drain = auto_drain;
		self
	}

	/// Set whether the drain yields between handlers
	pub fn with_yield_between_effects(mut self, yield_between_effects: bool) -> Self {
		self.yield_between_effects = yield_between_effects;
		self
	}

	/// Get the queue name
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Check if enqueueing spawns a drain
	pub fn auto_drain(&self) -> bool {
		self.auto_drain
	}

	/// Check if the drain yields between handlers
	pub fn yield_between_effects(&self) -> bool {
		self.yield_between_effects
	}
}

impl Default for EffectQueueConfig {
	fn default() -> Self {
		Self::new()
	}
}
