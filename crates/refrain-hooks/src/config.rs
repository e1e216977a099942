//! Hook registry configuration

use refrain_effects::EffectQueueConfig;

/// Hook registry configuration
///
/// # Examples
///
/// ```
/// use refrain_effects::EffectQueueConfig;
/// use refrain_hooks::HookConfig;
///
/// let config = HookConfig::new()
///     .with_strict_hook_order(true)
///     .with_effect_queue(EffectQueueConfig::new().with_name("sidebar"));
///
/// assert!(config.strict_hook_order());
/// assert_eq!(config.effect_queue().name(), "sidebar");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookConfig {
	/// Compare the hook sequence of each pass with the previous one
	strict_hook_order: bool,
	/// Configuration of the registry's effect queue
	effect_queue: EffectQueueConfig,
}

impl HookConfig {
	/// Create a new configuration with default values
	///
	/// Defaults:
	/// - `strict_hook_order`: enabled in debug builds
	/// - `effect_queue`: `EffectQueueConfig::default()`
	pub fn new() -> Self {
		Self {
			strict_hook_order: cfg!(debug_assertions),
			effect_queue: EffectQueueConfig::default(),
		}
	}

	/// Set whether hook order divergence between passes is reported
	pub fn with_strict_hook_order(mut self, strict: bool) -> Self {
		self.strict_hook_order = strict;
		self
	}

	/// Set the effect queue configuration
	pub fn with_effect_queue(mut self, effect_queue: EffectQueueConfig) -> Self {
		self.effect_queue = effect_queue;
		self
	}

	/// Check if hook order divergence is reported
	pub fn strict_hook_order(&self) -> bool {
		self.strict_hook_order
	}

	/// Get the effect queue configuration
	pub fn effect_queue(&self) -> &EffectQueueConfig {
		&self.effect_queue
	}
}

impl Default for HookConfig {
	fn default() -> Self {
		Self::new()
	}
}
