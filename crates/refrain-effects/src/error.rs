//! Effect error types

use crate::trigger::EffectPriority;
use std::error::Error as StdError;

/// Why one effect run failed
#[derive(Debug, thiserror::Error)]
pub enum EffectError {
	/// The handler returned an error
	#[error("Effect handler failed: {0}")]
	Handler(#[source] Box<dyn StdError + Send + Sync>),

	/// The handler panicked
	#[error("Effect handler panicked: {0}")]
	Panicked(String),
}

impl EffectError {
	/// Wrap an error or message returned by a handler
	pub fn handler(error: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
		Self::Handler(error.into())
	}
}

/// A failed effect run, as delivered to the exception sink
#[derive(Debug, thiserror::Error)]
#[error("Effect #{identity} ({priority}) failed: {error}")]
pub struct EffectFailure {
	/// Calling index of the failed effect
	pub identity: usize,
	/// Tier it was running in
	pub priority: EffectPriority,
	/// What went wrong
	#[source]
	pub error: EffectError,
}

impl EffectFailure {
	/// Whether the handler panicked rather than returning an error
	pub fn is_panic(&self) -> bool {
		matches!(self.error, EffectError::Panicked(_))
	}
}
