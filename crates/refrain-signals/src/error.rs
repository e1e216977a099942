//! Signal error types

use std::error::Error as StdError;

/// Failure of one receiver during a broadcast
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
	/// The receiver returned an error
	#[error("Signal receiver failed: {0}")]
	Callback(#[source] Box<dyn StdError + Send + Sync>),

	/// The receiver panicked
	#[error("Signal receiver panicked: {0}")]
	Panicked(String),
}

impl SignalError {
	/// Wrap an error or message returned by a receiver
	///
	/// # Examples
	///
	/// ```
	/// use refrain_signals::SignalError;
	///
	/// let error = SignalError::callback("field `email` is required");
	/// assert_eq!(error.to_string(), "Signal receiver failed: field `email` is required");
	/// ```
	pub fn callback(error: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
		Self::Callback(error.into())
	}

	/// Whether the receiver panicked rather than returning an error
	pub fn is_panic(&self) -> bool {
		matches!(self, Self::Panicked(_))
	}
}
