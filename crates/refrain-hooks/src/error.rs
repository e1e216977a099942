//! Hook registry errors

use refrain_di::DiError;
use std::fmt;

/// Kind of hook stored at a calling index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
	/// A state cell registered by `use_state`
	State,
	/// An effect record registered by `use_effect`
	Effect,
}

impl HookKind {
	/// Lowercase name used in messages and log fields
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::State => "state",
			Self::Effect => "effect",
		}
	}
}

impl fmt::Display for HookKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Errors raised by hook calls
///
/// Mismatch errors mean the component called its hooks in a different order
/// than on an earlier pass. They are contract violations and should be
/// propagated, not recovered from.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HookError {
	/// The state stored at this index holds a different value type
	#[error(
		"Hook identity mismatch at index {index}: expected state of {expected}, found state of {found}\nHooks must be called in the same order on every build pass."
	)]
	IdentityMismatch {
		/// Calling index of the offending hook
		index: usize,
		/// Value type requested on this pass
		expected: &'static str,
		/// Value type stored on an earlier pass
		found: &'static str,
	},

	/// A different kind of hook is stored at this index
	#[error(
		"Hook kind mismatch at index {index}: expected {expected}, found {found}\nHooks must be called in the same order on every build pass."
	)]
	KindMismatch {
		/// Calling index of the offending hook
		index: usize,
		/// Kind requested on this pass
		expected: HookKind,
		/// Kind stored on an earlier pass
		found: HookKind,
	},

	/// The registry was disposed
	#[error("View context has been disposed")]
	Disposed,

	/// A context or service could not be resolved
	#[error(transparent)]
	Dependency(#[from] DiError),
}

impl HookError {
	/// Whether this error reports a violated calling-order contract
	pub fn is_order_violation(&self) -> bool {
		matches!(self, Self::IdentityMismatch { .. } | Self::KindMismatch { .. })
	}
}

/// Result type for hook calls
pub type HookResult<T> = Result<T, HookError>;

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_missing_dependency_converts_transparently() {
		// Arrange
		let source = DiError::missing::<u32>();

		// Act
		let error = HookError::from(source.clone());

		// Assert
		assert_eq!(error.to_string(), source.to_string());
		assert!(!error.is_order_violation());
	}

	#[rstest]
	fn test_kind_mismatch_message_names_both_kinds() {
		// Arrange
		let error = HookError::KindMismatch {
			index: 2,
			expected: HookKind::State,
			found: HookKind::Effect,
		};

		// Act
		let message = error.to_string();

		// Assert
		assert!(message.starts_with("Hook kind mismatch at index 2: expected state, found effect"));
		assert!(error.is_order_violation());
	}
}
