//! Tagged per-receiver results of a broadcast

use crate::error::SignalError;
use crate::receiver::ReceiverId;

/// Outcome of delivering one broadcast to one receiver
///
/// A failing receiver shows up as [`SignalResponse::Failed`] instead of a
/// substituted default, so callers can tell "no receivers" from "a receiver
/// failed".
#[derive(Debug)]
pub enum SignalResponse<O> {
	/// The receiver completed and produced a value
	Delivered {
		/// Receiver that answered
		receiver: ReceiverId,
		/// Its answer
		value: O,
	},
	/// The receiver returned an error or panicked
	Failed {
		/// Receiver that failed
		receiver: ReceiverId,
		/// What went wrong
		error: SignalError,
	},
}

impl<O> SignalResponse<O> {
	/// Receiver this response came from
	pub fn receiver(&self) -> ReceiverId {
		match self {
			Self::Delivered { receiver, .. } | Self::Failed { receiver, .. } => *receiver,
		}
	}

	/// Whether the receiver failed
	pub fn is_failed(&self) -> bool {
		matches!(self, Self::Failed { .. })
	}

	/// The delivered value, if any
	pub fn ok(&self) -> Option<&O> {
		match self {
			Self::Delivered { value, .. } => Some(value),
			Self::Failed { .. } => None,
		}
	}

	/// The failure, if any
	pub fn err(&self) -> Option<&SignalError> {
		match self {
			Self::Delivered { .. } => None,
			Self::Failed { error, .. } => Some(error),
		}
	}

	/// Convert into a plain `Result`
	pub fn into_result(self) -> Result<O, SignalError> {
		match self {
			Self::Delivered { value, .. } => Ok(value),
			Self::Failed { error, .. } => Err(error),
		}
	}

	/// Delivered values of a whole broadcast, dropping failures
	///
	/// # Examples
	///
	/// ```
	/// use refrain_signals::{ReceiverId, SignalError, SignalResponse};
	///
	/// let responses = vec![
	///     SignalResponse::Delivered { receiver: ReceiverId::new(), value: true },
	///     SignalResponse::Failed { receiver: ReceiverId::new(), error: SignalError::callback("offline") },
	/// ];
	/// assert_eq!(SignalResponse::values(responses), vec![true]);
	/// ```
	pub fn values(responses: Vec<Self>) -> Vec<O> {
		responses
			.into_iter()
			.filter_map(|response| response.into_result().ok())
			.collect()
	}
}
