//! Core signal types and traits

use crate::error::SignalError;
use crate::response::SignalResponse;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Declares one named signal channel: what is sent and what comes back.
///
/// The implementing type is a marker; it is also the key under which the
/// channel is shared through hook contexts, so two kinds with identical
/// payloads never collide.
///
/// # Examples
///
/// ```
/// use refrain_signals::SignalKind;
///
/// /// "Is everyone valid?"
/// struct Validate;
///
/// impl SignalKind for Validate {
///     type Input = ();
///     type Output = bool;
///     const NAME: &'static str = "validate";
/// }
/// ```
pub trait SignalKind: Send + Sync + 'static {
	/// Request payload handed to every receiver
	type Input: Send + Sync + 'static;
	/// Per-receiver response
	type Output: Send + 'static;
	/// Name used in logs
	const NAME: &'static str;
}

/// Boxed future returned by a receiver callback
pub type ReceiverFuture<O> = Pin<Box<dyn Future<Output = Result<O, SignalError>> + Send>>;

/// Signal receiver function type
pub type ReceiverFn<I, O> = Arc<dyn Fn(Arc<I>) -> ReceiverFuture<O> + Send + Sync>;

/// Trait for asynchronous signal senders
///
/// Lets code that only broadcasts depend on the sending half of a channel.
#[async_trait::async_trait]
pub trait SignalSender<K: SignalKind>: Send + Sync {
	/// Broadcast `input` and collect one response per receiver
	async fn send(&self, input: K::Input) -> Vec<SignalResponse<K::Output>>;

	/// Get the number of connected receivers
	fn receiver_count(&self) -> usize;
}
