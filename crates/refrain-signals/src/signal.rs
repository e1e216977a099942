//! Core Signal implementation

use crate::core::{ReceiverFn, ReceiverFuture, SignalKind, SignalSender};
use crate::error::SignalError;
use crate::receiver::ReceiverId;
use crate::response::SignalResponse;
use dashmap::DashMap;
use futures::FutureExt;
use futures::future::join_all;
use refrain_core::{Subscription, panic_message};
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Information about a connected receiver
struct Registration<K: SignalKind> {
	/// Distinguishes this registration from later ones under the same identity
	generation: u64,
	callback: ReceiverFn<K::Input, K::Output>,
}

/// A broadcast/request-response channel keyed by receiver identity
///
/// At most one callback is registered per [`ReceiverId`]; registering again
/// under the same identity atomically replaces the previous callback.
/// Registration and removal are safe from any thread at any time, including
/// while a broadcast is in flight.
///
/// # Examples
///
/// ```
/// use refrain_signals::{ReceiverId, Signal, SignalKind, SignalResponse};
///
/// struct Validate;
///
/// impl SignalKind for Validate {
///     type Input = ();
///     type Output = bool;
///     const NAME: &'static str = "validate";
/// }
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let signal = Signal::<Validate>::new();
/// let _email = signal.receive_sync(ReceiverId::new(), |_| true);
/// let _password = signal.receive_sync(ReceiverId::new(), |_| false);
///
/// let answers = SignalResponse::values(signal.send(()).await);
/// assert_eq!(answers.len(), 2);
/// assert!(!answers.iter().all(|valid| *valid));
/// # });
/// ```
pub struct Signal<K: SignalKind> {
	receivers: Arc<DashMap<ReceiverId, Registration<K>>>,
	generation: Arc<AtomicU64>,
}

impl<K: SignalKind> Signal<K> {
	/// Create a signal with no receivers
	pub fn new() -> Self {
		Self {
			receivers: Arc::new(DashMap::new()),
			generation: Arc::new(AtomicU64::new(0)),
		}
	}

	/// Register `callback` under `receiver`, replacing any previous callback
	///
	/// The returned subscription removes exactly this registration: once a
	/// newer callback has replaced it, releasing the old subscription does
	/// nothing.
	pub fn receive<F, Fut>(&self, receiver: ReceiverId, callback: F) -> Subscription
	where
		F: Fn(Arc<K::Input>) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<K::Output, SignalError>> + Send + 'static,
	{
		let callback: ReceiverFn<K::Input, K::Output> =
			Arc::new(move |input: Arc<K::Input>| -> ReceiverFuture<K::Output> { Box::pin(callback(input)) });
		self.register(receiver, callback)
	}

	/// Register a synchronous, infallible callback under `receiver`
	pub fn receive_sync<F>(&self, receiver: ReceiverId, callback: F) -> Subscription
	where
		F: Fn(&K::Input) -> K::Output + Send + Sync + 'static,
	{
		let callback: ReceiverFn<K::Input, K::Output> =
			Arc::new(move |input: Arc<K::Input>| -> ReceiverFuture<K::Output> {
				let value = callback(input.as_ref());
				Box::pin(futures::future::ready(Ok(value)))
			});
		self.register(receiver, callback)
	}

	fn register(
		&self,
		receiver: ReceiverId,
		callback: ReceiverFn<K::Input, K::Output>,
	) -> Subscription {
		let generation = self.generation.fetch_add(1, Ordering::Relaxed);
		let replaced = self
			.receivers
			.insert(receiver, Registration { generation, callback })
			.is_some();
		tracing::trace!(signal = K::NAME, %receiver, replaced, "signal receiver registered");

		let receivers = Arc::downgrade(&self.receivers);
		Subscription::new(move || {
			if let Some(receivers) = receivers.upgrade() {
				receivers.remove_if(&receiver, |_, registration| {
					registration.generation == generation
				});
			}
		})
	}

	/// Broadcast `input` to every receiver registered right now
	///
	/// Receivers run concurrently. A receiver that errors or panics yields a
	/// [`SignalResponse::Failed`] entry and never fails the whole broadcast.
	/// With no receivers the result is empty.
	pub async fn send(&self, input: K::Input) -> Vec<SignalResponse<K::Output>> {
		let snapshot: Vec<(ReceiverId, ReceiverFn<K::Input, K::Output>)> = self
			.receivers
			.iter()
			.map(|entry| (*entry.key(), Arc::clone(&entry.value().callback)))
			.collect();
		if snapshot.is_empty() {
			tracing::trace!(signal = K::NAME, "signal sent with no receivers");
			return Vec::new();
		}
		tracing::debug!(signal = K::NAME, receivers = snapshot.len(), "sending signal");

		let input = Arc::new(input);
		let deliveries = snapshot.into_iter().map(|(receiver, callback)| {
			let input = Arc::clone(&input);
			async move {
				// The callback itself runs inside the guarded future so a
				// panic before its first await is caught as well
				let outcome = AssertUnwindSafe(async move { callback(input).await })
					.catch_unwind()
					.await;
				match outcome {
					Ok(Ok(value)) => SignalResponse::Delivered { receiver, value },
					Ok(Err(error)) => {
						tracing::warn!(signal = K::NAME, %receiver, error = %error, "signal receiver failed");
						SignalResponse::Failed { receiver, error }
					}
					Err(payload) => {
						let message = panic_message(payload.as_ref());
						tracing::error!(signal = K::NAME, %receiver, panic = %message, "signal receiver panicked");
						SignalResponse::Failed {
							receiver,
							error: SignalError::Panicked(message),
						}
					}
				}
			}
		});
		join_all(deliveries).await
	}

	/// Remove whatever is registered under `receiver`
	pub fn disconnect(&self, receiver: ReceiverId) -> bool {
		self.receivers.remove(&receiver).is_some()
	}

	/// Whether a callback is registered under `receiver`
	pub fn is_registered(&self, receiver: ReceiverId) -> bool {
		self.receivers.contains_key(&receiver)
	}

	/// Get number of connected receivers
	pub fn receiver_count(&self) -> usize {
		self.receivers.len()
	}

	/// Clear all receivers
	pub fn disconnect_all(&self) {
		self.receivers.clear();
	}
}

impl<K: SignalKind> Default for Signal<K> {
	fn default() -> Self {
		Self::new()
	}
}

impl<K: SignalKind> Clone for Signal<K> {
	fn clone(&self) -> Self {
		Self {
			receivers: Arc::clone(&self.receivers),
			generation: Arc::clone(&self.generation),
		}
	}
}

impl<K: SignalKind> fmt::Debug for Signal<K> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Signal")
			.field("name", &K::NAME)
			.field("receivers", &self.receivers.len())
			.finish()
	}
}

#[async_trait::async_trait]
impl<K: SignalKind> SignalSender<K> for Signal<K> {
	async fn send(&self, input: K::Input) -> Vec<SignalResponse<K::Output>> {
		Signal::send(self, input).await
	}

	fn receiver_count(&self) -> usize {
		Signal::receiver_count(self)
	}
}
