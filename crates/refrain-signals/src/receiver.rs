//! Receiver identities and per-component receiver handles

use crate::core::SignalKind;
use crate::error::SignalError;
use crate::signal::Signal;
use refrain_core::Disposable;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

/// Opaque identity of one receiver, typically one component instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReceiverId(Uuid);

impl ReceiverId {
	/// A fresh random identity
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}

	/// Wrap an existing UUID
	pub const fn from_uuid(uuid: Uuid) -> Self {
		Self(uuid)
	}

	/// The underlying UUID
	pub fn as_uuid(&self) -> &Uuid {
		&self.0
	}
}

impl Default for ReceiverId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for ReceiverId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<Uuid> for ReceiverId {
	fn from(uuid: Uuid) -> Self {
		Self(uuid)
	}
}

/// A signal bound to one receiver identity
///
/// Every `receive` call replaces the callback registered under this identity,
/// so a component can re-register on each build pass without duplicating
/// deliveries. Disposing the handle removes whatever is registered under it.
///
/// # Examples
///
/// ```
/// use refrain_signals::{ReceiverId, Signal, SignalKind, SignalReceiver};
///
/// struct Refresh;
///
/// impl SignalKind for Refresh {
///     type Input = u32;
///     type Output = ();
///     const NAME: &'static str = "refresh";
/// }
///
/// let signal = Signal::<Refresh>::new();
/// let receiver = SignalReceiver::new(ReceiverId::new(), signal.clone());
///
/// receiver.receive_sync(|_| ());
/// receiver.receive_sync(|_| ());
/// assert_eq!(signal.receiver_count(), 1);
///
/// receiver.disconnect();
/// assert_eq!(signal.receiver_count(), 0);
/// ```
pub struct SignalReceiver<K: SignalKind> {
	id: ReceiverId,
	signal: Signal<K>,
}

impl<K: SignalKind> SignalReceiver<K> {
	/// Bind `signal` to `id`
	pub fn new(id: ReceiverId, signal: Signal<K>) -> Self {
		Self { id, signal }
	}

	/// Register (or replace) the asynchronous callback for this identity
	pub fn receive<F, Fut>(&self, callback: F)
	where
		F: Fn(Arc<K::Input>) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<K::Output, SignalError>> + Send + 'static,
	{
		// Removal goes through `disconnect`, which targets the identity
		let _registration = self.signal.receive(self.id, callback);
	}

	/// Register (or replace) a synchronous callback for this identity
	pub fn receive_sync<F>(&self, callback: F)
	where
		F: Fn(&K::Input) -> K::Output + Send + Sync + 'static,
	{
		let _registration = self.signal.receive_sync(self.id, callback);
	}

	/// Remove whatever callback is registered under this identity
	pub fn disconnect(&self) -> bool {
		self.signal.disconnect(self.id)
	}

	/// Whether a callback is currently registered under this identity
	pub fn is_registered(&self) -> bool {
		self.signal.is_registered(self.id)
	}

	/// This handle's identity
	pub fn id(&self) -> ReceiverId {
		self.id
	}

	/// The underlying signal, for sending
	pub fn signal(&self) -> &Signal<K> {
		&self.signal
	}
}

impl<K: SignalKind> Clone for SignalReceiver<K> {
	fn clone(&self) -> Self {
		Self {
			id: self.id,
			signal: self.signal.clone(),
		}
	}
}

impl<K: SignalKind> Disposable for SignalReceiver<K> {
	fn dispose(self: Box<Self>) {
		self.disconnect();
	}
}

impl<K: SignalKind> fmt::Debug for SignalReceiver<K> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SignalReceiver")
			.field("id", &self.id)
			.field("signal", &K::NAME)
			.finish()
	}
}
