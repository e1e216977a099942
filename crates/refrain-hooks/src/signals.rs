//! Signal hooks
//!
//! A signal is shared through the context mechanism: an ancestor creates it
//! with [`ViewContext::create_signal`], descendants obtain a receiver handle
//! with [`ViewContext::use_signal`].

use crate::context::ViewContext;
use crate::error::HookResult;
use refrain_signals::{ReceiverId, Signal, SignalKind, SignalReceiver};
use std::sync::Arc;

impl ViewContext {
	/// Signal of kind `K` scoped to this registry, created on first use
	pub fn create_signal<K: SignalKind>(&self) -> HookResult<Arc<Signal<K>>> {
		self.create_context(Signal::<K>::new)
	}

	/// Receiver handle for the nearest signal of kind `K`
	///
	/// Takes one calling index for the receiver identity, which stays the
	/// same across passes, so re-registering a callback on every pass
	/// replaces the previous one. The registration is removed when this
	/// registry is disposed.
	///
	/// # Errors
	///
	/// [`crate::HookError::Dependency`] when no registry in the chain
	/// created the signal.
	///
	/// # Examples
	///
	/// ```
	/// use refrain_di::ServiceCollection;
	/// use refrain_hooks::ViewContext;
	/// use refrain_signals::SignalKind;
	/// use std::sync::Arc;
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
	/// let form = Arc::new(ViewContext::builder(Arc::new(ServiceCollection::new())).build());
	/// let signal = form.create_signal::<Validate>().unwrap();
	///
	/// let field = form.child().build();
	/// field.reset();
	/// field.use_signal::<Validate>().unwrap().receive_sync(|_| true);
	///
	/// let answers = signal.send(()).await;
	/// assert_eq!(answers.len(), 1);
	///
	/// field.dispose();
	/// assert_eq!(signal.receiver_count(), 0);
	/// # });
	/// ```
	pub fn use_signal<K: SignalKind>(&self) -> HookResult<SignalReceiver<K>> {
		let slot = self.use_state_with(ReceiverSlot::new, false)?;
		let signal = self.use_context::<Signal<K>>()?;
		let current = slot.get();
		let receiver = SignalReceiver::new(current.id, Signal::clone(&signal));
		if !current.tracked {
			self.track_disposable(receiver.clone());
			slot.set(ReceiverSlot {
				tracked: true,
				..current
			});
			tracing::debug!(signal = K::NAME, receiver = %receiver.id(), "signal receiver created");
		}
		Ok(receiver)
	}
}

/// Receiver identity kept across passes
///
/// `tracked` flips once the registration is handed to the registry's
/// disposables, which can be a later pass than the one that allocated the id.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ReceiverSlot {
	id: ReceiverId,
	tracked: bool,
}

impl ReceiverSlot {
	fn new() -> Self {
		Self {
			id: ReceiverId::new(),
			tracked: false,
		}
	}
}
