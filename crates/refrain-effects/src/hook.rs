//! Effect records and handler adapters

use crate::error::EffectError;
use crate::trigger::EffectTrigger;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use refrain_core::Disposable;
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Future produced by one effect run; `None` when the run left nothing to release
pub type EffectFuture = BoxFuture<'static, Result<Option<Box<dyn Disposable>>, EffectError>>;

/// Type-erased effect handler
pub type EffectHandler = Arc<dyn Fn() -> EffectFuture + Send + Sync>;

/// Values an effect handler may produce
///
/// Handlers may return nothing, a resource to release on teardown, or a
/// `Result` of either.
pub trait IntoEffectOutput: Send + 'static {
	/// Normalise into the queue's result shape
	fn into_effect_output(self) -> Result<Option<Box<dyn Disposable>>, EffectError>;
}

impl IntoEffectOutput for () {
	fn into_effect_output(self) -> Result<Option<Box<dyn Disposable>>, EffectError> {
		Ok(None)
	}
}

impl IntoEffectOutput for Box<dyn Disposable> {
	fn into_effect_output(self) -> Result<Option<Box<dyn Disposable>>, EffectError> {
		Ok(Some(self))
	}
}

impl IntoEffectOutput for Option<Box<dyn Disposable>> {
	fn into_effect_output(self) -> Result<Option<Box<dyn Disposable>>, EffectError> {
		Ok(self)
	}
}

impl<O, E> IntoEffectOutput for Result<O, E>
where
	O: IntoEffectOutput,
	E: Into<Box<dyn StdError + Send + Sync>> + Send + 'static,
{
	fn into_effect_output(self) -> Result<Option<Box<dyn Disposable>>, EffectError> {
		match self {
			Ok(output) => output.into_effect_output(),
			Err(error) => Err(EffectError::Handler(error.into())),
		}
	}
}

/// Adapt an async closure into an [`EffectHandler`]
///
/// The closure is only called once the returned future is polled.
pub fn async_handler<F, Fut, O>(handler: F) -> EffectHandler
where
	F: Fn() -> Fut + Send + Sync + 'static,
	Fut: Future<Output = O> + Send + 'static,
	O: IntoEffectOutput,
{
	let handler = Arc::new(handler);
	Arc::new(move || -> EffectFuture {
		let handler = Arc::clone(&handler);
		Box::pin(async move { handler().await.into_effect_output() })
	})
}

/// Adapt a synchronous closure into an [`EffectHandler`]
///
/// The closure runs when the queue polls the effect, not when the run is
/// started.
pub fn sync_handler<F, O>(handler: F) -> EffectHandler
where
	F: Fn() -> O + Send + Sync + 'static,
	O: IntoEffectOutput,
{
	let handler = Arc::new(handler);
	Arc::new(move || -> EffectFuture {
		let handler = Arc::clone(&handler);
		Box::pin(async move { handler().into_effect_output() })
	})
}

/// One registered side effect
///
/// The identity is the calling index the effect was registered at; the queue
/// coalesces pending runs by it. The handler can be swapped when the owning
/// component re-registers the same identity on a later pass.
pub struct EffectHook {
	identity: usize,
	handler: RwLock<EffectHandler>,
	triggers: Vec<EffectTrigger>,
}

impl EffectHook {
	/// Create a record; an empty trigger list means [`EffectTrigger::AfterInit`]
	pub fn new(identity: usize, handler: EffectHandler, triggers: Vec<EffectTrigger>) -> Self {
		let triggers = if triggers.is_empty() {
			vec![EffectTrigger::AfterInit]
		} else {
			triggers
		};
		Self {
			identity,
			handler: RwLock::new(handler),
			triggers,
		}
	}

	/// Record running an async closure
	///
	/// # Examples
	///
	/// ```
	/// use refrain_effects::{EffectHook, EffectTrigger};
	///
	/// let hook = EffectHook::from_async(0, || async { Ok::<_, std::io::Error>(()) }, vec![]);
	/// assert!(matches!(hook.triggers(), [EffectTrigger::AfterInit]));
	/// ```
	pub fn from_async<F, Fut, O>(identity: usize, handler: F, triggers: Vec<EffectTrigger>) -> Self
	where
		F: Fn() -> Fut + Send + Sync + 'static,
		Fut: Future<Output = O> + Send + 'static,
		O: IntoEffectOutput,
	{
		Self::new(identity, async_handler(handler), triggers)
	}

	/// Record running a synchronous closure
	pub fn from_sync<F, O>(identity: usize, handler: F, triggers: Vec<EffectTrigger>) -> Self
	where
		F: Fn() -> O + Send + Sync + 'static,
		O: IntoEffectOutput,
	{
		Self::new(identity, sync_handler(handler), triggers)
	}

	/// Calling index this effect was registered at
	pub fn identity(&self) -> usize {
		self.identity
	}

	/// Triggers installed at registration
	pub fn triggers(&self) -> &[EffectTrigger] {
		&self.triggers
	}

	/// Swap in the handler captured by a later build pass
	pub fn replace_handler(&self, handler: EffectHandler) {
		*self.handler.write() = handler;
	}

	/// Start one run of the current handler
	pub fn run(&self) -> EffectFuture {
		let handler = Arc::clone(&*self.handler.read());
		handler()
	}
}

impl fmt::Debug for EffectHook {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("EffectHook")
			.field("identity", &self.identity)
			.field("triggers", &self.triggers)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use refrain_core::disposable_fn;
	use rstest::rstest;
	use std::sync::atomic::{AtomicUsize, Ordering};

	#[rstest]
	#[tokio::test]
	async fn test_error_output_becomes_handler_error() {
		// Arrange
		let hook = EffectHook::from_sync(3, || Err::<(), _>("disk full"), vec![]);

		// Act
		let result = hook.run().await;

		// Assert
		assert!(matches!(result, Err(EffectError::Handler(e)) if e.to_string() == "disk full"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_returned_resource_is_passed_through() {
		// Arrange
		let released = Arc::new(AtomicUsize::new(0));
		let hook = EffectHook::from_async(
			0,
			{
				let released = Arc::clone(&released);
				move || {
					let released = Arc::clone(&released);
					async move {
						disposable_fn(move || {
							released.fetch_add(1, Ordering::SeqCst);
						})
					}
				}
			},
			vec![EffectTrigger::AfterRender],
		);

		// Act
		let resource = hook.run().await.unwrap().expect("handler returned a resource");
		resource.dispose();

		// Assert
		assert_eq!(released.load(Ordering::SeqCst), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_replace_handler_runs_latest_closure() {
		// Arrange
		let calls = Arc::new(AtomicUsize::new(0));
		let hook = EffectHook::from_sync(0, || (), vec![]);
		let counter = Arc::clone(&calls);

		// Act
		hook.replace_handler(sync_handler(move || {
			counter.fetch_add(10, Ordering::SeqCst);
		}));
		let resource = hook.run().await.unwrap();

		// Assert
		assert!(resource.is_none());
		assert_eq!(calls.load(Ordering::SeqCst), 10);
	}

	#[rstest]
	fn test_sync_handler_is_lazy() {
		// Arrange
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&calls);

		// Act
		let hook = EffectHook::from_sync(
			0,
			move || {
				counter.fetch_add(1, Ordering::SeqCst);
			},
			vec![],
		);
		let pending = hook.run();

		// Assert
		assert_eq!(calls.load(Ordering::SeqCst), 0);
		assert!(futures::executor::block_on(pending).unwrap().is_none());
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}
}
