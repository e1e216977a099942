//! Priority effect queue
//!
//! Effects are executed off the build path, one at a time. A drain cycle runs
//! the [`EffectPriority::StateChange`] tier, then
//! [`EffectPriority::AfterRender`], then [`EffectPriority::AfterInit`], and
//! repeats until the queue is empty at the start of an iteration. Entries that
//! share an identity within one tier collapse into the most recently queued
//! one. At most one drain runs at any time.

use crate::config::EffectQueueConfig;
use crate::error::{EffectError, EffectFailure};
use crate::exception::ExceptionHandler;
use crate::hook::EffectHook;
use crate::trigger::EffectPriority;
use futures::FutureExt;
use parking_lot::Mutex;
use refrain_core::{Disposable, Disposables, panic_message};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::pin::pin;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::Notify;

#[derive(Default)]
struct QueueState {
	pending: VecDeque<(Arc<EffectHook>, EffectPriority)>,
	draining: bool,
	disposed: bool,
}

struct QueueInner {
	state: Mutex<QueueState>,
	disposables: Disposables,
	exception_handler: Arc<dyn ExceptionHandler>,
	config: EffectQueueConfig,
	runtime: Option<Handle>,
	/// Notified whenever a drain finishes
	idle: Notify,
}

/// Ownership of the `draining` flag
///
/// A claim dropped before its drain found the queue empty clears the flag and
/// wakes flush waiters. A drain that unwinds, or a spawned drain dropped by a
/// shutting down runtime, leaves pending work to the next `flush`.
struct DrainClaim {
	inner: Arc<QueueInner>,
	finished: bool,
}

impl DrainClaim {
	/// Wrap a flag the caller has already set
	fn new(inner: Arc<QueueInner>) -> Self {
		Self { inner, finished: false }
	}

	/// Run drain cycles until the queue is empty
	async fn drain(mut self) {
		let inner = Arc::clone(&self.inner);
		tracing::debug!(queue = inner.config.name(), "effect drain started");
		loop {
			{
				let mut state = inner.state.lock();
				if state.pending.is_empty() {
					state.draining = false;
					self.finished = true;
					drop(state);
					inner.idle.notify_waiters();
					tracing::debug!(queue = inner.config.name(), "effect drain finished");
					return;
				}
			}

			for priority in EffectPriority::ORDER {
				for effect in inner.take_tier(priority) {
					if inner.state.lock().disposed {
						break;
					}
					inner.run_effect(effect, priority).await;
				}
			}
		}
	}
}

impl Drop for DrainClaim {
	fn drop(&mut self) {
		if self.finished {
			return;
		}
		let pending = {
			let mut state = self.inner.state.lock();
			state.draining = false;
			state.pending.len()
		};
		self.inner.idle.notify_waiters();
		tracing::warn!(queue = self.inner.config.name(), pending, "effect drain abandoned");
	}
}

enum FlushStep {
	Idle,
	Drain,
	Wait,
}

/// Single-flight, priority-tiered, coalescing effect dispatcher
///
/// Cloning the queue yields another handle to the same queue.
///
/// # Examples
///
/// ```
/// use refrain_effects::{EffectHook, EffectPriority, EffectQueue, LoggingExceptionHandler};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let queue = EffectQueue::new(Arc::new(LoggingExceptionHandler));
/// let runs = Arc::new(AtomicUsize::new(0));
/// let effect = Arc::new(EffectHook::from_sync(0, {
///     let runs = Arc::clone(&runs);
///     move || {
///         runs.fetch_add(1, Ordering::SeqCst);
///     }
/// }, vec![]));
///
/// queue.enqueue(Arc::clone(&effect), EffectPriority::AfterInit);
/// queue.flush().await;
/// assert_eq!(runs.load(Ordering::SeqCst), 1);
/// # });
/// ```
#[derive(Clone)]
pub struct EffectQueue {
	inner: Arc<QueueInner>,
}

impl EffectQueue {
	/// Queue with default configuration
	pub fn new(exception_handler: Arc<dyn ExceptionHandler>) -> Self {
		Self::with_config(exception_handler, EffectQueueConfig::default())
	}

	/// Queue with explicit configuration
	///
	/// The ambient tokio runtime, if any, is captured here and used for
	/// automatic drains.
	pub fn with_config(exception_handler: Arc<dyn ExceptionHandler>, config: EffectQueueConfig) -> Self {
		let runtime = Handle::try_current().ok();
		if runtime.is_none() && config.auto_drain() {
			tracing::debug!(queue = config.name(), "no tokio runtime; effects drain on flush only");
		}
		Self {
			inner: Arc::new(QueueInner {
				state: Mutex::new(QueueState::default()),
				disposables: Disposables::new(),
				exception_handler,
				config,
				runtime,
				idle: Notify::new(),
			}),
		}
	}

	/// Queue `effect` at `priority` and return immediately
	///
	/// When no drain is active and auto drain is available, one is spawned.
	/// Otherwise the running drain, or the next `flush`, picks the entry up.
	/// Entries queued after `dispose` are dropped.
	pub fn enqueue(&self, effect: Arc<EffectHook>, priority: EffectPriority) {
		let identity = effect.identity();
		let spawn = {
			let mut state = self.inner.state.lock();
			if state.disposed {
				tracing::trace!(queue = self.inner.config.name(), identity, "effect dropped by disposed queue");
				return;
			}
			state.pending.push_back((effect, priority));
			tracing::trace!(
				queue = self.inner.config.name(),
				identity,
				%priority,
				pending = state.pending.len(),
				"effect enqueued"
			);
			let spawn = !state.draining && self.inner.config.auto_drain() && self.inner.runtime.is_some();
			if spawn {
				state.draining = true;
			}
			spawn
		};

		if spawn && let Some(runtime) = &self.inner.runtime {
			runtime.spawn(DrainClaim::new(Arc::clone(&self.inner)).drain());
		}
	}

	/// Wait until the queue is empty and no drain is active
	///
	/// Runs the drain on the calling task when none is active. Must not be
	/// awaited from inside an effect handler of the same queue.
	pub async fn flush(&self) {
		loop {
			let mut idle = pin!(self.inner.idle.notified());
			idle.as_mut().enable();

			let step = {
				let mut state = self.inner.state.lock();
				if state.draining {
					FlushStep::Wait
				} else if state.pending.is_empty() {
					FlushStep::Idle
				} else {
					state.draining = true;
					FlushStep::Drain
				}
			};

			match step {
				FlushStep::Idle => return,
				FlushStep::Drain => DrainClaim::new(Arc::clone(&self.inner)).drain().await,
				FlushStep::Wait => idle.await,
			}
		}
	}

	/// Clear pending entries and release every tracked resource
	///
	/// A handler already running is not awaited; when it completes, the
	/// resource it returns is released immediately instead of tracked.
	pub fn dispose(&self) {
		let dropped = {
			let mut state = self.inner.state.lock();
			state.disposed = true;
			let dropped = state.pending.len();
			state.pending.clear();
			dropped
		};
		tracing::debug!(queue = self.inner.config.name(), dropped, "effect queue disposed");
		self.inner.disposables.dispose_all();
	}

	/// Dispose, then wait for a running handler to finish
	pub async fn dispose_async(&self) {
		self.dispose();
		loop {
			let mut idle = pin!(self.inner.idle.notified());
			idle.as_mut().enable();
			if !self.inner.state.lock().draining {
				return;
			}
			idle.await;
		}
	}

	/// Number of entries waiting to run
	pub fn pending_len(&self) -> usize {
		self.inner.state.lock().pending.len()
	}

	/// Whether a drain is active
	pub fn is_draining(&self) -> bool {
		self.inner.state.lock().draining
	}

	/// Whether `dispose` has run
	pub fn is_disposed(&self) -> bool {
		self.inner.state.lock().disposed
	}

	/// Number of resources returned by handlers and not yet released
	pub fn tracked_resources(&self) -> usize {
		self.inner.disposables.len()
	}

	/// The queue's configuration
	pub fn config(&self) -> &EffectQueueConfig {
		&self.inner.config
	}
}

impl QueueInner {
	/// Remove every entry of `priority`, keeping the latest entry per identity
	/// at the position its identity first appeared.
	fn take_tier(&self, priority: EffectPriority) -> Vec<Arc<EffectHook>> {
		let mut state = self.state.lock();
		let pending = std::mem::take(&mut state.pending);
		let mut batch: Vec<Arc<EffectHook>> = Vec::new();
		let mut slots: HashMap<usize, usize> = HashMap::new();
		let mut taken = 0usize;

		for (effect, entry_priority) in pending {
			if entry_priority != priority {
				state.pending.push_back((effect, entry_priority));
				continue;
			}
			taken += 1;
			match slots.get(&effect.identity()).copied() {
				Some(slot) => batch[slot] = effect,
				None => {
					slots.insert(effect.identity(), batch.len());
					batch.push(effect);
				}
			}
		}

		if taken > batch.len() {
			tracing::trace!(
				queue = self.config.name(),
				%priority,
				coalesced = taken - batch.len(),
				"coalesced duplicate effects"
			);
		}
		batch
	}

	async fn run_effect(&self, effect: Arc<EffectHook>, priority: EffectPriority) {
		let identity = effect.identity();
		// The handler is invoked inside the guarded future so a panic while
		// starting it is caught too
		let outcome = AssertUnwindSafe(async { effect.run().await })
			.catch_unwind()
			.await;
		let result = match outcome {
			Ok(result) => result,
			Err(payload) => Err(EffectError::Panicked(panic_message(payload.as_ref()))),
		};

		match result {
			Ok(Some(resource)) => self.disposables.add_boxed(resource),
			Ok(None) => {}
			Err(error) => self.report(EffectFailure {
				identity,
				priority,
				error,
			}),
		}

		if self.config.yield_between_effects() {
			tokio::task::yield_now().await;
		}
	}
}

impl QueueInner {
	fn report(&self, failure: EffectFailure) {
		let handled = std::panic::catch_unwind(AssertUnwindSafe(|| {
			self.exception_handler.handle_exception(&failure)
		}));
		match handled {
			Ok(true) => {}
			Ok(false) => tracing::error!(
				queue = self.config.name(),
				identity = failure.identity,
				priority = %failure.priority,
				error = %failure.error,
				"unhandled effect failure"
			),
			Err(payload) => tracing::error!(
				queue = self.config.name(),
				identity = failure.identity,
				priority = %failure.priority,
				error = %failure.error,
				sink_panic = %panic_message(payload.as_ref()),
				"exception handler panicked"
			),
		}
	}
}

impl Disposable for EffectQueue {
	fn dispose(self: Box<Self>) {
		EffectQueue::dispose(&self);
	}
}

impl fmt::Debug for EffectQueue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.inner.state.lock();
		f.debug_struct("EffectQueue")
			.field("name", &self.inner.config.name())
			.field("pending", &state.pending.len())
			.field("draining", &state.draining)
			.field("disposed", &state.disposed)
			.finish()
	}
}
