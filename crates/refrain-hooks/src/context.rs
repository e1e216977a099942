//! The hook registry
//!
//! A [`ViewContext`] belongs to one component instance. Every hook call takes
//! the next calling index of the current build pass, and that index is the
//! hook's identity across passes. The host calls [`ViewContext::reset`]
//! before each pass and [`ViewContext::dispose`] once the component is torn
//! down.
//!
//! Hooks must be called in the same order on every pass: no hook inside a
//! conditional branch, and none inside a loop whose trip count can change.

use crate::config::HookConfig;
use crate::error::{HookError, HookKind, HookResult};
use parking_lot::Mutex;
use refrain_core::{Disposable, Disposables, State};
use refrain_di::{ContextScope, ServiceProvider};
use refrain_effects::{
	EffectHandler, EffectHook, EffectPriority, EffectQueue, EffectTrigger, ExceptionHandler,
	IntoEffectOutput, LoggingExceptionHandler, async_handler, sync_handler,
};
use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Host callback requesting another build pass
pub type RebuildCallback = Arc<dyn Fn() + Send + Sync>;

enum HookSlot {
	State {
		cell: Box<dyn Any + Send + Sync>,
		type_name: &'static str,
	},
	Effect(Arc<EffectHook>),
}

impl HookSlot {
	fn kind(&self) -> HookKind {
		match self {
			Self::State { .. } => HookKind::State,
			Self::Effect(_) => HookKind::Effect,
		}
	}
}

/// Hook kinds seen on the current and the previous pass
#[derive(Default)]
struct HookOrder {
	previous: Option<Vec<HookKind>>,
	current: Vec<HookKind>,
}

impl HookOrder {
	/// Close the pass and return the first index where it diverged from the
	/// previous one
	fn finish_pass(&mut self) -> Option<usize> {
		let current = std::mem::take(&mut self.current);
		if current.is_empty() {
			return None;
		}
		let mut divergence = None;
		if let Some(previous) = &self.previous
			&& *previous != current
		{
			let diverged_at = previous
				.iter()
				.zip(&current)
				.position(|(before, now)| before != now)
				.unwrap_or(previous.len().min(current.len()));
			tracing::warn!(
				previous = previous.len(),
				current = current.len(),
				diverged_at,
				"hook order changed between build passes"
			);
			divergence = Some(diverged_at);
		}
		self.previous = Some(current);
		divergence
	}
}

/// Builder for [`ViewContext`]
pub struct ViewContextBuilder {
	services: Arc<dyn ServiceProvider>,
	ancestor: Option<Arc<ViewContext>>,
	on_rebuild: Option<RebuildCallback>,
	exception_handler: Option<Arc<dyn ExceptionHandler>>,
	config: HookConfig,
}

impl ViewContextBuilder {
	/// Delegate context lookups that miss locally to `ancestor`
	pub fn ancestor(mut self, ancestor: Arc<ViewContext>) -> Self {
		self.ancestor = Some(ancestor);
		self
	}

	/// Callback invoked whenever a state created with notification changes
	pub fn on_rebuild<F>(mut self, on_rebuild: F) -> Self
	where
		F: Fn() + Send + Sync + 'static,
	{
		self.on_rebuild = Some(Arc::new(on_rebuild));
		self
	}

	/// Sink for failed effect runs
	///
	/// Without one, the builder looks up an `Arc<dyn ExceptionHandler>`
	/// among the root services and falls back to [`LoggingExceptionHandler`].
	pub fn exception_handler(mut self, handler: Arc<dyn ExceptionHandler>) -> Self {
		self.exception_handler = Some(handler);
		self
	}

	/// Registry configuration
	pub fn config(mut self, config: HookConfig) -> Self {
		self.config = config;
		self
	}

	/// Build the registry
	///
	/// The effect queue captures the ambient tokio runtime, so build inside
	/// the runtime that should run the effects.
	pub fn build(self) -> ViewContext {
		let exception_handler = self
			.exception_handler
			.or_else(|| {
				self.services
					.get::<Arc<dyn ExceptionHandler>>()
					.map(|shared| Arc::clone(&*shared))
			})
			.unwrap_or_else(|| Arc::new(LoggingExceptionHandler));
		let effect_queue =
			EffectQueue::with_config(Arc::clone(&exception_handler), self.config.effect_queue().clone());
		let disposables = Disposables::new();
		disposables.add(effect_queue.clone());

		tracing::debug!(
			queue = self.config.effect_queue().name(),
			nested = self.ancestor.is_some(),
			"view context created"
		);

		ViewContext {
			calling_index: AtomicUsize::new(0),
			hooks: Mutex::new(HashMap::new()),
			contexts: ContextScope::new(),
			disposables,
			effect_queue,
			ancestor: self.ancestor,
			services: self.services,
			on_rebuild: self.on_rebuild,
			exception_handler,
			config: self.config,
			order: Mutex::new(HookOrder::default()),
			disposed: AtomicBool::new(false),
		}
	}
}

/// Hook registry of one component instance
///
/// # Examples
///
/// ```
/// use refrain_di::{ServiceCollection, ServiceProvider};
/// use refrain_effects::EffectTrigger;
/// use refrain_hooks::ViewContext;
/// use std::sync::Arc;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let services: Arc<dyn ServiceProvider> = Arc::new(ServiceCollection::new());
/// let view = ViewContext::builder(services).build();
///
/// for _ in 0..2 {
///     view.reset();
///     let clicks = view.use_state(0u32).unwrap();
///     view.use_effect_sync(
///         {
///             let clicks = clicks.clone();
///             move || println!("clicked {} times", clicks.get())
///         },
///         [EffectTrigger::after_change(&clicks)],
///     )
///     .unwrap();
///     clicks.update(|n| n + 1);
/// }
///
/// view.flush().await;
/// view.dispose();
/// # });
/// ```
pub struct ViewContext {
	calling_index: AtomicUsize,
	hooks: Mutex<HashMap<usize, HookSlot>>,
	contexts: ContextScope,
	disposables: Disposables,
	effect_queue: EffectQueue,
	ancestor: Option<Arc<ViewContext>>,
	services: Arc<dyn ServiceProvider>,
	on_rebuild: Option<RebuildCallback>,
	exception_handler: Arc<dyn ExceptionHandler>,
	config: HookConfig,
	order: Mutex<HookOrder>,
	disposed: AtomicBool,
}

impl ViewContext {
	/// Start building a root registry resolving services from `services`
	pub fn builder(services: Arc<dyn ServiceProvider>) -> ViewContextBuilder {
		ViewContextBuilder {
			services,
			ancestor: None,
			on_rebuild: None,
			exception_handler: None,
			config: HookConfig::default(),
		}
	}

	/// Start building a registry nested under this one
	///
	/// The child shares the root services, the exception sink and the
	/// configuration, and resolves missing contexts through `self`.
	pub fn child(self: &Arc<Self>) -> ViewContextBuilder {
		ViewContextBuilder {
			services: Arc::clone(&self.services),
			ancestor: Some(Arc::clone(self)),
			on_rebuild: None,
			exception_handler: Some(Arc::clone(&self.exception_handler)),
			config: self.config.clone(),
		}
	}

	/// Begin a build pass: the next hook call gets calling index zero
	///
	/// Must run exactly once before every pass.
	pub fn reset(&self) {
		self.calling_index.store(0, Ordering::SeqCst);
		if self.config.strict_hook_order() {
			self.order.lock().finish_pass();
		}
	}

	/// State cell at the current calling index, created from `initial` on
	/// the first pass
	///
	/// A change of the cell requests a rebuild from the host.
	pub fn use_state<T>(&self, initial: T) -> HookResult<State<T>>
	where
		T: Clone + PartialEq + Send + Sync + 'static,
	{
		self.use_state_with(move || initial, true)
	}

	/// State cell at the current calling index, created by `factory` on the
	/// first pass
	///
	/// The factory runs at most once per index. With `notify_on_change` set,
	/// every change of the cell invokes the host's rebuild callback.
	///
	/// # Errors
	///
	/// [`HookError::IdentityMismatch`] when the index holds a cell of another
	/// type and [`HookError::KindMismatch`] when it holds an effect.
	pub fn use_state_with<T, F>(&self, factory: F, notify_on_change: bool) -> HookResult<State<T>>
	where
		T: Clone + PartialEq + Send + Sync + 'static,
		F: FnOnce() -> T,
	{
		let index = self.next_index(HookKind::State)?;
		if let Some(existing) = self.stored_state::<T>(index)? {
			return Ok(existing);
		}

		let state = State::new(factory());
		self.disposables.add(state.clone());
		if notify_on_change && let Some(rebuild) = &self.on_rebuild {
			let rebuild = Arc::clone(rebuild);
			self.disposables.add(state.subscribe_changes(move |_| rebuild()));
		}
		self.hooks.lock().insert(
			index,
			HookSlot::State {
				cell: Box::new(state.clone()),
				type_name: type_name::<T>(),
			},
		);
		tracing::debug!(index, value_type = type_name::<T>(), notify_on_change, "state hook created");
		Ok(state)
	}

	/// Register an async effect at the current calling index
	///
	/// An empty trigger list means [`EffectTrigger::AfterInit`]. See
	/// [`ViewContext::use_effect_handler`].
	pub fn use_effect<F, Fut, O, I>(&self, handler: F, triggers: I) -> HookResult<()>
	where
		F: Fn() -> Fut + Send + Sync + 'static,
		Fut: Future<Output = O> + Send + 'static,
		O: IntoEffectOutput,
		I: IntoIterator<Item = EffectTrigger>,
	{
		self.use_effect_handler(async_handler(handler), triggers)
	}

	/// Register a synchronous effect at the current calling index
	pub fn use_effect_sync<F, O, I>(&self, handler: F, triggers: I) -> HookResult<()>
	where
		F: Fn() -> O + Send + Sync + 'static,
		O: IntoEffectOutput,
		I: IntoIterator<Item = EffectTrigger>,
	{
		self.use_effect_handler(sync_handler(handler), triggers)
	}

	/// Register an effect handler at the current calling index
	///
	/// On the first pass that reaches the index the record is created and
	/// wired once: `AfterChange` subscribes to its state without replay,
	/// `AfterRender` and `AfterInit` enqueue at their tiers. On later passes
	/// the record keeps its triggers, takes `handler` as its new handler and
	/// is re-enqueued only if it carries `AfterRender`.
	pub fn use_effect_handler<I>(&self, handler: EffectHandler, triggers: I) -> HookResult<()>
	where
		I: IntoIterator<Item = EffectTrigger>,
	{
		let index = self.next_index(HookKind::Effect)?;
		let existing = {
			let hooks = self.hooks.lock();
			match hooks.get(&index) {
				None => None,
				Some(HookSlot::Effect(effect)) => Some(Arc::clone(effect)),
				Some(slot) => {
					return Err(HookError::KindMismatch {
						index,
						expected: HookKind::Effect,
						found: slot.kind(),
					});
				}
			}
		};

		if let Some(effect) = existing {
			effect.replace_handler(handler);
			if effect
				.triggers()
				.iter()
				.any(|trigger| matches!(trigger, EffectTrigger::AfterRender))
			{
				self.effect_queue.enqueue(effect, EffectPriority::AfterRender);
			}
			return Ok(());
		}

		let effect = Arc::new(EffectHook::new(index, handler, triggers.into_iter().collect()));
		self.hooks
			.lock()
			.insert(index, HookSlot::Effect(Arc::clone(&effect)));
		for trigger in effect.triggers() {
			match trigger {
				EffectTrigger::AfterChange(state) => {
					let queue = self.effect_queue.clone();
					let weak = Arc::downgrade(&effect);
					let subscription = state.subscribe_any(Arc::new(move || {
						if let Some(effect) = weak.upgrade() {
							queue.enqueue(effect, EffectPriority::StateChange);
						}
					}));
					self.disposables.add(subscription);
				}
				EffectTrigger::AfterRender => {
					self.effect_queue
						.enqueue(Arc::clone(&effect), EffectPriority::AfterRender);
				}
				EffectTrigger::AfterInit => {
					self.effect_queue
						.enqueue(Arc::clone(&effect), EffectPriority::AfterInit);
				}
			}
		}
		tracing::debug!(index, triggers = effect.triggers().len(), "effect hook created");
		Ok(())
	}

	/// Value of type `T` scoped to this registry, created once by `factory`
	///
	/// Descendant registries resolve it through [`ViewContext::use_context`].
	pub fn create_context<T, F>(&self, factory: F) -> HookResult<Arc<T>>
	where
		T: Any + Send + Sync,
		F: FnOnce() -> T,
	{
		self.ensure_active()?;
		Ok(self.contexts.get_or_insert_with(factory))
	}

	/// Like [`ViewContext::create_context`], and the created value is
	/// disposed with this registry
	pub fn create_disposable_context<T, F>(&self, factory: F) -> HookResult<Arc<T>>
	where
		T: Disposable + Clone + Sync,
		F: FnOnce() -> T,
	{
		self.create_context(|| {
			let value = factory();
			self.disposables.add(value.clone());
			value
		})
	}

	/// Resolve `T` from this registry, then its ancestors, then the root
	/// services
	///
	/// # Errors
	///
	/// [`HookError::Dependency`] when nothing in the chain provides `T`.
	pub fn use_context<T>(&self) -> HookResult<Arc<T>>
	where
		T: Any + Send + Sync,
	{
		self.ensure_active()?;
		let mut current = Some(self);
		while let Some(context) = current {
			if let Some(value) = context.contexts.get::<T>() {
				return Ok(value);
			}
			current = context.ancestor.as_deref();
		}
		Ok(self.services.resolve::<T>()?)
	}

	/// Resolve `T` from the root services
	///
	/// # Errors
	///
	/// [`HookError::Dependency`] when no root service of type `T` exists.
	pub fn use_service<T>(&self) -> HookResult<Arc<T>>
	where
		T: Any + Send + Sync,
	{
		self.ensure_active()?;
		Ok(self.services.resolve::<T>()?)
	}

	/// Release `item` together with this registry
	pub fn track_disposable<D: Disposable>(&self, item: D) {
		self.disposables.add(item);
	}

	/// Release every item together with this registry
	pub fn track_disposables<I>(&self, items: I)
	where
		I: IntoIterator<Item = Box<dyn Disposable>>,
	{
		self.disposables.extend(items);
	}

	/// Wait until every queued effect has run
	pub async fn flush(&self) {
		self.effect_queue.flush().await;
	}

	/// Release everything this registry owns, once
	///
	/// Pending effects are dropped; a handler already running finishes
	/// detached. Use [`ViewContext::dispose_async`] to wait for it.
	pub fn dispose(&self) {
		if self.disposed.swap(true, Ordering::SeqCst) {
			return;
		}
		self.disposables.dispose_all();
		self.hooks.lock().clear();
		self.contexts.clear();
		tracing::debug!(queue = self.config.effect_queue().name(), "view context disposed");
	}

	/// Dispose and wait for a running effect handler to finish
	pub async fn dispose_async(&self) {
		self.effect_queue.dispose_async().await;
		self.dispose();
	}

	/// Whether [`ViewContext::dispose`] has run
	pub fn is_disposed(&self) -> bool {
		self.disposed.load(Ordering::SeqCst)
	}

	/// Calling index the next hook call will take
	pub fn calling_index(&self) -> usize {
		self.calling_index.load(Ordering::SeqCst)
	}

	/// Number of hooks registered so far
	pub fn hook_count(&self) -> usize {
		self.hooks.lock().len()
	}

	/// The registry's effect queue
	pub fn effect_queue(&self) -> &EffectQueue {
		&self.effect_queue
	}

	/// The exception sink used by the effect queue
	pub fn exception_handler(&self) -> &Arc<dyn ExceptionHandler> {
		&self.exception_handler
	}

	/// The root services
	pub fn services(&self) -> &Arc<dyn ServiceProvider> {
		&self.services
	}

	/// The registry this one delegates context lookups to
	pub fn ancestor(&self) -> Option<&Arc<ViewContext>> {
		self.ancestor.as_ref()
	}

	/// The registry's configuration
	pub fn config(&self) -> &HookConfig {
		&self.config
	}

	fn ensure_active(&self) -> HookResult<()> {
		if self.is_disposed() {
			return Err(HookError::Disposed);
		}
		Ok(())
	}

	fn next_index(&self, kind: HookKind) -> HookResult<usize> {
		self.ensure_active()?;
		let index = self.calling_index.fetch_add(1, Ordering::SeqCst);
		if self.config.strict_hook_order() {
			self.order.lock().current.push(kind);
		}
		Ok(index)
	}

	fn stored_state<T>(&self, index: usize) -> HookResult<Option<State<T>>>
	where
		T: Clone + PartialEq + Send + Sync + 'static,
	{
		let hooks = self.hooks.lock();
		match hooks.get(&index) {
			None => Ok(None),
			Some(HookSlot::State { cell, type_name: found }) => cell
				.downcast_ref::<State<T>>()
				.cloned()
				.map(Some)
				.ok_or(HookError::IdentityMismatch {
					index,
					expected: type_name::<T>(),
					found: *found,
				}),
			Some(slot) => Err(HookError::KindMismatch {
				index,
				expected: HookKind::State,
				found: slot.kind(),
			}),
		}
	}
}

impl fmt::Debug for ViewContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ViewContext")
			.field("calling_index", &self.calling_index())
			.field("hooks", &self.hook_count())
			.field("contexts", &self.contexts.len())
			.field("has_ancestor", &self.ancestor.is_some())
			.field("disposed", &self.is_disposed())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use refrain_di::ServiceCollection;
	use refrain_effects::{EffectQueueConfig, ExceptionHandlerPipeline};
	use rstest::{fixture, rstest};
	use std::sync::atomic::AtomicUsize;

	#[fixture]
	fn view() -> ViewContext {
		ViewContext::builder(Arc::new(ServiceCollection::new()))
			.config(
				HookConfig::new().with_effect_queue(EffectQueueConfig::new().with_auto_drain(false)),
			)
			.build()
	}

	fn strict_view() -> ViewContext {
		ViewContext::builder(Arc::new(ServiceCollection::new()))
			.config(
				HookConfig::new()
					.with_strict_hook_order(true)
					.with_effect_queue(EffectQueueConfig::new().with_auto_drain(false)),
			)
			.build()
	}

	#[rstest]
	fn test_strict_order_records_previous_pass() {
		// Arrange
		let view = strict_view();
		view.reset();
		view.use_state(1u8).unwrap();
		view.use_effect_sync(|| (), [EffectTrigger::AfterRender]).unwrap();
		view.reset();
		view.use_state(1u8).unwrap();

		// Act
		view.reset();

		// Assert
		let order = view.order.lock();
		assert_eq!(order.previous, Some(vec![HookKind::State]));
		assert!(order.current.is_empty());
	}

	#[rstest]
	#[case::fewer_hooks(vec![HookKind::State, HookKind::Effect], vec![HookKind::State], Some(1))]
	#[case::changed_kind(vec![HookKind::State, HookKind::Effect], vec![HookKind::Effect, HookKind::Effect], Some(0))]
	#[case::same_order(vec![HookKind::State], vec![HookKind::State], None)]
	fn test_finish_pass_reports_divergence(
		#[case] first: Vec<HookKind>,
		#[case] second: Vec<HookKind>,
		#[case] expected: Option<usize>,
	) {
		// Arrange
		let mut order = HookOrder::default();
		order.current = first;
		assert_eq!(order.finish_pass(), None);
		order.current = second.clone();

		// Act
		let divergence = order.finish_pass();

		// Assert
		assert_eq!(divergence, expected);
		assert_eq!(order.previous, Some(second));
	}

	#[rstest]
	fn test_use_state_returns_same_cell_across_passes(view: ViewContext) {
		// Arrange
		view.reset();
		let first = view.use_state(String::from("draft")).unwrap();
		first.set(String::from("published"));

		// Act
		view.reset();
		let second = view.use_state(String::from("ignored")).unwrap();

		// Assert
		assert!(State::ptr_eq(&first, &second));
		assert_eq!(second.get(), "published");
	}

	#[rstest]
	fn test_state_factory_runs_once(view: ViewContext) {
		// Arrange
		let calls = AtomicUsize::new(0);

		// Act
		for _ in 0..3 {
			view.reset();
			view.use_state_with(
				|| {
					calls.fetch_add(1, Ordering::SeqCst);
					7u8
				},
				false,
			)
			.unwrap();
		}

		// Assert
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[rstest]
	fn test_type_change_at_same_index_is_identity_mismatch(view: ViewContext) {
		// Arrange
		view.reset();
		view.use_state(1i32).unwrap();

		// Act
		view.reset();
		let result = view.use_state(String::new());

		// Assert
		assert_eq!(
			result.unwrap_err(),
			HookError::IdentityMismatch {
				index: 0,
				expected: type_name::<String>(),
				found: type_name::<i32>(),
			}
		);
	}

	#[rstest]
	fn test_effect_at_state_index_is_kind_mismatch(view: ViewContext) {
		// Arrange
		view.reset();
		view.use_state(false).unwrap();

		// Act
		view.reset();
		let result = view.use_effect_sync(|| (), []);

		// Assert
		assert_eq!(
			result.unwrap_err(),
			HookError::KindMismatch {
				index: 0,
				expected: HookKind::Effect,
				found: HookKind::State,
			}
		);
	}

	#[rstest]
	fn test_rebuild_requested_only_on_real_change() {
		// Arrange
		let rebuilds = Arc::new(AtomicUsize::new(0));
		let view = ViewContext::builder(Arc::new(ServiceCollection::new()))
			.on_rebuild({
				let rebuilds = Arc::clone(&rebuilds);
				move || {
					rebuilds.fetch_add(1, Ordering::SeqCst);
				}
			})
			.build();
		view.reset();
		let notified = view.use_state(0u32).unwrap();
		let quiet = view.use_state_with(|| 0u32, false).unwrap();

		// Act
		notified.set(0);
		notified.set(1);
		quiet.set(5);

		// Assert
		assert_eq!(rebuilds.load(Ordering::SeqCst), 1);
	}

	#[rstest]
	fn test_after_change_does_not_enqueue_at_registration(view: ViewContext) {
		// Arrange
		view.reset();
		let filter = view.use_state(String::new()).unwrap();

		// Act
		view.use_effect_sync(|| (), [EffectTrigger::after_change(&filter)])
			.unwrap();

		// Assert
		assert_eq!(view.effect_queue().pending_len(), 0);
		filter.set(String::from("open"));
		assert_eq!(view.effect_queue().pending_len(), 1);
	}

	#[rstest]
	fn test_disposed_context_rejects_hooks(view: ViewContext) {
		// Arrange
		view.reset();
		let state = view.use_state(3u8).unwrap();

		// Act
		view.dispose();

		// Assert
		assert!(state.is_disposed());
		assert!(view.effect_queue().is_disposed());
		assert_eq!(view.hook_count(), 0);
		assert_eq!(view.use_state(3u8).unwrap_err(), HookError::Disposed);
	}

	#[rstest]
	fn test_child_context_resolves_through_ancestor() {
		// Arrange
		let root = Arc::new(
			ViewContext::builder(Arc::new(ServiceCollection::new().with(42u64))).build(),
		);
		root.create_context(|| String::from("dark")).unwrap();
		let child = root.child().build();

		// Act
		let theme = child.use_context::<String>().unwrap();
		let service = child.use_context::<u64>().unwrap();
		let missing = child.use_context::<i8>();

		// Assert
		assert_eq!(*theme, "dark");
		assert_eq!(*service, 42);
		assert!(matches!(missing, Err(HookError::Dependency(_))));
	}

	#[rstest]
	fn test_exception_handler_resolved_from_services() {
		// Arrange
		let sink = ExceptionHandlerPipeline::new().use_fn(|_| true).build();
		let services = ServiceCollection::new().with(Arc::clone(&sink));

		// Act
		let view = ViewContext::builder(Arc::new(services)).build();

		// Assert
		assert!(Arc::ptr_eq(view.exception_handler(), &sink));
	}
}
