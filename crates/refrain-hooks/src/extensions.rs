//! Hooks built on top of `use_state`
//!
//! Each of these takes exactly one calling index, like the state hook they
//! are built on.

use crate::context::ViewContext;
use crate::error::HookResult;
use refrain_core::State;
use std::fmt;
use std::sync::Arc;

type Reducer<T, A> = Arc<dyn Fn(&T, A) -> T + Send + Sync>;

/// Sends actions to the state of a [`ViewContext::use_reducer`] hook
pub struct Dispatch<T, A> {
	state: State<T>,
	reducer: Reducer<T, A>,
}

impl<T, A> Dispatch<T, A>
where
	T: Clone + PartialEq + Send + Sync + 'static,
{
	/// Apply `action` to the current value and return the new one
	pub fn dispatch(&self, action: A) -> T {
		self.state.update(|previous| (self.reducer)(previous, action))
	}

	/// The state the reducer writes to
	pub fn state(&self) -> &State<T> {
		&self.state
	}
}

impl<T, A> Clone for Dispatch<T, A> {
	fn clone(&self) -> Self {
		Self {
			state: self.state.clone(),
			reducer: Arc::clone(&self.reducer),
		}
	}
}

impl<T, A> fmt::Debug for Dispatch<T, A> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Dispatch").finish_non_exhaustive()
	}
}

/// Stored value plus the dependencies it was computed from
#[derive(Clone)]
struct Memoized<T, D> {
	value: T,
	deps: D,
}

// Only dependencies take part in equality: a recomputation is stored
// whenever they differ, whatever the value.
impl<T, D: PartialEq> PartialEq for Memoized<T, D> {
	fn eq(&self, other: &Self) -> bool {
		self.deps == other.deps
	}
}

impl ViewContext {
	/// Value created on the first pass and never changed by the hook
	///
	/// Changes made through other means do not request a rebuild.
	pub fn use_static<T>(&self, initial: T) -> HookResult<T>
	where
		T: Clone + PartialEq + Send + Sync + 'static,
	{
		self.use_static_with(move || initial)
	}

	/// Like [`ViewContext::use_static`] with a lazily evaluated initial value
	pub fn use_static_with<T, F>(&self, factory: F) -> HookResult<T>
	where
		T: Clone + PartialEq + Send + Sync + 'static,
		F: FnOnce() -> T,
	{
		Ok(self.use_state_with(factory, false)?.get())
	}

	/// Current value and a dispatcher applying `reducer` to it
	///
	/// Each pass returns a dispatcher bound to that pass's reducer.
	///
	/// # Examples
	///
	/// ```
	/// use refrain_di::ServiceCollection;
	/// use refrain_hooks::ViewContext;
	/// use std::sync::Arc;
	///
	/// enum Action {
	///     Add(i64),
	///     Clear,
	/// }
	///
	/// let view = ViewContext::builder(Arc::new(ServiceCollection::new())).build();
	/// view.reset();
	/// let (total, dispatch) = view
	///     .use_reducer(
	///         |total: &i64, action: Action| match action {
	///             Action::Add(amount) => total + amount,
	///             Action::Clear => 0,
	///         },
	///         0,
	///     )
	///     .unwrap();
	///
	/// assert_eq!(total, 0);
	/// assert_eq!(dispatch.dispatch(Action::Add(5)), 5);
	/// assert_eq!(dispatch.dispatch(Action::Clear), 0);
	/// ```
	pub fn use_reducer<T, A, R>(&self, reducer: R, initial: T) -> HookResult<(T, Dispatch<T, A>)>
	where
		T: Clone + PartialEq + Send + Sync + 'static,
		R: Fn(&T, A) -> T + Send + Sync + 'static,
	{
		let state = self.use_state(initial)?;
		let dispatch = Dispatch {
			state: state.clone(),
			reducer: Arc::new(reducer),
		};
		Ok((state.get(), dispatch))
	}

	/// Value of `factory`, recomputed only when `deps` differ from the
	/// previous pass
	pub fn use_memo<T, D, F>(&self, factory: F, deps: D) -> HookResult<T>
	where
		T: Clone + Send + Sync + 'static,
		D: PartialEq + Clone + Send + Sync + 'static,
		F: FnOnce() -> T,
	{
		let memo = self.use_state_with(|| None::<Memoized<T, D>>, false)?;
		let cached = memo.with(|slot| {
			slot.as_ref()
				.filter(|memoized| memoized.deps == deps)
				.map(|memoized| memoized.value.clone())
		});
		if let Some(value) = cached {
			return Ok(value);
		}
		let value = factory();
		memo.set(Some(Memoized {
			value: value.clone(),
			deps,
		}));
		Ok(value)
	}

	/// `callback` as a shared handle that stays the same while `deps` are
	/// equal
	pub fn use_callback<F, D>(&self, callback: F, deps: D) -> HookResult<Arc<F>>
	where
		F: Send + Sync + 'static,
		D: PartialEq + Clone + Send + Sync + 'static,
	{
		self.use_memo(move || Arc::new(callback), deps)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use refrain_di::ServiceCollection;
	use rstest::{fixture, rstest};
	use std::sync::atomic::{AtomicUsize, Ordering};

	#[fixture]
	fn view() -> ViewContext {
		ViewContext::builder(Arc::new(ServiceCollection::new())).build()
	}

	#[rstest]
	fn test_use_static_keeps_first_value(view: ViewContext) {
		// Arrange
		view.reset();
		let first = view.use_static(10u16).unwrap();

		// Act
		view.reset();
		let second = view.use_static(99u16).unwrap();

		// Assert
		assert_eq!(first, 10);
		assert_eq!(second, 10);
	}

	#[rstest]
	fn test_reducer_value_reflects_previous_dispatch(view: ViewContext) {
		// Arrange
		view.reset();
		let (_, dispatch) = view
			.use_reducer(|items: &Vec<String>, item: String| {
				let mut next = items.clone();
				next.push(item);
				next
			}, Vec::new())
			.unwrap();
		dispatch.dispatch(String::from("apples"));

		// Act
		view.reset();
		let (items, _) = view
			.use_reducer(|items: &Vec<String>, _: String| items.clone(), Vec::new())
			.unwrap();

		// Assert
		assert_eq!(items, vec![String::from("apples")]);
	}

	#[rstest]
	fn test_memo_recomputes_only_when_deps_change(view: ViewContext) {
		// Arrange
		let computations = AtomicUsize::new(0);
		let mut results = Vec::new();

		// Act
		for deps in [("en", 1), ("en", 1), ("fr", 1), ("fr", 1)] {
			view.reset();
			let value = view
				.use_memo(
					|| {
						computations.fetch_add(1, Ordering::SeqCst);
						format!("{}-{}", deps.0, deps.1)
					},
					deps,
				)
				.unwrap();
			results.push(value);
		}

		// Assert
		assert_eq!(computations.load(Ordering::SeqCst), 2);
		assert_eq!(results, vec!["en-1", "en-1", "fr-1", "fr-1"]);
	}

	#[rstest]
	fn test_callback_handle_is_stable_while_deps_match(view: ViewContext) {
		// Arrange
		let make = |offset: i32| move |value: i32| value + offset;
		view.reset();
		let first = view.use_callback(make(1), 1).unwrap();

		// Act
		view.reset();
		let same = view.use_callback(make(1), 1).unwrap();
		view.reset();
		let changed = view.use_callback(make(2), 2).unwrap();

		// Assert
		assert!(Arc::ptr_eq(&first, &same));
		assert!(!Arc::ptr_eq(&first, &changed));
		assert_eq!(changed(10), 12);
	}
}
