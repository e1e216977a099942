//! Observable state cells
//!
//! A [`State`] holds one piece of component-owned state. Writing a value equal
//! to the current one is a no-op; any other write stores the value and then
//! notifies every live observer synchronously, in subscription order.
//!
//! Two subscription flavours exist:
//!
//! - [`State::subscribe`] replays the current value to the new observer before
//!   following future changes ("latest snapshot, then changes").
//! - [`State::subscribe_changes`] only follows future changes. Rebuild requests
//!   and effect triggers are wired through this one.

use crate::disposable::Disposable;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Observer callback receiving each new value.
pub type Observer<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct ObserverList<T> {
	next_id: u64,
	entries: Vec<(u64, Observer<T>)>,
}

impl<T> ObserverList<T> {
	fn new() -> Self {
		Self {
			next_id: 0,
			entries: Vec::new(),
		}
	}
}

struct StateInner<T> {
	value: RwLock<T>,
	observers: Mutex<ObserverList<T>>,
	disposed: AtomicBool,
}

impl<T> StateInner<T> {
	fn attach(&self, observer: Observer<T>) -> Option<u64> {
		if self.disposed.load(Ordering::Acquire) {
			return None;
		}
		let mut observers = self.observers.lock();
		let id = observers.next_id;
		observers.next_id += 1;
		observers.entries.push((id, observer));
		Some(id)
	}

	fn detach(&self, id: u64) {
		self.observers.lock().entries.retain(|(entry, _)| *entry != id);
	}

	fn snapshot(&self) -> Vec<Observer<T>> {
		self.observers
			.lock()
			.entries
			.iter()
			.map(|(_, observer)| Arc::clone(observer))
			.collect()
	}
}

/// An observable value box with equality-gated change notification.
///
/// `State` is a cheap handle: clones share the same cell, and
/// [`State::ptr_eq`] tells whether two handles point at the same cell.
///
/// The cell assumes a single logical writer (the owning component). Readers
/// and observers may live on any thread.
///
/// # Examples
///
/// ```
/// use refrain_core::State;
///
/// let name = State::new(String::from("draft"));
/// let alias = name.clone();
///
/// alias.set("published".to_string());
/// assert_eq!(name.get(), "published");
/// assert!(State::ptr_eq(&name, &alias));
/// ```
pub struct State<T> {
	inner: Arc<StateInner<T>>,
}

impl<T> State<T>
where
	T: Clone + PartialEq + Send + Sync + 'static,
{
	/// Create a cell holding `initial`.
	pub fn new(initial: T) -> Self {
		Self {
			inner: Arc::new(StateInner {
				value: RwLock::new(initial),
				observers: Mutex::new(ObserverList::new()),
				disposed: AtomicBool::new(false),
			}),
		}
	}

	/// Clone of the current value.
	pub fn get(&self) -> T {
		self.inner.value.read().clone()
	}

	/// Borrow the current value for the duration of `f`.
	///
	/// Calling [`State::set`] on the same cell from inside `f` deadlocks.
	pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
		f(&self.inner.value.read())
	}

	/// Store `value` and notify observers, unless it equals the current value.
	///
	/// Returns `true` when the value changed.
	pub fn set(&self, value: T) -> bool {
		{
			let mut current = self.inner.value.write();
			if *current == value {
				return false;
			}
			*current = value.clone();
		}
		self.notify(&value);
		true
	}

	/// Compute the next value from the current one, store it and return it.
	///
	/// # Examples
	///
	/// ```
	/// use refrain_core::State;
	///
	/// let count = State::new(1);
	/// assert_eq!(count.update(|n| n + 1), 2);
	/// ```
	pub fn update(&self, f: impl FnOnce(&T) -> T) -> T {
		let next = f(&self.get());
		self.set(next.clone());
		next
	}

	/// Replay the current value to `observer`, then follow future changes.
	///
	/// The returned [`Subscription`] removes the observer when disposed.
	pub fn subscribe<F>(&self, observer: F) -> Subscription
	where
		F: Fn(&T) + Send + Sync + 'static,
	{
		let observer: Observer<T> = Arc::new(observer);
		if self.is_disposed() {
			return Subscription::detached();
		}
		let current = self.get();
		observer(&current);
		self.attach(observer)
	}

	/// Follow future changes only, without replaying the current value.
	pub fn subscribe_changes<F>(&self, observer: F) -> Subscription
	where
		F: Fn(&T) + Send + Sync + 'static,
	{
		self.attach(Arc::new(observer))
	}

	/// Number of live observers.
	pub fn observer_count(&self) -> usize {
		self.inner.observers.lock().entries.len()
	}

	fn attach(&self, observer: Observer<T>) -> Subscription {
		match self.inner.attach(observer) {
			Some(id) => {
				let weak: Weak<StateInner<T>> = Arc::downgrade(&self.inner);
				Subscription::new(move || {
					if let Some(inner) = weak.upgrade() {
						inner.detach(id);
					}
				})
			}
			None => Subscription::detached(),
		}
	}

	fn notify(&self, value: &T) {
		if self.is_disposed() {
			return;
		}
		// Observers run without the list lock so they may subscribe or write
		for observer in self.inner.snapshot() {
			observer(value);
		}
	}
}

impl<T> State<T> {
	/// Whether two handles share the same cell.
	pub fn ptr_eq(a: &Self, b: &Self) -> bool {
		Arc::ptr_eq(&a.inner, &b.inner)
	}

	/// Whether [`State::dispose`] has run on this cell.
	pub fn is_disposed(&self) -> bool {
		self.inner.disposed.load(Ordering::Acquire)
	}

	/// Stop notifying anyone and release every observer.
	///
	/// The value stays readable; later writes are stored silently.
	pub fn dispose(&self) {
		self.inner.disposed.store(true, Ordering::Release);
		self.inner.observers.lock().entries.clear();
	}
}

impl<T> Clone for State<T> {
	fn clone(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
		}
	}
}

impl<T> Disposable for State<T>
where
	T: Send + Sync + 'static,
{
	fn dispose(self: Box<Self>) {
		State::dispose(&self);
	}
}

impl<T> fmt::Debug for State<T>
where
	T: fmt::Debug,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("State")
			.field("value", &*self.inner.value.read())
			.field("disposed", &self.inner.disposed.load(Ordering::Relaxed))
			.finish()
	}
}

impl<T> fmt::Display for State<T>
where
	T: fmt::Display,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.inner.value.read())
	}
}

/// Handle removing one observer from a cell.
///
/// Dropping the handle keeps the observer attached; release it through
/// [`Subscription::unsubscribe`] or by tracking it in a
/// [`Disposables`](crate::Disposables) aggregate.
#[must_use = "an unsubscribed observer stays attached for the lifetime of the cell"]
pub struct Subscription {
	release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
	/// Subscription running `release` when disposed.
	pub fn new<F>(release: F) -> Self
	where
		F: FnOnce() + Send + 'static,
	{
		Self {
			release: Some(Box::new(release)),
		}
	}

	/// Subscription that is already inert.
	pub fn detached() -> Self {
		Self { release: None }
	}

	/// Remove the observer.
	pub fn unsubscribe(mut self) {
		if let Some(release) = self.release.take() {
			release();
		}
	}

	/// Whether disposing this subscription would detach anything.
	pub fn is_active(&self) -> bool {
		self.release.is_some()
	}
}

impl Disposable for Subscription {
	fn dispose(self: Box<Self>) {
		(*self).unsubscribe();
	}
}

impl fmt::Debug for Subscription {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subscription")
			.field("active", &self.is_active())
			.finish()
	}
}

/// Type-erased view of a state cell, used to bind triggers to any state.
pub trait AnyState: Send + Sync {
	/// Run `action` on every future change, without replay.
	fn subscribe_any(&self, action: Arc<dyn Fn() + Send + Sync>) -> Subscription;

	/// Name of the value type, for diagnostics.
	fn type_name(&self) -> &'static str;
}

impl<T> AnyState for State<T>
where
	T: Clone + PartialEq + Send + Sync + 'static,
{
	fn subscribe_any(&self, action: Arc<dyn Fn() + Send + Sync>) -> Subscription {
		self.subscribe_changes(move |_| action())
	}

	fn type_name(&self) -> &'static str {
		std::any::type_name::<T>()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::sync::atomic::AtomicUsize;

	fn recorder<T: Clone + Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl Fn(&T) + Send + Sync + 'static)
	{
		let log = Arc::new(Mutex::new(Vec::new()));
		let sink = Arc::clone(&log);
		(log, move |value: &T| sink.lock().push(value.clone()))
	}

	#[rstest]
	fn test_equal_value_does_not_notify() {
		// Arrange
		let state = State::new(5);
		let (log, observer) = recorder::<i32>();
		let _subscription = state.subscribe_changes(observer);

		// Act
		let changed = state.set(5);

		// Assert
		assert!(!changed);
		assert!(log.lock().is_empty());
	}

	#[rstest]
	fn test_subscribe_replays_current_value_first() {
		// Arrange
		let state = State::new("initial".to_string());
		let (log, observer) = recorder::<String>();

		// Act
		let _subscription = state.subscribe(observer);
		state.set("next".to_string());

		// Assert
		assert_eq!(*log.lock(), vec!["initial".to_string(), "next".to_string()]);
	}

	#[rstest]
	fn test_subscribe_changes_does_not_replay() {
		// Arrange
		let state = State::new(1);
		let (log, observer) = recorder::<i32>();

		// Act
		let _subscription = state.subscribe_changes(observer);

		// Assert
		assert!(log.lock().is_empty());
	}

	#[rstest]
	fn test_observers_notified_in_subscription_order() {
		// Arrange
		let state = State::new(0);
		let order = Arc::new(Mutex::new(Vec::new()));
		let mut subscriptions = Vec::new();
		for tag in ["a", "b", "c"] {
			let order = Arc::clone(&order);
			subscriptions.push(state.subscribe_changes(move |_| order.lock().push(tag)));
		}

		// Act
		state.set(1);

		// Assert
		assert_eq!(*order.lock(), vec!["a", "b", "c"]);
	}

	#[rstest]
	fn test_unsubscribe_stops_notifications() {
		// Arrange
		let state = State::new(0);
		let (log, observer) = recorder::<i32>();
		let subscription = state.subscribe_changes(observer);
		state.set(1);

		// Act
		subscription.unsubscribe();
		state.set(2);

		// Assert
		assert_eq!(*log.lock(), vec![1]);
		assert_eq!(state.observer_count(), 0);
	}

	#[rstest]
	fn test_dispose_silences_cell_but_keeps_value() {
		// Arrange
		let state = State::new(0);
		let (log, observer) = recorder::<i32>();
		let _subscription = state.subscribe_changes(observer);

		// Act
		state.dispose();
		state.set(3);

		// Assert
		assert!(log.lock().is_empty());
		assert_eq!(state.get(), 3);
		assert!(state.is_disposed());
	}

	#[rstest]
	fn test_subscribe_after_dispose_is_detached() {
		// Arrange
		let state = State::new(0);
		state.dispose();
		let (log, observer) = recorder::<i32>();

		// Act
		let subscription = state.subscribe(observer);

		// Assert
		assert!(!subscription.is_active());
		assert!(log.lock().is_empty());
	}

	#[rstest]
	fn test_observer_may_write_back_without_deadlock() {
		// Arrange
		let state = State::new(0);
		let writer = state.clone();
		let _subscription = state.subscribe_changes(move |value: &i32| {
			if *value < 3 {
				writer.set(value + 1);
			}
		});

		// Act
		state.set(1);

		// Assert
		assert_eq!(state.get(), 3);
	}

	#[rstest]
	fn test_update_returns_new_value() {
		// Arrange
		let state = State::new(vec![1]);

		// Act
		let next = state.update(|items| {
			let mut items = items.clone();
			items.push(2);
			items
		});

		// Assert
		assert_eq!(next, vec![1, 2]);
		assert_eq!(state.get(), vec![1, 2]);
	}

	#[rstest]
	fn test_any_state_fires_on_change_only() {
		// Arrange
		let state = State::new(10u8);
		let fired = Arc::new(AtomicUsize::new(0));
		let any: &dyn AnyState = &state;
		let _subscription = any.subscribe_any({
			let fired = Arc::clone(&fired);
			Arc::new(move || {
				fired.fetch_add(1, Ordering::SeqCst);
			})
		});

		// Act
		state.set(10);
		state.set(11);

		// Assert
		assert_eq!(fired.load(Ordering::SeqCst), 1);
		assert_eq!(any.type_name(), "u8");
	}
}
