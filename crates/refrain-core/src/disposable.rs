//! Releasable resources and the aggregate that releases them together

use parking_lot::Mutex;
use std::fmt;

/// A resource that must be released explicitly, exactly once.
///
/// `dispose` consumes the boxed resource, so the type system rules out a
/// second release of the same handle.
pub trait Disposable: Send + 'static {
	/// Release the resource.
	fn dispose(self: Box<Self>);
}

impl Disposable for Box<dyn Disposable> {
	fn dispose(self: Box<Self>) {
		(*self).dispose()
	}
}

/// A disposable backed by a one-shot closure.
pub struct DisposeFn<F>
where
	F: FnOnce() + Send + 'static,
{
	release: F,
}

impl<F> DisposeFn<F>
where
	F: FnOnce() + Send + 'static,
{
	/// Wrap a release closure.
	pub fn new(release: F) -> Self {
		Self { release }
	}
}

impl<F> Disposable for DisposeFn<F>
where
	F: FnOnce() + Send + 'static,
{
	fn dispose(self: Box<Self>) {
		(self.release)()
	}
}

/// Create a boxed disposable from a release closure.
///
/// # Examples
///
/// ```
/// use refrain_core::disposable_fn;
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// let released = Arc::new(AtomicBool::new(false));
/// let handle = disposable_fn({
///     let released = Arc::clone(&released);
///     move || released.store(true, Ordering::SeqCst)
/// });
///
/// handle.dispose();
/// assert!(released.load(Ordering::SeqCst));
/// ```
pub fn disposable_fn<F>(release: F) -> Box<dyn Disposable>
where
	F: FnOnce() + Send + 'static,
{
	Box::new(DisposeFn::new(release))
}

#[derive(Default)]
struct DisposablesInner {
	items: Vec<Box<dyn Disposable>>,
	disposed: bool,
}

/// Groups many releasable resources and releases them together exactly once.
///
/// Every other component of the runtime delegates its teardown to one of
/// these. Items are released in insertion order. An item added after
/// [`Disposables::dispose_all`] has run is released immediately, so late
/// resources never leak.
///
/// # Examples
///
/// ```
/// use refrain_core::{Disposables, disposable_fn};
/// use std::sync::Arc;
/// use parking_lot::Mutex;
///
/// let order = Arc::new(Mutex::new(Vec::new()));
/// let disposables = Disposables::new();
///
/// for name in ["first", "second"] {
///     let order = Arc::clone(&order);
///     disposables.add_boxed(disposable_fn(move || order.lock().push(name)));
/// }
///
/// disposables.dispose_all();
/// assert_eq!(*order.lock(), vec!["first", "second"]);
/// ```
#[derive(Default)]
pub struct Disposables {
	inner: Mutex<DisposablesInner>,
}

impl Disposables {
	/// Create an empty aggregate.
	pub fn new() -> Self {
		Self::default()
	}

	/// Track a single resource.
	pub fn add<D: Disposable>(&self, item: D) {
		self.add_boxed(Box::new(item));
	}

	/// Track an already boxed resource.
	pub fn add_boxed(&self, item: Box<dyn Disposable>) {
		let mut inner = self.inner.lock();
		if inner.disposed {
			drop(inner);
			tracing::trace!("disposing resource added after teardown");
			item.dispose();
			return;
		}
		inner.items.push(item);
	}

	/// Track many resources at once, preserving their order.
	pub fn extend<I>(&self, items: I)
	where
		I: IntoIterator<Item = Box<dyn Disposable>>,
	{
		for item in items {
			self.add_boxed(item);
		}
	}

	/// Release every tracked resource exactly once and clear the list.
	///
	/// The lock is released before any resource runs its release logic, so
	/// a resource may safely touch this aggregate while being disposed.
	pub fn dispose_all(&self) {
		let items = {
			let mut inner = self.inner.lock();
			inner.disposed = true;
			std::mem::take(&mut inner.items)
		};
		for item in items {
			item.dispose();
		}
	}

	/// Number of resources currently tracked.
	pub fn len(&self) -> usize {
		self.inner.lock().items.len()
	}

	/// Whether nothing is currently tracked.
	pub fn is_empty(&self) -> bool {
		self.inner.lock().items.is_empty()
	}

	/// Whether [`Disposables::dispose_all`] has run.
	pub fn is_disposed(&self) -> bool {
		self.inner.lock().disposed
	}
}

impl Disposable for Disposables {
	fn dispose(self: Box<Self>) {
		self.dispose_all();
	}
}

impl fmt::Debug for Disposables {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let inner = self.inner.lock();
		f.debug_struct("Disposables")
			.field("tracked", &inner.items.len())
			.field("disposed", &inner.disposed)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::sync::Arc;
	use std::sync::atomic::{AtomicUsize, Ordering};

	fn counting(counter: &Arc<AtomicUsize>) -> Box<dyn Disposable> {
		let counter = Arc::clone(counter);
		disposable_fn(move || {
			counter.fetch_add(1, Ordering::SeqCst);
		})
	}

	#[rstest]
	fn test_dispose_all_releases_in_insertion_order() {
		// Arrange
		let order = Arc::new(Mutex::new(Vec::new()));
		let disposables = Disposables::new();
		for i in 0..5 {
			let order = Arc::clone(&order);
			disposables.add_boxed(disposable_fn(move || order.lock().push(i)));
		}

		// Act
		disposables.dispose_all();

		// Assert
		assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
		assert!(disposables.is_empty());
	}

	#[rstest]
	fn test_dispose_all_twice_releases_once() {
		// Arrange
		let counter = Arc::new(AtomicUsize::new(0));
		let disposables = Disposables::new();
		disposables.add_boxed(counting(&counter));
		disposables.add_boxed(counting(&counter));

		// Act
		disposables.dispose_all();
		disposables.dispose_all();

		// Assert
		assert_eq!(counter.load(Ordering::SeqCst), 2);
	}

	#[rstest]
	fn test_add_after_dispose_releases_immediately() {
		// Arrange
		let counter = Arc::new(AtomicUsize::new(0));
		let disposables = Disposables::new();
		disposables.dispose_all();

		// Act
		disposables.add_boxed(counting(&counter));

		// Assert
		assert_eq!(counter.load(Ordering::SeqCst), 1);
		assert!(disposables.is_empty());
		assert!(disposables.is_disposed());
	}

	#[rstest]
	fn test_extend_tracks_many() {
		// Arrange
		let counter = Arc::new(AtomicUsize::new(0));
		let disposables = Disposables::new();

		// Act
		disposables.extend((0..3).map(|_| counting(&counter)));

		// Assert
		assert_eq!(disposables.len(), 3);
		disposables.dispose_all();
		assert_eq!(counter.load(Ordering::SeqCst), 3);
	}

	#[rstest]
	fn test_nested_aggregate_is_released_with_parent() {
		// Arrange
		let counter = Arc::new(AtomicUsize::new(0));
		let child = Disposables::new();
		child.add_boxed(counting(&counter));
		let parent = Disposables::new();
		parent.add(child);

		// Act
		parent.dispose_all();

		// Assert
		assert_eq!(counter.load(Ordering::SeqCst), 1);
	}

	#[rstest]
	fn test_resource_may_touch_aggregate_while_disposing() {
		// Arrange
		let disposables = Arc::new(Disposables::new());
		let counter = Arc::new(AtomicUsize::new(0));
		{
			let disposables_ref = Arc::clone(&disposables);
			let counter = Arc::clone(&counter);
			disposables.add_boxed(disposable_fn(move || {
				// Re-entrant add during teardown must not deadlock
				disposables_ref.add_boxed(counting(&counter));
			}));
		}

		// Act
		disposables.dispose_all();

		// Assert
		assert_eq!(counter.load(Ordering::SeqCst), 1);
	}
}
