//! Typed views of a state cell through an explicit conversion pair

use crate::state::{AnyState, State, Subscription};
use std::fmt;
use std::sync::Arc;

type Forward<F, T> = Arc<dyn Fn(&F) -> T + Send + Sync>;
type Backward<F, T> = Arc<dyn Fn(&T) -> F + Send + Sync>;

/// A [`State<F>`] seen as a state of `T`.
///
/// Reads go through `forward`, writes through `backward`. Equality gating
/// still happens on the source cell, so a write whose backward conversion
/// equals the stored source value notifies no one.
///
/// # Examples
///
/// ```
/// use refrain_core::State;
///
/// let celsius = State::new(100.0_f64);
/// let fahrenheit = celsius.convert(|c| c * 9.0 / 5.0 + 32.0, |f: &f64| (f - 32.0) * 5.0 / 9.0);
///
/// assert_eq!(fahrenheit.get(), 212.0);
/// fahrenheit.set(32.0);
/// assert_eq!(celsius.get(), 0.0);
/// ```
pub struct ConvertedState<F, T> {
	source: State<F>,
	forward: Forward<F, T>,
	backward: Backward<F, T>,
}

impl<F> State<F>
where
	F: Clone + PartialEq + Send + Sync + 'static,
{
	/// View this cell as a `State<T>` through a forward/backward pair.
	pub fn convert<T, Fw, Bw>(&self, forward: Fw, backward: Bw) -> ConvertedState<F, T>
	where
		Fw: Fn(&F) -> T + Send + Sync + 'static,
		Bw: Fn(&T) -> F + Send + Sync + 'static,
	{
		ConvertedState {
			source: self.clone(),
			forward: Arc::new(forward),
			backward: Arc::new(backward),
		}
	}
}

impl<F, T> ConvertedState<F, T>
where
	F: Clone + PartialEq + Send + Sync + 'static,
	T: 'static,
{
	/// Current source value, converted forward.
	pub fn get(&self) -> T {
		self.source.with(|value| (self.forward)(value))
	}

	/// Convert `value` backward and write it to the source cell.
	pub fn set(&self, value: T) -> bool {
		self.source.set((self.backward)(&value))
	}

	/// Compute the next converted value from the current one and store it.
	pub fn update(&self, f: impl FnOnce(&T) -> T) -> T
	where
		T: Clone,
	{
		let next = f(&self.get());
		self.set(next.clone());
		next
	}

	/// Replay the converted current value, then follow converted changes.
	pub fn subscribe<O>(&self, observer: O) -> Subscription
	where
		O: Fn(&T) + Send + Sync + 'static,
	{
		let forward = Arc::clone(&self.forward);
		self.source.subscribe(move |value| observer(&forward(value)))
	}

	/// Follow converted changes only.
	pub fn subscribe_changes<O>(&self, observer: O) -> Subscription
	where
		O: Fn(&T) + Send + Sync + 'static,
	{
		let forward = Arc::clone(&self.forward);
		self.source.subscribe_changes(move |value| observer(&forward(value)))
	}

	/// The underlying cell.
	pub fn source(&self) -> &State<F> {
		&self.source
	}
}

impl<F, T> Clone for ConvertedState<F, T> {
	fn clone(&self) -> Self {
		Self {
			source: self.source.clone(),
			forward: Arc::clone(&self.forward),
			backward: Arc::clone(&self.backward),
		}
	}
}

impl<F, T> AnyState for ConvertedState<F, T>
where
	F: Clone + PartialEq + Send + Sync + 'static,
	T: 'static,
{
	fn subscribe_any(&self, action: Arc<dyn Fn() + Send + Sync>) -> Subscription {
		self.source.subscribe_any(action)
	}

	fn type_name(&self) -> &'static str {
		std::any::type_name::<T>()
	}
}

impl<F, T> fmt::Debug for ConvertedState<F, T>
where
	F: fmt::Debug,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ConvertedState")
			.field("source", &self.source)
			.field("target", &std::any::type_name::<T>())
			.finish()
	}
}
