//! Effect triggers and queue priorities

use refrain_core::{AnyState, ConvertedState, State};
use std::fmt;
use std::sync::Arc;

/// Condition under which an effect is scheduled
#[derive(Clone)]
pub enum EffectTrigger {
	/// Once, when the effect is first registered
	AfterInit,
	/// On every build pass that reaches the effect's hook call
	AfterRender,
	/// Whenever the bound state changes
	AfterChange(Arc<dyn AnyState>),
}

impl EffectTrigger {
	/// Fire once at first registration
	pub fn after_init() -> Self {
		Self::AfterInit
	}

	/// Fire after every build pass
	pub fn after_render() -> Self {
		Self::AfterRender
	}

	/// Fire whenever `state` changes
	///
	/// # Examples
	///
	/// ```
	/// use refrain_core::State;
	/// use refrain_effects::{EffectPriority, EffectTrigger};
	///
	/// let query = State::new(String::new());
	/// let trigger = EffectTrigger::after_change(&query);
	///
	/// assert_eq!(trigger.priority(), EffectPriority::StateChange);
	/// ```
	pub fn after_change<S>(state: &S) -> Self
	where
		S: AnyState + Clone + 'static,
	{
		Self::AfterChange(Arc::new(state.clone()))
	}

	/// Queue tier used when this trigger fires
	pub fn priority(&self) -> EffectPriority {
		match self {
			Self::AfterInit => EffectPriority::AfterInit,
			Self::AfterRender => EffectPriority::AfterRender,
			Self::AfterChange(_) => EffectPriority::StateChange,
		}
	}
}

impl fmt::Debug for EffectTrigger {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::AfterInit => f.write_str("AfterInit"),
			Self::AfterRender => f.write_str("AfterRender"),
			Self::AfterChange(state) => f.debug_tuple("AfterChange").field(&state.type_name()).finish(),
		}
	}
}

impl<T> From<&State<T>> for EffectTrigger
where
	T: Clone + PartialEq + Send + Sync + 'static,
{
	fn from(state: &State<T>) -> Self {
		Self::after_change(state)
	}
}

impl<T> From<State<T>> for EffectTrigger
where
	T: Clone + PartialEq + Send + Sync + 'static,
{
	fn from(state: State<T>) -> Self {
		Self::AfterChange(Arc::new(state))
	}
}

impl<F, T> From<&ConvertedState<F, T>> for EffectTrigger
where
	F: Clone + PartialEq + Send + Sync + 'static,
	T: 'static,
{
	fn from(state: &ConvertedState<F, T>) -> Self {
		Self::after_change(state)
	}
}

/// Effect queue tier, drained strictly in [`EffectPriority::ORDER`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EffectPriority {
	/// Scheduled by a bound state change
	StateChange,
	/// Scheduled by a build pass
	AfterRender,
	/// Scheduled by first registration
	AfterInit,
}

impl EffectPriority {
	/// Drain order within one cycle
	pub const ORDER: [Self; 3] = [Self::StateChange, Self::AfterRender, Self::AfterInit];

	/// Stable name for logs
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::StateChange => "state_change",
			Self::AfterRender => "after_render",
			Self::AfterInit => "after_init",
		}
	}
}

impl fmt::Display for EffectPriority {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
