//! Context scopes

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

type Entry = Arc<dyn Any + Send + Sync>;

/// Type-keyed singleton storage owned by one hook registry.
///
/// At most one value per type is held; storing a second value of the same
/// type replaces the first.
#[derive(Clone, Default)]
pub struct ContextScope {
	cache: Arc<RwLock<HashMap<TypeId, Entry>>>,
}

impl ContextScope {
	/// Creates a new ContextScope with an empty cache.
	///
	/// # Examples
	///
	/// ```
	/// use refrain_di::ContextScope;
	///
	/// let scope = ContextScope::new();
	/// assert!(scope.is_empty());
	/// ```
	pub fn new() -> Self {
		Self::default()
	}

	/// Retrieves a value from the scope by type.
	///
	/// Returns `None` if no value of type `T` exists in the scope.
	///
	/// # Examples
	///
	/// ```
	/// use refrain_di::ContextScope;
	///
	/// let scope = ContextScope::new();
	/// scope.set(100u64);
	///
	/// let value = scope.get::<u64>().unwrap();
	/// assert_eq!(*value, 100);
	/// ```
	pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
		self.get_any(TypeId::of::<T>())
			.and_then(|arc| arc.downcast::<T>().ok())
	}

	/// Retrieves the type-erased entry stored under `type_id`.
	pub fn get_any(&self, type_id: TypeId) -> Option<Entry> {
		let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
		cache.get(&type_id).cloned()
	}

	/// Stores a value in the scope, replacing any previous value of that type.
	pub fn set<T: Any + Send + Sync>(&self, value: T) {
		self.set_arc(Arc::new(value));
	}

	/// Stores a pre-wrapped `Arc<T>` in the scope.
	///
	/// # Examples
	///
	/// ```
	/// use refrain_di::ContextScope;
	/// use std::sync::Arc;
	///
	/// let scope = ContextScope::new();
	/// let value = Arc::new(42i32);
	/// scope.set_arc(Arc::clone(&value));
	///
	/// assert!(Arc::ptr_eq(&scope.get::<i32>().unwrap(), &value));
	/// ```
	pub fn set_arc<T: Any + Send + Sync>(&self, value: Arc<T>) {
		let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
		cache.insert(TypeId::of::<T>(), value);
	}

	/// Returns the stored `T`, creating it with `factory` on first use.
	///
	/// The factory runs without holding the scope lock, so it may read other
	/// entries of the same scope. If two callers race, the first stored value
	/// wins and both receive it.
	///
	/// # Examples
	///
	/// ```
	/// use refrain_di::ContextScope;
	///
	/// let scope = ContextScope::new();
	/// let first = scope.get_or_insert_with(|| String::from("theme:dark"));
	/// let second = scope.get_or_insert_with(|| String::from("ignored"));
	///
	/// assert_eq!(*second, "theme:dark");
	/// assert!(std::sync::Arc::ptr_eq(&first, &second));
	/// ```
	pub fn get_or_insert_with<T, F>(&self, factory: F) -> Arc<T>
	where
		T: Any + Send + Sync,
		F: FnOnce() -> T,
	{
		if let Some(existing) = self.get::<T>() {
			return existing;
		}
		let created = Arc::new(factory());
		let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
		let type_id = TypeId::of::<T>();
		if let Some(existing) = cache
			.get(&type_id)
			.and_then(|arc| Arc::clone(arc).downcast::<T>().ok())
		{
			return existing;
		}
		cache.insert(type_id, Arc::clone(&created) as Entry);
		created
	}

	/// Whether a value of type `T` is stored.
	pub fn contains<T: Any + Send + Sync>(&self) -> bool {
		let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
		cache.contains_key(&TypeId::of::<T>())
	}

	/// Number of stored values.
	pub fn len(&self) -> usize {
		self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
	}

	/// Whether the scope holds nothing.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Drops every stored value.
	pub fn clear(&self) {
		let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
		let dropped = cache.len();
		cache.clear();
		tracing::trace!(dropped, "context scope cleared");
	}
}

impl fmt::Debug for ContextScope {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ContextScope")
			.field("entries", &self.len())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[derive(Debug, PartialEq)]
	struct Theme(&'static str);

	#[rstest]
	fn test_set_replaces_same_type() {
		// Arrange
		let scope = ContextScope::new();
		scope.set(Theme("light"));

		// Act
		scope.set(Theme("dark"));

		// Assert
		assert_eq!(*scope.get::<Theme>().unwrap(), Theme("dark"));
		assert_eq!(scope.len(), 1);
	}

	#[rstest]
	fn test_factory_runs_once() {
		// Arrange
		let scope = ContextScope::new();
		let mut calls = 0;

		// Act
		for _ in 0..3 {
			scope.get_or_insert_with(|| {
				calls += 1;
				Theme("dark")
			});
		}

		// Assert
		assert_eq!(calls, 1);
	}

	#[rstest]
	fn test_factory_may_read_same_scope() {
		// Arrange
		let scope = ContextScope::new();
		scope.set(7u8);

		// Act
		let derived = scope.get_or_insert_with(|| u32::from(*scope.get::<u8>().unwrap()) * 2);

		// Assert
		assert_eq!(*derived, 14);
	}

	#[rstest]
	fn test_clones_share_storage() {
		// Arrange
		let scope = ContextScope::new();
		let alias = scope.clone();

		// Act
		alias.set(Theme("shared"));

		// Assert
		assert!(scope.contains::<Theme>());
	}

	#[rstest]
	fn test_clear_empties_scope() {
		// Arrange
		let scope = ContextScope::new();
		scope.set(1i32);
		scope.set("text");

		// Act
		scope.clear();

		// Assert
		assert!(scope.is_empty());
		assert!(scope.get::<i32>().is_none());
	}
}
