//! Root service providers

use crate::{ContextScope, DiError, DiResult};
use std::any::{Any, TypeId};
use std::sync::Arc;

/// Terminal source of shared services, supplied by the host.
///
/// Hook registries consult it after every context scope in the ancestor chain
/// has missed.
pub trait ServiceProvider: Send + Sync {
	/// Returns the service registered under `type_id`, if any.
	fn get_service(&self, type_id: TypeId) -> Option<Arc<dyn Any + Send + Sync>>;
}

impl<'a> dyn ServiceProvider + 'a {
	/// Typed lookup.
	pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
		self.get_service(TypeId::of::<T>())
			.and_then(|service| service.downcast::<T>().ok())
	}

	/// Typed lookup failing with [`DiError::MissingDependency`].
	pub fn resolve<T: Any + Send + Sync>(&self) -> DiResult<Arc<T>> {
		self.get::<T>().ok_or_else(DiError::missing::<T>)
	}
}

impl ServiceProvider for ContextScope {
	fn get_service(&self, type_id: TypeId) -> Option<Arc<dyn Any + Send + Sync>> {
		self.get_any(type_id)
	}
}

/// A fixed set of services built up front.
///
/// # Examples
///
/// ```
/// use refrain_di::{ServiceCollection, ServiceProvider};
/// use std::sync::Arc;
///
/// let services = ServiceCollection::new()
///     .with(String::from("https://api.example.com"))
///     .with(3u8);
/// let provider: Arc<dyn ServiceProvider> = Arc::new(services);
///
/// assert_eq!(*provider.get::<u8>().unwrap(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ServiceCollection {
	services: ContextScope,
}

impl ServiceCollection {
	/// An empty collection.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a service.
	pub fn with<T: Any + Send + Sync>(self, service: T) -> Self {
		self.services.set(service);
		self
	}

	/// Adds an already shared service.
	pub fn with_arc<T: Any + Send + Sync>(self, service: Arc<T>) -> Self {
		self.services.set_arc(service);
		self
	}

	/// Adds a service after construction.
	pub fn insert<T: Any + Send + Sync>(&self, service: T) {
		self.services.set(service);
	}

	/// Number of registered services.
	pub fn len(&self) -> usize {
		self.services.len()
	}

	/// Whether no service is registered.
	pub fn is_empty(&self) -> bool {
		self.services.is_empty()
	}
}

impl ServiceProvider for ServiceCollection {
	fn get_service(&self, type_id: TypeId) -> Option<Arc<dyn Any + Send + Sync>> {
		self.services.get_any(type_id)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	trait Greeter: Send + Sync {
		fn greet(&self) -> String;
	}

	struct English;

	impl Greeter for English {
		fn greet(&self) -> String {
			"hello".into()
		}
	}

	#[rstest]
	fn test_resolve_missing_reports_type_name() {
		// Arrange
		let provider: Arc<dyn ServiceProvider> = Arc::new(ServiceCollection::new());

		// Act
		let result = provider.resolve::<u16>();

		// Assert
		assert_eq!(result.unwrap_err(), DiError::MissingDependency { type_name: "u16" });
	}

	#[rstest]
	fn test_trait_objects_resolve_through_arc_wrapper() {
		// Arrange
		let greeter: Arc<dyn Greeter> = Arc::new(English);
		let provider: Arc<dyn ServiceProvider> =
			Arc::new(ServiceCollection::new().with(greeter));

		// Act
		let resolved = provider.resolve::<Arc<dyn Greeter>>().unwrap();

		// Assert
		assert_eq!(resolved.greet(), "hello");
	}

	#[rstest]
	fn test_context_scope_acts_as_provider() {
		// Arrange
		let scope = ContextScope::new();
		scope.set(5i64);
		let provider: &dyn ServiceProvider = &scope;

		// Act
		let value = provider.get::<i64>();

		// Assert
		assert_eq!(value.as_deref(), Some(&5));
	}
}
