//! # Refrain Dependency Injection
//!
//! Type-keyed storage used by the hook registry to share values down a
//! component tree.
//!
//! ## Features
//!
//! - **Scoped**: every hook registry owns one [`ContextScope`]
//! - **Chained**: registries search their own scope, then their ancestors'
//! - **Rooted**: the chain terminates at a [`ServiceProvider`] supplied by the host
//!
//! ## Example
//!
//! ```rust
//! use refrain_di::{ServiceCollection, ServiceProvider};
//! use std::sync::Arc;
//!
//! struct Clock(u64);
//!
//! let services: Arc<dyn ServiceProvider> = Arc::new(ServiceCollection::new().with(Clock(7)));
//!
//! let clock = services.resolve::<Clock>().unwrap();
//! assert_eq!(clock.0, 7);
//! assert!(services.resolve::<String>().is_err());
//! ```

pub mod provider;
pub mod scope;

pub use provider::{ServiceCollection, ServiceProvider};
pub use scope::ContextScope;

/// Dependency resolution error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiError {
	/// No scope in the chain and no root service holds the requested type
	#[error(
		"Required dependency not found: {type_name}\nRegister it with create_context on an ancestor or in the root service provider."
	)]
	MissingDependency {
		/// Name of the requested type
		type_name: &'static str,
	},
}

impl DiError {
	/// Missing dependency error for `T`.
	pub fn missing<T: ?Sized>() -> Self {
		Self::MissingDependency {
			type_name: std::any::type_name::<T>(),
		}
	}
}

/// Result type for dependency resolution
pub type DiResult<T> = Result<T, DiError>;
