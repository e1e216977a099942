//! Context storage and root service resolution.
//!
//! # Examples
//!
//! ```rust
//! use refrain::di::{ServiceCollection, ServiceProvider};
//! use std::sync::Arc;
//!
//! let services: Arc<dyn ServiceProvider> =
//!     Arc::new(ServiceCollection::new().with(String::from("en-GB")));
//! assert_eq!(*services.resolve::<String>().unwrap(), "en-GB");
//! ```

pub use refrain_di::*;
