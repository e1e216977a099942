//! State cells and disposal primitives.
//!
//! # Examples
//!
//! ```rust
//! use refrain::core::{Disposables, State};
//!
//! let owned = Disposables::new();
//! let title = State::new(String::from("Inbox"));
//! owned.add(title.clone());
//!
//! owned.dispose_all();
//! assert!(title.is_disposed());
//! ```

pub use refrain_core::*;
