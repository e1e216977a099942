//! The hook registry.
//!
//! # Examples
//!
//! ```rust,no_run
//! use refrain::hooks::{HookConfig, ViewContext};
//! ```

#[cfg(feature = "hooks")]
pub use refrain_hooks::*;
