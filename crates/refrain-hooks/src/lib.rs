//! # Refrain Hooks
//!
//! The hook registry: per-component state cells and effect records keyed by
//! call order, plus scoped context and service resolution.
//!
//! ## Features
//!
//! - **State**: [`ViewContext::use_state`] returns the same cell on every
//!   pass that reaches the same calling index
//! - **Effects**: [`ViewContext::use_effect`] schedules handlers on the
//!   registry's effect queue after init, after every render, or after a
//!   state change
//! - **Context**: [`ViewContext::create_context`] and
//!   [`ViewContext::use_context`] share values down a tree of registries
//! - **Signals** (feature `signals`): `create_signal` and `use_signal`
//!   connect independent components
//!
//! ## Example
//!
//! ```rust
//! use refrain_di::{ServiceCollection, ServiceProvider};
//! use refrain_effects::EffectTrigger;
//! use refrain_hooks::ViewContext;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let services: Arc<dyn ServiceProvider> = Arc::new(ServiceCollection::new());
//! let view = ViewContext::builder(services).build();
//! let mounted = Arc::new(AtomicUsize::new(0));
//!
//! for _ in 0..3 {
//!     view.reset();
//!     let _title = view.use_state(String::from("Inbox")).unwrap();
//!     let mounted = Arc::clone(&mounted);
//!     view.use_effect(
//!         move || {
//!             let mounted = Arc::clone(&mounted);
//!             async move {
//!                 mounted.fetch_add(1, Ordering::SeqCst);
//!             }
//!         },
//!         [EffectTrigger::AfterInit],
//!     )
//!     .unwrap();
//! }
//!
//! view.flush().await;
//! assert_eq!(mounted.load(Ordering::SeqCst), 1);
//! # });
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod extensions;
#[cfg(feature = "signals")]
pub mod signals;

pub use config::HookConfig;
pub use context::{RebuildCallback, ViewContext, ViewContextBuilder};
pub use error::{HookError, HookKind, HookResult};
pub use extensions::Dispatch;
