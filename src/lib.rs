//! # Refrain
//!
//! Call-site-stable state, scheduled effects and signals for declarative
//! view trees.
//!
//! A host render loop gives every component instance a [`ViewContext`]. The
//! component's build function calls hooks on it in a fixed order; each hook
//! is identified by its position in that order, so the same call returns the
//! same [`State`] cell on every pass. Side effects registered with
//! `use_effect` run later, on the context's [`EffectQueue`], one at a time
//! and tier by tier.
//!
//! ## Feature Flags
//!
//! ### Presets
//!
//! - `minimal` - state cells, effects and the hook registry
//! - `full` (default) - everything below
//!
//! ### Fine-grained Control
//!
//! - `hooks` - the [`ViewContext`] hook registry
//! - `signals` - receiver-keyed broadcast signals and the signal hooks
//! - `logging` - [`logging::init`] installing a `tracing-subscriber` formatter
//! - `config` - loading [`RefrainConfig`] from TOML
//!
//! ## Quick Example
//!
//! ```rust
//! use refrain::prelude::*;
//! use std::sync::Arc;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let services: Arc<dyn ServiceProvider> = Arc::new(ServiceCollection::new());
//! let view = ViewContext::builder(services).build();
//!
//! view.reset();
//! let count = view.use_state(0u32).unwrap();
//! view.use_effect_sync(
//!     {
//!         let count = count.clone();
//!         move || println!("count is now {}", count.get())
//!     },
//!     [EffectTrigger::after_change(&count)],
//! )
//! .unwrap();
//!
//! count.set(1);
//! view.flush().await;
//! view.dispose();
//! # });
//! ```

pub mod core;
pub mod di;
pub mod effects;
#[cfg(feature = "hooks")]
pub mod hooks;
pub mod logging;
#[cfg(feature = "signals")]
pub mod signals;

#[cfg(feature = "config")]
pub mod config;

// Re-export state and disposal primitives
pub use refrain_core::{
	AnyState, ConvertedState, Disposable, Disposables, State, Subscription, disposable_fn,
};

// Re-export context storage and root services
pub use refrain_di::{ContextScope, DiError, DiResult, ServiceCollection, ServiceProvider};

// Re-export effects
pub use refrain_effects::{
	EffectError, EffectFailure, EffectHook, EffectPriority, EffectQueue, EffectQueueConfig,
	EffectTrigger, ExceptionHandler, ExceptionHandlerPipeline, LoggingExceptionHandler,
};

// Re-export the hook registry
#[cfg(feature = "hooks")]
pub use refrain_hooks::{
	Dispatch, HookConfig, HookError, HookKind, HookResult, ViewContext, ViewContextBuilder,
};

// Re-export signals
#[cfg(feature = "signals")]
pub use refrain_signals::{
	ReceiverId, Signal, SignalError, SignalKind, SignalReceiver, SignalResponse, SignalSender,
};

// Re-export configuration
#[cfg(feature = "config")]
pub use config::{ConfigError, RefrainConfig};
pub use logging::LoggingConfig;

/// Prelude module for convenient imports
///
/// Import everything a component build function needs with:
/// ```rust
/// use refrain::prelude::*;
/// ```
pub mod prelude {
	// Core types - always available
	pub use crate::{
		Disposable, Disposables, EffectPriority, EffectTrigger, ExceptionHandler,
		ExceptionHandlerPipeline, ServiceCollection, ServiceProvider, State, Subscription,
		disposable_fn,
	};

	#[cfg(feature = "hooks")]
	pub use crate::{Dispatch, HookError, HookResult, ViewContext};

	#[cfg(feature = "signals")]
	pub use crate::{ReceiverId, Signal, SignalKind, SignalReceiver, SignalResponse};

	#[cfg(feature = "config")]
	pub use crate::RefrainConfig;
}
