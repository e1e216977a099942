//! # Refrain Effects
//!
//! Effect records, their triggers, and the queue that runs them.
//!
//! An [`EffectHook`] pairs an asynchronous handler with the
//! [`EffectTrigger`]s that schedule it. The [`EffectQueue`] executes queued
//! effects one at a time, tier by tier in [`EffectPriority::ORDER`],
//! coalescing repeated entries of the same effect within a tier. Handler
//! failures never escape the queue: they are delivered to an
//! [`ExceptionHandler`].
//!
//! ## Example
//!
//! ```rust
//! use refrain_effects::{
//!     EffectHook, EffectPriority, EffectQueue, EffectQueueConfig, ExceptionHandlerPipeline,
//! };
//! use std::sync::Arc;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let sink = ExceptionHandlerPipeline::new()
//!     .use_fn(|failure| {
//!         eprintln!("{failure}");
//!         true
//!     })
//!     .build();
//! let queue = EffectQueue::with_config(sink, EffectQueueConfig::new().with_auto_drain(false));
//!
//! let effect = Arc::new(EffectHook::from_async(0, || async { Err::<(), _>("offline") }, vec![]));
//! queue.enqueue(effect, EffectPriority::AfterInit);
//! queue.flush().await;
//! assert_eq!(queue.pending_len(), 0);
//! # });
//! ```

pub mod config;
pub mod error;
pub mod exception;
pub mod hook;
pub mod queue;
pub mod trigger;

pub use config::EffectQueueConfig;
pub use error::{EffectError, EffectFailure};
pub use exception::{ExceptionHandler, ExceptionHandlerPipeline, LoggingExceptionHandler};
pub use hook::{EffectFuture, EffectHandler, EffectHook, IntoEffectOutput, async_handler, sync_handler};
pub use queue::EffectQueue;
pub use trigger::{EffectPriority, EffectTrigger};
