//! Effect records, triggers and the priority effect queue.
//!
//! # Examples
//!
//! ```rust,no_run
//! use refrain::effects::{EffectQueue, EffectQueueConfig, LoggingExceptionHandler};
//! ```

pub use refrain_effects::*;
