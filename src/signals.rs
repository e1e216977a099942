//! Receiver-keyed broadcast signals.
//!
//! # Examples
//!
//! ```rust,no_run
//! use refrain::signals::{ReceiverId, Signal, SignalKind};
//! ```

#[cfg(feature = "signals")]
pub use refrain_signals::*;
