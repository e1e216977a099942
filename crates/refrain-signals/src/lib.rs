//! # Refrain Signals
//!
//! Broadcast and request/response channels between independently living
//! component instances.
//!
//! Every receiver registers under its own [`ReceiverId`]; registering again
//! under the same identity replaces the previous callback. A sender fans one
//! request out to every registered receiver and collects one tagged
//! [`SignalResponse`] per receiver.
//!
//! ## Example
//!
//! ```rust
//! use refrain_signals::{ReceiverId, Signal, SignalKind};
//!
//! struct VisibilityChanged;
//!
//! impl SignalKind for VisibilityChanged {
//!     type Input = String;
//!     type Output = ();
//!     const NAME: &'static str = "visibility_changed";
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let signal = Signal::<VisibilityChanged>::new();
//! let subscription = signal.receive_sync(ReceiverId::new(), |field| {
//!     assert_eq!(field, "email");
//! });
//!
//! let responses = signal.send("email".to_string()).await;
//! assert!(responses.iter().all(|response| !response.is_failed()));
//!
//! subscription.unsubscribe();
//! assert!(signal.send("email".to_string()).await.is_empty());
//! # });
//! ```

pub mod core;
pub mod error;
pub mod receiver;
pub mod response;
pub mod signal;

pub use self::core::{ReceiverFn, ReceiverFuture, SignalKind, SignalSender};
pub use error::SignalError;
pub use receiver::{ReceiverId, SignalReceiver};
pub use response::SignalResponse;
pub use signal::Signal;
