//! # Refrain Core
//!
//! Leaf building blocks of the refrain hook runtime.
//!
//! - [`Disposable`] / [`Disposables`]: releasable resources and an aggregate that
//!   releases a whole group exactly once, in insertion order.
//! - [`State`]: an observable value cell whose change notification is gated by
//!   equality, with replay-on-subscribe semantics.
//! - [`ConvertedState`]: a view of a [`State`] through an explicit
//!   forward/backward conversion pair.
//!
//! ## Example
//!
//! ```
//! use refrain_core::{Disposables, State};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let count = State::new(0);
//! let seen = Arc::new(AtomicUsize::new(0));
//!
//! let disposables = Disposables::new();
//! disposables.add(count.subscribe({
//!     let seen = Arc::clone(&seen);
//!     move |_| {
//!         seen.fetch_add(1, Ordering::SeqCst);
//!     }
//! }));
//!
//! // Replayed once at subscription time
//! assert_eq!(seen.load(Ordering::SeqCst), 1);
//!
//! count.set(0); // equal value, no notification
//! count.set(1);
//! assert_eq!(seen.load(Ordering::SeqCst), 2);
//!
//! disposables.dispose_all();
//! count.set(2);
//! assert_eq!(seen.load(Ordering::SeqCst), 2);
//! ```

pub mod converted;
pub mod disposable;
pub mod panic;
pub mod state;

pub use converted::ConvertedState;
pub use disposable::{Disposable, DisposeFn, Disposables, disposable_fn};
pub use panic::panic_message;
pub use state::{AnyState, Observer, State, Subscription};
