//! Signal integration tests
//!
//! Fan-out behaviour across many receivers and concurrent registration.

use refrain_core::{Disposable, Disposables};
use refrain_signals::{ReceiverId, Signal, SignalError, SignalKind, SignalReceiver, SignalResponse};
use rstest::*;
use std::time::Duration;

/// "Is everyone valid?"
struct Validate;

impl SignalKind for Validate {
	type Input = ();
	type Output = bool;
	const NAME: &'static str = "validate";
}

#[rstest]
#[tokio::test]
async fn test_validation_fan_out_distinguishes_failure_from_silence() {
	// Arrange
	let signal = Signal::<Validate>::new();
	let _valid = signal.receive_sync(ReceiverId::new(), |_| true);
	let _broken = signal.receive(ReceiverId::new(), |_| async {
		Err(SignalError::callback("validator crashed"))
	});

	// Act
	let responses = signal.send(()).await;

	// Assert
	assert_eq!(responses.len(), 2);
	assert_eq!(responses.iter().filter(|r| r.is_failed()).count(), 1);
	assert_eq!(SignalResponse::values(responses), vec![true]);
}

#[rstest]
#[tokio::test]
async fn test_slow_receivers_are_awaited_together() {
	// Arrange
	let signal = Signal::<Validate>::new();
	let mut subscriptions = Vec::new();
	for _ in 0..5 {
		subscriptions.push(signal.receive(ReceiverId::new(), |_| async {
			tokio::time::sleep(Duration::from_millis(50)).await;
			Ok(true)
		}));
	}

	// Act
	let started = std::time::Instant::now();
	let responses = signal.send(()).await;

	// Assert
	assert_eq!(SignalResponse::values(responses), vec![true; 5]);
	assert!(started.elapsed() < Duration::from_millis(240));
}

#[rstest]
#[tokio::test]
async fn test_concurrent_registration_keeps_one_entry_per_identity() {
	// Arrange
	let signal = Signal::<Validate>::new();
	let id = ReceiverId::new();

	// Act
	let tasks: Vec<_> = (0..16)
		.map(|i| {
			let signal = signal.clone();
			tokio::spawn(async move {
				let _ = signal.receive_sync(id, move |_| i % 2 == 0);
			})
		})
		.collect();
	for task in tasks {
		task.await.unwrap();
	}

	// Assert
	assert_eq!(signal.receiver_count(), 1);
	assert_eq!(signal.send(()).await.len(), 1);
}

#[rstest]
#[tokio::test]
async fn test_receiver_handle_released_through_aggregate() {
	// Arrange
	let signal = Signal::<Validate>::new();
	let receiver = SignalReceiver::new(ReceiverId::new(), signal.clone());
	receiver.receive_sync(|_| true);
	let disposables = Disposables::new();
	disposables.add(receiver.clone());

	// Act
	disposables.dispose_all();

	// Assert
	assert!(!receiver.is_registered());
	assert!(signal.send(()).await.is_empty());
}

#[rstest]
fn test_boxed_subscription_is_disposable() {
	// Arrange
	let signal = Signal::<Validate>::new();
	let subscription: Box<dyn Disposable> =
		Box::new(signal.receive_sync(ReceiverId::new(), |_| false));

	// Act
	subscription.dispose();

	// Assert
	assert_eq!(signal.receiver_count(), 0);
}
