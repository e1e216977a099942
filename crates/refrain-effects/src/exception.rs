//! Exception sink for failed effect runs
//!
//! The effect queue never propagates a handler failure. It hands an
//! [`EffectFailure`] to an [`ExceptionHandler`] and moves on to the next
//! effect.

use crate::error::EffectFailure;
use std::fmt;
use std::sync::Arc;

/// Receives failures raised by effect handlers
pub trait ExceptionHandler: Send + Sync {
	/// Process `failure`; return `true` when it was handled
	fn handle_exception(&self, failure: &EffectFailure) -> bool;
}

/// Default sink: logs the failure and reports it handled
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingExceptionHandler;

impl ExceptionHandler for LoggingExceptionHandler {
	fn handle_exception(&self, failure: &EffectFailure) -> bool {
		tracing::error!(
			identity = failure.identity,
			priority = %failure.priority,
			error = %failure.error,
			"effect handler failed"
		);
		true
	}
}

struct FnExceptionHandler<F>(F);

impl<F> ExceptionHandler for FnExceptionHandler<F>
where
	F: Fn(&EffectFailure) -> bool + Send + Sync,
{
	fn handle_exception(&self, failure: &EffectFailure) -> bool {
		(self.0)(failure)
	}
}

struct CompositeExceptionHandler {
	handlers: Vec<Arc<dyn ExceptionHandler>>,
}

impl ExceptionHandler for CompositeExceptionHandler {
	fn handle_exception(&self, failure: &EffectFailure) -> bool {
		self.handlers
			.iter()
			.any(|handler| handler.handle_exception(failure))
	}
}

/// Builder chaining several sinks; the first one returning `true` wins
///
/// # Examples
///
/// ```
/// use refrain_effects::{ExceptionHandlerPipeline, LoggingExceptionHandler};
///
/// let sink = ExceptionHandlerPipeline::new()
///     .use_fn(|failure| failure.is_panic())
///     .use_handler(LoggingExceptionHandler)
///     .build();
/// # let _ = sink;
/// ```
#[derive(Default)]
pub struct ExceptionHandlerPipeline {
	handlers: Vec<Arc<dyn ExceptionHandler>>,
}

impl ExceptionHandlerPipeline {
	/// Empty pipeline
	pub fn new() -> Self {
		Self::default()
	}

	/// Append a handler
	pub fn use_handler<H>(mut self, handler: H) -> Self
	where
		H: ExceptionHandler + 'static,
	{
		self.handlers.push(Arc::new(handler));
		self
	}

	/// Append an already shared handler
	pub fn use_shared(mut self, handler: Arc<dyn ExceptionHandler>) -> Self {
		self.handlers.push(handler);
		self
	}

	/// Append a closure handler
	pub fn use_fn<F>(self, handler: F) -> Self
	where
		F: Fn(&EffectFailure) -> bool + Send + Sync + 'static,
	{
		self.use_handler(FnExceptionHandler(handler))
	}

	/// Number of handlers in the pipeline
	pub fn len(&self) -> usize {
		self.handlers.len()
	}

	/// Whether the pipeline has no handlers
	pub fn is_empty(&self) -> bool {
		self.handlers.is_empty()
	}

	/// Finish into one composite handler
	pub fn build(self) -> Arc<dyn ExceptionHandler> {
		Arc::new(CompositeExceptionHandler {
			handlers: self.handlers,
		})
	}
}

impl fmt::Debug for ExceptionHandlerPipeline {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ExceptionHandlerPipeline")
			.field("handlers", &self.handlers.len())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::EffectError;
	use crate::trigger::EffectPriority;
	use parking_lot::Mutex;
	use rstest::rstest;

	fn failure(message: &str) -> EffectFailure {
		EffectFailure {
			identity: 4,
			priority: EffectPriority::AfterRender,
			error: EffectError::handler(message.to_string()),
		}
	}

	#[rstest]
	fn test_first_handling_sink_stops_the_chain() {
		// Arrange
		let visited = Arc::new(Mutex::new(Vec::new()));
		let pipeline = ExceptionHandlerPipeline::new()
			.use_fn({
				let visited = Arc::clone(&visited);
				move |_| {
					visited.lock().push("first");
					false
				}
			})
			.use_fn({
				let visited = Arc::clone(&visited);
				move |_| {
					visited.lock().push("second");
					true
				}
			})
			.use_fn({
				let visited = Arc::clone(&visited);
				move |_| {
					visited.lock().push("third");
					true
				}
			})
			.build();

		// Act
		let handled = pipeline.handle_exception(&failure("boom"));

		// Assert
		assert!(handled);
		assert_eq!(*visited.lock(), vec!["first", "second"]);
	}

	#[rstest]
	fn test_empty_pipeline_handles_nothing() {
		// Arrange
		let pipeline = ExceptionHandlerPipeline::new().build();

		// Act
		let handled = pipeline.handle_exception(&failure("ignored"));

		// Assert
		assert!(!handled);
	}

	#[rstest]
	fn test_logging_handler_reports_handled() {
		// Arrange
		let handler = LoggingExceptionHandler;

		// Act
		let handled = handler.handle_exception(&failure("logged"));

		// Assert
		assert!(handled);
	}

	#[rstest]
	fn test_failure_display_names_identity_and_tier() {
		// Arrange
		let failure = failure("timeout");

		// Act
		let rendered = failure.to_string();

		// Assert
		assert_eq!(rendered, "Effect #4 (after_render) failed: Effect handler failed: timeout");
	}
}
