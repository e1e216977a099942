//! Panic payload helpers shared by the effect queue and signal fan-out

use std::any::Any;

/// Best-effort message extracted from a caught panic payload.
///
/// # Examples
///
/// ```
/// use refrain_core::panic_message;
///
/// let payload = std::panic::catch_unwind(|| panic!("boom")).unwrap_err();
/// assert_eq!(panic_message(payload.as_ref()), "boom");
/// ```
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(message) = payload.downcast_ref::<&'static str>() {
		(*message).to_string()
	} else if let Some(message) = payload.downcast_ref::<String>() {
		message.clone()
	} else {
		"non-string panic payload".to_string()
	}
}
