//! Lock poisoning helpers
//!
//! A subscriber or source that panics while the delivery engine holds a lock
//! poisons it. Rather than unwrapping, callers convert the poison into their
//! own error type and decide locally how to degrade.

use std::sync::LockResult;

/// Convert a poisoned lock into an application error
///
/// # Examples
/// ```
/// use reactive::core::sync::handle_mutex_poison;
/// use reactive::producer::api::PublishError;
/// use std::sync::Mutex;
///
/// let buffer = Mutex::new(Vec::<u32>::new());
/// let guard = handle_mutex_poison(buffer.lock(), |message| {
///     PublishError::OperationFailed { message }
/// })
/// .unwrap();
/// assert!(guard.is_empty());
/// ```
pub fn handle_mutex_poison<T, E>(
    result: LockResult<T>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<T, E> {
    result.map_err(|poisoned| {
        error_constructor(format!(
            "Internal synchronisation error (mutex poisoned by a panic while locked): {}",
            poisoned
        ))
    })
}
