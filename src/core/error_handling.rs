//! Error reporting shared by every component
//!
//! Component errors say whether the user can fix them. Fatal errors are then
//! reported with the specific message when there is one, and with the
//! operation that failed otherwise; full detail always goes to the debug log.

/// An error that knows whether it is actionable by the user
///
/// `user_message()` returns a message telling the user what to change, when
/// one more specific than `Display` exists. Internal failures return `None`.
pub trait ContextualError: std::error::Error {
    /// True for invalid input or configuration, false for internal failures
    fn is_user_actionable(&self) -> bool;

    fn user_message(&self) -> Option<&str>;
}

/// The line shown to the user for a fatal error
pub fn fatal_message<E: ContextualError>(error: &E, operation_context: &str) -> String {
    match error.user_message() {
        Some(message) if error.is_user_actionable() => message.to_string(),
        _ if error.is_user_actionable() => error.to_string(),
        _ => operation_context.to_string(),
    }
}

/// Log a fatal error at `error` level, with details at `debug`
///
/// # Examples
/// ```rust,no_run
/// use reactive::config::Settings;
/// use reactive::core::error_handling::log_error_with_context;
///
/// # async fn example() {
/// if let Err(e) = Settings::load(None).await {
///     log_error_with_context(&e, "Loading configuration");
/// }
/// # }
/// ```
pub fn log_error_with_context<E: ContextualError + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    log::error!("FATAL: {}", fatal_message(error, operation_context));
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}
