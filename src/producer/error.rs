//! Producer Error Types

use crate::context::ContextError;

/// Errors raised while subscribing
///
/// `InvalidContext` is returned synchronously from the subscribe call. Every
/// other variant is a rejection and reaches the subscriber as its single
/// `on_error` signal, wrapped in [`Fault::Rejected`](crate::subscriber::Fault::Rejected).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubscribeError {
    #[error(transparent)]
    InvalidContext(#[from] ContextError),

    #[error("Subscription not supported: {message}")]
    Unsupported { message: String },

    #[error("Producer already has an active subscriber")]
    AlreadySubscribed,

    #[error("Subscriber limit reached (max: {max_subscribers})")]
    CapacityExceeded { max_subscribers: usize },

    #[error("Required context key missing: {key}")]
    MissingContext { key: String },
}

/// Errors raised when feeding a hot producer
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PublishError {
    #[error("Queue is full (max size: {max_size})")]
    QueueFull { max_size: usize },

    #[error("Producer already terminated")]
    Closed,

    #[error("Operation failed: {message}")]
    OperationFailed { message: String },
}

impl crate::core::error_handling::ContextualError for SubscribeError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, SubscribeError::InvalidContext(_))
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            SubscribeError::InvalidContext(inner) => {
                crate::core::error_handling::ContextualError::user_message(inner)
            }
            _ => None,
        }
    }
}

impl crate::core::error_handling::ContextualError for PublishError {
    fn is_user_actionable(&self) -> bool {
        false
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}

/// Result type for subscribe calls
pub type SubscribeResult<T> = Result<T, SubscribeError>;

/// Result type for publish operations
pub type PublishResult<T> = Result<T, PublishError>;
