//! Context Error Types

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContextError {
    #[error("Invalid context argument: {message}")]
    InvalidArgument { message: String },

    #[error("Context key not found: {key}")]
    NotFound { key: String },

    #[error("Context value for '{key}' is not a {expected}: {message}")]
    Mismatch {
        key: String,
        expected: String,
        message: String,
    },
}

impl ContextError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        ContextError::InvalidArgument {
            message: message.into(),
        }
    }
}

impl crate::core::error_handling::ContextualError for ContextError {
    fn is_user_actionable(&self) -> bool {
        true
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            ContextError::InvalidArgument { message } => Some(message),
            ContextError::NotFound { .. } => None,
            ContextError::Mismatch { message, .. } => Some(message),
        }
    }
}

/// Result type for context operations
pub type ContextResult<T> = Result<T, ContextError>;
