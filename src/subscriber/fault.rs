//! Failure types carried by terminal signals

use crate::producer::SubscribeError;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Shared, thread-safe error object
pub type SharedError = Arc<dyn Error + Send + Sync + 'static>;

/// Failure delivered through the generic `on_error` channel
///
/// This is the "any unexpected failure" type every subscriber accepts. Expected
/// failures only arrive here when the subscriber has no typed channel.
#[derive(Debug, Clone)]
pub enum Fault {
    /// Subscription attempt refused; no subscription was ever created
    Rejected(SubscribeError),
    /// `request` was called with a non-positive count
    IllegalDemand { requested: u64 },
    /// Expected producer failure surfaced to a subscriber without a typed channel
    Expected(SharedError),
    /// Unexpected producer failure
    Unexpected(SharedError),
    /// The producer's source panicked while producing a signal
    Panicked { message: String },
}

impl Fault {
    pub fn unexpected<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Fault::Unexpected(Arc::new(error))
    }

    pub fn expected<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Fault::Expected(Arc::new(error))
    }

    /// Rejection cause, if this fault is a refused subscription
    pub fn rejection(&self) -> Option<&SubscribeError> {
        match self {
            Fault::Rejected(cause) => Some(cause),
            _ => None,
        }
    }

    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Fault::Panicked { message }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::Rejected(cause) => write!(f, "Subscription rejected: {cause}"),
            Fault::IllegalDemand { requested } => write!(
                f,
                "Illegal demand: request({requested}) must be a positive count"
            ),
            Fault::Expected(error) => write!(f, "Producer failed: {error}"),
            Fault::Unexpected(error) => write!(f, "Unexpected producer failure: {error}"),
            Fault::Panicked { message } => write!(f, "Producer panicked: {message}"),
        }
    }
}

impl Error for Fault {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Fault::Rejected(cause) => Some(cause),
            Fault::Expected(error) | Fault::Unexpected(error) => Some(error.as_ref()),
            _ => None,
        }
    }
}

impl From<SubscribeError> for Fault {
    fn from(cause: SubscribeError) -> Self {
        Fault::Rejected(cause)
    }
}

/// Terminal failure raised by a producer's source
#[derive(Debug, Clone)]
pub enum Failure<E> {
    /// A foreseeable fault of the producer's domain, routed to the typed channel
    Expected(E),
    /// Anything else, routed to the generic channel
    Unexpected(Fault),
}

/// The single terminal signal of a subscription
#[derive(Debug, Clone)]
pub enum Termination<E> {
    Complete,
    Failed(Failure<E>),
}

impl<E> Termination<E> {
    pub fn expected(error: E) -> Self {
        Termination::Failed(Failure::Expected(error))
    }

    pub fn fault(fault: Fault) -> Self {
        Termination::Failed(Failure::Unexpected(fault))
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Termination::Complete)
    }
}
