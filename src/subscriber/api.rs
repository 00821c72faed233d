//! Public API for subscribers
//!
//! External modules should import from here rather than directly from internal modules.

pub use crate::subscriber::fault::{Failure, Fault, SharedError, Termination};
pub use crate::subscriber::sink::SubscriberSink;
pub use crate::subscriber::traits::{Subscriber, TypedSubscriber};
