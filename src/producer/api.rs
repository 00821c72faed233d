//! Public API for producers
//!
//! External modules should import from here rather than directly from internal modules.

pub use crate::producer::admission::{Admission, AdmissionPolicy};
pub use crate::producer::broadcast::{BroadcastProducer, DEFAULT_QUEUE_CAPACITY};
pub use crate::producer::error::{PublishError, PublishResult, SubscribeError, SubscribeResult};
pub use crate::producer::iter::IterProducer;
pub use crate::producer::serial::SerialSubscription;
pub use crate::producer::source::{Pull, Source};
pub use crate::producer::stream::StreamProducer;
pub use crate::producer::traits::SubscribeSupport;
pub use crate::producer::unsupported::UnsupportedProducer;
