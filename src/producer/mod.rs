//! Producer Component
//!
//! Everything on the producing side of the protocol: the [`SubscribeSupport`]
//! contract with its four subscribe entry points, admission policies, the
//! serialized delivery engine every subscription runs on, and a set of
//! reference producers built on top of it.
//!
//! ```text
//!  subscribe ──► validate context ──► admission ──┬─► rejected: on_error(Rejected)
//!                                                 └─► SerialSubscription ──► on_subscribe
//!                                                          ▲      │
//!                                      request / cancel ───┘      └─► Source::pull
//! ```

mod admission;
mod broadcast;
mod error;
mod iter;
mod queue;
mod registry;
mod serial;
mod source;
mod stream;
mod traits;
mod unsupported;

pub mod api;

pub use admission::{Admission, AdmissionPolicy};
pub use broadcast::{BroadcastProducer, DEFAULT_QUEUE_CAPACITY};
pub use error::{PublishError, PublishResult, SubscribeError, SubscribeResult};
pub use iter::IterProducer;
pub use serial::SerialSubscription;
pub use source::{Pull, Source};
pub use stream::StreamProducer;
pub use traits::SubscribeSupport;
pub use unsupported::UnsupportedProducer;

#[cfg(test)]
mod tests;
