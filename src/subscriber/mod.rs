//! Subscriber Component
//!
//! Signal receivers come in two variants sharing one delivery contract:
//! [`Subscriber`] accepts any failure through a generic channel, and
//! [`TypedSubscriber`] additionally receives the producer's expected failures
//! through a narrower, typed channel. [`SubscriberSink`] is the tagged union
//! producers use to hold either variant.

mod fault;
mod sink;
mod traits;

pub mod api;

pub use fault::{Failure, Fault, SharedError, Termination};
pub use sink::SubscriberSink;
pub use traits::{Subscriber, TypedSubscriber};
