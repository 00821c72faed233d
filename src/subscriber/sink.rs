//! Tagged union over the two subscriber variants
//!
//! Producers hold a [`SubscriberSink`] rather than a concrete subscriber so a
//! single delivery path can serve both variants; termination routing is the
//! only place where the variants differ.

use crate::producer::SubscribeError;
use crate::subscriber::fault::{Failure, Fault, Termination};
use crate::subscriber::traits::{Subscriber, TypedSubscriber};
use crate::subscription::Subscription;
use std::error::Error;
use std::sync::Arc;

/// A subscriber of either variant, owned by the producer while subscribed
pub enum SubscriberSink<V, E> {
    /// Generic-error subscriber
    Basic(Box<dyn Subscriber<V>>),
    /// Subscriber with an expected-error channel
    Typed(Box<dyn TypedSubscriber<V, E>>),
}

impl<V, E> SubscriberSink<V, E>
where
    E: Error + Send + Sync + 'static,
{
    pub fn basic(subscriber: Box<dyn Subscriber<V>>) -> Self {
        SubscriberSink::Basic(subscriber)
    }

    pub fn typed(subscriber: Box<dyn TypedSubscriber<V, E>>) -> Self {
        SubscriberSink::Typed(subscriber)
    }

    pub fn is_typed(&self) -> bool {
        matches!(self, SubscriberSink::Typed(_))
    }

    pub fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        match self {
            SubscriberSink::Basic(s) => s.on_subscribe(subscription),
            SubscriberSink::Typed(s) => s.on_subscribe(subscription),
        }
    }

    pub fn on_next(&mut self, item: V) {
        match self {
            SubscriberSink::Basic(s) => s.on_next(item),
            SubscriberSink::Typed(s) => s.on_next(item),
        }
    }

    pub fn on_error(&mut self, fault: Fault) {
        match self {
            SubscriberSink::Basic(s) => s.on_error(fault),
            SubscriberSink::Typed(s) => s.on_error(fault),
        }
    }

    /// Deliver the terminal signal, routing expected failures by variant
    pub fn terminate(&mut self, termination: Termination<E>) {
        match (self, termination) {
            (SubscriberSink::Basic(s), Termination::Complete) => s.on_complete(),
            (SubscriberSink::Typed(s), Termination::Complete) => s.on_complete(),
            (SubscriberSink::Basic(s), Termination::Failed(Failure::Expected(error))) => {
                s.on_error(Fault::expected(error))
            }
            (SubscriberSink::Typed(s), Termination::Failed(Failure::Expected(error))) => {
                s.on_expected_error(error)
            }
            (SubscriberSink::Basic(s), Termination::Failed(Failure::Unexpected(fault))) => {
                s.on_error(fault)
            }
            (SubscriberSink::Typed(s), Termination::Failed(Failure::Unexpected(fault))) => {
                s.on_error(fault)
            }
        }
    }

    /// Refuse the subscription: one generic error, never an `on_subscribe`
    pub fn reject(mut self, cause: SubscribeError) {
        log::debug!("Subscription REJECTED: {}", cause);
        self.on_error(Fault::Rejected(cause));
    }
}
