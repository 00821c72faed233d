//! Hot producer fanning published items out to every live subscriber
//!
//! Subscribers see items published after they subscribed, each at the pace of
//! its own demand. Items wait in a bounded [`SignalQueue`] until every
//! subscriber has read them; a publish that would overflow it fails with
//! [`PublishError::QueueFull`] and may be retried once subscribers catch up.

use crate::config::ProducerSettings;
use crate::context::Context;
use crate::producer::admission::Admission;
use crate::producer::error::{PublishError, PublishResult, SubscribeError};
use crate::producer::queue::{QueueSource, SignalQueue};
use crate::producer::registry::SubscriptionRegistry;
use crate::producer::source::Source;
use crate::producer::traits::SubscribeSupport;
use crate::subscriber::{Fault, SubscriberSink, Termination};
use std::error::Error;
use std::sync::Arc;

/// Default number of items buffered for slow subscribers
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;

pub struct BroadcastProducer<V, E> {
    queue: Arc<SignalQueue<V, E>>,
    registry: SubscriptionRegistry<V, E>,
}

impl<V, E> BroadcastProducer<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Error + Clone + Send + Sync + 'static,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: Arc::new(SignalQueue::new(capacity)),
            registry: SubscriptionRegistry::new(Admission::open()),
        }
    }

    /// Capacity and admission rules taken from configuration
    pub fn from_settings(settings: &ProducerSettings) -> Self {
        Self::new(settings.queue_capacity).with_admission(Admission::from(settings))
    }

    pub fn with_admission(mut self, admission: Admission) -> Self {
        self.registry = SubscriptionRegistry::new(admission);
        self
    }

    pub fn admission(&self) -> &Admission {
        self.registry.admission()
    }

    /// Publish an item to every live subscriber, returning its sequence number
    pub fn publish(&self, item: V) -> PublishResult<u64> {
        let sequence = self.queue.publish(item)?;
        log::trace!("Published item {}", sequence);
        self.notify();
        Ok(sequence)
    }

    /// Complete every subscriber once it has received the buffered items
    pub fn complete(&self) -> PublishResult<()> {
        self.terminate(Termination::Complete)
    }

    /// Fail every subscriber with an expected failure
    pub fn fail(&self, error: E) -> PublishResult<()> {
        self.terminate(Termination::expected(error))
    }

    /// Fail every subscriber with an unexpected failure
    pub fn fail_with(&self, fault: Fault) -> PublishResult<()> {
        self.terminate(Termination::fault(fault))
    }

    fn terminate(&self, termination: Termination<E>) -> PublishResult<()> {
        self.queue.close(termination)?;
        log::debug!(
            "Broadcast closed with {} active subscriptions",
            self.registry.active_count()
        );
        self.notify();
        Ok(())
    }

    fn notify(&self) {
        for subscription in self.registry.active() {
            subscription.drain();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }

    pub fn active_subscriptions(&self) -> usize {
        self.registry.active_count()
    }

    /// Items still held for subscribers that have not read them
    pub fn buffered(&self) -> usize {
        self.queue.size()
    }

    /// Items the slowest-reading subscription has yet to receive
    pub fn max_lag(&self) -> usize {
        self.queue
            .consumer_ids()
            .into_iter()
            .map(|id| self.queue.lag(id))
            .max()
            .unwrap_or(0)
    }
}

impl<V, E> SubscribeSupport<V, E> for BroadcastProducer<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Error + Clone + Send + Sync + 'static,
{
    fn attach(&self, subscriber: SubscriberSink<V, E>, ctx: Context) {
        let queue = Arc::clone(&self.queue);
        self.registry.admit(subscriber, ctx, move |id, _| {
            queue
                .register_consumer(id)
                .map_err(|e| SubscribeError::Unsupported {
                    message: e.to_string(),
                })?;
            Ok(Box::new(QueueSource::new(queue, id)) as Box<dyn Source<V, E>>)
        });
    }
}

impl<V, E> Default for BroadcastProducer<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Error + Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl From<PublishError> for Fault {
    fn from(error: PublishError) -> Self {
        Fault::unexpected(error)
    }
}
