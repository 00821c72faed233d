//! Cold producer backed by an iterator per subscription
//!
//! Every admitted subscriber pulls from its own fresh iterator, built from the
//! subscriber's context, at the pace of its own demand. An `Err` item ends the
//! subscription with that expected failure; exhaustion completes it. Both are
//! delivered as soon as they are next in line, without waiting for demand.

use crate::context::Context;
use crate::producer::admission::Admission;
use crate::producer::registry::SubscriptionRegistry;
use crate::producer::source::{Pull, Source};
use crate::producer::traits::SubscribeSupport;
use crate::subscriber::{SubscriberSink, Termination};
use std::error::Error;
use std::iter::Peekable;
use std::sync::Arc;

type BoxIter<V, E> = Box<dyn Iterator<Item = Result<V, E>> + Send>;
type IterFactory<V, E> = dyn Fn(&Context) -> BoxIter<V, E> + Send + Sync;

/// Cold producer replaying an iterator to each subscriber
///
/// # Example
///
/// ```rust,no_run
/// use reactive::producer::api::{Admission, IterProducer};
/// use std::io;
///
/// let numbers: IterProducer<u64, io::Error> =
///     IterProducer::from_fn(|ctx| {
///         let limit: u64 = ctx.get_as("limit").unwrap_or(10);
///         (0..limit).map(Ok)
///     })
///     .with_admission(Admission::open().with_max_subscribers(4));
/// ```
pub struct IterProducer<V, E> {
    factory: Arc<IterFactory<V, E>>,
    registry: SubscriptionRegistry<V, E>,
}

impl<V, E> IterProducer<V, E>
where
    V: Send + 'static,
    E: Error + Send + Sync + 'static,
{
    /// Build each subscriber's iterator from its context
    pub fn from_fn<F, I>(factory: F) -> Self
    where
        F: Fn(&Context) -> I + Send + Sync + 'static,
        I: IntoIterator<Item = Result<V, E>>,
        I::IntoIter: Send + 'static,
    {
        let factory: Arc<IterFactory<V, E>> =
            Arc::new(move |ctx: &Context| Box::new(factory(ctx).into_iter()) as BoxIter<V, E>);
        Self {
            factory,
            registry: SubscriptionRegistry::new(Admission::open()),
        }
    }

    /// Replay a fixed list of items, then complete
    pub fn from_vec(items: Vec<V>) -> Self
    where
        V: Clone + Sync,
    {
        let items = Arc::new(items);
        Self::from_fn(move |_| {
            let items = Arc::clone(&items);
            (0..items.len()).map(move |i| Ok(items[i].clone()))
        })
    }

    /// Complete immediately without items
    pub fn empty() -> Self {
        Self::from_fn(|_| std::iter::empty())
    }

    /// Fail immediately with an expected failure
    pub fn failing(error: E) -> Self
    where
        E: Clone,
    {
        Self::from_fn(move |_| std::iter::once(Err(error.clone())))
    }

    pub fn with_admission(mut self, admission: Admission) -> Self {
        self.registry = SubscriptionRegistry::new(admission);
        self
    }

    pub fn admission(&self) -> &Admission {
        self.registry.admission()
    }

    pub fn active_subscriptions(&self) -> usize {
        self.registry.active_count()
    }
}

impl<V, E> SubscribeSupport<V, E> for IterProducer<V, E>
where
    V: Send + 'static,
    E: Error + Send + Sync + 'static,
{
    fn attach(&self, subscriber: SubscriberSink<V, E>, ctx: Context) {
        let factory = Arc::clone(&self.factory);
        self.registry.admit(subscriber, ctx, move |id, ctx| {
            log::trace!("Subscription {} replaying iterator", id);
            Ok(Box::new(IterSource {
                items: factory(ctx).peekable(),
            }) as Box<dyn Source<V, E>>)
        });
    }
}

struct IterSource<V, E> {
    items: Peekable<BoxIter<V, E>>,
}

impl<V, E> Source<V, E> for IterSource<V, E>
where
    V: Send,
    E: Send,
{
    fn pull(&mut self) -> Pull<V, E> {
        match self.items.next() {
            Some(Ok(item)) => Pull::Item(item),
            Some(Err(error)) => Pull::Done(Termination::expected(error)),
            None => Pull::Done(Termination::Complete),
        }
    }

    fn poll_terminal(&mut self) -> Option<Termination<E>> {
        if matches!(self.items.peek(), Some(Ok(_))) {
            return None;
        }
        match self.items.next() {
            Some(Err(error)) => Some(Termination::expected(error)),
            _ => Some(Termination::Complete),
        }
    }
}
