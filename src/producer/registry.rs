//! Live-subscription bookkeeping shared by the reference producers
//!
//! Admission and registration happen under one lock so that policies such as
//! exclusive admission cannot be raced past. Subscriber callbacks never run
//! under that lock: `on_subscribe` is delivered after registration completes.

use crate::context::Context;
use crate::core::sync::handle_mutex_poison;
use crate::producer::admission::Admission;
use crate::producer::error::SubscribeError;
use crate::producer::serial::SerialSubscription;
use crate::producer::source::Source;
use crate::subscriber::SubscriberSink;
use std::collections::HashMap;
use std::error::Error;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

pub(crate) struct SubscriptionRegistry<V, E> {
    admission: Admission,
    next_subscription_id: AtomicU64,
    subscriptions: Mutex<HashMap<u64, Arc<SerialSubscription<V, E>>>>,
}

impl<V, E> SubscriptionRegistry<V, E>
where
    V: Send + 'static,
    E: Error + Send + Sync + 'static,
{
    pub(crate) fn new(admission: Admission) -> Self {
        Self {
            admission,
            next_subscription_id: AtomicU64::new(1),
            subscriptions: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn admission(&self) -> &Admission {
        &self.admission
    }

    /// Admit an attempt, build its source and establish the subscription
    ///
    /// `make_source` runs only for admitted attempts, under the registry lock.
    /// Rejected attempts (by policy or by `make_source`) receive their single
    /// `on_error` and `None` is returned.
    pub(crate) fn admit<F>(
        &self,
        subscriber: SubscriberSink<V, E>,
        ctx: Context,
        make_source: F,
    ) -> Option<Arc<SerialSubscription<V, E>>>
    where
        F: FnOnce(u64, &Context) -> Result<Box<dyn Source<V, E>>, SubscribeError>,
    {
        let admitted = {
            let mut subscriptions = match handle_mutex_poison(self.subscriptions.lock(), |msg| {
                SubscribeError::Unsupported { message: msg }
            }) {
                Ok(guard) => guard,
                Err(cause) => {
                    subscriber.reject(cause);
                    return None;
                }
            };
            subscriptions.retain(|_, subscription| !subscription.is_finished());

            let decision = self
                .admission
                .evaluate(subscriptions.len(), &ctx)
                .and_then(|()| {
                    let id = self.next_subscription_id.fetch_add(1, Ordering::SeqCst);
                    make_source(id, &ctx).map(|source| (id, source))
                });

            match decision {
                Ok((id, source)) => {
                    let subscription = SerialSubscription::new(id, subscriber, source, ctx);
                    subscriptions.insert(id, Arc::clone(&subscription));
                    subscription
                }
                Err(cause) => {
                    drop(subscriptions);
                    subscriber.reject(cause);
                    return None;
                }
            }
        };

        // Registry lock released: the subscriber may call back into the producer
        admitted.drain();
        Some(admitted)
    }

    /// Subscriptions that are still live
    pub(crate) fn active(&self) -> Vec<Arc<SerialSubscription<V, E>>> {
        match handle_mutex_poison(self.subscriptions.lock(), |msg| msg) {
            Ok(mut subscriptions) => {
                subscriptions.retain(|_, subscription| !subscription.is_finished());
                subscriptions.values().cloned().collect()
            }
            Err(msg) => {
                log::error!("Subscription registry unavailable: {}", msg);
                Vec::new()
            }
        }
    }

    pub(crate) fn active_count(&self) -> usize {
        self.active().len()
    }
}
