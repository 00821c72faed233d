//! The SubscribeSupport contract

use crate::context::Context;
use crate::producer::error::{SubscribeError, SubscribeResult};
use crate::subscriber::{Subscriber, SubscriberSink, TypedSubscriber};
use serde_json::Value;
use std::error::Error;

/// A potential producer of items, expected failures of type `E`, and completion
///
/// Subscribing either establishes a subscription, announced to the subscriber
/// through `on_subscribe`, or rejects the attempt with a single `on_error` and
/// no subscription at all. The four entry points differ only in how the context
/// is supplied and which subscriber variant is accepted; they all validate their
/// inputs first and return `Err` only for invalid arguments, which never reach
/// the subscriber.
///
/// Implementations only provide [`attach`](Self::attach), and must deliver the
/// signals of each subscription strictly in order, never concurrently, and with
/// the happens-before visibility of a single thread;
/// [`SerialSubscription`](crate::producer::SerialSubscription) provides that
/// discipline.
///
/// # Example
///
/// ```rust,no_run
/// use reactive::producer::api::{IterProducer, SubscribeSupport};
/// # use reactive::subscriber::api::Subscriber;
/// # fn example(subscriber: Box<dyn Subscriber<u32>>) -> Result<(), Box<dyn std::error::Error>> {
/// let producer: IterProducer<u32, std::io::Error> = IterProducer::from_vec(vec![1, 2, 3]);
/// producer.subscribe(subscriber, &[("tenant", serde_json::json!("acme"))])?;
/// # Ok(())
/// # }
/// ```
pub trait SubscribeSupport<V, E>: Send + Sync
where
    E: Error + Send + Sync + 'static,
{
    /// Whether this producer admits subscribers at all
    fn supports_subscription(&self) -> bool {
        true
    }

    /// Message carried by the rejection when subscription is unsupported
    fn unsupported_reason(&self) -> String {
        "subscription is not supported by this producer".to_string()
    }

    /// Admit or reject a subscription attempt whose inputs are already valid
    ///
    /// Rejections go through [`SubscriberSink::reject`]; admitted subscribers
    /// receive `on_subscribe` before any other signal.
    fn attach(&self, subscriber: SubscriberSink<V, E>, ctx: Context);

    /// Subscribe a generic-error subscriber with a list of context pairs
    fn subscribe(
        &self,
        subscriber: Box<dyn Subscriber<V>>,
        ctx: &[(&str, Value)],
    ) -> SubscribeResult<()> {
        let ctx = Context::from_pairs(ctx)?;
        dispatch(self, SubscriberSink::basic(subscriber), ctx);
        Ok(())
    }

    /// Subscribe a typed-error subscriber with a list of context pairs
    fn subscribe_typed(
        &self,
        subscriber: Box<dyn TypedSubscriber<V, E>>,
        ctx: &[(&str, Value)],
    ) -> SubscribeResult<()> {
        let ctx = Context::from_pairs(ctx)?;
        dispatch(self, SubscriberSink::typed(subscriber), ctx);
        Ok(())
    }

    /// Subscribe a generic-error subscriber with an associative context
    fn subscribe_in(
        &self,
        subscriber: Box<dyn Subscriber<V>>,
        ctx: &Context,
    ) -> SubscribeResult<()> {
        dispatch(self, SubscriberSink::basic(subscriber), ctx.clone());
        Ok(())
    }

    /// Subscribe a typed-error subscriber with an associative context
    fn subscribe_typed_in(
        &self,
        subscriber: Box<dyn TypedSubscriber<V, E>>,
        ctx: &Context,
    ) -> SubscribeResult<()> {
        dispatch(self, SubscriberSink::typed(subscriber), ctx.clone());
        Ok(())
    }
}

fn dispatch<V, E, P>(producer: &P, subscriber: SubscriberSink<V, E>, ctx: Context)
where
    E: Error + Send + Sync + 'static,
    P: SubscribeSupport<V, E> + ?Sized,
{
    if !producer.supports_subscription() {
        subscriber.reject(SubscribeError::Unsupported {
            message: producer.unsupported_reason(),
        });
        return;
    }
    log::trace!("Subscription REQUESTED with {} context entries", ctx.len());
    producer.attach(subscriber, ctx);
}
