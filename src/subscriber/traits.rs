//! Traits for signal receivers

use crate::subscriber::fault::Fault;
use crate::subscription::Subscription;
use std::sync::Arc;

/// Receiver of the signals of exactly one subscription
///
/// Signals for a subscription are delivered strictly in order and never
/// concurrently, which is why every method takes `&mut self`: the producer owns
/// the subscriber while the subscription is live and releases it after the
/// terminal signal or cancellation.
///
/// The sequence is always
/// `on_subscribe (on_next)* (on_complete | on_error)?`, with at most one
/// terminal signal. A rejected subscriber receives a single `on_error` and no
/// `on_subscribe`.
pub trait Subscriber<V>: Send {
    /// First signal of an established subscription
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>);

    /// One item, only ever within outstanding demand
    fn on_next(&mut self, item: V);

    /// Terminal failure through the generic channel
    fn on_error(&mut self, fault: Fault);

    /// Terminal successful completion
    fn on_complete(&mut self);
}

/// Subscriber with an additional channel for the producer's expected failures
///
/// Expected failures of type `E` arrive through [`on_expected_error`](Self::on_expected_error);
/// every other failure still arrives through [`Subscriber::on_error`].
pub trait TypedSubscriber<V, E>: Subscriber<V> {
    /// Terminal expected failure
    fn on_expected_error(&mut self, error: E);
}
