//! Traits for the subscription handle

/// Demand and cancellation handle handed to a subscriber in `on_subscribe`
///
/// Both operations may be called from any thread, including re-entrantly from
/// inside a subscriber callback, and never block the caller.
pub trait Subscription: Send + Sync {
    /// Authorise delivery of up to `n` more items
    ///
    /// Demand accumulates and saturates at [`UNBOUNDED`](crate::subscription::UNBOUNDED).
    /// `request(0)` is a protocol violation: the subscriber is terminated with
    /// [`Fault::IllegalDemand`](crate::subscriber::Fault::IllegalDemand) instead of
    /// receiving items. After a terminal signal or cancellation this is a no-op.
    fn request(&self, n: u64);

    /// Stop delivery and release resources
    ///
    /// Idempotent. A terminal signal that has not started when cancellation is
    /// observed is suppressed.
    fn cancel(&self);
}
