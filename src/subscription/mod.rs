//! Subscription handle
//!
//! A subscription is the per-subscriber channel across which demand is
//! signalled and cancellation requested. Ordering and exactly-once terminal
//! guarantees are scoped to a single subscription.

mod demand;
mod state;
mod traits;

pub mod api;

pub use demand::{Demand, UNBOUNDED};
pub use state::SubscriptionState;
pub use traits::Subscription;
