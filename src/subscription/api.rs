//! Public API for subscriptions

pub use crate::subscription::demand::{Demand, UNBOUNDED};
pub use crate::subscription::state::SubscriptionState;
pub use crate::subscription::traits::Subscription;
