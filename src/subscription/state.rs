//! Lifecycle states of an established subscription

use std::fmt;

/// Lifecycle of a subscription once it has been admitted
///
/// Rejected attempts never reach these states: no subscription is built for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SubscriptionState {
    /// Admitted; `on_subscribe` not yet delivered
    Established = 0,
    /// `on_subscribe` delivered; items may flow up to outstanding demand
    Active = 1,
    /// Exactly one terminal signal has been delivered
    Terminated = 2,
    /// Cancelled before termination; delivery suppressed
    Cancelled = 3,
}

impl SubscriptionState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => SubscriptionState::Established,
            1 => SubscriptionState::Active,
            2 => SubscriptionState::Terminated,
            _ => SubscriptionState::Cancelled,
        }
    }

    /// True once no further signals can be delivered
    pub fn is_final(self) -> bool {
        matches!(
            self,
            SubscriptionState::Terminated | SubscriptionState::Cancelled
        )
    }
}

impl fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubscriptionState::Established => "ESTABLISHED",
            SubscriptionState::Active => "ACTIVE",
            SubscriptionState::Terminated => "TERMINATED",
            SubscriptionState::Cancelled => "CANCELLED",
        };
        write!(f, "{name}")
    }
}
