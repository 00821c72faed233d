//! Outstanding demand counter
//!
//! Demand is updated from arbitrary threads (`request`) and consumed by the
//! single delivering thread, so every update is a lock-free atomic
//! read-modify-write: concurrent requests are never lost or double counted.

use std::sync::atomic::{AtomicU64, Ordering};

/// Sentinel meaning "effectively unbounded" demand
///
/// Once reached, demand stays unbounded and is no longer consumed by deliveries.
pub const UNBOUNDED: u64 = u64::MAX;

/// Saturating, non-negative demand counter
#[derive(Debug, Default)]
pub struct Demand {
    outstanding: AtomicU64,
}

impl Demand {
    pub fn new() -> Self {
        Self {
            outstanding: AtomicU64::new(0),
        }
    }

    /// Add `n` to outstanding demand, saturating at [`UNBOUNDED`]
    ///
    /// Returns the demand outstanding before the addition.
    pub fn add(&self, n: u64) -> u64 {
        self.outstanding
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                if current == UNBOUNDED {
                    None
                } else {
                    Some(current.saturating_add(n))
                }
            })
            .unwrap_or(UNBOUNDED)
    }

    /// Consume one unit of demand if any is outstanding
    pub fn try_consume(&self) -> bool {
        self.outstanding
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| match current {
                0 => None,
                UNBOUNDED => Some(UNBOUNDED),
                n => Some(n - 1),
            })
            .is_ok()
    }

    pub fn outstanding(&self) -> u64 {
        self.outstanding.load(Ordering::Acquire)
    }

    pub fn has_demand(&self) -> bool {
        self.outstanding() > 0
    }

    pub fn is_unbounded(&self) -> bool {
        self.outstanding() == UNBOUNDED
    }
}
