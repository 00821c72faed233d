//! Serialized delivery engine
//!
//! [`SerialSubscription`] is the subscription state machine shared by every
//! producer in this crate. It owns the subscriber and the source, tracks demand,
//! and linearizes delivery with a work-in-progress counter:
//!
//! - `request`, `cancel` and producer notifications only update atomics and then
//!   try to become the single draining thread.
//! - If another thread (or the subscriber itself, re-entrantly) is already
//!   draining, the caller records a missed pass and returns immediately; the
//!   drainer loops until no passes are missed.
//! - The drainer holds the emission lock for the whole pass, so every signal is
//!   fully delivered, with its memory effects visible, before the next begins.
//!
//! ```text
//!  request/cancel/drain ──► wip += 1 ──┬── was 0 ──► drain loop ──► subscriber
//!                                      └── was >0 ─► return (drainer will loop)
//! ```

use crate::context::Context;
use crate::core::sync::handle_mutex_poison;
use crate::producer::source::{Pull, Source};
use crate::subscriber::{Fault, SubscriberSink, Termination};
use crate::subscription::{Demand, Subscription, SubscriptionState};
use std::error::Error;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

struct Slot<V, E> {
    subscriber: SubscriberSink<V, E>,
    source: Box<dyn Source<V, E>>,
}

/// One established subscription with linearized signal delivery
pub struct SerialSubscription<V, E> {
    id: u64,
    context: Context,
    demand: Demand,
    illegal_request: AtomicBool,
    cancelled: AtomicBool,
    state: AtomicU8,
    wip: AtomicUsize,
    /// Emission path; `None` once terminated or cancelled
    slot: Mutex<Option<Slot<V, E>>>,
    this: Weak<SerialSubscription<V, E>>,
}

impl<V, E> SerialSubscription<V, E>
where
    V: Send + 'static,
    E: Error + Send + Sync + 'static,
{
    pub(crate) fn new(
        id: u64,
        subscriber: SubscriberSink<V, E>,
        source: Box<dyn Source<V, E>>,
        context: Context,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            id,
            context,
            demand: Demand::new(),
            illegal_request: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            state: AtomicU8::new(SubscriptionState::Established as u8),
            wip: AtomicUsize::new(0),
            slot: Mutex::new(Some(Slot { subscriber, source })),
            this: this.clone(),
        })
    }

    /// Establish a subscription and deliver `on_subscribe`
    ///
    /// Custom producers use this to get the ordering guarantees of the
    /// protocol without writing their own serialization. Call
    /// [`drain`](Self::drain) whenever the source may have new signals.
    pub fn establish(
        id: u64,
        subscriber: SubscriberSink<V, E>,
        source: Box<dyn Source<V, E>>,
        context: Context,
    ) -> Arc<Self> {
        let subscription = Self::new(id, subscriber, source, context);
        subscription.drain();
        subscription
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Context supplied by the subscriber
    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn state(&self) -> SubscriptionState {
        SubscriptionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn outstanding_demand(&self) -> u64 {
        self.demand.outstanding()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// True once terminated or cancelled and released
    pub fn is_finished(&self) -> bool {
        self.state().is_final()
    }

    fn set_state(&self, state: SubscriptionState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Deliver whatever the current demand and source allow
    ///
    /// Never blocks on another deliverer: if delivery is already in progress,
    /// that deliverer performs an extra pass instead.
    pub fn drain(&self) {
        if self.wip.fetch_add(1, Ordering::AcqRel) != 0 {
            return;
        }

        let mut missed = 1;
        loop {
            self.deliver();

            let previous = self.wip.fetch_sub(missed, Ordering::AcqRel);
            missed = previous - missed;
            if missed == 0 {
                break;
            }
        }
    }

    fn deliver(&self) {
        let mut guard = match handle_mutex_poison(self.slot.lock(), |msg| msg) {
            Ok(guard) => guard,
            Err(msg) => {
                log::error!("Subscription {}: {}", self.id, msg);
                return;
            }
        };

        if guard.is_none() {
            return;
        }

        if self.state() == SubscriptionState::Established {
            let Some(handle) = self.this.upgrade() else {
                return;
            };
            let handle: Arc<dyn Subscription> = handle;
            self.set_state(SubscriptionState::Active);
            log::debug!("Subscription {} ESTABLISHED", self.id);
            let delivered = match guard.as_mut() {
                Some(slot) => self.guard_callback("on_subscribe", || {
                    slot.subscriber.on_subscribe(handle)
                }),
                None => return,
            };
            if !delivered {
                self.release(&mut guard);
                return;
            }
        }

        loop {
            if self.cancelled.load(Ordering::Acquire) {
                self.release(&mut guard);
                return;
            }

            if self.illegal_request.swap(false, Ordering::AcqRel) {
                self.finish(
                    &mut guard,
                    Termination::fault(Fault::IllegalDemand { requested: 0 }),
                );
                return;
            }

            let Some(slot) = guard.as_mut() else {
                return;
            };

            if self.demand.has_demand() {
                match self.pull(slot) {
                    Pull::Item(item) => {
                        self.demand.try_consume();
                        let delivered =
                            self.guard_callback("on_next", || slot.subscriber.on_next(item));
                        if !delivered {
                            self.release(&mut guard);
                            return;
                        }
                    }
                    Pull::Pending => return,
                    Pull::Done(termination) => {
                        self.finish(&mut guard, termination);
                        return;
                    }
                }
            } else {
                if let Some(termination) = self.poll_terminal(slot) {
                    self.finish(&mut guard, termination);
                }
                return;
            }
        }
    }

    fn pull(&self, slot: &mut Slot<V, E>) -> Pull<V, E> {
        catch_unwind(AssertUnwindSafe(|| slot.source.pull()))
            .unwrap_or_else(|payload| Pull::Done(Termination::fault(Fault::from_panic(payload))))
    }

    fn poll_terminal(&self, slot: &mut Slot<V, E>) -> Option<Termination<E>> {
        catch_unwind(AssertUnwindSafe(|| slot.source.poll_terminal()))
            .unwrap_or_else(|payload| Some(Termination::fault(Fault::from_panic(payload))))
    }

    /// Run a subscriber callback; a panicking subscriber is treated as cancelled
    fn guard_callback(&self, signal: &str, callback: impl FnOnce()) -> bool {
        match catch_unwind(AssertUnwindSafe(callback)) {
            Ok(()) => true,
            Err(payload) => {
                log::error!(
                    "Subscription {}: subscriber panicked in {}: {}; cancelling",
                    self.id,
                    signal,
                    Fault::from_panic(payload)
                );
                self.cancelled.store(true, Ordering::Release);
                false
            }
        }
    }

    /// Deliver the single terminal signal and release the subscriber and source
    fn finish(&self, guard: &mut MutexGuard<'_, Option<Slot<V, E>>>, termination: Termination<E>) {
        if let Some(mut slot) = guard.take() {
            self.set_state(SubscriptionState::Terminated);
            log::debug!(
                "Subscription {} TERMINATED ({})",
                self.id,
                if termination.is_complete() {
                    "complete"
                } else {
                    "failed"
                }
            );
            self.guard_callback("terminal signal", || {
                slot.subscriber.terminate(termination)
            });
        }
    }

    /// Drop the subscriber and source without a terminal signal
    fn release(&self, guard: &mut MutexGuard<'_, Option<Slot<V, E>>>) {
        if guard.take().is_some() {
            self.set_state(SubscriptionState::Cancelled);
            log::debug!("Subscription {} CANCELLED", self.id);
        }
    }
}

impl<V, E> Subscription for SerialSubscription<V, E>
where
    V: Send + 'static,
    E: Error + Send + Sync + 'static,
{
    fn request(&self, n: u64) {
        if self.is_finished() {
            return;
        }
        if n == 0 {
            log::debug!("Subscription {}: request(0) violates backpressure", self.id);
            self.illegal_request.store(true, Ordering::Release);
        } else {
            self.demand.add(n);
            log::trace!(
                "Subscription {}: request({}) -> outstanding {}",
                self.id,
                n,
                self.demand.outstanding()
            );
        }
        self.drain();
    }

    fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        log::trace!("Subscription {}: cancel requested", self.id);
        self.drain();
    }
}
