//! Asynchronous producer driving a `futures` stream per subscription
//!
//! Each admitted subscriber gets its own stream, built from its context and
//! polled by a tokio task. The task polls whenever the subscription runs dry,
//! so it stays at most one item ahead of demand: an exhausted or failing
//! stream is noticed without demand, and an unrequested stream is never
//! drained into memory. Cancelling aborts the task, dropping the stream even
//! while it is waiting for its next item. Items arrive on runtime worker
//! threads; delivery still goes through the subscription's serialized engine.

use crate::context::Context;
use crate::core::sync::handle_mutex_poison;
use crate::producer::admission::Admission;
use crate::producer::registry::SubscriptionRegistry;
use crate::producer::serial::SerialSubscription;
use crate::producer::source::{Pull, Source};
use crate::producer::traits::SubscribeSupport;
use crate::subscriber::{Fault, SubscriberSink, Termination};
use futures::stream::{BoxStream, Stream, StreamExt};
use futures::FutureExt;
use std::collections::VecDeque;
use std::error::Error;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::AbortHandle;

type StreamFactory<V, E> = dyn Fn(&Context) -> BoxStream<'static, Result<V, E>> + Send + Sync;

pub struct StreamProducer<V, E> {
    factory: Arc<StreamFactory<V, E>>,
    runtime: Option<Handle>,
    registry: SubscriptionRegistry<V, E>,
}

impl<V, E> StreamProducer<V, E>
where
    V: Send + 'static,
    E: Error + Send + Sync + 'static,
{
    /// Build each subscriber's stream from its context
    ///
    /// Streams are driven on the tokio runtime current at construction. Without
    /// one, every subscription attempt is rejected as unsupported.
    pub fn new<F, S>(factory: F) -> Self
    where
        F: Fn(&Context) -> S + Send + Sync + 'static,
        S: Stream<Item = Result<V, E>> + Send + 'static,
    {
        Self {
            factory: Arc::new(move |ctx: &Context| factory(ctx).boxed()),
            runtime: Handle::try_current().ok(),
            registry: SubscriptionRegistry::new(Admission::open()),
        }
    }

    /// Drive streams on an explicit runtime
    pub fn with_handle(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
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

impl<V, E> SubscribeSupport<V, E> for StreamProducer<V, E>
where
    V: Send + 'static,
    E: Error + Send + Sync + 'static,
{
    fn supports_subscription(&self) -> bool {
        self.runtime.is_some()
    }

    fn unsupported_reason(&self) -> String {
        "no tokio runtime available to drive the stream".to_string()
    }

    fn attach(&self, subscriber: SubscriberSink<V, E>, ctx: Context) {
        let Some(runtime) = self.runtime.as_ref() else {
            return;
        };

        let mut started = None;
        let admitted = self.registry.admit(subscriber, ctx, |id, ctx| {
            log::trace!("Subscription {} opening stream", id);
            let relay = Arc::new(Relay::new());
            started = Some(((self.factory)(ctx), Arc::clone(&relay)));
            Ok(Box::new(RelaySource { relay }) as Box<dyn Source<V, E>>)
        });

        if let (Some(subscription), Some((stream, relay))) = (admitted, started) {
            let weak = Arc::downgrade(&subscription);
            let task = runtime.spawn(pump(stream, Arc::clone(&relay), weak));
            relay.hold_task(task.abort_handle());
        }
    }
}

struct RelayState<V, E> {
    buffer: VecDeque<V>,
    terminal: Option<Termination<E>>,
}

/// Hand-off point between the polling task and the delivering thread
struct Relay<V, E> {
    state: Mutex<RelayState<V, E>>,
    wanted: Notify,
    closed: AtomicBool,
    task: Mutex<Option<AbortHandle>>,
}

impl<V, E> Relay<V, E> {
    fn new() -> Self {
        Self {
            state: Mutex::new(RelayState {
                buffer: VecDeque::new(),
                terminal: None,
            }),
            wanted: Notify::new(),
            closed: AtomicBool::new(false),
            task: Mutex::new(None),
        }
    }

    /// Keep the pump's abort handle; abort at once if already closed
    fn hold_task(&self, task: AbortHandle) {
        if let Ok(mut slot) = handle_mutex_poison(self.task.lock(), |msg| msg) {
            if self.is_closed() {
                task.abort();
            } else {
                *slot = Some(task);
            }
        }
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.wanted.notify_one();
        match handle_mutex_poison(self.task.lock(), |msg| msg) {
            Ok(mut slot) => {
                if let Some(task) = slot.take() {
                    task.abort();
                }
            }
            Err(msg) => log::error!("Stream task handle unavailable: {}", msg),
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn push(&self, item: V) {
        if let Ok(mut state) = handle_mutex_poison(self.state.lock(), |msg| msg) {
            state.buffer.push_back(item);
        }
    }

    fn end(&self, termination: Termination<E>) {
        if let Ok(mut state) = handle_mutex_poison(self.state.lock(), |msg| msg) {
            state.terminal = Some(termination);
        }
    }
}

struct RelaySource<V, E> {
    relay: Arc<Relay<V, E>>,
}

impl<V: Send, E: Send> Source<V, E> for RelaySource<V, E> {
    fn pull(&mut self) -> Pull<V, E> {
        let mut state = match handle_mutex_poison(self.relay.state.lock(), |msg| msg) {
            Ok(state) => state,
            Err(msg) => return Pull::Done(Termination::fault(Fault::Panicked { message: msg })),
        };
        if let Some(item) = state.buffer.pop_front() {
            return Pull::Item(item);
        }
        if let Some(termination) = state.terminal.take() {
            return Pull::Done(termination);
        }
        drop(state);
        self.relay.wanted.notify_one();
        Pull::Pending
    }

    fn poll_terminal(&mut self) -> Option<Termination<E>> {
        let mut state = handle_mutex_poison(self.relay.state.lock(), |msg| msg).ok()?;
        if !state.buffer.is_empty() {
            return None;
        }
        let terminal = state.terminal.take();
        drop(state);
        if terminal.is_none() {
            // look one item ahead so an exhausted stream is noticed
            self.relay.wanted.notify_one();
        }
        terminal
    }
}

impl<V, E> Drop for RelaySource<V, E> {
    fn drop(&mut self) {
        self.relay.close();
    }
}

/// Poll the stream one item at a time, as the subscription asks for more
async fn pump<V, E>(
    mut stream: BoxStream<'static, Result<V, E>>,
    relay: Arc<Relay<V, E>>,
    subscription: Weak<SerialSubscription<V, E>>,
) where
    V: Send + 'static,
    E: Error + Send + Sync + 'static,
{
    loop {
        if relay.is_closed() {
            break;
        }

        let terminal = match AssertUnwindSafe(stream.next()).catch_unwind().await {
            Ok(Some(Ok(item))) => {
                relay.push(item);
                None
            }
            Ok(Some(Err(error))) => Some(Termination::expected(error)),
            Ok(None) => Some(Termination::Complete),
            Err(payload) => Some(Termination::fault(Fault::from_panic(payload))),
        };
        let ended = terminal.is_some();
        if let Some(termination) = terminal {
            relay.end(termination);
        }

        match subscription.upgrade() {
            Some(subscription) => subscription.drain(),
            None => break,
        }
        if ended {
            break;
        }

        relay.wanted.notified().await;
    }
    log::trace!("Stream pump stopped");
}
