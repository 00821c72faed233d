//! Shared helpers for unit tests
//!
//! Provides a recording subscriber that captures every signal it receives in
//! order, plus a small domain error for exercising the typed channel.

use crate::subscriber::api::{Fault, Subscriber, TypedSubscriber};
use crate::subscription::api::Subscription;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TestError {
    #[error("boom: {0}")]
    Boom(String),
}

/// One observed signal
#[derive(Debug, Clone, PartialEq)]
pub enum Signal<V> {
    Subscribe,
    Next(V),
    Complete,
    Error(String),
    Expected(TestError),
}

impl<V> Signal<V> {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Signal::Complete | Signal::Error(_) | Signal::Expected(_)
        )
    }
}

/// Shared view of what a [`Recorder`] observed
pub struct Recording<V> {
    signals: Arc<Mutex<Vec<Signal<V>>>>,
    faults: Arc<Mutex<Vec<Fault>>>,
    subscription: Arc<Mutex<Option<Arc<dyn Subscription>>>>,
}

impl<V> Clone for Recording<V> {
    fn clone(&self) -> Self {
        Self {
            signals: Arc::clone(&self.signals),
            faults: Arc::clone(&self.faults),
            subscription: Arc::clone(&self.subscription),
        }
    }
}

impl<V: Clone + PartialEq> Recording<V> {
    pub fn signals(&self) -> Vec<Signal<V>> {
        self.signals.lock().unwrap().clone()
    }

    pub fn items(&self) -> Vec<V> {
        self.signals()
            .into_iter()
            .filter_map(|s| match s {
                Signal::Next(v) => Some(v),
                _ => None,
            })
            .collect()
    }

    pub fn faults(&self) -> Vec<Fault> {
        self.faults.lock().unwrap().clone()
    }

    pub fn terminal_count(&self) -> usize {
        self.signals().iter().filter(|s| s.is_terminal()).count()
    }

    pub fn subscribed(&self) -> bool {
        self.signals().contains(&Signal::Subscribe)
    }

    pub fn request(&self, n: u64) {
        let subscription = self.subscription.lock().unwrap().clone();
        subscription.expect("not subscribed").request(n);
    }

    pub fn cancel(&self) {
        let subscription = self.subscription.lock().unwrap().clone();
        subscription.expect("not subscribed").cancel();
    }
}

/// Subscriber recording every signal, with optional scripted demand
pub struct Recorder<V> {
    recording: Recording<V>,
    initial_request: Option<u64>,
    request_per_item: bool,
    cancel_after: Option<usize>,
    seen: usize,
}

impl<V: Clone + Send + 'static> Recorder<V> {
    pub fn new() -> (Self, Recording<V>) {
        let recording = Recording {
            signals: Arc::new(Mutex::new(Vec::new())),
            faults: Arc::new(Mutex::new(Vec::new())),
            subscription: Arc::new(Mutex::new(None)),
        };
        let recorder = Self {
            recording: recording.clone(),
            initial_request: None,
            request_per_item: false,
            cancel_after: None,
            seen: 0,
        };
        (recorder, recording)
    }

    /// Request `n` from inside `on_subscribe`
    pub fn requesting(mut self, n: u64) -> Self {
        self.initial_request = Some(n);
        self
    }

    /// Request one more item from inside every `on_next`
    pub fn one_by_one(mut self) -> Self {
        self.initial_request = Some(1);
        self.request_per_item = true;
        self
    }

    /// Cancel from inside `on_next` after `n` items
    pub fn cancelling_after(mut self, n: usize) -> Self {
        self.cancel_after = Some(n);
        self
    }

    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    fn push(&self, signal: Signal<V>) {
        self.recording.signals.lock().unwrap().push(signal);
    }
}

impl<V: Clone + Send + 'static> Subscriber<V> for Recorder<V> {
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        self.push(Signal::Subscribe);
        *self.recording.subscription.lock().unwrap() = Some(Arc::clone(&subscription));
        if let Some(n) = self.initial_request {
            subscription.request(n);
        }
    }

    fn on_next(&mut self, item: V) {
        self.push(Signal::Next(item));
        self.seen += 1;
        let subscription = self.recording.subscription.lock().unwrap().clone();
        if let Some(subscription) = subscription {
            if self.cancel_after == Some(self.seen) {
                subscription.cancel();
            } else if self.request_per_item {
                subscription.request(1);
            }
        }
    }

    fn on_error(&mut self, fault: Fault) {
        self.push(Signal::Error(fault.to_string()));
        self.recording.faults.lock().unwrap().push(fault);
    }

    fn on_complete(&mut self) {
        self.push(Signal::Complete);
    }
}

impl<V: Clone + Send + 'static> TypedSubscriber<V, TestError> for Recorder<V> {
    fn on_expected_error(&mut self, error: TestError) {
        self.push(Signal::Expected(error));
    }
}
