//! Common test utilities and helpers
//!
//! A subscriber built only on the public API that logs every signal, checks the
//! protocol as it goes and lets the test drive demand from outside.

#![allow(dead_code)]

use reactive::subscriber::api::{Fault, Subscriber, TypedSubscriber};
use reactive::subscription::api::Subscription;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("feed failed: {0}")]
pub struct FeedFailure(pub String);

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Subscribed,
    Item(u64),
    Completed,
    Failed(String),
    ExpectedFailure(FeedFailure),
}

#[derive(Default)]
struct Log {
    events: Vec<Event>,
    granted: u64,
    violations: Vec<String>,
    subscription: Option<Arc<dyn Subscription>>,
}

/// Test-side handle onto a [`Collector`]
#[derive(Clone, Default)]
pub struct Probe {
    log: Arc<Mutex<Log>>,
}

impl Probe {
    pub fn events(&self) -> Vec<Event> {
        self.log.lock().unwrap().events.clone()
    }

    pub fn items(&self) -> Vec<u64> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Item(v) => Some(v),
                _ => None,
            })
            .collect()
    }

    pub fn terminals(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    Event::Completed | Event::Failed(_) | Event::ExpectedFailure(_)
                )
            })
            .count()
    }

    /// Protocol breaches noticed while recording
    pub fn violations(&self) -> Vec<String> {
        self.log.lock().unwrap().violations.clone()
    }

    pub fn request(&self, n: u64) {
        let subscription = {
            let mut log = self.log.lock().unwrap();
            log.granted = log.granted.saturating_add(n);
            log.subscription.clone()
        };
        subscription.expect("not subscribed").request(n);
    }

    pub fn cancel(&self) {
        let subscription = self.log.lock().unwrap().subscription.clone();
        subscription.expect("not subscribed").cancel();
    }

    /// Wait until `done` holds or a second passes
    pub fn wait_for(&self, done: impl Fn(&Probe) -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(1);
        while Instant::now() < deadline {
            if done(self) {
                return true;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        done(self)
    }
}

/// Subscriber requesting `initial` items in `on_subscribe` and nothing else
pub struct Collector {
    probe: Probe,
    initial: u64,
}

impl Collector {
    pub fn new(initial: u64) -> (Box<Self>, Probe) {
        let probe = Probe::default();
        let collector = Box::new(Self {
            probe: probe.clone(),
            initial,
        });
        (collector, probe)
    }

    fn record(&self, event: Event) {
        let mut log = self.probe.log.lock().unwrap();
        let subscribed = log.events.first() == Some(&Event::Subscribed);
        let finished = log.events.iter().any(|e| {
            matches!(
                e,
                Event::Completed | Event::Failed(_) | Event::ExpectedFailure(_)
            )
        });
        if finished {
            log.violations.push(format!("{:?} after terminal signal", event));
        }
        match &event {
            Event::Subscribed if !log.events.is_empty() => {
                log.violations.push("on_subscribe not first".to_string());
            }
            Event::Item(_) => {
                let delivered = log.events.iter().filter(|e| matches!(e, Event::Item(_))).count();
                if !subscribed {
                    log.violations.push("item before on_subscribe".to_string());
                }
                if delivered as u64 >= log.granted {
                    log.violations.push("item beyond requested demand".to_string());
                }
            }
            _ => {}
        }
        log.events.push(event);
    }
}

impl Subscriber<u64> for Collector {
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        self.record(Event::Subscribed);
        self.probe.log.lock().unwrap().subscription = Some(Arc::clone(&subscription));
        if self.initial > 0 {
            self.probe.request(self.initial);
        }
    }

    fn on_next(&mut self, item: u64) {
        self.record(Event::Item(item));
    }

    fn on_error(&mut self, fault: Fault) {
        self.record(Event::Failed(fault.to_string()));
    }

    fn on_complete(&mut self) {
        self.record(Event::Completed);
    }
}

impl TypedSubscriber<u64, FeedFailure> for Collector {
    fn on_expected_error(&mut self, error: FeedFailure) {
        self.record(Event::ExpectedFailure(error));
    }
}
