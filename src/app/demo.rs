//! Broadcast demonstration
//!
//! Subscribes a number of batch-demand subscribers to a [`BroadcastProducer`],
//! publishes a run of items, completes the producer and reports what each
//! subscriber observed. Half of the subscribers use the typed variant.

use crate::config::Settings;
use crate::core::error_handling::ContextualError;
use crate::core::retry::{retry_async, RetryPolicy};
use crate::producer::api::{
    Admission, BroadcastProducer, PublishError, SubscribeError, SubscribeSupport,
};
use crate::subscriber::api::{Fault, Subscriber, TypedSubscriber};
use crate::subscription::api::Subscription;
use colored::Colorize;
use serde_json::json;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Expected failure of the demonstration feed
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeedError {
    #[error("Feed interrupted after {published} items")]
    Interrupted { published: u64 },
}

#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    Subscribe(#[from] SubscribeError),

    #[error("Subscriber {name} did not finish: received {received} of {expected} items")]
    Incomplete {
        name: String,
        received: u64,
        expected: u64,
    },
}

impl ContextualError for DemoError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, DemoError::Subscribe(SubscribeError::InvalidContext(_)))
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}

/// How a subscriber's subscription ended
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Completed,
    Failed(String),
    Rejected(String),
    /// No terminal signal before the settle timeout
    Pending,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Completed => write!(f, "completed"),
            Outcome::Failed(reason) => write!(f, "failed: {}", reason),
            Outcome::Rejected(reason) => write!(f, "rejected: {}", reason),
            Outcome::Pending => write!(f, "pending"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubscriberReport {
    pub name: String,
    pub typed: bool,
    pub received: u64,
    /// Number of `request` calls made
    pub requests: u64,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DemoReport {
    pub published: u64,
    pub subscribers: Vec<SubscriberReport>,
}

impl DemoReport {
    /// Fail unless every admitted subscriber completed with every item
    pub fn verify(&self) -> Result<(), DemoError> {
        for report in &self.subscribers {
            match report.outcome {
                Outcome::Rejected(_) => continue,
                Outcome::Completed if report.received == self.published => continue,
                _ => {
                    return Err(DemoError::Incomplete {
                        name: report.name.clone(),
                        received: report.received,
                        expected: self.published,
                    })
                }
            }
        }
        Ok(())
    }

    /// Per-subscriber summary table
    pub fn render(&self, color: bool) -> String {
        let mut out = String::new();
        let header = format!(
            "{:<14} {:>8} {:>9}  {}",
            "SUBSCRIBER", "RECEIVED", "REQUESTS", "OUTCOME"
        );
        if color {
            out.push_str(&header.yellow().bold().to_string());
        } else {
            out.push_str(&header);
        }
        out.push('\n');

        for report in &self.subscribers {
            let name = if report.typed {
                format!("{} (typed)", report.name)
            } else {
                report.name.clone()
            };
            let outcome = report.outcome.to_string();
            let outcome = match (&report.outcome, color) {
                (_, false) => outcome,
                (Outcome::Completed, true) => outcome.green().to_string(),
                (Outcome::Rejected(_), true) => outcome.blue().to_string(),
                (_, true) => outcome.red().to_string(),
            };
            out.push_str(&format!(
                "{:<14} {:>8} {:>9}  {}\n",
                name, report.received, report.requests, outcome
            ));
        }
        out.push_str(&format!("{} items published\n", self.published));
        out
    }
}

/// Subscriber requesting `batch` items at a time
struct BatchSubscriber {
    batch: u64,
    remaining: u64,
    subscription: Option<Arc<dyn Subscription>>,
    report: Arc<Mutex<SubscriberReport>>,
    done: Option<oneshot::Sender<()>>,
}

impl BatchSubscriber {
    fn new(
        name: String,
        typed: bool,
        batch: u64,
    ) -> (Self, Arc<Mutex<SubscriberReport>>, oneshot::Receiver<()>) {
        let report = Arc::new(Mutex::new(SubscriberReport {
            name,
            typed,
            received: 0,
            requests: 0,
            outcome: Outcome::Pending,
        }));
        let (done, finished) = oneshot::channel();
        let subscriber = Self {
            batch,
            remaining: 0,
            subscription: None,
            report: Arc::clone(&report),
            done: Some(done),
        };
        (subscriber, report, finished)
    }

    fn update(&self, change: impl FnOnce(&mut SubscriberReport)) {
        if let Ok(mut report) = self.report.lock() {
            change(&mut report);
        }
    }

    fn request_batch(&mut self) {
        if let Some(subscription) = &self.subscription {
            self.remaining = self.batch;
            self.update(|report| report.requests += 1);
            subscription.request(self.batch);
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        self.subscription = None;
        self.update(|report| report.outcome = outcome);
        if let Some(done) = self.done.take() {
            let _ = done.send(());
        }
    }
}

impl Subscriber<u64> for BatchSubscriber {
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        self.subscription = Some(subscription);
        self.request_batch();
    }

    fn on_next(&mut self, _item: u64) {
        self.update(|report| report.received += 1);
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.request_batch();
        }
    }

    fn on_error(&mut self, fault: Fault) {
        let outcome = match fault.rejection() {
            Some(cause) => Outcome::Rejected(cause.to_string()),
            None => Outcome::Failed(fault.to_string()),
        };
        self.finish(outcome);
    }

    fn on_complete(&mut self) {
        self.finish(Outcome::Completed);
    }
}

impl TypedSubscriber<u64, FeedError> for BatchSubscriber {
    fn on_expected_error(&mut self, error: FeedError) {
        self.finish(Outcome::Failed(error.to_string()));
    }
}

/// Run the demonstration described by `settings`
///
/// With `reject`, admission is capped at the configured subscriber count and
/// one extra subscription is attempted, which the producer rejects.
pub async fn run(settings: &Settings, reject: bool) -> Result<DemoReport, DemoError> {
    let demo = &settings.demo;
    let mut producer: BroadcastProducer<u64, FeedError> =
        BroadcastProducer::from_settings(&settings.producer);
    if reject && producer.admission().max_subscribers().is_none() {
        let capped = Admission::from(&settings.producer).with_max_subscribers(demo.subscribers);
        producer = producer.with_admission(capped);
    }

    let attempts = demo.subscribers + usize::from(reject);
    let mut reports = Vec::with_capacity(attempts);
    let mut finished = Vec::with_capacity(attempts);
    for index in 0..attempts {
        let name = format!("subscriber-{}", index + 1);
        let typed = index % 2 == 1;
        let (subscriber, report, done) = BatchSubscriber::new(name.clone(), typed, demo.batch);
        let ctx = [("subscriber", json!(name)), ("batch", json!(demo.batch))];
        if typed {
            producer.subscribe_typed(Box::new(subscriber), &ctx)?;
        } else {
            producer.subscribe(Box::new(subscriber), &ctx)?;
        }
        reports.push(report);
        finished.push(done);
    }
    log::info!(
        "Publishing {} items to {} subscribers",
        demo.items,
        producer.active_subscriptions()
    );

    let policy = RetryPolicy {
        max_attempts: demo.publish_attempts,
        delay: Duration::from_millis(demo.retry_delay_ms),
    };
    let feed = &producer;
    for item in 0..demo.items {
        retry_async(
            "publish",
            policy.clone(),
            |e: &PublishError| matches!(e, PublishError::QueueFull { .. }),
            move || async move { feed.publish(item) },
        )
        .await?;
    }
    producer.complete()?;
    log::debug!("Producer completed; {} items still buffered", producer.buffered());

    for done in finished {
        if tokio::time::timeout(SETTLE_TIMEOUT, done).await.is_err() {
            log::warn!("A subscriber did not terminate within {:?}", SETTLE_TIMEOUT);
        }
    }

    let subscribers = reports
        .iter()
        .map(|report| match report.lock() {
            Ok(report) => report.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        })
        .collect();
    Ok(DemoReport {
        published: demo.items,
        subscribers,
    })
}
