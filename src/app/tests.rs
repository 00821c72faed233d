//! Tests for the broadcast demonstration

use crate::app::demo::{self, DemoError, DemoReport, Outcome, SubscriberReport};
use crate::config::Settings;

fn small_settings(items: u64, subscribers: usize, batch: u64) -> Settings {
    let mut settings = Settings::default();
    settings.demo.items = items;
    settings.demo.subscribers = subscribers;
    settings.demo.batch = batch;
    settings
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_every_subscriber_receives_every_item() {
    let settings = small_settings(40, 3, 7);

    let report = demo::run(&settings, false).await.unwrap();

    assert_eq!(report.published, 40);
    assert_eq!(report.subscribers.len(), 3);
    for subscriber in &report.subscribers {
        assert_eq!(subscriber.outcome, Outcome::Completed);
        assert_eq!(subscriber.received, 40);
        // batches of 7 cover 40 items after six requests
        assert_eq!(subscriber.requests, 6);
    }
    assert!(report.subscribers[1].typed);
    assert!(!report.subscribers[0].typed);
    report.verify().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_small_queue_publishes_with_retries() {
    let mut settings = small_settings(200, 2, 4);
    settings.producer.queue_capacity = 8;
    settings.demo.publish_attempts = 1_000;
    settings.demo.retry_delay_ms = 1;

    let report = demo::run(&settings, false).await.unwrap();

    report.verify().unwrap();
    assert!(report.subscribers.iter().all(|s| s.received == 200));
}

#[tokio::test]
async fn test_reject_adds_one_rejected_subscriber() {
    let settings = small_settings(10, 2, 5);

    let report = demo::run(&settings, true).await.unwrap();

    assert_eq!(report.subscribers.len(), 3);
    let rejected: Vec<_> = report
        .subscribers
        .iter()
        .filter(|s| matches!(s.outcome, Outcome::Rejected(_)))
        .collect();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].name, "subscriber-3");
    assert_eq!(rejected[0].received, 0);
    assert_eq!(rejected[0].requests, 0);
    report.verify().unwrap();
}

#[test]
fn test_verify_reports_incomplete_subscriber() {
    let report = DemoReport {
        published: 5,
        subscribers: vec![SubscriberReport {
            name: "subscriber-1".to_string(),
            typed: false,
            received: 3,
            requests: 1,
            outcome: Outcome::Pending,
        }],
    };

    match report.verify() {
        Err(DemoError::Incomplete {
            name,
            received,
            expected,
        }) => {
            assert_eq!(name, "subscriber-1");
            assert_eq!(received, 3);
            assert_eq!(expected, 5);
        }
        other => panic!("expected Incomplete, got {:?}", other),
    }
}

#[test]
fn test_render_without_color() {
    let report = DemoReport {
        published: 2,
        subscribers: vec![
            SubscriberReport {
                name: "subscriber-1".to_string(),
                typed: false,
                received: 2,
                requests: 1,
                outcome: Outcome::Completed,
            },
            SubscriberReport {
                name: "subscriber-2".to_string(),
                typed: true,
                received: 0,
                requests: 0,
                outcome: Outcome::Rejected("Subscriber limit reached (max: 1)".to_string()),
            },
        ],
    };

    let rendered = report.render(false);
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("SUBSCRIBER"));
    assert!(lines[1].starts_with("subscriber-1"));
    assert!(lines[1].ends_with("completed"));
    assert!(lines[2].contains("subscriber-2 (typed)"));
    assert!(lines[2].ends_with("rejected: Subscriber limit reached (max: 1)"));
    assert_eq!(lines[3], "2 items published");
    assert!(!rendered.contains('\u{1b}'));
}
