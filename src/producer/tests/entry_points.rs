//! Tests for the four subscribe entry points and rejection handling

use crate::context::{Context, ContextError};
use crate::producer::api::{
    Admission, IterProducer, SubscribeError, SubscribeSupport, UnsupportedProducer,
};
use crate::testing::{Recorder, Signal, TestError};
use serde_json::{json, Value};
use std::collections::HashMap;

fn numbers() -> IterProducer<u32, TestError> {
    IterProducer::from_vec(vec![1, 2, 3])
}

#[test]
fn test_all_entry_points_establish_subscriptions() {
    let producer = numbers();
    let ctx = Context::from_pairs(&[("tenant", json!("acme"))]).unwrap();

    let recordings: Vec<_> = (0..4)
        .map(|variant| {
            let (recorder, recording) = Recorder::new();
            let recorder = recorder.requesting(3);
            let pairs = [("tenant", json!("acme"))];
            let result = match variant {
                0 => producer.subscribe(recorder.boxed(), &pairs),
                1 => producer.subscribe_typed(recorder.boxed(), &pairs),
                2 => producer.subscribe_in(recorder.boxed(), &ctx),
                _ => producer.subscribe_typed_in(recorder.boxed(), &ctx),
            };
            assert!(result.is_ok());
            recording
        })
        .collect();

    for recording in recordings {
        assert_eq!(
            recording.signals(),
            vec![
                Signal::Subscribe,
                Signal::Next(1),
                Signal::Next(2),
                Signal::Next(3),
                Signal::Complete
            ]
        );
    }
}

#[test]
fn test_invalid_context_returned_synchronously() {
    let producer = numbers();

    let (recorder, recording) = Recorder::new();
    let result = producer.subscribe(recorder.boxed(), &[("", json!(1))]);
    assert!(matches!(
        result,
        Err(SubscribeError::InvalidContext(ContextError::InvalidArgument { .. }))
    ));
    assert!(recording.signals().is_empty());

    let (recorder, recording) = Recorder::new();
    let result = producer.subscribe_typed(recorder.boxed(), &[("tenant", Value::Null)]);
    assert!(matches!(result, Err(SubscribeError::InvalidContext(_))));
    assert!(recording.signals().is_empty());
}

#[test]
fn test_duplicate_keys_rejected_synchronously() {
    let producer = numbers();
    let (recorder, recording) = Recorder::new();

    let result = producer.subscribe(
        recorder.boxed(),
        &[("tenant", json!("a")), ("tenant", json!("b"))],
    );

    assert!(result.is_err());
    assert!(recording.signals().is_empty());
}

#[test]
fn test_map_context_reaches_the_source() {
    let producer: IterProducer<String, TestError> = IterProducer::from_fn(|ctx| {
        let region: String = ctx.get_as("region").unwrap_or_default();
        std::iter::once(Ok(region))
    });
    let mut map = HashMap::new();
    map.insert("region".to_string(), json!("eu-west"));
    let ctx = Context::try_from(map).unwrap();

    let (recorder, recording) = Recorder::new();
    producer
        .subscribe_in(recorder.requesting(1).boxed(), &ctx)
        .unwrap();

    assert_eq!(recording.items(), vec!["eu-west".to_string()]);
}

#[test]
fn test_unsupported_producer_rejects_every_variant() {
    let producer: UnsupportedProducer<u32, TestError> =
        UnsupportedProducer::new("read-only mirror");
    assert!(!producer.supports_subscription());

    let (basic, basic_recording) = Recorder::new();
    let (typed, typed_recording) = Recorder::new();
    assert!(producer.subscribe(basic.boxed(), &[]).is_ok());
    assert!(producer
        .subscribe_typed_in(typed.boxed(), &Context::empty())
        .is_ok());

    for recording in [basic_recording, typed_recording] {
        assert!(!recording.subscribed());
        let faults = recording.faults();
        assert_eq!(faults.len(), 1);
        assert_eq!(
            faults[0].rejection(),
            Some(&SubscribeError::Unsupported {
                message: "read-only mirror".into()
            })
        );
    }
}

#[test]
fn test_capacity_rejection_and_recovery() {
    let producer = numbers().with_admission(Admission::open().with_max_subscribers(1));
    let (first, first_recording) = Recorder::new();
    let (second, second_recording) = Recorder::new();

    producer.subscribe(first.boxed(), &[]).unwrap();
    producer.subscribe(second.boxed(), &[]).unwrap();

    assert!(first_recording.subscribed());
    assert_eq!(
        second_recording.faults()[0].rejection(),
        Some(&SubscribeError::CapacityExceeded { max_subscribers: 1 })
    );

    first_recording.request(10);
    assert_eq!(first_recording.terminal_count(), 1);

    let (third, third_recording) = Recorder::new();
    producer.subscribe(third.boxed(), &[]).unwrap();
    assert!(third_recording.subscribed());
}

#[test]
fn test_required_context_rejection() {
    let producer = numbers().with_admission(Admission::open().with_required_context(["tenant"]));

    let (without, without_recording) = Recorder::new();
    producer.subscribe(without.boxed(), &[]).unwrap();
    assert_eq!(
        without_recording.faults()[0].rejection(),
        Some(&SubscribeError::MissingContext {
            key: "tenant".into()
        })
    );

    let (with, with_recording) = Recorder::new();
    producer
        .subscribe(with.boxed(), &[("tenant", json!("acme"))])
        .unwrap();
    assert!(with_recording.subscribed());
}

#[test]
fn test_closed_admission_uses_configured_message() {
    let producer = numbers().with_admission(Admission::closed("draining"));
    let (recorder, recording) = Recorder::new();

    producer.subscribe_typed(recorder.boxed(), &[]).unwrap();

    assert_eq!(recording.terminal_count(), 1);
    assert!(recording.signals()[0] == Signal::Error(recording.faults()[0].to_string()));
    assert!(recording.faults()[0].to_string().contains("draining"));
}
