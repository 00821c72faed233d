//! Tests for settings loading and validation

use crate::config::{ConfigError, Settings};
use crate::core::logging::LogFormat;
use crate::producer::api::{Admission, AdmissionPolicy, DEFAULT_QUEUE_CAPACITY};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_empty_file_yields_defaults() {
    let settings = Settings::from_toml_str("").unwrap();
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.producer.queue_capacity, DEFAULT_QUEUE_CAPACITY);
    assert_eq!(settings.logging.level, "info");
    assert_eq!(settings.demo.subscribers, 3);
}

#[test]
fn test_sections_override_defaults() {
    let settings = Settings::from_toml_str(
        r#"
        [logging]
        level = "debug"
        format = "json"

        [producer]
        queue_capacity = 32
        admission = "exclusive"
        required_context = ["tenant"]

        [demo]
        batch = 4
        "#,
    )
    .unwrap();

    assert_eq!(settings.logging.level, "debug");
    assert_eq!(settings.logging.format, LogFormat::Json);
    assert_eq!(settings.producer.queue_capacity, 32);
    assert_eq!(settings.producer.admission, AdmissionPolicy::Exclusive);
    assert_eq!(settings.demo.batch, 4);
    assert_eq!(settings.demo.items, 100);
}

#[test]
fn test_unknown_field_is_a_parse_error() {
    let result = Settings::from_toml_str("[producer]\nqueue_size = 3\n");
    assert!(matches!(result, Err(ConfigError::Parse { .. })));
}

#[test]
fn test_zero_capacity_is_invalid() {
    match Settings::from_toml_str("[producer]\nqueue_capacity = 0\n") {
        Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "producer.queue_capacity"),
        other => panic!("Expected Invalid, got {:?}", other),
    }
}

#[test]
fn test_zero_batch_is_invalid() {
    assert!(matches!(
        Settings::from_toml_str("[demo]\nbatch = 0\n"),
        Err(ConfigError::Invalid { .. })
    ));
}

#[test]
fn test_admission_from_producer_settings() {
    let settings = Settings::from_toml_str(
        r#"
        [producer]
        admission = "closed"
        max_subscribers = 2
        rejection_message = "maintenance window"
        required_context = ["tenant", "region"]
        "#,
    )
    .unwrap();

    let admission = Admission::from(&settings.producer);
    assert_eq!(admission.policy(), AdmissionPolicy::Closed);
    assert_eq!(admission.max_subscribers(), Some(2));
    assert_eq!(admission.required_context(), ["tenant", "region"]);
}

#[tokio::test]
async fn test_load_from_explicit_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[demo]\nitems = 7\nsubscribers = 2").unwrap();

    let settings = Settings::load(Some(file.path())).await.unwrap();
    assert_eq!(settings.demo.items, 7);
    assert_eq!(settings.demo.subscribers, 2);
}

#[tokio::test]
async fn test_load_reports_missing_explicit_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");

    match Settings::load(Some(&missing)).await {
        Err(ConfigError::NotFound { path }) => assert_eq!(path, missing),
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_parse_error_names_the_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[demo\nitems = ").unwrap();

    match Settings::load(Some(file.path())).await {
        Err(ConfigError::Parse { path, .. }) => assert_eq!(path, file.path()),
        other => panic!("Expected Parse, got {:?}", other),
    }
}
