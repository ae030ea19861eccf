//! Contract Test: Propagation Wait
//!
//! Constraints verified:
//! - fulfill never returns before the configured wait has elapsed
//! - A zero wait returns without sleeping
//! - Failures are reported before any wait
//! - retract never waits
//!
//! If this test fails, validation may be requested before the record is visible.

mod common;

use common::*;
use dns01_core::{ChallengeEvent, Error};
use std::time::{Duration, Instant};

#[tokio::test]
async fn fulfill_waits_at_least_configured_duration() {
    let provider = MockDnsProvider::new(&["example.com"]);
    let (manager, _events) = manager_with(&provider, 1);

    let start = Instant::now();
    manager.fulfill("sub.example.com", "TOKEN").await.unwrap();

    assert!(
        start.elapsed() >= Duration::from_secs(1),
        "fulfill returned after {:?}",
        start.elapsed()
    );
}

#[tokio::test]
async fn record_is_published_before_wait() {
    let provider = MockDnsProvider::new(&["example.com"]);
    let (manager, mut events) = manager_with(&provider, 1);

    manager.fulfill("sub.example.com", "TOKEN").await.unwrap();

    assert!(matches!(
        events.recv().await,
        Some(ChallengeEvent::Published { .. })
    ));
    assert_eq!(
        events.recv().await,
        Some(ChallengeEvent::PropagationWaitStarted {
            record_name: "_acme-challenge.sub.example.com".to_string(),
            seconds: 1,
        })
    );
}

#[tokio::test]
async fn zero_wait_returns_promptly() {
    let provider = MockDnsProvider::new(&["example.com"]);
    let (manager, _events) = manager_with(&provider, 0);

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        manager.fulfill("sub.example.com", "TOKEN"),
    )
    .await;

    assert!(result.expect("no wait configured").is_ok());
}

#[tokio::test]
async fn invalid_credentials_fail_before_wait() {
    let provider = MockDnsProvider::new(&["example.com"]);
    provider.fail_all(MockFailure::Authentication);
    let (manager, _events) = manager_with(&provider, 3600);

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        manager.fulfill("sub.example.com", "TOKEN"),
    )
    .await
    .expect("error must be returned before the propagation wait");

    assert!(matches!(result, Err(Error::Authentication(_))));
    assert_eq!(provider.create_call_count(), 0);
}

#[tokio::test]
async fn create_rejected_credentials_fail_before_wait() {
    let provider = MockDnsProvider::new(&["example.com"]);
    provider.fail_create(MockFailure::Authentication);
    let (manager, _events) = manager_with(&provider, 3600);

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        manager.fulfill("sub.example.com", "TOKEN"),
    )
    .await
    .expect("error must be returned before the propagation wait");

    assert!(matches!(result, Err(Error::Authentication(_))));
    assert_eq!(provider.create_call_count(), 1);
}

#[tokio::test]
async fn retract_does_not_wait() {
    let provider = MockDnsProvider::new(&["example.com"]);
    let (manager, _events) = manager_with(&provider, 3600);

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        manager.retract("sub.example.com", "TOKEN"),
    )
    .await;

    assert!(result.expect("retract must not sleep").is_ok());
}
