//! Contract Test: Idempotent Retract
//!
//! Constraints verified:
//! - Retracting twice never fails on the second call
//! - Retracting a challenge that was never fulfilled is a no-op
//! - Retract after a failed fulfill is safe
//!
//! If this test fails, hosts calling cleanup speculatively will see errors.

mod common;

use common::*;
use dns01_core::{ChallengeEvent, RetractOutcome};

#[tokio::test]
async fn second_retract_is_noop() {
    let provider = MockDnsProvider::new(&["example.com"]);
    let (manager, _events) = manager_with(&provider, 0);

    manager.fulfill("sub.example.com", "TOKEN").await.unwrap();

    let first = manager.retract("sub.example.com", "TOKEN").await.unwrap();
    let second = manager.retract("sub.example.com", "TOKEN").await.unwrap();

    assert_eq!(first, RetractOutcome::Deleted);
    assert_eq!(second, RetractOutcome::AlreadyAbsent);
}

#[tokio::test]
async fn retract_without_fulfill_is_noop() {
    let provider = MockDnsProvider::new(&["example.com"]);
    let (manager, mut events) = manager_with(&provider, 0);

    let outcome = manager.retract("never.example.com", "TOKEN").await.unwrap();

    assert_eq!(outcome, RetractOutcome::AlreadyAbsent);
    assert_eq!(
        events.recv().await,
        Some(ChallengeEvent::Retracted {
            record_name: "_acme-challenge.never.example.com".to_string(),
            zone: "example.com".to_string(),
            was_present: false,
        })
    );
}

#[tokio::test]
async fn retract_after_failed_fulfill_is_safe() {
    let provider = MockDnsProvider::new(&["example.com"]);
    provider.fail_create(MockFailure::Provider);
    let (manager, _events) = manager_with(&provider, 0);

    assert!(manager.fulfill("sub.example.com", "TOKEN").await.is_err());

    provider.heal();
    let outcome = manager.retract("sub.example.com", "TOKEN").await.unwrap();

    assert_eq!(outcome, RetractOutcome::AlreadyAbsent);
    assert!(provider.records("example.com").await.is_empty());
}
