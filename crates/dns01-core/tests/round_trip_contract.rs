//! Contract Test: Round Trip
//!
//! Constraints verified:
//! - fulfill followed by retract leaves the zone exactly as it was
//! - Records the manager did not create are never removed
//! - Repeating fulfill for the same challenge is safe
//!
//! If this test fails, challenges leak records or destroy foreign ones.

mod common;

use common::*;
use dns01_core::{ChallengeEvent, RetractOutcome};

#[tokio::test]
async fn fulfill_then_retract_is_net_zero() {
    let provider = MockDnsProvider::new(&["example.com"]);
    provider.seed("example.com", "www", "v=spf1 -all").await;
    let before = provider.records("example.com").await;

    let (manager, _events) = manager_with(&provider, 0);
    manager.fulfill("sub.example.com", "TOKEN123").await.unwrap();

    assert_eq!(
        provider.records("example.com").await.len(),
        before.len() + 1,
        "challenge record published"
    );

    let outcome = manager.retract("sub.example.com", "TOKEN123").await.unwrap();

    assert_eq!(outcome, RetractOutcome::Deleted);
    assert_eq!(provider.records("example.com").await, before);
}

#[tokio::test]
async fn retract_only_removes_matching_token() {
    // Two challenges for the same name (e.g. example.com and *.example.com)
    let provider = MockDnsProvider::new(&["example.com"]);
    let (manager, _events) = manager_with(&provider, 0);

    manager.fulfill("example.com", "TOKEN-A").await.unwrap();
    manager.fulfill("*.example.com", "TOKEN-B").await.unwrap();

    manager.retract("example.com", "TOKEN-A").await.unwrap();

    assert_eq!(
        provider.records("example.com").await,
        vec![("_acme-challenge".to_string(), "TOKEN-B".to_string())]
    );
}

#[tokio::test]
async fn repeated_fulfill_is_duplicate_safe() {
    let provider = MockDnsProvider::new(&["example.com"]);
    let (manager, mut events) = manager_with(&provider, 0);

    let first = manager.fulfill("sub.example.com", "TOKEN").await.unwrap();
    let second = manager.fulfill("sub.example.com", "TOKEN").await.unwrap();

    assert_eq!(first.provider_record_id, second.provider_record_id);
    assert_eq!(provider.records("example.com").await.len(), 1);

    assert!(matches!(
        events.recv().await,
        Some(ChallengeEvent::Published { created: true, .. })
    ));
    assert!(matches!(
        events.recv().await,
        Some(ChallengeEvent::Published { created: false, .. })
    ));

    manager.retract("sub.example.com", "TOKEN").await.unwrap();
    assert!(provider.records("example.com").await.is_empty());
}
