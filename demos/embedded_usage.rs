//! Minimal embedding example for dns01-core
//!
//! An ACME client that keeps challenges in-process constructs a provider and
//! a ChallengeManager itself, calls `fulfill` before asking the CA to
//! validate and `retract` afterwards.

use dns01_core::config::{ChallengeConfig, ProviderConfig};
use dns01_core::{ChallengeEvent, ChallengeManager, MemoryProvider, Result, RetractOutcome};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    // A real host would use a network provider here
    let provider = MemoryProvider::new(["example.com"]);
    let inspector = provider.clone();

    let config = ChallengeConfig::new(ProviderConfig::Memory {
        zones: vec!["example.com".to_string()],
    })
    .with_propagation_seconds(1);

    let (manager, mut events) = ChallengeManager::new(Box::new(provider), config)?;

    let monitor = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                ChallengeEvent::Published { record_name, created, .. } => {
                    tracing::info!("published {} (new: {})", record_name, created);
                }
                ChallengeEvent::PropagationWaitStarted { record_name, seconds } => {
                    tracing::info!("waiting {}s for {}", seconds, record_name);
                }
                ChallengeEvent::Retracted { record_name, was_present, .. } => {
                    tracing::info!("retracted {} (was present: {})", record_name, was_present);
                }
                ChallengeEvent::Failed { fqdn, operation, error } => {
                    tracing::error!("{:?} failed for {}: {}", operation, fqdn, error);
                }
            }
        }
    });

    let record = manager.fulfill("*.www.example.com", "demo-token").await?;
    tracing::info!(
        "record {} in zone {} as {}",
        record.record_name,
        record.zone,
        record.subdomain
    );
    tracing::info!("zone now holds {:?}", inspector.records("example.com").await);

    // ... the CA validates here ...

    match manager.retract("*.www.example.com", "demo-token").await? {
        RetractOutcome::Deleted => tracing::info!("cleanup removed the record"),
        RetractOutcome::AlreadyAbsent => tracing::info!("nothing to clean up"),
    }

    // A second cleanup is a no-op
    let again = manager.retract("*.www.example.com", "demo-token").await?;
    tracing::info!("second retract: {:?}", again);

    drop(manager);
    let _ = monitor.await;

    Ok(())
}
