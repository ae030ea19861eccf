//! Challenge record lifecycle
//!
//! The ChallengeManager is responsible for:
//! - Resolving the zone and record name for a challenge domain
//! - Publishing the challenge TXT record via DnsProvider
//! - Waiting a fixed propagation interval
//! - Removing exactly the record it published
//!
//! ## Architecture
//!
//! ```text
//!  host perform(fqdn, token)              host cleanup(fqdn, token)
//!            │                                       │
//!            ▼                                       ▼
//!   ┌──────────────────┐                   ┌──────────────────┐
//!   │ fulfill          │                   │ retract          │
//!   └──────────────────┘                   └──────────────────┘
//!       │        │                             │        │
//!       ▼        ▼                             ▼        ▼
//!   zone::   DnsProvider::                 zone::   DnsProvider::
//!   resolve  create_txt_record             resolve  delete_txt_record
//!                │
//!                ▼
//!        propagation sleep
//! ```
//!
//! ## State
//!
//! Per `(fqdn, token)` the record goes `Idle → Published → Idle`. Nothing is
//! persisted: `retract` recomputes the target from the same inputs. A process
//! that dies between the two calls leaves the record orphaned at the
//! provider; it has to be removed out-of-band.

use crate::config::ChallengeConfig;
use crate::error::{Error, Result};
use crate::traits::{CreateResult, DeleteResult, DnsProvider};
use crate::zone;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Which half of the challenge an event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeOperation {
    /// Publishing the record (host "perform")
    Fulfill,
    /// Removing the record (host "cleanup")
    Retract,
}

/// Events emitted by the ChallengeManager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeEvent {
    /// TXT record is present at the provider
    Published {
        record_name: String,
        zone: String,
        /// `false` if an identical record already existed
        created: bool,
    },

    /// Propagation wait started
    PropagationWaitStarted {
        record_name: String,
        seconds: u64,
    },

    /// TXT record is gone from the provider
    Retracted {
        record_name: String,
        zone: String,
        /// `false` if there was nothing to delete
        was_present: bool,
    },

    /// Operation failed; the error is also returned to the caller
    Failed {
        fqdn: String,
        operation: ChallengeOperation,
        error: String,
    },
}

/// A published challenge record
///
/// Exists only in memory, between `fulfill` and `retract`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeRecord {
    /// Domain being validated (normalized)
    pub fqdn: String,
    /// Fully-qualified TXT record name
    pub record_name: String,
    /// Validation token, published verbatim
    pub token: String,
    /// Managed zone holding the record
    pub zone: String,
    /// Record name relative to `zone`
    pub subdomain: String,
    /// Identifier reported by the provider
    pub provider_record_id: Option<String>,
    /// When the provider confirmed the record
    pub published_at: DateTime<Utc>,
}

/// Result of a retract call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetractOutcome {
    /// The record existed and was deleted
    Deleted,
    /// No record existed (already removed, or never created)
    AlreadyAbsent,
}

/// DNS-01 challenge manager
///
/// Holds the provider (and with it the credentials) and the propagation
/// wait. A host constructs one and calls [`fulfill`](Self::fulfill) before
/// requesting validation and [`retract`](Self::retract) afterwards, whatever
/// the validation outcome.
///
/// ## Concurrency
///
/// Calls for distinct `(fqdn, token)` pairs are independent. Concurrent
/// fulfillment of the *same* pair is not supported; hosts serialize
/// challenges.
///
/// ## Errors
///
/// Provider and resolver errors are returned unchanged. The only swallowed
/// condition is "already absent" on retract. There is no retry.
pub struct ChallengeManager {
    /// DNS provider for publishing records
    provider: Box<dyn DnsProvider>,

    /// Fixed wait after publishing
    propagation: Duration,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<ChallengeEvent>,
}

impl ChallengeManager {
    /// Create a new challenge manager
    ///
    /// # Parameters
    ///
    /// - `provider`: DNS provider implementation
    /// - `config`: Challenge configuration
    ///
    /// # Returns
    ///
    /// A tuple of (manager, event_receiver) where event_receiver yields challenge events
    pub fn new(
        provider: Box<dyn DnsProvider>,
        config: ChallengeConfig,
    ) -> Result<(Self, mpsc::Receiver<ChallengeEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let manager = Self {
            provider,
            propagation: config.propagation(),
            event_tx: tx,
        };

        Ok((manager, rx))
    }

    /// The configured propagation wait
    pub fn propagation(&self) -> Duration {
        self.propagation
    }

    /// Name of the underlying provider
    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    /// Publish the challenge record and wait for propagation
    ///
    /// Returns only after the full propagation wait has elapsed. Failures
    /// (including bad credentials) are returned before any waiting.
    ///
    /// # Parameters
    ///
    /// - `fqdn`: Domain being validated (a wildcard's `*.` prefix is accepted)
    /// - `token`: Validation string, published verbatim
    pub async fn fulfill(&self, fqdn: &str, token: &str) -> Result<ChallengeRecord> {
        let record = match self.publish(fqdn, token).await {
            Ok(record) => record,
            Err(e) => {
                self.emit_failure(fqdn, ChallengeOperation::Fulfill, &e);
                return Err(e);
            }
        };

        if !self.propagation.is_zero() {
            info!(
                "Waiting {}s for {} to propagate",
                self.propagation.as_secs(),
                record.record_name
            );
            self.emit_event(ChallengeEvent::PropagationWaitStarted {
                record_name: record.record_name.clone(),
                seconds: self.propagation.as_secs(),
            });
            tokio::time::sleep(self.propagation).await;
        }

        Ok(record)
    }

    /// Remove the challenge record
    ///
    /// Safe to call speculatively: a missing record (never created, or
    /// already removed) is [`RetractOutcome::AlreadyAbsent`], not an error.
    pub async fn retract(&self, fqdn: &str, token: &str) -> Result<RetractOutcome> {
        match self.remove(fqdn, token).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.emit_failure(fqdn, ChallengeOperation::Retract, &e);
                Err(e)
            }
        }
    }

    async fn publish(&self, fqdn: &str, token: &str) -> Result<ChallengeRecord> {
        validate_token(token)?;

        let target = zone::resolve(&*self.provider, fqdn).await?;

        debug!(
            "Creating TXT record {} in zone {}",
            target.record_name, target.zone
        );
        let result = self
            .provider
            .create_txt_record(&target.zone, &target.subdomain, token)
            .await?;

        let created = matches!(result, CreateResult::Created { .. });
        if created {
            info!("Published TXT record {} (zone {})", target.record_name, target.zone);
        } else {
            info!(
                "TXT record {} already present with this token (zone {})",
                target.record_name, target.zone
            );
        }

        self.emit_event(ChallengeEvent::Published {
            record_name: target.record_name.clone(),
            zone: target.zone.clone(),
            created,
        });

        Ok(ChallengeRecord {
            fqdn: target.domain,
            record_name: target.record_name,
            token: token.to_string(),
            zone: target.zone,
            subdomain: target.subdomain,
            provider_record_id: Some(result.record_id().to_string()),
            published_at: Utc::now(),
        })
    }

    async fn remove(&self, fqdn: &str, token: &str) -> Result<RetractOutcome> {
        validate_token(token)?;

        let target = zone::resolve(&*self.provider, fqdn).await?;

        debug!(
            "Deleting TXT record {} in zone {}",
            target.record_name, target.zone
        );
        let result = self
            .provider
            .delete_txt_record(&target.zone, &target.subdomain, token)
            .await?;

        let outcome = match result {
            DeleteResult::Deleted => {
                info!("Removed TXT record {} (zone {})", target.record_name, target.zone);
                RetractOutcome::Deleted
            }
            DeleteResult::Absent => {
                debug!("TXT record {} already absent", target.record_name);
                RetractOutcome::AlreadyAbsent
            }
        };

        self.emit_event(ChallengeEvent::Retracted {
            record_name: target.record_name,
            zone: target.zone,
            was_present: outcome == RetractOutcome::Deleted,
        });

        Ok(outcome)
    }

    fn emit_failure(&self, fqdn: &str, operation: ChallengeOperation, error: &Error) {
        self.emit_event(ChallengeEvent::Failed {
            fqdn: fqdn.to_string(),
            operation,
            error: error.to_string(),
        });
    }

    /// Emit a challenge event
    fn emit_event(&self, event: ChallengeEvent) {
        // Never block the challenge on a slow consumer
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full or closed, dropping challenge event");
        }
    }
}

fn validate_token(token: &str) -> Result<()> {
    if token.is_empty() {
        return Err(Error::invalid_input("Validation token cannot be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;
    use crate::provider::MemoryProvider;

    fn manager(provider: MemoryProvider) -> (ChallengeManager, mpsc::Receiver<ChallengeEvent>) {
        let config = ChallengeConfig::new(ProviderConfig::Memory {
            zones: vec!["example.com".to_string()],
        })
        .with_propagation_seconds(0);
        ChallengeManager::new(Box::new(provider), config).unwrap()
    }

    #[tokio::test]
    async fn test_fulfill_returns_record() {
        let provider = MemoryProvider::new(["example.com"]);
        let (manager, _events) = manager(provider.clone());

        let record = manager.fulfill("*.Sub.Example.com", "TOKEN123").await.unwrap();

        assert_eq!(record.fqdn, "sub.example.com");
        assert_eq!(record.record_name, "_acme-challenge.sub.example.com");
        assert_eq!(record.zone, "example.com");
        assert_eq!(record.subdomain, "_acme-challenge.sub");
        assert_eq!(record.token, "TOKEN123");
        assert_eq!(
            record.provider_record_id.as_deref(),
            Some("_acme-challenge.sub/TXT/TOKEN123")
        );
    }

    #[tokio::test]
    async fn test_events_follow_lifecycle() {
        let provider = MemoryProvider::new(["example.com"]);
        let (manager, mut events) = manager(provider);

        manager.fulfill("example.com", "T").await.unwrap();
        manager.retract("example.com", "T").await.unwrap();

        assert_eq!(
            events.recv().await,
            Some(ChallengeEvent::Published {
                record_name: "_acme-challenge.example.com".to_string(),
                zone: "example.com".to_string(),
                created: true,
            })
        );
        assert_eq!(
            events.recv().await,
            Some(ChallengeEvent::Retracted {
                record_name: "_acme-challenge.example.com".to_string(),
                zone: "example.com".to_string(),
                was_present: true,
            })
        );
    }

    #[tokio::test]
    async fn test_empty_token_rejected() {
        let provider = MemoryProvider::new(["example.com"]);
        let (manager, mut events) = manager(provider.clone());

        let err = manager.fulfill("example.com", "").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(provider.is_empty().await);
        assert!(matches!(
            events.recv().await,
            Some(ChallengeEvent::Failed {
                operation: ChallengeOperation::Fulfill,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_full_event_channel_does_not_block() {
        let provider = MemoryProvider::new(["example.com"]);
        let config = ChallengeConfig::new(ProviderConfig::Memory { zones: vec![] })
            .with_propagation_seconds(0);
        let config = ChallengeConfig {
            event_channel_capacity: 1,
            ..config
        };
        let (manager, _events) = ChallengeManager::new(Box::new(provider), config).unwrap();

        for token in ["A", "B", "C"] {
            manager.fulfill("example.com", token).await.unwrap();
            manager.retract("example.com", token).await.unwrap();
        }
    }
}
