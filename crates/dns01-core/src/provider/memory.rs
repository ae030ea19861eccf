// # Memory DNS Provider
//
// In-process implementation of DnsProvider.
//
// ## Purpose
//
// Holds a fixed zone set and a TXT record set in memory. Useful for testing,
// for embedding, and for rehearsing a hook configuration without touching a
// real account.
//
// ## Record identifiers
//
// Identifiers are derived from the record itself (`<subdomain>/TXT/<value>`),
// so the same record always reports the same identifier.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use async_trait::async_trait;

use crate::config::ProviderConfig;
use crate::traits::{CreateResult, DeleteResult, DnsProvider, DnsProviderFactory};
use crate::Error;

/// In-memory DNS provider
///
/// Clones share the same record set.
///
/// # Example
///
/// ```rust,no_run
/// use dns01_core::provider::MemoryProvider;
/// use dns01_core::traits::DnsProvider;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let provider = MemoryProvider::new(["example.com"]);
///
///     provider
///         .create_txt_record("example.com", "_acme-challenge.www", "TOKEN")
///         .await?;
///     assert_eq!(provider.records("example.com").await.len(), 1);
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryProvider {
    zones: Vec<String>,
    records: Arc<RwLock<BTreeMap<String, BTreeSet<(String, String)>>>>,
    reject_credentials: bool,
}

impl MemoryProvider {
    /// Create a provider managing the given zones
    pub fn new<I, S>(zones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            zones: zones
                .into_iter()
                .map(|z| z.into().trim_end_matches('.').to_ascii_lowercase())
                .collect(),
            records: Arc::new(RwLock::new(BTreeMap::new())),
            reject_credentials: false,
        }
    }

    /// Make every call fail with `Error::Authentication`
    pub fn with_rejected_credentials(mut self) -> Self {
        self.reject_credentials = true;
        self
    }

    /// Snapshot of the `(subdomain, value)` TXT records in a zone
    pub async fn records(&self, zone: &str) -> Vec<(String, String)> {
        let guard = self.records.read().await;
        guard
            .get(zone)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Total number of TXT records across all zones
    pub async fn len(&self) -> usize {
        let guard = self.records.read().await;
        guard.values().map(BTreeSet::len).sum()
    }

    /// Check if no TXT records exist
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn authorize(&self) -> Result<(), Error> {
        if self.reject_credentials {
            return Err(Error::auth("Memory provider rejects the configured credentials"));
        }
        Ok(())
    }

    fn check_zone(&self, zone: &str) -> Result<(), Error> {
        if !self.zones.iter().any(|z| z == zone) {
            return Err(Error::zone_not_found(format!("Zone not managed: {}", zone)));
        }
        Ok(())
    }

    fn record_id(subdomain: &str, value: &str) -> String {
        format!("{}/TXT/{}", subdomain, value)
    }
}

#[async_trait]
impl DnsProvider for MemoryProvider {
    async fn list_zones(&self) -> Result<Vec<String>, Error> {
        self.authorize()?;
        Ok(self.zones.clone())
    }

    async fn create_txt_record(
        &self,
        zone: &str,
        subdomain: &str,
        value: &str,
    ) -> Result<CreateResult, Error> {
        self.authorize()?;
        self.check_zone(zone)?;

        let mut guard = self.records.write().await;
        let inserted = guard
            .entry(zone.to_string())
            .or_default()
            .insert((subdomain.to_string(), value.to_string()));

        let record_id = Self::record_id(subdomain, value);
        if inserted {
            Ok(CreateResult::Created { record_id })
        } else {
            Ok(CreateResult::AlreadyPresent { record_id })
        }
    }

    async fn delete_txt_record(
        &self,
        zone: &str,
        subdomain: &str,
        value: &str,
    ) -> Result<DeleteResult, Error> {
        self.authorize()?;
        self.check_zone(zone)?;

        let mut guard = self.records.write().await;
        let removed = match guard.get_mut(zone) {
            Some(set) => set.remove(&(subdomain.to_string(), value.to_string())),
            None => false,
        };
        if guard.get(zone).is_some_and(BTreeSet::is_empty) {
            guard.remove(zone);
        }

        if removed {
            Ok(DeleteResult::Deleted)
        } else {
            Ok(DeleteResult::Absent)
        }
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

/// Factory for creating memory providers
pub struct MemoryProviderFactory;

impl DnsProviderFactory for MemoryProviderFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>, Error> {
        match config {
            ProviderConfig::Memory { zones } => Ok(Box::new(MemoryProvider::new(zones.clone()))),
            _ => Err(Error::config("Invalid config for memory provider")),
        }
    }
}
