// # DNS Provider Trait
//
// Defines the interface for publishing and removing challenge TXT records
// via provider APIs.
//
// ## Implementations
//
// - Reg.ru: `dns01-provider-regru` crate
// - In-process: `dns01_core::provider::MemoryProvider`
//
// ## Usage
//
// ```rust,ignore
// use dns01_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let zones = provider.list_zones().await?;
//     provider
//         .create_txt_record("example.com", "_acme-challenge.www", "TOKEN")
//         .await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// Result of a TXT record creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateResult {
    /// A new record was created
    Created {
        /// Provider identifier of the new record
        record_id: String,
    },
    /// An identical record (same name, same value) already existed
    AlreadyPresent {
        /// Provider identifier of the existing record
        record_id: String,
    },
}

impl CreateResult {
    /// The identifier of the record now holding the value
    pub fn record_id(&self) -> &str {
        match self {
            CreateResult::Created { record_id } | CreateResult::AlreadyPresent { record_id } => {
                record_id
            }
        }
    }
}

/// Result of a TXT record deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteResult {
    /// The record existed and was removed
    Deleted,
    /// No matching record existed (no-op)
    Absent,
}

/// Trait for DNS provider implementations
///
/// Polymorphic over the capability set `{list_zones, create_txt_record,
/// delete_txt_record}` so the zone resolver and the challenge manager never
/// depend on a specific provider's API.
///
/// # Trust Level: Untrusted
///
/// Providers are isolated, stateless, single-shot components:
///
/// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
/// - ✅ Authenticate every call from the immutable credentials they own
/// - ✅ Return success or failure (the host owns retry policy)
/// - ❌ Retry, back off, or sleep
/// - ❌ Cache zones or records between calls
/// - ❌ Log credentials
///
/// # Record names
///
/// `subdomain` is always relative to `zone`: the record
/// `_acme-challenge.www.example.com` in zone `example.com` is passed as
/// `("example.com", "_acme-challenge.www")`.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List the zones manageable under the configured credentials
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<String>)`: Zone names, in any order
    /// - `Err(Error::Authentication)`: Credentials rejected
    /// - `Err(Error::Provider)`: Any other failure
    async fn list_zones(&self) -> Result<Vec<String>, crate::Error>;

    /// Create a TXT record holding `value` at `subdomain` within `zone`
    ///
    /// # Idempotency
    ///
    /// Must succeed when an identical record already exists, returning
    /// [`CreateResult::AlreadyPresent`] (or relying on provider-side dedup).
    /// Hosts may request the same challenge twice across retries.
    ///
    /// # Errors
    ///
    /// - `Error::Authentication`: Credentials rejected
    /// - `Error::ZoneNotFound`: The zone is not manageable under the credentials
    /// - `Error::Provider`: Any other non-success response, including rate limiting
    async fn create_txt_record(
        &self,
        zone: &str,
        subdomain: &str,
        value: &str,
    ) -> Result<CreateResult, crate::Error>;

    /// Delete the TXT record holding `value` at `subdomain` within `zone`
    ///
    /// Records at the same name with other values are left untouched.
    ///
    /// # Idempotency
    ///
    /// Returns [`DeleteResult::Absent`] (not an error) if no such record exists.
    async fn delete_txt_record(
        &self,
        zone: &str,
        subdomain: &str,
        value: &str,
    ) -> Result<DeleteResult, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers from configuration
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance from configuration
    ///
    /// # Returns
    ///
    /// A boxed DnsProvider trait object, or `Error::Config` if the
    /// configuration belongs to another provider type.
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn DnsProvider>, crate::Error>;
}
