//! Configuration types for the DNS-01 challenge system
//!
//! Credentials and the propagation wait arrive from outside (environment,
//! host configuration). They are validated once and passed by value into the
//! provider and the [`ChallengeManager`](crate::ChallengeManager).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main challenge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeConfig {
    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Fixed wait after publishing a record, in seconds
    ///
    /// Any value is accepted; 0 disables the wait.
    #[serde(default = "default_propagation_seconds")]
    pub propagation_seconds: u64,

    /// Capacity of the challenge event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl ChallengeConfig {
    /// Create a configuration with the default propagation wait
    pub fn new(provider: ProviderConfig) -> Self {
        Self {
            provider,
            propagation_seconds: default_propagation_seconds(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Set the propagation wait
    pub fn with_propagation_seconds(mut self, seconds: u64) -> Self {
        self.propagation_seconds = seconds;
        self
    }

    /// The propagation wait as a [`Duration`]
    pub fn propagation(&self) -> Duration {
        Duration::from_secs(self.propagation_seconds)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }

        self.provider.validate()
    }
}

/// Account credentials for a DNS provider
///
/// `username`/`password` are accepted as aliases so Reg.ru-style
/// configuration deserializes directly.
///
/// # Security
///
/// The Debug implementation does NOT expose the API key.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Account identifier (Reg.ru username)
    #[serde(alias = "username")]
    pub account_id: String,

    /// API secret (Reg.ru password)
    /// ⚠️ NEVER log this value
    #[serde(alias = "password")]
    pub api_key: String,

    /// Override for the provider's API base URL
    #[serde(default)]
    pub api_base_url: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("account_id", &self.account_id)
            .field("api_key", &"<REDACTED>")
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

impl Credentials {
    /// Create credentials for the provider's default endpoint
    pub fn new(account_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            api_key: api_key.into(),
            api_base_url: None,
        }
    }

    /// Point the provider at a different API base URL
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    /// Validate the credentials
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.account_id.trim().is_empty() {
            return Err(crate::Error::config("Account ID cannot be empty"));
        }
        if self.api_key.is_empty() {
            return Err(crate::Error::config("API key cannot be empty"));
        }
        if let Some(ref url) = self.api_base_url
            && !url.starts_with("https://")
            && !url.starts_with("http://")
        {
            return Err(crate::Error::config(format!(
                "API base URL must use HTTP or HTTPS scheme. Got: {}",
                url
            )));
        }
        Ok(())
    }
}

/// DNS provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Reg.ru provider
    Regru {
        /// Account credentials
        credentials: Credentials,
        /// PEM client certificate (optional, requires `client_key`)
        #[serde(default)]
        client_cert: Option<PathBuf>,
        /// PKCS#8 PEM private key for `client_cert`
        #[serde(default)]
        client_key: Option<PathBuf>,
    },

    /// In-process provider with a fixed zone set (no remote account)
    Memory {
        /// Zones the in-memory account manages
        zones: Vec<String>,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Regru {
                credentials,
                client_cert,
                client_key,
            } => {
                credentials.validate()?;

                match (client_cert, client_key) {
                    (None, None) => Ok(()),
                    (Some(cert), Some(key)) => {
                        if !cert.exists() || !key.exists() {
                            return Err(crate::Error::config(format!(
                                "Client certificate or key not found: {}, {}",
                                cert.display(),
                                key.display()
                            )));
                        }
                        Ok(())
                    }
                    _ => Err(crate::Error::config(
                        "Client certificate and key must be configured together",
                    )),
                }
            }
            ProviderConfig::Memory { zones } => {
                if zones.iter().any(|z| z.trim().is_empty()) {
                    return Err(crate::Error::config("Memory provider zones cannot be empty"));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Regru { .. } => "regru",
            ProviderConfig::Memory { .. } => "memory",
        }
    }
}

fn default_propagation_seconds() -> u64 {
    120
}

fn default_event_channel_capacity() -> usize {
    64
}
