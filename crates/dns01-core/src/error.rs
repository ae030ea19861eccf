//! Error types for the DNS-01 challenge system
//!
//! Three kinds of failure matter to a challenge host:
//!
//! - [`Error::Authentication`]: bad credentials, fatal, fix the configuration
//! - [`Error::ZoneNotFound`]: the account manages no zone covering the domain, fatal
//! - [`Error::Provider`]: transport failures, unexpected responses, rate limiting;
//!   possibly transient, but never retried here
//!
//! The remaining variants cover local problems (configuration, malformed input).

use thiserror::Error;

/// Result type alias for DNS-01 operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DNS-01 challenge system
#[derive(Error, Debug)]
pub enum Error {
    /// The provider rejected the account credentials
    #[error("Credentials rejected: {0}")]
    Authentication(String),

    /// No managed zone is a suffix of the requested domain
    #[error("Zone not found: {0}")]
    ZoneNotFound(String),

    /// The provider call failed for any other reason
    #[error("{provider} API error: {message}")]
    Provider {
        /// Which provider failed (`regru`, `memory`, ...)
        provider: String,
        message: String,
    },

    /// Local configuration is incomplete or inconsistent
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Malformed domain or token handed over by the host
    #[error("Invalid challenge input: {0}")]
    InvalidInput(String),

    /// Building a request payload failed
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a "zone not found" error
    pub fn zone_not_found(msg: impl Into<String>) -> Self {
        Self::ZoneNotFound(msg.into())
    }

    /// Provider failure tagged with the provider name
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether a later attempt could succeed without changing configuration.
    ///
    /// Only provider errors qualify. Nothing in this crate acts on it; the
    /// host (or a wrapping layer) owns retry policy.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Provider { .. })
    }
}

// Host code built on anyhow can hand its errors back through provider impls
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
