//! Zone resolution
//!
//! Maps a challenge domain to the zone the provider account manages and the
//! record name to publish at.
//!
//! ## Algorithm
//!
//! ```text
//! a.b.example.com      candidates, longest first:
//!                        a.b.example.com
//!                        b.example.com
//!                        example.com     <- first managed zone wins
//!                        com
//! ```
//!
//! Providers manage zones at arbitrary depth, so public-suffix boundaries
//! are not assumed. The outcome depends only on the normalized domain and the
//! account's zone list: `fulfill` and `retract` run in separate invocations
//! and must land on the same `(zone, subdomain)` pair.

use crate::error::{Error, Result};
use crate::traits::DnsProvider;
use tracing::debug;

/// Label prefixed to the domain to form the challenge record name
pub const CHALLENGE_LABEL: &str = "_acme-challenge";

/// Maximum length of a domain name (RFC 1035)
const MAX_DOMAIN_LEN: usize = 253;

/// Maximum length of a single label (RFC 1035)
const MAX_LABEL_LEN: usize = 63;

/// Where a challenge record lives
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChallengeTarget {
    /// Normalized domain being validated (e.g. `a.b.example.com`)
    pub domain: String,
    /// Managed zone the record is created in (e.g. `example.com`)
    pub zone: String,
    /// Record name relative to `zone` (e.g. `_acme-challenge.a.b`)
    pub subdomain: String,
    /// Fully-qualified record name (e.g. `_acme-challenge.a.b.example.com`)
    pub record_name: String,
}

/// Normalize a challenge domain
///
/// Accepts what challenge hosts hand over in practice: surrounding
/// whitespace, a trailing root dot, a wildcard's `*.` prefix, mixed case, or
/// the full validation name (`_acme-challenge.<domain>`) instead of the
/// domain itself. All of them normalize to the same lowercase base domain.
pub fn normalize_domain(input: &str) -> Result<String> {
    let mut domain = input.trim().trim_end_matches('.').to_ascii_lowercase();

    if let Some(rest) = domain.strip_prefix("*.") {
        domain = rest.to_string();
    }
    if let Some(rest) = domain
        .strip_prefix(CHALLENGE_LABEL)
        .and_then(|rest| rest.strip_prefix('.'))
    {
        domain = rest.to_string();
    }

    validate_domain(&domain)?;
    Ok(domain)
}

fn validate_domain(domain: &str) -> Result<()> {
    if domain.is_empty() {
        return Err(Error::invalid_input("Domain name cannot be empty"));
    }

    // Room for the challenge label in front
    if domain.len() + CHALLENGE_LABEL.len() + 1 > MAX_DOMAIN_LEN {
        return Err(Error::invalid_input(format!(
            "Domain name too long for a challenge record: {} chars. Got: {}",
            domain.len(),
            domain
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(Error::invalid_input(format!(
                "Domain name has empty label: '{}'",
                domain
            )));
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(Error::invalid_input(format!(
                "Domain label too long: {} chars (max {}). Label: '{}'",
                label.len(),
                MAX_LABEL_LEN,
                label
            )));
        }
        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(Error::invalid_input(format!(
                "Domain label contains invalid characters. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}

/// Zone candidates for a normalized domain, longest first
///
/// Each step strips the leftmost label; the last candidate is the final label.
pub fn candidate_zones(domain: &str) -> impl Iterator<Item = &str> {
    std::iter::successors(Some(domain), |&current| {
        current.split_once('.').map(|(_, rest)| rest)
    })
    .filter(|candidate| !candidate.is_empty())
}

/// Select the zone and record name for `fqdn` from a known zone list
///
/// This is the pure core of [`resolve`]; zone names are compared
/// case-insensitively and without trailing dots.
pub fn resolve_in<S: AsRef<str>>(zones: &[S], fqdn: &str) -> Result<ChallengeTarget> {
    let domain = normalize_domain(fqdn)?;

    let managed: Vec<String> = zones
        .iter()
        .map(|z| z.as_ref().trim().trim_end_matches('.').to_ascii_lowercase())
        .collect();

    let zone = candidate_zones(&domain)
        .find(|candidate| managed.iter().any(|z| z == candidate))
        .ok_or_else(|| {
            Error::zone_not_found(format!("No managed zone is a suffix of {}", domain))
        })?;

    let subdomain = if zone == domain {
        CHALLENGE_LABEL.to_string()
    } else {
        let relative = &domain[..domain.len() - zone.len() - 1];
        format!("{}.{}", CHALLENGE_LABEL, relative)
    };

    let record_name = format!("{}.{}", CHALLENGE_LABEL, domain);
    let zone = zone.to_string();

    Ok(ChallengeTarget {
        domain,
        zone,
        subdomain,
        record_name,
    })
}

/// Resolve the challenge target for `fqdn` against the provider's zones
///
/// Fetches the zone list once per call. Nothing is cached between calls.
pub async fn resolve(provider: &dyn DnsProvider, fqdn: &str) -> Result<ChallengeTarget> {
    // Reject malformed input before any network call
    normalize_domain(fqdn)?;

    let zones = provider.list_zones().await?;
    debug!(
        "Provider {} manages {} zone(s)",
        provider.provider_name(),
        zones.len()
    );

    let target = resolve_in(&zones, fqdn)?;
    debug!(
        "Resolved {} -> zone {} subdomain {}",
        fqdn, target.zone, target.subdomain
    );
    Ok(target)
}
