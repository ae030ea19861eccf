// # Reg.ru DNS Provider
//
// This crate provides a Reg.ru DNS provider implementation for the DNS-01
// challenge system.
//
// ## Implementation Status
//
// - ✅ One logical operation per call (zone listing, create, delete)
// - ✅ Full error propagation (the host owns retry policy)
// - ✅ HTTP timeout configured (30 seconds)
// - ✅ Specific error handling for HTTP status codes and Reg.ru error codes
// - ✅ Duplicate-safe create, idempotent delete
// - ✅ Optional TLS client certificate
// - ✅ Dry-run mode for safe testing
// - ❌ NO retry or backoff logic (intentionally omitted)
// - ❌ NO caching (every call re-authenticates and re-reads)
//
// ## Security Requirements
//
// - Password NEVER appears in logs, errors, or Debug output
// - Provider MUST fail fast if credentials are empty
//
// ## API Reference
//
// - Reg.ru API v2: https://www.reg.ru/reseller/api2doc
// - Every call: POST `/<category>/<function>` with form fields
//   `input_format=json` and `input_data=<json>` (credentials included)
// - List domains: `service/get_list` (`servtype=domain`)
// - List records: `zone/get_resource_records`
// - Add TXT: `zone/add_txt`
// - Remove record: `zone/remove_record` (matched by subdomain, type, content)
//
// Reg.ru has no record identifiers; records are addressed by name and
// content. Identifiers reported here are `<subdomain>/TXT/<content>`.

use async_trait::async_trait;
use dns01_core::config::{Credentials, ProviderConfig};
use dns01_core::traits::{CreateResult, DeleteResult, DnsProvider, DnsProviderFactory};
use dns01_core::{Error, Result};
use serde_json::{Value, json};
use std::path::Path;
use std::time::Duration;

/// Reg.ru API base URL
const REGRU_API_BASE: &str = "https://api.reg.ru/api/regru2";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Provider name used in errors and logs
const PROVIDER: &str = "regru";

/// Reg.ru error codes meaning the credentials were rejected
const AUTH_ERROR_CODES: &[&str] = &[
    "NO_AUTH",
    "NO_USERNAME",
    "NO_PASSWORD",
    "INVALID_AUTH",
    "PASSWORD_AUTH_FAILED",
    "ACCESS_DENIED_FROM_IP",
];

/// Reg.ru error codes meaning the zone is not manageable by this account
const ZONE_ERROR_CODES: &[&str] = &[
    "DOMAIN_NOT_FOUND",
    "NO_SUCH_DOMAIN",
    "DOMAIN_IS_NOT_FOUND",
    "INVALID_DOMAIN_NAME_FORMAT",
];

/// Reg.ru DNS provider
///
/// # Trust Level: Untrusted
///
/// This provider is isolated, stateless, and single-shot. Each operation
/// authenticates independently with the credentials it owns.
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all read calls (domain list, record list)
/// - Log the intended mutation
/// - **NOT** actually add or remove records
pub struct RegruProvider {
    /// Reg.ru account credentials
    /// ⚠️ NEVER log the password
    credentials: Credentials,

    /// API base URL without trailing slash
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform reads but skip mutations
    dry_run: bool,
}

// Custom Debug implementation that hides the password
impl std::fmt::Debug for RegruProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegruProvider")
            .field("credentials", &self.credentials)
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl RegruProvider {
    /// Create a new Reg.ru provider
    ///
    /// # Parameters
    ///
    /// - `credentials`: Reg.ru username/password, optional API base URL
    /// - `dry_run`: If true, perform reads but skip mutations
    ///
    /// # Errors
    ///
    /// `Error::Config` if the credentials are incomplete or the HTTP client
    /// cannot be built.
    pub fn new(credentials: Credentials, dry_run: bool) -> Result<Self> {
        Self::build(credentials, reqwest::Client::builder(), dry_run)
    }

    /// Create a new Reg.ru provider authenticating with a TLS client certificate
    ///
    /// # Parameters
    ///
    /// - `cert`: PEM certificate file
    /// - `key`: PKCS#8 PEM private key file
    pub fn with_client_identity(
        credentials: Credentials,
        cert: &Path,
        key: &Path,
        dry_run: bool,
    ) -> Result<Self> {
        let cert_pem = std::fs::read(cert).map_err(|e| {
            Error::config(format!("Cannot read client certificate {}: {}", cert.display(), e))
        })?;
        let key_pem = std::fs::read(key).map_err(|e| {
            Error::config(format!("Cannot read client key {}: {}", key.display(), e))
        })?;

        let identity = reqwest::Identity::from_pkcs8_pem(&cert_pem, &key_pem)
            .map_err(|e| Error::config(format!("Invalid client certificate or key: {}", e)))?;

        Self::build(
            credentials,
            reqwest::Client::builder().identity(identity),
            dry_run,
        )
    }

    fn build(
        credentials: Credentials,
        builder: reqwest::ClientBuilder,
        dry_run: bool,
    ) -> Result<Self> {
        credentials.validate()?;

        let client = builder
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = credentials
            .api_base_url
            .as_deref()
            .unwrap_or(REGRU_API_BASE)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            credentials,
            base_url,
            client,
            dry_run,
        })
    }

    /// Whether mutations are skipped
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Call a Reg.ru API function
    ///
    /// `params` are merged into `input_data` together with the credentials.
    /// Returns the `answer` object of a successful response.
    ///
    /// # API Call
    ///
    /// ```http
    /// POST /zone/add_txt
    /// Content-Type: application/x-www-form-urlencoded
    ///
    /// input_format=json&input_data={"username":...,"password":...,...}
    /// ```
    async fn call(&self, function: &str, params: Value) -> Result<Value> {
        let mut input = json!({
            "username": self.credentials.account_id,
            "password": self.credentials.api_key,
            "output_content_type": "json",
        });
        if let (Some(input), Value::Object(params)) = (input.as_object_mut(), params) {
            input.extend(params);
        }

        let url = format!("{}/{}", self.base_url, function);
        tracing::debug!("Calling Reg.ru API function {}", function);

        let input_data = serde_json::to_string(&input)?;
        let response = self
            .client
            .post(&url)
            .form(&[("input_format", "json"), ("input_data", input_data.as_str())])
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("HTTP request failed: {}", e.without_url())))?;

        // Handle specific HTTP status codes
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            return match status.as_u16() {
                401 | 403 => Err(Error::auth(format!(
                    "Reg.ru rejected the credentials. Status: {}",
                    status
                ))),
                429 => Err(Error::provider(
                    PROVIDER,
                    format!("Rate limit exceeded. Please retry later. Status: {}", status),
                )),
                500..=599 => Err(Error::provider(
                    PROVIDER,
                    format!("Reg.ru server error (transient): {} - {}", status, error_text),
                )),
                _ => Err(Error::provider(
                    PROVIDER,
                    format!("{} failed: {} - {}", function, status, error_text),
                )),
            };
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("Failed to parse response: {}", e)))?;

        if json["result"].as_str() != Some("success") {
            return Err(classify_error(&json, function));
        }

        // Domain-scoped functions report per-domain results
        if let Some(domains) = json["answer"]["domains"].as_array() {
            for domain in domains {
                if let Some(result) = domain["result"].as_str()
                    && result != "success"
                {
                    return Err(classify_error(domain, function));
                }
            }
        }

        Ok(json["answer"].clone())
    }

    /// Fetch the TXT records of a zone as `(subdomain, content)` pairs
    ///
    /// # API Call
    ///
    /// ```http
    /// POST /zone/get_resource_records
    /// input_data={"domains":[{"dname":"example.com"}],...}
    /// ```
    async fn get_txt_records(&self, zone: &str) -> Result<Vec<(String, String)>> {
        let answer = self
            .call(
                "zone/get_resource_records",
                json!({ "domains": [{ "dname": zone }] }),
            )
            .await?;

        let domain = answer["domains"]
            .as_array()
            .and_then(|domains| {
                domains.iter().find(|d| {
                    d["dname"]
                        .as_str()
                        .is_some_and(|n| n.trim_end_matches('.').eq_ignore_ascii_case(zone))
                })
            })
            .ok_or_else(|| Error::zone_not_found(format!("Zone not found: {}", zone)))?;

        let rrs = domain["rrs"].as_array().map(Vec::as_slice).unwrap_or(&[]);

        Ok(rrs
            .iter()
            .filter(|rr| rr["rectype"].as_str().is_some_and(|t| t.eq_ignore_ascii_case("TXT")))
            .filter_map(|rr| {
                let subname = rr["subname"].as_str()?;
                let content = rr["content"].as_str()?;
                Some((subname.to_ascii_lowercase(), unquote(content).to_string()))
            })
            .collect())
    }

    async fn has_txt_record(&self, zone: &str, subdomain: &str, value: &str) -> Result<bool> {
        let records = self.get_txt_records(zone).await?;
        let subdomain = subdomain.to_ascii_lowercase();
        Ok(records
            .iter()
            .any(|(name, content)| *name == subdomain && content == value))
    }
}

#[async_trait]
impl DnsProvider for RegruProvider {
    /// List domains on the account
    ///
    /// # API Call
    ///
    /// ```http
    /// POST /service/get_list
    /// input_data={"servtype":"domain",...}
    /// ```
    async fn list_zones(&self) -> Result<Vec<String>> {
        let answer = self
            .call("service/get_list", json!({ "servtype": "domain" }))
            .await?;

        let services = answer["services"].as_array().ok_or_else(|| {
            Error::provider(PROVIDER, "Invalid response format: services is not an array")
        })?;

        let zones: Vec<String> = services
            .iter()
            .filter_map(|service| service["dname"].as_str())
            .map(|name| name.trim_end_matches('.').to_ascii_lowercase())
            .collect();

        tracing::debug!("Reg.ru account manages {} domain(s)", zones.len());
        Ok(zones)
    }

    /// Add a TXT record unless an identical one exists
    ///
    /// Makes one read call, then one `zone/add_txt` call if needed
    /// (skipped in dry-run mode).
    async fn create_txt_record(
        &self,
        zone: &str,
        subdomain: &str,
        value: &str,
    ) -> Result<CreateResult> {
        let record_id = record_id(subdomain, value);

        if self.has_txt_record(zone, subdomain, value).await? {
            tracing::info!(
                "Reg.ru TXT record {}.{} already holds this value",
                subdomain,
                zone
            );
            return Ok(CreateResult::AlreadyPresent { record_id });
        }

        tracing::info!(
            "{} Reg.ru TXT record {}.{} [mode: {}]",
            if self.dry_run { "Would add" } else { "Adding" },
            subdomain,
            zone,
            if self.dry_run { "DRY-RUN" } else { "LIVE" }
        );

        if self.dry_run {
            tracing::info!("[DRY-RUN] Skipping zone/add_txt for {}.{}", subdomain, zone);
            return Ok(CreateResult::Created { record_id });
        }

        self.call(
            "zone/add_txt",
            json!({
                "domains": [{ "dname": zone }],
                "subdomain": subdomain,
                "text": value,
            }),
        )
        .await?;

        tracing::debug!("Successfully added TXT record {}.{}", subdomain, zone);
        Ok(CreateResult::Created { record_id })
    }

    /// Remove the TXT record matching name and value, if present
    ///
    /// Matching on content keeps concurrent challenges for the same name
    /// (e.g. `example.com` and `*.example.com`) intact.
    async fn delete_txt_record(
        &self,
        zone: &str,
        subdomain: &str,
        value: &str,
    ) -> Result<DeleteResult> {
        if !self.has_txt_record(zone, subdomain, value).await? {
            tracing::debug!("Reg.ru TXT record {}.{} already absent", subdomain, zone);
            return Ok(DeleteResult::Absent);
        }

        if self.dry_run {
            tracing::info!("[DRY-RUN] Skipping zone/remove_record for {}.{}", subdomain, zone);
            return Ok(DeleteResult::Deleted);
        }

        self.call(
            "zone/remove_record",
            json!({
                "domains": [{ "dname": zone }],
                "subdomain": subdomain,
                "record_type": "TXT",
                "content": value,
            }),
        )
        .await?;

        tracing::debug!("Successfully deleted TXT record {}.{}", subdomain, zone);
        Ok(DeleteResult::Deleted)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Map a Reg.ru error object (`error_code`, `error_text`) to an Error
fn classify_error(body: &Value, function: &str) -> Error {
    let code = body["error_code"].as_str().unwrap_or("UNKNOWN");
    let text = body["error_text"].as_str().unwrap_or("no error text");

    if AUTH_ERROR_CODES.contains(&code) {
        Error::auth(format!("Reg.ru: {} ({})", text, code))
    } else if ZONE_ERROR_CODES.contains(&code) {
        Error::zone_not_found(format!("Reg.ru: {} ({})", text, code))
    } else {
        Error::provider(PROVIDER, format!("{} failed: {} ({})", function, text, code))
    }
}

fn record_id(subdomain: &str, value: &str) -> String {
    format!("{}/TXT/{}", subdomain, value)
}

fn unquote(content: &str) -> &str {
    content
        .strip_prefix('"')
        .and_then(|c| c.strip_suffix('"'))
        .unwrap_or(content)
}

/// Factory for creating Reg.ru providers
pub struct RegruFactory;

impl DnsProviderFactory for RegruFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::Regru {
                credentials,
                client_cert,
                client_key,
            } => {
                // Check for dry-run mode environment variable
                let dry_run = std::env::var("DNS01_MODE")
                    .unwrap_or_default()
                    .eq_ignore_ascii_case("dry-run");

                if dry_run {
                    tracing::warn!("Reg.ru provider running in DRY-RUN mode - no changes will be made");
                }

                let provider = match (client_cert, client_key) {
                    (Some(cert), Some(key)) => RegruProvider::with_client_identity(
                        credentials.clone(),
                        cert,
                        key,
                        dry_run,
                    )?,
                    (None, None) => RegruProvider::new(credentials.clone(), dry_run)?,
                    _ => {
                        return Err(Error::config(
                            "Client certificate and key must be configured together",
                        ));
                    }
                };

                Ok(Box::new(provider))
            }
            _ => Err(Error::config("Invalid config for Reg.ru provider")),
        }
    }
}
