// # dns01-hook - Certbot DNS-01 hook
//
// CRITICAL RULES:
// - This is a THIN integration layer ONLY
// - DO NOT add DNS logic, zone logic, or retry logic here
// - All challenge logic MUST be in dns01-core
// - Secrets are read from environment variables ONLY (never flags)
//
// The hook is responsible for:
// 1. Reading configuration from flags and environment variables
// 2. Constructing the provider and the ChallengeManager
// 3. Running one fulfill (auth) or retract (cleanup) and exiting
//
// ## Configuration
//
// ### Challenge (set by certbot)
// - `CERTBOT_DOMAIN`: Domain being validated
// - `CERTBOT_VALIDATION`: Validation token
//
// ### DNS Provider
// - `DNS01_PROVIDER_TYPE`: Provider type (regru, memory)
// - `DNS01_ACCOUNT_ID` / `REGRU_USERNAME`: Account username
// - `DNS01_API_KEY` / `REGRU_PASSWORD`: Account password
// - `DNS01_API_BASE_URL`: API base URL override (optional)
// - `DNS01_CLIENT_CERT`, `DNS01_CLIENT_KEY`: TLS client identity (optional)
// - `DNS01_MEMORY_ZONES`: Comma-separated zones (memory provider)
// - `DNS01_MODE=dry-run`: Skip mutations at the provider
//
// ### Challenge behavior
// - `DNS01_PROPAGATION_SECONDS`: Wait after publishing (default 120)
// - `DNS01_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export REGRU_USERNAME=user
// export REGRU_PASSWORD=secret
//
// certbot certonly --manual --preferred-challenges dns \
//   --manual-auth-hook "dns01-hook auth" \
//   --manual-cleanup-hook "dns01-hook cleanup" \
//   -d example.com -d '*.example.com'
// ```

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand};
use dns01_core::config::{ChallengeConfig, Credentials, ProviderConfig};
use dns01_core::provider::MemoryProviderFactory;
use dns01_core::{ChallengeManager, DnsProvider, DnsProviderFactory, RetractOutcome};
use std::env;
use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Challenge step completed
/// - 1: Configuration or startup error
/// - 2: Challenge step failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HookExitCode {
    /// Challenge step completed
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Provider or resolution failure
    ChallengeFailed = 2,
}

impl From<HookExitCode> for ExitCode {
    fn from(code: HookExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Certbot manual hook publishing DNS-01 challenge records
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// DNS provider type (regru, memory)
    #[arg(long, env = "DNS01_PROVIDER_TYPE", default_value = "regru", global = true)]
    provider: String,

    /// Provider account identifier (falls back to REGRU_USERNAME)
    #[arg(long, env = "DNS01_ACCOUNT_ID", global = true)]
    account_id: Option<String>,

    /// Provider API secret (environment only; falls back to REGRU_PASSWORD)
    #[arg(skip)]
    api_key: Option<String>,

    /// Provider API base URL override
    #[arg(long, env = "DNS01_API_BASE_URL", global = true)]
    api_base_url: Option<String>,

    /// PEM client certificate for the provider API
    #[arg(long, env = "DNS01_CLIENT_CERT", global = true)]
    client_cert: Option<PathBuf>,

    /// PKCS#8 PEM key for the client certificate
    #[arg(long, env = "DNS01_CLIENT_KEY", global = true)]
    client_key: Option<PathBuf>,

    /// Zones managed by the memory provider
    #[arg(long, env = "DNS01_MEMORY_ZONES", value_delimiter = ',', global = true)]
    memory_zones: Vec<String>,

    /// Seconds to wait after publishing the record
    #[arg(long, env = "DNS01_PROPAGATION_SECONDS", default_value_t = 120, global = true)]
    propagation_seconds: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "DNS01_LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Publish the challenge record and wait for propagation (--manual-auth-hook)
    Auth(ChallengeArgs),

    /// Remove the challenge record (--manual-cleanup-hook)
    Cleanup {
        #[command(flatten)]
        challenge: ChallengeArgs,

        /// Exit non-zero when cleanup fails
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Debug, Args)]
struct ChallengeArgs {
    /// Domain being validated
    #[arg(long, env = "CERTBOT_DOMAIN")]
    domain: String,

    /// Validation token to publish
    #[arg(long, env = "CERTBOT_VALIDATION")]
    validation: String,
}

impl Cli {
    /// Fill in values that only come from the environment
    fn with_env_fallbacks(mut self) -> Self {
        if self.account_id.is_none() {
            self.account_id = env::var("REGRU_USERNAME").ok();
        }
        self.api_key = env::var("DNS01_API_KEY")
            .or_else(|_| env::var("REGRU_PASSWORD"))
            .ok();
        self
    }

    /// Build the challenge configuration
    fn challenge_config(&self) -> Result<ChallengeConfig> {
        let provider = match self.provider.as_str() {
            "regru" => {
                let account_id = self.account_id.clone().unwrap_or_default();
                let api_key = self.api_key.clone().unwrap_or_default();
                if account_id.is_empty() || api_key.is_empty() {
                    anyhow::bail!(
                        "Reg.ru credentials are required. \
                        Set them via: export REGRU_USERNAME=... REGRU_PASSWORD=..."
                    );
                }

                let mut credentials = Credentials::new(account_id, api_key);
                if let Some(ref url) = self.api_base_url {
                    credentials = credentials.with_api_base_url(url.clone());
                }

                ProviderConfig::Regru {
                    credentials,
                    client_cert: self.client_cert.clone(),
                    client_key: self.client_key.clone(),
                }
            }
            "memory" => ProviderConfig::Memory {
                zones: self
                    .memory_zones
                    .iter()
                    .map(|z| z.trim().to_string())
                    .filter(|z| !z.is_empty())
                    .collect(),
            },
            other => anyhow::bail!(
                "DNS01_PROVIDER_TYPE '{}' is not supported. \
                Supported providers: regru, memory",
                other
            ),
        };

        let config = ChallengeConfig::new(provider).with_propagation_seconds(self.propagation_seconds);
        config.validate()?;
        Ok(config)
    }

    /// Parse the configured log level
    fn log_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "DNS01_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }
}

/// Construct the provider named by the configuration
fn create_provider(config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
    let provider = match config {
        ProviderConfig::Memory { .. } => MemoryProviderFactory.create(config)?,
        #[cfg(feature = "regru")]
        ProviderConfig::Regru { .. } => dns01_provider_regru::RegruFactory.create(config)?,
        #[cfg(not(feature = "regru"))]
        ProviderConfig::Regru { .. } => {
            anyhow::bail!("Reg.ru support was not compiled in (enable the `regru` feature)")
        }
    };
    Ok(provider)
}

/// Parse arguments; clap's own usage errors count as configuration errors
fn parse_args<I, T>(args: I) -> std::result::Result<Cli, HookExitCode>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::try_parse_from(args).map_err(|e| {
        let _ = e.print();
        match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => HookExitCode::Success,
            _ => HookExitCode::ConfigError,
        }
    })
}

fn main() -> ExitCode {
    let cli = match parse_args(env::args_os()) {
        Ok(cli) => cli.with_env_fallbacks(),
        Err(code) => return code.into(),
    };

    let log_level = match cli.log_level() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return HookExitCode::ConfigError.into();
        }
    };

    // stdout belongs to certbot; log to stderr
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        // certbot captures stderr into its log
        .with_ansi(std::io::stderr().is_terminal())
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return HookExitCode::ConfigError.into();
    }

    let config = match cli.challenge_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            return HookExitCode::ConfigError.into();
        }
    };

    let provider = match create_provider(&config.provider) {
        Ok(provider) => provider,
        Err(e) => {
            error!("Failed to create provider: {}", e);
            return HookExitCode::ConfigError.into();
        }
    };

    // One challenge step per process; a single-threaded runtime is enough
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return HookExitCode::ConfigError.into();
        }
    };

    rt.block_on(run_hook(cli.command, provider, config)).into()
}

/// Run one challenge step
async fn run_hook(
    command: Command,
    provider: Box<dyn DnsProvider>,
    config: ChallengeConfig,
) -> HookExitCode {
    let (manager, mut events) = match ChallengeManager::new(provider, config) {
        Ok(pair) => pair,
        Err(e) => {
            error!("Configuration error: {}", e);
            return HookExitCode::ConfigError;
        }
    };

    info!("Using {} provider", manager.provider_name());

    let code = match command {
        Command::Auth(challenge) => {
            match manager.fulfill(&challenge.domain, &challenge.validation).await {
                Ok(record) => {
                    info!("Challenge record {} is in place", record.record_name);
                    HookExitCode::Success
                }
                Err(e) => {
                    error!("Failed to publish challenge for {}: {}", challenge.domain, e);
                    HookExitCode::ChallengeFailed
                }
            }
        }
        Command::Cleanup { challenge, strict } => {
            match manager.retract(&challenge.domain, &challenge.validation).await {
                Ok(RetractOutcome::Deleted) => {
                    info!("Challenge record for {} removed", challenge.domain);
                    HookExitCode::Success
                }
                Ok(RetractOutcome::AlreadyAbsent) => {
                    info!("No challenge record for {} to remove", challenge.domain);
                    HookExitCode::Success
                }
                Err(e) => {
                    // The record may be left behind; remove it by hand
                    error!(
                        "Failed to remove challenge record for {}: {}",
                        challenge.domain, e
                    );
                    if strict {
                        HookExitCode::ChallengeFailed
                    } else {
                        warn!("Ignoring cleanup failure (use --strict to fail)");
                        HookExitCode::Success
                    }
                }
            }
        }
    };

    while let Ok(event) = events.try_recv() {
        debug!("Challenge event: {:?}", event);
    }

    code
}
