// # ddnsd - Route53 Dynamic DNS Daemon
//
// Thin integration layer: all decision logic lives in ddns-core.
//
// The ddnsd daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Wiring the HTTP IP source, DNS reader and Route53 provider
// 4. Running the scheduler once or until SIGTERM/SIGINT
//
// ## Configuration
//
// ### Required
// - `R53_HOSTED_ZONE_ID`: Route53 hosted zone receiving the upserts
// - `DNS_NAME`: Comma-separated hostnames to keep in sync (`*.` prefix allowed)
//
// ### Optional
// - `PUBLIC_IP_URL`: Public-IP endpoint (default: http://checkip.amazonaws.com)
// - `TTL_SECONDS`: Record TTL (default: 300)
// - `KEEP_CONTAINER_ALIVE`: `true` repeats forever, anything else runs once (default: true)
// - `DDNS_UPSERT_WILDCARD`: Also upsert `*.<name>` (default: false)
// - `DDNS_INTERVAL_SECS`: Seconds between cycles (default: TTL_SECONDS)
// - `DDNS_NAMESERVERS`: Comma-separated resolver IPs (default: system resolver)
// - `DDNS_CHANGE_COMMENT`: Change batch comment
// - `DDNS_MODE`: `live` or `dry-run` (default: live)
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// AWS credentials and region come from the standard AWS environment,
// profile or instance role.
//
// ## Example
//
// ```bash
// export R53_HOSTED_ZONE_ID=Z0123456789ABCDEFGHIJ
// export DNS_NAME=home.example.com,*.lab.example.com
// export TTL_SECONDS=60
//
// ddnsd
// ```

use anyhow::{Context, Result};
use ddns_core::config::{DEFAULT_CHANGE_COMMENT, DEFAULT_PUBLIC_IP_URL, DEFAULT_TTL_SECONDS};
use ddns_core::{DdnsConfig, Reconciler, Scheduler, SchedulerEvent};
use ddns_ip_http::HttpIpSource;
use ddns_provider_route53::Route53Provider;
use ddns_resolver_dns::{DnsRecordReader, ResolverSettings};
use std::env;
use std::net::IpAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown (or single pass finished)
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    hosted_zone_id: String,
    dns_names: Vec<String>,
    public_ip_url: String,
    ttl_seconds: u32,
    keep_alive: bool,
    upsert_wildcard: bool,
    interval_secs: Option<u64>,
    nameservers: Vec<String>,
    change_comment: String,
    mode: String,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup` (a variable name to value map)
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let hosted_zone_id = lookup("R53_HOSTED_ZONE_ID")
            .filter(|v| !v.trim().is_empty())
            .context(
                "Route53's Hosted Zone ID should be set to env var R53_HOSTED_ZONE_ID",
            )?;

        let dns_names = split_list(
            &lookup("DNS_NAME")
                .context("The DNS name to update A records for should be set to env var DNS_NAME")?,
        );

        let ttl_seconds = match lookup("TTL_SECONDS") {
            Some(v) => v
                .trim()
                .parse::<u32>()
                .with_context(|| format!("TTL_SECONDS must be a positive integer. Got: {}", v))?,
            None => DEFAULT_TTL_SECONDS,
        };

        let interval_secs = lookup("DDNS_INTERVAL_SECS")
            .map(|v| {
                v.trim().parse::<u64>().with_context(|| {
                    format!("DDNS_INTERVAL_SECS must be a positive integer. Got: {}", v)
                })
            })
            .transpose()?;

        Ok(Self {
            hosted_zone_id: hosted_zone_id.trim().to_string(),
            dns_names,
            public_ip_url: lookup("PUBLIC_IP_URL")
                .unwrap_or_else(|| DEFAULT_PUBLIC_IP_URL.to_string()),
            ttl_seconds,
            keep_alive: lookup("KEEP_CONTAINER_ALIVE")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(true),
            upsert_wildcard: lookup("DDNS_UPSERT_WILDCARD")
                .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
                .unwrap_or(false),
            interval_secs,
            nameservers: lookup("DDNS_NAMESERVERS")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            change_comment: lookup("DDNS_CHANGE_COMMENT")
                .unwrap_or_else(|| DEFAULT_CHANGE_COMMENT.to_string()),
            mode: lookup("DDNS_MODE").unwrap_or_else(|| "live".to_string()),
            log_level: lookup("DDNS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// Checks names, URL scheme, numeric ranges, nameserver addresses,
    /// mode and log level. Nothing runs if any check fails.
    fn validate(&self) -> Result<()> {
        if self.dns_names.is_empty() {
            anyhow::bail!(
                "DNS_NAME must contain at least one hostname. \
                Set it via: export DNS_NAME=home.example.com"
            );
        }

        for name in &self.dns_names {
            validate_domain_name(name)?;
        }

        if !self.public_ip_url.starts_with("https://") && !self.public_ip_url.starts_with("http://")
        {
            anyhow::bail!(
                "PUBLIC_IP_URL must use HTTP or HTTPS scheme. Got: {}",
                self.public_ip_url
            );
        }

        if self.ttl_seconds == 0 {
            anyhow::bail!("TTL_SECONDS must be at least 1");
        }

        if self.interval_secs == Some(0) {
            anyhow::bail!("DDNS_INTERVAL_SECS must be at least 1");
        }

        self.nameserver_addrs()?;

        match self.mode.to_lowercase().as_str() {
            "live" | "dry-run" => {}
            _ => anyhow::bail!(
                "DDNS_MODE '{}' is not valid. Valid modes: live, dry-run",
                self.mode
            ),
        }

        parse_log_level(&self.log_level)?;

        self.ddns_config().validate()?;

        Ok(())
    }

    fn nameserver_addrs(&self) -> Result<Vec<IpAddr>> {
        self.nameservers
            .iter()
            .map(|ns| {
                ns.parse::<IpAddr>().with_context(|| {
                    format!("DDNS_NAMESERVERS entry is not an IP address: '{}'", ns)
                })
            })
            .collect()
    }

    fn dry_run(&self) -> bool {
        self.mode.eq_ignore_ascii_case("dry-run")
    }

    /// Core configuration handed to the scheduler
    fn ddns_config(&self) -> DdnsConfig {
        let mut config = DdnsConfig::new(self.hosted_zone_id.clone(), self.dns_names.clone());
        config.public_ip_url = self.public_ip_url.clone();
        config.ttl_seconds = self.ttl_seconds;
        config.keep_alive = self.keep_alive;
        config.upsert_wildcard = self.upsert_wildcard;
        config.interval_secs = self.interval_secs;
        config.change_comment = self.change_comment.clone();
        config
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "DDNS_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

/// Validate that a string is a valid domain name
///
/// Basic RFC 1035 checks. A single leading `*` label is accepted for
/// wildcard records, and one trailing dot is tolerated.
fn validate_domain_name(domain: &str) -> Result<()> {
    let domain = domain.strip_suffix('.').unwrap_or(domain);

    if domain.is_empty() {
        anyhow::bail!("Domain name cannot be empty");
    }

    // RFC 1035: 253 chars max
    if domain.len() > 253 {
        anyhow::bail!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        );
    }

    let labels = domain.strip_prefix("*.").unwrap_or(domain);
    if labels == "*" || labels.is_empty() {
        anyhow::bail!("Wildcard name needs a parent domain. Got: '{}'", domain);
    }

    for label in labels.split('.') {
        if label.is_empty() {
            anyhow::bail!("Domain name has empty label: '{}'", domain);
        }

        if label.len() > 63 {
            anyhow::bail!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            );
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            anyhow::bail!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric and hyphen only ('*' as the first label).",
                label
            );
        }

        if label.starts_with('-') || label.ends_with('-') {
            anyhow::bail!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            );
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let log_level = parse_log_level(&config.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!("Starting ddnsd daemon");
    info!(
        zone = %config.hosted_zone_id,
        names = ?config.dns_names,
        ttl = config.ttl_seconds,
        keep_alive = config.keep_alive,
        mode = %config.mode,
        "Configuration loaded: {} hostname(s)",
        config.dns_names.len()
    );

    if config.public_ip_url.starts_with("http://") {
        debug!(url = %config.public_ip_url, "Public IP endpoint uses plain HTTP");
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {:#}", e);
            DdnsExitCode::RuntimeError
        } else {
            DdnsExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Wire the components and run the scheduler
async fn run_daemon(config: Config) -> Result<()> {
    let ip_source = HttpIpSource::new().context("Failed to create HTTP IP source")?;

    let reader = DnsRecordReader::with_settings(ResolverSettings {
        nameservers: config.nameserver_addrs()?,
        ..ResolverSettings::default()
    })
    .context("Failed to create DNS resolver")?;

    let provider = Route53Provider::from_env(config.dry_run()).await;

    let reconciler = Reconciler::new(Arc::new(ip_source), Arc::new(reader), Arc::new(provider))
        .with_change_comment(config.change_comment.clone());
    debug!(reconciler = ?reconciler, "Reconciler ready");

    let ddns_config = config.ddns_config();
    let (scheduler, events) = Scheduler::from_config(Arc::new(reconciler), &ddns_config)
        .context("Failed to create scheduler")?;

    tokio::spawn(log_events(events));

    if !ddns_config.keep_alive {
        info!("Running a single pass");
        scheduler.run_with_shutdown(None).await?;
        info!("Single pass finished");
        return Ok(());
    }

    let shutdown_rx = spawn_shutdown_listener()?;
    scheduler.run_with_shutdown(Some(shutdown_rx)).await?;

    info!("Shutting down daemon");
    Ok(())
}

/// Surface scheduler events at debug level
async fn log_events(mut events: mpsc::Receiver<SchedulerEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            SchedulerEvent::Started { targets_count } => {
                debug!(targets = targets_count, "Scheduler started");
            }
            SchedulerEvent::CycleCompleted { hostname, outcome } => {
                if outcome.is_skipped() {
                    warn!(hostname = %hostname, outcome = outcome.label(), "Cycle skipped");
                } else {
                    debug!(hostname = %hostname, outcome = outcome.label(), "Cycle completed");
                }
            }
            SchedulerEvent::Stopped { reason } => {
                debug!(reason = %reason, "Scheduler stopped");
            }
        }
    }
}

/// Install SIGTERM/SIGINT handlers and fire the returned receiver on either
///
/// Handlers are registered before returning so a setup failure aborts startup.
#[cfg(unix)]
fn spawn_shutdown_listener() -> Result<oneshot::Receiver<()>> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        info!("Received shutdown signal: {}", name);
        let _ = tx.send(());
    });

    Ok(rx)
}

/// Fallback for non-Unix platforms (CTRL-C only)
#[cfg(not(unix))]
fn spawn_shutdown_listener() -> Result<oneshot::Receiver<()>> {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal: CTRL-C");
                let _ = tx.send(());
            }
            Err(e) => {
                error!("Failed to wait for CTRL-C: {}", e);
                // Dropping the sender would stop the scheduler.
                let _tx = tx;
                std::future::pending::<()>().await;
            }
        }
    });
    Ok(rx)
}
