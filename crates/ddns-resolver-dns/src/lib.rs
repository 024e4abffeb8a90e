// # DNS Published Record Reader
//
// Reads the IPv4 address currently published for a hostname by resolving
// it through an ordinary (non-authoritative) DNS resolver.
//
// ## Semantics
//
// - The first IPv4 address in the answer wins
// - NXDOMAIN and empty answers mean the record does not exist yet
// - Every other failure is reported as an error; the reconciler treats
//   it as "unknown" and writes anyway
// - The resolver cache is disabled so each cycle sees the live answer

use async_trait::async_trait;
use ddns_core::traits::PublishedRecordReader;
use ddns_core::{Error, Result};
use hickory_resolver::config::{
    LookupIpStrategy, NameServerConfig, ResolverConfig, ResolverOpts,
};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::xfer::Protocol;
use hickory_resolver::{Resolver, TokioResolver};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default per-query timeout (5 seconds)
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Default nameserver port
pub const DEFAULT_DNS_PORT: u16 = 53;

/// Resolver settings
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Nameservers to query (empty = system resolver)
    pub nameservers: Vec<IpAddr>,
    /// UDP port used for `nameservers`
    pub port: u16,
    /// Per-query timeout
    pub timeout: Duration,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            nameservers: Vec::new(),
            port: DEFAULT_DNS_PORT,
            timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }
}

/// Published record reader backed by DNS resolution
#[derive(Debug)]
pub struct DnsRecordReader {
    settings: ResolverSettings,
    resolver: TokioResolver,
}

impl DnsRecordReader {
    /// Create a reader using the system resolver
    pub fn new() -> Result<Self> {
        Self::with_settings(ResolverSettings::default())
    }

    /// Create a reader with custom settings
    pub fn with_settings(settings: ResolverSettings) -> Result<Self> {
        let resolver = Self::create_resolver(&settings)?;
        Ok(Self { settings, resolver })
    }

    /// Settings this reader was built with
    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    fn create_resolver(settings: &ResolverSettings) -> Result<TokioResolver> {
        if settings.timeout.is_zero() {
            return Err(Error::config("DNS query timeout must be > 0"));
        }

        let mut opts = ResolverOpts::default();
        opts.timeout = settings.timeout;
        opts.attempts = 1;
        opts.cache_size = 0;
        opts.ip_strategy = LookupIpStrategy::Ipv4Only;

        let builder = if settings.nameservers.is_empty() {
            match TokioResolver::builder_tokio() {
                Ok(builder) => builder,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Failed to read system resolver configuration, using defaults"
                    );
                    Resolver::builder_with_config(
                        ResolverConfig::default(),
                        TokioConnectionProvider::default(),
                    )
                }
            }
        } else {
            let mut config = ResolverConfig::new();
            for ip in &settings.nameservers {
                config.add_name_server(NameServerConfig::new(
                    SocketAddr::new(*ip, settings.port),
                    Protocol::Udp,
                ));
            }
            Resolver::builder_with_config(config, TokioConnectionProvider::default())
        };

        Ok(builder.with_options(opts).build())
    }
}

#[async_trait]
impl PublishedRecordReader for DnsRecordReader {
    async fn read_published(&self, name: &str) -> Result<Option<Ipv4Addr>> {
        match self.resolver.lookup_ip(name).await {
            Ok(lookup) => {
                let first = first_ipv4(lookup.iter());
                tracing::debug!(name = %name, ip = ?first, "Resolved published record");
                Ok(first)
            }
            Err(e) => {
                let message = e.to_string();
                if e.is_no_records_found() || e.is_nx_domain() || is_missing_record(&message) {
                    tracing::debug!(name = %name, "No published record");
                    Ok(None)
                } else {
                    Err(Error::resolution(format!(
                        "DNS lookup failed for '{}': {}",
                        name, message
                    )))
                }
            }
        }
    }

    fn reader_name(&self) -> &'static str {
        "dns"
    }
}

fn first_ipv4(addresses: impl IntoIterator<Item = IpAddr>) -> Option<Ipv4Addr> {
    addresses.into_iter().find_map(|ip| match ip {
        IpAddr::V4(v4) => Some(v4),
        IpAddr::V6(_) => None,
    })
}

/// Fallback for errors whose kind does not say "no A record" directly
fn is_missing_record(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("no records found")
        || message.contains("nxdomain")
        || message.contains("record not found")
}
