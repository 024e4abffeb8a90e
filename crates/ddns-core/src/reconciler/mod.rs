//! Reconciliation of one hostname
//!
//! The Reconciler is responsible for:
//! - Discovering the public IP via PublicIpSource
//! - Reading the published record via PublishedRecordReader
//! - Deciding whether a write is needed
//! - Upserting the record via DnsProvider
//!
//! ## Cycle
//!
//! ```text
//! START ──► discover ──► validate ──► read published ──► compare ──► upsert
//!              │            │               │                │          │
//!              ▼            ▼               ▼                ▼          ▼
//!     SkippedLookupFailed   │     absent / error =      NoChangeNeeded  Updated /
//!                 SkippedInvalidPublicIp  "unknown"                     SkippedProviderError
//! ```
//!
//! A write happens if and only if the discovered address is valid and the
//! published address is absent, unknown, or different. Every failure is
//! converted into an [`UpdateOutcome`]; [`Reconciler::reconcile`] has no
//! error path.

use crate::address::{self, DiscoveredAddress, PublishedAddress};
use crate::config::{DEFAULT_CHANGE_COMMENT, ReconciliationTarget};
use crate::error::Error;
use crate::traits::{
    Change, ChangeBatch, ChangeRequest, DnsProvider, PublicIpSource, PublishedRecordReader,
};
use std::fmt;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of one reconciliation cycle
///
/// Used for logging and observability only; nothing is retained between
/// cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Published record already matches the public IP
    NoChangeNeeded {
        ip: Ipv4Addr,
    },

    /// Record upserted with the new IP
    Updated {
        new_ip: Ipv4Addr,
        previous: Option<Ipv4Addr>,
        status: String,
    },

    /// Endpoint returned something that is not a dotted quad
    SkippedInvalidPublicIp {
        raw: String,
    },

    /// Public-IP lookup failed
    SkippedLookupFailed {
        error: String,
    },

    /// Provider rejected or failed the write
    SkippedProviderError {
        new_ip: Ipv4Addr,
        error: String,
    },
}

impl UpdateOutcome {
    /// Whether this cycle issued a successful write
    pub fn is_updated(&self) -> bool {
        matches!(self, UpdateOutcome::Updated { .. })
    }

    /// Whether this cycle was skipped because of a failure
    pub fn is_skipped(&self) -> bool {
        matches!(
            self,
            UpdateOutcome::SkippedInvalidPublicIp { .. }
                | UpdateOutcome::SkippedLookupFailed { .. }
                | UpdateOutcome::SkippedProviderError { .. }
        )
    }

    /// Short label for logs
    pub fn label(&self) -> &'static str {
        match self {
            UpdateOutcome::NoChangeNeeded { .. } => "no_change_needed",
            UpdateOutcome::Updated { .. } => "updated",
            UpdateOutcome::SkippedInvalidPublicIp { .. } => "skipped_invalid_public_ip",
            UpdateOutcome::SkippedLookupFailed { .. } => "skipped_lookup_failed",
            UpdateOutcome::SkippedProviderError { .. } => "skipped_provider_error",
        }
    }
}

impl fmt::Display for UpdateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateOutcome::NoChangeNeeded { ip } => write!(f, "no change needed ({})", ip),
            UpdateOutcome::Updated { new_ip, status, .. } => {
                write!(f, "updated to {} ({})", new_ip, status)
            }
            UpdateOutcome::SkippedInvalidPublicIp { raw } => {
                write!(f, "skipped: invalid public IP '{}'", raw)
            }
            UpdateOutcome::SkippedLookupFailed { error } => {
                write!(f, "skipped: public IP lookup failed: {}", error)
            }
            UpdateOutcome::SkippedProviderError { error, .. } => {
                write!(f, "skipped: provider error: {}", error)
            }
        }
    }
}

/// Decision procedure for one hostname
///
/// Holds shared, stateless collaborator handles. A single `Reconciler` is
/// shared by every target task; it keeps no per-cycle state of its own.
pub struct Reconciler {
    /// Public-IP discovery
    ip_source: Arc<dyn PublicIpSource>,

    /// Published record lookup
    reader: Arc<dyn PublishedRecordReader>,

    /// Record writes
    provider: Arc<dyn DnsProvider>,

    /// Comment attached to each change batch
    change_comment: String,
}

impl Reconciler {
    /// Create a new reconciler
    pub fn new(
        ip_source: Arc<dyn PublicIpSource>,
        reader: Arc<dyn PublishedRecordReader>,
        provider: Arc<dyn DnsProvider>,
    ) -> Self {
        Self {
            ip_source,
            reader,
            provider,
            change_comment: DEFAULT_CHANGE_COMMENT.to_string(),
        }
    }

    /// Set the change batch comment
    pub fn with_change_comment(mut self, comment: impl Into<String>) -> Self {
        self.change_comment = comment.into();
        self
    }

    /// Run one reconciliation cycle for `target`
    pub async fn reconcile(&self, target: &ReconciliationTarget) -> UpdateOutcome {
        let hostname = target.hostname.as_str();
        info!(hostname = %hostname, "IP update check started");

        let discovered = match self.ip_source.discover(&target.public_ip_url).await {
            Ok(discovered) => discovered,
            Err(Error::InvalidFormat(raw)) => {
                warn!(hostname = %hostname, raw = %raw, "Failed to receive valid IP");
                return UpdateOutcome::SkippedInvalidPublicIp { raw };
            }
            Err(e) => {
                warn!(
                    hostname = %hostname,
                    url = %target.public_ip_url,
                    error = %e,
                    "Public IP lookup failed"
                );
                return UpdateOutcome::SkippedLookupFailed {
                    error: e.to_string(),
                };
            }
        };

        let public_ip = match Self::validated(&discovered) {
            Some(ip) => ip,
            None => {
                warn!(
                    hostname = %hostname,
                    raw = %discovered.as_str(),
                    "Failed to receive valid IP"
                );
                return UpdateOutcome::SkippedInvalidPublicIp {
                    raw: discovered.as_str().to_string(),
                };
            }
        };
        info!(hostname = %hostname, ip = %public_ip, "Current public IP");

        let published = self.read_published(hostname).await;

        if published.matches(public_ip) {
            info!(hostname = %hostname, ip = %public_ip, "No IP change required");
            return UpdateOutcome::NoChangeNeeded { ip: public_ip };
        }

        let request = self.change_request(target, public_ip);
        info!(
            hostname = %hostname,
            from = %published,
            to = %public_ip,
            records = ?request.record_names(),
            "Updating DNS"
        );

        match self.provider.upsert(&request).await {
            Ok(receipt) => {
                info!(
                    hostname = %hostname,
                    ip = %public_ip,
                    provider = self.provider.provider_name(),
                    status = %receipt.status,
                    "DNS record upserted"
                );
                UpdateOutcome::Updated {
                    new_ip: public_ip,
                    previous: published.address(),
                    status: receipt.status,
                }
            }
            Err(e) => {
                warn!(
                    hostname = %hostname,
                    ip = %public_ip,
                    provider = self.provider.provider_name(),
                    error = %e,
                    "DNS upsert failed"
                );
                UpdateOutcome::SkippedProviderError {
                    new_ip: public_ip,
                    error: e.to_string(),
                }
            }
        }
    }

    /// Build the change request that publishes `ip` for `target`
    ///
    /// The primary record always comes first. The wildcard sibling is added
    /// only when the target asks for it and is not a wildcard itself.
    pub fn change_request(&self, target: &ReconciliationTarget, ip: Ipv4Addr) -> ChangeRequest {
        let mut changes = vec![Change::upsert_a(
            target.hostname.clone(),
            ip,
            target.ttl_seconds,
        )];

        if target.upsert_wildcard
            && let Some(sibling) = address::wildcard_sibling(&target.hostname)
        {
            changes.push(Change::upsert_a(sibling, ip, target.ttl_seconds));
        }

        ChangeRequest {
            hosted_zone_id: target.hosted_zone_id.clone(),
            change_batch: ChangeBatch {
                comment: self.change_comment.clone(),
                changes,
            },
        }
    }

    fn validated(discovered: &DiscoveredAddress) -> Option<Ipv4Addr> {
        let ip = discovered.address()?;
        address::is_valid_ipv4(discovered.as_str()).then_some(ip)
    }

    /// Read the published record, folding failures into `Unresolvable`
    async fn read_published(&self, hostname: &str) -> PublishedAddress {
        let name = address::lookup_name(hostname);
        if name != hostname {
            debug!(hostname = %hostname, lookup = %name, "Resolving wildcard through probe name");
        }

        match self.reader.read_published(&name).await {
            Ok(Some(ip)) => {
                info!(hostname = %hostname, ip = %ip, "Current DNS IP");
                PublishedAddress::Present(ip)
            }
            Ok(None) => {
                info!(hostname = %hostname, "No published record yet");
                PublishedAddress::Absent
            }
            Err(e) => {
                warn!(
                    hostname = %hostname,
                    reader = self.reader.reader_name(),
                    error = %e,
                    "Published record lookup failed, treating as unknown"
                );
                PublishedAddress::Unresolvable(e.to_string())
            }
        }
    }
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("ip_source", &self.ip_source.source_name())
            .field("reader", &self.reader.reader_name())
            .field("provider", &self.provider.provider_name())
            .field("change_comment", &self.change_comment)
            .finish()
    }
}
