//! Configuration types for the DDNS system
//!
//! This module defines all configuration structures used throughout the crate.
//! Configuration is built once at startup and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default public-IP endpoint
pub const DEFAULT_PUBLIC_IP_URL: &str = "http://checkip.amazonaws.com";

/// Default record TTL in seconds
pub const DEFAULT_TTL_SECONDS: u32 = 300;

/// Default comment attached to every change batch
pub const DEFAULT_CHANGE_COMMENT: &str = "Update public IP address from Docker container.";

/// Main DDNS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// Hosted zone receiving all upserts
    pub hosted_zone_id: String,

    /// Hostnames to keep in sync (may start with `*.`)
    pub dns_names: Vec<String>,

    /// Endpoint returning the caller's public IPv4 address as plain text
    #[serde(default = "default_public_ip_url")]
    pub public_ip_url: String,

    /// TTL applied to every upserted record
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u32,

    /// Repeat forever (`true`) or run a single pass (`false`)
    #[serde(default = "default_keep_alive")]
    pub keep_alive: bool,

    /// Also upsert `*.<name>` for every non-wildcard name
    #[serde(default)]
    pub upsert_wildcard: bool,

    /// Seconds between cycles; defaults to the TTL
    #[serde(default)]
    pub interval_secs: Option<u64>,

    /// Comment sent with each change batch
    #[serde(default = "default_change_comment")]
    pub change_comment: String,
}

impl DdnsConfig {
    /// Create a configuration with defaults for everything but the zone and names
    pub fn new(hosted_zone_id: impl Into<String>, dns_names: Vec<String>) -> Self {
        Self {
            hosted_zone_id: hosted_zone_id.into(),
            dns_names,
            public_ip_url: default_public_ip_url(),
            ttl_seconds: default_ttl_seconds(),
            keep_alive: default_keep_alive(),
            upsert_wildcard: false,
            interval_secs: None,
            change_comment: default_change_comment(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.hosted_zone_id.trim().is_empty() {
            return Err(crate::Error::config("Hosted zone ID cannot be empty"));
        }

        if self.dns_names.is_empty() {
            return Err(crate::Error::config("No DNS names configured"));
        }

        if self.dns_names.iter().any(|name| name.trim().is_empty()) {
            return Err(crate::Error::config("DNS names cannot be empty"));
        }

        if self.public_ip_url.is_empty() {
            return Err(crate::Error::config("Public IP URL cannot be empty"));
        }

        if self.ttl_seconds == 0 {
            return Err(crate::Error::config("TTL must be > 0"));
        }

        if self.interval_secs == Some(0) {
            return Err(crate::Error::config("Interval must be > 0"));
        }

        Ok(())
    }

    /// Time to sleep between two cycles of the same target
    pub fn interval(&self) -> Duration {
        Duration::from_secs(
            self.interval_secs
                .unwrap_or_else(|| u64::from(self.ttl_seconds)),
        )
    }

    /// One reconciliation target per configured name
    pub fn targets(&self) -> Vec<ReconciliationTarget> {
        self.dns_names
            .iter()
            .map(|name| ReconciliationTarget {
                hosted_zone_id: self.hosted_zone_id.clone(),
                hostname: name.trim().to_string(),
                public_ip_url: self.public_ip_url.clone(),
                ttl_seconds: self.ttl_seconds,
                upsert_wildcard: self.upsert_wildcard,
            })
            .collect()
    }
}

/// Everything needed to reconcile one hostname
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationTarget {
    /// Hosted zone the record lives in
    pub hosted_zone_id: String,

    /// Record name, possibly a wildcard such as `*.example.com`
    pub hostname: String,

    /// Public-IP endpoint queried for this target
    pub public_ip_url: String,

    /// TTL in seconds, always >= 1
    pub ttl_seconds: u32,

    /// Keep `*.<hostname>` in sync as well
    #[serde(default)]
    pub upsert_wildcard: bool,
}

impl ReconciliationTarget {
    /// Create a target with default endpoint and TTL
    pub fn new(hosted_zone_id: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            hosted_zone_id: hosted_zone_id.into(),
            hostname: hostname.into(),
            public_ip_url: default_public_ip_url(),
            ttl_seconds: default_ttl_seconds(),
            upsert_wildcard: false,
        }
    }

    /// Set the public-IP endpoint
    pub fn with_public_ip_url(mut self, url: impl Into<String>) -> Self {
        self.public_ip_url = url.into();
        self
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl_seconds: u32) -> Self {
        self.ttl_seconds = ttl_seconds;
        self
    }

    /// Enable or disable the wildcard sibling upsert
    pub fn with_upsert_wildcard(mut self, upsert_wildcard: bool) -> Self {
        self.upsert_wildcard = upsert_wildcard;
        self
    }
}

fn default_public_ip_url() -> String {
    DEFAULT_PUBLIC_IP_URL.to_string()
}

fn default_ttl_seconds() -> u32 {
    DEFAULT_TTL_SECONDS
}

fn default_keep_alive() -> bool {
    true
}

fn default_change_comment() -> String {
    DEFAULT_CHANGE_COMMENT.to_string()
}
