// # DNS Provider Trait
//
// Defines the interface for writing A records via a provider API.
//
// ## Implementations
//
// - Route53: `ddns-provider-route53` crate
//
// ## Request shape
//
// The request types below serialize to the Route53
// `ChangeResourceRecordSets` schema:
//
// ```json
// {
//   "HostedZoneId": "Z123",
//   "ChangeBatch": {
//     "Comment": "Update public IP address from Docker container.",
//     "Changes": [{
//       "Action": "UPSERT",
//       "ResourceRecordSet": {
//         "Name": "home.example.com",
//         "Type": "A",
//         "TTL": 300,
//         "ResourceRecords": [{ "Value": "203.0.113.5" }]
//       }
//     }]
//   }
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Change action; only idempotent upserts are ever issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeAction {
    Upsert,
}

/// Record type; only IPv4 address records are managed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordType {
    A,
}

/// A single record value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceRecord {
    pub value: String,
}

/// Record set written by one change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceRecordSet {
    pub name: String,
    #[serde(rename = "Type")]
    pub record_type: RecordType,
    #[serde(rename = "TTL")]
    pub ttl: u32,
    pub resource_records: Vec<ResourceRecord>,
}

/// One entry of a change batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Change {
    pub action: ChangeAction,
    pub resource_record_set: ResourceRecordSet,
}

impl Change {
    /// UPSERT of an A record `name -> ip`
    pub fn upsert_a(name: impl Into<String>, ip: Ipv4Addr, ttl: u32) -> Self {
        Self {
            action: ChangeAction::Upsert,
            resource_record_set: ResourceRecordSet {
                name: name.into(),
                record_type: RecordType::A,
                ttl,
                resource_records: vec![ResourceRecord {
                    value: ip.to_string(),
                }],
            },
        }
    }
}

/// Ordered list of changes applied atomically
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChangeBatch {
    pub comment: String,
    pub changes: Vec<Change>,
}

/// A complete write request for one hosted zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChangeRequest {
    pub hosted_zone_id: String,
    pub change_batch: ChangeBatch,
}

impl ChangeRequest {
    /// Names written by this request, in order
    pub fn record_names(&self) -> Vec<&str> {
        self.change_batch
            .changes
            .iter()
            .map(|c| c.resource_record_set.name.as_str())
            .collect()
    }
}

/// Provider acknowledgement of a change request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeReceipt {
    /// Provider-side change identifier, if any
    pub id: Option<String>,
    /// Change status as reported by the provider (e.g. `PENDING`)
    pub status: String,
}

/// Trait for DNS provider implementations
///
/// Implementations must be thread-safe; one handle is shared by all target
/// tasks and may be called concurrently without external locking.
///
/// # Single-shot
///
/// One call sends exactly one request to the provider. No retry, no backoff,
/// no decision about whether a write is needed: the reconciler owns all of
/// that.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Apply a change batch
    ///
    /// Every change is an UPSERT, so repeating the same request is a no-op
    /// from the provider's perspective.
    async fn upsert(&self, request: &ChangeRequest) -> Result<ChangeReceipt, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
