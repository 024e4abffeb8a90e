// # Route53 DNS Provider
//
// This crate writes A records to an AWS Route53 hosted zone through the
// `ChangeResourceRecordSets` API.
//
// ## Contract
//
// - One API call per change request, never retried here (SDK retries are
//   disabled; the scheduler owns retry by re-running the cycle)
// - Credentials come from the AWS default chain (environment, profile,
//   container or instance role) and are never logged
// - Dry-run mode builds and logs the change batch but does not send it
//
// ## API Reference
//
// - POST /2013-04-01/hostedzone/{Id}/rrset/
// - https://docs.aws.amazon.com/Route53/latest/APIReference/API_ChangeResourceRecordSets.html

use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_sdk_route53::Client;
use aws_sdk_route53::config::retry::RetryConfig;
use aws_sdk_route53::config::timeout::TimeoutConfig;
use aws_sdk_route53::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_route53::operation::change_resource_record_sets::ChangeResourceRecordSetsOutput;
use aws_sdk_route53::types as sdk;
use ddns_core::traits::{
    ChangeAction, ChangeBatch, ChangeReceipt, ChangeRequest, DnsProvider, RecordType,
};
use ddns_core::{Error, Result};
use std::time::Duration;

/// Provider name used in logs and errors
const PROVIDER: &str = "route53";

/// Region used when none is configured; Route53 is a global service
const FALLBACK_REGION: &str = "us-east-1";

/// Default timeout for one API call (30 seconds)
const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Receipt status reported in dry-run mode
pub const DRY_RUN_STATUS: &str = "DRY_RUN";

/// AWS Route53 DNS provider
///
/// Stateless apart from the SDK client; one instance is shared by every
/// target task.
///
/// # Dry-Run Mode
///
/// When `dry_run` is true the provider converts and logs the change batch,
/// then returns a receipt with status [`DRY_RUN_STATUS`] without calling AWS.
pub struct Route53Provider {
    client: Client,
    dry_run: bool,
}

// Custom Debug that leaves the client (and its credentials) out
impl std::fmt::Debug for Route53Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route53Provider")
            .field("credentials", &"<REDACTED>")
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl Route53Provider {
    /// Create a provider around an existing SDK client
    pub fn new(client: Client, dry_run: bool) -> Self {
        Self { client, dry_run }
    }

    /// Create a provider from the AWS default configuration chain
    ///
    /// SDK-level retries are disabled and each call is bounded by a 30
    /// second operation timeout.
    pub async fn from_env(dry_run: bool) -> Self {
        let region = RegionProviderChain::default_provider().or_else(FALLBACK_REGION);

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(region)
            .retry_config(RetryConfig::disabled())
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(DEFAULT_OPERATION_TIMEOUT)
                    .build(),
            )
            .load()
            .await;

        if dry_run {
            tracing::warn!("Route53 provider running in DRY-RUN mode - no changes will be made");
        }

        Self::new(Client::new(&sdk_config), dry_run)
    }

    /// Whether writes are only logged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

#[async_trait]
impl DnsProvider for Route53Provider {
    async fn upsert(&self, request: &ChangeRequest) -> Result<ChangeReceipt> {
        let batch = to_sdk_batch(&request.change_batch)?;

        tracing::info!(
            zone = %request.hosted_zone_id,
            records = ?request.record_names(),
            mode = if self.dry_run { "DRY-RUN" } else { "LIVE" },
            "Submitting Route53 change batch"
        );

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send ChangeResourceRecordSets with payload: {}",
                serde_json::to_string(request)?
            );
            return Ok(ChangeReceipt {
                id: None,
                status: DRY_RUN_STATUS.to_string(),
            });
        }

        let output = self
            .client
            .change_resource_record_sets()
            .hosted_zone_id(&request.hosted_zone_id)
            .change_batch(batch)
            .send()
            .await
            .map_err(|e| {
                let code = e
                    .as_service_error()
                    .and_then(|service| service.code())
                    .map(str::to_string);

                let message = match code {
                    Some(code) => format!("{}: {}", code, DisplayErrorContext(&e)),
                    None => DisplayErrorContext(&e).to_string(),
                };
                Error::provider(PROVIDER, message)
            })?;

        let receipt = receipt_from(&output);
        tracing::info!(
            zone = %request.hosted_zone_id,
            change_id = ?receipt.id,
            status = %receipt.status,
            "Route53 change accepted"
        );

        Ok(receipt)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Convert a change batch into its SDK representation
pub fn to_sdk_batch(batch: &ChangeBatch) -> Result<sdk::ChangeBatch> {
    let changes = batch
        .changes
        .iter()
        .map(|change| {
            let set = &change.resource_record_set;

            let records = set
                .resource_records
                .iter()
                .map(|record| sdk::ResourceRecord::builder().value(&record.value).build())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(build_error)?;

            let record_set = sdk::ResourceRecordSet::builder()
                .name(&set.name)
                .r#type(record_type(set.record_type))
                .ttl(i64::from(set.ttl))
                .set_resource_records(Some(records))
                .build()
                .map_err(build_error)?;

            sdk::Change::builder()
                .action(action(change.action))
                .resource_record_set(record_set)
                .build()
                .map_err(build_error)
        })
        .collect::<Result<Vec<_>>>()?;

    sdk::ChangeBatch::builder()
        .comment(&batch.comment)
        .set_changes(Some(changes))
        .build()
        .map_err(build_error)
}

fn action(action: ChangeAction) -> sdk::ChangeAction {
    match action {
        ChangeAction::Upsert => sdk::ChangeAction::Upsert,
    }
}

fn record_type(record_type: RecordType) -> sdk::RrType {
    match record_type {
        RecordType::A => sdk::RrType::A,
    }
}

fn receipt_from(output: &ChangeResourceRecordSetsOutput) -> ChangeReceipt {
    match output.change_info() {
        Some(info) => ChangeReceipt {
            id: Some(info.id().to_string()),
            status: info.status().as_str().to_string(),
        },
        None => ChangeReceipt {
            id: None,
            status: "UNKNOWN".to_string(),
        },
    }
}

fn build_error(e: aws_sdk_route53::error::BuildError) -> Error {
    Error::provider(PROVIDER, format!("Invalid change batch: {}", e))
}
