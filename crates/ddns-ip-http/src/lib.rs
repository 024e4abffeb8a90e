// # HTTP Public-IP Source
//
// This crate discovers the public IPv4 address by fetching a plain-text
// endpoint (e.g. http://checkip.amazonaws.com) that echoes the caller's
// address.
//
// ## Contract
//
// - One GET per call, no retry, no caching
// - Only status 200 is accepted; any other status is a lookup failure
// - The body is trimmed and must be a strict dotted quad; anything else
//   is an InvalidFormat error carrying the trimmed body
// - Requests time out after 10 seconds

use async_trait::async_trait;
use ddns_core::traits::PublicIpSource;
use ddns_core::{DiscoveredAddress, Error, Result};
use reqwest::StatusCode;
use std::time::Duration;

/// Default HTTP timeout for IP lookups (10 seconds)
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Public-IP source backed by an HTTP text endpoint
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// HTTP client, shared by every target task
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a source with the default timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_HTTP_TIMEOUT)
    }

    /// Create a source with a custom request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PublicIpSource for HttpIpSource {
    async fn discover(&self, endpoint: &str) -> Result<DiscoveredAddress> {
        tracing::debug!(url = %endpoint, "Fetching public IP");

        let response = self
            .client
            .get(endpoint)
            .send()
            .await
            .map_err(|e| Error::transport(format!("Request to {} failed: {}", endpoint, e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::http_status(endpoint, status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(format!("Failed to read response body: {}", e)))?;

        let discovered = DiscoveredAddress::new(body);
        tracing::debug!(url = %endpoint, raw = %discovered.as_str(), "Public IP response");

        if !discovered.is_valid() {
            return Err(Error::invalid_format(discovered.as_str()));
        }

        Ok(discovered)
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}
