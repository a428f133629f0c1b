//! RDAP (Registration Data Access Protocol) lookups.
//!
//! Only the HTTP status code of `GET {base}/domain/{domain}` is interpreted;
//! the response body is never parsed. Status codes and transport failures
//! map onto a fixed `(status, confidence)` table.

use crate::error::DomainScoutError;
use crate::retry::RetryPolicy;
use crate::types::DomainStatus;
use async_trait::async_trait;
use std::time::Duration;

/// HTTP status codes worth retrying.
const RETRYABLE_HTTP: [u16; 5] = [429, 500, 502, 503, 504];

/// Map an RDAP HTTP status code to a status and confidence.
pub fn map_rdap_http_status(status_code: u16) -> (DomainStatus, f64) {
    match status_code {
        200 => (DomainStatus::Taken, 0.98),
        404 => (DomainStatus::Available, 0.80),
        400 => (DomainStatus::Invalid, 1.0),
        _ => (DomainStatus::Unknown, 0.25),
    }
}

/// Whether an RDAP HTTP status code should be retried.
pub fn is_retryable_http_status(status_code: u16) -> bool {
    RETRYABLE_HTTP.contains(&status_code)
}

/// Build the lookup URL for a domain under an RDAP base.
pub fn rdap_url(base: &str, domain: &str) -> String {
    format!("{}/domain/{}", base.trim_end_matches('/'), domain)
}

/// Result of a single RDAP attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct RdapOutcome {
    pub status: DomainStatus,
    pub confidence: f64,
    /// HTTP status, absent when the request never got a response
    pub http_status: Option<u16>,
    /// Transport error description ("timeout" for timeouts)
    pub error: Option<String>,
}

impl RdapOutcome {
    /// Outcome for a received HTTP response.
    pub fn from_http_status(status_code: u16) -> Self {
        let (status, confidence) = map_rdap_http_status(status_code);
        Self {
            status,
            confidence,
            http_status: Some(status_code),
            error: None,
        }
    }

    /// Outcome for a request that timed out.
    pub fn timeout() -> Self {
        Self::transport_error("timeout")
    }

    /// Outcome for any other transport failure.
    pub fn transport_error<M: Into<String>>(message: M) -> Self {
        Self {
            status: DomainStatus::Unknown,
            confidence: 0.25,
            http_status: None,
            error: Some(message.into()),
        }
    }

    /// Whether another attempt could change the answer.
    pub fn is_retryable(&self) -> bool {
        self.error.is_some() || self.http_status.is_some_and(is_retryable_http_status)
    }
}

/// One RDAP domain lookup.
#[async_trait]
pub trait RdapLookup: Send + Sync {
    /// Query `{base}/domain/{domain}` once. Never fails: transport errors
    /// are folded into the outcome.
    async fn lookup(&self, base: &str, domain: &str) -> RdapOutcome;
}

/// Query RDAP under `policy`, retrying transient outcomes.
///
/// The retry decision is made per call from that call's own outcomes.
pub async fn lookup_with_retry(
    rdap: &dyn RdapLookup,
    policy: &RetryPolicy,
    base: &str,
    domain: &str,
) -> RdapOutcome {
    policy
        .run(
            |attempt| {
                tracing::debug!(domain, base, attempt, "RDAP lookup");
                rdap.lookup(base, domain)
            },
            RdapOutcome::is_retryable,
        )
        .await
}

/// RDAP client backed by a shared `reqwest` connection pool.
#[derive(Clone)]
pub struct RdapClient {
    /// HTTP client for making RDAP requests
    http_client: reqwest::Client,
}

impl RdapClient {
    /// Create a client whose requests are all bounded by `timeout`.
    ///
    /// `max_idle_per_host` caps pooled keep-alive connections so the pool
    /// never holds more sockets than there can be checks in flight.
    pub fn new(timeout: Duration, max_idle_per_host: usize) -> Result<Self, DomainScoutError> {
        let http_client = build_http_client(timeout, max_idle_per_host)?;
        Ok(Self { http_client })
    }

    /// Wrap an existing HTTP client.
    pub fn from_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    pub fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }
}

/// Build the HTTP client shared by RDAP lookups and the bootstrap fetch.
pub fn build_http_client(
    timeout: Duration,
    max_idle_per_host: usize,
) -> Result<reqwest::Client, DomainScoutError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .pool_idle_timeout(timeout.max(Duration::from_secs(30)))
        .pool_max_idle_per_host(max_idle_per_host)
        .user_agent(concat!("domain-scout/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| DomainScoutError::internal(format!("Failed to create HTTP client: {}", e)))
}

#[async_trait]
impl RdapLookup for RdapClient {
    async fn lookup(&self, base: &str, domain: &str) -> RdapOutcome {
        let url = rdap_url(base, domain);
        match self.http_client.get(&url).send().await {
            Ok(response) => {
                let code = response.status().as_u16();
                tracing::debug!(domain, http = code, "RDAP response");
                RdapOutcome::from_http_status(code)
            }
            Err(e) if e.is_timeout() => {
                tracing::debug!(domain, "RDAP request timed out");
                RdapOutcome::timeout()
            }
            Err(e) => {
                tracing::debug!(domain, error = %e, "RDAP request failed");
                RdapOutcome::transport_error(e.to_string())
            }
        }
    }
}
