//! Core data types for domain availability checking.
//!
//! This module defines the request, options, per-domain result and response
//! structures exchanged with callers, plus the small enums that classify a
//! result.

use crate::utils::extract_tld;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Registration status of a single domain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DomainStatus {
    /// No registration found
    Available,
    /// A registration exists
    Taken,
    /// Evidence was inconclusive
    Unknown,
    /// The name itself is not acceptable to the registry or to our validator
    Invalid,
}

impl DomainStatus {
    /// Whether an RDAP outcome with this status ends the decision chain.
    pub fn is_decisive(self) -> bool {
        matches!(self, Self::Taken | Self::Available | Self::Invalid)
    }
}

/// Which evidence sources produced a result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CheckMethod {
    /// RDAP only (also used for validator and simulator results)
    #[serde(rename = "rdap")]
    Rdap,

    /// DNS only, RDAP was not attempted
    #[serde(rename = "dns")]
    Dns,

    /// RDAP was attempted but inconclusive, DNS decided
    #[serde(rename = "rdap+dns")]
    RdapDns,
}

/// Per-request configuration.
///
/// Unknown keys are rejected when decoding; missing keys take the defaults
/// below. Ranges are enforced by [`CheckOptions::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckOptions {
    /// Network timeout per request, in milliseconds (100-30000)
    pub timeout_ms: u64,

    /// Maximum number of checks in flight at once (1-200)
    pub max_concurrency: usize,

    /// Number of SLDs dispatched per wave (1-1000)
    pub batch_size: usize,

    /// Attempt RDAP before DNS
    pub prefer_rdap: bool,

    /// Probe DNS when RDAP is inconclusive or unavailable
    pub enable_dns_fallback: bool,

    /// Let the ranker pick an `unknown` domain when nothing is available
    pub treat_unknown_as_available: bool,

    /// Where the RDAP bootstrap registry is cached between runs
    pub bootstrap_cache_path: PathBuf,

    /// Freshness window of the cache file, in seconds (>= 60)
    pub bootstrap_ttl_seconds: u64,

    /// RDAP base used for TLDs the bootstrap registry does not list
    pub rdap_fallback_base: Option<String>,

    /// Replace every network call with the hash simulation
    pub deterministic_mode: bool,

    /// Seed mixed into the simulation hash
    pub deterministic_seed: u64,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 2500,
            max_concurrency: 20,
            batch_size: 200,
            prefer_rdap: true,
            enable_dns_fallback: true,
            treat_unknown_as_available: false,
            bootstrap_cache_path: PathBuf::from(".rig_cache/rdap_dns.json"),
            bootstrap_ttl_seconds: 604_800,
            rdap_fallback_base: None,
            deterministic_mode: false,
            deterministic_seed: 17,
        }
    }
}

impl CheckOptions {
    /// Enable the offline simulation with the given seed.
    pub fn with_deterministic_seed(mut self, seed: u64) -> Self {
        self.deterministic_mode = true;
        self.deterministic_seed = seed;
        self
    }

    /// Enable or disable the DNS fallback probe.
    pub fn with_dns_fallback(mut self, enabled: bool) -> Self {
        self.enable_dns_fallback = enabled;
        self
    }

    /// Set the dispatch wave size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the global in-flight limit.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Set the RDAP base used when the bootstrap registry has no entry.
    pub fn with_rdap_fallback_base<S: Into<String>>(mut self, base: S) -> Self {
        self.rdap_fallback_base = Some(base.into());
        self
    }

    /// Allow `unknown` domains to be suggested when nothing is available.
    pub fn with_unknown_as_available(mut self, enabled: bool) -> Self {
        self.treat_unknown_as_available = enabled;
        self
    }
}

/// A validated check request.
///
/// Built through [`CheckRequest::new`] or [`CheckRequest::from_json`]; the
/// fields cannot be changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckRequest {
    pub(crate) tlds: Vec<String>,
    pub(crate) slds: Vec<String>,
    pub(crate) options: CheckOptions,
}

impl CheckRequest {
    /// TLDs in preference order, as supplied.
    pub fn tlds(&self) -> &[String] {
        &self.tlds
    }

    /// Candidate second-level labels, as supplied.
    pub fn slds(&self) -> &[String] {
        &self.slds
    }

    /// Options for this request.
    pub fn options(&self) -> &CheckOptions {
        &self.options
    }
}

/// DNS evidence gathered for one domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DnsEvidence {
    pub nxdomain: bool,
    pub ns: bool,
    pub soa: bool,
}

impl DnsEvidence {
    pub fn nxdomain() -> Self {
        Self {
            nxdomain: true,
            ..Self::default()
        }
    }

    pub fn ns() -> Self {
        Self {
            ns: true,
            ..Self::default()
        }
    }

    pub fn soa() -> Self {
        Self {
            soa: true,
            ..Self::default()
        }
    }
}

/// Outcome of checking one domain.
///
/// Produced once per (SLD, TLD) pair and never modified afterwards. Absent
/// optional fields serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainResult {
    /// Full domain, e.g. "example.com"
    pub domain: String,

    pub status: DomainStatus,

    /// Confidence in `status`, in [0, 1]
    pub confidence: f64,

    pub method: CheckMethod,

    /// RDAP base URL that was (or would have been) queried
    pub rdap_server: Option<String>,

    /// Raw HTTP status of the last RDAP attempt
    pub rdap_http: Option<u16>,

    pub dns_nxdomain: Option<bool>,
    pub dns_ns: Option<bool>,
    pub dns_soa: Option<bool>,

    pub error: Option<String>,
}

impl DomainResult {
    /// Create a result with no RDAP or DNS details attached.
    pub fn new<D: Into<String>>(
        domain: D,
        status: DomainStatus,
        confidence: f64,
        method: CheckMethod,
    ) -> Self {
        Self {
            domain: domain.into(),
            status,
            confidence,
            method,
            rdap_server: None,
            rdap_http: None,
            dns_nxdomain: None,
            dns_ns: None,
            dns_soa: None,
            error: None,
        }
    }

    /// Placeholder for a domain whose SLD failed validation.
    pub fn invalid_sld<D: Into<String>>(domain: D) -> Self {
        Self::new(domain, DomainStatus::Invalid, 1.0, CheckMethod::Rdap)
            .with_error(Some("invalid_sld".to_string()))
    }

    pub fn with_rdap(mut self, server: Option<String>, http_status: Option<u16>) -> Self {
        self.rdap_server = server;
        self.rdap_http = http_status;
        self
    }

    /// Attach DNS evidence. Only positive flags are recorded.
    pub fn with_dns_evidence(mut self, evidence: DnsEvidence) -> Self {
        self.dns_nxdomain = evidence.nxdomain.then_some(true);
        self.dns_ns = evidence.ns.then_some(true);
        self.dns_soa = evidence.soa.then_some(true);
        self
    }

    pub fn with_error(mut self, error: Option<String>) -> Self {
        self.error = error;
        self
    }

    /// TLD of this result with its leading dot, e.g. ".com".
    pub fn tld(&self) -> String {
        extract_tld(&self.domain)
    }
}

/// Number of results per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub available: usize,
    pub taken: usize,
    pub unknown: usize,
    pub invalid: usize,
}

impl StatusCounts {
    pub fn from_results(results: &[DomainResult]) -> Self {
        let mut counts = Self::default();
        for result in results {
            match result.status {
                DomainStatus::Available => counts.available += 1,
                DomainStatus::Taken => counts.taken += 1,
                DomainStatus::Unknown => counts.unknown += 1,
                DomainStatus::Invalid => counts.invalid += 1,
            }
        }
        counts
    }
}

/// Response to a check request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResponse {
    /// UTC timestamp of the run, ISO-8601 with a `Z` suffix
    pub checked_at: String,

    /// All results, sorted by TLD then domain
    pub results: Vec<DomainResult>,

    /// Preferred domain according to the ranker, if any
    pub suggested_best: Option<String>,
}

impl CheckResponse {
    pub fn counts(&self) -> StatusCounts {
        StatusCounts::from_results(&self.results)
    }
}
