//! # Domain Scout Library
//!
//! Decides whether candidate domain names are registered, using RDAP as the
//! primary authority and DNS as fallback evidence, and picks a single
//! suggested best domain from the results.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use domain_scout_lib::CheckRequest;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let request = CheckRequest::from_json(
//!         r#"{"tlds": [".com", ".io"], "slds": ["alpha", "beta"]}"#,
//!     )?;
//!     let response = domain_scout_lib::check(&request).await?;
//!
//!     for result in &response.results {
//!         println!("{}: {:?} ({})", result.domain, result.status, result.confidence);
//!     }
//!     println!("Suggested: {:?}", response.suggested_best);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **RDAP first**: per-TLD servers discovered through the IANA bootstrap
//!   registry, cached on disk
//! - **DNS fallback**: NS/SOA/NXDOMAIN evidence when RDAP is inconclusive
//! - **Bounded concurrency**: batched dispatch under a global in-flight limit
//! - **Deterministic mode**: hash-based offline simulation for reproducible runs

// Re-export main public API types and functions
// This makes them available as domain_scout_lib::TypeName
pub use checker::{check, utc_timestamp, DomainChecker};
pub use concurrent::{sld_batches, wave_sizes, ConcurrencyGate};
pub use config::{
    load_env_config, load_env_config_from, resolve_defaults, ConfigManager, DefaultsConfig,
    FileConfig, MAX_SLDS, MAX_TLDS,
};
pub use error::DomainScoutError;
pub use protocols::{
    build_http_client, is_retryable_http_status, lookup_with_retry, map_dns_evidence,
    map_rdap_http_status, BootstrapCache, BootstrapMap, BootstrapSource, DnsLookup, DnsProber,
    HttpBootstrapSource, RdapClient, RdapLookup, RdapOutcome, IANA_DNS_BOOTSTRAP_URL,
};
pub use rank::{choose_suggested_best, sort_results};
pub use retry::RetryPolicy;
pub use runlog::{JsonlRunLog, NoopRunLog, RunLog, RunRecord};
pub use simulate::{simulate_domain, SIMULATED_CHECKED_AT, SIMULATED_RDAP_SERVER};
pub use types::{
    CheckMethod, CheckOptions, CheckRequest, CheckResponse, DnsEvidence, DomainResult,
    DomainStatus, StatusCounts,
};
pub use utils::{
    extract_tld, is_valid_sld, is_valid_tld, normalize_label, partition_slds, validate_tlds,
    SldPartition,
};

// Internal modules - these are not part of the public API
mod checker;
mod concurrent;
mod config;
mod error;
mod protocols;
mod rank;
mod retry;
mod runlog;
mod simulate;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, DomainScoutError>;

// Library version, recorded in the run log
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
