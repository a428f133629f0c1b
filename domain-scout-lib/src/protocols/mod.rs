//! Protocol implementations for domain checking.
//!
//! RDAP is the primary authority, DNS the secondary evidence source, and
//! the bootstrap registry tells us which RDAP server serves each TLD.

/// RDAP (Registration Data Access Protocol) lookups
pub mod rdap;

/// DNS NS/SOA evidence probe
pub mod dns;

/// RDAP bootstrap registry and its file cache
pub mod registry;

// Re-export commonly used functions and types
pub use dns::{map_dns_evidence, DnsLookup, DnsProber};
pub use rdap::{
    build_http_client, is_retryable_http_status, lookup_with_retry, map_rdap_http_status,
    RdapClient, RdapLookup, RdapOutcome,
};
pub use registry::{
    BootstrapCache, BootstrapMap, BootstrapSource, HttpBootstrapSource, IANA_DNS_BOOTSTRAP_URL,
};
