//! DNS evidence probe used when RDAP is inconclusive or unavailable.
//!
//! NS is queried first. NXDOMAIN or any NS record settles it; otherwise
//! (no answer, no nameservers, timeout, other failure) SOA is queried next.

use crate::types::{DnsEvidence, DomainStatus};
use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::proto::op::ResponseCode;
use hickory_resolver::TokioAsyncResolver;
use std::time::Duration;

/// Map DNS evidence to a status and confidence.
pub fn map_dns_evidence(evidence: DnsEvidence) -> (DomainStatus, f64) {
    if evidence.nxdomain {
        (DomainStatus::Available, 0.60)
    } else if evidence.ns || evidence.soa {
        (DomainStatus::Taken, 0.70)
    } else {
        (DomainStatus::Unknown, 0.30)
    }
}

/// What a single record-type lookup told us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LookupSignal {
    Found,
    NxDomain,
    Inconclusive,
}

fn is_nxdomain(err: &ResolveError) -> bool {
    matches!(
        err.kind(),
        ResolveErrorKind::NoRecordsFound { response_code, .. } if *response_code == ResponseCode::NXDomain
    )
}

fn classify(result: Result<Result<bool, ResolveError>, tokio::time::error::Elapsed>) -> LookupSignal {
    match result {
        Ok(Ok(true)) => LookupSignal::Found,
        Ok(Ok(false)) => LookupSignal::Inconclusive,
        Ok(Err(e)) if is_nxdomain(&e) => LookupSignal::NxDomain,
        Ok(Err(e)) => {
            tracing::debug!(error = %e, "DNS lookup inconclusive");
            LookupSignal::Inconclusive
        }
        Err(_) => LookupSignal::Inconclusive,
    }
}

/// One DNS evidence probe.
#[async_trait]
pub trait DnsLookup: Send + Sync {
    /// Gather NS/SOA/NXDOMAIN evidence for a domain. Never fails: lookup
    /// errors yield empty evidence.
    async fn probe(&self, domain: &str) -> DnsEvidence;
}

/// Async DNS prober backed by `hickory-resolver`.
///
/// Resolution is natively async, so probes run on the same scheduler as
/// the RDAP requests without blocking it.
pub struct DnsProber {
    resolver: TokioAsyncResolver,
    timeout: Duration,
}

impl DnsProber {
    /// Create a prober using the system resolver configuration.
    ///
    /// Falls back to the resolver library's default upstreams when the
    /// system configuration cannot be read.
    pub fn new(timeout: Duration) -> Self {
        let (config, mut opts) = match hickory_resolver::system_conf::read_system_conf() {
            Ok(conf) => conf,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read system DNS config, using defaults");
                (ResolverConfig::default(), ResolverOpts::default())
            }
        };
        opts.timeout = timeout;
        opts.attempts = 1;
        Self::with_config(config, opts, timeout)
    }

    /// Create a prober with an explicit resolver configuration.
    pub fn with_config(config: ResolverConfig, opts: ResolverOpts, timeout: Duration) -> Self {
        Self {
            resolver: TokioAsyncResolver::tokio(config, opts),
            timeout,
        }
    }

    async fn lookup_ns(&self, name: &str) -> LookupSignal {
        let lookup = async {
            self.resolver
                .ns_lookup(name)
                .await
                .map(|records| records.iter().next().is_some())
        };
        classify(tokio::time::timeout(self.timeout, lookup).await)
    }

    async fn lookup_soa(&self, name: &str) -> LookupSignal {
        let lookup = async {
            self.resolver
                .soa_lookup(name)
                .await
                .map(|records| records.iter().next().is_some())
        };
        classify(tokio::time::timeout(self.timeout, lookup).await)
    }
}

#[async_trait]
impl DnsLookup for DnsProber {
    async fn probe(&self, domain: &str) -> DnsEvidence {
        // Fully qualified so resolver search domains never get appended.
        let name = format!("{}.", domain.trim_end_matches('.'));

        let evidence = match self.lookup_ns(&name).await {
            LookupSignal::NxDomain => DnsEvidence::nxdomain(),
            LookupSignal::Found => DnsEvidence::ns(),
            LookupSignal::Inconclusive => match self.lookup_soa(&name).await {
                LookupSignal::NxDomain => DnsEvidence::nxdomain(),
                LookupSignal::Found => DnsEvidence::soa(),
                LookupSignal::Inconclusive => DnsEvidence::default(),
            },
        };

        tracing::debug!(domain, ?evidence, "DNS probe finished");
        evidence
    }
}
