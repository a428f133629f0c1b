//! Main domain checker implementation.
//!
//! This module provides the `DomainChecker` that turns a validated
//! `CheckRequest` into a `CheckResponse`: invalid labels become placeholder
//! results, valid ones are either simulated offline or checked over the
//! network through the RDAP → DNS decision chain, then everything is sorted
//! and ranked.

use crate::concurrent::{sld_batches, wave_sizes, ConcurrencyGate};
use crate::error::DomainScoutError;
use crate::protocols::{
    build_http_client, lookup_with_retry, map_dns_evidence, BootstrapCache, BootstrapMap,
    BootstrapSource, DnsLookup, DnsProber, HttpBootstrapSource, RdapClient, RdapLookup,
    RdapOutcome,
};
use crate::rank::{choose_suggested_best, sort_results};
use crate::retry::RetryPolicy;
use crate::runlog::{JsonlRunLog, RunLog, RunRecord};
use crate::simulate::{simulate_domain, SIMULATED_CHECKED_AT};
use crate::types::{
    CheckMethod, CheckOptions, CheckRequest, CheckResponse, DnsEvidence, DomainResult, DomainStatus,
};
use crate::utils::{partition_slds, validate_tlds};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;

/// Current UTC time, ISO-8601 with a `Z` suffix.
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Orchestrates a check run over pluggable network collaborators.
///
/// The collaborators are only consulted in live mode; deterministic runs
/// never touch them.
///
/// # Example
///
/// ```rust,no_run
/// use domain_scout_lib::{CheckOptions, CheckRequest, DomainChecker};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let options = CheckOptions::default();
///     let checker = DomainChecker::live(&options)?;
///     let request = CheckRequest::new(
///         vec![".com".into(), ".io".into()],
///         vec!["example".into()],
///         options,
///     )?;
///     let response = checker.check(&request).await?;
///     println!("Best: {:?}", response.suggested_best);
///     Ok(())
/// }
/// ```
pub struct DomainChecker {
    bootstrap: Arc<dyn BootstrapSource>,
    rdap: Arc<dyn RdapLookup>,
    dns: Arc<dyn DnsLookup>,
    /// Explicit run log; when unset, a JSONL log beside the cache file is used
    run_log: Option<Arc<dyn RunLog>>,
    retry: RetryPolicy,
}

impl DomainChecker {
    /// Create a checker from explicit collaborators.
    pub fn new(
        bootstrap: Arc<dyn BootstrapSource>,
        rdap: Arc<dyn RdapLookup>,
        dns: Arc<dyn DnsLookup>,
    ) -> Self {
        Self {
            bootstrap,
            rdap,
            dns,
            run_log: None,
            retry: RetryPolicy::default(),
        }
    }

    /// Create a checker that talks to the real IANA registry, RDAP servers
    /// and the system DNS resolver.
    ///
    /// One HTTP client is shared by the bootstrap fetch and all RDAP lookups;
    /// its keep-alive pool is sized to `max_concurrency`.
    pub fn live(options: &CheckOptions) -> Result<Self, DomainScoutError> {
        let timeout = Duration::from_millis(options.timeout_ms);
        let http = build_http_client(timeout, options.max_concurrency)?;

        Ok(Self::new(
            Arc::new(HttpBootstrapSource::new(http.clone())),
            Arc::new(RdapClient::from_client(http)),
            Arc::new(DnsProber::new(timeout)),
        ))
    }

    /// Create a checker with no network collaborators.
    ///
    /// Suitable for requests where [`DomainChecker::needs_network`] is false.
    /// Any lookup that does reach it fails the bootstrap load and reports
    /// unknown evidence.
    pub fn offline() -> Self {
        let offline = Arc::new(Offline);
        Self::new(offline.clone(), offline.clone(), offline)
    }

    /// Whether checking `request` will consult the registry, RDAP or DNS.
    ///
    /// Deterministic requests and requests without a single valid SLD are
    /// answered locally.
    pub fn needs_network(request: &CheckRequest) -> bool {
        !request.options().deterministic_mode && !partition_slds(request.slds()).valid.is_empty()
    }

    pub fn with_bootstrap_source(mut self, source: Arc<dyn BootstrapSource>) -> Self {
        self.bootstrap = source;
        self
    }

    pub fn with_rdap(mut self, rdap: Arc<dyn RdapLookup>) -> Self {
        self.rdap = rdap;
        self
    }

    pub fn with_dns(mut self, dns: Arc<dyn DnsLookup>) -> Self {
        self.dns = dns;
        self
    }

    /// Send live-run summaries to `run_log` instead of the default JSONL file.
    pub fn with_run_log(mut self, run_log: Arc<dyn RunLog>) -> Self {
        self.run_log = Some(run_log);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Check every (SLD, TLD) pair of the request.
    ///
    /// Exactly one result is returned per pair. Per-domain problems are
    /// recorded on the results; only request-level failures are errors.
    ///
    /// # Errors
    ///
    /// - `InvalidTld` if any TLD fails validation (nothing is checked)
    /// - `BootstrapError` if the registry cannot be loaded and no
    ///   `rdap_fallback_base` is configured
    pub async fn check(&self, request: &CheckRequest) -> Result<CheckResponse, DomainScoutError> {
        let options = request.options();
        let tlds = validate_tlds(request.tlds())?;
        let partition = partition_slds(request.slds());

        let mut results = Vec::with_capacity(request.slds().len() * tlds.len());
        for sld in &partition.invalid {
            for tld in &tlds {
                results.push(DomainResult::invalid_sld(format!("{}{}", sld, tld)));
            }
        }

        tracing::info!(
            valid = partition.valid.len(),
            invalid = partition.invalid.len(),
            tlds = tlds.len(),
            deterministic = options.deterministic_mode,
            "Starting domain check"
        );

        let checked_at = if options.deterministic_mode {
            for sld in &partition.valid {
                for tld in &tlds {
                    results.push(simulate_domain(&format!("{}{}", sld, tld), options.deterministic_seed));
                }
            }
            SIMULATED_CHECKED_AT.to_string()
        } else {
            if !partition.valid.is_empty() {
                let bootstrap = self.load_bootstrap(options).await?;
                results.extend(self.check_live(&partition.valid, &tlds, &bootstrap, options).await);
            }
            utc_timestamp()
        };

        sort_results(&mut results);
        let suggested_best =
            choose_suggested_best(&results, &tlds, options.treat_unknown_as_available);

        let response = CheckResponse {
            checked_at,
            results,
            suggested_best,
        };

        let counts = response.counts();
        tracing::info!(
            available = counts.available,
            taken = counts.taken,
            unknown = counts.unknown,
            invalid = counts.invalid,
            suggested_best = ?response.suggested_best,
            "Domain check finished"
        );

        if !options.deterministic_mode {
            self.record_run(options, &response).await;
        }

        Ok(response)
    }

    /// Resolve the bootstrap map, degrading to an empty map when a fallback
    /// base can stand in for every TLD.
    async fn load_bootstrap(&self, options: &CheckOptions) -> Result<BootstrapMap, DomainScoutError> {
        let cache = BootstrapCache::new(
            &options.bootstrap_cache_path,
            Duration::from_secs(options.bootstrap_ttl_seconds),
        );
        match cache.load(self.bootstrap.as_ref()).await {
            Ok(map) => Ok(map),
            Err(e) if options.rdap_fallback_base.is_some() => {
                tracing::warn!(error = %e, "Bootstrap registry unavailable, using rdap_fallback_base for all TLDs");
                Ok(BootstrapMap::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Run the network checks in waves of `batch_size` SLDs.
    ///
    /// Each wave is awaited in full before the next is dispatched; within and
    /// across waves, in-flight checks are bounded by one gate per request.
    async fn check_live(
        &self,
        slds: &[String],
        tlds: &[String],
        bootstrap: &BootstrapMap,
        options: &CheckOptions,
    ) -> Vec<DomainResult> {
        let gate = ConcurrencyGate::new(options.max_concurrency);
        let gate = &gate;
        let waves = wave_sizes(slds.len(), tlds.len(), options.batch_size);
        let mut results = Vec::with_capacity(waves.iter().sum());

        for (index, batch) in sld_batches(slds, options.batch_size).enumerate() {
            tracing::info!(
                wave = index,
                domains = batch.len() * tlds.len(),
                total_waves = waves.len(),
                "Dispatching wave"
            );

            let checks = batch.iter().flat_map(|sld| {
                tlds.iter().map(move |tld| {
                    self.check_one(format!("{}{}", sld, tld), tld, bootstrap, options, gate)
                })
            });
            results.extend(join_all(checks).await);
        }

        results
    }

    /// Run the RDAP → DNS decision chain for one domain.
    async fn check_one(
        &self,
        domain: String,
        tld: &str,
        bootstrap: &BootstrapMap,
        options: &CheckOptions,
        gate: &ConcurrencyGate,
    ) -> DomainResult {
        let _permit = match gate.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                return DomainResult::new(domain, DomainStatus::Unknown, 0.25, CheckMethod::Rdap)
                    .with_error(Some(e.to_string()))
            }
        };

        let base = bootstrap.resolve_base(tld, options.rdap_fallback_base.as_deref());

        let mut rdap: Option<RdapOutcome> = None;
        if options.prefer_rdap {
            if let Some(base) = &base {
                let outcome = lookup_with_retry(self.rdap.as_ref(), &self.retry, base, &domain).await;
                if outcome.status.is_decisive() {
                    return DomainResult::new(domain, outcome.status, outcome.confidence, CheckMethod::Rdap)
                        .with_rdap(Some(base.clone()), outcome.http_status)
                        .with_error(outcome.error);
                }
                rdap = Some(outcome);
            }
        }

        let used_rdap = rdap.is_some();
        let (rdap_status, rdap_confidence, rdap_http, rdap_error) = match rdap {
            Some(outcome) => (outcome.status, outcome.confidence, outcome.http_status, outcome.error),
            None => (DomainStatus::Unknown, 0.25, None, None),
        };

        if options.enable_dns_fallback {
            let evidence = self.dns.probe(&domain).await;
            let (status, confidence) = map_dns_evidence(evidence);
            let method = if used_rdap {
                CheckMethod::RdapDns
            } else {
                CheckMethod::Dns
            };
            return DomainResult::new(domain, status, confidence, method)
                .with_rdap(base, rdap_http)
                .with_dns_evidence(evidence)
                .with_error(rdap_error);
        }

        let method = if used_rdap {
            CheckMethod::Rdap
        } else {
            CheckMethod::Dns
        };
        DomainResult::new(domain, rdap_status, rdap_confidence, method)
            .with_rdap(base, rdap_http)
            .with_error(rdap_error)
    }

    async fn record_run(&self, options: &CheckOptions, response: &CheckResponse) {
        let record = RunRecord::new(options, response);
        let outcome = match &self.run_log {
            Some(log) => log.append(&record).await,
            None => {
                JsonlRunLog::beside_cache(&options.bootstrap_cache_path)
                    .append(&record)
                    .await
            }
        };
        if let Err(e) = outcome {
            tracing::warn!(error = %e, "Could not append run log");
        }
    }
}

/// Stand-in collaborators for runs answered without the network.
struct Offline;

#[async_trait]
impl BootstrapSource for Offline {
    async fn fetch_document(&self) -> Result<serde_json::Value, DomainScoutError> {
        Err(DomainScoutError::bootstrap("no network collaborators configured"))
    }
}

#[async_trait]
impl RdapLookup for Offline {
    async fn lookup(&self, _base: &str, _domain: &str) -> RdapOutcome {
        RdapOutcome::transport_error("offline")
    }
}

#[async_trait]
impl DnsLookup for Offline {
    async fn probe(&self, _domain: &str) -> DnsEvidence {
        DnsEvidence::default()
    }
}

/// Check a request, building live network collaborators only when the
/// request needs them.
///
/// Convenience wrapper around [`DomainChecker::live`] and
/// [`DomainChecker::check`].
pub async fn check(request: &CheckRequest) -> Result<CheckResponse, DomainScoutError> {
    let checker = if DomainChecker::needs_network(request) {
        DomainChecker::live(request.options())?
    } else {
        DomainChecker::offline()
    };
    checker.check(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticBootstrap(Value);

    #[async_trait]
    impl BootstrapSource for StaticBootstrap {
        async fn fetch_document(&self) -> Result<Value, DomainScoutError> {
            Ok(self.0.clone())
        }
    }

    struct FixedRdap {
        outcome: RdapOutcome,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RdapLookup for FixedRdap {
        async fn lookup(&self, _base: &str, _domain: &str) -> RdapOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    struct FixedDns(DnsEvidence);

    #[async_trait]
    impl DnsLookup for FixedDns {
        async fn probe(&self, _domain: &str) -> DnsEvidence {
            self.0
        }
    }

    fn checker(rdap: RdapOutcome, dns: DnsEvidence) -> (DomainChecker, Arc<FixedRdap>) {
        let rdap = Arc::new(FixedRdap {
            outcome: rdap,
            calls: AtomicUsize::new(0),
        });
        let checker = DomainChecker::new(
            Arc::new(StaticBootstrap(json!({
                "services": [[["com"], ["https://rdap.example/"]]]
            }))),
            rdap.clone(),
            Arc::new(FixedDns(dns)),
        )
        .with_retry_policy(RetryPolicy::immediate(2));
        (checker, rdap)
    }

    fn options() -> CheckOptions {
        CheckOptions {
            bootstrap_cache_path: std::env::temp_dir()
                .join(format!("domain-scout-checker-{}", rand::random::<u64>()))
                .join("rdap_dns.json"),
            ..CheckOptions::default()
        }
    }

    #[tokio::test]
    async fn test_decisive_rdap_skips_dns() {
        let (checker, rdap) = checker(RdapOutcome::from_http_status(200), DnsEvidence::nxdomain());
        let gate = ConcurrencyGate::new(1);
        let map = BootstrapMap::from_entries([("com", "https://rdap.example")]);

        let result = checker
            .check_one("alpha.com".into(), ".com", &map, &options(), &gate)
            .await;

        assert_eq!(result.status, DomainStatus::Taken);
        assert_eq!(result.method, CheckMethod::Rdap);
        assert_eq!(result.rdap_server.as_deref(), Some("https://rdap.example"));
        assert_eq!(result.dns_nxdomain, None);
        assert_eq!(rdap.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_inconclusive_rdap_falls_through_to_dns() {
        let (checker, rdap) = checker(RdapOutcome::from_http_status(503), DnsEvidence::ns());
        let gate = ConcurrencyGate::new(1);
        let map = BootstrapMap::from_entries([("com", "https://rdap.example")]);

        let result = checker
            .check_one("alpha.com".into(), ".com", &map, &options(), &gate)
            .await;

        assert_eq!(result.status, DomainStatus::Taken);
        assert_eq!(result.confidence, 0.70);
        assert_eq!(result.method, CheckMethod::RdapDns);
        assert_eq!(result.rdap_http, Some(503));
        assert_eq!(result.dns_ns, Some(true));
        assert_eq!(rdap.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_unknown_tld_without_fallback_uses_dns_only() {
        let (checker, rdap) = checker(RdapOutcome::from_http_status(200), DnsEvidence::nxdomain());
        let gate = ConcurrencyGate::new(1);

        let result = checker
            .check_one("alpha.zz".into(), ".zz", &BootstrapMap::default(), &options(), &gate)
            .await;

        assert_eq!(result.status, DomainStatus::Available);
        assert_eq!(result.method, CheckMethod::Dns);
        assert_eq!(result.rdap_server, None);
        assert_eq!(rdap.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_dns_fallback_keeps_rdap_outcome() {
        let (checker, _) = checker(RdapOutcome::timeout(), DnsEvidence::ns());
        let gate = ConcurrencyGate::new(1);
        let map = BootstrapMap::from_entries([("com", "https://rdap.example")]);
        let options = options().with_dns_fallback(false);

        let result = checker
            .check_one("alpha.com".into(), ".com", &map, &options, &gate)
            .await;

        assert_eq!(result.status, DomainStatus::Unknown);
        assert_eq!(result.confidence, 0.25);
        assert_eq!(result.method, CheckMethod::Rdap);
        assert_eq!(result.error.as_deref(), Some("timeout"));
        assert_eq!(result.dns_ns, None);
    }

    #[tokio::test]
    async fn test_nothing_to_ask_reports_unknown_dns() {
        let (checker, _) = checker(RdapOutcome::from_http_status(200), DnsEvidence::ns());
        let gate = ConcurrencyGate::new(1);
        let options = options().with_dns_fallback(false);

        let result = checker
            .check_one("alpha.zz".into(), ".zz", &BootstrapMap::default(), &options, &gate)
            .await;

        assert_eq!(result.status, DomainStatus::Unknown);
        assert_eq!(result.method, CheckMethod::Dns);
    }

    #[tokio::test]
    async fn test_waves_share_one_gate_and_cover_every_pair() {
        let (checker, rdap) = checker(RdapOutcome::from_http_status(404), DnsEvidence::default());
        let map = BootstrapMap::from_entries([("com", "https://rdap.example"), ("io", "https://rdap.example")]);
        let slds: Vec<String> = ["alpha", "beta", "gamma"].iter().map(|s| s.to_string()).collect();
        let tlds = vec![".com".to_string(), ".io".to_string()];
        let options = options().with_batch_size(2).with_max_concurrency(1);

        let results = checker.check_live(&slds, &tlds, &map, &options).await;

        assert_eq!(results.len(), 6);
        assert!(results.iter().all(|r| r.status == DomainStatus::Available));
        assert_eq!(rdap.calls.load(Ordering::SeqCst), 6);
        let mut domains: Vec<&str> = results.iter().map(|r| r.domain.as_str()).collect();
        domains.sort_unstable();
        assert_eq!(
            domains,
            ["alpha.com", "alpha.io", "beta.com", "beta.io", "gamma.com", "gamma.io"]
        );
    }

    #[test]
    fn test_needs_network_only_for_live_valid_labels() {
        let live = CheckRequest::new(vec![".com".into()], vec!["alpha".into()], CheckOptions::default()).unwrap();
        assert!(DomainChecker::needs_network(&live));

        let simulated = CheckRequest::new(
            vec![".com".into()],
            vec!["alpha".into()],
            CheckOptions::default().with_deterministic_seed(7),
        )
        .unwrap();
        assert!(!DomainChecker::needs_network(&simulated));

        let all_invalid =
            CheckRequest::new(vec![".com".into()], vec!["-bad".into()], CheckOptions::default()).unwrap();
        assert!(!DomainChecker::needs_network(&all_invalid));
    }

    #[tokio::test]
    async fn test_offline_checker_answers_simulated_request() {
        let request = CheckRequest::new(
            vec![".com".into(), ".io".into()],
            vec!["alpha".into()],
            CheckOptions::default().with_deterministic_seed(7),
        )
        .unwrap();

        let response = DomainChecker::offline().check(&request).await.unwrap();
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.checked_at, SIMULATED_CHECKED_AT);
    }

    #[tokio::test]
    async fn test_offline_checker_fails_live_bootstrap() {
        let request =
            CheckRequest::new(vec![".com".into()], vec!["alpha".into()], options()).unwrap();
        let err = DomainChecker::offline().check(&request).await.unwrap_err();
        assert!(matches!(err, DomainScoutError::BootstrapError { .. }));
    }

    #[tokio::test]
    async fn test_live_run_writes_run_log_beside_cache() {
        let (checker, _) = checker(RdapOutcome::from_http_status(404), DnsEvidence::default());
        let options = options();
        let log_path = options
            .bootstrap_cache_path
            .parent()
            .unwrap()
            .join(crate::runlog::RUN_LOG_FILE);
        let request = CheckRequest::new(vec![".com".into()], vec!["alpha".into()], options).unwrap();

        let response = checker.check(&request).await.unwrap();

        assert_eq!(response.suggested_best.as_deref(), Some("alpha.com"));
        assert!(response.checked_at.ends_with('Z'));
        let log = std::fs::read_to_string(&log_path).unwrap();
        assert_eq!(log.lines().count(), 1);
        let _ = std::fs::remove_dir_all(log_path.parent().unwrap());
    }

    #[test]
    fn test_utc_timestamp_format() {
        let ts = utc_timestamp();
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
