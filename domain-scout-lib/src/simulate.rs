//! Deterministic offline simulation of the network path.
//!
//! The first byte of `SHA-256("{seed}:{domain}")` picks a bucket in
//! `[0, 256)`. The thresholds are fixed so that every implementation using
//! the same seed produces the same results.

use crate::types::{CheckMethod, DomainResult, DomainStatus};
use sha2::{Digest, Sha256};

/// `rdap_server` value marking a simulated result.
pub const SIMULATED_RDAP_SERVER: &str = "deterministic://offline";

/// `checked_at` value of every simulated response.
pub const SIMULATED_CHECKED_AT: &str = "1970-01-01T00:00:00Z";

/// Buckets below this are simulated as taken.
const TAKEN_BELOW: u8 = 150;

/// Buckets below this (and at least `TAKEN_BELOW`) are simulated as available.
const AVAILABLE_BELOW: u8 = 235;

/// Hash bucket of a domain under a seed.
pub fn bucket(seed: u64, domain: &str) -> u8 {
    let digest = Sha256::digest(format!("{}:{}", seed, domain).as_bytes());
    digest[0]
}

/// Simulated result for one domain.
pub fn simulate_domain(domain: &str, seed: u64) -> DomainResult {
    let (status, confidence, http_status, error) = match bucket(seed, domain) {
        b if b < TAKEN_BELOW => (DomainStatus::Taken, 0.98, 200, None),
        b if b < AVAILABLE_BELOW => (DomainStatus::Available, 0.80, 404, None),
        _ => (
            DomainStatus::Unknown,
            0.25,
            503,
            Some("deterministic_unknown".to_string()),
        ),
    };

    DomainResult::new(domain, status, confidence, CheckMethod::Rdap)
        .with_rdap(Some(SIMULATED_RDAP_SERVER.to_string()), Some(http_status))
        .with_error(error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_is_stable() {
        assert_eq!(bucket(17, "alpha.com"), bucket(17, "alpha.com"));
    }

    #[test]
    fn test_bucket_matches_sha256_first_byte() {
        // sha256("17:alpha.com") computed independently of this module.
        let digest = Sha256::digest(b"17:alpha.com");
        assert_eq!(bucket(17, "alpha.com"), digest[0]);
    }

    #[test]
    fn test_simulated_result_shape() {
        let result = simulate_domain("alpha.com", 17);
        assert_eq!(result.method, CheckMethod::Rdap);
        assert_eq!(result.rdap_server.as_deref(), Some(SIMULATED_RDAP_SERVER));
        match result.status {
            DomainStatus::Taken => {
                assert_eq!(result.rdap_http, Some(200));
                assert_eq!(result.confidence, 0.98);
            }
            DomainStatus::Available => {
                assert_eq!(result.rdap_http, Some(404));
                assert_eq!(result.confidence, 0.80);
            }
            DomainStatus::Unknown => {
                assert_eq!(result.rdap_http, Some(503));
                assert_eq!(result.error.as_deref(), Some("deterministic_unknown"));
            }
            DomainStatus::Invalid => panic!("simulation never yields invalid"),
        }
    }

    #[test]
    fn test_all_buckets_are_reachable() {
        let mut seen_taken = false;
        let mut seen_available = false;
        let mut seen_unknown = false;
        for i in 0..500 {
            match simulate_domain(&format!("brand{}.com", i), 17).status {
                DomainStatus::Taken => seen_taken = true,
                DomainStatus::Available => seen_available = true,
                DomainStatus::Unknown => seen_unknown = true,
                DomainStatus::Invalid => unreachable!(),
            }
        }
        assert!(seen_taken && seen_available && seen_unknown);
    }

    #[test]
    fn test_seed_changes_assignment() {
        let domains: Vec<String> = ["agentforge", "codepilot"]
            .iter()
            .flat_map(|sld| [".com", ".ai", ".io"].map(|tld| format!("{}{}", sld, tld)))
            .collect();
        let with_seed = |seed| -> Vec<(DomainStatus, Option<u16>)> {
            domains
                .iter()
                .map(|d| {
                    let r = simulate_domain(d, seed);
                    (r.status, r.rdap_http)
                })
                .collect()
        };
        assert_ne!(with_seed(1), with_seed(2));
    }
}
