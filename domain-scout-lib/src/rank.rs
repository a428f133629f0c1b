//! Result ordering and best-domain selection.

use crate::types::{DomainResult, DomainStatus};
use std::cmp::Ordering;

/// Sort results by TLD, then by full domain name.
pub fn sort_results(results: &mut [DomainResult]) {
    results.sort_by(|a, b| a.tld().cmp(&b.tld()).then_with(|| a.domain.cmp(&b.domain)));
}

/// Pick the preferred domain among the results.
///
/// Available domains are considered first. When there are none and
/// `allow_unknown` is set, unknown domains are considered instead. Taken and
/// invalid domains are never suggested.
///
/// Candidates are ordered by the position of their TLD in `tlds` (unlisted
/// TLDs last), then higher confidence, then shorter name, then name.
pub fn choose_suggested_best(
    results: &[DomainResult],
    tlds: &[String],
    allow_unknown: bool,
) -> Option<String> {
    let pick = |status: DomainStatus| {
        results
            .iter()
            .filter(|r| r.status == status)
            .min_by(|a, b| compare_candidates(a, b, tlds))
            .map(|r| r.domain.clone())
    };

    pick(DomainStatus::Available).or_else(|| {
        if allow_unknown {
            pick(DomainStatus::Unknown)
        } else {
            None
        }
    })
}

fn tld_rank(result: &DomainResult, tlds: &[String]) -> usize {
    let tld = result.tld();
    tlds.iter()
        .position(|t| t.eq_ignore_ascii_case(&tld))
        .unwrap_or(tlds.len() + 1)
}

fn compare_candidates(a: &DomainResult, b: &DomainResult, tlds: &[String]) -> Ordering {
    tld_rank(a, tlds)
        .cmp(&tld_rank(b, tlds))
        .then_with(|| b.confidence.total_cmp(&a.confidence))
        .then_with(|| a.domain.len().cmp(&b.domain.len()))
        .then_with(|| a.domain.cmp(&b.domain))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CheckMethod;

    fn result(domain: &str, status: DomainStatus, confidence: f64) -> DomainResult {
        DomainResult::new(domain, status, confidence, CheckMethod::Rdap)
    }

    fn tlds(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_prefers_available_in_earlier_tld() {
        let results = vec![
            result("alpha.com", DomainStatus::Taken, 0.98),
            result("alpha.de", DomainStatus::Available, 0.80),
            result("alpha.io", DomainStatus::Available, 0.80),
        ];
        let best = choose_suggested_best(&results, &tlds(&[".com", ".de", ".io"]), false);
        assert_eq!(best.as_deref(), Some("alpha.de"));
    }

    #[test]
    fn test_falls_back_to_unknown_when_allowed() {
        let results = vec![
            result("alpha.com", DomainStatus::Unknown, 0.25),
            result("alpha.de", DomainStatus::Taken, 0.98),
        ];
        let list = tlds(&[".com", ".de"]);
        assert_eq!(
            choose_suggested_best(&results, &list, true).as_deref(),
            Some("alpha.com")
        );
        assert_eq!(choose_suggested_best(&results, &list, false), None);
    }

    #[test]
    fn test_none_when_only_taken_or_invalid() {
        let results = vec![
            result("alpha.com", DomainStatus::Taken, 0.98),
            DomainResult::invalid_sld("bad.name.com"),
        ];
        assert_eq!(choose_suggested_best(&results, &tlds(&[".com"]), true), None);
    }

    #[test]
    fn test_tie_breaks_on_confidence_then_length_then_name() {
        let list = tlds(&[".com"]);
        let results = vec![
            result("longername.com", DomainStatus::Available, 0.80),
            result("short.com", DomainStatus::Available, 0.60),
        ];
        assert_eq!(
            choose_suggested_best(&results, &list, false).as_deref(),
            Some("longername.com")
        );

        let results = vec![
            result("bbbb.com", DomainStatus::Available, 0.80),
            result("ccc.com", DomainStatus::Available, 0.80),
            result("aaaa.com", DomainStatus::Available, 0.80),
        ];
        assert_eq!(
            choose_suggested_best(&results, &list, false).as_deref(),
            Some("ccc.com")
        );

        let results = vec![
            result("bbbb.com", DomainStatus::Available, 0.80),
            result("aaaa.com", DomainStatus::Available, 0.80),
        ];
        assert_eq!(
            choose_suggested_best(&results, &list, false).as_deref(),
            Some("aaaa.com")
        );
    }

    #[test]
    fn test_unlisted_tld_ranks_last() {
        let results = vec![
            result("alpha.xyz", DomainStatus::Available, 0.80),
            result("alpha.io", DomainStatus::Available, 0.60),
        ];
        assert_eq!(
            choose_suggested_best(&results, &tlds(&[".io"]), false).as_deref(),
            Some("alpha.io")
        );
    }

    #[test]
    fn test_sort_by_tld_then_domain() {
        let mut results = vec![
            result("beta.io", DomainStatus::Taken, 0.98),
            result("beta.com", DomainStatus::Taken, 0.98),
            result("alpha.io", DomainStatus::Taken, 0.98),
            result("alpha.com", DomainStatus::Taken, 0.98),
        ];
        sort_results(&mut results);
        let order: Vec<&str> = results.iter().map(|r| r.domain.as_str()).collect();
        assert_eq!(order, vec!["alpha.com", "beta.com", "alpha.io", "beta.io"]);
    }
}
