//! Utility functions for label normalization and validation.
//!
//! TLDs are validated strictly: one bad TLD fails the whole request. SLDs are
//! validated per item: a bad SLD only turns its own domains into `invalid`
//! placeholders.

use crate::error::DomainScoutError;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// 2-63 chars of [a-z0-9-], not starting or ending with a hyphen.
    static ref SLD_PATTERN: Regex =
        Regex::new(r"^[a-z0-9][a-z0-9-]{0,61}[a-z0-9]$").expect("SLD pattern is valid");

    /// A leading dot followed by 2-63 chars of [a-z0-9-].
    static ref TLD_PATTERN: Regex =
        Regex::new(r"^\.[a-z0-9-]{2,63}$").expect("TLD pattern is valid");
}

/// SLDs split by validity, normalized and in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SldPartition {
    pub valid: Vec<String>,
    pub invalid: Vec<String>,
}

/// Case-fold a raw label.
pub fn normalize_label(label: &str) -> String {
    label.to_lowercase()
}

/// Check a normalized second-level label.
pub fn is_valid_sld(sld: &str) -> bool {
    SLD_PATTERN.is_match(sld)
}

/// Check a normalized TLD (including its leading dot).
pub fn is_valid_tld(tld: &str) -> bool {
    TLD_PATTERN.is_match(tld)
}

/// Normalize and validate the requested TLDs.
///
/// # Errors
///
/// Returns `DomainScoutError::InvalidTld` for the first TLD that does not
/// match the accepted syntax.
pub fn validate_tlds(tlds: &[String]) -> Result<Vec<String>, DomainScoutError> {
    tlds.iter()
        .map(|tld| {
            let normalized = normalize_label(tld);
            if is_valid_tld(&normalized) {
                Ok(normalized)
            } else {
                Err(DomainScoutError::invalid_tld(normalized))
            }
        })
        .collect()
}

/// Normalize every SLD and classify it once.
pub fn partition_slds(slds: &[String]) -> SldPartition {
    let mut partition = SldPartition::default();
    for sld in slds {
        let normalized = normalize_label(sld);
        if is_valid_sld(&normalized) {
            partition.valid.push(normalized);
        } else {
            partition.invalid.push(normalized);
        }
    }
    partition
}

/// Extract the TLD of a domain, with its leading dot.
///
/// Returns an empty string when the domain has no dot.
pub fn extract_tld(domain: &str) -> String {
    match domain.rsplit_once('.') {
        Some((_, tld)) => format!(".{}", tld.to_lowercase()),
        None => String::new(),
    }
}
