//! Configuration loading, validation and request decoding.
//!
//! Options are layered with increasing precedence:
//! 1. Built-in defaults (`CheckOptions::default()`)
//! 2. TOML config files (`[defaults]` table)
//! 3. `DS_*` environment variables
//! 4. The `options` object of the JSON request itself

use crate::error::DomainScoutError;
use crate::types::{CheckOptions, CheckRequest};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Maximum number of TLDs in one request.
pub const MAX_TLDS: usize = 3;

/// Maximum number of SLDs in one request.
pub const MAX_SLDS: usize = 5000;

impl CheckOptions {
    /// Check every option against its accepted range.
    ///
    /// # Errors
    ///
    /// Returns `DomainScoutError::InvalidRequest` naming the first offending option.
    pub fn validate(&self) -> Result<(), DomainScoutError> {
        if !(100..=30_000).contains(&self.timeout_ms) {
            return Err(DomainScoutError::invalid_request(format!(
                "timeout_ms must be between 100 and 30000, got {}",
                self.timeout_ms
            )));
        }
        if !(1..=200).contains(&self.max_concurrency) {
            return Err(DomainScoutError::invalid_request(format!(
                "max_concurrency must be between 1 and 200, got {}",
                self.max_concurrency
            )));
        }
        if !(1..=1000).contains(&self.batch_size) {
            return Err(DomainScoutError::invalid_request(format!(
                "batch_size must be between 1 and 1000, got {}",
                self.batch_size
            )));
        }
        if self.bootstrap_ttl_seconds < 60 {
            return Err(DomainScoutError::invalid_request(format!(
                "bootstrap_ttl_seconds must be at least 60, got {}",
                self.bootstrap_ttl_seconds
            )));
        }
        if self.bootstrap_cache_path.as_os_str().is_empty() {
            return Err(DomainScoutError::invalid_request(
                "bootstrap_cache_path cannot be empty",
            ));
        }
        Ok(())
    }
}

/// Wire shape of a request before validation.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRequest {
    tlds: Vec<String>,
    slds: Vec<String>,
    #[serde(default)]
    options: CheckOptions,
}

impl CheckRequest {
    /// Build a request, checking its shape and options.
    ///
    /// TLD syntax is checked later, when the request is run.
    ///
    /// # Errors
    ///
    /// Returns `DomainScoutError::InvalidRequest` if there are not 1-3
    /// distinct TLDs, not 1-5000 SLDs, or an option is out of range.
    pub fn new(
        tlds: Vec<String>,
        slds: Vec<String>,
        options: CheckOptions,
    ) -> Result<Self, DomainScoutError> {
        if tlds.is_empty() || tlds.len() > MAX_TLDS {
            return Err(DomainScoutError::invalid_request(format!(
                "expected 1 to {} TLDs, got {}",
                MAX_TLDS,
                tlds.len()
            )));
        }
        let mut seen = HashSet::new();
        for tld in &tlds {
            if !seen.insert(tld.to_lowercase()) {
                return Err(DomainScoutError::invalid_request(format!(
                    "duplicate TLD: {}",
                    tld
                )));
            }
        }
        if slds.is_empty() || slds.len() > MAX_SLDS {
            return Err(DomainScoutError::invalid_request(format!(
                "expected 1 to {} SLDs, got {}",
                MAX_SLDS,
                slds.len()
            )));
        }
        options.validate()?;

        Ok(Self {
            tlds,
            slds,
            options,
        })
    }

    /// Decode and validate a JSON request using the built-in option defaults.
    pub fn from_json(input: &str) -> Result<Self, DomainScoutError> {
        Self::from_json_with_defaults(input, &CheckOptions::default())
    }

    /// Decode and validate a JSON request.
    ///
    /// Options missing from the request's `options` object are taken from
    /// `defaults` rather than the built-in values.
    pub fn from_json_with_defaults(
        input: &str,
        defaults: &CheckOptions,
    ) -> Result<Self, DomainScoutError> {
        let mut value: serde_json::Value = serde_json::from_str(input)
            .map_err(|e| DomainScoutError::invalid_request(format!("malformed JSON: {}", e)))?;

        let object = value
            .as_object_mut()
            .ok_or_else(|| DomainScoutError::invalid_request("request must be a JSON object"))?;

        let mut merged = serde_json::to_value(defaults)?;
        if let Some(overrides) = object.remove("options") {
            let overrides = match overrides {
                serde_json::Value::Object(map) => map,
                _ => {
                    return Err(DomainScoutError::invalid_request(
                        "options must be a JSON object",
                    ))
                }
            };
            if let Some(base) = merged.as_object_mut() {
                for (key, val) in overrides {
                    base.insert(key, val);
                }
            }
        }
        object.insert("options".to_string(), merged);

        let raw: RawRequest = serde_json::from_value(value)
            .map_err(|e| DomainScoutError::invalid_request(e.to_string()))?;

        Self::new(raw.tlds, raw.slds, raw.options)
    }
}

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Default option values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
}

/// Option defaults; every field is optional so files can stay sparse.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DefaultsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefer_rdap: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_dns_fallback: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub treat_unknown_as_available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap_cache_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap_ttl_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rdap_fallback_base: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deterministic_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deterministic_seed: Option<u64>,
}

impl DefaultsConfig {
    /// Overwrite the fields of `options` that this config sets.
    pub fn apply_to(&self, options: &mut CheckOptions) {
        if let Some(v) = self.timeout_ms {
            options.timeout_ms = v;
        }
        if let Some(v) = self.max_concurrency {
            options.max_concurrency = v;
        }
        if let Some(v) = self.batch_size {
            options.batch_size = v;
        }
        if let Some(v) = self.prefer_rdap {
            options.prefer_rdap = v;
        }
        if let Some(v) = self.enable_dns_fallback {
            options.enable_dns_fallback = v;
        }
        if let Some(v) = self.treat_unknown_as_available {
            options.treat_unknown_as_available = v;
        }
        if let Some(v) = &self.bootstrap_cache_path {
            options.bootstrap_cache_path = v.clone();
        }
        if let Some(v) = self.bootstrap_ttl_seconds {
            options.bootstrap_ttl_seconds = v;
        }
        if let Some(v) = &self.rdap_fallback_base {
            options.rdap_fallback_base = Some(v.clone());
        }
        if let Some(v) = self.deterministic_mode {
            options.deterministic_mode = v;
        }
        if let Some(v) = self.deterministic_seed {
            options.deterministic_seed = v;
        }
    }

    /// Combine two layers, values from `higher` winning.
    fn merge(self, higher: Self) -> Self {
        Self {
            timeout_ms: higher.timeout_ms.or(self.timeout_ms),
            max_concurrency: higher.max_concurrency.or(self.max_concurrency),
            batch_size: higher.batch_size.or(self.batch_size),
            prefer_rdap: higher.prefer_rdap.or(self.prefer_rdap),
            enable_dns_fallback: higher.enable_dns_fallback.or(self.enable_dns_fallback),
            treat_unknown_as_available: higher
                .treat_unknown_as_available
                .or(self.treat_unknown_as_available),
            bootstrap_cache_path: higher.bootstrap_cache_path.or(self.bootstrap_cache_path),
            bootstrap_ttl_seconds: higher.bootstrap_ttl_seconds.or(self.bootstrap_ttl_seconds),
            rdap_fallback_base: higher.rdap_fallback_base.or(self.rdap_fallback_base),
            deterministic_mode: higher.deterministic_mode.or(self.deterministic_mode),
            deterministic_seed: higher.deterministic_seed.or(self.deterministic_seed),
        }
    }
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to log which files were picked up
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, DomainScoutError> {
        let path = path.as_ref();

        let content = fs::read_to_string(path).map_err(|e| {
            DomainScoutError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content)?;

        if self.verbose {
            tracing::info!(path = %path.display(), "Loaded configuration file");
        }

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// The XDG config is loaded first, then `./domain-scout.toml` on top.
    /// A file that fails to parse is an error; a missing file is skipped.
    pub fn discover_and_load(&self) -> Result<FileConfig, DomainScoutError> {
        let mut merged = DefaultsConfig::default();

        for path in [self.get_xdg_config_path(), self.get_local_config_path()]
            .into_iter()
            .flatten()
        {
            if let Some(defaults) = self.load_file(&path)?.defaults {
                merged = merged.merge(defaults);
            }
        }

        Ok(FileConfig {
            defaults: Some(merged),
        })
    }

    /// Looks for a configuration file in the current directory.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        ["./domain-scout.toml", "./.domain-scout.toml"]
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
            .map(Path::to_path_buf)
    }

    /// Follows the XDG Base Directory Specification.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("domain-scout").join("config.toml");
        if path.exists() {
            Some(path)
        } else {
            None
        }
    }
}

/// Read option overrides from `DS_*` environment variables.
///
/// Unparseable values are skipped with a warning.
pub fn load_env_config() -> DefaultsConfig {
    load_env_config_from(|key| env::var(key).ok())
}

/// Same as [`load_env_config`] with an injectable variable lookup.
pub fn load_env_config_from<F>(lookup: F) -> DefaultsConfig
where
    F: Fn(&str) -> Option<String>,
{
    fn parsed<T: std::str::FromStr>(key: &str, raw: Option<String>) -> Option<T> {
        let raw = raw?;
        match raw.trim().parse::<T>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(variable = key, value = %raw, "Ignoring unparseable environment value");
                None
            }
        }
    }

    fn flag(key: &str, raw: Option<String>) -> Option<bool> {
        let raw = raw?;
        match raw.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => {
                tracing::warn!(variable = key, value = %raw, "Ignoring unparseable environment flag");
                None
            }
        }
    }

    DefaultsConfig {
        timeout_ms: parsed("DS_TIMEOUT_MS", lookup("DS_TIMEOUT_MS")),
        max_concurrency: parsed("DS_MAX_CONCURRENCY", lookup("DS_MAX_CONCURRENCY")),
        batch_size: parsed("DS_BATCH_SIZE", lookup("DS_BATCH_SIZE")),
        deterministic_mode: flag("DS_DETERMINISTIC", lookup("DS_DETERMINISTIC")),
        deterministic_seed: parsed("DS_SEED", lookup("DS_SEED")),
        bootstrap_cache_path: lookup("DS_CACHE_PATH")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from),
        rdap_fallback_base: lookup("DS_RDAP_FALLBACK_BASE").filter(|s| !s.trim().is_empty()),
        ..DefaultsConfig::default()
    }
}

/// Resolve option defaults from files and environment.
///
/// `explicit_path` replaces file discovery when set.
pub fn resolve_defaults(
    manager: &ConfigManager,
    explicit_path: Option<&Path>,
) -> Result<CheckOptions, DomainScoutError> {
    let file = match explicit_path {
        Some(path) => manager.load_file(path)?,
        None => manager.discover_and_load()?,
    };

    let layered = file
        .defaults
        .unwrap_or_default()
        .merge(load_env_config());

    let mut options = CheckOptions::default();
    layered.apply_to(&mut options);
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_request_rejects_too_many_tlds() {
        let err = CheckRequest::new(
            strings(&[".com", ".net", ".io", ".ai"]),
            strings(&["alpha"]),
            CheckOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainScoutError::InvalidRequest { .. }));
    }

    #[test]
    fn test_request_rejects_duplicate_tlds() {
        let result = CheckRequest::new(
            strings(&[".com", ".COM"]),
            strings(&["alpha"]),
            CheckOptions::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_request_rejects_empty_and_oversized_sld_lists() {
        assert!(CheckRequest::new(strings(&[".com"]), vec![], CheckOptions::default()).is_err());

        let many: Vec<String> = (0..=MAX_SLDS).map(|i| format!("brand{}", i)).collect();
        assert!(CheckRequest::new(strings(&[".com"]), many, CheckOptions::default()).is_err());
    }

    #[test]
    fn test_options_ranges() {
        assert!(CheckOptions::default().validate().is_ok());

        let mut options = CheckOptions::default();
        options.timeout_ms = 99;
        assert!(options.validate().is_err());

        let options = CheckOptions::default().with_max_concurrency(201);
        assert!(options.validate().is_err());

        let options = CheckOptions::default().with_batch_size(0);
        assert!(options.validate().is_err());

        let mut options = CheckOptions::default();
        options.bootstrap_ttl_seconds = 59;
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let request = CheckRequest::from_json(
            r#"{"tlds": [".com"], "slds": ["alpha"], "options": {"batch_size": 40}}"#,
        )
        .unwrap();
        assert_eq!(request.options().batch_size, 40);
        assert_eq!(request.options().timeout_ms, 2500);
    }

    #[test]
    fn test_from_json_rejects_unknown_fields() {
        assert!(CheckRequest::from_json(r#"{"tlds": [".com"], "slds": ["a1"], "extra": 1}"#).is_err());
        assert!(CheckRequest::from_json(
            r#"{"tlds": [".com"], "slds": ["a1"], "options": {"turbo": true}}"#
        )
        .is_err());
    }

    #[test]
    fn test_from_json_request_options_override_layered_defaults() {
        let defaults = CheckOptions::default().with_batch_size(10).with_max_concurrency(5);
        let request = CheckRequest::from_json_with_defaults(
            r#"{"tlds": [".com"], "slds": ["alpha"], "options": {"max_concurrency": 7}}"#,
            &defaults,
        )
        .unwrap();
        assert_eq!(request.options().batch_size, 10);
        assert_eq!(request.options().max_concurrency, 7);
    }

    #[test]
    fn test_load_file_parses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("domain-scout.toml");
        fs::write(
            &path,
            "[defaults]\ntimeout_ms = 5000\ndeterministic_mode = true\n",
        )
        .unwrap();

        let config = ConfigManager::new(false).load_file(&path).unwrap();
        let defaults = config.defaults.unwrap();
        assert_eq!(defaults.timeout_ms, Some(5000));
        assert_eq!(defaults.deterministic_mode, Some(true));
        assert_eq!(defaults.batch_size, None);
    }

    #[test]
    fn test_load_file_rejects_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[defaults]\nconcurrency = 5\n").unwrap();

        let err = ConfigManager::new(false).load_file(&path).unwrap_err();
        assert!(matches!(err, DomainScoutError::ConfigError { .. }));
    }

    #[test]
    fn test_env_config_parses_and_skips_garbage() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("DS_TIMEOUT_MS", "4000"),
            ("DS_MAX_CONCURRENCY", "lots"),
            ("DS_DETERMINISTIC", "yes"),
            ("DS_SEED", "42"),
        ]);
        let env = load_env_config_from(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(env.timeout_ms, Some(4000));
        assert_eq!(env.max_concurrency, None);
        assert_eq!(env.deterministic_mode, Some(true));
        assert_eq!(env.deterministic_seed, Some(42));
    }

    #[test]
    fn test_merge_prefers_higher_layer() {
        let lower = DefaultsConfig {
            timeout_ms: Some(1000),
            batch_size: Some(50),
            ..DefaultsConfig::default()
        };
        let higher = DefaultsConfig {
            timeout_ms: Some(3000),
            ..DefaultsConfig::default()
        };
        let merged = lower.merge(higher);
        assert_eq!(merged.timeout_ms, Some(3000));
        assert_eq!(merged.batch_size, Some(50));

        let mut options = CheckOptions::default();
        merged.apply_to(&mut options);
        assert_eq!(options.timeout_ms, 3000);
        assert_eq!(options.batch_size, 50);
    }
}
