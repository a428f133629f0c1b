//! RDAP bootstrap registry and its on-disk cache.
//!
//! The IANA bootstrap document lists `[[tld, ...], [url, ...]]` service
//! entries. It changes rarely, so it is cached in a JSON file whose
//! modification time decides freshness. Writes go to a unique temporary file
//! that is then renamed over the cache path, so readers never observe a
//! partially written cache.

use crate::error::DomainScoutError;
use async_trait::async_trait;
use rand::Rng;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Public IANA bootstrap document for DNS RDAP services.
pub const IANA_DNS_BOOTSTRAP_URL: &str = "https://data.iana.org/rdap/dns.json";

/// Mapping from bare lowercase TLD ("com") to RDAP base URL.
///
/// Built fresh for every run and never modified once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapMap {
    entries: HashMap<String, String>,
}

impl BootstrapMap {
    /// Flatten a bootstrap document into a TLD map.
    ///
    /// Malformed entries are skipped individually. For each entry the first
    /// URL wins, with any trailing slash removed.
    pub fn from_document(document: &Value) -> Self {
        let mut entries = HashMap::new();

        let services = match document.get("services").and_then(Value::as_array) {
            Some(services) => services,
            None => return Self { entries },
        };

        for service in services {
            let pair = match service.as_array() {
                Some(pair) if pair.len() >= 2 => pair,
                _ => continue,
            };
            let tlds = match pair[0].as_array() {
                Some(tlds) if !tlds.is_empty() => tlds,
                _ => continue,
            };
            let url = match pair[1]
                .as_array()
                .and_then(|urls| urls.first())
                .and_then(Value::as_str)
            {
                Some(url) => url.trim_end_matches('/'),
                None => continue,
            };

            for tld in tlds.iter().filter_map(Value::as_str) {
                entries.insert(tld.to_lowercase(), url.to_string());
            }
        }

        Self { entries }
    }

    /// Build a map from explicit `(tld, base)` pairs.
    pub fn from_entries<I, T, U>(entries: I) -> Self
    where
        I: IntoIterator<Item = (T, U)>,
        T: Into<String>,
        U: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(tld, url)| (tld.into().to_lowercase(), url.into()))
                .collect(),
        }
    }

    /// RDAP base for a TLD, with or without its leading dot.
    pub fn get(&self, tld: &str) -> Option<&str> {
        self.entries
            .get(tld.trim_start_matches('.'))
            .map(String::as_str)
    }

    /// RDAP base for a TLD, falling back to `fallback` (trailing slash removed).
    pub fn resolve_base(&self, tld: &str, fallback: Option<&str>) -> Option<String> {
        self.get(tld)
            .map(str::to_string)
            .or_else(|| fallback.map(|base| base.trim_end_matches('/').to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Where the bootstrap document comes from when the cache is stale.
#[async_trait]
pub trait BootstrapSource: Send + Sync {
    async fn fetch_document(&self) -> Result<Value, DomainScoutError>;
}

/// Fetches the bootstrap document over HTTP.
pub struct HttpBootstrapSource {
    client: reqwest::Client,
    url: String,
}

impl HttpBootstrapSource {
    /// Fetch from the IANA document with the given client.
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_url(client, IANA_DNS_BOOTSTRAP_URL)
    }

    pub fn with_url<U: Into<String>>(client: reqwest::Client, url: U) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl BootstrapSource for HttpBootstrapSource {
    async fn fetch_document(&self) -> Result<Value, DomainScoutError> {
        tracing::debug!(url = %self.url, "Fetching RDAP bootstrap registry");

        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(DomainScoutError::bootstrap(format!(
                "bootstrap registry returned HTTP {}",
                response.status()
            )));
        }

        response.json::<Value>().await.map_err(|e| {
            DomainScoutError::bootstrap(format!("failed to parse bootstrap JSON: {}", e))
        })
    }
}

/// File-backed cache of the bootstrap document.
#[derive(Debug, Clone)]
pub struct BootstrapCache {
    path: PathBuf,
    ttl: Duration,
}

impl BootstrapCache {
    pub fn new<P: Into<PathBuf>>(path: P, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the cache file exists and was modified within the TTL.
    pub async fn is_fresh(&self) -> bool {
        let modified = match tokio::fs::metadata(&self.path).await.and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(_) => return false,
        };
        // A timestamp in the future counts as just written.
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        age < self.ttl
    }

    /// Load the TLD map, from the cache when fresh, otherwise from `source`.
    ///
    /// A fresh cache never touches `source`. A freshly fetched document is
    /// persisted before being parsed; failing to persist is logged, not fatal.
    ///
    /// # Errors
    ///
    /// Propagates the error from `source` when a fetch is needed and fails.
    pub async fn load(&self, source: &dyn BootstrapSource) -> Result<BootstrapMap, DomainScoutError> {
        if self.is_fresh().await {
            match self.read_cached().await {
                Ok(document) => {
                    let map = BootstrapMap::from_document(&document);
                    tracing::debug!(path = %self.path.display(), tlds = map.len(), "Using cached bootstrap registry");
                    return Ok(map);
                }
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "Unreadable bootstrap cache, refetching");
                }
            }
        }

        let document = source.fetch_document().await?;
        if let Err(e) = self.persist(&document).await {
            tracing::warn!(path = %self.path.display(), error = %e, "Could not persist bootstrap cache");
        }

        let map = BootstrapMap::from_document(&document);
        tracing::info!(tlds = map.len(), "Loaded RDAP bootstrap registry");
        Ok(map)
    }

    async fn read_cached(&self) -> Result<Value, DomainScoutError> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            DomainScoutError::file_error(self.path.to_string_lossy(), e.to_string())
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write to a unique sibling temp file, then rename it over the cache path.
    async fn persist(&self, document: &Value) -> Result<(), DomainScoutError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        tokio::fs::create_dir_all(&parent).await?;

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "bootstrap.json".to_string());
        let suffix: u64 = rand::thread_rng().gen();
        let tmp_path = parent.join(format!(".{}.{}.{:016x}.tmp", file_name, std::process::id(), suffix));

        let body = serde_json::to_vec(document)?;
        if let Err(e) = tokio::fs::write(&tmp_path, &body).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&tmp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        Ok(())
    }
}
