//! IANA bootstrap directory: which RDAP server is authoritative for a TLD.
//!
//! The whole directory is cached as one entry with a TTL. Concurrent cache
//! misses are collapsed so only one fetch is in flight at a time; tasks that
//! arrive during a refresh wait for it and reuse its result, including its
//! error when the fetch failed.

use crate::error::RdapCheckError;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

/// Deadline for fetching the bootstrap document itself.
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// One `[[tlds...], [urls...]]` group from the bootstrap document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceGroup {
    /// TLDs served by this group, lower-cased
    pub tlds: Vec<String>,
    /// Candidate RDAP base URLs, in published order
    pub urls: Vec<String>,
}

/// A fetched bootstrap directory.
#[derive(Debug, Clone)]
pub struct BootstrapCacheEntry {
    pub fetched_at: Instant,
    pub mapping: Vec<ServiceGroup>,
}

impl BootstrapCacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }

    /// First URL of the first group that lists `tld`.
    ///
    /// A matching group without URLs yields `None`; later groups are not
    /// consulted.
    pub fn lookup(&self, tld: &str) -> Option<&str> {
        let tld = normalize_tld(tld);
        self.mapping
            .iter()
            .find(|group| group.tlds.iter().any(|t| t.eq_ignore_ascii_case(&tld)))
            .and_then(|group| group.urls.first())
            .map(String::as_str)
    }
}

/// Cached, lazily refreshed view of the bootstrap directory.
pub struct BootstrapDirectory {
    http_client: reqwest::Client,
    url: String,
    ttl: Duration,
    fetch_timeout: Duration,
    cache: RwLock<Option<Arc<BootstrapCacheEntry>>>,
    /// Refresh gate; holds the error of the most recent failed fetch.
    refresh: Mutex<Option<RdapCheckError>>,
    /// Completed fetch attempts, successful or not.
    attempts: AtomicU64,
}

impl BootstrapDirectory {
    /// Create a directory backed by the document at `url`.
    pub fn new(http_client: reqwest::Client, url: impl Into<String>, ttl: Duration) -> Self {
        Self {
            http_client,
            url: url.into(),
            ttl,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            cache: RwLock::new(None),
            refresh: Mutex::new(None),
            attempts: AtomicU64::new(0),
        }
    }

    /// Override the deadline for fetching the document.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Where the document is fetched from.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The current directory, fetching it if absent or older than the TTL.
    ///
    /// A failed fetch is returned as an error to its caller and to every
    /// caller that was waiting on it; a stale entry is never served. The next
    /// call after that fetches again.
    pub async fn directory(&self) -> Result<Arc<BootstrapCacheEntry>, RdapCheckError> {
        if let Some(entry) = self.fresh_entry() {
            return Ok(entry);
        }

        let seen = self.attempts.load(Ordering::Acquire);
        let mut last_error = self.refresh.lock().await;

        // Someone else may have refreshed while we waited.
        if let Some(entry) = self.fresh_entry() {
            return Ok(entry);
        }
        if self.attempts.load(Ordering::Acquire) != seen {
            if let Some(e) = last_error.as_ref() {
                return Err(e.clone());
            }
        }

        let fetched = self.fetch().await;
        self.attempts.fetch_add(1, Ordering::Release);

        let entry = match fetched {
            Ok(entry) => {
                *last_error = None;
                Arc::new(entry)
            }
            Err(e) => {
                warn!(url = %self.url, error = %e, "Bootstrap directory fetch failed");
                *last_error = Some(e.clone());
                return Err(e);
            }
        };

        debug!(
            url = %self.url,
            groups = entry.mapping.len(),
            "Bootstrap directory refreshed"
        );
        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&entry));
        Ok(entry)
    }

    /// Authoritative RDAP base URL for `tld`, if the directory lists one.
    pub async fn lookup(&self, tld: &str) -> Result<Option<String>, RdapCheckError> {
        let directory = self.directory().await?;
        Ok(directory.lookup(tld).map(str::to_string))
    }

    /// Drop the cached directory so the next lookup fetches afresh.
    pub fn invalidate(&self) {
        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Whether a directory is cached and still within its TTL.
    pub fn is_cached(&self) -> bool {
        self.fresh_entry().is_some()
    }

    /// Number of service groups in the cached directory, if any.
    pub fn cached_groups(&self) -> Option<usize> {
        self.fresh_entry().map(|entry| entry.mapping.len())
    }

    fn fresh_entry(&self) -> Option<Arc<BootstrapCacheEntry>> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|entry| entry.is_fresh(self.ttl))
            .cloned()
    }

    async fn fetch(&self) -> Result<BootstrapCacheEntry, RdapCheckError> {
        let request = async {
            let response = self.http_client.get(&self.url).send().await?;

            if !response.status().is_success() {
                return Err(RdapCheckError::bootstrap(format!(
                    "Bootstrap registry returned HTTP {}",
                    response.status()
                )));
            }

            let json: Value = response.json().await.map_err(|e| {
                RdapCheckError::bootstrap(format!("Failed to parse bootstrap JSON: {}", e))
            })?;
            Ok::<_, RdapCheckError>(json)
        };

        let json = tokio::time::timeout(self.fetch_timeout, request)
            .await
            .map_err(|_| RdapCheckError::timeout("bootstrap fetch", self.fetch_timeout))??;

        Ok(BootstrapCacheEntry {
            fetched_at: Instant::now(),
            mapping: parse_services(&json)?,
        })
    }
}

/// Parse the `services` array of a bootstrap document.
///
/// Entries without a TLD list are skipped individually; only a missing
/// `services` array fails the whole document.
pub fn parse_services(json: &Value) -> Result<Vec<ServiceGroup>, RdapCheckError> {
    let services = json
        .get("services")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            RdapCheckError::bootstrap("Invalid bootstrap JSON: missing or invalid 'services' array")
        })?;

    let groups = services
        .iter()
        .enumerate()
        .filter_map(|(index, service)| {
            let group = parse_group(service);
            if group.is_none() {
                trace!(index, "Skipping malformed bootstrap service entry");
            }
            group
        })
        .collect();

    Ok(groups)
}

fn parse_group(service: &Value) -> Option<ServiceGroup> {
    let parts = service.as_array()?;
    let tlds = parts.first()?.as_array()?;

    // A missing or broken server list still claims its TLDs, so a later
    // group cannot answer for them. Only the leading run of string URLs is
    // kept; a malformed first URL leaves the group without servers.
    let urls = parts
        .get(1)
        .and_then(Value::as_array)
        .map(|urls| {
            urls.iter()
                .map_while(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(ServiceGroup {
        tlds: tlds
            .iter()
            .filter_map(Value::as_str)
            .map(normalize_tld)
            .collect(),
        urls,
    })
}

fn normalize_tld(tld: &str) -> String {
    tld.trim().trim_start_matches('.').to_lowercase()
}
