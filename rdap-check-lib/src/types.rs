//! Core data types for RDAP registration checks.
//!
//! This module defines the per-domain result, the per-call options, the
//! client configuration and the batch-level summary handed to callers.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default aggregator that redirects to the right registry for most TLDs.
pub const DEFAULT_AGGREGATOR_URL: &str = "https://rdap.org";

/// IANA-published TLD to RDAP server mapping.
pub const DEFAULT_BOOTSTRAP_URL: &str = "https://data.iana.org/rdap/dns.json";

/// How long a fetched bootstrap directory stays valid.
pub const DEFAULT_BOOTSTRAP_TTL: Duration = Duration::from_secs(3600);

/// Registration status of a single domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityStatus {
    /// No registration record exists
    Available,
    /// A registration record exists
    Registered,
    /// No definitive answer could be obtained
    Unknown,
}

impl AvailabilityStatus {
    /// Available and registered are definitive; unknown is not.
    pub fn is_definitive(self) -> bool {
        !matches!(self, AvailabilityStatus::Unknown)
    }
}

impl std::fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AvailabilityStatus::Available => write!(f, "available"),
            AvailabilityStatus::Registered => write!(f, "registered"),
            AvailabilityStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Result of resolving one domain.
///
/// Exactly one of these is produced per requested domain, however many
/// HTTP queries it took to get there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    /// The domain name that was checked (e.g., "example.com")
    pub domain: String,

    /// Tri-state registration status
    pub status: AvailabilityStatus,

    /// HTTP status of the response the status was derived from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,

    /// `errorCode` embedded in the RDAP body, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u16>,

    /// Host (aggregator) or base URL (authoritative server) that answered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Wall time of the query that produced this result
    pub response_time_ms: u64,
}

impl CheckResult {
    /// An `unknown` result for a domain that never got a usable response.
    pub fn unreachable(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            status: AvailabilityStatus::Unknown,
            http_status: None,
            error_code: None,
            source: None,
            response_time_ms: 0,
        }
    }
}

/// Per-call knobs for a single resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOptions {
    /// Deadline for each individual HTTP query
    pub timeout: Duration,

    /// Whether to consult the authoritative server when the aggregator is inconclusive
    pub fallback: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(8),
            fallback: true,
        }
    }
}

/// Configuration for a `DomainChecker`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Maximum number of in-flight domain checks.
    /// Default: 10, Range: 1-100
    pub concurrency: usize,

    /// Deadline for each individual HTTP query.
    /// Default: 8 seconds
    #[serde(skip)]
    pub timeout: Duration,

    /// Whether to fall back to the authoritative server.
    /// Default: true
    pub fallback: bool,

    /// Base URL of the aggregator queried first
    pub aggregator_url: String,

    /// Location of the bootstrap directory document
    pub bootstrap_url: String,

    /// Lifetime of a fetched bootstrap directory.
    /// Default: 1 hour
    #[serde(skip)]
    pub bootstrap_ttl: Duration,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for CheckConfig {
    fn default() -> Self {
        let options = CheckOptions::default();
        Self {
            concurrency: 10,
            timeout: options.timeout,
            fallback: options.fallback,
            aggregator_url: DEFAULT_AGGREGATOR_URL.to_string(),
            bootstrap_url: DEFAULT_BOOTSTRAP_URL.to_string(),
            bootstrap_ttl: DEFAULT_BOOTSTRAP_TTL,
            user_agent: format!("rdap-check/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl CheckConfig {
    /// Set concurrency, capped at 100 and floored at 1.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, 100);
        self
    }

    /// Set the per-query timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable or disable the authoritative fallback.
    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback = enabled;
        self
    }

    /// Point the checker at a different aggregator.
    pub fn with_aggregator_url(mut self, url: impl Into<String>) -> Self {
        self.aggregator_url = url.into();
        self
    }

    /// Point the checker at a different bootstrap document.
    pub fn with_bootstrap_url(mut self, url: impl Into<String>) -> Self {
        self.bootstrap_url = url.into();
        self
    }

    /// Override how long a fetched bootstrap directory is trusted.
    pub fn with_bootstrap_ttl(mut self, ttl: Duration) -> Self {
        self.bootstrap_ttl = ttl;
        self
    }

    /// The per-call subset of this configuration.
    pub fn options(&self) -> CheckOptions {
        CheckOptions {
            timeout: self.timeout,
            fallback: self.fallback,
        }
    }
}

/// Overall classification of a batch of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    /// Every domain is available
    Available,
    /// Every domain is registered
    Registered,
    /// A definitive mix of available and registered
    Mixed,
    /// At least one domain could not be resolved
    Error,
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchStatus::Available => write!(f, "available"),
            BatchStatus::Registered => write!(f, "registered"),
            BatchStatus::Mixed => write!(f, "mixed"),
            BatchStatus::Error => write!(f, "error"),
        }
    }
}
