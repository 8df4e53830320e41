//! # RDAP Check Library
//!
//! Resolves whether domain names are registered by asking the RDAP
//! ecosystem: a well-known aggregator first, then, when that answer is
//! inconclusive, the authoritative registry server listed in the IANA
//! bootstrap directory.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rdap_check_lib::{DomainChecker, CheckConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let checker = DomainChecker::with_config(CheckConfig::default())?;
//!     let result = checker.check_domain("example.com").await?;
//!
//!     println!("{}: {}", result.domain, result.status);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Tri-state results**: available, registered or unknown, never a guess
//! - **Authoritative fallback**: bootstrap-directed second opinion
//! - **Bounded concurrency**: order-preserving batches or as-completed streams
//! - **Failure isolation**: one bad network call never aborts a batch

pub use aggregate::{classify, summarize, BatchSummary};
pub use checker::DomainChecker;
pub use concurrent::{
    effective_concurrency, run_batch, run_streaming, stream_outcomes, Outcome, StreamSummary,
};
pub use config::{
    load_env_config, load_env_config_from, parse_timeout_string, ConfigManager, DefaultsConfig,
    EnvConfig, FileConfig,
};
pub use error::RdapCheckError;
pub use protocols::{interpret, BootstrapDirectory, Interpretation, RdapClient};
pub use types::{
    AvailabilityStatus, BatchStatus, CheckConfig, CheckOptions, CheckResult,
    DEFAULT_AGGREGATOR_URL, DEFAULT_BOOTSTRAP_TTL, DEFAULT_BOOTSTRAP_URL,
};
pub use utils::{extract_tld, is_valid_domain, parse_domain_lines, validate_domain};

// Public modules
pub mod protocols;

// Internal modules - these are not part of the public API
mod aggregate;
mod checker;
mod concurrent;
mod config;
mod error;
mod types;
mod utils;

use lazy_static::lazy_static;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, RdapCheckError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

lazy_static! {
    /// Checker behind the free functions, configured from the environment.
    static ref DEFAULT_CHECKER: Result<DomainChecker> =
        DomainChecker::with_config(load_env_config().apply_to(CheckConfig::default()));
}

fn default_checker() -> Result<&'static DomainChecker> {
    DEFAULT_CHECKER.as_ref().map_err(Clone::clone)
}

/// Check one domain using the process-wide default checker.
///
/// Callers that need isolation (tests, custom endpoints) should build their
/// own `DomainChecker` instead.
pub async fn check_domain(domain: &str, options: &CheckOptions) -> Result<CheckResult> {
    default_checker()?.check_domain_with(domain, options).await
}

/// Drop the default checker's cached bootstrap directory.
pub fn invalidate_bootstrap_cache() {
    if let Ok(checker) = default_checker() {
        checker.invalidate_bootstrap_cache();
    }
}
