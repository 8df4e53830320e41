//! Configuration file parsing and environment overrides.
//!
//! Precedence, lowest to highest: built-in defaults, config files,
//! `RDAP_CHECK_*` environment variables, then whatever the caller applies
//! on top (CLI flags).

use crate::error::RdapCheckError;
use crate::types::CheckConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for checker settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
}

/// The `[defaults]` table.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Per-query timeout (e.g. "5s", "1500ms", "1m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregator_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap_url: Option<String>,
}

impl FileConfig {
    /// Apply file defaults on top of `config`.
    pub fn apply_to(&self, mut config: CheckConfig) -> CheckConfig {
        let Some(defaults) = &self.defaults else {
            return config;
        };

        if let Some(concurrency) = defaults.concurrency {
            config = config.with_concurrency(concurrency);
        }
        if let Some(timeout) = defaults.timeout.as_deref().and_then(parse_timeout_string) {
            config = config.with_timeout(timeout);
        }
        if let Some(fallback) = defaults.fallback {
            config = config.with_fallback(fallback);
        }
        if let Some(url) = &defaults.aggregator_url {
            config = config.with_aggregator_url(url.clone());
        }
        if let Some(url) = &defaults.bootstrap_url {
            config = config.with_bootstrap_url(url.clone());
        }
        config
    }
}

/// Configuration discovery and loading.
#[derive(Debug, Default)]
pub struct ConfigManager;

impl ConfigManager {
    pub fn new() -> Self {
        Self
    }

    /// Load and validate configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, RdapCheckError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(RdapCheckError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            RdapCheckError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content)?;
        self.validate_config(&config)?;

        debug!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Discover and merge configuration files in precedence order.
    ///
    /// XDG config is lowest, then the home directory file, then the file in
    /// the current directory. Missing files are skipped; a file that exists
    /// but is invalid is an error.
    pub fn discover_and_load(&self) -> Result<FileConfig, RdapCheckError> {
        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        let mut merged = FileConfig::default();
        for path in candidates.into_iter().flatten() {
            if path.exists() {
                let config = self.load_file(&path)?;
                merged = self.merge_configs(merged, config);
            }
        }

        Ok(merged)
    }

    fn get_local_config_path(&self) -> Option<PathBuf> {
        ["./rdap-check.toml", "./.rdap-check.toml"]
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    fn get_global_config_path(&self) -> Option<PathBuf> {
        env::var_os("HOME").map(|home| Path::new(&home).join(".rdap-check.toml"))
    }

    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;
        Some(config_dir.join("rdap-check").join("config.toml"))
    }

    /// Merge two configurations; values in `higher` win.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        let defaults = match (lower.defaults, higher.defaults) {
            (Some(lower), Some(higher)) => Some(DefaultsConfig {
                concurrency: higher.concurrency.or(lower.concurrency),
                timeout: higher.timeout.or(lower.timeout),
                fallback: higher.fallback.or(lower.fallback),
                aggregator_url: higher.aggregator_url.or(lower.aggregator_url),
                bootstrap_url: higher.bootstrap_url.or(lower.bootstrap_url),
            }),
            (lower, higher) => higher.or(lower),
        };

        FileConfig { defaults }
    }

    /// Check ranges, timeout syntax and URL schemes.
    pub fn validate_config(&self, config: &FileConfig) -> Result<(), RdapCheckError> {
        let Some(defaults) = &config.defaults else {
            return Ok(());
        };

        if let Some(concurrency) = defaults.concurrency {
            if concurrency == 0 || concurrency > 100 {
                return Err(RdapCheckError::config(
                    "Concurrency must be between 1 and 100",
                ));
            }
        }

        if let Some(timeout) = &defaults.timeout {
            if parse_timeout_string(timeout).is_none() {
                return Err(RdapCheckError::config(format!(
                    "Invalid timeout format '{}'. Use format like '5s', '1500ms', '2m'",
                    timeout
                )));
            }
        }

        for url in [&defaults.aggregator_url, &defaults.bootstrap_url]
            .into_iter()
            .flatten()
        {
            validate_http_url(url)?;
        }

        Ok(())
    }
}

/// Settings read from `RDAP_CHECK_*` environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvConfig {
    pub concurrency: Option<usize>,
    pub timeout: Option<Duration>,
    pub fallback: Option<bool>,
    pub aggregator_url: Option<String>,
    pub bootstrap_url: Option<String>,
}

impl EnvConfig {
    /// Apply environment overrides on top of `config`.
    pub fn apply_to(&self, mut config: CheckConfig) -> CheckConfig {
        if let Some(concurrency) = self.concurrency {
            config = config.with_concurrency(concurrency);
        }
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }
        if let Some(fallback) = self.fallback {
            config = config.with_fallback(fallback);
        }
        if let Some(url) = &self.aggregator_url {
            config = config.with_aggregator_url(url.clone());
        }
        if let Some(url) = &self.bootstrap_url {
            config = config.with_bootstrap_url(url.clone());
        }
        config
    }
}

/// Load configuration from the process environment.
///
/// Invalid values are logged and ignored.
pub fn load_env_config() -> EnvConfig {
    load_env_config_from(|key| env::var(key).ok())
}

/// Load configuration through an arbitrary variable lookup.
pub fn load_env_config_from<F>(lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    if let Some(val) = lookup("RDAP_CHECK_CONCURRENCY") {
        match val.trim().parse::<usize>() {
            Ok(concurrency) if (1..=100).contains(&concurrency) => {
                env_config.concurrency = Some(concurrency);
            }
            _ => warn!(value = %val, "Invalid RDAP_CHECK_CONCURRENCY, must be 1-100"),
        }
    }

    if let Some(val) = lookup("RDAP_CHECK_TIMEOUT") {
        match parse_timeout_string(&val) {
            Some(timeout) => env_config.timeout = Some(timeout),
            None => warn!(value = %val, "Invalid RDAP_CHECK_TIMEOUT, use e.g. '5s' or '1500ms'"),
        }
    }

    if let Some(val) = lookup("RDAP_CHECK_FALLBACK") {
        match parse_bool(&val) {
            Some(enabled) => env_config.fallback = Some(enabled),
            None => warn!(value = %val, "Invalid RDAP_CHECK_FALLBACK, use true/false"),
        }
    }

    for (key, slot) in [
        ("RDAP_CHECK_AGGREGATOR", &mut env_config.aggregator_url),
        ("RDAP_CHECK_BOOTSTRAP_URL", &mut env_config.bootstrap_url),
    ] {
        if let Some(val) = lookup(key) {
            match validate_http_url(val.trim()) {
                Ok(()) => *slot = Some(val.trim().to_string()),
                Err(e) => warn!(key, error = %e, "Ignoring invalid URL"),
            }
        }
    }

    env_config
}

/// Parse a timeout like "5s", "1500ms", "2m" or bare seconds.
pub fn parse_timeout_string(timeout_str: &str) -> Option<Duration> {
    let timeout_str = timeout_str.trim().to_lowercase();

    let timeout = if let Some(ms) = timeout_str.strip_suffix("ms") {
        ms.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = timeout_str.strip_suffix('s') {
        secs.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = timeout_str.strip_suffix('m') {
        mins.trim()
            .parse::<u64>()
            .ok()
            .map(|m| Duration::from_secs(m * 60))
    } else {
        timeout_str.parse::<u64>().ok().map(Duration::from_secs)
    };

    timeout.filter(|timeout| !timeout.is_zero())
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn validate_http_url(url: &str) -> Result<(), RdapCheckError> {
    match reqwest::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(RdapCheckError::config(format!(
            "'{}' is not an http(s) URL",
            url
        ))),
    }
}
