//! RDAP (Registration Data Access Protocol) query client.
//!
//! One `resolve` call is one GET against `<base>/domain/<name>`. Redirects
//! are followed by the HTTP client; the URL that finally answered is kept
//! for provenance. Transport failures and timeouts come back as `None`
//! rather than an error so the caller can turn them into an `unknown`
//! result without aborting a batch.

use crate::error::RdapCheckError;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::redirect::Policy;
use reqwest::Url;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::debug;

/// Media type requested from RDAP servers.
pub const RDAP_MEDIA_TYPE: &str = "application/rdap+json";

/// Redirect hops followed before giving up.
const MAX_REDIRECTS: usize = 10;

/// A usable answer from an RDAP server.
#[derive(Debug, Clone)]
pub struct RdapResponse {
    /// HTTP status of the final response
    pub http_status: u16,
    /// Parsed JSON body, if there was one
    pub body: Option<Value>,
    /// URL that produced the final response, after redirects
    pub final_url: Url,
    /// Time from request start to body fully read
    pub elapsed_ms: u64,
}

/// RDAP client for domain queries.
#[derive(Clone)]
pub struct RdapClient {
    http_client: reqwest::Client,
}

impl RdapClient {
    /// Create a new RDAP client with the default User-Agent.
    pub fn new() -> Result<Self, RdapCheckError> {
        Self::with_user_agent(concat!("rdap-check/", env!("CARGO_PKG_VERSION")))
    }

    /// Create a new RDAP client that identifies itself with `user_agent`.
    pub fn with_user_agent(user_agent: &str) -> Result<Self, RdapCheckError> {
        let http_client = reqwest::Client::builder()
            .user_agent(user_agent)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| {
                RdapCheckError::network_with_detail(
                    "Failed to create RDAP HTTP client",
                    e.to_string(),
                )
            })?;

        Ok(Self { http_client })
    }

    /// The underlying HTTP client, shared with the bootstrap directory.
    pub fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    /// Query `base_url` for `domain`, giving up after `timeout`.
    ///
    /// Returns `None` on timeout or transport failure.
    pub async fn resolve(
        &self,
        base_url: &str,
        domain: &str,
        timeout: Duration,
    ) -> Option<RdapResponse> {
        let url = domain_query_url(base_url, domain);
        let start = Instant::now();

        match tokio::time::timeout(timeout, self.fetch(&url)).await {
            Ok(Ok((http_status, final_url, body))) => {
                let elapsed_ms = start.elapsed().as_millis() as u64;
                debug!(
                    domain = %domain,
                    url = %final_url,
                    status = http_status,
                    elapsed_ms,
                    has_body = body.is_some(),
                    "RDAP query answered"
                );
                Some(RdapResponse {
                    http_status,
                    body,
                    final_url,
                    elapsed_ms,
                })
            }
            Ok(Err(e)) => {
                debug!(domain = %domain, url = %url, error = %e, "RDAP query failed");
                None
            }
            Err(_) => {
                debug!(domain = %domain, url = %url, timeout = ?timeout, "RDAP query timed out");
                None
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<(u16, Url, Option<Value>), RdapCheckError> {
        let response = self
            .http_client
            .get(url)
            .header(ACCEPT, RDAP_MEDIA_TYPE)
            .send()
            .await?;

        let http_status = response.status().as_u16();
        let final_url = response.url().clone();
        let declared_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_ascii_lowercase().contains("json"))
            .unwrap_or(false);

        let text = response.text().await?;
        Ok((http_status, final_url, parse_body(&text, declared_json)))
    }
}

/// Build `<base>/domain/<percent-encoded domain>`.
pub fn domain_query_url(base_url: &str, domain: &str) -> String {
    format!(
        "{}/domain/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(domain)
    )
}

/// Parse a response body opportunistically.
///
/// Servers that mislabel JSON as text still get parsed; anything that is
/// not JSON becomes "no body".
pub(crate) fn parse_body(text: &str, declared_json: bool) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(text) {
        Ok(value) => Some(value),
        Err(e) => {
            if declared_json {
                debug!(error = %e, "Body declared as JSON failed to parse");
            }
            None
        }
    }
}
