//! Main domain checker implementation.
//!
//! `DomainChecker` resolves a domain in up to two tiers: the aggregator
//! first, then, when the aggregator is inconclusive and fallback is
//! enabled, the authoritative server listed in the bootstrap directory.
//! Fallback problems are never surfaced; the aggregator's answer stands.

use crate::concurrent::{run_batch, stream_outcomes, Outcome};
use crate::error::RdapCheckError;
use crate::protocols::{interpret, BootstrapDirectory, RdapClient, RdapResponse};
use crate::types::{CheckConfig, CheckOptions, CheckResult};
use crate::utils::{extract_tld, validate_domain};
use futures::stream::Stream;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves domain registration status over RDAP.
///
/// # Example
///
/// ```rust,no_run
/// use rdap_check_lib::{AvailabilityStatus, DomainChecker};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let checker = DomainChecker::new()?;
///     let result = checker.check_domain("example.com").await?;
///     if result.status == AvailabilityStatus::Available {
///         println!("{} is free", result.domain);
///     }
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct DomainChecker {
    config: CheckConfig,
    rdap_client: RdapClient,
    bootstrap: Arc<BootstrapDirectory>,
}

impl DomainChecker {
    /// Create a checker with default configuration.
    pub fn new() -> Result<Self, RdapCheckError> {
        Self::with_config(CheckConfig::default())
    }

    /// Create a checker with custom configuration and its own bootstrap cache.
    ///
    /// ```rust
    /// use rdap_check_lib::{CheckConfig, DomainChecker};
    /// use std::time::Duration;
    ///
    /// let config = CheckConfig::default()
    ///     .with_concurrency(20)
    ///     .with_timeout(Duration::from_secs(3))
    ///     .with_fallback(false);
    ///
    /// let checker = DomainChecker::with_config(config).unwrap();
    /// assert_eq!(checker.config().concurrency, 20);
    /// ```
    pub fn with_config(config: CheckConfig) -> Result<Self, RdapCheckError> {
        let rdap_client = RdapClient::with_user_agent(&config.user_agent)?;
        let bootstrap = Arc::new(BootstrapDirectory::new(
            rdap_client.http_client().clone(),
            config.bootstrap_url.clone(),
            config.bootstrap_ttl,
        ));
        Ok(Self::with_parts(config, rdap_client, bootstrap))
    }

    /// Create a checker that shares an existing bootstrap directory.
    pub fn with_parts(
        config: CheckConfig,
        rdap_client: RdapClient,
        bootstrap: Arc<BootstrapDirectory>,
    ) -> Self {
        Self {
            config,
            rdap_client,
            bootstrap,
        }
    }

    /// Check one domain with the checker's configured options.
    pub async fn check_domain(&self, domain: &str) -> Result<CheckResult, RdapCheckError> {
        let options = self.config.options();
        self.check_domain_with(domain, &options).await
    }

    /// Check one domain.
    ///
    /// The only error is an invalid domain name, reported before any network
    /// activity. Network trouble yields an `unknown` result instead.
    pub async fn check_domain_with(
        &self,
        domain: &str,
        options: &CheckOptions,
    ) -> Result<CheckResult, RdapCheckError> {
        validate_domain(domain)?;

        let primary = self.query_aggregator(domain, options).await;
        if primary.status.is_definitive() || !options.fallback {
            return Ok(primary);
        }

        match self.query_authoritative(domain, options).await {
            Some(authoritative) if authoritative.status.is_definitive() => Ok(authoritative),
            Some(authoritative) => {
                debug!(
                    domain = %domain,
                    source = ?authoritative.source,
                    "Authoritative server also inconclusive, keeping aggregator result"
                );
                Ok(primary)
            }
            None => Ok(primary),
        }
    }

    async fn query_aggregator(&self, domain: &str, options: &CheckOptions) -> CheckResult {
        let base_url = self.config.aggregator_url.as_str();

        match self
            .rdap_client
            .resolve(base_url, domain, options.timeout)
            .await
        {
            Some(response) => {
                // Provenance follows redirects to the registry that answered.
                let source = response
                    .final_url
                    .host_str()
                    .map(str::to_string)
                    .or_else(|| host_of(base_url));
                build_result(domain, response, source)
            }
            None => CheckResult::unreachable(domain),
        }
    }

    async fn query_authoritative(
        &self,
        domain: &str,
        options: &CheckOptions,
    ) -> Option<CheckResult> {
        let tld = extract_tld(domain).ok()?;

        // Waiting on the directory counts against the caller's deadline.
        let lookup = tokio::time::timeout(options.timeout, self.bootstrap.lookup(&tld)).await;
        let base_url = match lookup {
            Ok(Ok(Some(url))) => url,
            Ok(Ok(None)) => {
                debug!(domain = %domain, tld = %tld, "No authoritative RDAP server listed");
                return None;
            }
            Ok(Err(e)) => {
                warn!(
                    domain = %domain,
                    bootstrap = %self.bootstrap.url(),
                    error = %e,
                    "Bootstrap directory unavailable, skipping fallback"
                );
                return None;
            }
            Err(_) => {
                warn!(
                    domain = %domain,
                    bootstrap = %self.bootstrap.url(),
                    timeout = ?options.timeout,
                    "Bootstrap directory lookup timed out, skipping fallback"
                );
                return None;
            }
        };

        let response = self
            .rdap_client
            .resolve(&base_url, domain, options.timeout)
            .await?;
        Some(build_result(domain, response, Some(base_url)))
    }

    /// Check many domains, returning results in input order.
    ///
    /// Each entry carries its own outcome; an invalid name does not stop the
    /// rest of the batch.
    pub async fn check_domains(
        &self,
        domains: &[String],
    ) -> Vec<Result<CheckResult, RdapCheckError>> {
        let options = self.config.options();
        run_batch(domains, self.config.concurrency, |domain| {
            self.check_domain_with(domain, &options)
        })
        .await
    }

    /// Check many domains, yielding outcomes as they complete.
    ///
    /// ```rust,no_run
    /// use futures::StreamExt;
    /// use rdap_check_lib::{DomainChecker, Outcome};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let checker = DomainChecker::new()?;
    ///     let domains = vec!["example.com".to_string(), "example.org".to_string()];
    ///
    ///     let stream = checker.check_domains_stream(&domains);
    ///     futures::pin_mut!(stream);
    ///     while let Some(outcome) = stream.next().await {
    ///         if let Outcome::Completed { value, .. } = outcome {
    ///             println!("{}: {}", value.domain, value.status);
    ///         }
    ///     }
    ///     Ok(())
    /// }
    /// ```
    pub fn check_domains_stream<'a>(
        &'a self,
        domains: &'a [String],
    ) -> impl Stream<Item = Outcome<CheckResult, RdapCheckError>> + 'a {
        let options = self.config.options();
        stream_outcomes(domains, self.config.concurrency, move |domain: &'a String| {
            let options = options.clone();
            async move { self.check_domain_with(domain, &options).await }
        })
    }

    /// Forget the cached bootstrap directory.
    pub fn invalidate_bootstrap_cache(&self) {
        self.bootstrap.invalidate();
    }

    /// The bootstrap directory used for fallback lookups.
    pub fn bootstrap(&self) -> &Arc<BootstrapDirectory> {
        &self.bootstrap
    }

    /// Get the current configuration for this checker.
    pub fn config(&self) -> &CheckConfig {
        &self.config
    }
}

fn build_result(domain: &str, response: RdapResponse, source: Option<String>) -> CheckResult {
    let verdict = interpret(response.http_status, response.body.as_ref());
    CheckResult {
        domain: domain.to_string(),
        status: verdict.status,
        http_status: Some(response.http_status),
        error_code: verdict.error_code,
        source,
        response_time_ms: response.elapsed_ms,
    }
}

fn host_of(url: &str) -> Option<String> {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AvailabilityStatus;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Stubs {
        aggregator: MockServer,
        registry: MockServer,
        iana: MockServer,
    }

    impl Stubs {
        async fn start() -> Self {
            Self {
                aggregator: MockServer::start().await,
                registry: MockServer::start().await,
                iana: MockServer::start().await,
            }
        }

        fn registry_base(&self) -> String {
            format!("{}/v1/", self.registry.uri())
        }

        async fn serve_directory(&self, expected_fetches: u64) {
            let document = serde_json::json!({
                "services": [[["com", "net"], [self.registry_base()]]]
            });
            Mock::given(method("GET"))
                .and(path("/rdap/dns.json"))
                .respond_with(ResponseTemplate::new(200).set_body_json(document))
                .expect(expected_fetches)
                .mount(&self.iana)
                .await;
        }

        fn checker(&self, fallback: bool) -> DomainChecker {
            let config = CheckConfig::default()
                .with_aggregator_url(self.aggregator.uri())
                .with_bootstrap_url(format!("{}/rdap/dns.json", self.iana.uri()))
                .with_timeout(Duration::from_secs(2))
                .with_fallback(fallback);
            DomainChecker::with_config(config).unwrap()
        }
    }

    async fn respond(server: &MockServer, route: &str, template: ResponseTemplate, times: u64) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(template)
            .expect(times)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_invalid_domain_rejected_before_network() {
        let stubs = Stubs::start().await;
        respond(&stubs.aggregator, "/domain/nodot", ResponseTemplate::new(404), 0).await;

        let err = stubs.checker(true).check_domain("nodot").await.unwrap_err();
        assert!(matches!(err, RdapCheckError::InvalidDomain { .. }));
    }

    #[tokio::test]
    async fn test_aggregator_not_found_is_available() {
        let stubs = Stubs::start().await;
        respond(&stubs.aggregator, "/domain/example.com", ResponseTemplate::new(404), 1).await;

        let result = stubs.checker(true).check_domain("example.com").await.unwrap();
        assert_eq!(result.status, AvailabilityStatus::Available);
        assert_eq!(result.http_status, Some(404));
        assert_eq!(result.error_code, Some(404));
        assert_eq!(result.source.as_deref(), Some("127.0.0.1"));
    }

    #[tokio::test]
    async fn test_definitive_aggregator_skips_bootstrap() {
        let stubs = Stubs::start().await;
        respond(
            &stubs.aggregator,
            "/domain/example.com",
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"ldhName": "example.com"})),
            1,
        )
        .await;
        stubs.serve_directory(0).await;

        let result = stubs.checker(true).check_domain("example.com").await.unwrap();
        assert_eq!(result.status, AvailabilityStatus::Registered);
    }

    #[tokio::test]
    async fn test_unknown_without_fallback_issues_no_authoritative_request() {
        let stubs = Stubs::start().await;
        respond(&stubs.aggregator, "/domain/example.com", ResponseTemplate::new(503), 1).await;
        stubs.serve_directory(0).await;
        respond(&stubs.registry, "/v1/domain/example.com", ResponseTemplate::new(200), 0).await;

        let result = stubs.checker(false).check_domain("example.com").await.unwrap();
        assert_eq!(result.status, AvailabilityStatus::Unknown);
        assert_eq!(result.http_status, Some(503));
    }

    #[tokio::test]
    async fn test_fallback_to_authoritative_registered() {
        let stubs = Stubs::start().await;
        respond(&stubs.aggregator, "/domain/example.com", ResponseTemplate::new(500), 1).await;
        stubs.serve_directory(1).await;
        respond(
            &stubs.registry,
            "/v1/domain/example.com",
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"objectClassName": "domain"})),
            1,
        )
        .await;

        let result = stubs.checker(true).check_domain("example.com").await.unwrap();
        assert_eq!(result.status, AvailabilityStatus::Registered);
        assert_eq!(result.http_status, Some(200));
        assert_eq!(result.source, Some(stubs.registry_base()));
    }

    #[tokio::test]
    async fn test_both_inconclusive_keeps_primary_result() {
        let stubs = Stubs::start().await;
        respond(
            &stubs.aggregator,
            "/domain/example.com",
            ResponseTemplate::new(502).set_body_json(serde_json::json!({"errorCode": 502})),
            1,
        )
        .await;
        stubs.serve_directory(1).await;
        respond(&stubs.registry, "/v1/domain/example.com", ResponseTemplate::new(500), 1).await;

        let result = stubs.checker(true).check_domain("example.com").await.unwrap();
        assert_eq!(result.status, AvailabilityStatus::Unknown);
        assert_eq!(result.http_status, Some(502));
        assert_eq!(result.error_code, Some(502));
        assert_eq!(result.source.as_deref(), Some("127.0.0.1"));
    }

    #[tokio::test]
    async fn test_bootstrap_failure_is_silent() {
        let stubs = Stubs::start().await;
        respond(&stubs.aggregator, "/domain/example.com", ResponseTemplate::new(500), 1).await;
        respond(&stubs.iana, "/rdap/dns.json", ResponseTemplate::new(500), 1).await;

        let result = stubs.checker(true).check_domain("example.com").await.unwrap();
        assert_eq!(result.status, AvailabilityStatus::Unknown);
        assert_eq!(result.http_status, Some(500));
    }

    #[tokio::test]
    async fn test_hung_bootstrap_bounded_by_call_timeout() {
        let stubs = Stubs::start().await;
        respond(&stubs.aggregator, "/domain/example.com", ResponseTemplate::new(500), 1).await;
        Mock::given(method("GET"))
            .and(path("/rdap/dns.json"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(1)))
            .mount(&stubs.iana)
            .await;

        let options = CheckOptions {
            timeout: Duration::from_millis(200),
            fallback: true,
        };
        let start = std::time::Instant::now();
        let result = stubs
            .checker(true)
            .check_domain_with("example.com", &options)
            .await
            .unwrap();

        assert_eq!(result.status, AvailabilityStatus::Unknown);
        assert_eq!(result.http_status, Some(500));
        assert!(start.elapsed() < Duration::from_millis(800));
    }

    #[tokio::test]
    async fn test_batch_with_failing_bootstrap_fetches_directory_once() {
        let stubs = Stubs::start().await;
        let domains: Vec<String> = ["a.com", "b.com", "c.com", "d.com"]
            .iter()
            .map(|d| d.to_string())
            .collect();
        for domain in &domains {
            let route = format!("/domain/{}", domain);
            respond(&stubs.aggregator, &route, ResponseTemplate::new(500), 1).await;
        }
        respond(
            &stubs.iana,
            "/rdap/dns.json",
            ResponseTemplate::new(503).set_delay(Duration::from_millis(300)),
            1,
        )
        .await;

        let results = stubs.checker(true).check_domains(&domains).await;
        for result in results {
            assert_eq!(result.unwrap().status, AvailabilityStatus::Unknown);
        }
    }

    #[tokio::test]
    async fn test_unlisted_tld_keeps_primary_result() {
        let stubs = Stubs::start().await;
        respond(&stubs.aggregator, "/domain/example.zz", ResponseTemplate::new(500), 1).await;
        stubs.serve_directory(1).await;

        let result = stubs.checker(true).check_domain("example.zz").await.unwrap();
        assert_eq!(result.status, AvailabilityStatus::Unknown);
    }

    #[tokio::test]
    async fn test_aggregator_timeout_then_authoritative_available() {
        let stubs = Stubs::start().await;
        respond(
            &stubs.aggregator,
            "/domain/example.com",
            ResponseTemplate::new(200).set_delay(Duration::from_secs(1)),
            1,
        )
        .await;
        stubs.serve_directory(1).await;
        respond(&stubs.registry, "/v1/domain/example.com", ResponseTemplate::new(404), 1).await;

        let checker = stubs.checker(true);
        let options = CheckOptions {
            timeout: Duration::from_millis(200),
            fallback: true,
        };
        let result = checker.check_domain_with("example.com", &options).await.unwrap();
        assert_eq!(result.status, AvailabilityStatus::Available);
        assert_eq!(result.source, Some(stubs.registry_base()));
    }

    #[tokio::test]
    async fn test_transport_failure_without_fallback_is_unreachable() {
        let stubs = Stubs::start().await;
        respond(
            &stubs.aggregator,
            "/domain/example.com",
            ResponseTemplate::new(200).set_delay(Duration::from_secs(1)),
            1,
        )
        .await;

        let options = CheckOptions {
            timeout: Duration::from_millis(100),
            fallback: false,
        };
        let result = stubs
            .checker(false)
            .check_domain_with("example.com", &options)
            .await
            .unwrap();
        assert_eq!(result, CheckResult::unreachable("example.com"));
    }

    #[tokio::test]
    async fn test_check_domains_preserves_order() {
        let stubs = Stubs::start().await;
        respond(
            &stubs.aggregator,
            "/domain/slow.com",
            ResponseTemplate::new(404).set_delay(Duration::from_millis(150)),
            1,
        )
        .await;
        respond(
            &stubs.aggregator,
            "/domain/fast.com",
            ResponseTemplate::new(200).set_body_json(serde_json::json!({})),
            1,
        )
        .await;

        let domains = vec![
            "slow.com".to_string(),
            "bad..com".to_string(),
            "fast.com".to_string(),
        ];
        let results = stubs.checker(false).check_domains(&domains).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().status, AvailabilityStatus::Available);
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().status, AvailabilityStatus::Registered);
    }

    #[tokio::test]
    async fn test_invalidate_bootstrap_cache_refetches() {
        let stubs = Stubs::start().await;
        respond(&stubs.aggregator, "/domain/example.com", ResponseTemplate::new(500), 2).await;
        stubs.serve_directory(2).await;
        respond(&stubs.registry, "/v1/domain/example.com", ResponseTemplate::new(404), 2).await;

        let checker = stubs.checker(true);
        checker.check_domain("example.com").await.unwrap();
        assert!(checker.bootstrap().is_cached());

        checker.invalidate_bootstrap_cache();
        assert!(!checker.bootstrap().is_cached());
        checker.check_domain("example.com").await.unwrap();
    }
}
