//! RDAP Check CLI Application
//!
//! A command-line interface for resolving domain registration status over RDAP,
//! with automatic fallback to the authoritative registry server. This CLI is a
//! thin layer over the rdap-check-lib library.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use rdap_check_lib::{
    load_env_config, parse_domain_lines, run_streaming, validate_domain, BatchStatus,
    BatchSummary, CheckConfig, CheckResult, ConfigManager, DefaultsConfig, DomainChecker,
    FileConfig, RdapCheckError,
};
use std::io::{BufRead, IsTerminal};
use std::process;
use std::time::Instant;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

// Process exit codes
const EXIT_ALL_AVAILABLE: i32 = 0;
const EXIT_ALL_REGISTERED: i32 = 1;
const EXIT_MIXED: i32 = 2;
const EXIT_ERROR: i32 = 3;
const EXIT_INVALID_INPUT: i32 = 4;

/// CLI arguments for rdap-check
#[derive(Parser, Debug)]
#[command(name = "rdap-check")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Check domain registration status over RDAP")]
#[command(
    long_about = "Check domain registration status over RDAP.\n\nQueries an RDAP aggregator first and falls back to the authoritative registry server from the IANA bootstrap directory when the answer is inconclusive.\n\nExit codes: 0 all available, 1 all registered, 2 mixed, 3 at least one unknown, 4 invalid input or configuration."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Domain names to check; `-` or no arguments reads stdin (one per line)
    #[arg(value_name = "DOMAINS", help_heading = "Input")]
    pub domains: Vec<String>,

    /// Max concurrent domain checks (default: 10, max: 100)
    #[arg(
        short = 'c',
        long = "concurrency",
        value_name = "N",
        help_heading = "Performance"
    )]
    pub concurrency: Option<usize>,

    /// Per-query timeout, e.g. "8s", "1500ms" (default: 8s)
    #[arg(
        short = 't',
        long = "timeout",
        value_name = "DURATION",
        help_heading = "Performance"
    )]
    pub timeout: Option<String>,

    /// Disable the authoritative-server fallback
    #[arg(long = "no-fallback", help_heading = "Protocol")]
    pub no_fallback: bool,

    /// RDAP aggregator base URL
    #[arg(long = "aggregator", value_name = "URL", help_heading = "Protocol")]
    pub aggregator: Option<String>,

    /// IANA bootstrap directory URL
    #[arg(long = "bootstrap-url", value_name = "URL", help_heading = "Protocol")]
    pub bootstrap_url: Option<String>,

    /// Output results in JSON format
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Show results as they complete instead of in input order
    #[arg(long = "stream", help_heading = "Output Format")]
    pub stream: bool,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Verbose logging and per-result details
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    let code = run(args).await;
    process::exit(code);
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(args: Args) -> i32 {
    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return EXIT_INVALID_INPUT;
        }
    };

    let domains = match collect_domains(&args) {
        Ok(domains) if domains.is_empty() => {
            eprintln!("Error: no domains given (pass them as arguments or on stdin)");
            return EXIT_INVALID_INPUT;
        }
        Ok(domains) => domains,
        Err(e) => {
            eprintln!("Error: {}", e);
            return EXIT_INVALID_INPUT;
        }
    };

    // Every input is validated before the first network request.
    let invalid = invalid_inputs(&domains);
    if !invalid.is_empty() {
        for error in &invalid {
            eprintln!("Error: {}", error);
        }
        return EXIT_INVALID_INPUT;
    }

    let checker = match DomainChecker::with_config(config) {
        Ok(checker) => checker,
        Err(e) => {
            eprintln!("Error: {}", e);
            return EXIT_ERROR;
        }
    };

    let start_time = Instant::now();
    let results = if args.stream {
        run_streaming_check(&checker, &domains, &args).await
    } else {
        match run_batch_check(&checker, &domains, &args).await {
            Ok(results) => results,
            Err(e) => {
                eprintln!("Error: {}", e);
                return EXIT_ERROR;
            }
        }
    };

    let summary = BatchSummary::from_results(&results);
    if !args.json && results.len() > 1 {
        println!();
        ui::print_summary(&summary, start_time.elapsed());
    }

    exit_code(summary.status)
}

/// Build CheckConfig with config file integration.
///
/// Precedence order (highest to lowest):
/// 1. CLI arguments
/// 2. Environment variables (RDAP_CHECK_*)
/// 3. Config files (--config, or discovered)
/// 4. Built-in defaults
fn build_config(args: &Args) -> Result<CheckConfig, RdapCheckError> {
    let config_manager = ConfigManager::new();

    let file_config = match &args.config {
        Some(path) => config_manager.load_file(path)?,
        None => config_manager.discover_and_load()?,
    };

    let mut config = file_config.apply_to(CheckConfig::default());
    config = load_env_config().apply_to(config);

    let overrides = cli_overrides(args);
    config_manager.validate_config(&overrides)?;
    Ok(overrides.apply_to(config))
}

/// CLI flags expressed as a config layer so they share file validation rules.
fn cli_overrides(args: &Args) -> FileConfig {
    FileConfig {
        defaults: Some(DefaultsConfig {
            concurrency: args.concurrency,
            timeout: args.timeout.clone(),
            fallback: args.no_fallback.then_some(false),
            aggregator_url: args.aggregator.clone(),
            bootstrap_url: args.bootstrap_url.clone(),
        }),
    }
}

/// Positional domains, with `-` (or no arguments on a pipe) expanded from stdin.
fn collect_domains(args: &Args) -> Result<Vec<String>, RdapCheckError> {
    let stdin = std::io::stdin();
    let read_stdin = args.domains.iter().any(|d| d == "-")
        || (args.domains.is_empty() && !stdin.is_terminal());

    let stdin_lines = if read_stdin {
        stdin.lock().lines().collect::<Result<Vec<_>, _>>()?
    } else {
        Vec::new()
    };

    Ok(expand_inputs(&args.domains, stdin_lines))
}

fn expand_inputs(arguments: &[String], stdin_lines: Vec<String>) -> Vec<String> {
    let mut domains: Vec<String> = arguments
        .iter()
        .filter(|d| d.as_str() != "-")
        .map(|d| d.trim().to_string())
        .collect();
    domains.extend(parse_domain_lines(stdin_lines));
    domains
}

fn invalid_inputs(domains: &[String]) -> Vec<RdapCheckError> {
    domains
        .iter()
        .filter_map(|domain| validate_domain(domain).err())
        .collect()
}

/// Check all domains, then print in input order.
async fn run_batch_check(
    checker: &DomainChecker,
    domains: &[String],
    args: &Args,
) -> Result<Vec<CheckResult>, RdapCheckError> {
    let spinner = if !args.json && domains.len() > 1 {
        ui::Spinner::start(format!("Checking {} domains...", domains.len()))
    } else {
        None
    };

    let results = checker
        .check_domains(domains)
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>();

    if let Some(s) = spinner {
        s.stop().await;
    }
    let results = results?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for result in &results {
            ui::print_result(result, args.verbose, None);
        }
    }

    Ok(results)
}

/// Print each result as soon as it completes.
///
/// Items whose check fails are skipped; they produce no output line.
async fn run_streaming_check(
    checker: &DomainChecker,
    domains: &[String],
    args: &Args,
) -> Vec<CheckResult> {
    let total = domains.len();
    let options = checker.config().options();
    let mut results = Vec::with_capacity(total);

    let summary = run_streaming(
        domains,
        checker.config().concurrency,
        |domain| checker.check_domain_with(domain, &options),
        |_, result: CheckResult| {
            if args.json {
                match serde_json::to_string(&result) {
                    Ok(line) => println!("{}", line),
                    Err(e) => eprintln!("Error: {}", e),
                }
            } else {
                let counter = (total > 1).then_some((results.len() + 1, total));
                ui::print_result(&result, args.verbose, counter);
            }
            results.push(result);
        },
    )
    .await;

    if summary.failed > 0 {
        debug!(failed = summary.failed, "Skipped domains whose check failed");
    }

    results
}

fn exit_code(status: BatchStatus) -> i32 {
    match status {
        BatchStatus::Available => EXIT_ALL_AVAILABLE,
        BatchStatus::Registered => EXIT_ALL_REGISTERED,
        BatchStatus::Mixed => EXIT_MIXED,
        BatchStatus::Error => EXIT_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn create_test_args() -> Args {
        Args {
            domains: vec![],
            concurrency: None,
            timeout: None,
            no_fallback: false,
            aggregator: None,
            bootstrap_url: None,
            json: false,
            stream: false,
            config: None,
            verbose: false,
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(BatchStatus::Available), 0);
        assert_eq!(exit_code(BatchStatus::Registered), 1);
        assert_eq!(exit_code(BatchStatus::Mixed), 2);
        assert_eq!(exit_code(BatchStatus::Error), 3);
    }

    #[test]
    fn test_args_parse_flags() {
        let args = Args::try_parse_from([
            "rdap-check",
            "example.com",
            "-c",
            "5",
            "--timeout",
            "2s",
            "--no-fallback",
            "--json",
        ])
        .unwrap();

        assert_eq!(args.domains, vec!["example.com"]);
        assert_eq!(args.concurrency, Some(5));
        assert_eq!(args.timeout.as_deref(), Some("2s"));
        assert!(args.no_fallback);
        assert!(args.json);
        assert!(!args.stream);
    }

    #[test]
    fn test_cli_overrides_apply_on_top() {
        let mut args = create_test_args();
        args.concurrency = Some(3);
        args.timeout = Some("1500ms".to_string());
        args.no_fallback = true;
        args.aggregator = Some("http://localhost:8080".to_string());

        let overrides = cli_overrides(&args);
        assert!(ConfigManager::new().validate_config(&overrides).is_ok());

        let config = overrides.apply_to(CheckConfig::default());
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.timeout, Duration::from_millis(1500));
        assert!(!config.fallback);
        assert_eq!(config.aggregator_url, "http://localhost:8080");
    }

    #[test]
    fn test_absent_flags_keep_lower_layers() {
        let base = CheckConfig::default()
            .with_concurrency(42)
            .with_fallback(false);
        let config = cli_overrides(&create_test_args()).apply_to(base);

        assert_eq!(config.concurrency, 42);
        assert!(!config.fallback);
    }

    #[test]
    fn test_invalid_cli_values_rejected() {
        let manager = ConfigManager::new();

        let mut args = create_test_args();
        args.concurrency = Some(0);
        assert!(manager.validate_config(&cli_overrides(&args)).is_err());

        let mut args = create_test_args();
        args.timeout = Some("soon".to_string());
        assert!(manager.validate_config(&cli_overrides(&args)).is_err());

        let mut args = create_test_args();
        args.bootstrap_url = Some("ftp://example.com/dns.json".to_string());
        assert!(manager.validate_config(&cli_overrides(&args)).is_err());
    }

    #[test]
    fn test_expand_inputs_merges_stdin() {
        let arguments = vec!["a.com".to_string(), "-".to_string()];
        let stdin_lines = vec![
            "# list".to_string(),
            "  b.org ".to_string(),
            String::new(),
            "c.net".to_string(),
        ];

        assert_eq!(
            expand_inputs(&arguments, stdin_lines),
            vec!["a.com", "b.org", "c.net"]
        );
    }

    #[tokio::test]
    async fn test_stream_leaves_failed_items_out() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let aggregator = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/domain/free.com"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&aggregator)
            .await;

        let config = CheckConfig::default()
            .with_aggregator_url(aggregator.uri())
            .with_fallback(false);
        let checker = DomainChecker::with_config(config).unwrap();
        let mut args = create_test_args();
        args.json = true;
        args.stream = true;

        // "nodot" fails validation inside the checker and is skipped.
        let domains = vec!["free.com".to_string(), "nodot".to_string()];
        let results = run_streaming_check(&checker, &domains, &args).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].domain, "free.com");
        let summary = BatchSummary::from_results(&results);
        assert_eq!(exit_code(summary.status), EXIT_ALL_AVAILABLE);
    }

    #[test]
    fn test_invalid_inputs_collects_every_error() {
        let domains = vec![
            "good.com".to_string(),
            "nodot".to_string(),
            "bad..com".to_string(),
        ];
        let errors = invalid_inputs(&domains);

        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(RdapCheckError::is_input_error));
    }
}
