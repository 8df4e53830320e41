//! Utility functions for domain processing and validation.
//!
//! Validation here is purely syntactic and never touches the network.

use crate::error::RdapCheckError;

/// Maximum total length of a domain name.
const MAX_DOMAIN_LEN: usize = 253;

/// Maximum length of a single label.
const MAX_LABEL_LEN: usize = 63;

/// One DNS label: 1-63 ASCII alphanumerics or hyphens, no leading or trailing hyphen.
fn is_valid_label(label: &str) -> bool {
    if label.is_empty() || label.len() > MAX_LABEL_LEN {
        return false;
    }

    if label.starts_with('-') || label.ends_with('-') {
        return false;
    }

    label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Whether `name` is an admissible domain name.
///
/// Requires at least two labels, so a bare word without a top-level label
/// is rejected.
pub fn is_valid_domain(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_DOMAIN_LEN {
        return false;
    }

    let labels: Vec<&str> = name.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    labels.iter().all(|label| is_valid_label(label))
}

/// Validate a domain name, explaining why it was rejected.
pub fn validate_domain(domain: &str) -> Result<(), RdapCheckError> {
    if domain.is_empty() {
        return Err(RdapCheckError::invalid_domain(
            domain,
            "Domain name cannot be empty",
        ));
    }

    if domain.len() > MAX_DOMAIN_LEN {
        return Err(RdapCheckError::invalid_domain(
            domain,
            format!("Domain name longer than {} characters", MAX_DOMAIN_LEN),
        ));
    }

    if !domain.contains('.') {
        return Err(RdapCheckError::invalid_domain(
            domain,
            "Domain name needs a top-level label (e.g. example.com)",
        ));
    }

    if !is_valid_domain(domain) {
        return Err(RdapCheckError::invalid_domain(
            domain,
            "Labels must be 1-63 letters, digits or hyphens and not start or end with a hyphen",
        ));
    }

    Ok(())
}

/// Extract the top-level label of a domain, lower-cased.
pub fn extract_tld(domain: &str) -> Result<String, RdapCheckError> {
    match domain.trim_end_matches('.').rsplit_once('.') {
        Some((_, tld)) if !tld.is_empty() => Ok(tld.to_lowercase()),
        _ => Err(RdapCheckError::invalid_domain(
            domain,
            "Domain must contain at least one dot",
        )),
    }
}

/// Turn raw input lines into domain candidates.
///
/// Lines are trimmed; blank lines and `#` comments are dropped. No
/// validation happens here so the caller can report bad entries by name.
pub fn parse_domain_lines<I, S>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .filter_map(|line| {
            let trimmed = line.as_ref().trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}
