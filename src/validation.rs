//! Input validation for check names, probe inputs and endpoint URLs.
//!
//! Everything validated here is harness input. A failure means the harness
//! was configured wrongly, not that the deployment is broken.

use anyhow::{bail, Context, Result};
use regex::Regex;
use reqwest::Url;
use std::sync::OnceLock;

/// Maximum allowed length for check names.
pub const MAX_CHECK_NAME_LENGTH: usize = 64;

/// Maximum allowed length for an email address (RFC 5321 path limit).
pub const MAX_EMAIL_LENGTH: usize = 254;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
            .expect("email pattern is a valid regex")
    })
}

/// Validates that a check name is usable as a stable report key.
///
/// A name is valid if:
/// - It is not empty
/// - It is no longer than MAX_CHECK_NAME_LENGTH characters
/// - It contains only lowercase ASCII letters, digits, dashes, and underscores
///
/// # Examples
///
/// ```
/// use postflight::validation::validate_check_name;
///
/// assert!(validate_check_name("create_subscription").is_ok());
/// assert!(validate_check_name("").is_err());
/// assert!(validate_check_name("Frontend Check").is_err());
/// ```
pub fn validate_check_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("Check name cannot be empty");
    }

    if name.len() > MAX_CHECK_NAME_LENGTH {
        bail!(
            "Check name too long: {} characters (max {})",
            name.len(),
            MAX_CHECK_NAME_LENGTH
        );
    }

    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if !valid_chars {
        bail!("Check name '{name}' contains invalid characters. Use only lowercase letters, digits, dashes (-), and underscores (_)");
    }

    Ok(())
}

/// Validates that an address is a well-formed email.
pub fn validate_email(email: &str) -> Result<()> {
    if email.len() > MAX_EMAIL_LENGTH {
        bail!(
            "Email too long: {} characters (max {})",
            email.len(),
            MAX_EMAIL_LENGTH
        );
    }

    if !email_regex().is_match(email) {
        bail!("'{email}' is not a well-formed email address");
    }

    Ok(())
}

/// Parses an absolute http(s) URL.
pub fn parse_http_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("Invalid URL: {raw}"))?;

    match url.scheme() {
        "http" | "https" => {}
        other => bail!("URL '{raw}' uses unsupported scheme '{other}' (expected http or https)"),
    }

    if url.host_str().is_none() {
        bail!("URL '{raw}' has no host");
    }

    Ok(url)
}

/// Clap value parser for validating email arguments.
pub fn clap_email_validator(s: &str) -> Result<String, String> {
    validate_email(s).map_err(|e| e.to_string())?;
    Ok(s.to_string())
}
