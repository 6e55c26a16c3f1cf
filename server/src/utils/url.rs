//! URL normalization for the admission API (spec §4.9, §8).

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static SCHEME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*://").expect("valid regex"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlFormatError {
    #[error("empty URL")]
    Empty,
    #[error("could not parse URL")]
    Unparsable,
    #[error("URL has no host")]
    EmptyHost,
}

/// Prepends `https://` iff `x` has no `scheme://` prefix; rejects inputs
/// whose parsed host is empty (spec §8).
pub fn format_url(raw: &str) -> Result<String, UrlFormatError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UrlFormatError::Empty);
    }

    let candidate = if SCHEME_RE.is_match(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let parsed = match url::Url::parse(&candidate) {
        Ok(u) => u,
        Err(url::ParseError::EmptyHost) => return Err(UrlFormatError::EmptyHost),
        Err(_) => return Err(UrlFormatError::Unparsable),
    };
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(UrlFormatError::EmptyHost);
    }

    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_domain_gets_https_prefix() {
        assert_eq!(format_url("example.com").unwrap(), "https://example.com");
    }

    #[test]
    fn test_existing_scheme_is_preserved() {
        assert_eq!(
            format_url("http://example.com").unwrap(),
            "http://example.com"
        );
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        assert_eq!(format_url("  example.com  ").unwrap(), "https://example.com");
    }

    #[test]
    fn test_empty_is_rejected() {
        assert_eq!(format_url(""), Err(UrlFormatError::Empty));
        assert_eq!(format_url("   "), Err(UrlFormatError::Empty));
    }

    #[test]
    fn test_hostless_is_rejected() {
        assert_eq!(format_url("https://"), Err(UrlFormatError::EmptyHost));
    }

    #[test]
    fn test_custom_scheme_preserved() {
        assert_eq!(format_url("ftp://x.com").unwrap(), "ftp://x.com");
    }
}
