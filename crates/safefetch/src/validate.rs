//! URL validation
//!
//! Syntactic and policy checks that run before any DNS lookup or socket.

use crate::error::ValidationError;
use crate::policy::DomainPolicy;
use std::fmt;
use url::{Host, Url};

/// A URL that passed [`validate_url`]
///
/// Keeps the caller's original string untouched next to the parsed form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUrl {
    raw: String,
    parsed: Url,
}

impl ValidatedUrl {
    /// The URL exactly as supplied by the caller
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Parsed URL
    pub fn url(&self) -> &Url {
        &self.parsed
    }

    /// Host component, with IP literals already decoded
    pub fn host(&self) -> Option<Host<&str>> {
        self.parsed.host()
    }

    /// Hostname as used for policy checks (no IPv6 brackets)
    pub fn hostname(&self) -> Option<String> {
        self.host().map(|h| host_to_string(&h))
    }
}

impl fmt::Display for ValidatedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Validate a raw URL string
///
/// Checks, in order: non-empty input, parseable URL, `http`/`https` scheme,
/// non-empty hostname, then the domain policy. Query strings and fragments
/// are passed through unmodified.
pub fn validate_url(raw: &str, policy: &DomainPolicy) -> Result<ValidatedUrl, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyUrl);
    }

    // The parser silently drops tabs and newlines; refuse instead
    if trimmed.chars().any(|c| c.is_ascii_control()) {
        return Err(ValidationError::InvalidFormat(
            "URL contains control characters".to_string(),
        ));
    }

    let parsed = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            return Err(ValidationError::InvalidScheme(String::new()));
        }
        Err(url::ParseError::EmptyHost) => return Err(ValidationError::MissingHostname),
        Err(e) => return Err(ValidationError::InvalidFormat(e.to_string())),
    };

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(ValidationError::InvalidScheme(scheme.to_string()));
    }

    if !has_authority(trimmed, scheme) {
        return Err(ValidationError::MissingHostname);
    }

    let hostname = match parsed.host() {
        Some(host) => host_to_string(&host),
        None => return Err(ValidationError::MissingHostname),
    };
    if hostname.is_empty() {
        return Err(ValidationError::MissingHostname);
    }

    policy.check(&hostname)?;

    Ok(ValidatedUrl {
        raw: raw.to_string(),
        parsed,
    })
}

/// True when the input spells out `scheme://<host>`
///
/// The parser is lenient with special schemes and reads `http:///path` as
/// host `path`, or `http:host` as host `host`. Both are treated as having no
/// hostname.
fn has_authority(raw: &str, scheme: &str) -> bool {
    let Some(rest) = raw.get(scheme.len() + 1..) else {
        return false;
    };
    match rest.strip_prefix("//") {
        Some(authority) => !authority.is_empty() && !authority.starts_with(['/', '\\', '?', '#']),
        None => false,
    }
}

fn host_to_string(host: &Host<&str>) -> String {
    match host {
        Host::Domain(domain) => domain.to_lowercase(),
        Host::Ipv4(ip) => ip.to_string(),
        Host::Ipv6(ip) => ip.to_string(),
    }
}
