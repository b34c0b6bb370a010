//! Error types for SafeFetch
//!
//! Each pipeline stage has its own error enum. [`Error`] wraps them so callers
//! can tell "your input was wrong" apart from "this target is forbidden" and
//! "the upstream failed".

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;
use thiserror::Error;

/// URL rejected before any network activity
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// URL is empty or whitespace
    #[error("URL cannot be empty")]
    EmptyUrl,

    /// URL could not be parsed
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    /// Scheme other than http/https
    #[error("Invalid URL scheme '{0}'. Only http and https are allowed.")]
    InvalidScheme(String),

    /// No host component
    #[error("URL must contain a hostname")]
    MissingHostname,

    /// Allowlist is configured and the host is not on it
    #[error("Domain '{0}' is not in the allowlist")]
    DomainNotAllowed(String),

    /// Host is on the blocklist
    #[error("Domain '{0}' is blocked")]
    DomainBlocked(String),
}

/// Request refused by SSRF protection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SsrfError {
    /// URL has no host to check
    #[error("URL has no hostname")]
    MissingHostname,

    /// Literal IP host is private or reserved
    #[error("Requests to private IP addresses are blocked: {0}")]
    PrivateAddress(IpAddr),

    /// A resolved address of the host is private or reserved
    #[error("Hostname '{host}' resolves to private IP: {ip}")]
    ResolvesToPrivate { host: String, ip: IpAddr },

    /// DNS lookup failed, timed out or returned nothing
    #[error("Cannot resolve hostname: {host} ({reason})")]
    Unresolvable { host: String, reason: String },
}

/// Upstream request failure
#[derive(Debug, Error)]
pub enum FetchFailed {
    /// Failed to build HTTP client
    #[error("Failed to create HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    /// Server answered with status >= 400
    ///
    /// `reason` is the canonical phrase for `status`, not the phrase the
    /// server sent.
    #[error("HTTP error {status}: {reason}")]
    HttpStatus { status: u16, reason: String },

    /// Wall-clock budget exceeded
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Redirect chain longer than the configured maximum
    #[error("Too many redirects (max {0})")]
    TooManyRedirects(usize),

    /// Configured User-Agent is not a valid header value
    #[error("Invalid User-Agent header: {0:?}")]
    InvalidUserAgent(String),

    /// Failed to connect to server
    #[error("Failed to connect to server: {0}")]
    Connect(#[source] reqwest::Error),

    /// Body exceeded the configured size cap
    #[error("Response body exceeds {0} bytes")]
    BodyTooLarge(usize),

    /// Other transport error
    #[error("Failed to fetch URL: {0}")]
    Request(String),
}

impl FetchFailed {
    /// Create an error from a reqwest error
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration, max_redirects: usize) -> Self {
        if err.is_timeout() {
            FetchFailed::Timeout(timeout)
        } else if err.is_redirect() {
            FetchFailed::TooManyRedirects(max_redirects)
        } else if err.is_connect() {
            FetchFailed::Connect(err)
        } else {
            FetchFailed::Request(err.to_string())
        }
    }
}

/// Invalid startup configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Value could not be interpreted
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

/// Coarse error category, stable across variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Caller-correctable input or policy error
    Validation,
    /// Target forbidden by SSRF protection
    SsrfBlocked,
    /// Upstream or transport failure
    Fetch,
}

/// Any error produced by the fetch pipeline
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    SsrfBlocked(#[from] SsrfError),

    #[error(transparent)]
    Fetch(#[from] FetchFailed),
}

impl Error {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::SsrfBlocked(_) => ErrorKind::SsrfBlocked,
            Error::Fetch(_) => ErrorKind::Fetch,
        }
    }

    /// HTTP status a serving layer should answer with
    ///
    /// 400 for validation errors, 403 for SSRF blocks, 502 for upstream failures.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation => 400,
            ErrorKind::SsrfBlocked => 403,
            ErrorKind::Fetch => 502,
        }
    }
}
