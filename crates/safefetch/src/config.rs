//! Fetch configuration
//!
//! [`FetchConfig`] is built once at startup and handed to
//! [`SafeFetcher`](crate::SafeFetcher). Nothing in the library reads the
//! environment on its own; binaries call [`FetchConfig::from_env`].

use crate::error::ConfigError;
use crate::policy::DomainPolicy;
use crate::{DEFAULT_MAX_REDIRECTS, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
use reqwest::header::HeaderValue;
use std::time::Duration;

/// Environment variable names
pub mod env {
    pub const TIMEOUT: &str = "URL_FETCH_TIMEOUT";
    pub const USER_AGENT: &str = "URL_FETCH_USER_AGENT";
    pub const BLOCK_PRIVATE_IPS: &str = "BLOCK_PRIVATE_IPS";
    pub const ALLOWED_DOMAINS: &str = "ALLOWED_DOMAINS";
    pub const BLOCKED_DOMAINS: &str = "BLOCKED_DOMAINS";
    pub const MAX_REDIRECTS: &str = "URL_FETCH_MAX_REDIRECTS";
    pub const MAX_BYTES: &str = "URL_FETCH_MAX_BYTES";
}

/// Immutable configuration for the fetch pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Total wall-clock budget per request (also bounds DNS lookups)
    pub timeout: Duration,
    /// User-Agent sent with every request
    pub user_agent: String,
    /// Block private/reserved destinations
    pub ssrf_protection: bool,
    /// Maximum redirects followed per request
    pub max_redirects: usize,
    /// Optional cap on response body size
    pub max_body_bytes: Option<usize>,
    /// Domain allow/block lists
    pub domains: DomainPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfigBuilder::new().build()
    }
}

impl FetchConfig {
    /// Create a new config builder
    pub fn builder() -> FetchConfigBuilder {
        FetchConfigBuilder::new()
    }

    /// Load configuration from process environment variables
    ///
    /// Unset variables take their defaults. Malformed values are an error
    /// rather than a silent fallback.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = FetchConfigBuilder::new();

        if let Some(value) = lookup(env::TIMEOUT) {
            let secs: u64 = parse_number(env::TIMEOUT, &value)?;
            builder = builder.timeout(Duration::from_secs(secs));
        }

        if let Some(value) = lookup(env::USER_AGENT) {
            if !value.trim().is_empty() {
                builder = builder.user_agent(value.trim());
            }
        }

        if let Some(value) = lookup(env::BLOCK_PRIVATE_IPS) {
            builder = builder.ssrf_protection(parse_bool(env::BLOCK_PRIVATE_IPS, &value)?);
        }

        if let Some(value) = lookup(env::MAX_REDIRECTS) {
            builder = builder.max_redirects(parse_number(env::MAX_REDIRECTS, &value)?);
        }

        if let Some(value) = lookup(env::MAX_BYTES) {
            if !value.trim().is_empty() {
                builder = builder.max_body_bytes(parse_number(env::MAX_BYTES, &value)?);
            }
        }

        let allowed = lookup(env::ALLOWED_DOMAINS).unwrap_or_default();
        let blocked = lookup(env::BLOCKED_DOMAINS).unwrap_or_default();
        builder = builder.domains(DomainPolicy::from_csv(&allowed, &blocked));

        let config = builder.build();
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with
    ///
    /// A zero timeout would fail every request, and a User-Agent that is not
    /// a valid header value cannot be sent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout.is_zero() {
            return Err(invalid(env::TIMEOUT, &self.timeout.as_secs().to_string()));
        }
        if HeaderValue::from_str(&self.user_agent).is_err() {
            return Err(invalid(env::USER_AGENT, &self.user_agent));
        }
        Ok(())
    }
}

/// Builder for [`FetchConfig`]
#[derive(Debug, Clone)]
pub struct FetchConfigBuilder {
    timeout: Duration,
    user_agent: String,
    ssrf_protection: bool,
    max_redirects: usize,
    max_body_bytes: Option<usize>,
    domains: DomainPolicy,
}

impl Default for FetchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchConfigBuilder {
    /// Create a builder with defaults: 30s timeout, SSRF protection on,
    /// 5 redirects, no body cap, empty domain lists
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            ssrf_protection: true,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            max_body_bytes: None,
            domains: DomainPolicy::default(),
        }
    }

    /// Set the per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set custom User-Agent
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }

    /// Enable or disable SSRF protection
    pub fn ssrf_protection(mut self, enabled: bool) -> Self {
        self.ssrf_protection = enabled;
        self
    }

    /// Set the redirect limit
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }

    /// Cap the response body size
    pub fn max_body_bytes(mut self, max: usize) -> Self {
        self.max_body_bytes = Some(max);
        self
    }

    /// Add hostname to allow list
    pub fn allow_domain(mut self, host: &str) -> Self {
        self.domains.allow(host);
        self
    }

    /// Add hostname to block list
    pub fn block_domain(mut self, host: &str) -> Self {
        self.domains.block(host);
        self
    }

    /// Replace the domain policy
    pub fn domains(mut self, domains: DomainPolicy) -> Self {
        self.domains = domains;
        self
    }

    /// Build the config
    pub fn build(self) -> FetchConfig {
        FetchConfig {
            timeout: self.timeout,
            user_agent: self.user_agent,
            ssrf_protection: self.ssrf_protection,
            max_redirects: self.max_redirects,
            max_body_bytes: self.max_body_bytes,
            domains: self.domains,
        }
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| invalid(key, value))
}

/// Only explicit spellings are accepted; anything else is an error so a typo
/// cannot switch protection off
fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_vars(vars: &[(&str, &str)]) -> Result<FetchConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        FetchConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert!(config.ssrf_protection);
        assert_eq!(config.max_redirects, 5);
        assert!(config.max_body_bytes.is_none());
        assert!(config.domains.allowlist().is_empty());
        assert!(config.domains.blocklist().is_empty());

        assert_eq!(from_vars(&[]).unwrap(), config);
    }

    #[test]
    fn test_builder() {
        let config = FetchConfig::builder()
            .timeout(Duration::from_secs(5))
            .user_agent("TestAgent/1.0")
            .ssrf_protection(false)
            .max_redirects(2)
            .max_body_bytes(1024)
            .allow_domain("example.com")
            .block_domain("blocked.com")
            .build();

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent, "TestAgent/1.0");
        assert!(!config.ssrf_protection);
        assert_eq!(config.max_redirects, 2);
        assert_eq!(config.max_body_bytes, Some(1024));
        assert!(config.domains.allowlist().contains("example.com"));
        assert!(config.domains.blocklist().contains("blocked.com"));
    }

    #[test]
    fn test_from_lookup() {
        let config = from_vars(&[
            (env::TIMEOUT, "10"),
            (env::USER_AGENT, "ReaderLM/1.0"),
            (env::BLOCK_PRIVATE_IPS, "FALSE"),
            (env::ALLOWED_DOMAINS, "example.com, docs.rs"),
            (env::BLOCKED_DOMAINS, "blocked.com"),
            (env::MAX_REDIRECTS, "3"),
            (env::MAX_BYTES, "2048"),
        ])
        .unwrap();

        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.user_agent, "ReaderLM/1.0");
        assert!(!config.ssrf_protection);
        assert_eq!(config.max_redirects, 3);
        assert_eq!(config.max_body_bytes, Some(2048));
        assert_eq!(config.domains.allowlist().len(), 2);
        assert!(config.domains.blocklist().contains("blocked.com"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(from_vars(&[(env::TIMEOUT, "thirty")]).is_err());
        assert!(from_vars(&[(env::TIMEOUT, "0")]).is_err());
        assert!(from_vars(&[(env::MAX_REDIRECTS, "-1")]).is_err());
        assert_eq!(
            from_vars(&[(env::BLOCK_PRIVATE_IPS, "maybe")]),
            Err(ConfigError::InvalidValue {
                key: env::BLOCK_PRIVATE_IPS.to_string(),
                value: "maybe".to_string(),
            })
        );
    }

    #[test]
    fn test_control_characters_in_user_agent_rejected() {
        assert_eq!(
            from_vars(&[(env::USER_AGENT, "Reader\u{1}LM")]),
            Err(ConfigError::InvalidValue {
                key: env::USER_AGENT.to_string(),
                value: "Reader\u{1}LM".to_string(),
            })
        );

        let config = FetchConfig::builder().user_agent("bad\nagent").build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = FetchConfig::builder().timeout(Duration::ZERO).build();
        assert!(config.validate().is_err());
        assert!(FetchConfig::default().validate().is_ok());
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = from_vars(&[
            (env::USER_AGENT, "  "),
            (env::MAX_BYTES, ""),
            (env::ALLOWED_DOMAINS, ""),
        ])
        .unwrap();
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert!(config.max_body_bytes.is_none());
        assert!(config.domains.allowlist().is_empty());
    }
}
