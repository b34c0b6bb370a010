//! Fetch pipeline for SafeFetch
//!
//! This module provides the main entry points for fetching URLs. Each stage
//! is a hard gate and nothing is retried:
//!
//! raw URL -> [`validate_url`] -> [`SsrfGuard`] -> [`Executor`] -> body

use crate::config::FetchConfig;
use crate::error::{Error, FetchFailed};
use crate::executor::Executor;
use crate::guard::SsrfGuard;
use crate::resolver::{Resolve, SystemResolver};
use crate::types::FetchedPage;
use crate::validate::{validate_url, ValidatedUrl};
use std::sync::Arc;
use tracing::{error, info};

/// SSRF-guarded fetcher
///
/// Cheap to clone and safe to share across tasks; all state is read-only
/// after construction.
#[derive(Debug, Clone)]
pub struct SafeFetcher {
    config: Arc<FetchConfig>,
    guard: SsrfGuard,
    executor: Executor,
}

impl SafeFetcher {
    /// Create a fetcher that resolves hostnames with the system resolver
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        Self::with_resolver(config, Arc::new(SystemResolver))
    }

    /// Create a fetcher with a custom resolver for the SSRF guard
    pub fn with_resolver(config: FetchConfig, resolver: Arc<dyn Resolve>) -> Result<Self, Error> {
        let guard = SsrfGuard::with_resolver(config.ssrf_protection, config.timeout, resolver);
        let executor = Executor::new(&config)?;
        Ok(Self {
            config: Arc::new(config),
            guard,
            executor,
        })
    }

    /// Configuration in effect
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Validate the URL and run the SSRF guard without fetching
    pub async fn check(&self, url: &str) -> Result<ValidatedUrl, Error> {
        let validated = validate_url(url, &self.config.domains)?;
        self.guard.check(&validated).await?;
        Ok(validated)
    }

    /// Fetch a URL and return the response with metadata
    ///
    /// DNS resolution and the request share one timeout budget.
    pub async fn fetch_page(&self, url: &str) -> Result<FetchedPage, Error> {
        let validated = validate_url(url, &self.config.domains)?;
        info!(url = %validated, "Fetching URL");

        let timeout = self.config.timeout;
        let page = match tokio::time::timeout(timeout, self.guard_and_execute(&validated)).await {
            Ok(result) => result?,
            Err(_) => {
                error!(url = %validated, ?timeout, "Timeout fetching URL");
                return Err(FetchFailed::Timeout(timeout).into());
            }
        };
        Ok(page)
    }

    async fn guard_and_execute(&self, validated: &ValidatedUrl) -> Result<FetchedPage, Error> {
        self.guard.check(validated).await?;
        let mut page = self.executor.execute(validated.url()).await?;
        page.url = validated.as_str().to_string();
        Ok(page)
    }

    /// Fetch a URL and return its body text
    pub async fn fetch(&self, url: &str) -> Result<String, Error> {
        Ok(self.fetch_page(url).await?.content)
    }
}

/// Fetch a URL with the given configuration
///
/// Builds a one-off [`SafeFetcher`]. Long-running callers should build one
/// fetcher at startup and reuse it.
pub async fn fetch(url: &str, config: &FetchConfig) -> Result<String, Error> {
    SafeFetcher::new(config.clone())?.fetch(url).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, SsrfError, ValidationError};

    #[tokio::test]
    async fn test_fetch_empty_url() {
        let result = fetch("", &FetchConfig::default()).await;
        assert!(matches!(
            result,
            Err(Error::Validation(ValidationError::EmptyUrl))
        ));
    }

    #[tokio::test]
    async fn test_fetch_invalid_scheme() {
        let result = fetch("ftp://example.com", &FetchConfig::default()).await;
        assert!(matches!(
            result,
            Err(Error::Validation(ValidationError::InvalidScheme(_)))
        ));
    }

    #[tokio::test]
    async fn test_check_blocks_loopback() {
        let fetcher = SafeFetcher::new(FetchConfig::default()).unwrap();
        let err = fetcher.check("http://127.0.0.1/admin").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SsrfBlocked);
        assert!(matches!(
            err,
            Error::SsrfBlocked(SsrfError::PrivateAddress(_))
        ));
    }

    #[tokio::test]
    async fn test_policy_runs_before_guard() {
        let config = FetchConfig::builder().block_domain("127.0.0.1").build();
        let fetcher = SafeFetcher::new(config).unwrap();
        let err = fetcher.check("http://127.0.0.1/").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_check_disabled_protection() {
        let config = FetchConfig::builder().ssrf_protection(false).build();
        let fetcher = SafeFetcher::new(config).unwrap();
        let validated = fetcher.check("http://127.0.0.1/").await.unwrap();
        assert_eq!(validated.as_str(), "http://127.0.0.1/");
    }
}
