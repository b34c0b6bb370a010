//! Fetch executor
//!
//! Performs the single GET request for a URL that already passed validation
//! and the SSRF guard. No retries: one attempt either succeeds or fails.

use crate::config::FetchConfig;
use crate::error::FetchFailed;
use crate::types::FetchedPage;
use bytes::BytesMut;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, USER_AGENT};
use reqwest::redirect::Policy as RedirectPolicy;
use std::time::Duration;
use tracing::{error, info};
use url::Url;

/// Accept header sent with every request
const ACCEPT_VALUE: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Accept-Language header sent with every request
const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.5";

/// HTTP executor with bounded timeout and redirects
#[derive(Debug, Clone)]
pub struct Executor {
    client: reqwest::Client,
    timeout: Duration,
    max_redirects: usize,
    max_body_bytes: Option<usize>,
}

impl Executor {
    /// Build the executor and its HTTP client
    pub fn new(config: &FetchConfig) -> Result<Self, FetchFailed> {
        let mut headers = HeaderMap::new();
        let user_agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|_| FetchFailed::InvalidUserAgent(config.user_agent.clone()))?;
        headers.insert(USER_AGENT, user_agent);
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));

        // No cookie store: pooled connections carry no per-caller state
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .redirect(RedirectPolicy::limited(config.max_redirects))
            .build()
            .map_err(FetchFailed::ClientBuild)?;

        Ok(Self {
            client,
            timeout: config.timeout,
            max_redirects: config.max_redirects,
            max_body_bytes: config.max_body_bytes,
        })
    }

    /// Fetch the URL, enforcing the wall-clock budget on the whole exchange
    pub async fn execute(&self, url: &Url) -> Result<FetchedPage, FetchFailed> {
        match tokio::time::timeout(self.timeout, self.send(url)).await {
            Ok(result) => result,
            Err(_) => {
                error!(url = %url, timeout = ?self.timeout, "Timeout fetching URL");
                Err(FetchFailed::Timeout(self.timeout))
            }
        }
    }

    async fn send(&self, url: &Url) -> Result<FetchedPage, FetchFailed> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.translate(url, e))?;

        let status = response.status();
        if status.as_u16() >= 400 {
            error!(url = %url, status = status.as_u16(), "HTTP error fetching URL");
            return Err(FetchFailed::HttpStatus {
                status: status.as_u16(),
                // Canonical phrase for the code; the server's own phrase is not kept
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = self.read_body(url, response).await?;
        let size = body.len() as u64;
        let content = String::from_utf8_lossy(&body).into_owned();

        info!(url = %url, bytes = size, "Successfully fetched URL");

        Ok(FetchedPage {
            url: url.to_string(),
            final_url,
            status_code: status.as_u16(),
            content_type,
            size,
            content,
        })
    }

    /// Stream the body, stopping early if it outgrows the configured cap
    async fn read_body(
        &self,
        url: &Url,
        response: reqwest::Response,
    ) -> Result<BytesMut, FetchFailed> {
        if let (Some(limit), Some(length)) = (self.max_body_bytes, response.content_length()) {
            if length > limit as u64 {
                error!(url = %url, length, limit, "Declared body size exceeds limit");
                return Err(FetchFailed::BodyTooLarge(limit));
            }
        }

        let mut body = BytesMut::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| self.translate(url, e))?;
            if let Some(limit) = self.max_body_bytes {
                if body.len() + chunk.len() > limit {
                    error!(url = %url, limit, "Body exceeds limit");
                    return Err(FetchFailed::BodyTooLarge(limit));
                }
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }

    fn translate(&self, url: &Url, err: reqwest::Error) -> FetchFailed {
        let failed = FetchFailed::from_reqwest(err, self.timeout, self.max_redirects);
        error!(url = %url, error = %failed, "Request error fetching URL");
        failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_builds_with_defaults() {
        let executor = Executor::new(&FetchConfig::default()).unwrap();
        assert_eq!(executor.timeout, Duration::from_secs(30));
        assert_eq!(executor.max_redirects, 5);
        assert!(executor.max_body_bytes.is_none());
    }

    #[test]
    fn test_invalid_user_agent_rejected() {
        let config = FetchConfig::builder().user_agent("Reader\u{1}LM").build();
        assert!(matches!(
            Executor::new(&config),
            Err(FetchFailed::InvalidUserAgent(ref ua)) if ua == "Reader\u{1}LM"
        ));
    }
}
