//! SafeFetch - SSRF-guarded web content fetching library
//!
//! This crate fetches a caller-supplied URL over HTTP(S) without letting the
//! service be used as a proxy into internal or cloud-control-plane networks.
//!
//! ## Pipeline
//!
//! Every call runs the same gates, in order, and stops at the first failure:
//!
//! 1. [`validate_url`] - scheme, hostname and [`DomainPolicy`] checks
//! 2. [`SsrfGuard`] - literal IPs are classified, hostnames resolved and
//!    every address classified with [`classify_ip`]
//! 3. [`Executor`] - one GET with a bounded timeout and redirect count
//!
//! Failures surface as [`Error::Validation`], [`Error::SsrfBlocked`] or
//! [`Error::Fetch`].
//!
//! ```rust,no_run
//! use safefetch::{FetchConfig, SafeFetcher};
//!
//! # async fn example() -> Result<(), safefetch::Error> {
//! let fetcher = SafeFetcher::new(FetchConfig::default())?;
//! let body = fetcher.fetch("https://example.com").await?;
//! println!("{} bytes", body.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
mod error;
pub mod executor;
pub mod guard;
pub mod ip;
mod policy;
pub mod resolver;
mod types;
mod validate;

use std::time::Duration;

pub use client::{fetch, SafeFetcher};
pub use config::{FetchConfig, FetchConfigBuilder};
pub use error::{ConfigError, Error, ErrorKind, FetchFailed, SsrfError, ValidationError};
pub use executor::Executor;
pub use guard::SsrfGuard;
pub use ip::{classify_ip, classify_ip_str, is_blocked_ip, IpClassification};
pub use policy::DomainPolicy;
pub use resolver::{resolve_hostname, Resolve, SystemResolver};
pub use types::{FetchRequest, FetchedPage};
pub use validate::{validate_url, ValidatedUrl};

/// Default User-Agent string
pub const DEFAULT_USER_AGENT: &str = "SafeFetch/1.0";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default redirect limit
pub const DEFAULT_MAX_REDIRECTS: usize = 5;

/// Tool description for LLM consumption
pub const TOOL_DESCRIPTION: &str = r#"Fetches the body of a public http(s) URL.

- Only http and https URLs
- Private, loopback, link-local and cloud metadata addresses are refused
- Single attempt with a strict timeout"#;
