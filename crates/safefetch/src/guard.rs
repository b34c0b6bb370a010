//! SSRF guard
//!
//! Runs after URL validation and before the executor opens any connection.
//! A literal IP host is classified directly; a hostname is resolved and is
//! only safe if every resolved address is public.
//!
//! The executor resolves the host again when it connects, and redirect
//! targets are not re-checked here. Both are accepted limitations.

use crate::error::SsrfError;
use crate::ip::classify_ip;
use crate::resolver::{resolve_hostname, Resolve, SystemResolver};
use crate::validate::ValidatedUrl;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Host;

/// Decides whether a validated URL is safe to dial
#[derive(Clone)]
pub struct SsrfGuard {
    enabled: bool,
    resolver: Arc<dyn Resolve>,
    dns_timeout: Duration,
}

impl std::fmt::Debug for SsrfGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SsrfGuard")
            .field("enabled", &self.enabled)
            .field("dns_timeout", &self.dns_timeout)
            .finish_non_exhaustive()
    }
}

impl SsrfGuard {
    /// Create a guard backed by the system resolver
    pub fn new(enabled: bool, dns_timeout: Duration) -> Self {
        Self::with_resolver(enabled, dns_timeout, Arc::new(SystemResolver))
    }

    /// Create a guard with a custom resolver
    pub fn with_resolver(enabled: bool, dns_timeout: Duration, resolver: Arc<dyn Resolve>) -> Self {
        Self {
            enabled,
            resolver,
            dns_timeout,
        }
    }

    /// Whether protection is active
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Check a validated URL, returning an error if it must not be fetched
    pub async fn check(&self, url: &ValidatedUrl) -> Result<(), SsrfError> {
        if !self.enabled {
            debug!(url = %url, "SSRF protection disabled");
            return Ok(());
        }

        let host = url.host().ok_or(SsrfError::MissingHostname)?;

        let domain = match host {
            Host::Ipv4(ip) => return check_literal(IpAddr::V4(ip)),
            Host::Ipv6(ip) => return check_literal(IpAddr::V6(ip)),
            Host::Domain(domain) => domain,
        };

        if let Ok(ip) = domain.parse::<IpAddr>() {
            return check_literal(ip);
        }

        let ips = resolve_hostname(self.resolver.as_ref(), domain, self.dns_timeout).await?;
        for ip in ips {
            let class = classify_ip(ip);
            if class.is_blocking() {
                warn!(host = domain, %ip, ?class, "Blocked hostname resolving to non-public address");
                return Err(SsrfError::ResolvesToPrivate {
                    host: domain.to_string(),
                    ip,
                });
            }
        }

        debug!(host = domain, "SSRF check passed");
        Ok(())
    }
}

fn check_literal(ip: IpAddr) -> Result<(), SsrfError> {
    let class = classify_ip(ip);
    if class.is_blocking() {
        warn!(%ip, ?class, "Blocked request to non-public address");
        return Err(SsrfError::PrivateAddress(ip));
    }
    Ok(())
}
