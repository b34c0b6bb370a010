//! Hostname resolution
//!
//! [`Resolve`] is the seam between the SSRF guard and DNS. The guard only
//! ever sees addresses through [`resolve_hostname`], which turns every
//! failure mode into a blocking error.

use crate::error::SsrfError;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::io;
use std::net::IpAddr;
use std::time::Duration;
use tracing::{debug, warn};

/// DNS lookup backend
#[async_trait]
pub trait Resolve: Send + Sync {
    /// Look up every address the host could connect to, both families
    async fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>>;
}

/// System resolver (getaddrinfo via tokio)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl Resolve for SystemResolver {
    async fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        let addrs = tokio::net::lookup_host((host, 0)).await?;
        Ok(addrs.map(|addr| addr.ip()).collect())
    }
}

/// Resolve a hostname to its deduplicated set of addresses
///
/// Never returns an empty set: lookup errors, timeouts and empty answers
/// all become [`SsrfError::Unresolvable`].
pub async fn resolve_hostname(
    resolver: &dyn Resolve,
    host: &str,
    timeout: Duration,
) -> Result<Vec<IpAddr>, SsrfError> {
    let unresolvable = |reason: String| SsrfError::Unresolvable {
        host: host.to_string(),
        reason,
    };

    let addrs = match tokio::time::timeout(timeout, resolver.lookup(host)).await {
        Ok(Ok(addrs)) => addrs,
        Ok(Err(e)) => {
            warn!(host, error = %e, "DNS resolution failed");
            return Err(unresolvable(e.to_string()));
        }
        Err(_) => {
            warn!(host, ?timeout, "DNS resolution timed out");
            return Err(unresolvable(format!("timed out after {timeout:?}")));
        }
    };

    let unique: BTreeSet<IpAddr> = addrs.into_iter().collect();
    if unique.is_empty() {
        warn!(host, "DNS resolution returned no addresses");
        return Err(unresolvable("no addresses".to_string()));
    }

    let ips: Vec<IpAddr> = unique.into_iter().collect();
    debug!(host, ips = ?ips, "Resolved hostname");
    Ok(ips)
}
