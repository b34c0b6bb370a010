//! Domain allow/block policy

use crate::error::ValidationError;
use std::collections::HashSet;

/// Hostname allowlist and blocklist
///
/// Built once at startup and shared read-only. Entries are stored lowercase
/// without a trailing dot, and hostnames are normalized the same way before
/// lookup, so `Example.COM.` matches an entry for `example.com`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainPolicy {
    allowlist: HashSet<String>,
    blocklist: HashSet<String>,
}

impl DomainPolicy {
    /// Create a policy from explicit hostname lists
    pub fn new<A, B>(allow: A, block: B) -> Self
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        B: IntoIterator,
        B::Item: AsRef<str>,
    {
        Self {
            allowlist: normalize_all(allow),
            blocklist: normalize_all(block),
        }
    }

    /// Create a policy from comma-separated hostname lists
    ///
    /// Blank entries are ignored, so `""` yields an empty list.
    pub fn from_csv(allow: &str, block: &str) -> Self {
        Self::new(allow.split(','), block.split(','))
    }

    /// Add a hostname to the allowlist
    pub fn allow(&mut self, host: &str) {
        if let Some(host) = normalize(host) {
            self.allowlist.insert(host);
        }
    }

    /// Add a hostname to the blocklist
    pub fn block(&mut self, host: &str) {
        if let Some(host) = normalize(host) {
            self.blocklist.insert(host);
        }
    }

    /// Allowed hostnames (empty means every host is allowed)
    pub fn allowlist(&self) -> &HashSet<String> {
        &self.allowlist
    }

    /// Blocked hostnames
    pub fn blocklist(&self) -> &HashSet<String> {
        &self.blocklist
    }

    /// Check a hostname against the policy
    ///
    /// A non-empty allowlist must contain the host. The blocklist rejects
    /// regardless of the allowlist outcome.
    pub fn check(&self, host: &str) -> Result<(), ValidationError> {
        let host = normalize(host).unwrap_or_default();

        if !self.allowlist.is_empty() && !self.allowlist.contains(&host) {
            return Err(ValidationError::DomainNotAllowed(host));
        }

        if self.blocklist.contains(&host) {
            return Err(ValidationError::DomainBlocked(host));
        }

        Ok(())
    }
}

fn normalize(host: &str) -> Option<String> {
    let host = host.trim();
    let host = host.strip_suffix('.').unwrap_or(host);
    if host.is_empty() {
        None
    } else {
        Some(host.to_lowercase())
    }
}

fn normalize_all<I>(hosts: I) -> HashSet<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    hosts
        .into_iter()
        .filter_map(|h| normalize(h.as_ref()))
        .collect()
}
