//! Host resolution: target text to one IP address and a canonical name.
//!
//! Literal addresses skip forward lookup. The canonical name comes from a
//! best-effort reverse lookup; when that fails the address text is used.

use crate::error::{ScanError, ScanResult};
use serde::Serialize;
use std::net::IpAddr;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::system_conf::read_system_conf;
use trust_dns_resolver::TokioAsyncResolver;

/// Default bound on a single forward or reverse lookup.
pub const RESOLVE_TIMEOUT: Duration = Duration::from_secs(3);

/// A target that resolved successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedHost {
    pub ip: IpAddr,
    /// Canonical name, or the address text when none is known.
    pub hostname: String,
}

/// Resolves scan targets through the system resolver configuration.
#[derive(Debug, Clone)]
pub struct HostResolver {
    reverse_lookup: bool,
    timeout: Duration,
}

impl Default for HostResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl HostResolver {
    pub fn new() -> Self {
        Self {
            reverse_lookup: true,
            timeout: RESOLVE_TIMEOUT,
        }
    }

    /// Enable or disable the PTR lookup for the canonical name.
    pub fn with_reverse_lookup(mut self, enabled: bool) -> Self {
        self.reverse_lookup = enabled;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve `host` to a single address.
    ///
    /// Fails with [`ScanError::UnknownHost`] when the name does not resolve.
    pub async fn resolve(&self, host: &str) -> ScanResult<ResolvedHost> {
        let host = host.trim();
        let literal = host.parse::<IpAddr>().ok();

        // Literal addresses without a PTR lookup never touch the resolver.
        if let (Some(ip), false) = (literal, self.reverse_lookup) {
            return Ok(ResolvedHost {
                ip,
                hostname: ip.to_string(),
            });
        }

        let resolver = self.build_resolver();
        let ip = match literal {
            Some(ip) => ip,
            None => self.forward(&resolver, host).await?,
        };

        let hostname = if self.reverse_lookup {
            self.reverse(&resolver, ip).await.unwrap_or_else(|| ip.to_string())
        } else {
            host.to_string()
        };

        debug!(host, %ip, %hostname, "host resolved");
        Ok(ResolvedHost { ip, hostname })
    }

    fn build_resolver(&self) -> TokioAsyncResolver {
        let (config, mut opts) = read_system_conf().unwrap_or_else(|e| {
            warn!(error = %e, "system resolver configuration unavailable, using defaults");
            (ResolverConfig::default(), ResolverOpts::default())
        });
        opts.timeout = self.timeout;
        opts.attempts = 1;
        TokioAsyncResolver::tokio(config, opts)
    }

    async fn forward(&self, resolver: &TokioAsyncResolver, host: &str) -> ScanResult<IpAddr> {
        if host.is_empty() {
            return Err(unknown(host, "empty host name"));
        }

        let response = timeout(self.timeout, resolver.lookup_ip(host))
            .await
            .map_err(|_| unknown(host, "lookup timed out"))?
            .map_err(|e| unknown(host, &e.to_string()))?;

        response
            .iter()
            .next()
            .ok_or_else(|| unknown(host, "no addresses found"))
    }

    async fn reverse(&self, resolver: &TokioAsyncResolver, ip: IpAddr) -> Option<String> {
        match timeout(self.timeout, resolver.reverse_lookup(ip)).await {
            Ok(Ok(names)) => names
                .iter()
                .next()
                .map(|name| name.to_string().trim_end_matches('.').to_string())
                .filter(|name| !name.is_empty()),
            Ok(Err(e)) => {
                debug!(%ip, error = %e, "reverse lookup failed");
                None
            }
            Err(_) => {
                debug!(%ip, "reverse lookup timed out");
                None
            }
        }
    }
}

/// Reduce user input such as `https://example.com:8080/path` to a bare host.
///
/// Strips an `http://` or `https://` scheme, anything from the first `/`,
/// `?` or `#`, and a trailing `:port`. Bracketed IPv6 (`[::1]:22`) loses its
/// brackets and port; bare IPv6 literals are left alone.
pub fn sanitize_host(input: &str) -> String {
    let mut host = input.trim();

    for scheme in ["https://", "http://"] {
        let matched = host
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme));
        if matched {
            host = &host[scheme.len()..];
            break;
        }
    }

    if let Some(end) = host.find(['/', '?', '#']) {
        host = &host[..end];
    }

    if let Some(rest) = host.strip_prefix('[') {
        return match rest.split_once(']') {
            Some((inner, _)) => inner.to_string(),
            None => rest.to_string(),
        };
    }

    // A single colon is a port separator; more than one means IPv6.
    match host.split_once(':') {
        Some((name, port)) if !port.contains(':') => name.to_string(),
        _ => host.to_string(),
    }
}

fn unknown(host: &str, reason: &str) -> ScanError {
    ScanError::UnknownHost {
        host: host.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_literal_address_without_reverse_lookup() {
        let resolver = HostResolver::new().with_reverse_lookup(false);
        let resolved = tokio_test::assert_ok!(resolver.resolve(" 127.0.0.1 ").await);

        assert_eq!(resolved.ip, "127.0.0.1".parse::<IpAddr>().unwrap());
        assert_eq!(resolved.hostname, "127.0.0.1");
    }

    #[tokio::test]
    async fn test_literal_ipv6_address() {
        let resolver = HostResolver::new().with_reverse_lookup(false);
        let resolved = resolver.resolve("::1").await.unwrap();
        assert!(resolved.ip.is_ipv6());
    }

    #[tokio::test]
    async fn test_unresolvable_host() {
        let resolver = HostResolver::new()
            .with_reverse_lookup(false)
            .with_timeout(Duration::from_secs(2));
        let err = resolver.resolve("definitely-invalid.invalid").await.unwrap_err();

        assert!(matches!(
            err,
            ScanError::UnknownHost { ref host, .. } if host == "definitely-invalid.invalid"
        ));
    }

    #[tokio::test]
    async fn test_empty_host() {
        let resolver = HostResolver::new().with_reverse_lookup(false);
        assert!(resolver.resolve("   ").await.is_err());
    }

    #[test]
    fn test_sanitize_host_strips_scheme_path_and_port() {
        assert_eq!(sanitize_host("http://127.0.0.1:8080/index.html"), "127.0.0.1");
        assert_eq!(sanitize_host("HTTPS://Example.com/a/b?q=1"), "Example.com");
        assert_eq!(sanitize_host("example.com:8443"), "example.com");
        assert_eq!(sanitize_host("example.com?x#frag"), "example.com");
        assert_eq!(sanitize_host("  scanme.nmap.org  "), "scanme.nmap.org");
        assert_eq!(sanitize_host("фсб.рф:443"), "фсб.рф");
    }

    #[test]
    fn test_sanitize_host_ipv6() {
        assert_eq!(sanitize_host("[::1]:22"), "::1");
        assert_eq!(sanitize_host("http://[fe80::1]/"), "fe80::1");
        assert_eq!(sanitize_host("::1"), "::1");
        assert_eq!(sanitize_host("2001:db8::5"), "2001:db8::5");
    }

    #[tokio::test]
    async fn test_sanitized_url_resolves() {
        let resolver = HostResolver::new().with_reverse_lookup(false);
        let host = sanitize_host("http://127.0.0.1:8080/index.html");
        let resolved = tokio_test::assert_ok!(resolver.resolve(&host).await);
        assert_eq!(resolved.ip.to_string(), "127.0.0.1");
    }
}
