//! Service detection: protocol-aware probes, banner refinement and security
//! layer tagging, plus a one-off subnet inference before probing starts.

use super::events::{EventSink, ScanEvent};
use super::probe::probe;
use super::traits::{PortResult, ScanMode, ScanStrategy};
use crate::banner::{grab_banner, BannerDepth};
use crate::fingerprint::{refine_protocol, refine_service, tag_security};
use crate::services::ServiceRegistry;
use crate::subnet::SubnetScanner;
use crate::types::Port;
use crate::version::VersionExtractor;
use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default connect and read timeout for service detection.
pub const DETECTION_TIMEOUT: Duration = Duration::from_millis(500);

/// Placeholder published when part of the subnet information is unknown.
const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone)]
pub struct ServiceDetectionStrategy {
    registry: Arc<ServiceRegistry>,
    versions: Arc<VersionExtractor>,
    subnet: SubnetScanner,
    timeout: Duration,
}

impl ServiceDetectionStrategy {
    pub fn new(registry: Arc<ServiceRegistry>, versions: Arc<VersionExtractor>) -> Self {
        Self {
            registry,
            versions,
            subnet: SubnetScanner::new(),
            timeout: DETECTION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Apply banner-driven refinements to a registry classification.
    fn classify(&self, port: u16, banner: &str) -> (String, String) {
        let service = self.registry.service_name(port);
        let protocol = self.registry.protocol(port, banner);
        if banner.is_empty() {
            return (service, protocol);
        }

        let service = tag_security(&refine_service(&service, banner), banner);
        let protocol = refine_protocol(&protocol, banner);
        (service, protocol)
    }
}

#[async_trait]
impl ScanStrategy for ServiceDetectionStrategy {
    fn mode(&self) -> ScanMode {
        ScanMode::ServiceDetection
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn prepare(&self, ip: IpAddr, events: &EventSink) {
        let info = self.subnet.detect(ip).await;
        if info.is_empty() {
            debug!(%ip, "no subnet information");
            return;
        }
        events.send(ScanEvent::SubnetDetected {
            cidr: info.cidr.unwrap_or_else(|| UNKNOWN.to_string()),
            gateway: info.gateway.unwrap_or_else(|| UNKNOWN.to_string()),
        });
    }

    async fn scan_port(&self, ip: IpAddr, host: &str, port: Port) -> Option<PortResult> {
        let open = probe(ip, port.as_u16(), self.timeout).await?;
        let banner =
            grab_banner(open.stream, host, port.as_u16(), BannerDepth::Deep, self.timeout).await;
        let (service, protocol) = self.classify(port.as_u16(), &banner);
        debug!(port = port.as_u16(), %service, %protocol, "service detected");

        Some(
            PortResult::open(port, ScanMode::ServiceDetection, open.latency_ms)
                .with_service(service)
                .with_protocol(protocol)
                .with_version(self.versions.extract(&banner))
                .with_banner(banner),
        )
    }

    fn narrate(&self, result: &PortResult) -> Option<String> {
        let port = result.port.as_u16();
        Some(if result.has_security_tag() {
            format!("[SECURITY] Security detected: {} on port {}", result.service, port)
        } else {
            format!("Detected: {} on port {}", result.service, port)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    fn strategy() -> ServiceDetectionStrategy {
        let registry = Arc::new(ServiceRegistry::builtin());
        ServiceDetectionStrategy::new(registry, Arc::new(VersionExtractor::new()))
    }

    #[test]
    fn test_classify_refines_and_tags() {
        let banner = "HTTP/1.1 403 Forbidden  Server: cloudflare  CF-RAY: 7d2a";
        let (service, protocol) = strategy().classify(80, banner);
        assert_eq!(service, "HTTP [Cloudflare CDN/WAF]");
        assert_eq!(protocol, "HTTP/1.1");
    }

    #[test]
    fn test_classify_product_name() {
        let (service, protocol) = strategy().classify(22, "SSH-2.0-OpenSSH_8.4p1 Debian-5");
        assert_eq!(service, "OpenSSH");
        assert_eq!(protocol, "SSH 2.0");
    }

    #[test]
    fn test_classify_without_banner() {
        let (service, protocol) = strategy().classify(6379, "");
        assert_eq!(service, "Redis");
        assert_eq!(protocol, "TCP");
    }

    #[test]
    fn test_narration() {
        let port = Port::new(443).unwrap();
        let plain = PortResult::open(port, ScanMode::ServiceDetection, 3).with_service("Nginx");
        let tagged = plain.clone().with_service("Nginx [Akamai CDN]");

        let strategy = strategy();
        assert_eq!(strategy.narrate(&plain).unwrap(), "Detected: Nginx on port 443");
        assert_eq!(
            strategy.narrate(&tagged).unwrap(),
            "[SECURITY] Security detected: Nginx [Akamai CDN] on port 443"
        );
    }

    #[tokio::test]
    async fn test_scan_refines_greeting() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(b"220 mail.example.com ESMTP Postfix\r\n").await.unwrap();
            tokio::time::sleep(Duration::from_millis(200)).await;
        });

        let result = strategy()
            .scan_port(IpAddr::V4(Ipv4Addr::LOCALHOST), "localhost", Port::new(port).unwrap())
            .await
            .expect("port should be open");

        assert_eq!(result.mode, ScanMode::ServiceDetection);
        assert_eq!(result.service, "Postfix SMTP");
        assert_eq!(result.protocol, "SMTP");
        assert!(result.banner.contains("ESMTP Postfix"));
    }
}
