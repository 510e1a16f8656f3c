//! Standard scanning: connect, grab a generic banner, look the port up.

use super::probe::probe;
use super::traits::{PortResult, ScanMode, ScanStrategy};
use crate::banner::{grab_banner, BannerDepth};
use crate::services::ServiceRegistry;
use crate::types::Port;
use crate::version::VersionExtractor;
use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default connect and read timeout for standard scanning.
pub const STANDARD_TIMEOUT: Duration = Duration::from_millis(200);

/// Fast scan: one connect, HTTP `HEAD` on web ports, passive read elsewhere.
#[derive(Debug, Clone)]
pub struct StandardStrategy {
    registry: Arc<ServiceRegistry>,
    versions: Arc<VersionExtractor>,
    timeout: Duration,
}

impl StandardStrategy {
    pub fn new(registry: Arc<ServiceRegistry>, versions: Arc<VersionExtractor>) -> Self {
        Self {
            registry,
            versions,
            timeout: STANDARD_TIMEOUT,
        }
    }

    /// Override the per-operation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ScanStrategy for StandardStrategy {
    fn mode(&self) -> ScanMode {
        ScanMode::Standard
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn scan_port(&self, ip: IpAddr, host: &str, port: Port) -> Option<PortResult> {
        let open = probe(ip, port.as_u16(), self.timeout).await?;
        let banner = grab_banner(
            open.stream,
            host,
            port.as_u16(),
            BannerDepth::Standard,
            self.timeout,
        )
        .await;
        debug!(port = port.as_u16(), banner_len = banner.len(), "open port");

        Some(
            PortResult::open(port, ScanMode::Standard, open.latency_ms)
                .with_service(self.registry.service_name(port.as_u16()))
                .with_protocol(self.registry.protocol(port.as_u16(), &banner))
                .with_version(self.versions.extract(&banner))
                .with_banner(banner),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    fn strategy() -> StandardStrategy {
        let registry = Arc::new(ServiceRegistry::builtin());
        StandardStrategy::new(registry, Arc::new(VersionExtractor::new()))
            .with_timeout(Duration::from_millis(500))
    }

    #[tokio::test]
    async fn test_open_port_with_greeting() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(b"SSH-2.0-OpenSSH_8.4p1 Debian-5\r\n").await.unwrap();
            tokio::time::sleep(Duration::from_millis(200)).await;
        });

        let result = strategy()
            .scan_port(IpAddr::V4(Ipv4Addr::LOCALHOST), "localhost", Port::new(port).unwrap())
            .await
            .expect("port should be open");

        assert_eq!(result.mode, ScanMode::Standard);
        assert_eq!(result.version, "OpenSSH_8.4p1");
        assert!(result.banner.starts_with("SSH-2.0-OpenSSH_8.4p1"));
    }

    #[tokio::test]
    async fn test_silent_service_reports_empty_banner() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(1)).await;
        });

        let result = strategy()
            .scan_port(IpAddr::V4(Ipv4Addr::LOCALHOST), "localhost", Port::new(port).unwrap())
            .await
            .expect("port should be open");

        assert!(result.banner.is_empty());
        assert!(result.version.is_empty());
        assert_eq!(result.protocol, "TCP");
    }

    #[tokio::test]
    async fn test_closed_port() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let result = strategy()
            .scan_port(IpAddr::V4(Ipv4Addr::LOCALHOST), "localhost", Port::new(port).unwrap())
            .await;
        assert!(result.is_none());
    }
}
