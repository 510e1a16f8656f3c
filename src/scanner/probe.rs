//! Port probe: a single bounded TCP connect.
//!
//! There are no retries. One failed or timed-out attempt means the port is
//! treated as not open for this pass.

use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

/// An established connection and how long the handshake took.
#[derive(Debug)]
pub struct OpenPort {
    /// Left open for the banner exchange.
    pub stream: TcpStream,
    pub latency_ms: u64,
}

/// Attempt one TCP connection to `(ip, port)` within `limit`.
///
/// Returns `None` on refusal, timeout or any other I/O error.
pub async fn probe(ip: IpAddr, port: u16, limit: Duration) -> Option<OpenPort> {
    let addr = SocketAddr::new(ip, port);
    let start = Instant::now();

    match timeout(limit, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => Some(OpenPort {
            stream,
            latency_ms: start.elapsed().as_millis() as u64,
        }),
        Ok(Err(e)) => {
            trace!(%addr, error = %e, "connect failed");
            None
        }
        Err(_) => {
            trace!(%addr, "connect timed out");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_probe_open_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let open = probe(IpAddr::V4(Ipv4Addr::LOCALHOST), port, Duration::from_millis(500)).await;
        assert!(open.is_some());
    }

    #[tokio::test]
    async fn test_probe_closed_port() {
        // Bind then drop to obtain a port nothing listens on.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let open = probe(IpAddr::V4(Ipv4Addr::LOCALHOST), port, Duration::from_millis(200)).await;
        assert!(open.is_none());
    }
}
