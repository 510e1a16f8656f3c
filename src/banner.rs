//! Banner grabbing over an already established TCP connection.
//!
//! Web ports get an active `HEAD` request; everything else is a passive read
//! of the service greeting. The deep path adds protocol-specific exchanges for
//! SSH, SMTP, FTP and MySQL. Every read and write is bounded by the caller's
//! timeout, and any failure yields an empty banner.

use std::io;
use std::time::Duration;
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::time::timeout;
use tracing::trace;

/// Bytes read for a standard-mode passive greeting.
const GREETING_SIZE: usize = 2048;

/// Bytes read for a deep-mode generic greeting.
const DEEP_GREETING_SIZE: usize = 1024;

/// Bytes read from a MySQL handshake packet.
const MYSQL_HANDSHAKE_SIZE: usize = 512;

/// Response lines kept from a standard-mode `HEAD` request.
const HTTP_MAX_LINES: usize = 20;

/// Response lines kept from a deep-mode `HEAD` request.
const DEEP_HTTP_MAX_LINES: usize = 30;

/// Greeting lines kept from an SMTP multi-line `220-` banner.
const SMTP_MAX_LINES: usize = 5;

/// How much protocol knowledge to apply when acquiring a banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerDepth {
    /// HTTP `HEAD` for web ports, passive read otherwise.
    Standard,
    /// Protocol-specific exchanges for SSH, SMTP, FTP, MySQL and HTTP.
    Deep,
}

/// The exchange chosen for a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exchange {
    Http,
    Ssh,
    Smtp,
    Ftp,
    Mysql,
    Greeting,
}

impl Exchange {
    fn select(port: u16, depth: BannerDepth) -> Self {
        if is_http_port(port) {
            return Self::Http;
        }
        match depth {
            BannerDepth::Standard => Self::Greeting,
            BannerDepth::Deep => match port {
                22 => Self::Ssh,
                25 | 465 | 587 => Self::Smtp,
                21 => Self::Ftp,
                3306 => Self::Mysql,
                _ => Self::Greeting,
            },
        }
    }
}

/// Grab a sanitized banner from an open connection.
///
/// `host` is sent as the HTTP `Host` header. Returns an empty string when the
/// service sends nothing or the exchange fails.
pub async fn grab_banner<S>(
    stream: S,
    host: &str,
    port: u16,
    depth: BannerDepth,
    io_timeout: Duration,
) -> String
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let exchange = Exchange::select(port, depth);
    let mut reader = BufReader::new(stream);

    let raw = match exchange {
        Exchange::Http => {
            let (request, max_lines, stop_at_blank) = match depth {
                BannerDepth::Standard => (
                    format!("HEAD / HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n", host),
                    HTTP_MAX_LINES,
                    false,
                ),
                BannerDepth::Deep => (
                    format!(
                        "HEAD / HTTP/1.1\r\nHost: {}\r\nUser-Agent: Anibus/{}\r\n\
                         Accept: */*\r\nConnection: close\r\n\r\n",
                        host,
                        env!("CARGO_PKG_VERSION")
                    ),
                    DEEP_HTTP_MAX_LINES,
                    true,
                ),
            };
            http_head(&mut reader, &request, max_lines, stop_at_blank, io_timeout).await
        }
        Exchange::Ssh | Exchange::Ftp => read_lines(&mut reader, 1, |_| false, io_timeout).await,
        Exchange::Smtp => {
            let more = |line: &str| line.starts_with("220-");
            read_lines(&mut reader, SMTP_MAX_LINES, more, io_timeout).await
        }
        Exchange::Mysql => read_chunk(&mut reader, MYSQL_HANDSHAKE_SIZE, io_timeout).await,
        Exchange::Greeting => {
            let size = match depth {
                BannerDepth::Standard => GREETING_SIZE,
                BannerDepth::Deep => DEEP_GREETING_SIZE,
            };
            read_chunk(&mut reader, size, io_timeout).await
        }
    };

    match raw {
        Ok(text) => sanitize_banner(&text),
        Err(e) => {
            trace!(port, ?exchange, error = %e, "banner exchange failed");
            String::new()
        }
    }
}

/// Send a `HEAD` request and join up to `max_lines` response lines with two spaces.
async fn http_head<S>(
    reader: &mut BufReader<S>,
    request: &str,
    max_lines: usize,
    stop_at_blank: bool,
    io_timeout: Duration,
) -> io::Result<String>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let stream = reader.get_mut();
    with_timeout(io_timeout, stream.write_all(request.as_bytes())).await?;
    with_timeout(io_timeout, stream.flush()).await?;

    let mut joined = String::new();
    for _ in 0..max_lines {
        let Some(line) = next_line(reader, io_timeout).await? else {
            break;
        };
        joined.push_str(&line);
        joined.push_str("  ");
        if stop_at_blank && line.is_empty() {
            break;
        }
    }
    Ok(joined)
}

/// Read up to `max_lines` lines, continuing only while `more` accepts the last one.
async fn read_lines<S, F>(
    reader: &mut BufReader<S>,
    max_lines: usize,
    more: F,
    io_timeout: Duration,
) -> io::Result<String>
where
    S: AsyncRead + Unpin,
    F: Fn(&str) -> bool,
{
    let mut joined = String::new();
    for _ in 0..max_lines {
        let Some(line) = next_line(reader, io_timeout).await? else {
            break;
        };
        joined.push_str(&line);
        joined.push_str("  ");
        if !more(&line) {
            break;
        }
    }
    Ok(joined)
}

/// One line without its terminator, or `None` at end of stream.
async fn next_line<S>(
    reader: &mut BufReader<S>,
    io_timeout: Duration,
) -> io::Result<Option<String>>
where
    S: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let n = with_timeout(io_timeout, reader.read_until(b'\n', &mut buf)).await?;
    if n == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(&buf);
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// A single read of at most `size` bytes.
async fn read_chunk<S>(
    reader: &mut BufReader<S>,
    size: usize,
    io_timeout: Duration,
) -> io::Result<String>
where
    S: AsyncRead + Unpin,
{
    let mut buffer = vec![0u8; size];
    let n = with_timeout(io_timeout, reader.read(&mut buffer)).await?;
    Ok(String::from_utf8_lossy(&buffer[..n]).into_owned())
}

async fn with_timeout<T, F>(limit: Duration, fut: F) -> io::Result<T>
where
    F: std::future::Future<Output = io::Result<T>>,
{
    timeout(limit, fut)
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "banner read timed out"))?
}

/// Check if a port is treated as an HTTP endpoint.
pub fn is_http_port(port: u16) -> bool {
    matches!(port, 80 | 443 | 8080 | 8443 | 8000 | 8888 | 3000 | 9090)
}

/// Strip control characters, collapse whitespace runs to one space, and trim.
pub fn sanitize_banner(raw: &str) -> String {
    let visible: String = raw
        .chars()
        .filter(|&c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect();

    visible.split_whitespace().collect::<Vec<_>>().join(" ")
}
