//! Service registry: port number to service name and transport label.
//!
//! The registry is an explicit value built once at startup and shared by
//! reference with the scanning components. It is read-only while scanning.
//!
//! Data files use one entry per line:
//!
//! ```text
//! # comment
//! 22=SSH|TCP (SSH)
//! 8081=Internal API
//! ```

use crate::error::{ConfigError, ConfigResult};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::warn;

/// Banner keywords implying an encrypted transport, in match order.
const ENCRYPTION_KEYWORDS: &[&str] = &[
    "starttls", "tls", "ssl", "https", "smtps", "imaps", "pop3s", "aes", "rsa", "sha", "gcm",
    "ecdhe", "dhe", "cipher", "certificate",
];

/// Well-known service names.
const SERVICE_NAMES: &[(u16, &str)] = &[
    (20, "FTP-DATA"),
    (21, "FTP"),
    (22, "SSH"),
    (23, "Telnet"),
    (25, "SMTP"),
    (53, "DNS"),
    (67, "DHCP Server"),
    (68, "DHCP Client"),
    (69, "TFTP"),
    (80, "HTTP"),
    (88, "Kerberos"),
    (110, "POP3"),
    (111, "RPCBind"),
    (119, "NNTP"),
    (123, "NTP"),
    (135, "MSRPC"),
    (137, "NetBIOS-NS"),
    (138, "NetBIOS-DGM"),
    (139, "NetBIOS-SSN"),
    (143, "IMAP"),
    (161, "SNMP"),
    (162, "SNMP Trap"),
    (179, "BGP"),
    (389, "LDAP"),
    (443, "HTTPS"),
    (445, "SMB"),
    (465, "SMTPS"),
    (514, "Syslog"),
    (515, "LPD/LPR"),
    (554, "RTSP"),
    (587, "SMTP Submission"),
    (631, "IPP"),
    (636, "LDAPS"),
    (873, "rsync"),
    (993, "IMAPS"),
    (995, "POP3S"),
    (1080, "SOCKS"),
    (1194, "OpenVPN"),
    (1433, "MS SQL"),
    (1434, "MS SQL Browser"),
    (1521, "Oracle DB"),
    (1723, "PPTP"),
    (1883, "MQTT"),
    (2049, "NFS"),
    (2082, "cPanel"),
    (2083, "cPanel SSL"),
    (2181, "ZooKeeper"),
    (2375, "Docker"),
    (2376, "Docker SSL"),
    (3000, "Dev Server"),
    (3128, "Squid"),
    (3306, "MySQL"),
    (3389, "RDP"),
    (5060, "SIP"),
    (5432, "PostgreSQL"),
    (5672, "AMQP"),
    (5900, "VNC"),
    (5984, "CouchDB"),
    (6379, "Redis"),
    (6443, "Kubernetes API"),
    (8000, "HTTP Alt"),
    (8080, "HTTP Proxy"),
    (8443, "HTTPS Alt"),
    (8888, "HTTP Alt"),
    (9090, "Prometheus"),
    (9092, "Kafka"),
    (9200, "Elasticsearch"),
    (9300, "ES Transport"),
    (11211, "Memcached"),
    (15672, "RabbitMQ Mgmt"),
    (27017, "MongoDB"),
];

/// Ports whose transport is known to be encrypted or SSH regardless of banner.
const TRANSPORT_LABELS: &[(u16, &str)] = &[
    (22, "TCP (SSH)"),
    (443, "TCP (HTTPS/TLS)"),
    (465, "TCP (SMTPS/TLS)"),
    (636, "TCP (LDAPS/TLS)"),
    (993, "TCP (IMAPS/TLS)"),
    (995, "TCP (POP3S/TLS)"),
    (2083, "TCP (cPanel/TLS)"),
    (3389, "TCP (RDP/TLS)"),
    (8443, "TCP (HTTPS/TLS)"),
];

/// Plaintext protocol labels, consulted after banner keywords.
const PLAINTEXT_LABELS: &[(u16, &str)] = &[
    (21, "TCP (FTP)"),
    (23, "TCP (Telnet)"),
    (25, "TCP (SMTP)"),
    (53, "TCP (DNS)"),
    (80, "TCP (HTTP)"),
    (110, "TCP (POP3)"),
    (143, "TCP (IMAP)"),
    (389, "TCP (LDAP)"),
    (445, "TCP (SMB)"),
];

/// How ports missing from the name table are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnknownName {
    /// `"Port N"`, used by the built-in tables.
    PortNumber,
    /// `"Unrecognized"`, used by registries loaded from data files.
    Unrecognized,
}

/// Lookup tables for service names and protocol labels.
#[derive(Debug, Clone)]
pub struct ServiceRegistry {
    names: HashMap<u16, String>,
    transports: HashMap<u16, String>,
    plaintext: HashMap<u16, String>,
    unknown: UnknownName,
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ServiceRegistry {
    /// Registry backed by the compiled-in tables.
    pub fn builtin() -> Self {
        let table = |entries: &[(u16, &str)]| {
            entries
                .iter()
                .map(|&(port, label)| (port, label.to_string()))
                .collect::<HashMap<_, _>>()
        };

        Self {
            names: table(SERVICE_NAMES),
            transports: table(TRANSPORT_LABELS),
            plaintext: table(PLAINTEXT_LABELS),
            unknown: UnknownName::PortNumber,
        }
    }

    /// Registry populated only from data files.
    ///
    /// Ports missing from every file are reported as `"Unrecognized"`.
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> ConfigResult<Self> {
        let mut registry = Self {
            names: HashMap::new(),
            transports: HashMap::new(),
            plaintext: HashMap::new(),
            unknown: UnknownName::Unrecognized,
        };
        for path in paths {
            registry.merge_file(path.as_ref())?;
        }
        Ok(registry)
    }

    /// Layer the entries of one data file over this registry.
    pub fn merge_file(&mut self, path: &Path) -> ConfigResult<usize> {
        let file = File::open(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        self.merge_reader(BufReader::new(file))
            .map_err(|e| ConfigError::ReadFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    /// Layer entries read from `reader` over this registry.
    ///
    /// Returns the number of entries accepted. Malformed lines are skipped.
    pub fn merge_reader<R: BufRead>(&mut self, reader: R) -> std::io::Result<usize> {
        let mut accepted = 0;
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match parse_entry(line) {
                Some((port, name, protocol)) => {
                    self.names.insert(port, name.to_string());
                    if !protocol.is_empty() {
                        self.transports.insert(port, protocol.to_string());
                    }
                    accepted += 1;
                }
                None => warn!(line = index + 1, entry = line, "skipping malformed registry entry"),
            }
        }
        Ok(accepted)
    }

    /// Human-readable service name for `port`.
    pub fn service_name(&self, port: u16) -> String {
        match self.names.get(&port) {
            Some(name) => name.clone(),
            None => match self.unknown {
                UnknownName::PortNumber => format!("Port {}", port),
                UnknownName::Unrecognized => "Unrecognized".to_string(),
            },
        }
    }

    /// Protocol / transport label for `port`, given the banner it returned.
    ///
    /// Resolution order: fixed transport label for the port, encryption
    /// keyword found in the banner, plaintext label for the port, `"TCP"`.
    pub fn protocol(&self, port: u16, banner: &str) -> String {
        if let Some(label) = self.transports.get(&port) {
            return label.clone();
        }

        if let Some(keyword) = encryption_keyword(banner) {
            return if keyword == "starttls" {
                "TCP (STARTTLS)".to_string()
            } else {
                format!("TCP (Encrypted: {})", keyword.to_uppercase())
            };
        }

        self.plaintext
            .get(&port)
            .cloned()
            .unwrap_or_else(|| "TCP".to_string())
    }

    /// Number of ports with a known service name.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// First encryption keyword contained in `banner`, case-insensitively.
fn encryption_keyword(banner: &str) -> Option<&'static str> {
    if banner.is_empty() {
        return None;
    }
    let lower = banner.to_lowercase();
    ENCRYPTION_KEYWORDS
        .iter()
        .copied()
        .find(|keyword| lower.contains(keyword))
}

/// Parse `port=Name|Protocol`.
fn parse_entry(line: &str) -> Option<(u16, &str, &str)> {
    let (port, rest) = line.split_once('=')?;
    let port: u16 = port.trim().parse().ok()?;
    if port == 0 {
        return None;
    }
    let (name, protocol) = rest.split_once('|').unwrap_or((rest, ""));
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((port, name, protocol.trim()))
}
