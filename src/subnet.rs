//! Best-effort local subnet and gateway inference.
//!
//! Walks the local network interfaces looking for one whose IPv4 network
//! contains the target. If none does, a classful estimate is reported for
//! display only. Nothing here can fail a scan.

use ipnetwork::{IpNetwork, Ipv4Network};
use pnet::datalink;
use serde::Serialize;
use std::net::{IpAddr, Ipv4Addr};
use tracing::debug;

/// What could be inferred about the target's network.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SubnetInfo {
    /// CIDR block, e.g. `192.168.1.0/24`.
    pub cidr: Option<String>,
    /// Likely gateway, only known when a local interface shares the subnet.
    pub gateway: Option<String>,
}

impl SubnetInfo {
    pub fn is_empty(&self) -> bool {
        self.cidr.is_none() && self.gateway.is_none()
    }
}

/// Infers subnet information from the local interfaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubnetScanner;

impl SubnetScanner {
    pub fn new() -> Self {
        Self
    }

    /// Inspect local interfaces for `target`.
    ///
    /// Interface enumeration is a blocking system call, so it runs on the
    /// blocking pool. Any failure produces an empty `SubnetInfo`.
    pub async fn detect(&self, target: IpAddr) -> SubnetInfo {
        match tokio::task::spawn_blocking(move || {
            let networks: Vec<IpNetwork> = datalink::interfaces()
                .into_iter()
                .filter(|iface| iface.is_up() && !iface.is_loopback())
                .flat_map(|iface| iface.ips)
                .collect();
            infer(target, &networks)
        })
        .await
        {
            Ok(info) => info,
            Err(e) => {
                debug!(error = %e, "subnet detection aborted");
                SubnetInfo::default()
            }
        }
    }
}

/// Pure inference over a set of local networks.
pub fn infer(target: IpAddr, local: &[IpNetwork]) -> SubnetInfo {
    let IpAddr::V4(target) = target else {
        return SubnetInfo::default();
    };

    let shared = local.iter().find_map(|network| match network {
        IpNetwork::V4(net) if net.contains(target) => Some(*net),
        _ => None,
    });

    match shared {
        Some(net) => SubnetInfo {
            cidr: Some(format!("{}/{}", net.network(), net.prefix())),
            gateway: Some(likely_gateway(net).to_string()),
        },
        None => SubnetInfo {
            cidr: classful_estimate(target).map(|net| net.to_string()),
            gateway: None,
        },
    }
}

/// The subnet's `.1` address.
pub fn likely_gateway(net: Ipv4Network) -> Ipv4Addr {
    let mut octets = net.network().octets();
    octets[3] = 1;
    Ipv4Addr::from(octets)
}

/// Class A/B/C network for `ip`, `None` outside those classes.
pub fn classful_estimate(ip: Ipv4Addr) -> Option<Ipv4Network> {
    let prefix = match ip.octets()[0] {
        1..=126 => 8,
        128..=191 => 16,
        192..=223 => 24,
        _ => return None,
    };
    let mask = u32::MAX << (32 - prefix);
    Ipv4Network::new(Ipv4Addr::from(u32::from(ip) & mask), prefix).ok()
}
