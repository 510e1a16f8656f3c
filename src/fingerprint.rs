//! Banner-driven refinements used by service detection.
//!
//! All matching is case-insensitive substring matching against the
//! sanitized banner. Tables are ordered; the first hit wins.

/// Product keywords and the service name they imply.
const PRODUCTS: &[(&str, &str)] = &[
    // Web servers
    ("nginx", "Nginx"),
    ("apache", "Apache"),
    ("microsoft-iis", "IIS"),
    ("lighttpd", "Lighttpd"),
    ("caddy", "Caddy"),
    ("tomcat", "Apache Tomcat"),
    // Databases
    ("mysql", "MySQL"),
    ("postgresql", "PostgreSQL"),
    ("mongodb", "MongoDB"),
    ("redis", "Redis"),
    ("cassandra", "Cassandra"),
    ("elasticsearch", "Elasticsearch"),
    // Remote access
    ("openssh", "OpenSSH"),
    // File transfer
    ("filezilla", "FileZilla FTP"),
    ("proftpd", "ProFTPD"),
    ("vsftpd", "vsftpd"),
    // Mail
    ("postfix", "Postfix SMTP"),
    ("sendmail", "Sendmail"),
    ("exim", "Exim"),
];

/// Protocol markers and the label they imply.
const PROTOCOL_MARKERS: &[(&str, &str)] = &[
    ("http/2", "HTTP/2"),
    ("http/1.1", "HTTP/1.1"),
    ("http", "HTTP"),
    ("ssh-2.0", "SSH 2.0"),
    ("ssh-1.", "SSH 1.x"),
    ("ftp", "FTP"),
    ("smtp", "SMTP"),
    ("pop3", "POP3"),
    ("imap", "IMAP"),
];

/// A CDN, WAF or edge security vendor fingerprint.
struct Signature {
    /// Matches when any of these is present...
    any: &'static [&'static str],
    /// ...and all of these are present.
    all: &'static [&'static str],
    label: &'static str,
}

const SECURITY_SIGNATURES: &[Signature] = &[
    Signature {
        any: &["cloudflare", "cf-ray", "__cflb", "__cfduid", "cf-cache-status"],
        all: &[],
        label: "Cloudflare CDN/WAF",
    },
    Signature {
        any: &["akamai"],
        all: &[],
        label: "Akamai CDN",
    },
    Signature {
        any: &["incapsula", "imperva", "visid_incap"],
        all: &[],
        label: "Imperva/Incapsula WAF",
    },
    Signature {
        any: &["sucuri"],
        all: &[],
        label: "Sucuri WAF",
    },
    Signature {
        any: &["cloudfront", "x-amz-cf-", "x-amzn-"],
        all: &[],
        label: "AWS CloudFront/WAF",
    },
    Signature {
        any: &["frontdoor"],
        all: &["azure"],
        label: "Azure Front Door",
    },
    Signature {
        any: &["fastly"],
        all: &[],
        label: "Fastly CDN",
    },
    Signature {
        any: &["stackpath"],
        all: &[],
        label: "StackPath CDN",
    },
    Signature {
        any: &["keycdn"],
        all: &[],
        label: "KeyCDN",
    },
    Signature {
        any: &["bunnycdn", "b-cdn"],
        all: &[],
        label: "BunnyCDN",
    },
    Signature {
        any: &["varnish"],
        all: &[],
        label: "Varnish Cache",
    },
    Signature {
        any: &["mod_security", "modsecurity"],
        all: &[],
        label: "ModSecurity WAF",
    },
    Signature {
        any: &["big-ip", "bigip", "f5 networks"],
        all: &[],
        label: "F5 BIG-IP",
    },
    Signature {
        any: &["barracuda"],
        all: &[],
        label: "Barracuda WAF",
    },
    Signature {
        any: &["fortinet", "fortiweb"],
        all: &[],
        label: "Fortinet FortiWeb WAF",
    },
    Signature {
        any: &["radware"],
        all: &[],
        label: "Radware DefensePro",
    },
    Signature {
        any: &["wallarm"],
        all: &[],
        label: "Wallarm WAF",
    },
    Signature {
        any: &["reblaze", "rbzid"],
        all: &[],
        label: "Reblaze WAF",
    },
    Signature {
        any: &["vercel"],
        all: &[],
        label: "Vercel Edge Network",
    },
    Signature {
        any: &["netlify"],
        all: &[],
        label: "Netlify CDN",
    },
    Signature {
        any: &["google cloud", "gws"],
        all: &["cdn"],
        label: "Google Cloud CDN",
    },
    Signature {
        any: &["arbor"],
        all: &[],
        label: "Arbor DDoS Protection",
    },
    Signature {
        any: &["palo alto", "pan-os"],
        all: &[],
        label: "Palo Alto Networks",
    },
    Signature {
        any: &["squid"],
        all: &[],
        label: "Squid Proxy",
    },
    Signature {
        any: &["nginx plus"],
        all: &[],
        label: "Nginx Plus",
    },
];

impl Signature {
    fn matches(&self, lower: &str) -> bool {
        self.any.iter().any(|needle| lower.contains(needle))
            && self.all.iter().all(|needle| lower.contains(needle))
    }
}

/// Name of the CDN/WAF/security vendor fronting the service, if any.
pub fn security_layer(banner: &str) -> Option<&'static str> {
    if banner.is_empty() {
        return None;
    }
    let lower = banner.to_lowercase();
    SECURITY_SIGNATURES
        .iter()
        .find(|signature| signature.matches(&lower))
        .map(|signature| signature.label)
}

/// Replace the registry service name with the product named in the banner.
pub fn refine_service(base: &str, banner: &str) -> String {
    first_marker(PRODUCTS, banner)
        .map(str::to_string)
        .unwrap_or_else(|| base.to_string())
}

/// Replace the registry protocol with the protocol the banner speaks.
pub fn refine_protocol(base: &str, banner: &str) -> String {
    first_marker(PROTOCOL_MARKERS, banner)
        .map(str::to_string)
        .unwrap_or_else(|| base.to_string())
}

/// Append the security vendor tag, e.g. `"HTTP [Cloudflare CDN/WAF]"`.
pub fn tag_security(service: &str, banner: &str) -> String {
    match security_layer(banner) {
        Some(layer) => format!("{} [{}]", service, layer),
        None => service.to_string(),
    }
}

fn first_marker(table: &[(&str, &'static str)], banner: &str) -> Option<&'static str> {
    if banner.is_empty() {
        return None;
    }
    let lower = banner.to_lowercase();
    table
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|&(_, label)| label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_security_layer() {
        assert_eq!(
            security_layer("HTTP/1.1 403 Forbidden Server: cloudflare CF-RAY: 8a1b"),
            Some("Cloudflare CDN/WAF")
        );
        assert_eq!(
            security_layer("HTTP/1.1 200 OK X-Iinfo: 1 Set-Cookie: visid_incap_123=abc"),
            Some("Imperva/Incapsula WAF")
        );
        assert_eq!(security_layer("HTTP/1.1 200 OK Via: 1.1 varnish"), Some("Varnish Cache"));
        assert_eq!(security_layer("Server: Apache Mod_Security/2.9"), Some("ModSecurity WAF"));
        assert_eq!(security_layer("SSH-2.0-OpenSSH_8.4p1"), None);
        assert_eq!(security_layer(""), None);
    }

    #[test]
    fn test_conjunctive_signature() {
        assert_eq!(security_layer("X-Azure-Ref: 0abc"), None);
        assert_eq!(
            security_layer("X-Azure-Ref: 0abc X-FD-HealthProbe frontdoor"),
            Some("Azure Front Door")
        );
    }

    #[test]
    fn test_refine_service() {
        assert_eq!(refine_service("HTTP", "HTTP/1.1 200 OK Server: nginx/1.18.0"), "Nginx");
        assert_eq!(refine_service("SSH", "SSH-2.0-OpenSSH_8.4p1"), "OpenSSH");
        assert_eq!(refine_service("Port 9999", "hello"), "Port 9999");
    }

    #[test]
    fn test_refine_protocol() {
        assert_eq!(refine_protocol("TCP (HTTP)", "HTTP/1.1 200 OK"), "HTTP/1.1");
        assert_eq!(refine_protocol("TCP (SSH)", "SSH-2.0-OpenSSH_8.4p1"), "SSH 2.0");
        assert_eq!(refine_protocol("TCP", "+PONG"), "TCP");
    }

    #[test]
    fn test_tag_security() {
        assert_eq!(
            tag_security("Nginx", "Server: nginx X-Sucuri-ID: 1"),
            "Nginx [Sucuri WAF]"
        );
        assert_eq!(tag_security("Nginx", "Server: nginx"), "Nginx");
    }
}
