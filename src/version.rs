//! Software version extraction from raw banners.
//!
//! Rules are tried in order and the first match wins, so product-specific
//! patterns take precedence over the generic `Server:` header fallback.

use regex::{Captures, Regex};

/// One extraction rule: a pattern plus how to render its captures.
struct Rule {
    pattern: Regex,
    render: fn(&Captures<'_>) -> String,
}

/// Ordered set of version extraction rules.
pub struct VersionExtractor {
    rules: Vec<Rule>,
}

impl Default for VersionExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VersionExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionExtractor")
            .field("rules", &self.rules.len())
            .finish()
    }
}

impl VersionExtractor {
    /// Compile the built-in rule set.
    pub fn new() -> Self {
        let rule = |pattern: &str, render: fn(&Captures<'_>) -> String| Rule {
            // Patterns are compile-time constants covered by the tests below.
            pattern: Regex::new(pattern).expect("built-in version pattern"),
            render,
        };

        let rules = vec![
            // SSH-2.0-OpenSSH_8.4p1
            rule(r"SSH-[\d.]+-([\w._-]+)", |c| c[1].to_string()),
            // Server: nginx/1.18.0, Microsoft-IIS/10.0
            rule(r"(?i)(Apache|nginx|lighttpd|IIS)[/ ]?([\d.]+)", |c| {
                format!("{}/{}", &c[1], &c[2])
            }),
            // 220 ProFTPD 1.3.6, 220 (vsFTPd 3.0.5)
            rule(r"(?i)(ProFTPD|vsFTPd|Pure-FTPd|FileZilla)[/ ]?([\d.]+)", |c| {
                format!("{} {}", &c[1], &c[2])
            }),
            // 220 mx ESMTP Postfix, Exim 4.94
            rule(r"(?i)(Postfix|Exim|Sendmail|Dovecot)[/ ]?([\d.]*)", |c| {
                if c[2].is_empty() {
                    c[1].to_string()
                } else {
                    format!("{} {}", &c[1], &c[2])
                }
            }),
            // Generic header value, up to the next header or the end of the banner.
            rule(
                r"(?i)(?:Server|X-Powered-By):\s*(.+?)(?:\s{2}|\s+[A-Za-z][A-Za-z0-9-]*:\s|$)",
                |c| c[1].trim().to_string(),
            ),
        ];

        Self { rules }
    }

    /// Extract a version string from `banner`, or an empty string.
    pub fn extract(&self, banner: &str) -> String {
        if banner.is_empty() {
            return String::new();
        }

        self.rules
            .iter()
            .find_map(|rule| rule.pattern.captures(banner).map(|c| (rule.render)(&c)))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssh_banner() {
        let extractor = VersionExtractor::new();
        assert_eq!(extractor.extract("SSH-2.0-OpenSSH_8.4p1"), "OpenSSH_8.4p1");
        assert_eq!(
            extractor.extract("SSH-2.0-OpenSSH_9.6p1 Ubuntu-3ubuntu13"),
            "OpenSSH_9.6p1"
        );
    }

    #[test]
    fn test_web_servers() {
        let extractor = VersionExtractor::new();
        assert_eq!(
            extractor.extract("HTTP/1.1 200 OK Server: nginx/1.18.0 Date: Mon, 01 Jan 2024"),
            "nginx/1.18.0"
        );
        assert_eq!(
            extractor.extract("HTTP/1.1 200 OK Server: Apache/2.4.41 (Ubuntu)"),
            "Apache/2.4.41"
        );
        assert_eq!(
            extractor.extract("HTTP/1.1 200 OK Server: Microsoft-IIS/10.0"),
            "IIS/10.0"
        );
    }

    #[test]
    fn test_ftp_and_mail() {
        let extractor = VersionExtractor::new();
        assert_eq!(extractor.extract("220 (vsFTPd 3.0.5)"), "vsFTPd 3.0.5");
        assert_eq!(
            extractor.extract("220 ProFTPD 1.3.6 Server ready."),
            "ProFTPD 1.3.6"
        );
        assert_eq!(extractor.extract("220 mx.example.com ESMTP Postfix"), "Postfix");
        assert_eq!(extractor.extract("220 mail ESMTP Exim 4.94.2"), "Exim 4.94.2");
    }

    #[test]
    fn test_generic_header_fallback() {
        let extractor = VersionExtractor::new();
        assert_eq!(
            extractor.extract("HTTP/1.1 403 Forbidden Server: cloudflare Date: Tue"),
            "cloudflare"
        );
        assert_eq!(
            extractor.extract("HTTP/1.1 200 OK X-Powered-By: PHP/8.1.2"),
            "PHP/8.1.2"
        );
    }

    #[test]
    fn test_no_match() {
        let extractor = VersionExtractor::new();
        assert_eq!(extractor.extract(""), "");
        assert_eq!(extractor.extract("+PONG"), "");
    }
}
