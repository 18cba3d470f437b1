//! Routing of caller-supplied host strings into subject alternative name
//! categories.
//!
//! Each token is tried against an ordered list of parsers and the first one
//! that accepts it decides the category:
//!
//! 1. IP address literal
//! 2. email address whose canonical form equals the token
//! 3. URI with a scheme and a non-empty `//` authority
//! 4. anything else is taken as a DNS name, unvalidated

use std::net::IpAddr;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::mailbox;

/// A single classified subject alternative name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectName {
    Ip(IpAddr),
    Email(String),
    Uri(String),
    Dns(String),
}

type Classifier = fn(&str) -> Option<SubjectName>;

/// Parse attempts in priority order. DNS is the fallback.
const CLASSIFIERS: [Classifier; 3] = [as_ip_address, as_email_address, as_uri];

impl SubjectName {
    /// Classifies one trimmed, non-empty token.
    pub fn classify(token: &str) -> Self {
        CLASSIFIERS
            .iter()
            .find_map(|classifier| classifier(token))
            .unwrap_or_else(|| SubjectName::Dns(token.to_string()))
    }

    /// Short label for the category, used in log output.
    pub fn kind(&self) -> &'static str {
        match self {
            SubjectName::Ip(_) => "ip",
            SubjectName::Email(_) => "email",
            SubjectName::Uri(_) => "uri",
            SubjectName::Dns(_) => "dns",
        }
    }
}

fn as_ip_address(token: &str) -> Option<SubjectName> {
    token.parse::<IpAddr>().ok().map(SubjectName::Ip)
}

fn as_email_address(token: &str) -> Option<SubjectName> {
    mailbox::parse_addr_spec(token)
        .filter(|address| address == token)
        .map(SubjectName::Email)
}

/// RFC 3986 scheme followed by a `//` authority.
static URI_AUTHORITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<scheme>[A-Za-z][A-Za-z0-9+.\-]*)://(?P<authority>[^/?#]*)")
        .unwrap_or_else(|e| panic!("invalid URI pattern: {e}"))
});

/// Accepts `scheme://authority...` with a non-empty host. The scheme is
/// stored lowercased, the rest of the token as given.
fn as_uri(token: &str) -> Option<SubjectName> {
    if token.bytes().any(|b| b.is_ascii_control()) {
        return None;
    }

    let captures = URI_AUTHORITY.captures(token)?;
    let scheme = captures.name("scheme")?.as_str();
    let host = authority_host(captures.name("authority")?.as_str())?;
    if host.is_empty() {
        return None;
    }

    let uri = format!("{}{}", scheme.to_ascii_lowercase(), &token[scheme.len()..]);
    Some(SubjectName::Uri(uri))
}

/// The `host[:port]` part of an authority, or `None` when it is malformed.
fn authority_host(authority: &str) -> Option<&str> {
    let host = match authority.rsplit_once('@') {
        Some((userinfo, host)) => {
            if !userinfo.chars().all(is_userinfo_char) || !valid_escapes(userinfo, false) {
                return None;
            }
            host
        }
        None => authority,
    };

    let port = if host.starts_with('[') {
        &host[host.rfind(']')? + 1..]
    } else {
        host.rfind(':').map_or("", |colon| &host[colon..])
    };
    let valid_port = port.is_empty()
        || port
            .strip_prefix(':')
            .is_some_and(|digits| digits.bytes().all(|b| b.is_ascii_digit()));

    (valid_port && host.chars().all(is_host_char) && valid_escapes(host, true)).then_some(host)
}

fn is_userinfo_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "-._:~!$&'()*+,;=%@".contains(c)
}

fn is_host_char(c: char) -> bool {
    !c.is_ascii() || c.is_ascii_alphanumeric() || "-._~!$&'()*+,;=:[]<>\"%".contains(c)
}

/// Every `%` starts a two-digit hex escape. Hosts only allow escapes of
/// non-ASCII bytes and `%25`.
fn valid_escapes(part: &str, host: bool) -> bool {
    let bytes = part.as_bytes();
    bytes.iter().enumerate().all(|(i, &b)| {
        if b != b'%' {
            return true;
        }
        let Some(escape) = bytes.get(i + 1..i + 3) else {
            return false;
        };
        if !escape.iter().all(u8::is_ascii_hexdigit) {
            return false;
        }
        !host || escape[0] >= b'8' || escape.eq_ignore_ascii_case(b"25")
    })
}

/// Splits a comma-separated host list into trimmed, non-empty tokens.
pub fn split_hosts(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|host| !host.is_empty())
}

/// The classified subject identity of a certificate.
///
/// Each list keeps insertion order and duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectIdentity {
    pub ip_addresses: Vec<IpAddr>,
    pub email_addresses: Vec<String>,
    pub uris: Vec<String>,
    pub dns_names: Vec<String>,
}

impl SubjectIdentity {
    /// Classifies every token of a comma-separated host list.
    ///
    /// # Example
    /// ```
    /// use certgen::classify::SubjectIdentity;
    ///
    /// let identity = SubjectIdentity::from_hosts("localhost, 127.0.0.1, ,ops@example.com");
    /// assert_eq!(identity.dns_names, vec!["localhost".to_string()]);
    /// assert_eq!(identity.ip_addresses.len(), 1);
    /// assert_eq!(identity.email_addresses, vec!["ops@example.com".to_string()]);
    /// ```
    pub fn from_hosts(raw: &str) -> Self {
        let mut identity = Self::default();
        for host in split_hosts(raw) {
            let name = SubjectName::classify(host);
            debug!(host, kind = name.kind(), "classified subject name");
            identity.push(name);
        }
        identity
    }

    pub fn push(&mut self, name: SubjectName) {
        match name {
            SubjectName::Ip(ip) => self.ip_addresses.push(ip),
            SubjectName::Email(email) => self.email_addresses.push(email),
            SubjectName::Uri(uri) => self.uris.push(uri),
            SubjectName::Dns(dns) => self.dns_names.push(dns),
        }
    }

    /// Whether any name usable for server authentication (IP, DNS, URI) is present.
    pub fn has_server_names(&self) -> bool {
        !self.ip_addresses.is_empty() || !self.dns_names.is_empty() || !self.uris.is_empty()
    }

    pub fn has_email_addresses(&self) -> bool {
        !self.email_addresses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ip_addresses.len() + self.email_addresses.len() + self.uris.len() + self.dns_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ip_literals_are_ip() {
        for token in ["10.0.0.1", "127.0.0.1", "::1", "2001:db8::8a2e:370:7334", "::ffff:10.0.0.1"] {
            assert!(
                matches!(SubjectName::classify(token), SubjectName::Ip(_)),
                "{token}"
            );
        }
    }

    #[test]
    fn ip_like_but_invalid_tokens_fall_through() {
        for token in ["10.0.0.1/24", "[::1]", "256.0.0.1", "fe80::1%eth0"] {
            assert!(
                !matches!(SubjectName::classify(token), SubjectName::Ip(_)),
                "{token}"
            );
        }
    }

    #[test]
    fn round_tripping_addresses_are_email() {
        assert_eq!(
            SubjectName::classify("admin@example.com"),
            SubjectName::Email("admin@example.com".to_string())
        );
        assert_eq!(
            SubjectName::classify("first.last+tls@mail.example.org"),
            SubjectName::Email("first.last+tls@mail.example.org".to_string())
        );
    }

    #[test]
    fn formatted_addresses_downgrade_to_dns() {
        for token in ["\"Admin\" <admin@example.com>", "\"admin\"@example.com"] {
            assert_eq!(
                SubjectName::classify(token),
                SubjectName::Dns(token.to_string())
            );
        }
    }

    #[test]
    fn uris_need_scheme_and_host() {
        for token in [
            "spiffe://example.org/svc",
            "https://svc.local:8443",
            "ldap://[2001:db8::7]/c=GB",
        ] {
            assert_eq!(
                SubjectName::classify(token),
                SubjectName::Uri(token.to_string())
            );
        }

        for token in ["localhost:8080", "mailto:admin", "file:///etc/hosts", "urn:isbn:0451450523"] {
            assert_eq!(
                SubjectName::classify(token),
                SubjectName::Dns(token.to_string()),
                "{token}"
            );
        }
    }

    #[test]
    fn uris_without_authority_are_dns() {
        for token in ["http:example.com", "https:/svc.local", "http:\\\\example.com"] {
            assert_eq!(
                SubjectName::classify(token),
                SubjectName::Dns(token.to_string()),
                "{token}"
            );
        }
    }

    #[test]
    fn uri_host_is_not_validated_as_ipv4() {
        assert_eq!(
            SubjectName::classify("http://300.1.1.1"),
            SubjectName::Uri("http://300.1.1.1".to_string())
        );
        assert_eq!(
            SubjectName::classify("spiffe://user@trust.example:/ns"),
            SubjectName::Uri("spiffe://user@trust.example:/ns".to_string())
        );
    }

    #[test]
    fn malformed_authorities_are_dns() {
        for token in [
            "http://",
            "http://user@",
            "http://svc.local:84x3",
            "ldap://[2001:db8::7",
            "ldap://[2001:db8::7]x/",
            "http://bad host/",
            "http://svc{1}.local",
            "http://svc%2e.local",
            "http://svc%zz.local",
            "http://us^er@svc.local",
        ] {
            assert_eq!(
                SubjectName::classify(token),
                SubjectName::Dns(token.to_string()),
                "{token}"
            );
        }
    }

    #[test]
    fn uri_scheme_is_lowercased() {
        assert_eq!(
            SubjectName::classify("HTTPS://Svc.Local:8443/Path"),
            SubjectName::Uri("https://Svc.Local:8443/Path".to_string())
        );
        assert_eq!(
            SubjectName::classify("Spiffe://example.org"),
            SubjectName::Uri("spiffe://example.org".to_string())
        );
    }

    #[test]
    fn everything_else_is_dns() {
        for token in ["example.com", "*.example.com", "not a valid uri", "-bad-.host"] {
            assert_eq!(
                SubjectName::classify(token),
                SubjectName::Dns(token.to_string())
            );
        }
    }

    #[test]
    fn split_skips_blank_tokens() {
        let hosts: Vec<_> = split_hosts(" a.example ,, ,b.example,").collect();
        assert_eq!(hosts, vec!["a.example", "b.example"]);
        assert_eq!(split_hosts(" , ").count(), 0);
    }

    #[test]
    fn from_hosts_keeps_order_and_duplicates() {
        let identity = SubjectIdentity::from_hosts(
            "10.0.0.1, admin@example.com, https://svc.local:8443, *.example.com, 10.0.0.1",
        );

        assert_eq!(
            identity.ip_addresses,
            vec!["10.0.0.1".parse::<IpAddr>().unwrap(); 2]
        );
        assert_eq!(identity.email_addresses, vec!["admin@example.com"]);
        assert_eq!(identity.uris, vec!["https://svc.local:8443"]);
        assert_eq!(identity.dns_names, vec!["*.example.com"]);
        assert_eq!(identity.len(), 5);
    }

    #[test]
    fn empty_list_yields_empty_identity() {
        let identity = SubjectIdentity::from_hosts(" ,  ,");
        assert!(identity.is_empty());
        assert!(!identity.has_server_names());
        assert!(!identity.has_email_addresses());
    }
}
