//! Assembly of the certificate template from a classified identity and the
//! mode flags.

use std::fmt;

use bon::Builder;
use rand::TryRngCore;
use rand::rngs::OsRng;
use tracing::debug;

use crate::cert::extensions::{ExtendedKeyUsageOption, FlagSet, KeyUsages};
use crate::cert::params::{DEFAULT_ORGANIZATION, DistinguishedName, Validity};
use crate::classify::SubjectIdentity;
use crate::error::{CertgenError, Result};

/// What the generated certificate is for.
///
/// Built from the `client` and `no_ca` flags, where client mode takes
/// precedence over CA mode:
///
/// | client | no_ca | role                   |
/// |--------|-------|------------------------|
/// | true   | any   | `Client`               |
/// | false  | false | `CertificateAuthority` |
/// | false  | true  | `Leaf`                 |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CertificateRole {
    Client,
    #[default]
    CertificateAuthority,
    Leaf,
}

/// Per-role effects on the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RolePolicy {
    is_ca: bool,
    key_cert_sign: bool,
    client_auth: bool,
}

impl CertificateRole {
    pub fn from_flags(client: bool, no_ca: bool) -> Self {
        match (client, no_ca) {
            (true, _) => CertificateRole::Client,
            (false, false) => CertificateRole::CertificateAuthority,
            (false, true) => CertificateRole::Leaf,
        }
    }

    const fn policy(self) -> RolePolicy {
        match self {
            CertificateRole::Client => RolePolicy {
                is_ca: false,
                key_cert_sign: false,
                client_auth: true,
            },
            CertificateRole::CertificateAuthority => RolePolicy {
                is_ca: true,
                key_cert_sign: true,
                client_auth: false,
            },
            CertificateRole::Leaf => RolePolicy {
                is_ca: false,
                key_cert_sign: false,
                client_auth: false,
            },
        }
    }

    pub fn is_ca(self) -> bool {
        self.policy().is_ca
    }
}

/// Certificate serial number, uniform in `[0, 2^128)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SerialNumber(pub u128);

impl SerialNumber {
    /// Draws a fresh serial number from the OS random source.
    pub fn random() -> Result<Self> {
        let mut bytes = [0u8; 16];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| CertgenError::SerialNumberGenerationError(e.to_string()))?;
        Ok(SerialNumber(u128::from_be_bytes(bytes)))
    }

    /// Big-endian bytes without leading zeros (at least one byte).
    pub fn to_bytes(self) -> Vec<u8> {
        let bytes = self.0.to_be_bytes();
        let first = bytes
            .iter()
            .position(|&b| b != 0)
            .unwrap_or(bytes.len() - 1);
        bytes[first..].to_vec()
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

/// Caller-controlled inputs of the template besides the identity.
#[derive(Clone, Debug, Builder)]
pub struct TemplateOptions {
    #[builder(into, default = DEFAULT_ORGANIZATION.to_string())]
    pub organization: String,
    /// The `user@host (Full Name)` string, computed once at startup.
    #[builder(into, default)]
    pub organizational_unit: String,
    #[builder(default)]
    pub role: CertificateRole,
    pub validity: Validity,
}

/// A fully populated certificate, ready to be self-signed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CertificateTemplate {
    pub serial_number: SerialNumber,
    pub subject: DistinguishedName,
    pub validity: Validity,
    pub key_usage: FlagSet<KeyUsages>,
    pub extended_key_usage: Vec<ExtendedKeyUsageOption>,
    pub subject_identity: SubjectIdentity,
    pub is_ca: bool,
    pub basic_constraints_valid: bool,
}

impl CertificateTemplate {
    /// Builds a template with a freshly drawn serial number.
    pub fn build(identity: SubjectIdentity, options: &TemplateOptions) -> Result<Self> {
        let serial_number = SerialNumber::random()?;
        Ok(Self::build_with_serial(identity, options, serial_number))
    }

    /// Builds a template with the given serial number.
    ///
    /// # Example
    /// ```
    /// use certgen::cert::params::Validity;
    /// use certgen::classify::SubjectIdentity;
    /// use certgen::template::{CertificateRole, CertificateTemplate, SerialNumber, TemplateOptions};
    ///
    /// let options = TemplateOptions::builder()
    ///     .role(CertificateRole::Client)
    ///     .validity(Validity::for_days(30))
    ///     .build();
    /// let template = CertificateTemplate::build_with_serial(
    ///     SubjectIdentity::from_hosts("client.example.com"),
    ///     &options,
    ///     SerialNumber(7),
    /// );
    /// assert!(!template.is_ca);
    /// assert_eq!(template.extended_key_usage.len(), 2);
    /// ```
    pub fn build_with_serial(
        identity: SubjectIdentity,
        options: &TemplateOptions,
        serial_number: SerialNumber,
    ) -> Self {
        let subject = DistinguishedName::builder()
            .organization(options.organization.clone())
            .organization_unit(options.organizational_unit.clone())
            .build();

        let template = Self {
            serial_number,
            subject,
            validity: options.validity.clone(),
            key_usage: key_usage(options.role),
            extended_key_usage: extended_key_usage(&identity, options.role),
            subject_identity: identity,
            is_ca: options.role.is_ca(),
            basic_constraints_valid: true,
        };

        debug!(
            serial = %template.serial_number,
            role = ?options.role,
            extended_key_usage = ?template.extended_key_usage,
            "built certificate template"
        );
        template
    }
}

/// Key usage bits for a role.
///
/// Digital signature and key encipherment are always set; certificate
/// signing is added for a CA.
pub fn key_usage(role: CertificateRole) -> FlagSet<KeyUsages> {
    let mut usage = KeyUsages::DigitalSignature | KeyUsages::KeyEncipherment;
    if role.policy().key_cert_sign {
        usage |= KeyUsages::KeyCertSign;
    }
    usage
}

/// Extended key usages implied by the classified names and the role.
pub fn extended_key_usage(
    identity: &SubjectIdentity,
    role: CertificateRole,
) -> Vec<ExtendedKeyUsageOption> {
    let mut usage = Vec::new();
    if identity.has_server_names() {
        usage.push(ExtendedKeyUsageOption::ServerAuth);
    }
    if identity.has_email_addresses() {
        usage.push(ExtendedKeyUsageOption::EmailProtection);
    }
    if role.policy().client_auth {
        usage.push(ExtendedKeyUsageOption::ClientAuth);
    }
    usage
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn options(role: CertificateRole) -> TemplateOptions {
        TemplateOptions::builder()
            .organizational_unit("alice@host")
            .role(role)
            .validity(Validity::for_days(365))
            .build()
    }

    #[test]
    fn role_decision_table() {
        assert_eq!(CertificateRole::from_flags(true, false), CertificateRole::Client);
        assert_eq!(CertificateRole::from_flags(true, true), CertificateRole::Client);
        assert_eq!(
            CertificateRole::from_flags(false, false),
            CertificateRole::CertificateAuthority
        );
        assert_eq!(CertificateRole::from_flags(false, true), CertificateRole::Leaf);
    }

    #[test]
    fn key_usage_per_role() {
        let base = KeyUsages::DigitalSignature | KeyUsages::KeyEncipherment;
        assert_eq!(key_usage(CertificateRole::Leaf), base);
        assert_eq!(key_usage(CertificateRole::Client), base);
        assert_eq!(
            key_usage(CertificateRole::CertificateAuthority),
            base | KeyUsages::KeyCertSign
        );
    }

    #[test]
    fn server_auth_follows_ip_dns_and_uri() {
        for hosts in ["10.0.0.1", "example.com", "spiffe://example.org/svc"] {
            let identity = SubjectIdentity::from_hosts(hosts);
            assert_eq!(
                extended_key_usage(&identity, CertificateRole::Leaf),
                vec![ExtendedKeyUsageOption::ServerAuth],
                "{hosts}"
            );
        }
    }

    #[test]
    fn email_protection_follows_emails() {
        let identity = SubjectIdentity::from_hosts("admin@example.com");
        assert_eq!(
            extended_key_usage(&identity, CertificateRole::Leaf),
            vec![ExtendedKeyUsageOption::EmailProtection]
        );

        let both = SubjectIdentity::from_hosts("admin@example.com, example.com");
        assert_eq!(
            extended_key_usage(&both, CertificateRole::CertificateAuthority),
            vec![
                ExtendedKeyUsageOption::ServerAuth,
                ExtendedKeyUsageOption::EmailProtection
            ]
        );
    }

    #[test]
    fn no_names_means_no_extended_usage() {
        let identity = SubjectIdentity::from_hosts(" , ");
        assert!(extended_key_usage(&identity, CertificateRole::CertificateAuthority).is_empty());
        assert!(extended_key_usage(&identity, CertificateRole::Leaf).is_empty());
        assert_eq!(
            extended_key_usage(&identity, CertificateRole::Client),
            vec![ExtendedKeyUsageOption::ClientAuth]
        );
    }

    #[test]
    fn client_mode_is_never_a_ca() {
        for no_ca in [false, true] {
            let role = CertificateRole::from_flags(true, no_ca);
            let template = CertificateTemplate::build_with_serial(
                SubjectIdentity::from_hosts("client.example.com"),
                &options(role),
                SerialNumber(1),
            );
            assert!(!template.is_ca);
            assert!(!template.key_usage.contains(KeyUsages::KeyCertSign));
            assert!(
                template
                    .extended_key_usage
                    .contains(&ExtendedKeyUsageOption::ClientAuth)
            );
        }
    }

    #[test]
    fn default_mode_is_a_ca() {
        let template = CertificateTemplate::build_with_serial(
            SubjectIdentity::from_hosts("example.com"),
            &options(CertificateRole::from_flags(false, false)),
            SerialNumber(1),
        );
        assert!(template.is_ca);
        assert!(template.basic_constraints_valid);
        assert!(template.key_usage.contains(KeyUsages::KeyCertSign));
        assert!(
            !template
                .extended_key_usage
                .contains(&ExtendedKeyUsageOption::ClientAuth)
        );
    }

    #[test]
    fn subject_carries_organization_and_unit() {
        let template = CertificateTemplate::build_with_serial(
            SubjectIdentity::default(),
            &options(CertificateRole::Leaf),
            SerialNumber(1),
        );
        assert_eq!(template.subject.organization, DEFAULT_ORGANIZATION);
        assert_eq!(template.subject.organization_unit, "alice@host");
        assert!(template.basic_constraints_valid);
        assert!(!template.is_ca);
    }

    #[test]
    fn end_to_end_classification() {
        let template = CertificateTemplate::build(
            SubjectIdentity::from_hosts(
                "10.0.0.1, admin@example.com, https://svc.local:8443, *.example.com",
            ),
            &options(CertificateRole::from_flags(false, false)),
        )
        .unwrap();

        let identity = &template.subject_identity;
        assert_eq!(identity.ip_addresses, vec!["10.0.0.1".parse::<std::net::IpAddr>().unwrap()]);
        assert_eq!(identity.email_addresses, vec!["admin@example.com"]);
        assert_eq!(identity.uris, vec!["https://svc.local:8443"]);
        assert_eq!(identity.dns_names, vec!["*.example.com"]);
        assert_eq!(
            template.extended_key_usage,
            vec![
                ExtendedKeyUsageOption::ServerAuth,
                ExtendedKeyUsageOption::EmailProtection
            ]
        );
        assert!(template.is_ca);
    }

    #[test]
    fn serial_numbers_do_not_repeat() {
        let serials: HashSet<_> = (0..64).map(|_| SerialNumber::random().unwrap()).collect();
        assert_eq!(serials.len(), 64);
    }

    #[test]
    fn serial_bytes_are_minimal() {
        assert_eq!(SerialNumber(0).to_bytes(), vec![0]);
        assert_eq!(SerialNumber(0x01ff).to_bytes(), vec![0x01, 0xff]);
        assert_eq!(SerialNumber(u128::MAX).to_bytes(), vec![0xff; 16]);
        assert_eq!(SerialNumber(0xabc).to_string(), "abc");
    }
}
