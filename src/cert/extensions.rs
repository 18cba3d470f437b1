use std::net::IpAddr;

use const_oid::AssociatedOid;
use der::{
    Decode, Encode,
    asn1::{Ia5String, OctetString},
    oid::ObjectIdentifier,
};
use x509_cert::ext::pkix::name::GeneralName;

pub use der::flagset::FlagSet;
use x509_cert::ext::pkix::KeyUsage as X509KeyUsage;
pub use x509_cert::ext::pkix::KeyUsages;

use crate::classify::{SubjectIdentity, SubjectName};
use crate::error::CertgenError;

/// Trait for converting to and from X.509 extensions.
///
/// This trait provides methods to encode and decode X.509 extension values.
///
/// # Example
/// ```
/// use certgen::cert::extensions::{SubjectAltName, ToAndFromX509Extension};
/// use certgen::classify::SubjectName;
///
/// let san = SubjectAltName { names: vec![SubjectName::Dns("example.com".to_string())] };
/// let encoded = san.to_x509_extension_value().unwrap();
/// let decoded = SubjectAltName::from_x509_extension_value(&encoded).unwrap();
/// assert_eq!(san.names, decoded.names);
/// ```
pub trait ToAndFromX509Extension {
    /// The Object Identifier (OID) for the extension.
    const OID: ObjectIdentifier;

    /// Encodes the extension into a DER-encoded byte vector.
    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CertgenError>;

    /// Decodes the extension from a DER-encoded byte slice.
    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CertgenError>
    where
        Self: Sized;
}

fn decoding_error(err: der::Error) -> CertgenError {
    CertgenError::DecodingError(err.to_string())
}

/// Represents the Subject Alternative Name (SAN) extension.
///
/// Names are encoded in the order given; [`SubjectAltName::from`] orders a
/// classified identity as DNS names, emails, IP addresses, then URIs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectAltName {
    pub names: Vec<SubjectName>,
}

impl From<&SubjectIdentity> for SubjectAltName {
    fn from(identity: &SubjectIdentity) -> Self {
        let names = identity
            .dns_names
            .iter()
            .cloned()
            .map(SubjectName::Dns)
            .chain(identity.email_addresses.iter().cloned().map(SubjectName::Email))
            .chain(identity.ip_addresses.iter().copied().map(SubjectName::Ip))
            .chain(identity.uris.iter().cloned().map(SubjectName::Uri))
            .collect();
        Self { names }
    }
}

fn ia5(value: &str) -> Result<Ia5String, CertgenError> {
    Ia5String::new(value).map_err(|e| CertgenError::InvalidInput(format!("{value:?}: {e}")))
}

fn to_general_name(name: &SubjectName) -> Result<GeneralName, CertgenError> {
    Ok(match name {
        SubjectName::Dns(dns) => GeneralName::DnsName(ia5(dns)?),
        SubjectName::Email(email) => GeneralName::Rfc822Name(ia5(email)?),
        SubjectName::Uri(uri) => GeneralName::UniformResourceIdentifier(ia5(uri)?),
        SubjectName::Ip(ip) => {
            let octets = match ip.to_canonical() {
                IpAddr::V4(v4) => v4.octets().to_vec(),
                IpAddr::V6(v6) => v6.octets().to_vec(),
            };
            GeneralName::IpAddress(OctetString::new(octets)?)
        }
    })
}

fn from_general_name(name: &GeneralName) -> Result<SubjectName, CertgenError> {
    match name {
        GeneralName::DnsName(dns) => Ok(SubjectName::Dns(dns.to_string())),
        GeneralName::Rfc822Name(email) => Ok(SubjectName::Email(email.to_string())),
        GeneralName::UniformResourceIdentifier(uri) => Ok(SubjectName::Uri(uri.to_string())),
        GeneralName::IpAddress(octets) => match octets.as_bytes().len() {
            4 => {
                let bytes: [u8; 4] = octets.as_bytes().try_into().map_err(|_| {
                    CertgenError::DecodingError("malformed IPv4 address".to_string())
                })?;
                Ok(SubjectName::Ip(IpAddr::from(bytes)))
            }
            16 => {
                let bytes: [u8; 16] = octets.as_bytes().try_into().map_err(|_| {
                    CertgenError::DecodingError("malformed IPv6 address".to_string())
                })?;
                Ok(SubjectName::Ip(IpAddr::from(bytes)))
            }
            len => Err(CertgenError::DecodingError(format!(
                "IP address of {len} bytes"
            ))),
        },
        _ => Err(CertgenError::DecodingError(
            "Unsupported general name type".to_string(),
        )),
    }
}

impl ToAndFromX509Extension for SubjectAltName {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::SubjectAltName::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CertgenError> {
        let san = x509_cert::ext::pkix::SubjectAltName(
            self.names
                .iter()
                .map(to_general_name)
                .collect::<Result<Vec<_>, _>>()?,
        );

        Ok(san.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CertgenError> {
        let san = x509_cert::ext::pkix::SubjectAltName::from_der(extension).map_err(decoding_error)?;
        let names = san
            .0
            .iter()
            .map(from_general_name)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { names })
    }
}

/// Represents the Basic Constraints extension.
///
/// # Fields
/// * `is_ca` - Indicates if the certificate is a CA.
/// * `max_path_length` - The maximum number of intermediate CAs allowed.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BasicConstraints {
    pub is_ca: bool,
    pub max_path_length: Option<u8>,
}

impl ToAndFromX509Extension for BasicConstraints {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::BasicConstraints::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CertgenError> {
        let bc = x509_cert::ext::pkix::BasicConstraints {
            ca: self.is_ca,
            path_len_constraint: self.max_path_length,
        };

        Ok(bc.to_der()?)
    }

    fn from_x509_extension_value(der_bytes: &[u8]) -> Result<Self, CertgenError> {
        let bc = x509_cert::ext::pkix::BasicConstraints::from_der(der_bytes).map_err(decoding_error)?;
        Ok(Self {
            is_ca: bc.ca,
            max_path_length: bc.path_len_constraint,
        })
    }
}

/// Represents the Key Usage extension.
///
/// This extension defines the purpose of the key contained in the certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyUsage(pub FlagSet<KeyUsages>);

impl ToAndFromX509Extension for KeyUsage {
    const OID: ObjectIdentifier = <X509KeyUsage as AssociatedOid>::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CertgenError> {
        Ok(X509KeyUsage(self.0).to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CertgenError> {
        let ku = X509KeyUsage::from_der(extension).map_err(decoding_error)?;
        Ok(Self(ku.0))
    }
}

/// Represents the Extended Key Usage extension.
///
/// This extension indicates purposes for which the public key may be used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtendedKeyUsage {
    pub usage: Vec<ExtendedKeyUsageOption>,
}

impl ToAndFromX509Extension for ExtendedKeyUsage {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::ExtendedKeyUsage::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CertgenError> {
        let oids: Vec<ObjectIdentifier> = self.usage.iter().map(|v| (*v).into()).collect();
        let eku = x509_cert::ext::pkix::ExtendedKeyUsage(oids);
        Ok(eku.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CertgenError> {
        let eku = x509_cert::ext::pkix::ExtendedKeyUsage::from_der(extension).map_err(decoding_error)?;
        let usage = eku
            .0
            .iter()
            .map(|v| match *v {
                const_oid::db::rfc5912::ID_KP_SERVER_AUTH => Ok(ExtendedKeyUsageOption::ServerAuth),
                const_oid::db::rfc5912::ID_KP_CLIENT_AUTH => Ok(ExtendedKeyUsageOption::ClientAuth),
                const_oid::db::rfc5912::ID_KP_EMAIL_PROTECTION => {
                    Ok(ExtendedKeyUsageOption::EmailProtection)
                }
                _ => Err(CertgenError::DecodingError(
                    "Unsupported extended key usage option".to_string(),
                )),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { usage })
    }
}

/// Represents an option for the Extended Key Usage extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExtendedKeyUsageOption {
    ServerAuth,
    ClientAuth,
    EmailProtection,
}

impl From<ExtendedKeyUsageOption> for ObjectIdentifier {
    fn from(value: ExtendedKeyUsageOption) -> Self {
        match value {
            ExtendedKeyUsageOption::ServerAuth => const_oid::db::rfc5912::ID_KP_SERVER_AUTH,
            ExtendedKeyUsageOption::ClientAuth => const_oid::db::rfc5912::ID_KP_CLIENT_AUTH,
            ExtendedKeyUsageOption::EmailProtection => {
                const_oid::db::rfc5912::ID_KP_EMAIL_PROTECTION
            }
        }
    }
}

/// Represents the Subject Key Identifier extension.
///
/// # Fields
/// * `key_identifier` - Usually the SHA-1 hash of the subject public key bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectKeyIdentifier {
    pub key_identifier: Vec<u8>,
}

impl ToAndFromX509Extension for SubjectKeyIdentifier {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::SubjectKeyIdentifier::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CertgenError> {
        let ski = x509_cert::ext::pkix::SubjectKeyIdentifier(OctetString::new(
            self.key_identifier.as_slice(),
        )?);
        Ok(ski.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CertgenError> {
        let ski = x509_cert::ext::pkix::SubjectKeyIdentifier::from_der(extension).map_err(decoding_error)?;
        Ok(Self {
            key_identifier: ski.0.as_bytes().to_vec(),
        })
    }
}
