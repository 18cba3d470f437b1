pub mod extensions;
pub mod params;

use der::{Decode, Encode};
use extensions::ToAndFromX509Extension;
use params::{DistinguishedName, ExtensionParam};
use x509_cert::certificate::CertificateInner;

use crate::error::{CertgenError, Result};
use crate::issuer::Issuer;
use crate::key::{KeyPair, PublicKey};
use crate::pem_utils::{CERTIFICATE_LABEL, der_to_pem};
use crate::template::CertificateTemplate;

/// Represents the supported signature algorithms for certificates.
///
/// This enum provides a mapping to the corresponding OIDs for each algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// ECDSA with SHA-256 (P-224 and P-256 keys).
    EcdsaWithSha256,
    /// ECDSA with SHA-384.
    EcdsaWithSha384,
    /// ECDSA with SHA-512.
    EcdsaWithSha512,
    /// Pure Ed25519.
    Ed25519,
}

impl From<SignatureAlgorithm> for x509_cert::spki::AlgorithmIdentifierOwned {
    fn from(value: SignatureAlgorithm) -> Self {
        let oid = match value {
            SignatureAlgorithm::EcdsaWithSha256 => const_oid::db::rfc5912::ECDSA_WITH_SHA_256,
            SignatureAlgorithm::EcdsaWithSha384 => const_oid::db::rfc5912::ECDSA_WITH_SHA_384,
            SignatureAlgorithm::EcdsaWithSha512 => const_oid::db::rfc5912::ECDSA_WITH_SHA_512,
            SignatureAlgorithm::Ed25519 => const_oid::db::rfc8410::ID_ED_25519,
        };
        x509_cert::spki::AlgorithmIdentifierOwned {
            oid,
            parameters: None,
        }
    }
}

/// Represents an X.509 certificate.
///
/// This struct provides methods to encode the certificate into DER or PEM formats.
#[derive(Debug, Clone)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: CertificateInner,
}

impl Certificate {
    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| CertgenError::EncodingError(e.to_string()))
    }

    /// Encodes the certificate into a `CERTIFICATE` PEM block.
    pub fn to_pem(&self) -> Result<String> {
        Ok(der_to_pem(&self.to_der()?, CERTIFICATE_LABEL))
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = CertificateInner::from_der(der)
            .map_err(|e| CertgenError::DecodingError(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Decodes the first extension of type `E`, if the certificate has one.
    pub fn extension<E: ToAndFromX509Extension>(&self) -> Result<Option<E>> {
        self.inner
            .tbs_certificate
            .extensions
            .iter()
            .flatten()
            .find(|ext| ext.extn_id == E::OID)
            .map(|ext| {
                ExtensionParam {
                    oid: ext.extn_id,
                    critical: ext.critical,
                    value: ext.extn_value.as_bytes().to_vec(),
                }
                .to_extension()
            })
            .transpose()
    }

    /// Creates a new self-signed certificate.
    ///
    /// The template's subject doubles as the issuer name, and `key` both
    /// provides the subject public key and signs.
    pub fn new_self_signed(template: &CertificateTemplate, key: &KeyPair) -> Result<Self> {
        let self_issuer = SelfIssuer {
            name: template.subject.clone(),
            key,
        };
        self_issuer.issue(template, &PublicKey::from_key_pair(key))
    }
}

// Helper struct for self-signed certificates
struct SelfIssuer<'a> {
    name: DistinguishedName,
    key: &'a KeyPair,
}

impl Issuer for SelfIssuer<'_> {
    fn issuer_name(&self) -> DistinguishedName {
        self.name.clone()
    }

    fn signing_key(&self) -> &KeyPair {
        self.key
    }
}
