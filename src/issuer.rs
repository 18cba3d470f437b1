use der::Encode;
use der::asn1::BitString;
use sha1::{Digest, Sha1};
use tracing::{debug, info};
use x509_cert::certificate::CertificateInner;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::Certificate;
use crate::cert::extensions::{
    BasicConstraints, ExtendedKeyUsage, KeyUsage, SubjectAltName, SubjectKeyIdentifier,
};
use crate::cert::params::{DistinguishedName, ExtensionParam};
use crate::error::Result;
use crate::key::{KeyPair, PublicKey};
use crate::tbs_certificate::TbsCertificate;
use crate::template::CertificateTemplate;

/// Represents an entity capable of issuing certificates.
///
/// This trait provides methods to retrieve issuer details and issue certificates.
pub trait Issuer {
    /// Returns the distinguished name of the issuer.
    fn issuer_name(&self) -> DistinguishedName;

    /// Returns the signing key of the issuer.
    fn signing_key(&self) -> &KeyPair;

    /// Issues a certificate for `subject_key` described by `template`.
    ///
    /// The signature algorithm follows the issuer's key type.
    fn issue(&self, template: &CertificateTemplate, subject_key: &PublicKey) -> Result<Certificate> {
        let signature_algorithm = self.signing_key().algorithm().signature_algorithm();
        let subject_public_key_info = subject_key.to_spki()?;

        let tbs_cert = TbsCertificate {
            serial_number: template.serial_number.to_bytes(),
            signature_algorithm,
            issuer: self.issuer_name(),
            not_before: template.validity.not_before,
            not_after: template.validity.not_after,
            subject: template.subject.clone(),
            extensions: certificate_extensions(template, &subject_public_key_info)?,
            subject_public_key_info,
        };

        let tbs_cert_inner = tbs_cert.to_tbs_certificate_inner()?;
        let signature = self.signing_key().sign_data(&tbs_cert_inner.to_der()?)?;

        let cert_inner = CertificateInner {
            tbs_certificate: tbs_cert_inner,
            signature_algorithm: signature_algorithm.into(),
            signature: BitString::from_bytes(&signature)?,
        };

        info!(
            serial = %template.serial_number,
            algorithm = ?signature_algorithm,
            is_ca = template.is_ca,
            "issued certificate"
        );
        Ok(Certificate { inner: cert_inner })
    }
}

/// Builds the extension list of a certificate in its encoding order: key
/// usage, extended key usage, basic constraints, subject key identifier and
/// subject alternative names.
pub fn certificate_extensions(
    template: &CertificateTemplate,
    subject_public_key_info: &SubjectPublicKeyInfoOwned,
) -> Result<Vec<ExtensionParam>> {
    let mut extensions = vec![ExtensionParam::from_extension(
        KeyUsage(template.key_usage),
        true,
    )?];

    if !template.extended_key_usage.is_empty() {
        let extended_key_usage = ExtendedKeyUsage {
            usage: template.extended_key_usage.clone(),
        };
        extensions.push(ExtensionParam::from_extension(extended_key_usage, false)?);
    }

    if template.basic_constraints_valid {
        let basic_constraints = BasicConstraints {
            is_ca: template.is_ca,
            max_path_length: None,
        };
        extensions.push(ExtensionParam::from_extension(basic_constraints, true)?);
    }

    if template.is_ca {
        let key_id = Sha1::digest(subject_public_key_info.subject_public_key.raw_bytes());
        let subject_key_id = SubjectKeyIdentifier {
            key_identifier: key_id.to_vec(),
        };
        extensions.push(ExtensionParam::from_extension(subject_key_id, false)?);
    }

    if !template.subject_identity.is_empty() {
        let subject_alt_name = SubjectAltName::from(&template.subject_identity);
        extensions.push(ExtensionParam::from_extension(subject_alt_name, false)?);
    }

    for extension in &extensions {
        debug!(oid = %extension.oid, critical = extension.critical, "encoded extension");
    }
    Ok(extensions)
}
