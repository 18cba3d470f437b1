//! One certificate generation run: classify, build the template, generate
//! the key, self-sign and PEM-encode.

use bon::Builder;
use tracing::info;

use crate::cert::Certificate;
use crate::classify::SubjectIdentity;
use crate::error::{CertgenError, Result};
use crate::key::{KeyAlgorithm, KeyPair};
use crate::template::{CertificateTemplate, TemplateOptions};

/// Everything needed to generate one certificate.
///
/// # Fields
/// * `hosts` - Comma-separated hostnames, IPs, email addresses or URIs.
/// * `algorithm` - Key algorithm of the generated key pair.
/// * `options` - Subject, role and validity of the certificate.
#[derive(Clone, Debug, Builder)]
pub struct GenerationRequest {
    #[builder(into)]
    pub hosts: String,
    #[builder(default)]
    pub algorithm: KeyAlgorithm,
    pub options: TemplateOptions,
}

/// The result of a successful run, both as structures and as PEM text.
#[derive(Clone, Debug)]
pub struct GeneratedCertificate {
    pub template: CertificateTemplate,
    pub certificate: Certificate,
    pub key_pair: KeyPair,
    pub certificate_pem: String,
    pub private_key_pem: String,
}

/// Runs the whole pipeline for `request`.
///
/// # Example
/// ```
/// use certgen::cert::params::Validity;
/// use certgen::generator::{GenerationRequest, generate};
/// use certgen::template::TemplateOptions;
///
/// let request = GenerationRequest::builder()
///     .hosts("localhost, 127.0.0.1")
///     .options(TemplateOptions::builder().validity(Validity::for_days(1)).build())
///     .build();
/// let generated = generate(&request).unwrap();
/// assert!(generated.template.is_ca);
/// assert!(generated.certificate_pem.starts_with("-----BEGIN CERTIFICATE-----"));
/// ```
pub fn generate(request: &GenerationRequest) -> Result<GeneratedCertificate> {
    if request.hosts.is_empty() {
        return Err(CertgenError::MissingInput("--host".to_string()));
    }

    let identity = SubjectIdentity::from_hosts(&request.hosts);
    let template = CertificateTemplate::build(identity, &request.options)?;

    let key_pair = KeyPair::generate(request.algorithm)?;
    info!(algorithm = %request.algorithm, "generated private key");

    let certificate = Certificate::new_self_signed(&template, &key_pair)?;
    let certificate_pem = certificate.to_pem()?;
    let private_key_pem = key_pair.to_pkcs8_pem()?;

    Ok(GeneratedCertificate {
        template,
        certificate,
        key_pair,
        certificate_pem,
        private_key_pem,
    })
}
