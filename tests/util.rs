use certgen::cert::params::Validity;
use certgen::generator::{GeneratedCertificate, GenerationRequest, generate};
use certgen::key::KeyAlgorithm;
use certgen::template::{CertificateRole, TemplateOptions};

pub fn generate_cert(hosts: &str, algorithm: KeyAlgorithm, role: CertificateRole) -> GeneratedCertificate {
    let options = TemplateOptions::builder()
        .organization("Certgen Tests")
        .organizational_unit("tester@ci (Test Runner)")
        .role(role)
        .validity(Validity::for_days(365))
        .build();

    let request = GenerationRequest::builder()
        .hosts(hosts)
        .algorithm(algorithm)
        .options(options)
        .build();

    generate(&request).unwrap()
}
