mod util;

use std::process::Command;

use certgen::key::KeyAlgorithm;
use certgen::output::{self, OutputPaths};
use certgen::template::CertificateRole;
use regex::Regex;

fn openssl_available() -> bool {
    let available = Command::new("openssl")
        .arg("version")
        .output()
        .is_ok_and(|output| output.status.success());
    if !available {
        eprintln!("openssl binary not found, skipping");
    }
    available
}

fn openssl(args: &[&str]) -> String {
    let output = Command::new("openssl")
        .args(args)
        .output()
        .expect("Failed to execute OpenSSL command");
    assert!(
        output.status.success(),
        "OpenSSL command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_openssl_reads_ca_cert() {
    if !openssl_available() {
        return;
    }

    let generated = util::generate_cert(
        "localhost, 127.0.0.1",
        KeyAlgorithm::EcdsaP256,
        CertificateRole::CertificateAuthority,
    );
    let dir = tempfile::tempdir().unwrap();
    let paths = OutputPaths::for_role(Some(dir.path()), CertificateRole::CertificateAuthority);
    output::write_certificate(&paths.certificate, &generated.certificate_pem).unwrap();
    let cert_path = paths.certificate.to_str().unwrap();

    let output_text = openssl(&["x509", "-in", cert_path, "-noout", "-text"]);

    assert!(output_text.contains("Version: 3 (0x2)"), "{output_text}");
    assert!(output_text.contains("Certgen Tests"), "{output_text}");
    assert!(
        output_text.contains("Signature Algorithm: ecdsa-with-SHA256"),
        "{output_text}"
    );
    assert!(output_text.contains("X509v3 Key Usage: critical"), "{output_text}");
    assert!(
        output_text.contains("Digital Signature, Key Encipherment, Certificate Sign"),
        "{output_text}"
    );
    assert!(output_text.contains("CA:TRUE"), "{output_text}");
    assert!(
        output_text.contains("TLS Web Server Authentication"),
        "{output_text}"
    );
    assert!(output_text.contains("X509v3 Subject Key Identifier"), "{output_text}");
    assert!(
        output_text.contains("DNS:localhost, IP Address:127.0.0.1"),
        "{output_text}"
    );

    let not_before_regex = Regex::new(r"Not Before: .+").unwrap();
    let not_after_regex = Regex::new(r"Not After : .+").unwrap();
    assert!(not_before_regex.is_match(&output_text));
    assert!(not_after_regex.is_match(&output_text));

    // A self-signed CA validates against itself.
    let verify = openssl(&["verify", "-CAfile", cert_path, cert_path]);
    assert!(verify.trim_end().ends_with("OK"), "{verify}");
}

#[test]
fn test_openssl_reads_client_key() {
    if !openssl_available() {
        return;
    }

    let generated = util::generate_cert("client.local", KeyAlgorithm::EcdsaP384, CertificateRole::Client);
    let dir = tempfile::tempdir().unwrap();
    let paths = OutputPaths::for_role(Some(dir.path()), CertificateRole::Client);
    output::write_certificate(&paths.certificate, &generated.certificate_pem).unwrap();
    output::write_private_key(&paths.private_key, &generated.private_key_pem).unwrap();

    let cert_text = openssl(&[
        "x509",
        "-in",
        paths.certificate.to_str().unwrap(),
        "-noout",
        "-text",
    ]);
    assert!(cert_text.contains("CA:FALSE"), "{cert_text}");
    assert!(
        cert_text.contains("TLS Web Server Authentication, TLS Web Client Authentication"),
        "{cert_text}"
    );
    assert!(
        cert_text.contains("Signature Algorithm: ecdsa-with-SHA384"),
        "{cert_text}"
    );

    // The key file holds the private half of the certificate's public key.
    let cert_pubkey = openssl(&["x509", "-in", paths.certificate.to_str().unwrap(), "-noout", "-pubkey"]);
    let key_pubkey = openssl(&["pkey", "-in", paths.private_key.to_str().unwrap(), "-pubout"]);
    assert_eq!(cert_pubkey, key_pubkey);
}
