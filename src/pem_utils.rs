/// Block label for certificates.
pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";

/// Block label for PKCS#8 private keys.
pub const PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";

/// Convert DER‑encoded data into a PEM‑encoded string with the provided label.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(
        &pem,
        pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
    )
}

/// Convert a PEM‑encoded string to DER‑encoded bytes, checking the label.
pub fn pem_to_der(pem_str: &str, label: &str) -> Result<Vec<u8>, pem::PemError> {
    let pem = pem::parse(pem_str)?;
    if pem.tag() != label {
        return Err(pem::PemError::MismatchedTags(
            label.to_string(),
            pem.tag().to_string(),
        ));
    }
    Ok(pem.contents().to_vec())
}
