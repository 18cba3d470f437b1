//! use certgen::error::CertgenError;

use thiserror::Error;

/// Represents errors that can occur while generating a certificate.
///
/// Every variant is fatal for a run: nothing is retried and no partial output
/// is considered valid.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CertgenError {
    /// No identifiers were supplied.
    #[error("Missing required {0} parameter")]
    MissingInput(String),

    /// The key algorithm selector named an unknown curve.
    #[error("Unrecognized elliptic curve: {0:?}")]
    UnrecognizedAlgorithm(String),

    /// The start date did not match the `Jan 2 15:04:05 2006` layout.
    #[error("Failed to parse creation date: {0}")]
    DateFormatError(String),

    /// Error during key generation.
    #[error("Failed to generate private key: {0}")]
    KeyGenerationError(String),

    /// The random serial number could not be drawn.
    #[error("Failed to generate serial number: {0}")]
    SerialNumberGenerationError(String),

    /// Error while assembling or signing the certificate.
    #[error("Failed to create certificate: {0}")]
    SigningError(String),

    /// An output file could not be created, written or closed.
    #[error("Failed to write {path}: {message}")]
    FileIoError { path: String, message: String },

    /// The private key could not be serialized.
    #[error("Unable to marshal private key: {0}")]
    MarshalError(String),

    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// Error during data decoding.
    #[error("Failed to decode data: {0}")]
    DecodingError(String),

    /// Error due to invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, CertgenError>;

impl From<der::Error> for CertgenError {
    /// Converts a `der::Error` into a `CertgenError`.
    fn from(err: der::Error) -> Self {
        CertgenError::EncodingError(err.to_string())
    }
}

impl From<x509_cert::spki::Error> for CertgenError {
    fn from(err: x509_cert::spki::Error) -> Self {
        CertgenError::EncodingError(err.to_string())
    }
}
