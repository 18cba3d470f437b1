//! # Certgen - Self-Signed Development Certificates in Pure Rust
//!
//! Certgen generates a single self-signed X.509 certificate and its private
//! key for development use. It is built entirely with rustcrypto libraries.
//!
//! A run takes a comma-separated list of identifiers, classifies each one as
//! an IP address, email address, URI or DNS name, builds a certificate
//! template from them, generates a key pair, self-signs and PEM-encodes the
//! result.
//!
//! ## Supported Key Types
//!
//! - **ECDSA**: P-224, P-256, P-384 and P-521 curves
//! - **Ed25519**: Edwards curve digital signature algorithm
//!
//! ## Certificate Roles
//!
//! - **Certificate authority** (default): `cA` is set and the key may sign certificates
//! - **Leaf**: a plain end-entity certificate
//! - **Client**: adds client authentication, never a CA
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use certgen::{
//!     cert::params::Validity,
//!     generator::{GenerationRequest, generate},
//!     key::KeyAlgorithm,
//!     output::{self, OutputPaths},
//!     template::{CertificateRole, TemplateOptions},
//! };
//!
//! # fn main() -> Result<(), certgen::error::CertgenError> {
//! let role = CertificateRole::from_flags(false, true);
//! let options = TemplateOptions::builder()
//!     .organization("Example Corp")
//!     .role(role)
//!     .validity(Validity::for_days(90))
//!     .build();
//!
//! let request = GenerationRequest::builder()
//!     .hosts("localhost, 127.0.0.1, *.dev.example.com")
//!     .algorithm(KeyAlgorithm::Ed25519)
//!     .options(options)
//!     .build();
//! let generated = generate(&request)?;
//!
//! let paths = OutputPaths::for_role(None, role);
//! output::write_certificate(&paths.certificate, &generated.certificate_pem)?;
//! output::write_private_key(&paths.private_key, &generated.private_key_pem)?;
//! print!("{}", output::summary(&request.hosts, &paths));
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every operation returns [`error::Result`]. Nothing is retried: any error
//! ends the run.
//!
//! ```rust
//! use certgen::{error::CertgenError, key::KeyAlgorithm};
//!
//! match KeyAlgorithm::select("P192", false) {
//!     Ok(algorithm) => println!("Using {algorithm}"),
//!     Err(CertgenError::UnrecognizedAlgorithm(curve)) => println!("Unknown curve {curve}"),
//!     Err(e) => println!("Other error: {e}"),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`classify`]: Sorting identifiers into IP, email, URI and DNS names
//! - [`template`]: Certificate template assembly and the role decision table
//! - [`key`]: Key generation, signing and PKCS#8 export
//! - [`cert`]: Certificate encoding and X.509 extensions
//! - [`issuer`]: Extension layout and signing
//! - [`generator`]: The end-to-end pipeline
//! - [`output`]: Output files and the run summary
//! - [`owner`]: The `user@host (Full Name)` identity of the local user
//! - [`error`]: Error types

pub mod cert;
pub mod classify;
pub mod error;
pub mod generator;
pub mod issuer;
pub mod key;
pub mod mailbox;
pub mod output;
pub mod owner;
pub mod pem_utils;
pub mod tbs_certificate;
pub mod template;
