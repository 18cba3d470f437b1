use std::fmt;

use ecdsa::signature::Signer;
use ecdsa::signature::hazmat::PrehashSigner;
use ed25519_dalek::SigningKey as Ed25519SigningKey;
use ed25519_dalek::VerifyingKey as Ed25519VerifyingKey;
use pkcs8::EncodePrivateKey;
use rand_core::RngCore;
use sha2::{Digest, Sha256};
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::SignatureAlgorithm;
use crate::error::{CertgenError, Result};
use crate::pem_utils::{PRIVATE_KEY_LABEL, der_to_pem};

/// Key algorithms a certificate can be generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyAlgorithm {
    EcdsaP224,
    #[default]
    EcdsaP256,
    EcdsaP384,
    EcdsaP521,
    Ed25519,
}

impl KeyAlgorithm {
    /// Resolves an ECDSA curve name (`P224`, `P256`, `P384`, `P521`).
    pub fn from_curve_name(name: &str) -> Result<Self> {
        match name {
            "P224" => Ok(KeyAlgorithm::EcdsaP224),
            "P256" => Ok(KeyAlgorithm::EcdsaP256),
            "P384" => Ok(KeyAlgorithm::EcdsaP384),
            "P521" => Ok(KeyAlgorithm::EcdsaP521),
            other => Err(CertgenError::UnrecognizedAlgorithm(other.to_string())),
        }
    }

    /// Picks the algorithm from the command line selectors.
    ///
    /// `ed25519` wins over any curve name. Without it, an empty curve name
    /// leaves no algorithm selected, which is an error.
    pub fn select(curve: &str, ed25519: bool) -> Result<Self> {
        if ed25519 {
            return Ok(KeyAlgorithm::Ed25519);
        }
        if curve.is_empty() {
            return Err(CertgenError::KeyGenerationError(
                "no ECDSA curve given and Ed25519 not requested".to_string(),
            ));
        }
        Self::from_curve_name(curve)
    }

    /// The algorithm a key of this type signs certificates with.
    pub fn signature_algorithm(self) -> SignatureAlgorithm {
        match self {
            KeyAlgorithm::EcdsaP224 | KeyAlgorithm::EcdsaP256 => SignatureAlgorithm::EcdsaWithSha256,
            KeyAlgorithm::EcdsaP384 => SignatureAlgorithm::EcdsaWithSha384,
            KeyAlgorithm::EcdsaP521 => SignatureAlgorithm::EcdsaWithSha512,
            KeyAlgorithm::Ed25519 => SignatureAlgorithm::Ed25519,
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyAlgorithm::EcdsaP224 => "P224",
            KeyAlgorithm::EcdsaP256 => "P256",
            KeyAlgorithm::EcdsaP384 => "P384",
            KeyAlgorithm::EcdsaP521 => "P521",
            KeyAlgorithm::Ed25519 => "Ed25519",
        };
        f.write_str(name)
    }
}

/// A freshly generated private key.
#[derive(Clone, Debug)]
pub enum KeyPair {
    EcdsaP224(p224::SecretKey),
    EcdsaP256(p256::SecretKey),
    EcdsaP384(p384::SecretKey),
    EcdsaP521(p521::SecretKey),
    Ed25519(Ed25519SigningKey),
}

impl KeyPair {
    /// Generate a key pair of the given algorithm from the OS random source.
    ///
    /// A failing random source is reported as `KeyGenerationError`.
    pub fn generate(algorithm: KeyAlgorithm) -> Result<Self> {
        let key_pair = match algorithm {
            KeyAlgorithm::EcdsaP224 => {
                KeyPair::EcdsaP224(random_secret(28, 0xff, p224::SecretKey::from_slice)?)
            }
            KeyAlgorithm::EcdsaP256 => {
                KeyPair::EcdsaP256(random_secret(32, 0xff, p256::SecretKey::from_slice)?)
            }
            KeyAlgorithm::EcdsaP384 => {
                KeyPair::EcdsaP384(random_secret(48, 0xff, p384::SecretKey::from_slice)?)
            }
            // 521 bits: only the low bit of the leading byte is used.
            KeyAlgorithm::EcdsaP521 => {
                KeyPair::EcdsaP521(random_secret(66, 0x01, p521::SecretKey::from_slice)?)
            }
            KeyAlgorithm::Ed25519 => {
                let mut seed = [0u8; ed25519_dalek::SECRET_KEY_LENGTH];
                fill_random(&mut seed)?;
                KeyPair::Ed25519(Ed25519SigningKey::from_bytes(&seed))
            }
        };
        Ok(key_pair)
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            KeyPair::EcdsaP224(_) => KeyAlgorithm::EcdsaP224,
            KeyPair::EcdsaP256(_) => KeyAlgorithm::EcdsaP256,
            KeyPair::EcdsaP384(_) => KeyAlgorithm::EcdsaP384,
            KeyPair::EcdsaP521(_) => KeyAlgorithm::EcdsaP521,
            KeyPair::Ed25519(_) => KeyAlgorithm::Ed25519,
        }
    }

    /// Signs `data` the way X.509 expects for this key type.
    ///
    /// ECDSA signatures are returned DER-encoded. P-224 signs a SHA-256
    /// digest truncated to the curve size, the other curves use the digest
    /// matching their size.
    pub fn sign_data(&self, data: &[u8]) -> Result<Vec<u8>> {
        let signing_error = |e: ecdsa::Error| CertgenError::SigningError(e.to_string());

        match self {
            KeyPair::EcdsaP224(secret) => {
                let signing_key = p224::ecdsa::SigningKey::from(secret);
                let digest = Sha256::digest(data);
                let signature: p224::ecdsa::Signature =
                    signing_key.sign_prehash(&digest).map_err(signing_error)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            KeyPair::EcdsaP256(secret) => {
                let signing_key = p256::ecdsa::SigningKey::from(secret);
                let signature: p256::ecdsa::Signature =
                    signing_key.try_sign(data).map_err(signing_error)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            KeyPair::EcdsaP384(secret) => {
                let signing_key = p384::ecdsa::SigningKey::from(secret);
                let signature: p384::ecdsa::Signature =
                    signing_key.try_sign(data).map_err(signing_error)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            KeyPair::EcdsaP521(secret) => {
                let signing_key =
                    p521::ecdsa::SigningKey::from_bytes(&secret.to_bytes()).map_err(signing_error)?;
                let signature: p521::ecdsa::Signature =
                    signing_key.try_sign(data).map_err(signing_error)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            KeyPair::Ed25519(signing_key) => {
                let signature = signing_key.sign(data);
                Ok(signature.to_bytes().to_vec())
            }
        }
    }

    /// Serializes the private key as an unencrypted PKCS#8 document.
    pub fn to_pkcs8_der(&self) -> Result<Vec<u8>> {
        let document = match self {
            KeyPair::EcdsaP224(secret) => secret.to_pkcs8_der(),
            KeyPair::EcdsaP256(secret) => secret.to_pkcs8_der(),
            KeyPair::EcdsaP384(secret) => secret.to_pkcs8_der(),
            KeyPair::EcdsaP521(secret) => secret.to_pkcs8_der(),
            KeyPair::Ed25519(signing_key) => signing_key.to_pkcs8_der(),
        }
        .map_err(|e| CertgenError::MarshalError(e.to_string()))?;

        Ok(document.as_bytes().to_vec())
    }

    /// PKCS#8 private key in a `PRIVATE KEY` PEM block.
    pub fn to_pkcs8_pem(&self) -> Result<String> {
        Ok(der_to_pem(&self.to_pkcs8_der()?, PRIVATE_KEY_LABEL))
    }
}

const MAX_SCALAR_DRAWS: usize = 64;

fn fill_random(bytes: &mut [u8]) -> Result<()> {
    rand_core::OsRng
        .try_fill_bytes(bytes)
        .map_err(|e| CertgenError::KeyGenerationError(e.to_string()))
}

/// Draws big-endian scalars until one is a valid secret key for the curve.
fn random_secret<K, E>(
    len: usize,
    leading_byte_mask: u8,
    from_slice: impl Fn(&[u8]) -> std::result::Result<K, E>,
) -> Result<K> {
    let mut bytes = vec![0u8; len];
    for _ in 0..MAX_SCALAR_DRAWS {
        fill_random(&mut bytes)?;
        bytes[0] &= leading_byte_mask;
        if let Ok(secret) = from_slice(&bytes) {
            return Ok(secret);
        }
    }
    Err(CertgenError::KeyGenerationError(format!(
        "no valid scalar after {MAX_SCALAR_DRAWS} draws"
    )))
}

/// The public half of a [`KeyPair`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublicKey {
    EcdsaP224(p224::PublicKey),
    EcdsaP256(p256::PublicKey),
    EcdsaP384(p384::PublicKey),
    EcdsaP521(p521::PublicKey),
    Ed25519(Ed25519VerifyingKey),
}

impl PublicKey {
    /// Derives the public key of a key pair.
    pub fn from_key_pair(key_pair: &KeyPair) -> Self {
        match key_pair {
            KeyPair::EcdsaP224(secret) => PublicKey::EcdsaP224(secret.public_key()),
            KeyPair::EcdsaP256(secret) => PublicKey::EcdsaP256(secret.public_key()),
            KeyPair::EcdsaP384(secret) => PublicKey::EcdsaP384(secret.public_key()),
            KeyPair::EcdsaP521(secret) => PublicKey::EcdsaP521(secret.public_key()),
            KeyPair::Ed25519(signing_key) => PublicKey::Ed25519(signing_key.verifying_key()),
        }
    }

    /// Encodes the key as a `SubjectPublicKeyInfo` structure.
    pub fn to_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        let spki = match self {
            PublicKey::EcdsaP224(key) => SubjectPublicKeyInfoOwned::from_key(*key),
            PublicKey::EcdsaP256(key) => SubjectPublicKeyInfoOwned::from_key(*key),
            PublicKey::EcdsaP384(key) => SubjectPublicKeyInfoOwned::from_key(*key),
            PublicKey::EcdsaP521(key) => SubjectPublicKeyInfoOwned::from_key(*key),
            PublicKey::Ed25519(key) => SubjectPublicKeyInfoOwned::from_key(*key),
        };
        Ok(spki?)
    }
}
