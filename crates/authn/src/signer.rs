//! Signing and verification of serialized policies.
//!
//! [`PolicySigner`] and [`PolicyVerifier`] are built from PEM key material
//! and dispatch on [`SigningAlgorithm`]. Both operate on the exact policy
//! bytes they are given; nothing is re-serialized.

use std::fmt;

use cookiegate_keys::{PrivateKeyMaterial, PublicKeyMaterial, SigningAlgorithm};
use ed25519_dalek::{
    Signer as _,
    pkcs8::{DecodePrivateKey as _, DecodePublicKey as _},
};
use rsa::{
    RsaPrivateKey, RsaPublicKey,
    pkcs1::{DecodeRsaPrivateKey as _, DecodeRsaPublicKey as _},
    pkcs1v15,
    pkcs8::{DecodePrivateKey as _, DecodePublicKey as _},
    signature::{SignatureEncoding as _, Signer as _, Verifier as _},
};
use sha1::Sha1;

use crate::{error::AuthError, validation::validate_algorithm};

/// Signs policy bytes with a private key.
pub enum PolicySigner {
    /// Ed25519 signing key.
    Ed25519(ed25519_dalek::SigningKey),
    /// RSASSA-PKCS1-v1_5 / SHA-1 signing key.
    RsaSha1(pkcs1v15::SigningKey<Sha1>),
}

impl PolicySigner {
    /// Parses private key material, requiring it to use `expected`.
    ///
    /// # Errors
    ///
    /// - [`AuthError::AlgorithmMismatch`] if the material is for another algorithm
    /// - [`AuthError::InvalidKey`] if the PEM does not parse
    pub fn from_material(
        material: &PrivateKeyMaterial,
        expected: SigningAlgorithm,
    ) -> Result<Self, AuthError> {
        validate_algorithm(&material.kid, expected, material.algorithm)?;

        let pem = material.pem.as_str();
        match material.algorithm {
            SigningAlgorithm::Ed25519 => ed25519_dalek::SigningKey::from_pkcs8_pem(pem)
                .map(Self::Ed25519)
                .map_err(|e| AuthError::invalid_key(&material.kid, e.to_string())),
            SigningAlgorithm::RsaSha1 => RsaPrivateKey::from_pkcs8_pem(pem)
                .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
                .map(|key| Self::RsaSha1(pkcs1v15::SigningKey::new(key)))
                .map_err(|e| AuthError::invalid_key(&material.kid, e.to_string())),
        }
    }

    /// Returns the algorithm of the key.
    #[must_use]
    pub fn algorithm(&self) -> SigningAlgorithm {
        match self {
            Self::Ed25519(_) => SigningAlgorithm::Ed25519,
            Self::RsaSha1(_) => SigningAlgorithm::RsaSha1,
        }
    }

    /// Signs `message` and returns the raw signature bytes.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Signing`] if the underlying signer fails.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, AuthError> {
        match self {
            Self::Ed25519(key) => key
                .try_sign(message)
                .map(|signature| signature.to_bytes().to_vec())
                .map_err(|e| AuthError::signing(e.to_string())),
            Self::RsaSha1(key) => key
                .try_sign(message)
                .map(|signature| signature.to_vec())
                .map_err(|e| AuthError::signing(e.to_string())),
        }
    }
}

impl fmt::Debug for PolicySigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicySigner")
            .field("algorithm", &self.algorithm())
            .finish_non_exhaustive()
    }
}

/// Verifies policy signatures with a public key.
pub enum PolicyVerifier {
    /// Ed25519 verifying key.
    Ed25519(ed25519_dalek::VerifyingKey),
    /// RSASSA-PKCS1-v1_5 / SHA-1 verifying key.
    RsaSha1(pkcs1v15::VerifyingKey<Sha1>),
}

impl PolicyVerifier {
    /// Parses public key material, requiring it to use `expected`.
    ///
    /// # Errors
    ///
    /// - [`AuthError::AlgorithmMismatch`] if the material is for another algorithm
    /// - [`AuthError::InvalidKey`] if the PEM does not parse
    pub fn from_material(
        material: &PublicKeyMaterial,
        expected: SigningAlgorithm,
    ) -> Result<Self, AuthError> {
        validate_algorithm(&material.kid, expected, material.algorithm)?;

        let pem = material.pem.as_str();
        match material.algorithm {
            SigningAlgorithm::Ed25519 => ed25519_dalek::VerifyingKey::from_public_key_pem(pem)
                .map(Self::Ed25519)
                .map_err(|e| AuthError::invalid_key(&material.kid, e.to_string())),
            SigningAlgorithm::RsaSha1 => RsaPublicKey::from_public_key_pem(pem)
                .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
                .map(|key| Self::RsaSha1(pkcs1v15::VerifyingKey::new(key)))
                .map_err(|e| AuthError::invalid_key(&material.kid, e.to_string())),
        }
    }

    /// Returns the algorithm of the key.
    #[must_use]
    pub fn algorithm(&self) -> SigningAlgorithm {
        match self {
            Self::Ed25519(_) => SigningAlgorithm::Ed25519,
            Self::RsaSha1(_) => SigningAlgorithm::RsaSha1,
        }
    }

    /// Verifies `signature` over `message`.
    ///
    /// Ed25519 signatures are checked with strict verification, which also
    /// rejects malleable and small-order encodings.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidSignature`] if the signature has the wrong
    /// shape or does not match.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), AuthError> {
        match self {
            Self::Ed25519(key) => {
                let signature = ed25519_dalek::Signature::from_slice(signature)
                    .map_err(|_| AuthError::InvalidSignature)?;
                key.verify_strict(message, &signature).map_err(|_| AuthError::InvalidSignature)
            },
            Self::RsaSha1(key) => {
                let signature = pkcs1v15::Signature::try_from(signature)
                    .map_err(|_| AuthError::InvalidSignature)?;
                key.verify(message, &signature).map_err(|_| AuthError::InvalidSignature)
            },
        }
    }
}

impl fmt::Debug for PolicyVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyVerifier")
            .field("algorithm", &self.algorithm())
            .finish_non_exhaustive()
    }
}
