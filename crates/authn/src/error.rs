//! Authentication error types.
//!
//! [`AuthError`] covers failures of the codec, the signer and the issuer.
//! The authorizer never returns it: every failure on the verification path
//! is converted to a [`DenialReason`](crate::DenialReason) through
//! [`AuthError::denial_reason`].

use cookiegate_keys::{KeyStoreError, SigningAlgorithm};
use thiserror::Error;

use crate::decision::DenialReason;

/// Errors raised while building, signing, encoding or decoding cookies.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]`. Downstream match expressions
/// must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    /// A cookie token is not valid cookie-safe base64.
    #[error("Decode error: {message}")]
    Decode {
        /// What was wrong with the token.
        message: String,
    },

    /// Decoded bytes are not a well-formed policy document.
    #[error("Malformed policy: {message}")]
    MalformedPolicy {
        /// Which field was missing or mistyped.
        message: String,
    },

    /// A policy could not be constructed from the given inputs.
    #[error("Invalid policy: {message}")]
    InvalidPolicy {
        /// Why the inputs were rejected.
        message: String,
    },

    /// The key store could not produce the requested key.
    #[error("Key unavailable: {kid}")]
    KeyUnavailable {
        /// Key ID that was requested.
        kid: String,
        /// The store failure, absent when the key simply does not exist.
        #[source]
        source: Option<KeyStoreError>,
    },

    /// Key material was fetched but could not be parsed.
    #[error("Invalid key material for {kid}: {message}")]
    InvalidKey {
        /// Key ID of the unusable key.
        kid: String,
        /// Parser diagnostic.
        message: String,
    },

    /// The key's algorithm differs from the configured algorithm.
    #[error("Key {kid} uses {actual}, expected {expected}")]
    AlgorithmMismatch {
        /// Key ID of the offending key.
        kid: String,
        /// Configured algorithm.
        expected: SigningAlgorithm,
        /// Algorithm recorded on the key material.
        actual: SigningAlgorithm,
    },

    /// Key ID failed format validation.
    #[error("Invalid key ID: {message}")]
    InvalidKeyId {
        /// Why the key ID was rejected.
        message: String,
    },

    /// The signature does not match the policy bytes.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Producing a signature failed.
    #[error("Signing failed: {message}")]
    Signing {
        /// Signer diagnostic.
        message: String,
    },

    /// Configuration was rejected.
    #[error("Configuration error: {message}")]
    Config {
        /// Which setting was invalid.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `Decode` error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode { message: message.into() }
    }

    /// Creates a new `MalformedPolicy` error.
    #[must_use]
    pub fn malformed_policy(message: impl Into<String>) -> Self {
        Self::MalformedPolicy { message: message.into() }
    }

    /// Creates a new `InvalidPolicy` error.
    #[must_use]
    pub fn invalid_policy(message: impl Into<String>) -> Self {
        Self::InvalidPolicy { message: message.into() }
    }

    /// Creates a new `KeyUnavailable` error for a key that does not exist.
    #[must_use]
    pub fn key_not_found(kid: impl Into<String>) -> Self {
        Self::KeyUnavailable { kid: kid.into(), source: None }
    }

    /// Creates a new `KeyUnavailable` error wrapping a store failure.
    #[must_use]
    pub fn key_unavailable(kid: impl Into<String>, source: KeyStoreError) -> Self {
        Self::KeyUnavailable { kid: kid.into(), source: Some(source) }
    }

    /// Creates a new `InvalidKey` error.
    #[must_use]
    pub fn invalid_key(kid: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidKey { kid: kid.into(), message: message.into() }
    }

    /// Creates a new `InvalidKeyId` error.
    #[must_use]
    pub fn invalid_key_id(message: impl Into<String>) -> Self {
        Self::InvalidKeyId { message: message.into() }
    }

    /// Creates a new `Signing` error.
    #[must_use]
    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing { message: message.into() }
    }

    /// Creates a new `Config` error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    /// Maps an error raised on the verification path to the denial it causes.
    ///
    /// Errors that can only come from a broken deployment (unparseable key
    /// material, signer faults, bad configuration) map to
    /// [`DenialReason::InternalError`].
    #[must_use]
    pub fn denial_reason(&self) -> DenialReason {
        match self {
            Self::Decode { .. } | Self::MalformedPolicy { .. } | Self::InvalidKeyId { .. } => {
                DenialReason::MalformedCredential
            },
            Self::KeyUnavailable { .. } | Self::AlgorithmMismatch { .. } => {
                DenialReason::KeyLookupFailed
            },
            Self::InvalidSignature => DenialReason::InvalidSignature,
            Self::InvalidPolicy { .. }
            | Self::InvalidKey { .. }
            | Self::Signing { .. }
            | Self::Config { .. } => DenialReason::InternalError,
        }
    }
}

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;
