//! Shared test utilities for cookie issuance and authorization.
//!
//! This module provides key pair generators for both supported algorithms,
//! a key store that fails on demand, token tampering helpers, and the
//! [`assert_denied!`](crate::assert_denied) macro. It is feature-gated
//! behind `testutil` to prevent leaking into production builds.
//!
//! # Usage
//!
//! In integration tests, enable the feature in `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! cookiegate-authn = { path = "../authn", features = ["testutil"] }
//! ```
//!
//! Then import helpers:
//!
//! ```no_run
//! // Requires the `testutil` feature to be enabled.
//! use cookiegate_authn::testutil::{ed25519_key_pair, memory_store};
//! ```

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use cookiegate_keys::{
    KeyStore, KeyStoreError, KeyStoreResult, MemoryKeyStore, PrivateKeyMaterial,
    PublicKeyMaterial, SigningAlgorithm,
};
use ed25519_dalek::{
    SigningKey,
    pkcs8::{EncodePrivateKey, EncodePublicKey, spki::der::pem::LineEnding},
};
use rand_core::OsRng;

/// Both halves of a key pair registered under one key ID.
#[derive(Clone, Debug)]
pub struct TestKeyPair {
    /// Private half, for the issuer.
    pub private: PrivateKeyMaterial,
    /// Public half, for the authorizer.
    pub public: PublicKeyMaterial,
}

/// Generates a fresh Ed25519 key pair registered under `kid`.
///
/// # Panics
///
/// Panics if PEM encoding fails (should not happen for a freshly generated key).
#[allow(clippy::expect_used)]
pub fn ed25519_key_pair(kid: &str) -> TestKeyPair {
    let signing_key = SigningKey::generate(&mut OsRng);
    let private_pem =
        signing_key.to_pkcs8_pem(LineEnding::LF).expect("encode Ed25519 private key");
    let public_pem = signing_key
        .verifying_key()
        .to_public_key_pem(LineEnding::LF)
        .expect("encode Ed25519 public key");

    pair(kid, SigningAlgorithm::Ed25519, private_pem.to_string(), public_pem)
}

/// Returns a fixed 2048-bit RSA key pair registered under `kid`.
///
/// RSA key generation takes seconds in unoptimized builds, so tests share a
/// pair checked into the source tree. It is a test fixture and must never
/// be deployed.
pub fn rsa_key_pair(kid: &str) -> TestKeyPair {
    pair(
        kid,
        SigningAlgorithm::RsaSha1,
        include_str!("testdata/rsa_private.pem").to_owned(),
        include_str!("testdata/rsa_public.pem").to_owned(),
    )
}

/// Returns a second fixed RSA key pair, unrelated to [`rsa_key_pair`].
pub fn rsa_alternate_key_pair(kid: &str) -> TestKeyPair {
    pair(
        kid,
        SigningAlgorithm::RsaSha1,
        include_str!("testdata/rsa_other_private.pem").to_owned(),
        include_str!("testdata/rsa_other_public.pem").to_owned(),
    )
}

/// Returns a key pair for `algorithm` registered under `kid`.
pub fn key_pair(kid: &str, algorithm: SigningAlgorithm) -> TestKeyPair {
    match algorithm {
        SigningAlgorithm::Ed25519 => ed25519_key_pair(kid),
        SigningAlgorithm::RsaSha1 => rsa_key_pair(kid),
    }
}

fn pair(kid: &str, algorithm: SigningAlgorithm, private: String, public: String) -> TestKeyPair {
    TestKeyPair {
        private: PrivateKeyMaterial::builder().kid(kid).algorithm(algorithm).pem(private).build(),
        public: PublicKeyMaterial::builder().kid(kid).algorithm(algorithm).pem(public).build(),
    }
}

/// Creates an in-memory store holding both halves of every pair.
pub fn memory_store(pairs: &[&TestKeyPair]) -> Arc<MemoryKeyStore> {
    let store = MemoryKeyStore::new();
    for pair in pairs {
        store.insert_pair(pair.private.clone(), pair.public.clone());
    }
    Arc::new(store)
}

/// How a [`FailingKeyStore`] fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreFailure {
    /// Every lookup returns a connection error.
    Connection,
    /// Every lookup returns an internal error.
    Internal,
    /// Every lookup returns a timeout error.
    Timeout,
    /// Every lookup waits forever. Pair with a timeout.
    Hang,
}

/// A key store whose every lookup fails.
#[derive(Clone, Debug)]
pub struct FailingKeyStore {
    failure: StoreFailure,
}

impl FailingKeyStore {
    /// Creates a store failing with `failure`.
    #[must_use]
    pub fn new(failure: StoreFailure) -> Self {
        Self { failure }
    }

    async fn fail<T>(&self) -> KeyStoreResult<T> {
        match self.failure {
            StoreFailure::Connection => Err(KeyStoreError::connection("secret service unreachable")),
            StoreFailure::Internal => Err(KeyStoreError::internal("secret service returned 500")),
            StoreFailure::Timeout => Err(KeyStoreError::timeout()),
            StoreFailure::Hang => {
                // Longer than any test timeout; the paused clock auto-advances past it.
                tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
                Err(KeyStoreError::internal("hang ended"))
            },
        }
    }
}

#[async_trait]
impl KeyStore for FailingKeyStore {
    async fn get_private_key(&self, _kid: &str) -> KeyStoreResult<Option<PrivateKeyMaterial>> {
        self.fail().await
    }

    async fn get_public_key(&self, _kid: &str) -> KeyStoreResult<Option<PublicKeyMaterial>> {
        self.fail().await
    }
}

/// Replaces the character at `index` of a cookie-safe token with a different
/// character from the token alphabet.
///
/// The replacement keeps the token decodable when `index` is not in the
/// final quantum, so the tampering reaches signature verification rather
/// than stopping at the decoder.
///
/// # Panics
///
/// Panics if `index` is out of bounds.
pub fn change_char(token: &str, index: usize) -> String {
    let mut chars: Vec<char> = token.chars().collect();
    chars[index] = if chars[index] == 'A' { 'B' } else { 'A' };
    chars.into_iter().collect()
}

/// Asserts that an [`AuthorizationDecision`](crate::AuthorizationDecision) is
/// a denial with the given [`DenialReason`](crate::DenialReason) variant.
///
/// On failure, prints the expected reason and the actual decision.
///
/// # Examples
///
/// ```no_run
/// // Requires the `testutil` feature to be enabled.
/// use cookiegate_authn::{AuthorizationDecision, DenialReason, assert_denied};
///
/// let decision = AuthorizationDecision::deny(DenialReason::Expired);
/// assert_denied!(decision, Expired);
/// ```
#[macro_export]
macro_rules! assert_denied {
    ($decision:expr, $reason:ident) => {
        assert!(
            matches!(
                $decision,
                $crate::AuthorizationDecision::Deny { reason: $crate::DenialReason::$reason }
            ),
            "expected deny({}), got: {:?}",
            stringify!($reason),
            $decision,
        );
    };
    ($decision:expr, $reason:ident, $msg:expr) => {
        assert!(
            matches!(
                $decision,
                $crate::AuthorizationDecision::Deny { reason: $crate::DenialReason::$reason }
            ),
            "{}: expected deny({}), got: {:?}",
            $msg,
            stringify!($reason),
            $decision,
        );
    };
}
