//! Deadline enforcement for key store lookups.
//!
//! Key retrieval usually crosses the network. [`TimeoutKeyStore`] bounds
//! every lookup so a slow or hung secret service surfaces as
//! [`KeyStoreError::Timeout`] instead of stalling the request that needed
//! the key.

use std::time::Duration;

use async_trait::async_trait;

use crate::{
    error::{KeyStoreError, KeyStoreResult},
    material::{PrivateKeyMaterial, PublicKeyMaterial},
    store::KeyStore,
};

/// Wraps a [`KeyStore`] and fails any lookup that exceeds `timeout`.
#[derive(Debug, Clone)]
pub struct TimeoutKeyStore<S> {
    inner: S,
    timeout: Duration,
}

impl<S: KeyStore> TimeoutKeyStore<S> {
    /// Wraps `inner` with the given per-lookup deadline.
    #[must_use]
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// Returns the configured deadline.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns a reference to the wrapped store.
    #[must_use]
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: KeyStore> KeyStore for TimeoutKeyStore<S> {
    async fn get_private_key(&self, kid: &str) -> KeyStoreResult<Option<PrivateKeyMaterial>> {
        match tokio::time::timeout(self.timeout, self.inner.get_private_key(kid)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    kid,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "private key lookup timed out"
                );
                Err(KeyStoreError::timeout())
            },
        }
    }

    async fn get_public_key(&self, kid: &str) -> KeyStoreResult<Option<PublicKeyMaterial>> {
        match tokio::time::timeout(self.timeout, self.inner.get_public_key(kid)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    kid,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "public key lookup timed out"
                );
                Err(KeyStoreError::timeout())
            },
        }
    }
}
