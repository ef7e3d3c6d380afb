//! Key store trait and in-memory implementation.
//!
//! The [`KeyStore`] trait is the only capability the authentication layer
//! needs from a secret-management service: fetch one half of a key pair by
//! key ID. It is read-only from the caller's point of view, so concurrent
//! lookups need no coordination.
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use cookiegate_keys::{KeyStore, MemoryKeyStore, PublicKeyMaterial};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let store = MemoryKeyStore::new();
//! store.insert_public(
//!     PublicKeyMaterial::builder()
//!         .kid("kid-1")
//!         .pem("-----BEGIN PUBLIC KEY-----".to_owned())
//!         .build(),
//! );
//!
//! let store: Arc<dyn KeyStore> = Arc::new(store);
//! assert!(store.get_public_key("kid-1").await.unwrap().is_some());
//! assert!(store.get_private_key("kid-1").await.unwrap().is_none());
//! # });
//! ```

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::{
    error::KeyStoreResult,
    material::{PrivateKeyMaterial, PublicKeyMaterial},
};

/// Read access to key material held by an external secret store.
///
/// # Returns
///
/// Both methods return:
/// - `Ok(Some(key))` if the key exists
/// - `Ok(None)` if no key is published under `kid`
/// - `Err(...)` if the store could not answer
///
/// Implementations should not cache beyond what the backing service does;
/// callers that want a bounded cache wrap the store explicitly.
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Fetches the private half of the key pair published under `kid`.
    async fn get_private_key(&self, kid: &str) -> KeyStoreResult<Option<PrivateKeyMaterial>>;

    /// Fetches the public half of the key pair published under `kid`.
    async fn get_public_key(&self, kid: &str) -> KeyStoreResult<Option<PublicKeyMaterial>>;
}

#[async_trait]
impl<S: KeyStore + ?Sized> KeyStore for Arc<S> {
    async fn get_private_key(&self, kid: &str) -> KeyStoreResult<Option<PrivateKeyMaterial>> {
        (**self).get_private_key(kid).await
    }

    async fn get_public_key(&self, kid: &str) -> KeyStoreResult<Option<PublicKeyMaterial>> {
        (**self).get_public_key(kid).await
    }
}

/// In-memory implementation of [`KeyStore`] for tests and development.
///
/// Private and public halves are stored independently so a store can be
/// seeded with only the half a component is allowed to see.
///
/// # Thread Safety
///
/// Uses [`parking_lot::RwLock`]; clones share the same underlying maps.
#[derive(Debug, Default, Clone)]
pub struct MemoryKeyStore {
    private_keys: Arc<RwLock<HashMap<String, PrivateKeyMaterial>>>,
    public_keys: Arc<RwLock<HashMap<String, PublicKeyMaterial>>>,
}

impl MemoryKeyStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a private key, replacing any key with the same ID.
    pub fn insert_private(&self, key: PrivateKeyMaterial) {
        self.private_keys.write().insert(key.kid.clone(), key);
    }

    /// Stores a public key, replacing any key with the same ID.
    pub fn insert_public(&self, key: PublicKeyMaterial) {
        self.public_keys.write().insert(key.kid.clone(), key);
    }

    /// Stores both halves of a key pair.
    pub fn insert_pair(&self, private: PrivateKeyMaterial, public: PublicKeyMaterial) {
        self.insert_private(private);
        self.insert_public(public);
    }

    /// Removes both halves of the pair published under `kid`.
    ///
    /// Returns `true` if either half was present.
    pub fn remove(&self, kid: &str) -> bool {
        let had_private = self.private_keys.write().remove(kid).is_some();
        let had_public = self.public_keys.write().remove(kid).is_some();
        had_private || had_public
    }

    /// Returns the number of distinct key IDs with at least one half stored.
    #[must_use]
    pub fn len(&self) -> usize {
        let private = self.private_keys.read();
        let public = self.public_keys.read();
        private.len() + public.keys().filter(|kid| !private.contains_key(*kid)).count()
    }

    /// Returns `true` if the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyStore for MemoryKeyStore {
    #[tracing::instrument(skip(self))]
    async fn get_private_key(&self, kid: &str) -> KeyStoreResult<Option<PrivateKeyMaterial>> {
        Ok(self.private_keys.read().get(kid).cloned())
    }

    #[tracing::instrument(skip(self))]
    async fn get_public_key(&self, kid: &str) -> KeyStoreResult<Option<PublicKeyMaterial>> {
        Ok(self.public_keys.read().get(kid).cloned())
    }
}
