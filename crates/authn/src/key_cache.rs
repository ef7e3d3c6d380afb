//! Verifier-side cache of parsed public keys.
//!
//! Parsing a PEM public key (and for RSA, validating the modulus) costs far
//! more than verifying a signature, and the key store is usually a network
//! service. [`PublicKeyCache`] keeps parsed [`PolicyVerifier`]s for a bounded
//! time so most authorizations skip both.
//!
//! # Cache strategy
//!
//! - **TTL**: explicit, at most [`MAX_PUBLIC_KEY_CACHE_TTL`]
//! - **Capacity**: [`DEFAULT_CACHE_CAPACITY`] entries unless configured
//! - **Failures**: never cached, and never answered from a stale entry
//! - **Invalidation**: [`invalidate`](PublicKeyCache::invalidate) and
//!   [`clear`](PublicKeyCache::clear); a load racing with either is returned
//!   to its caller but not cached
//!
//! There is no fallback tier. When the store fails and the entry has
//! expired, the authorizer denies.

use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use moka::future::Cache;

use crate::{config::MAX_PUBLIC_KEY_CACHE_TTL, error::AuthError, signer::PolicyVerifier};

/// Default maximum number of cached keys.
pub const DEFAULT_CACHE_CAPACITY: u64 = 1_000;

/// Cache of parsed public keys, keyed by key ID.
pub struct PublicKeyCache {
    cache: Cache<String, Arc<PolicyVerifier>>,
    ttl: Duration,
    /// Bumped on every invalidation. A load that observes a different value
    /// after it completes does not populate the cache.
    generation: AtomicU64,
}

impl PublicKeyCache {
    /// Creates a cache with [`DEFAULT_CACHE_CAPACITY`].
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if `ttl` is zero or exceeds
    /// [`MAX_PUBLIC_KEY_CACHE_TTL`].
    pub fn new(ttl: Duration) -> Result<Self, AuthError> {
        Self::with_capacity(ttl, DEFAULT_CACHE_CAPACITY)
    }

    /// Creates a cache holding at most `max_capacity` keys.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if `ttl` is zero or exceeds
    /// [`MAX_PUBLIC_KEY_CACHE_TTL`], or if `max_capacity` is zero.
    pub fn with_capacity(ttl: Duration, max_capacity: u64) -> Result<Self, AuthError> {
        if ttl.is_zero() || ttl > MAX_PUBLIC_KEY_CACHE_TTL {
            return Err(AuthError::config(format!(
                "public key cache TTL must be greater than zero and at most {}s",
                MAX_PUBLIC_KEY_CACHE_TTL.as_secs()
            )));
        }
        if max_capacity == 0 {
            return Err(AuthError::config("public key cache capacity must be at least 1"));
        }

        Ok(Self {
            cache: Cache::builder().time_to_live(ttl).max_capacity(max_capacity).build(),
            ttl,
            generation: AtomicU64::new(0),
        })
    }

    /// Returns the entry TTL.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached verifier for `kid`, or runs `load` and caches its
    /// result.
    ///
    /// # Errors
    ///
    /// Returns whatever `load` returns. Errors are not cached.
    #[tracing::instrument(skip(self, load))]
    pub async fn get_or_load<F, Fut>(
        &self,
        kid: &str,
        load: F,
    ) -> Result<Arc<PolicyVerifier>, AuthError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<PolicyVerifier, AuthError>>,
    {
        if let Some(verifier) = self.cache.get(kid).await {
            tracing::debug!(cache = "public_key", "cache hit");
            return Ok(verifier);
        }
        tracing::debug!(cache = "public_key", "cache miss");

        let generation_before = self.generation.load(Ordering::Acquire);
        let verifier = Arc::new(load().await?);
        self.publish(kid, &verifier, generation_before).await;
        Ok(verifier)
    }

    /// Caches `verifier` unless the cache was invalidated since
    /// `generation_before` was read. Returns `true` if the entry was kept.
    async fn publish(
        &self,
        kid: &str,
        verifier: &Arc<PolicyVerifier>,
        generation_before: u64,
    ) -> bool {
        if self.generation.load(Ordering::Acquire) != generation_before {
            tracing::debug!(kid, "discarding loaded key: cache invalidated during load");
            return false;
        }

        self.cache.insert(kid.to_owned(), Arc::clone(verifier)).await;

        // An invalidation between the check and the insert must still win.
        if self.generation.load(Ordering::Acquire) != generation_before {
            self.cache.invalidate(kid).await;
            tracing::debug!(kid, "discarding loaded key: cache invalidated during insert");
            return false;
        }
        true
    }

    /// Removes `kid` from the cache.
    ///
    /// The next authorization using `kid` reads the key store again.
    #[tracing::instrument(skip(self))]
    pub async fn invalidate(&self, kid: &str) {
        self.generation.fetch_add(1, Ordering::Release);
        self.cache.invalidate(kid).await;
        tracing::info!(kid, "public key invalidated");
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::Release);
        self.cache.invalidate_all();
        tracing::info!("public key cache cleared");
    }

    /// Returns `true` if `kid` is currently cached.
    pub async fn contains(&self, kid: &str) -> bool {
        self.cache.get(kid).await.is_some()
    }

    /// Approximate number of cached keys.
    ///
    /// Pending maintenance is run first so recent inserts and removals are
    /// reflected.
    pub async fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}

impl std::fmt::Debug for PublicKeyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublicKeyCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.cache.entry_count())
            .finish_non_exhaustive()
    }
}
