//! Cookie issuance.
//!
//! [`CookieIssuer`] turns a resource pattern and a validity window into a
//! [`SignedCookieSet`]:
//!
//! ```text
//! (pattern, ttl, key_id)
//!   → Policy { pattern, now + ttl }
//!   → canonical policy bytes
//!   → private key from the key store (with timeout)
//!   → signature over the bytes
//!   → (encode(bytes), encode(signature), key_id)
//! ```
//!
//! The private key is fetched per call and dropped before the call returns.
//! Failures are returned to the caller; nothing is retried.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use cookiegate_keys::{KeyStore, TimeoutKeyStore};
use fail::fail_point;

use crate::{
    codec,
    config::CookieConfig,
    cookie::{IssuanceResponse, SignedCookieSet},
    error::{AuthError, Result},
    policy::Policy,
    signer::PolicySigner,
    validation::validate_key_id,
};

/// Issues signed cookie sets.
///
/// Stateless apart from its configuration and the injected key store, so a
/// single instance can serve concurrent requests.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use cookiegate_authn::{CookieConfig, CookieIssuer};
/// use cookiegate_keys::KeyStore;
///
/// # async fn example(store: Arc<dyn KeyStore>) -> Result<(), cookiegate_authn::AuthError> {
/// let config = CookieConfig::builder()
///     .domain("d111.cloudfront.net")
///     .resource_pattern("https://d111.cloudfront.net/*")
///     .key_id("K2JCJMDEHXQW5F")
///     .build()?;
/// let issuer = CookieIssuer::new(store, config)?;
///
/// let cookies = issuer.issue_default().await?;
/// for header in issuer.set_cookie_headers(&cookies) {
///     println!("Set-Cookie: {header}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct CookieIssuer {
    store: TimeoutKeyStore<Arc<dyn KeyStore>>,
    config: CookieConfig,
}

impl CookieIssuer {
    /// Creates an issuer reading private keys from `store`.
    ///
    /// Every key store read is bounded by the configured
    /// `key_fetch_timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if `config` fails validation.
    pub fn new(store: Arc<dyn KeyStore>, config: CookieConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store: TimeoutKeyStore::new(store, config.key_fetch_timeout()), config })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &CookieConfig {
        &self.config
    }

    /// Issues a cookie set for the configured resource pattern, TTL and key.
    ///
    /// # Errors
    ///
    /// See [`issue`](Self::issue).
    pub async fn issue_default(&self) -> Result<SignedCookieSet> {
        self.issue(self.config.resource_pattern(), self.config.ttl(), self.config.key_id()).await
    }

    /// Issues a cookie set granting `resource_pattern` for `ttl`, signed with
    /// the key `key_id`.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidKeyId`] if `key_id` is malformed
    /// - [`AuthError::InvalidPolicy`] if the pattern is empty or `ttl` is under a second
    /// - [`AuthError::KeyUnavailable`] if the key store has no such key, fails, or times out
    /// - [`AuthError::AlgorithmMismatch`] if the key is not for the configured algorithm
    /// - [`AuthError::InvalidKey`] if the key material does not parse
    /// - [`AuthError::Signing`] if signing fails
    pub async fn issue(
        &self,
        resource_pattern: &str,
        ttl: Duration,
        key_id: &str,
    ) -> Result<SignedCookieSet> {
        self.issue_at(resource_pattern, ttl, key_id, Utc::now().timestamp()).await
    }

    /// Same as [`issue`](Self::issue) with an explicit current time in Unix
    /// seconds.
    ///
    /// # Errors
    ///
    /// See [`issue`](Self::issue).
    #[tracing::instrument(skip(self), fields(algorithm = %self.config.algorithm()))]
    pub async fn issue_at(
        &self,
        resource_pattern: &str,
        ttl: Duration,
        key_id: &str,
        now: i64,
    ) -> Result<SignedCookieSet> {
        validate_key_id(key_id)?;

        let mut policy = Policy::with_ttl(resource_pattern, ttl, now)?;
        if let Some(principal) = self.config.principal() {
            policy = policy.with_principal(principal)?;
        }
        let policy_bytes = policy.serialize()?;

        let signature = {
            let material = match self.store.get_private_key(key_id).await {
                Ok(Some(material)) => material,
                Ok(None) => {
                    tracing::warn!(kid = key_id, "private key not found");
                    return Err(AuthError::key_not_found(key_id));
                },
                Err(error) => {
                    tracing::warn!(kid = key_id, error = %error, "private key lookup failed");
                    return Err(AuthError::key_unavailable(key_id, error));
                },
            };
            let signer = PolicySigner::from_material(&material, self.config.algorithm())?;

            fail_point!("issuer-before-sign", |_| {
                Err(AuthError::signing("injected failure before signing"))
            });

            signer.sign(&policy_bytes)?
        };

        tracing::debug!(
            kid = key_id,
            expires_at = policy.expires_at(),
            "issued signed cookie set"
        );

        Ok(SignedCookieSet {
            policy_token: codec::encode(&policy_bytes),
            signature: codec::encode(&signature),
            key_id: key_id.to_owned(),
        })
    }

    /// Renders the `Set-Cookie` header values for `cookies` using the
    /// configured names and attributes.
    #[must_use]
    pub fn set_cookie_headers(&self, cookies: &SignedCookieSet) -> [String; 3] {
        cookies.set_cookie_headers(self.config.cookie_names(), &self.config.cookie_attributes())
    }

    /// Issues the default cookie set and wraps it in an HTTP response.
    ///
    /// Failures become a 500 response with no detail; the cause is logged.
    pub async fn issue_response(&self) -> IssuanceResponse {
        let cors_origin = self.config.cors_origin();
        match self.issue_default().await {
            Ok(cookies) => IssuanceResponse::success(self.set_cookie_headers(&cookies), cors_origin),
            Err(error) => {
                tracing::error!(error = %error, "cookie issuance failed");
                IssuanceResponse::internal_error(cors_origin)
            },
        }
    }
}

impl std::fmt::Debug for CookieIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieIssuer").field("config", &self.config).finish_non_exhaustive()
    }
}
