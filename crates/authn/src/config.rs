//! Issuer and authorizer configuration.
//!
//! One [`CookieConfig`] describes a deployment: which domain the cookies are
//! scoped to, what they grant, for how long, which key signs them and how
//! they are named. Issuer and authorizer for the same deployment share it.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use cookiegate_authn::{CookieConfig, CookieNames, SameSite, SigningAlgorithm};
//!
//! let config = CookieConfig::builder()
//!     .domain("agent.example.com")
//!     .resource_pattern("wss://agent.example.com/dev*")
//!     .key_id("WEBSOCKET-AUTH")
//!     .algorithm(SigningAlgorithm::RsaSha1)
//!     .same_site(SameSite::None)
//!     .cookie_names(CookieNames::websocket())
//!     .cors_origin("https://app.example.com")
//!     .build()?;
//!
//! assert_eq!(config.ttl(), Duration::from_secs(3600));
//! # Ok::<(), cookiegate_authn::AuthError>(())
//! ```
//!
//! Deserialized configuration is checked with [`CookieConfig::validate`];
//! the issuer and authorizer constructors call it as well.

use std::time::Duration;

use cookiegate_keys::SigningAlgorithm;
use serde::{Deserialize, Serialize};

use crate::{
    cookie::{CookieAttributes, CookieNames, SameSite},
    error::AuthError,
    validation::validate_key_id,
};

/// Default validity window of issued cookies (1 hour).
pub const DEFAULT_TTL: Duration = Duration::from_secs(3_600);

/// Default deadline for a single key store read (5 seconds).
pub const DEFAULT_KEY_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Default lifetime of cached public keys (5 minutes).
pub const DEFAULT_PUBLIC_KEY_CACHE_TTL: Duration = Duration::from_secs(300);

/// Upper bound on the public key cache lifetime (1 hour).
///
/// A key removed from the store keeps verifying cookies for at most this
/// long.
pub const MAX_PUBLIC_KEY_CACHE_TTL: Duration = Duration::from_secs(3_600);

/// Configuration shared by [`CookieIssuer`](crate::CookieIssuer) and
/// [`CookieAuthorizer`](crate::CookieAuthorizer).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct CookieConfig {
    /// `Domain` attribute of issued cookies.
    pub(crate) domain: String,

    /// Default resource scope of issued cookies.
    pub(crate) resource_pattern: String,

    /// Default validity window.
    #[serde(with = "humantime_serde", default = "default_ttl")]
    pub(crate) ttl: Duration,

    /// Default signing key.
    pub(crate) key_id: String,

    /// Signature scheme every key must use.
    #[serde(default)]
    pub(crate) algorithm: SigningAlgorithm,

    /// `SameSite` attribute of issued cookies.
    #[serde(default)]
    pub(crate) same_site: SameSite,

    /// Names of the three cookies.
    #[serde(default)]
    pub(crate) cookie_names: CookieNames,

    /// Identity bound into every issued policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) principal: Option<String>,

    /// Deadline for a single key store read.
    #[serde(with = "humantime_serde", default = "default_key_fetch_timeout")]
    pub(crate) key_fetch_timeout: Duration,

    /// Lifetime of cached public keys; `None` disables the cache.
    #[serde(with = "humantime_serde", default = "default_public_key_cache_ttl")]
    pub(crate) public_key_cache_ttl: Option<Duration>,

    /// Origin allowed to call the issuance endpoint with credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) cors_origin: Option<String>,
}

fn default_ttl() -> Duration {
    DEFAULT_TTL
}

fn default_key_fetch_timeout() -> Duration {
    DEFAULT_KEY_FETCH_TIMEOUT
}

fn default_public_key_cache_ttl() -> Option<Duration> {
    Some(DEFAULT_PUBLIC_KEY_CACHE_TTL)
}

#[bon::bon]
impl CookieConfig {
    /// Creates a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if any field fails [`validate`](Self::validate).
    #[builder]
    pub fn new(
        #[builder(into)] domain: String,
        #[builder(into)] resource_pattern: String,
        #[builder(default = DEFAULT_TTL)] ttl: Duration,
        #[builder(into)] key_id: String,
        #[builder(default)] algorithm: SigningAlgorithm,
        #[builder(default)] same_site: SameSite,
        #[builder(default)] cookie_names: CookieNames,
        #[builder(into)] principal: Option<String>,
        #[builder(default = DEFAULT_KEY_FETCH_TIMEOUT)] key_fetch_timeout: Duration,
        #[builder(default = DEFAULT_PUBLIC_KEY_CACHE_TTL)] public_key_cache_ttl: Duration,
        #[builder(default)] disable_public_key_cache: bool,
        #[builder(into)] cors_origin: Option<String>,
    ) -> Result<Self, AuthError> {
        let public_key_cache_ttl = (!disable_public_key_cache).then_some(public_key_cache_ttl);
        let config = Self {
            domain,
            resource_pattern,
            ttl,
            key_id,
            algorithm,
            same_site,
            cookie_names,
            principal,
            key_fetch_timeout,
            public_key_cache_ttl,
            cors_origin,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks every field.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if:
    /// - `domain` is empty or contains whitespace, `;` or `,`
    /// - `resource_pattern` is empty
    /// - `ttl` or `key_fetch_timeout` is zero, or `ttl` is under one second
    /// - `key_id` is not a valid key ID
    /// - cookie names are invalid or not distinct
    /// - `principal` or `cors_origin` is set but empty
    /// - `public_key_cache_ttl` is zero or exceeds [`MAX_PUBLIC_KEY_CACHE_TTL`]
    pub fn validate(&self) -> Result<(), AuthError> {
        let unsafe_char = |c: char| c.is_whitespace() || c.is_control() || c == ';' || c == ',';
        if self.domain.is_empty() || self.domain.chars().any(unsafe_char) {
            return Err(AuthError::config(format!("invalid cookie domain {:?}", self.domain)));
        }

        if self.resource_pattern.is_empty() {
            return Err(AuthError::config("resource_pattern cannot be empty"));
        }

        if self.ttl.as_secs() == 0 {
            return Err(AuthError::config("ttl must be at least one second"));
        }

        validate_key_id(&self.key_id)
            .map_err(|e| AuthError::config(format!("key_id rejected: {e}")))?;

        self.cookie_names.validate()?;

        if self.principal.as_deref().is_some_and(str::is_empty) {
            return Err(AuthError::config("principal cannot be empty"));
        }

        if self.key_fetch_timeout.is_zero() {
            return Err(AuthError::config("key_fetch_timeout must be greater than zero"));
        }

        if let Some(cache_ttl) = self.public_key_cache_ttl {
            if cache_ttl.is_zero() {
                return Err(AuthError::config("public_key_cache_ttl must be greater than zero"));
            }
            if cache_ttl > MAX_PUBLIC_KEY_CACHE_TTL {
                return Err(AuthError::config(format!(
                    "public_key_cache_ttl {}s exceeds the {}s maximum",
                    cache_ttl.as_secs(),
                    MAX_PUBLIC_KEY_CACHE_TTL.as_secs()
                )));
            }
        }

        if self.cors_origin.as_deref().is_some_and(str::is_empty) {
            return Err(AuthError::config("cors_origin cannot be empty"));
        }

        Ok(())
    }

    /// Returns the cookie domain.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns the default resource pattern.
    #[must_use]
    pub fn resource_pattern(&self) -> &str {
        &self.resource_pattern
    }

    /// Returns the default validity window.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the default key ID.
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Returns the signature scheme.
    #[must_use]
    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    /// Returns the cookie names.
    #[must_use]
    pub fn cookie_names(&self) -> &CookieNames {
        &self.cookie_names
    }

    /// Returns the principal bound into issued policies, if any.
    #[must_use]
    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    /// Returns the key store read deadline.
    #[must_use]
    pub fn key_fetch_timeout(&self) -> Duration {
        self.key_fetch_timeout
    }

    /// Returns the public key cache lifetime, `None` if caching is off.
    #[must_use]
    pub fn public_key_cache_ttl(&self) -> Option<Duration> {
        self.public_key_cache_ttl
    }

    /// Returns the CORS origin, if any.
    #[must_use]
    pub fn cors_origin(&self) -> Option<&str> {
        self.cors_origin.as_deref()
    }

    /// Returns the attributes set on every issued cookie.
    #[must_use]
    pub fn cookie_attributes(&self) -> CookieAttributes {
        CookieAttributes::new(self.domain.clone(), self.same_site)
    }
}
