//! # Cookiegate Authentication
//!
//! Signed-policy cookies for gating access to protected resources.
//!
//! This crate provides:
//! - **Policy codec**: canonical policy serialization and the cookie-safe
//!   token alphabet
//! - **Cookie issuer**: signs a scoped, time-limited policy and emits the
//!   three credential cookies
//! - **Cookie authorizer**: verifies presented cookies and produces an
//!   allow or deny decision, failing closed on every error
//!
//! ## Security
//!
//! - Only asymmetric algorithms (Ed25519, RSA-SHA1) are supported; the
//!   deployment pins one and keys registered for another are refused
//! - Signatures are verified over the exact presented bytes
//! - Denial reasons are logged, never returned to the client
//!
//! ## Example
//!
//! ```no_run
//! use std::{sync::Arc, time::Duration};
//!
//! use cookiegate_authn::{CookieAuthorizer, CookieConfig, CookieIssuer, SigningAlgorithm};
//! use cookiegate_keys::MemoryKeyStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryKeyStore::new());
//! let config = CookieConfig::builder()
//!     .domain("d111.cloudfront.net")
//!     .resource_pattern("/api/*")
//!     .key_id("K2JCJMDEHXQW5F")
//!     .algorithm(SigningAlgorithm::RsaSha1)
//!     .ttl(Duration::from_secs(3600))
//!     .build()?;
//!
//! let issuer = CookieIssuer::new(store.clone(), config.clone())?;
//! let cookies = issuer.issue_default().await?;
//! for header in issuer.set_cookie_headers(&cookies) {
//!     println!("Set-Cookie: {header}");
//! }
//!
//! let authorizer = CookieAuthorizer::new(store, config)?;
//! let decision = authorizer.authorize(&cookies.into(), "/api/chat").await;
//! assert!(decision.is_allowed());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod authorizer;
pub mod codec;
/// Issuer and authorizer configuration.
pub mod config;
/// Cookie naming, rendering and parsing.
pub mod cookie;
/// Authorization decisions and the gateway authorizer response.
pub mod decision;
/// Authentication error types.
pub mod error;
/// Cookie issuance.
pub mod issuer;
pub mod key_cache;
/// The signed access policy.
pub mod policy;
pub mod resource;
/// Policy signing and verification.
pub mod signer;
#[cfg(any(test, feature = "testutil"))]
pub mod testutil;
/// Key ID and algorithm validation.
pub mod validation;

// Re-export key types for convenience
pub use authorizer::CookieAuthorizer;
pub use config::CookieConfig;
pub use cookie::{
    CookieAttributes, CookieNames, CookieProfile, IssuanceResponse, PresentedCookies, SameSite,
    SignedCookieSet,
};
pub use cookiegate_keys::SigningAlgorithm;
pub use decision::{
    AuthorizationDecision, DenialReason, GatewayAuthorizerResponse, GatewayEffect,
    GatewayPolicyDocument, GatewayStatement,
};
pub use error::{AuthError, Result};
pub use issuer::CookieIssuer;
pub use key_cache::PublicKeyCache;
pub use policy::Policy;
pub use signer::{PolicySigner, PolicyVerifier};
