//! Key material and key store abstraction for signed-cookie authorization.
//!
//! This crate provides the [`KeyStore`] trait through which the cookie
//! issuer fetches private keys and the cookie authorizer fetches public
//! keys, together with the key material types and a few implementations.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐                      ┌──────────────────┐
//! │  Cookie issuer   │  get_private_key()   │                  │
//! │                  │─────────────────────►│  Secret store    │
//! ├──────────────────┤                      │  (external)      │
//! │ Cookie authorizer│  get_public_key()    │                  │
//! │                  │─────────────────────►│                  │
//! └──────────────────┘                      └──────────────────┘
//! ```
//!
//! # Available Stores
//!
//! | Store | Use Case |
//! |-------|----------|
//! | [`MemoryKeyStore`] | Tests, development |
//! | [`StaticKeyStore`] | One key pair loaded from a secret value |
//! | [`TimeoutKeyStore`] | Bounds the latency of any other store |
//!
//! Production deployments implement [`KeyStore`] over their secret manager
//! client and wrap it in a [`TimeoutKeyStore`].

#![deny(unsafe_code)]

pub mod error;
pub mod material;
pub mod secret;
pub mod store;
pub mod timeout;

pub use error::{BoxError, KeyStoreError, KeyStoreResult};
pub use material::{PrivateKeyMaterial, PublicKeyMaterial, SigningAlgorithm};
pub use secret::{KeyPairSecret, StaticKeyStore};
pub use store::{KeyStore, MemoryKeyStore};
pub use timeout::TimeoutKeyStore;
pub use zeroize::Zeroizing;
