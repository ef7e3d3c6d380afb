//! Cookie verification and authorization.
//!
//! [`CookieAuthorizer`] runs once per inbound request or connection at the
//! trust boundary and always produces an [`AuthorizationDecision`]:
//!
//! ```text
//! cookies present?            no → deny(MissingCredential)
//! token + signature decode?   no → deny(MalformedCredential)
//! policy parses?              no → deny(MalformedCredential)
//! public key available?       no → deny(KeyLookupFailed)
//! signature over exact bytes? no → deny(InvalidSignature)
//! tokens canonically encoded? no → deny(InvalidSignature)
//! expires_at > now?           no → deny(Expired)
//! policy covers resource?     no → deny(ResourceMismatch)
//!                                  allow(principal)
//! ```
//!
//! The signature is checked against the decoded policy bytes, never against
//! a re-serialization. Every error collapses to a denial; nothing is retried,
//! and the reason is logged but never returned to the client.

use std::sync::Arc;

use chrono::Utc;
use cookiegate_keys::{KeyStore, TimeoutKeyStore};
use fail::fail_point;

use crate::{
    codec,
    config::CookieConfig,
    cookie::PresentedCookies,
    decision::{AuthorizationDecision, DenialReason},
    error::{AuthError, Result},
    key_cache::PublicKeyCache,
    policy::Policy,
    signer::PolicyVerifier,
    validation::validate_key_id,
};

/// Verifies presented cookies and decides whether to admit a request.
///
/// Each call is independent: identical cookies, resource and clock always
/// produce the identical decision.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use cookiegate_authn::{CookieAuthorizer, CookieConfig};
/// use cookiegate_keys::KeyStore;
///
/// # async fn example(store: Arc<dyn KeyStore>, config: CookieConfig, cookie_header: Option<&str>)
/// # -> Result<(), cookiegate_authn::AuthError> {
/// let authorizer = CookieAuthorizer::new(store, config)?;
///
/// let decision = authorizer.authorize_header(cookie_header, "/api/chat").await;
/// if let Some(principal) = decision.principal_id() {
///     println!("forwarding request for {principal}");
/// } else {
///     println!("{} {}", decision.http_status(), decision.client_message().unwrap_or_default());
/// }
/// # Ok(())
/// # }
/// ```
pub struct CookieAuthorizer {
    store: TimeoutKeyStore<Arc<dyn KeyStore>>,
    cache: Option<PublicKeyCache>,
    config: CookieConfig,
}

impl CookieAuthorizer {
    /// Creates an authorizer reading public keys from `store`.
    ///
    /// Key store reads are bounded by the configured `key_fetch_timeout`.
    /// Parsed keys are cached for `public_key_cache_ttl` unless it is unset.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if `config` fails validation.
    pub fn new(store: Arc<dyn KeyStore>, config: CookieConfig) -> Result<Self> {
        config.validate()?;
        let cache = config.public_key_cache_ttl().map(PublicKeyCache::new).transpose()?;
        Ok(Self { store: TimeoutKeyStore::new(store, config.key_fetch_timeout()), cache, config })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &CookieConfig {
        &self.config
    }

    /// Returns the public key cache, if enabled.
    #[must_use]
    pub fn key_cache(&self) -> Option<&PublicKeyCache> {
        self.cache.as_ref()
    }

    /// Authorizes a request carrying `cookie_header` for `required_resource`.
    ///
    /// A missing header is the same as a header without credential cookies.
    /// A header carrying conflicting duplicates of a credential cookie is
    /// denied as malformed.
    pub async fn authorize_header(
        &self,
        cookie_header: Option<&str>,
        required_resource: &str,
    ) -> AuthorizationDecision {
        let names = self.config.cookie_names();
        match PresentedCookies::from_cookie_header(cookie_header.unwrap_or_default(), names) {
            Ok(cookies) => self.authorize(&cookies, required_resource).await,
            Err(error) => {
                tracing::warn!(
                    reason = %DenialReason::MalformedCredential,
                    error = %error,
                    "authorization denied"
                );
                AuthorizationDecision::deny(DenialReason::MalformedCredential)
            },
        }
    }

    /// Authorizes `cookies` for `required_resource` at the current time.
    pub async fn authorize(
        &self,
        cookies: &PresentedCookies,
        required_resource: &str,
    ) -> AuthorizationDecision {
        self.authorize_at(cookies, required_resource, Utc::now().timestamp()).await
    }

    /// Authorizes `cookies` for `required_resource` at `now` (Unix seconds).
    #[tracing::instrument(skip(self, cookies), fields(kid = cookies.key_id.as_deref()))]
    pub async fn authorize_at(
        &self,
        cookies: &PresentedCookies,
        required_resource: &str,
        now: i64,
    ) -> AuthorizationDecision {
        match self.evaluate(cookies, required_resource, now).await {
            Ok(principal_id) => {
                tracing::debug!(principal_id = %principal_id, "authorization allowed");
                AuthorizationDecision::allow(principal_id)
            },
            Err(reason) => {
                tracing::warn!(reason = %reason, "authorization denied");
                AuthorizationDecision::deny(reason)
            },
        }
    }

    async fn evaluate(
        &self,
        cookies: &PresentedCookies,
        required_resource: &str,
        now: i64,
    ) -> std::result::Result<String, DenialReason> {
        let (Some(policy_token), Some(signature), Some(key_id)) =
            (&cookies.policy_token, &cookies.signature, &cookies.key_id)
        else {
            return Err(DenialReason::MissingCredential);
        };

        let policy_bytes = codec::decode(policy_token).map_err(|e| rejected(&e))?;
        let signature_bytes = codec::decode(signature).map_err(|e| rejected(&e))?;
        let policy = Policy::deserialize(&policy_bytes).map_err(|e| rejected(&e))?;
        validate_key_id(key_id).map_err(|e| rejected(&e))?;

        let verifier = self.verifier(key_id).await.map_err(|e| rejected(&e))?;
        verifier.verify(&policy_bytes, &signature_bytes).map_err(|e| rejected(&e))?;

        // The signature vouches for the issued tokens, not for other spellings
        // of the same bytes.
        if !codec::is_canonical(signature, &signature_bytes)
            || !codec::is_canonical(policy_token, &policy_bytes)
        {
            tracing::debug!("token is not in canonical encoding");
            return Err(DenialReason::InvalidSignature);
        }

        if policy.is_expired_at(now) {
            tracing::debug!(expires_at = policy.expires_at(), now, "policy expired");
            return Err(DenialReason::Expired);
        }

        if !policy.covers(required_resource) {
            tracing::debug!(
                resource_pattern = policy.resource_pattern(),
                required_resource,
                "policy does not cover resource"
            );
            return Err(DenialReason::ResourceMismatch);
        }

        Ok(policy.principal().unwrap_or(key_id.as_str()).to_owned())
    }

    async fn verifier(&self, kid: &str) -> Result<Arc<PolicyVerifier>> {
        match &self.cache {
            Some(cache) => cache.get_or_load(kid, || self.load_verifier(kid)).await,
            None => self.load_verifier(kid).await.map(Arc::new),
        }
    }

    async fn load_verifier(&self, kid: &str) -> Result<PolicyVerifier> {
        fail_point!("authorizer-before-key-lookup", |_| {
            Err(AuthError::key_unavailable(
                kid,
                cookiegate_keys::KeyStoreError::internal("injected failure before key lookup"),
            ))
        });

        let material = match self.store.get_public_key(kid).await {
            Ok(Some(material)) => material,
            Ok(None) => return Err(AuthError::key_not_found(kid)),
            Err(error) => return Err(AuthError::key_unavailable(kid, error)),
        };
        PolicyVerifier::from_material(&material, self.config.algorithm())
    }
}

impl std::fmt::Debug for CookieAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieAuthorizer")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

/// Maps an error to its denial reason, logging internal faults loudly.
fn rejected(error: &AuthError) -> DenialReason {
    let reason = error.denial_reason();
    if reason == DenialReason::InternalError {
        tracing::error!(error = %error, "internal fault during authorization");
    } else {
        tracing::debug!(error = %error, reason = %reason, "credential rejected");
    }
    reason
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use std::time::Duration;

    use cookiegate_keys::{MemoryKeyStore, SigningAlgorithm, Zeroizing};
    use rstest::rstest;

    use super::*;
    use crate::{
        assert_denied,
        cookie::{CookieNames, SignedCookieSet},
        issuer::CookieIssuer,
        testutil::{
            FailingKeyStore, StoreFailure, TestKeyPair, change_char, ed25519_key_pair,
            memory_store, rsa_alternate_key_pair, rsa_key_pair,
        },
    };

    const NOW: i64 = 1_700_000_000;
    const TTL: Duration = Duration::from_secs(3_600);

    fn config(algorithm: SigningAlgorithm) -> CookieConfig {
        CookieConfig::builder()
            .domain("d111.cloudfront.net")
            .resource_pattern("/api/*")
            .key_id("kid-1")
            .algorithm(algorithm)
            .build()
            .unwrap()
    }

    struct Fixture {
        issuer: CookieIssuer,
        authorizer: CookieAuthorizer,
        store: Arc<MemoryKeyStore>,
    }

    fn fixture(pair: &TestKeyPair) -> Fixture {
        let algorithm = pair.public.algorithm;
        let store = memory_store(&[pair]);
        Fixture {
            issuer: CookieIssuer::new(store.clone(), config(algorithm)).unwrap(),
            authorizer: CookieAuthorizer::new(store.clone(), config(algorithm)).unwrap(),
            store,
        }
    }

    async fn issue(fixture: &Fixture) -> SignedCookieSet {
        fixture.issuer.issue_at("/api/*", TTL, "kid-1", NOW).await.unwrap()
    }

    #[rstest]
    #[case(ed25519_key_pair("kid-1"))]
    #[case(rsa_key_pair("kid-1"))]
    #[tokio::test]
    async fn test_fresh_cookie_is_allowed(#[case] pair: TestKeyPair) {
        let fixture = fixture(&pair);
        let cookies = issue(&fixture).await.into();

        let decision = fixture.authorizer.authorize_at(&cookies, "/api/chat", NOW).await;
        assert_eq!(decision, AuthorizationDecision::allow("kid-1"));
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let fixture = fixture(&ed25519_key_pair("kid-1"));
        let full: PresentedCookies = issue(&fixture).await.into();

        let cases = [
            PresentedCookies::default(),
            PresentedCookies { policy_token: None, ..full.clone() },
            PresentedCookies { signature: None, ..full.clone() },
            PresentedCookies { key_id: None, ..full.clone() },
        ];
        for cookies in cases {
            let decision = fixture.authorizer.authorize_at(&cookies, "/api/chat", NOW).await;
            assert_denied!(decision, MissingCredential);
        }
    }

    #[rstest]
    #[case::policy_bad_length(|c: &mut PresentedCookies| c.policy_token = Some("abc".into()))]
    #[case::policy_bad_alphabet(|c: &mut PresentedCookies| c.policy_token = Some("ab+/".into()))]
    #[case::signature_bad_alphabet(|c: &mut PresentedCookies| c.signature = Some("a b=".into()))]
    #[case::policy_not_json(|c: &mut PresentedCookies| c.policy_token = Some(codec::encode(b"nope")))]
    #[case::policy_wrong_shape(
        |c: &mut PresentedCookies| c.policy_token = Some(codec::encode(br#"{"Statement":[]}"#))
    )]
    #[case::key_id_injection(|c: &mut PresentedCookies| c.key_id = Some("../kid-1".into()))]
    #[tokio::test]
    async fn test_malformed_credentials(#[case] tamper: fn(&mut PresentedCookies)) {
        let fixture = fixture(&ed25519_key_pair("kid-1"));
        let mut cookies: PresentedCookies = issue(&fixture).await.into();
        tamper(&mut cookies);

        let decision = fixture.authorizer.authorize_at(&cookies, "/api/chat", NOW).await;
        assert_denied!(decision, MalformedCredential);
    }

    #[tokio::test]
    async fn test_unknown_key_is_key_lookup_failure() {
        let fixture = fixture(&ed25519_key_pair("kid-1"));
        let mut cookies: PresentedCookies = issue(&fixture).await.into();
        cookies.key_id = Some("kid-2".into());

        let decision = fixture.authorizer.authorize_at(&cookies, "/api/chat", NOW).await;
        assert_denied!(decision, KeyLookupFailed);
    }

    #[rstest]
    #[case(StoreFailure::Connection)]
    #[case(StoreFailure::Internal)]
    #[case(StoreFailure::Timeout)]
    #[tokio::test]
    async fn test_store_failure_fails_closed(#[case] failure: StoreFailure) {
        let issuing = fixture(&ed25519_key_pair("kid-1"));
        let cookies = issue(&issuing).await.into();

        let authorizer = CookieAuthorizer::new(
            Arc::new(FailingKeyStore::new(failure)),
            config(SigningAlgorithm::Ed25519),
        )
        .unwrap();
        let decision = authorizer.authorize_at(&cookies, "/api/chat", NOW).await;
        assert_denied!(decision, KeyLookupFailed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_store_times_out_to_denial() {
        let issuing = fixture(&ed25519_key_pair("kid-1"));
        let cookies = issue(&issuing).await.into();

        let config = CookieConfig::builder()
            .domain("d111.cloudfront.net")
            .resource_pattern("/api/*")
            .key_id("kid-1")
            .key_fetch_timeout(Duration::from_millis(250))
            .build()
            .unwrap();
        let authorizer =
            CookieAuthorizer::new(Arc::new(FailingKeyStore::new(StoreFailure::Hang)), config)
                .unwrap();

        let decision = authorizer.authorize_at(&cookies, "/api/chat", NOW).await;
        assert_denied!(decision, KeyLookupFailed);
    }

    #[tokio::test]
    async fn test_algorithm_mismatch_is_key_lookup_failure() {
        // Public key registered as RSA while the deployment expects Ed25519.
        let rsa = rsa_key_pair("kid-1");
        let ed = ed25519_key_pair("kid-1");
        let store = MemoryKeyStore::new();
        store.insert_pair(ed.private.clone(), rsa.public.clone());
        let store = Arc::new(store);

        let issuer = CookieIssuer::new(store.clone(), config(SigningAlgorithm::Ed25519)).unwrap();
        let authorizer = CookieAuthorizer::new(store, config(SigningAlgorithm::Ed25519)).unwrap();
        let cookies = issuer.issue_at("/api/*", TTL, "kid-1", NOW).await.unwrap().into();

        let decision = authorizer.authorize_at(&cookies, "/api/chat", NOW).await;
        assert_denied!(decision, KeyLookupFailed);
    }

    #[tokio::test]
    async fn test_unparseable_public_key_is_internal_error() {
        let pair = ed25519_key_pair("kid-1");
        let fixture = fixture(&pair);
        let cookies = issue(&fixture).await.into();

        let mut broken = pair.public.clone();
        broken.pem =
            Zeroizing::new("-----BEGIN PUBLIC KEY-----\nAAAA\n-----END PUBLIC KEY-----".into());
        fixture.store.insert_public(broken);

        let decision = fixture.authorizer.authorize_at(&cookies, "/api/chat", NOW).await;
        assert_denied!(decision, InternalError);
    }

    #[rstest]
    #[case(ed25519_key_pair("kid-1"))]
    #[case(rsa_key_pair("kid-1"))]
    #[tokio::test]
    async fn test_changed_signature_character(#[case] pair: TestKeyPair) {
        let fixture = fixture(&pair);
        let mut cookies: PresentedCookies = issue(&fixture).await.into();
        let signature = cookies.signature.take().unwrap();
        cookies.signature = Some(change_char(&signature, 0));

        let decision = fixture.authorizer.authorize_at(&cookies, "/api/chat", NOW).await;
        assert_denied!(decision, InvalidSignature);
    }

    #[rstest]
    #[case(ed25519_key_pair("kid-1"))]
    #[case(rsa_key_pair("kid-1"))]
    #[tokio::test]
    async fn test_every_signature_position_is_bound(#[case] pair: TestKeyPair) {
        let fixture = fixture(&pair);
        let issued: PresentedCookies = issue(&fixture).await.into();
        let signature = issued.signature.clone().unwrap();

        for (index, original) in signature.char_indices().filter(|(_, c)| *c != '_') {
            for replacement in ['A', 'B', 'C'].into_iter().filter(|c| *c != original) {
                let mut tampered = signature.clone();
                tampered.replace_range(index..=index, &replacement.to_string());
                let cookies = PresentedCookies { signature: Some(tampered), ..issued.clone() };

                let decision = fixture.authorizer.authorize_at(&cookies, "/api/chat", NOW).await;
                assert_eq!(
                    decision,
                    AuthorizationDecision::deny(DenialReason::InvalidSignature),
                    "position {index}: {original:?} -> {replacement:?}"
                );
            }
        }
    }

    #[tokio::test]
    async fn test_non_canonical_policy_token_is_rejected() {
        let fixture = fixture(&ed25519_key_pair("kid-1"));

        // One of three consecutive policy lengths leaves spare bits in the
        // final quantum.
        let mut issued = None;
        for pattern in ["/api/*", "/api/c*", "/api/ch*"] {
            let cookies = fixture.issuer.issue_at(pattern, TTL, "kid-1", NOW).await.unwrap();
            if codec::decode(&cookies.policy_token).unwrap().len() % 3 != 0 {
                issued = Some(cookies);
                break;
            }
        }
        let mut cookies: PresentedCookies = issued.unwrap().into();
        let policy_token = cookies.policy_token.take().unwrap();
        let bytes = codec::decode(&policy_token).unwrap();

        // Flip the lowest bit of the last data character; the bytes stay the same.
        const ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-~";
        let last = policy_token.trim_end_matches('_').len() - 1;
        let value = ALPHABET.find(&policy_token[last..=last]).unwrap();
        assert_eq!(value % 2, 0, "canonical trailing bits are zero");
        let mut loose = policy_token.clone();
        loose.replace_range(last..=last, &ALPHABET[value + 1..=value + 1]);
        assert_eq!(codec::decode(&loose).unwrap(), bytes);
        cookies.policy_token = Some(loose);

        let decision = fixture.authorizer.authorize_at(&cookies, "/api/chat", NOW).await;
        assert_denied!(decision, InvalidSignature);
    }

    #[tokio::test]
    async fn test_signature_from_other_key() {
        let legit = fixture(&rsa_key_pair("kid-1"));
        let impostor = fixture(&rsa_alternate_key_pair("kid-1"));
        let cookies = issue(&legit).await;

        let forged = impostor.issuer.issue_at("/*", TTL, "kid-1", NOW).await.unwrap();
        let cookies = PresentedCookies {
            policy_token: Some(forged.policy_token),
            signature: Some(forged.signature),
            key_id: Some(cookies.key_id),
        };

        let decision = legit.authorizer.authorize_at(&cookies, "/admin/users", NOW).await;
        assert_denied!(decision, InvalidSignature);
    }

    #[tokio::test]
    async fn test_rewritten_policy_is_rejected() {
        let fixture = fixture(&ed25519_key_pair("kid-1"));
        let mut cookies: PresentedCookies = issue(&fixture).await.into();

        // Widen the scope and extend the expiry without re-signing.
        let widened = Policy::new("/*", NOW + 86_400, NOW).unwrap().serialize().unwrap();
        cookies.policy_token = Some(codec::encode(&widened));

        let decision = fixture.authorizer.authorize_at(&cookies, "/admin/users", NOW).await;
        assert_denied!(decision, InvalidSignature);
    }

    #[rstest]
    #[case::one_second_before(NOW + 3_599, true)]
    #[case::at_expiry(NOW + 3_600, false)]
    #[case::one_second_after(NOW + 3_601, false)]
    #[tokio::test]
    async fn test_expiry_boundary(#[case] now: i64, #[case] allowed: bool) {
        let fixture = fixture(&ed25519_key_pair("kid-1"));
        let cookies = issue(&fixture).await.into();

        let decision = fixture.authorizer.authorize_at(&cookies, "/api/chat", now).await;
        if allowed {
            assert!(decision.is_allowed(), "got {decision:?}");
        } else {
            assert_denied!(decision, Expired);
        }
    }

    #[tokio::test]
    async fn test_expiry_is_checked_after_signature() {
        // A forged cookie is reported as forged even when it is also expired.
        let fixture = fixture(&ed25519_key_pair("kid-1"));
        let mut cookies: PresentedCookies = issue(&fixture).await.into();
        cookies.signature = Some(change_char(cookies.signature.as_deref().unwrap(), 0));

        let decision = fixture.authorizer.authorize_at(&cookies, "/api/chat", NOW + 7_200).await;
        assert_denied!(decision, InvalidSignature);
    }

    #[rstest]
    #[case::other_prefix("/admin/*")]
    #[case::other_path("/admin/users")]
    #[case::wider("/*")]
    #[case::bare_prefix("/api")]
    #[tokio::test]
    async fn test_resource_mismatch(#[case] required: &str) {
        let fixture = fixture(&ed25519_key_pair("kid-1"));
        let cookies = issue(&fixture).await.into();

        let decision = fixture.authorizer.authorize_at(&cookies, required, NOW).await;
        assert_denied!(decision, ResourceMismatch);
    }

    #[tokio::test]
    async fn test_principal_bound_in_policy() {
        let pair = ed25519_key_pair("WEBSOCKET-AUTH");
        let store = memory_store(&[&pair]);
        let config = CookieConfig::builder()
            .domain("agent.example.com")
            .resource_pattern("wss://agent.example.com/dev*")
            .key_id("WEBSOCKET-AUTH")
            .cookie_names(CookieNames::websocket())
            .principal("user-42")
            .build()
            .unwrap();
        let issuer = CookieIssuer::new(store.clone(), config.clone()).unwrap();
        let authorizer = CookieAuthorizer::new(store, config).unwrap();

        let cookies = issuer.issue_default().await.unwrap();
        let header = issuer
            .set_cookie_headers(&cookies)
            .iter()
            .map(|h| h.split(';').next().unwrap().to_owned())
            .collect::<Vec<_>>()
            .join("; ");

        let decision =
            authorizer.authorize_header(Some(&header), "wss://agent.example.com/dev").await;
        assert_eq!(decision.principal_id(), Some("user-42"));
    }

    #[tokio::test]
    async fn test_authorize_header() {
        let fixture = fixture(&ed25519_key_pair("kid-1"));
        let cookies = fixture.issuer.issue("/api/*", TTL, "kid-1").await.unwrap();
        let header = format!(
            "session=xyz; CloudFront-Policy={}; CloudFront-Signature={}; CloudFront-Key-Pair-Id={}",
            cookies.policy_token, cookies.signature, cookies.key_id
        );

        let decision = fixture.authorizer.authorize_header(Some(&header), "/api/chat").await;
        assert!(decision.is_allowed(), "got {decision:?}");

        let decision = fixture.authorizer.authorize_header(None, "/api/chat").await;
        assert_denied!(decision, MissingCredential);

        let duplicated = format!("{header}; CloudFront-Key-Pair-Id=kid-2");
        let decision = fixture.authorizer.authorize_header(Some(&duplicated), "/api/chat").await;
        assert_denied!(decision, MalformedCredential);
    }

    #[tokio::test]
    async fn test_decisions_are_idempotent() {
        let fixture = fixture(&ed25519_key_pair("kid-1"));
        let cookies = issue(&fixture).await.into();

        for (resource, now) in [("/api/chat", NOW), ("/admin", NOW), ("/api/chat", NOW + 3_600)] {
            let first = fixture.authorizer.authorize_at(&cookies, resource, now).await;
            let second = fixture.authorizer.authorize_at(&cookies, resource, now).await;
            assert_eq!(first, second);
        }
    }

    #[tokio::test]
    async fn test_cached_key_survives_store_removal_until_invalidated() {
        let fixture = fixture(&ed25519_key_pair("kid-1"));
        let cookies = issue(&fixture).await.into();
        let authorizer = &fixture.authorizer;

        assert!(authorizer.authorize_at(&cookies, "/api/chat", NOW).await.is_allowed());
        assert!(fixture.store.remove("kid-1"));
        assert!(authorizer.authorize_at(&cookies, "/api/chat", NOW).await.is_allowed());

        authorizer.key_cache().unwrap().invalidate("kid-1").await;
        let decision = authorizer.authorize_at(&cookies, "/api/chat", NOW).await;
        assert_denied!(decision, KeyLookupFailed);
    }

    #[tokio::test]
    async fn test_uncached_authorizer_reads_store_every_time() {
        let pair = ed25519_key_pair("kid-1");
        let store = memory_store(&[&pair]);
        let mut config = config(SigningAlgorithm::Ed25519);
        config.public_key_cache_ttl = None;
        let issuer = CookieIssuer::new(store.clone(), config.clone()).unwrap();
        let authorizer = CookieAuthorizer::new(store.clone(), config).unwrap();
        assert!(authorizer.key_cache().is_none());

        let cookies = issuer.issue_at("/api/*", TTL, "kid-1", NOW).await.unwrap().into();
        assert!(authorizer.authorize_at(&cookies, "/api/chat", NOW).await.is_allowed());

        store.remove("kid-1");
        let decision = authorizer.authorize_at(&cookies, "/api/chat", NOW).await;
        assert_denied!(decision, KeyLookupFailed);
    }
}
