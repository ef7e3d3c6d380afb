//! Access policies and their canonical serialization.
//!
//! A [`Policy`] grants access to a resource pattern until an expiry instant.
//! It is serialized in the custom-policy shape CDN signed cookies use:
//!
//! ```json
//! {"Statement":[{"Resource":"/api/*","Condition":{"DateLessThan":{"AWS:EpochTime":1700003600}}}]}
//! ```
//!
//! When a principal is bound to the policy it follows the statement list as
//! a top-level `"Principal"` member.
//!
//! Serialization is deterministic (fixed member order, no whitespace), and
//! signatures are always computed over the serialized bytes. The authorizer
//! verifies the bytes it received and only then parses them; it never
//! re-serializes a decoded policy.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    error::{AuthError, Result},
    resource,
};

/// Resource scope plus expiry carried by a signed cookie.
///
/// Two policies are equal exactly when their serialized bytes are equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Policy {
    resource_pattern: String,
    expires_at: i64,
    principal: Option<String>,
}

impl Policy {
    /// Creates a policy expiring at `expires_at` (epoch seconds).
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidPolicy`] if the pattern is empty or
    /// `expires_at` is not strictly after `now`.
    pub fn new(resource_pattern: impl Into<String>, expires_at: i64, now: i64) -> Result<Self> {
        let resource_pattern = resource_pattern.into();
        if resource_pattern.is_empty() {
            return Err(AuthError::invalid_policy("resource pattern must not be empty"));
        }
        if expires_at <= now {
            return Err(AuthError::invalid_policy(format!(
                "expiry {expires_at} is not after the current time {now}"
            )));
        }
        Ok(Self { resource_pattern, expires_at, principal: None })
    }

    /// Creates a policy valid for `ttl` starting at `now` (epoch seconds).
    ///
    /// Sub-second precision is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidPolicy`] if the pattern is empty, `ttl` is
    /// shorter than one second, or the expiry overflows.
    pub fn with_ttl(resource_pattern: impl Into<String>, ttl: Duration, now: i64) -> Result<Self> {
        let expires_at = i64::try_from(ttl.as_secs())
            .ok()
            .and_then(|secs| now.checked_add(secs))
            .ok_or_else(|| AuthError::invalid_policy("ttl overflows the expiry timestamp"))?;
        Self::new(resource_pattern, expires_at, now)
    }

    /// Binds a principal identity to the policy.
    ///
    /// The principal is part of the signed bytes and is reported by the
    /// authorizer on success.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidPolicy`] if `principal` is empty.
    pub fn with_principal(mut self, principal: impl Into<String>) -> Result<Self> {
        let principal = principal.into();
        if principal.is_empty() {
            return Err(AuthError::invalid_policy("principal must not be empty"));
        }
        self.principal = Some(principal);
        Ok(self)
    }

    /// Resource pattern the policy grants access to.
    #[must_use]
    pub fn resource_pattern(&self) -> &str {
        &self.resource_pattern
    }

    /// Expiry instant in epoch seconds.
    #[must_use]
    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    /// Principal bound at issuance, if any.
    #[must_use]
    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    /// Returns `true` once `now` has reached the expiry instant.
    ///
    /// A policy expiring at `now` is already expired.
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at <= now
    }

    /// Returns `true` if `required` is within this policy's resource scope.
    ///
    /// See [`resource::covers`] for the matching rules.
    #[must_use]
    pub fn covers(&self, required: &str) -> bool {
        resource::covers(&self.resource_pattern, required)
    }

    /// Serializes the policy to its canonical byte form.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidPolicy`] if JSON serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let document = PolicyDocument {
            statement: vec![Statement {
                resource: self.resource_pattern.clone(),
                condition: Condition {
                    date_less_than: EpochTime { epoch_time: self.expires_at },
                },
            }],
            principal: self.principal.clone(),
        };
        serde_json::to_vec(&document)
            .map_err(|e| AuthError::invalid_policy(format!("failed to serialize policy: {e}")))
    }

    /// Parses canonical policy bytes.
    ///
    /// Expiry is not checked here; a past expiry still parses.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MalformedPolicy`] if:
    /// - the bytes are not a JSON policy document
    /// - a required member is missing or has the wrong type
    /// - the document has unknown members (for example unsupported conditions)
    /// - there is not exactly one statement
    /// - the resource pattern or principal is empty
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let document: PolicyDocument = serde_json::from_slice(bytes)
            .map_err(|e| AuthError::malformed_policy(format!("invalid policy document: {e}")))?;

        let [statement] = <[Statement; 1]>::try_from(document.statement).map_err(|statements| {
            AuthError::malformed_policy(format!(
                "expected exactly one statement, found {}",
                statements.len()
            ))
        })?;

        if statement.resource.is_empty() {
            return Err(AuthError::malformed_policy("Resource must not be empty"));
        }
        if document.principal.as_deref() == Some("") {
            return Err(AuthError::malformed_policy("Principal must not be empty"));
        }

        Ok(Self {
            resource_pattern: statement.resource,
            expires_at: statement.condition.date_less_than.epoch_time,
            principal: document.principal,
        })
    }
}

// Wire structs. Member order here is the canonical order.

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct PolicyDocument {
    #[serde(rename = "Statement")]
    statement: Vec<Statement>,
    #[serde(rename = "Principal", default, skip_serializing_if = "Option::is_none")]
    principal: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Statement {
    #[serde(rename = "Resource")]
    resource: String,
    #[serde(rename = "Condition")]
    condition: Condition,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Condition {
    #[serde(rename = "DateLessThan")]
    date_less_than: EpochTime,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct EpochTime {
    #[serde(rename = "AWS:EpochTime")]
    epoch_time: i64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::codec;

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_canonical_bytes() {
        let policy = Policy::with_ttl("/api/*", Duration::from_secs(3600), NOW).unwrap();
        let bytes = policy.serialize().unwrap();
        assert_eq!(
            std::str::from_utf8(&bytes).unwrap(),
            r#"{"Statement":[{"Resource":"/api/*","Condition":{"DateLessThan":{"AWS:EpochTime":1700003600}}}]}"#
        );
    }

    #[test]
    fn test_canonical_bytes_with_principal() {
        let policy = Policy::new("wss://agent.example.com/dev*", NOW + 60, NOW)
            .unwrap()
            .with_principal("WEBSOCKET-AUTH")
            .unwrap();
        let bytes = policy.serialize().unwrap();
        assert_eq!(
            std::str::from_utf8(&bytes).unwrap(),
            r#"{"Statement":[{"Resource":"wss://agent.example.com/dev*","Condition":{"DateLessThan":{"AWS:EpochTime":1700000060}}}],"Principal":"WEBSOCKET-AUTH"}"#
        );
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let a = Policy::new("/api/*", NOW + 1, NOW).unwrap();
        let b = Policy::new("/api/*".to_owned(), NOW + 1, NOW - 10).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.serialize().unwrap(), b.serialize().unwrap());
    }

    #[test]
    fn test_empty_pattern_rejected() {
        assert!(matches!(Policy::new("", NOW + 1, NOW), Err(AuthError::InvalidPolicy { .. })));
    }

    #[test]
    fn test_expiry_must_be_in_future() {
        assert!(matches!(Policy::new("/a", NOW, NOW), Err(AuthError::InvalidPolicy { .. })));
        assert!(matches!(Policy::new("/a", NOW - 1, NOW), Err(AuthError::InvalidPolicy { .. })));
        assert!(Policy::new("/a", NOW + 1, NOW).is_ok());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let result = Policy::with_ttl("/a", Duration::ZERO, NOW);
        assert!(matches!(result, Err(AuthError::InvalidPolicy { .. })));
        let result = Policy::with_ttl("/a", Duration::from_millis(999), NOW);
        assert!(matches!(result, Err(AuthError::InvalidPolicy { .. })));
    }

    #[test]
    fn test_ttl_overflow_rejected() {
        let result = Policy::with_ttl("/a", Duration::from_secs(u64::MAX), NOW);
        assert!(matches!(result, Err(AuthError::InvalidPolicy { .. })));
    }

    #[test]
    fn test_empty_principal_rejected() {
        let policy = Policy::new("/a", NOW + 1, NOW).unwrap();
        assert!(policy.with_principal("").is_err());
    }

    #[test]
    fn test_expiry_boundary() {
        let policy = Policy::new("/a", NOW + 1, NOW).unwrap();
        assert!(!policy.is_expired_at(NOW));
        assert!(policy.is_expired_at(NOW + 1));
        assert!(policy.is_expired_at(NOW + 2));
    }

    #[test]
    fn test_deserialize_original_signer_output() {
        // Shape produced by JSON.stringify in the CDN signer.
        let bytes = br#"{"Statement":[{"Resource":"https://*.cloudfront.net/*","Condition":{"DateLessThan":{"AWS:EpochTime":1700003600}}}]}"#;
        let policy = Policy::deserialize(bytes).unwrap();
        assert_eq!(policy.resource_pattern(), "https://*.cloudfront.net/*");
        assert_eq!(policy.expires_at(), 1_700_003_600);
        assert_eq!(policy.principal(), None);
        assert_eq!(policy.serialize().unwrap(), bytes);
    }

    #[test]
    fn test_deserialize_missing_expiry() {
        let result = Policy::deserialize(br#"{"Statement":[{"Resource":"/a","Condition":{}}]}"#);
        assert!(matches!(result, Err(AuthError::MalformedPolicy { .. })));
    }

    #[test]
    fn test_deserialize_wrong_type() {
        let result = Policy::deserialize(
            br#"{"Statement":[{"Resource":"/a","Condition":{"DateLessThan":{"AWS:EpochTime":"soon"}}}]}"#,
        );
        assert!(matches!(result, Err(AuthError::MalformedPolicy { .. })));
    }

    #[test]
    fn test_deserialize_rejects_unsupported_conditions() {
        let result = Policy::deserialize(
            br#"{"Statement":[{"Resource":"/a","Condition":{"DateLessThan":{"AWS:EpochTime":1},"IpAddress":{"AWS:SourceIp":"10.0.0.0/8"}}}]}"#,
        );
        assert!(matches!(result, Err(AuthError::MalformedPolicy { .. })));
    }

    #[test]
    fn test_deserialize_statement_count() {
        let none = Policy::deserialize(br#"{"Statement":[]}"#);
        assert!(
            matches!(none, Err(AuthError::MalformedPolicy { ref message }) if message.contains("found 0"))
        );

        let two = Policy::deserialize(
            br#"{"Statement":[{"Resource":"/a","Condition":{"DateLessThan":{"AWS:EpochTime":1}}},{"Resource":"/b","Condition":{"DateLessThan":{"AWS:EpochTime":1}}}]}"#,
        );
        assert!(
            matches!(two, Err(AuthError::MalformedPolicy { ref message }) if message.contains("found 2"))
        );
    }

    #[test]
    fn test_deserialize_empty_resource() {
        let result = Policy::deserialize(
            br#"{"Statement":[{"Resource":"","Condition":{"DateLessThan":{"AWS:EpochTime":1}}}]}"#,
        );
        assert!(matches!(result, Err(AuthError::MalformedPolicy { .. })));
    }

    #[test]
    fn test_deserialize_not_json() {
        assert!(matches!(Policy::deserialize(b"\x00\x01"), Err(AuthError::MalformedPolicy { .. })));
        assert!(matches!(Policy::deserialize(b"[]"), Err(AuthError::MalformedPolicy { .. })));
    }

    mod proptests {
        use proptest::prelude::*;

        use super::*;

        fn arb_policy() -> impl Strategy<Value = Policy> {
            (
                "[a-zA-Z0-9:/._*?\"\\\\-]{1,64}",
                1i64..4_000_000_000i64,
                proptest::option::of("[a-zA-Z0-9:_-]{1,32}"),
            )
                .prop_map(|(resource_pattern, expires_at, principal)| Policy {
                    resource_pattern,
                    expires_at,
                    principal,
                })
        }

        proptest! {
            /// `deserialize(decode(encode(serialize(P)))) == P` for every policy.
            #[test]
            fn policy_token_round_trip(policy in arb_policy()) {
                let bytes = policy.serialize().expect("serialize should succeed");
                let token = codec::encode(&bytes);
                let decoded = codec::decode(&token).expect("decode should succeed");
                prop_assert_eq!(&decoded, &bytes);
                prop_assert_eq!(Policy::deserialize(&decoded).expect("deserialize should succeed"), policy);
            }

            /// Equal policies serialize to equal bytes and vice versa.
            #[test]
            fn equality_matches_byte_equality(a in arb_policy(), b in arb_policy()) {
                let bytes_a = a.serialize().expect("serialize");
                let bytes_b = b.serialize().expect("serialize");
                prop_assert_eq!(a == b, bytes_a == bytes_b);
            }
        }
    }
}
