//! Authorization decisions and their gateway representation.
//!
//! An [`AuthorizationDecision`] is the only thing the authorizer returns.
//! The gateway consumes it immediately: `Allow` forwards the request with the
//! principal attached as request context, `Deny` becomes a generic 403.
//!
//! The [`DenialReason`] is for logs and tests. It is never sent to the
//! client; [`AuthorizationDecision::client_message`] is the same for every
//! denial.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

/// Body sent to every denied client, whatever the reason.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";

/// Principal ID reported to the gateway for denied requests.
pub const DENIED_PRINCIPAL_ID: &str = "user";

/// Action granted by gateway authorizer policies.
pub const INVOKE_ACTION: &str = "execute-api:Invoke";

/// Version of the gateway policy language.
pub const POLICY_LANGUAGE_VERSION: &str = "2012-10-17";

/// Why a request was denied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// At least one of the three credential cookies was absent.
    MissingCredential,
    /// A cookie value did not decode, or the policy did not parse.
    MalformedCredential,
    /// The public key could not be fetched (not found, store failure, timeout).
    KeyLookupFailed,
    /// The signature does not verify against the policy bytes.
    InvalidSignature,
    /// The policy expiry is at or before the current time.
    Expired,
    /// The policy does not cover the requested resource.
    ResourceMismatch,
    /// An unexpected fault inside the authorizer.
    InternalError,
}

impl DenialReason {
    /// Returns the reason as it appears in logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::MalformedCredential => "malformed_credential",
            Self::KeyLookupFailed => "key_lookup_failed",
            Self::InvalidSignature => "invalid_signature",
            Self::Expired => "expired",
            Self::ResourceMismatch => "resource_mismatch",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of authorizing one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthorizationDecision {
    /// Forward the request, attaching `principal_id` as request context.
    Allow {
        /// Identity bound to the verified cookie.
        principal_id: String,
    },
    /// Reject the request.
    Deny {
        /// Internal reason; not for the client.
        reason: DenialReason,
    },
}

impl AuthorizationDecision {
    /// Creates an `Allow` decision.
    #[must_use]
    pub fn allow(principal_id: impl Into<String>) -> Self {
        Self::Allow { principal_id: principal_id.into() }
    }

    /// Creates a `Deny` decision.
    #[must_use]
    pub fn deny(reason: DenialReason) -> Self {
        Self::Deny { reason }
    }

    /// Returns `true` for `Allow`.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }

    /// Returns the principal for `Allow`, `None` for `Deny`.
    #[must_use]
    pub fn principal_id(&self) -> Option<&str> {
        match self {
            Self::Allow { principal_id } => Some(principal_id),
            Self::Deny { .. } => None,
        }
    }

    /// Returns the reason for `Deny`, `None` for `Allow`.
    #[must_use]
    pub fn denial_reason(&self) -> Option<DenialReason> {
        match self {
            Self::Allow { .. } => None,
            Self::Deny { reason } => Some(*reason),
        }
    }

    /// HTTP status a REST gateway should answer with.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        if self.is_allowed() { 200 } else { 403 }
    }

    /// Message safe to return to the client on denial.
    ///
    /// Identical for every reason, so a client cannot tell an expired cookie
    /// from a forged one.
    #[must_use]
    pub fn client_message(&self) -> Option<&'static str> {
        if self.is_allowed() { None } else { Some(UNAUTHORIZED_MESSAGE) }
    }

    /// Renders the decision as a gateway authorizer response for `method_arn`.
    ///
    /// # Examples
    ///
    /// ```
    /// use cookiegate_authn::{AuthorizationDecision, DenialReason, GatewayEffect};
    ///
    /// let arn = "arn:aws:execute-api:us-east-1:123456789012:abc/dev/$connect";
    ///
    /// let allowed = AuthorizationDecision::allow("alice").to_gateway_response(arn);
    /// assert_eq!(allowed.principal_id, "alice");
    /// assert_eq!(allowed.policy_document.statement[0].effect, GatewayEffect::Allow);
    /// assert_eq!(allowed.context.get("userId").map(String::as_str), Some("alice"));
    ///
    /// let denied = AuthorizationDecision::deny(DenialReason::Expired).to_gateway_response(arn);
    /// assert_eq!(denied.policy_document.statement[0].effect, GatewayEffect::Deny);
    /// assert!(denied.context.is_empty());
    /// ```
    #[must_use]
    pub fn to_gateway_response(&self, method_arn: &str) -> GatewayAuthorizerResponse {
        let (principal_id, effect, context) = match self {
            Self::Allow { principal_id } => (
                principal_id.clone(),
                GatewayEffect::Allow,
                BTreeMap::from([("userId".to_owned(), principal_id.clone())]),
            ),
            Self::Deny { .. } => {
                (DENIED_PRINCIPAL_ID.to_owned(), GatewayEffect::Deny, BTreeMap::new())
            },
        };

        GatewayAuthorizerResponse {
            principal_id,
            policy_document: GatewayPolicyDocument {
                version: POLICY_LANGUAGE_VERSION.to_owned(),
                statement: vec![GatewayStatement {
                    action: INVOKE_ACTION.to_owned(),
                    effect,
                    resource: method_arn.to_owned(),
                }],
            },
            context,
        }
    }
}

/// Response of a gateway request authorizer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayAuthorizerResponse {
    /// Principal the gateway attributes the request to.
    pub principal_id: String,
    /// Policy granting or refusing the invocation.
    pub policy_document: GatewayPolicyDocument,
    /// Request context passed to the backend; empty on denial.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, String>,
}

/// IAM-style policy document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GatewayPolicyDocument {
    /// Policy language version.
    pub version: String,
    /// Policy statements.
    pub statement: Vec<GatewayStatement>,
}

/// A single policy statement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GatewayStatement {
    /// Granted action.
    pub action: String,
    /// Allow or deny.
    pub effect: GatewayEffect,
    /// Method ARN the statement applies to.
    pub resource: String,
}

/// Statement effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GatewayEffect {
    /// Grant.
    Allow,
    /// Refuse.
    Deny,
}
