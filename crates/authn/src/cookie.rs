//! Cookie values, names and header formatting.
//!
//! A signed cookie set travels as three cookies. Their names depend on the
//! deployment: the CDN profile uses the names CDN edge verification expects,
//! the WebSocket profile uses names that never collide with them.
//!
//! | Value | [`CookieProfile::Cloudfront`] | [`CookieProfile::Websocket`] |
//! |-------|-------------------------------|------------------------------|
//! | policy token | `CloudFront-Policy` | `WS-Policy` |
//! | signature | `CloudFront-Signature` | `WS-Signature` |
//! | key ID | `CloudFront-Key-Pair-Id` | `WS-Auth-Id` |

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// The three values handed to a client after issuance.
///
/// Created once per issuance and never mutated. `Debug` output shows the key
/// ID but not the token or signature.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedCookieSet {
    /// Cookie-safe encoding of the serialized policy.
    pub policy_token: String,
    /// Cookie-safe encoding of the signature over the serialized policy.
    pub signature: String,
    /// Key ID of the pair that produced the signature.
    pub key_id: String,
}

impl SignedCookieSet {
    /// Renders one `Set-Cookie` header value per cookie, in policy,
    /// signature, key ID order.
    ///
    /// # Examples
    ///
    /// ```
    /// use cookiegate_authn::{CookieAttributes, CookieNames, SameSite, SignedCookieSet};
    ///
    /// let cookies = SignedCookieSet {
    ///     policy_token: "eyJTdGF0ZW1lbnQiOltdfQ__".into(),
    ///     signature: "c2lnbmF0dXJl".into(),
    ///     key_id: "WEBSOCKET-AUTH".into(),
    /// };
    /// let attributes = CookieAttributes::new("agent.example.com", SameSite::None);
    ///
    /// let headers = cookies.set_cookie_headers(&CookieNames::websocket(), &attributes);
    /// assert_eq!(
    ///     headers[2],
    ///     "WS-Auth-Id=WEBSOCKET-AUTH; Domain=agent.example.com; Path=/; SameSite=None; Secure; HttpOnly"
    /// );
    /// ```
    #[must_use]
    pub fn set_cookie_headers(
        &self,
        names: &CookieNames,
        attributes: &CookieAttributes,
    ) -> [String; 3] {
        [
            attributes.render(&names.policy, &self.policy_token),
            attributes.render(&names.signature, &self.signature),
            attributes.render(&names.key_id, &self.key_id),
        ]
    }
}

impl fmt::Debug for SignedCookieSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedCookieSet")
            .field("policy_token_len", &self.policy_token.len())
            .field("signature_len", &self.signature.len())
            .field("key_id", &self.key_id)
            .finish()
    }
}

/// Named cookie sets used by known deployments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CookieProfile {
    /// CDN signed-cookie names.
    Cloudfront,
    /// WebSocket gateway names.
    Websocket,
}

/// Names of the three credential cookies.
///
/// In configuration this is either a profile name (`"cloudfront"`,
/// `"websocket"`) or a table with `policy`, `signature` and `key-id` keys.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CookieNamesRepr", rename_all = "kebab-case")]
pub struct CookieNames {
    /// Name of the policy token cookie.
    pub policy: String,
    /// Name of the signature cookie.
    pub signature: String,
    /// Name of the key ID cookie.
    pub key_id: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CookieNamesRepr {
    Profile(CookieProfile),
    #[serde(rename_all = "kebab-case")]
    Custom {
        policy: String,
        signature: String,
        key_id: String,
    },
}

impl From<CookieNamesRepr> for CookieNames {
    fn from(repr: CookieNamesRepr) -> Self {
        match repr {
            CookieNamesRepr::Profile(profile) => Self::for_profile(profile),
            CookieNamesRepr::Custom { policy, signature, key_id } => {
                Self { policy, signature, key_id }
            },
        }
    }
}

impl CookieNames {
    /// Names for `profile`.
    #[must_use]
    pub fn for_profile(profile: CookieProfile) -> Self {
        match profile {
            CookieProfile::Cloudfront => Self::cloudfront(),
            CookieProfile::Websocket => Self::websocket(),
        }
    }

    /// `CloudFront-Policy`, `CloudFront-Signature`, `CloudFront-Key-Pair-Id`.
    #[must_use]
    pub fn cloudfront() -> Self {
        Self {
            policy: "CloudFront-Policy".to_owned(),
            signature: "CloudFront-Signature".to_owned(),
            key_id: "CloudFront-Key-Pair-Id".to_owned(),
        }
    }

    /// `WS-Policy`, `WS-Signature`, `WS-Auth-Id`.
    #[must_use]
    pub fn websocket() -> Self {
        Self {
            policy: "WS-Policy".to_owned(),
            signature: "WS-Signature".to_owned(),
            key_id: "WS-Auth-Id".to_owned(),
        }
    }

    /// Checks that every name is a valid cookie name and that they differ.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] naming the first offending cookie.
    pub fn validate(&self) -> Result<(), AuthError> {
        for name in [&self.policy, &self.signature, &self.key_id] {
            if !is_cookie_token(name) {
                return Err(AuthError::config(format!("invalid cookie name {name:?}")));
            }
        }
        if self.policy == self.signature
            || self.policy == self.key_id
            || self.signature == self.key_id
        {
            return Err(AuthError::config("cookie names must be distinct"));
        }
        Ok(())
    }
}

impl Default for CookieNames {
    fn default() -> Self {
        Self::cloudfront()
    }
}

/// `SameSite` cookie attribute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    /// Sent on cross-site requests. Needed when a page on one origin opens a
    /// WebSocket to a gateway on another.
    None,
    /// Sent on top-level navigations and same-site requests.
    #[default]
    Lax,
    /// Sent on same-site requests only.
    Strict,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "None",
            Self::Lax => "Lax",
            Self::Strict => "Strict",
        })
    }
}

/// Attributes attached to every issued cookie.
///
/// `Path=/`, `Secure` and `HttpOnly` are always set; only the domain and the
/// cross-site policy vary between deployments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CookieAttributes {
    domain: String,
    same_site: SameSite,
}

impl CookieAttributes {
    /// Creates attributes scoped to exactly `domain`.
    #[must_use]
    pub fn new(domain: impl Into<String>, same_site: SameSite) -> Self {
        Self { domain: domain.into(), same_site }
    }

    /// The `Domain` attribute.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// The `SameSite` attribute.
    #[must_use]
    pub fn same_site(&self) -> SameSite {
        self.same_site
    }

    fn render(&self, name: &str, value: &str) -> String {
        format!(
            "{name}={value}; Domain={}; Path=/; SameSite={}; Secure; HttpOnly",
            self.domain, self.same_site
        )
    }
}

/// Credential cookies as presented on an inbound request.
///
/// Any of the three may be absent. Empty values count as absent.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PresentedCookies {
    /// Policy token cookie value.
    pub policy_token: Option<String>,
    /// Signature cookie value.
    pub signature: Option<String>,
    /// Key ID cookie value.
    pub key_id: Option<String>,
}

impl PresentedCookies {
    /// Extracts the credential cookies from a `Cookie` request header.
    ///
    /// Pairs are separated by `;`, names and values are trimmed, a value may
    /// itself contain `=`, and one pair of surrounding double quotes is
    /// removed. Pairs without `=` and unrelated cookies are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Decode`] if a credential cookie appears twice
    /// with different values.
    ///
    /// # Examples
    ///
    /// ```
    /// use cookiegate_authn::{CookieNames, PresentedCookies};
    ///
    /// let header = "theme=dark; WS-Policy=eyJ9; WS-Signature=c2ln; WS-Auth-Id=WEBSOCKET-AUTH";
    /// let cookies = PresentedCookies::from_cookie_header(header, &CookieNames::websocket()).unwrap();
    ///
    /// assert_eq!(cookies.policy_token.as_deref(), Some("eyJ9"));
    /// assert_eq!(cookies.key_id.as_deref(), Some("WEBSOCKET-AUTH"));
    /// ```
    pub fn from_cookie_header(header: &str, names: &CookieNames) -> Result<Self, AuthError> {
        let mut cookies = Self::default();

        for pair in header.split(';') {
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            let name = name.trim();
            let value = unquote(value.trim());

            let slot = if name == names.policy {
                &mut cookies.policy_token
            } else if name == names.signature {
                &mut cookies.signature
            } else if name == names.key_id {
                &mut cookies.key_id
            } else {
                continue;
            };

            if value.is_empty() {
                continue;
            }
            match slot.as_deref() {
                Some(existing) if existing != value => {
                    return Err(AuthError::decode(format!(
                        "cookie {name} is present more than once with different values"
                    )));
                },
                Some(_) => {},
                None => *slot = Some(value.to_owned()),
            }
        }

        Ok(cookies)
    }

    /// Whether all three credential cookies are present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.policy_token.is_some() && self.signature.is_some() && self.key_id.is_some()
    }
}

impl From<SignedCookieSet> for PresentedCookies {
    fn from(set: SignedCookieSet) -> Self {
        Self {
            policy_token: Some(set.policy_token),
            signature: Some(set.signature),
            key_id: Some(set.key_id),
        }
    }
}

impl From<&SignedCookieSet> for PresentedCookies {
    fn from(set: &SignedCookieSet) -> Self {
        Self::from(set.clone())
    }
}

impl fmt::Debug for PresentedCookies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresentedCookies")
            .field("policy_token", &self.policy_token.as_ref().map(|_| "<present>"))
            .field("signature", &self.signature.as_ref().map(|_| "<present>"))
            .field("key_id", &self.key_id)
            .finish()
    }
}

/// HTTP response returned by an issuance endpoint.
///
/// Serializes in the gateway proxy-integration shape: single-valued headers
/// in `headers`, the three `Set-Cookie` values in `multiValueHeaders`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuanceResponse {
    /// HTTP status code.
    pub status_code: u16,
    /// Single-valued response headers.
    pub headers: BTreeMap<String, String>,
    /// Multi-valued response headers.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub multi_value_headers: BTreeMap<String, Vec<String>>,
    /// JSON response body.
    pub body: String,
}

impl IssuanceResponse {
    /// A 200 response setting the three cookies.
    ///
    /// When `cors_origin` is set the response allows credentialed `GET`
    /// requests from that origin.
    #[must_use]
    pub fn success(set_cookies: [String; 3], cors_origin: Option<&str>) -> Self {
        Self {
            status_code: 200,
            headers: cors_headers(cors_origin),
            multi_value_headers: BTreeMap::from([("Set-Cookie".to_owned(), set_cookies.into())]),
            body: r#"{"success":true}"#.to_owned(),
        }
    }

    /// A 500 response. Carries no detail about the failure.
    #[must_use]
    pub fn internal_error(cors_origin: Option<&str>) -> Self {
        Self {
            status_code: 500,
            headers: cors_headers(cors_origin),
            multi_value_headers: BTreeMap::new(),
            body: r#"{"error":"Internal Server Error"}"#.to_owned(),
        }
    }
}

fn cors_headers(origin: Option<&str>) -> BTreeMap<String, String> {
    let Some(origin) = origin else {
        return BTreeMap::new();
    };
    BTreeMap::from([
        ("Access-Control-Allow-Origin".to_owned(), origin.to_owned()),
        ("Access-Control-Allow-Credentials".to_owned(), "true".to_owned()),
        ("Access-Control-Allow-Headers".to_owned(), "Content-Type".to_owned()),
        ("Access-Control-Allow-Methods".to_owned(), "GET".to_owned()),
    ])
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(value)
}

/// RFC 6265 `cookie-name`: a non-empty RFC 7230 token.
fn is_cookie_token(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_alphanumeric()
                || matches!(
                    b,
                    b'!' | b'#'
                        | b'$'
                        | b'%'
                        | b'&'
                        | b'\''
                        | b'*'
                        | b'+'
                        | b'-'
                        | b'.'
                        | b'^'
                        | b'_'
                        | b'`'
                        | b'|'
                        | b'~'
                )
        })
}
