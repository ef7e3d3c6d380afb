//! Cookie-safe base64 codec.
//!
//! Cookie values travel through `Cookie` and `Set-Cookie` headers and query
//! strings, where `+`, `=` and `/` are unsafe. Tokens therefore use the
//! standard base64 alphabet with three substitutions, the same scheme CDN
//! signed cookies use:
//!
//! | Standard | Cookie-safe |
//! |----------|-------------|
//! | `+` | `-` |
//! | `=` | `_` |
//! | `/` | `~` |
//!
//! Padding is kept (as `_`), so every token length is a multiple of four.
//!
//! Decoding ignores the unused low bits of the final quantum, so two tokens
//! can decode to the same bytes. Callers that bind a token's exact text use
//! [`is_canonical`].

use base64::{
    Engine, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig, general_purpose::STANDARD},
};

use crate::error::AuthError;

const DECODER: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::RequireCanonical),
);

/// Encodes bytes as a cookie-safe token.
///
/// # Examples
///
/// ```
/// use cookiegate_authn::codec::{decode, encode};
///
/// let token = encode(b"\xfb\xff");
/// assert_eq!(token, "-~8_");
/// assert_eq!(decode(&token).unwrap(), b"\xfb\xff");
/// ```
#[must_use]
pub fn encode(bytes: &[u8]) -> String {
    STANDARD
        .encode(bytes)
        .chars()
        .map(|c| match c {
            '+' => '-',
            '=' => '_',
            '/' => '~',
            other => other,
        })
        .collect()
}

/// Decodes a cookie-safe token produced by [`encode`].
///
/// Non-zero trailing bits in the final quantum are ignored.
///
/// # Errors
///
/// Returns [`AuthError::Decode`] if:
/// - the token length is not a multiple of four
/// - the token contains a character outside the cookie-safe alphabet
/// - padding is misplaced
pub fn decode(token: &str) -> Result<Vec<u8>, AuthError> {
    if token.len() % 4 != 0 {
        return Err(AuthError::decode(format!(
            "token length {} is not a multiple of 4",
            token.len()
        )));
    }

    let mut standard = String::with_capacity(token.len());
    for (position, c) in token.chars().enumerate() {
        let mapped = match c {
            '-' => '+',
            '_' => '=',
            '~' => '/',
            'A'..='Z' | 'a'..='z' | '0'..='9' => c,
            _ => {
                return Err(AuthError::decode(format!(
                    "invalid character {c:?} at position {position}"
                )));
            },
        };
        standard.push(mapped);
    }

    DECODER
        .decode(standard.as_bytes())
        .map_err(|e| AuthError::decode(format!("invalid base64: {e}")))
}

/// Returns `true` if `token` is exactly the encoding of `bytes`.
///
/// `decode` accepts tokens whose trailing bits are set; this tells them
/// apart from the token [`encode`] would produce.
///
/// # Examples
///
/// ```
/// use cookiegate_authn::codec::{decode, is_canonical};
///
/// let bytes = decode("-~9_").unwrap();
/// assert_eq!(bytes, b"\xfb\xff");
/// assert!(is_canonical("-~8_", &bytes));
/// assert!(!is_canonical("-~9_", &bytes));
/// ```
#[must_use]
pub fn is_canonical(token: &str, bytes: &[u8]) -> bool {
    encode(bytes) == token
}
