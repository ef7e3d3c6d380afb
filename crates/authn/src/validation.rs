//! Input validation for key identifiers and algorithms.
//!
//! The key ID arrives from the client in a cookie and is passed to the key
//! store verbatim, so it is checked before any lookup happens.
//!
//! # Security
//!
//! - Key IDs are restricted to a short, printable alphabet so they cannot
//!   smuggle path separators, whitespace or control characters into a store
//!   lookup or a log line
//! - The key's recorded algorithm must equal the configured algorithm, so an
//!   RSA key can never be used where Ed25519 is expected or the reverse

use cookiegate_keys::SigningAlgorithm;

use crate::error::AuthError;

/// Maximum accepted key ID length in bytes.
pub const MAX_KEY_ID_LENGTH: usize = 128;

/// Validates a key ID taken from configuration or from a cookie.
///
/// Accepted characters are ASCII letters, digits, `-`, `_`, `.` and `:`.
///
/// # Errors
///
/// Returns [`AuthError::InvalidKeyId`] if the key ID is empty, longer than
/// [`MAX_KEY_ID_LENGTH`], or contains any other character.
///
/// # Examples
///
/// ```
/// use cookiegate_authn::validation::validate_key_id;
///
/// assert!(validate_key_id("K2JCJMDEHXQW5F").is_ok());
/// assert!(validate_key_id("WEBSOCKET-AUTH").is_ok());
/// assert!(validate_key_id("../../etc/passwd").is_err());
/// assert!(validate_key_id("").is_err());
/// ```
pub fn validate_key_id(kid: &str) -> Result<(), AuthError> {
    if kid.is_empty() {
        return Err(AuthError::invalid_key_id("key ID is empty"));
    }

    if kid.len() > MAX_KEY_ID_LENGTH {
        return Err(AuthError::invalid_key_id(format!(
            "key ID is {} bytes, maximum is {MAX_KEY_ID_LENGTH}",
            kid.len()
        )));
    }

    let allowed = |b: u8| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b':');
    if let Some(position) = kid.bytes().position(|b| !allowed(b)) {
        return Err(AuthError::invalid_key_id(format!(
            "key ID contains a disallowed character at position {position}"
        )));
    }

    Ok(())
}

/// Checks that key material recorded under `kid` uses the configured algorithm.
///
/// # Errors
///
/// Returns [`AuthError::AlgorithmMismatch`] if `actual` differs from
/// `expected`.
pub fn validate_algorithm(
    kid: &str,
    expected: SigningAlgorithm,
    actual: SigningAlgorithm,
) -> Result<(), AuthError> {
    if expected != actual {
        return Err(AuthError::AlgorithmMismatch { kid: kid.to_owned(), expected, actual });
    }
    Ok(())
}
