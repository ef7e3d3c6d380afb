//! Fuzz target for `Cookie` header parsing and key ID validation.
//!
//! Feeds arbitrary strings as `Cookie` headers under both naming profiles.
//! Parsing must never panic, and a parsed key ID must survive validation
//! without panicking either.

#![no_main]

use cookiegate_authn::{CookieNames, PresentedCookies, codec, validation::validate_key_id};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Header values reaching the authorizer are always strings
    let Ok(header) = std::str::from_utf8(data) else {
        return;
    };

    for names in [CookieNames::cloudfront(), CookieNames::websocket()] {
        let Ok(cookies) = PresentedCookies::from_cookie_header(header, &names) else {
            continue;
        };

        if let Some(ref kid) = cookies.key_id {
            let _ = validate_key_id(kid);
        }
        if let Some(ref token) = cookies.policy_token {
            let _ = codec::decode(token);
        }
        if let Some(ref signature) = cookies.signature {
            let _ = codec::decode(signature);
        }
    }
});
