//! Fuzz target for policy token decoding.
//!
//! Every input must produce either a policy or an error. When a policy is
//! produced, its accessors and resource matching must not panic, and
//! re-serializing it must yield a document that parses to the same policy.

#![no_main]

use cookiegate_authn::{Policy, codec, resource::covers};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Raw bytes exercise the JSON parser directly
    if let Ok(policy) = Policy::deserialize(data) {
        check(&policy);
    }

    // Strings exercise the token alphabet first
    let Ok(token) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(bytes) = codec::decode(token) else {
        return;
    };
    let canonical = codec::encode(&bytes);
    assert_eq!(codec::is_canonical(token, &bytes), canonical == token);
    assert_eq!(codec::decode(&canonical).ok().as_deref(), Some(bytes.as_slice()));

    if let Ok(policy) = Policy::deserialize(&bytes) {
        check(&policy);
    }
});

fn check(policy: &Policy) {
    let _ = policy.is_expired_at(policy.expires_at());
    let _ = covers(policy.resource_pattern(), "/api/chat");
    let _ = policy.covers(policy.resource_pattern());

    if let Ok(bytes) = policy.serialize() {
        let reparsed = Policy::deserialize(&bytes);
        assert_eq!(reparsed.ok().as_ref(), Some(policy), "serialized policy must parse back");
    }
}
