#![no_main]

use common::jwt::{extract_alg, extract_bearer_token, DEFAULT_CLOCK_SKEW};
use libfuzzer_sys::fuzz_target;
use secrecy::SecretString;
use session_service::token::TokenCodec;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    // Header parsing must never panic
    let _ = extract_bearer_token(input);
    let _ = extract_alg(input);

    let Ok(codec) = TokenCodec::new(
        SecretString::from("fuzz-access-secret"),
        SecretString::from("fuzz-refresh-secret"),
        DEFAULT_CLOCK_SKEW,
    ) else {
        return;
    };

    // Verification returns a typed error for any input, never panics
    let _ = codec.verify_access(input);
    let _ = codec.verify_refresh(input);
});
