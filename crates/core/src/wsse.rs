//! WSSE authentication header derivation.
//!
//! The Fotolife endpoint authenticates with a `X-WSSE` UsernameToken:
//! `PasswordDigest = base64(sha1(nonce + created + api_key))`. The nonce
//! and timestamp are supplied by the caller so the derivation stays pure.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use sha1::{Digest, Sha1};

/// Derive the base64 password digest from its raw ingredients.
pub fn password_digest(nonce: &[u8], created: &str, api_key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(nonce);
    hasher.update(created.as_bytes());
    hasher.update(api_key.as_bytes());
    STANDARD.encode(hasher.finalize())
}

/// Render the complete `X-WSSE` header value.
pub fn header(username: &str, api_key: &str, nonce: &[u8], created: &str) -> String {
    format!(
        "UsernameToken Username=\"{}\", PasswordDigest=\"{}\", Nonce=\"{}\", Created=\"{}\"",
        username,
        password_digest(nonce, created, api_key),
        STANDARD.encode(nonce),
        created,
    )
}
