//! Webhook signature verification.
//!
//! The CMS signs each webhook body with HMAC-SHA256 and sends the digest in
//! `X-Hub-Signature-256: sha256=<hex>`. Verification runs over the raw bytes
//! before any JSON parsing.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Verify a webhook signature header against the raw request body.
pub fn verify_signature(secret: &str, body: &[u8], header: Option<&str>) -> bool {
    let Some(header) = header else {
        return false;
    };
    let Some(hex_digest) = header.strip_prefix("sha256=") else {
        return false;
    };

    let expected = sign(secret, body);
    constant_time_eq(hex_digest.as_bytes(), expected.as_bytes())
}

/// Produce the hex HMAC-SHA256 digest of a body. Also used by the submit CLI
/// to sign outgoing requests.
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
