//! HMAC helpers for webhook signature verification.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute an HMAC-SHA256 over `message` and return it hex-encoded.
///
/// This is the scheme Stripe signs webhook payloads with: the signed
/// message is `"{timestamp}.{body}"` and the key is the endpoint's
/// signing secret.
///
/// # Panics
///
/// Never panics in practice: HMAC-SHA256 accepts keys of any length.
#[must_use]
pub fn hmac_sha256_hex(secret: &str, message: &str) -> String {
    // INVARIANT: HMAC-SHA256 has no key-size restriction, so
    // new_from_slice cannot fail.
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC-SHA256 accepts any key size");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Compare two strings without revealing where they first differ.
///
/// Signature comparison must not short-circuit, or response timing would
/// leak how much of a forged signature was correct.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hmac_matches_rfc4231_vector() {
        // RFC 4231 test case 2.
        let mac = hmac_sha256_hex("Jefe", "what do ya want for nothing?");
        assert_eq!(
            mac,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn hmac_is_deterministic() {
        assert_eq!(
            hmac_sha256_hex("secret", "payload"),
            hmac_sha256_hex("secret", "payload")
        );
    }

    #[test]
    fn hmac_differs_per_secret() {
        assert_ne!(
            hmac_sha256_hex("secret-a", "payload"),
            hmac_sha256_hex("secret-b", "payload")
        );
    }

    #[test]
    fn constant_time_eq_accepts_equal_strings() {
        assert!(constant_time_eq("abc123", "abc123"));
    }

    #[test]
    fn constant_time_eq_rejects_different_strings() {
        assert!(!constant_time_eq("abc123", "abc124"));
        assert!(!constant_time_eq("abc", "abc123"));
    }
}
