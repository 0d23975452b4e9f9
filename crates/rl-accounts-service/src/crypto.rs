//! Cryptographic utilities for webhook verification.
//!
//! Shared by the Stripe and routerlimits receivers.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute HMAC-SHA256 of `message` and return it hex-encoded.
///
/// Returns `None` only if the HMAC implementation rejects the key, which
/// HMAC-SHA256 never does for any key length.
#[must_use]
pub fn hmac_sha256_hex(secret: &[u8], message: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(message);
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time string comparison.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

/// Check a hex HMAC-SHA256 signature of `message`.
///
/// Hex case is ignored.
#[must_use]
pub fn verify_hex_signature(secret: &[u8], message: &[u8], signature: &str) -> bool {
    hmac_sha256_hex(secret, message)
        .is_some_and(|expected| constant_time_eq(&expected, &signature.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hmac_matches_rfc_4231_case_2() {
        let result = hmac_sha256_hex(b"Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(
            result,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn constant_time_eq_works() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(constant_time_eq("", ""));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "ab"));
        assert!(!constant_time_eq("abc", "ABC"));
    }

    #[test]
    fn verify_accepts_own_signature_in_any_case() {
        let sig = hmac_sha256_hex(b"secret", b"payload").unwrap();
        assert!(verify_hex_signature(b"secret", b"payload", &sig));
        assert!(verify_hex_signature(b"secret", b"payload", &sig.to_uppercase()));
        assert!(!verify_hex_signature(b"other", b"payload", &sig));
        assert!(!verify_hex_signature(b"secret", b"payload!", &sig));
    }
}
