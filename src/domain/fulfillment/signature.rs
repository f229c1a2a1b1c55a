//! Webhook signature verification.
//!
//! The payment provider signs every webhook delivery with an HMAC-SHA256 over
//! the raw request body, hex-encoded into the `x-razorpay-signature` header.
//! Verification must run on the raw bytes as received, before any JSON
//! parsing: re-serializing parsed JSON is not guaranteed to reproduce the
//! exact bytes the signature was computed over.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Verifier for provider webhook signatures.
#[derive(Clone)]
pub struct WebhookSignatureVerifier {
    /// Shared webhook secret from the provider dashboard.
    secret: SecretString,
}

impl WebhookSignatureVerifier {
    /// Creates a new verifier with the given webhook secret.
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Verifies `claimed_signature` (hex) against the HMAC of `payload`.
    ///
    /// Fails closed: an unconfigured (empty) secret never verifies, and a
    /// signature that is not valid hex never verifies. Comparison is
    /// constant-time.
    pub fn verify(&self, payload: &[u8], claimed_signature: &str) -> bool {
        let secret = self.secret.expose_secret();
        if secret.is_empty() {
            return false;
        }

        let claimed = match hex::decode(claimed_signature.trim()) {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };

        let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
            Ok(mac) => mac,
            Err(_) => return false,
        };
        mac.update(payload);
        let expected = mac.finalize().into_bytes();

        constant_time_compare(&expected, &claimed)
    }
}

/// Performs constant-time comparison of two byte slices.
///
/// This prevents timing attacks that could leak information about the
/// expected signature.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Computes the hex HMAC-SHA256 of a payload for use in test fixtures.
#[cfg(test)]
pub fn compute_test_signature(secret: &str, payload: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}
