//! Payment webhook signature verification.
//!
//! The processor signs every webhook with `Stripe-Signature:
//! t=<unix>,v1=<hex>`, where `v1` is HMAC-SHA256 over `"{t}.{raw body}"`
//! keyed with the endpoint secret. Requests are checked against the raw
//! bytes before any JSON parsing.

use std::sync::Arc;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::ServiceError;

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

type HmacSha256 = Hmac<Sha256>;

/// Verifies signed webhook deliveries.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: Arc<str>,
    tolerance_secs: i64,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("secret", &"<redacted>")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish()
    }
}

impl WebhookVerifier {
    /// Creates a verifier accepting signatures up to `tolerance_secs` old.
    #[must_use]
    pub fn new(secret: &str, tolerance_secs: u64) -> Self {
        Self {
            secret: Arc::from(secret),
            tolerance_secs: i64::try_from(tolerance_secs).unwrap_or(i64::MAX),
        }
    }

    /// Checks `header` against `body` as of the unix time `now`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Unauthenticated`] when the header is missing
    /// or malformed, the timestamp is outside the tolerance window, or no
    /// `v1` signature matches.
    pub fn verify(&self, header: Option<&str>, body: &[u8], now: i64) -> Result<(), ServiceError> {
        let Some(header) = header else {
            tracing::warn!("webhook without signature header");
            return Err(ServiceError::Unauthenticated);
        };

        let mut timestamp = None;
        let mut candidates = Vec::new();
        for part in header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
                Some(("v1", value)) => candidates.extend(hex::decode(value).ok()),
                _ => {}
            }
        }
        let Some(timestamp) = timestamp else {
            tracing::warn!("webhook signature without timestamp");
            return Err(ServiceError::Unauthenticated);
        };
        if now.abs_diff(timestamp) > self.tolerance_secs.unsigned_abs() {
            tracing::warn!(timestamp, now, "webhook signature outside tolerance");
            return Err(ServiceError::Unauthenticated);
        }

        let matched = candidates.iter().any(|candidate| {
            self.mac(timestamp, body)
                .is_some_and(|mac| mac.verify_slice(candidate).is_ok())
        });
        if matched {
            Ok(())
        } else {
            tracing::warn!(timestamp, "webhook signature mismatch");
            Err(ServiceError::Unauthenticated)
        }
    }

    /// Builds the header value the processor would send for `body` at
    /// `timestamp`.
    #[must_use]
    pub fn sign(&self, timestamp: i64, body: &[u8]) -> String {
        let digest = self
            .mac(timestamp, body)
            .map(|mac| hex::encode(mac.finalize().into_bytes()))
            .unwrap_or_default();
        format!("t={timestamp},v1={digest}")
    }

    fn mac(&self, timestamp: i64, body: &[u8]) -> Option<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes()).ok()?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(body);
        Some(mac)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    const BODY: &[u8] = br#"{"type":"payment_intent.succeeded"}"#;
    const NOW: i64 = 1_760_000_000;

    fn verifier() -> WebhookVerifier {
        WebhookVerifier::new("whsec_test", 300)
    }

    #[test]
    fn accepts_own_signature() {
        let v = verifier();
        let header = v.sign(NOW, BODY);
        assert!(v.verify(Some(&header), BODY, NOW + 10).is_ok());
    }

    #[test]
    fn signs_timestamp_dot_body() {
        // HMAC-SHA256(key = "key", message = "1.payload")
        let v = WebhookVerifier::new("key", 300);
        assert_eq!(
            v.sign(1, b"payload"),
            "t=1,v1=32c9b0eaac24dc9674a36bdaa6352fb67abcb2c6d9731e18010b62b34fbdd32a"
        );
    }

    #[test]
    fn rejects_missing_header() {
        let Err(ServiceError::Unauthenticated) = verifier().verify(None, BODY, NOW) else {
            panic!("expected Unauthenticated");
        };
    }

    #[test]
    fn rejects_wrong_secret() {
        let forged = WebhookVerifier::new("whsec_other", 300).sign(NOW, BODY);
        let Err(ServiceError::Unauthenticated) = verifier().verify(Some(&forged), BODY, NOW) else {
            panic!("expected Unauthenticated");
        };
    }

    #[test]
    fn rejects_tampered_body() {
        let v = verifier();
        let header = v.sign(NOW, BODY);
        let tampered = br#"{"type":"payment_intent.succeeded","x":1}"#;
        assert!(v.verify(Some(&header), tampered, NOW).is_err());
    }

    #[test]
    fn rejects_stale_timestamp() {
        let v = verifier();
        let header = v.sign(NOW - 301, BODY);
        assert!(v.verify(Some(&header), BODY, NOW).is_err());
    }

    #[test]
    fn any_matching_v1_is_enough() {
        let v = verifier();
        let good = v.sign(NOW, BODY);
        let Some((_, digest)) = good.split_once(",v1=") else {
            panic!("header should carry v1");
        };
        let rotated = format!("t={NOW},v1={},v1={digest}", "00".repeat(32));
        assert!(v.verify(Some(&rotated), BODY, NOW).is_ok());
    }

    #[test]
    fn rejects_garbage_header() {
        assert!(verifier().verify(Some("nonsense"), BODY, NOW).is_err());
        assert!(verifier().verify(Some("t=abc,v1=zz"), BODY, NOW).is_err());
    }

    #[test]
    fn debug_hides_secret() {
        assert!(!format!("{:?}", verifier()).contains("whsec_test"));
    }
}
