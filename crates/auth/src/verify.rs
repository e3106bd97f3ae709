//! Server-side verification of signed requests.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::credentials::ClientRegistry;
use crate::nonce::NonceCache;
use crate::signing::canonical_message;
use crate::unix_now;

type HmacSha256 = Hmac<Sha256>;

const MIN_NONCE_LEN: usize = 16;

/// Typed reasons a signed request is rejected. `UnknownClient` maps to
/// 403 at the HTTP layer; everything else to 401.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing signature headers")]
    MissingHeaders,
    #[error("unknown client")]
    UnknownClient,
    #[error("malformed timestamp")]
    MalformedTimestamp,
    #[error("request timestamp outside the accepted window")]
    StaleTimestamp,
    #[error("nonce too short")]
    MalformedNonce,
    #[error("nonce already used (replay)")]
    ReplayedNonce,
    #[error("signature mismatch")]
    BadSignature,
}

/// A request reduced to the coordinates the signature covers, plus the
/// four signature headers (each `None` when absent).
#[derive(Debug)]
pub struct SignedRequest<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub body: &'a [u8],
    pub client_id: Option<&'a str>,
    pub timestamp: Option<&'a str>,
    pub nonce: Option<&'a str>,
    pub signature: Option<&'a str>,
}

/// Verifies HMAC request signatures against the credential table and
/// records nonces for replay defense.
pub struct SignatureVerifier {
    registry: ClientRegistry,
    nonces: NonceCache,
    tolerance_secs: i64,
}

impl SignatureVerifier {
    pub fn new(registry: ClientRegistry, nonces: NonceCache, tolerance_secs: u64) -> Self {
        Self {
            registry,
            nonces,
            tolerance_secs: tolerance_secs as i64,
        }
    }

    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    /// Verify a signed request against the current wall clock. On
    /// success the nonce is consumed and the verified client id
    /// returned.
    pub fn verify(&self, req: &SignedRequest<'_>) -> Result<String, AuthError> {
        self.verify_at(req, unix_now())
    }

    pub fn verify_at(&self, req: &SignedRequest<'_>, now: i64) -> Result<String, AuthError> {
        let (client_id, timestamp, nonce, signature) = match (
            req.client_id,
            req.timestamp,
            req.nonce,
            req.signature,
        ) {
            (Some(c), Some(t), Some(n), Some(s)) => (c, t, n, s),
            _ => return Err(AuthError::MissingHeaders),
        };

        let secret = self
            .registry
            .secret_for(client_id)
            .ok_or(AuthError::UnknownClient)?;

        let ts: i64 = timestamp
            .parse()
            .map_err(|_| AuthError::MalformedTimestamp)?;
        if (now - ts).abs() > self.tolerance_secs {
            tracing::warn!(
                client_id = %truncate_id(client_id),
                age = now - ts,
                "signed request with stale timestamp"
            );
            return Err(AuthError::StaleTimestamp);
        }

        if nonce.len() < MIN_NONCE_LEN {
            return Err(AuthError::MalformedNonce);
        }
        // Fast replay reject before any MAC work; the authoritative
        // atomic check-and-insert happens after the signature passes.
        if self.nonces.contains(nonce) {
            tracing::warn!(client_id = %truncate_id(client_id), "replayed nonce");
            return Err(AuthError::ReplayedNonce);
        }

        let message = canonical_message(req.method, req.path, req.body, timestamp, nonce);
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(message.as_bytes());
        let expected = mac.finalize().into_bytes();

        let provided = BASE64
            .decode(signature)
            .map_err(|_| AuthError::BadSignature)?;
        if !bool::from(provided.as_slice().ct_eq(expected.as_slice())) {
            tracing::warn!(client_id = %truncate_id(client_id), "signature mismatch");
            return Err(AuthError::BadSignature);
        }

        if self.nonces.check_and_insert(nonce) {
            return Err(AuthError::ReplayedNonce);
        }

        Ok(client_id.to_owned())
    }
}

/// Identifier prefix safe for warn-level logs.
fn truncate_id(id: &str) -> String {
    id.chars().take(8).collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::signing::compute_signature;

    const NOW: i64 = 1_700_000_000;

    fn verifier() -> SignatureVerifier {
        let registry = ClientRegistry::from_json(r#"{"cli": "sec"}"#).expect("registry");
        SignatureVerifier::new(registry, NonceCache::new(1024, Duration::from_secs(300)), 60)
    }

    fn signed<'a>(
        ts: &'a str,
        nonce: &'a str,
        signature: &'a str,
        body: &'a [u8],
    ) -> SignedRequest<'a> {
        SignedRequest {
            method: "POST",
            path: "/auth/login",
            body,
            client_id: Some("cli"),
            timestamp: Some(ts),
            nonce: Some(nonce),
            signature: Some(signature),
        }
    }

    #[test]
    fn accepts_a_valid_signature() {
        let v = verifier();
        let ts = NOW.to_string();
        let sig = compute_signature("sec", "POST", "/auth/login", b"{}", &ts, "a".repeat(32).as_str());
        let nonce = "a".repeat(32);
        let req = signed(&ts, &nonce, &sig, b"{}");
        assert_eq!(v.verify_at(&req, NOW).expect("accepted"), "cli");
    }

    #[test]
    fn identical_resend_is_a_replay() {
        let v = verifier();
        let ts = NOW.to_string();
        let nonce = "b".repeat(32);
        let sig = compute_signature("sec", "POST", "/auth/login", b"{}", &ts, &nonce);
        let req = signed(&ts, &nonce, &sig, b"{}");
        assert!(v.verify_at(&req, NOW).is_ok());
        assert_eq!(v.verify_at(&req, NOW).unwrap_err(), AuthError::ReplayedNonce);
    }

    #[test]
    fn missing_headers_rejected() {
        let v = verifier();
        let req = SignedRequest {
            method: "GET",
            path: "/api/games",
            body: b"",
            client_id: Some("cli"),
            timestamp: None,
            nonce: Some("c0ffee00c0ffee00"),
            signature: Some("sig"),
        };
        assert_eq!(v.verify_at(&req, NOW).unwrap_err(), AuthError::MissingHeaders);
    }

    #[test]
    fn unknown_client_rejected_before_signature_work() {
        let v = verifier();
        let ts = NOW.to_string();
        let nonce = "d".repeat(32);
        let mut req = signed(&ts, &nonce, "irrelevant", b"");
        req.client_id = Some("nobody");
        assert_eq!(v.verify_at(&req, NOW).unwrap_err(), AuthError::UnknownClient);
    }

    #[test]
    fn timestamp_window_boundary() {
        let v = verifier();
        let nonce = "e".repeat(32);

        // Exactly 60s old: accepted.
        let ts = (NOW - 60).to_string();
        let sig = compute_signature("sec", "POST", "/auth/login", b"", &ts, &nonce);
        let req = signed(&ts, &nonce, &sig, b"");
        assert!(v.verify_at(&req, NOW).is_ok());

        // 61s old: rejected.
        let ts = (NOW - 61).to_string();
        let nonce2 = "f".repeat(32);
        let sig = compute_signature("sec", "POST", "/auth/login", b"", &ts, &nonce2);
        let req = signed(&ts, &nonce2, &sig, b"");
        assert_eq!(v.verify_at(&req, NOW).unwrap_err(), AuthError::StaleTimestamp);
    }

    #[test]
    fn tampered_body_rejected() {
        let v = verifier();
        let ts = NOW.to_string();
        let nonce = "1".repeat(32);
        let sig = compute_signature("sec", "POST", "/auth/login", b"{}", &ts, &nonce);
        let req = signed(&ts, &nonce, &sig, b"{\"x\":1}");
        assert_eq!(v.verify_at(&req, NOW).unwrap_err(), AuthError::BadSignature);
        // The nonce was not consumed by the failed attempt.
        let sig = compute_signature("sec", "POST", "/auth/login", b"{}", &ts, &nonce);
        let req = signed(&ts, &nonce, &sig, b"{}");
        assert!(v.verify_at(&req, NOW).is_ok());
    }

    #[test]
    fn non_base64_signature_rejected() {
        let v = verifier();
        let ts = NOW.to_string();
        let nonce = "2".repeat(32);
        let req = signed(&ts, &nonce, "!!!not-base64!!!", b"");
        assert_eq!(v.verify_at(&req, NOW).unwrap_err(), AuthError::BadSignature);
    }

    #[test]
    fn short_nonce_rejected() {
        let v = verifier();
        let ts = NOW.to_string();
        let sig = compute_signature("sec", "POST", "/auth/login", b"", &ts, "short");
        let req = signed(&ts, "short", &sig, b"");
        assert_eq!(v.verify_at(&req, NOW).unwrap_err(), AuthError::MalformedNonce);
    }
}
