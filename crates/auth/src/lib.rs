//! Authentication core: client credentials, bearer tokens, per-request
//! HMAC signatures, and replay defense.
//!
//! Nothing in this crate touches the database; the only mutable state
//! is the bounded [`NonceCache`].

pub mod credentials;
pub mod nonce;
pub mod signing;
pub mod token;
pub mod verify;

pub use credentials::ClientRegistry;
pub use nonce::NonceCache;
pub use signing::{canonical_message, compute_signature, generate_nonce, SignatureHeaders};
pub use token::{Claims, IssuedToken, TokenError, TokenIssuer};
pub use verify::{AuthError, SignatureVerifier, SignedRequest};

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as Unix seconds.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
