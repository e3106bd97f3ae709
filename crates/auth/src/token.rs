//! Bearer token issuance and verification (HS256).

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use sb_domain::{Error, Result};

use crate::unix_now;

/// Decoded token payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub client_id: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(rename = "type")]
    pub token_type: String,
}

/// Result of issuing a token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: u64,
}

/// Typed verification failure. Anything that is not cleanly "the token
/// was fine but past its lifetime" is `Invalid`.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
}

/// Issues and verifies HS256 bearer tokens against a single symmetric
/// secret. The secret is consumed at construction and never logged.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: u64,
    leeway_secs: i64,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_secs: u64, leeway_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
            leeway_secs: leeway_secs as i64,
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Issue an access token for `client_id`, valid for the configured
    /// TTL starting now.
    pub fn issue(&self, client_id: &str) -> Result<IssuedToken> {
        self.issue_at(client_id, unix_now())
    }

    pub fn issue_at(&self, client_id: &str, now: i64) -> Result<IssuedToken> {
        let claims = Claims {
            sub: client_id.to_owned(),
            client_id: client_id.to_owned(),
            iat: now,
            exp: now + self.ttl_secs as i64,
            token_type: "access".into(),
        };
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| Error::Auth(format!("token encoding failed: {e}")))?;
        Ok(IssuedToken {
            token,
            expires_in: self.ttl_secs,
        })
    }

    /// Verify a token and return its claims.
    pub fn verify(&self, token: &str) -> std::result::Result<Claims, TokenError> {
        self.verify_at(token, unix_now())
    }

    /// Lifetime checks are done by hand against `now` so the
    /// `exp + leeway` boundary rejects exactly.
    pub fn verify_at(&self, token: &str, now: i64) -> std::result::Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| TokenError::Invalid)?;
        let claims = data.claims;

        if claims.token_type != "access" || claims.exp <= claims.iat {
            return Err(TokenError::Invalid);
        }
        if claims.iat > now + self.leeway_secs {
            return Err(TokenError::Invalid);
        }
        if now >= claims.exp + self.leeway_secs {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test-secret", 1200, 300)
    }

    #[test]
    fn issue_then_verify_roundtrip() {
        let iss = issuer();
        let t = iss.issue_at("desktop-main", 1_700_000_000).expect("issue");
        assert_eq!(t.expires_in, 1200);

        let claims = iss.verify_at(&t.token, 1_700_000_000).expect("verify");
        assert_eq!(claims.client_id, "desktop-main");
        assert_eq!(claims.sub, "desktop-main");
        assert_eq!(claims.token_type, "access");
        assert_eq!(claims.exp, claims.iat + 1200);
    }

    #[test]
    fn expired_within_leeway_still_accepted() {
        let iss = issuer();
        let t = iss.issue_at("cli", 1_700_000_000).expect("issue");
        // exp = iat + 1200; leeway 300 keeps it alive until exp + 299.
        assert!(iss.verify_at(&t.token, 1_700_000_000 + 1200 + 299).is_ok());
    }

    #[test]
    fn rejected_exactly_at_exp_plus_leeway() {
        let iss = issuer();
        let t = iss.issue_at("cli", 1_700_000_000).expect("issue");
        let err = iss
            .verify_at(&t.token, 1_700_000_000 + 1200 + 300)
            .expect_err("past leeway");
        assert_eq!(err, TokenError::Expired);
    }

    #[test]
    fn garbage_and_wrong_secret_are_invalid() {
        let iss = issuer();
        assert_eq!(iss.verify("not.a.token").unwrap_err(), TokenError::Invalid);

        let other = TokenIssuer::new("different-secret", 1200, 300);
        let t = other.issue_at("cli", 1_700_000_000).expect("issue");
        assert_eq!(
            iss.verify_at(&t.token, 1_700_000_000).unwrap_err(),
            TokenError::Invalid
        );
    }

    #[test]
    fn future_issued_token_outside_leeway_is_invalid() {
        let iss = issuer();
        let t = iss.issue_at("cli", 1_700_001_000).expect("issue");
        assert_eq!(
            iss.verify_at(&t.token, 1_700_000_000).unwrap_err(),
            TokenError::Invalid
        );
        // Within the skew window it passes.
        assert!(iss.verify_at(&t.token, 1_700_000_701).is_ok());
    }
}
