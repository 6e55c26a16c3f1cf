//! Bearer-JWT validation for the admission API (spec §6).

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("token has expired")]
    Expired,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("invalid token: {0}")]
    Invalid(String),
}

/// Minimal claim set; only `sub` is consumed, bound to the request-scoped
/// user id (spec §6: "claim `sub` is bound to request-scoped `USER_ID`").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
}

pub fn validate_token(token: &str, secret: &[u8]) -> Result<Claims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
            jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
            _ => JwtError::Invalid(e.to_string()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn sign(secret: &[u8], sub: &str, exp: i64) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &Claims {
                sub: sub.to_string(),
                exp,
            },
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_token_round_trips_sub() {
        let secret = b"test-secret";
        let token = sign(secret, "user-123", (Utc::now().timestamp()) + 3600);
        let claims = validate_token(&token, secret).unwrap();
        assert_eq!(claims.sub, "user-123");
    }

    #[test]
    fn test_expired_token_rejected() {
        let secret = b"test-secret";
        let token = sign(secret, "user-123", Utc::now().timestamp() - 3600);
        assert!(matches!(
            validate_token(&token, secret),
            Err(JwtError::Expired)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = sign(b"secret-a", "user-123", Utc::now().timestamp() + 3600);
        assert!(matches!(
            validate_token(&token, b"secret-b"),
            Err(JwtError::InvalidSignature)
        ));
    }
}
