use crate::services::auth_service::{AuthError, Principal, TokenVerifier};
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Map, Value};

/// Session tokens are valid for one hour and are never refreshed.
pub const SESSION_TTL_SECS: i64 = 60 * 60;

/// Issues and verifies locally-signed session tokens (HS256).
///
/// Issuing is a self-asserted login: whatever claims the caller sends are
/// signed as-is, with `iat`/`exp` stamped by the server.
pub struct SessionTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SessionTokens {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn issue(&self, claims: Map<String, Value>) -> Result<String, AuthError> {
        self.issue_at(claims, Utc::now().timestamp())
    }

    fn issue_at(&self, mut claims: Map<String, Value>, issued_at: i64) -> Result<String, AuthError> {
        claims.insert("iat".to_string(), Value::from(issued_at));
        claims.insert("exp".to_string(), Value::from(issued_at + SESSION_TTL_SECS));

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }
}

#[async_trait]
impl TokenVerifier for SessionTokens {
    async fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Claims are caller-chosen; an `aud` among them carries no meaning here.
        validation.validate_aud = false;

        let data = decode::<Map<String, Value>>(token, &self.decoding, &validation)
            .map_err(|e| AuthError::InvalidCredential(e.to_string()))?;

        let email = data
            .claims
            .get("email")
            .and_then(Value::as_str)
            .filter(|email| !email.is_empty())
            .ok_or_else(|| AuthError::InvalidCredential("session token carries no email".to_string()))?;

        Ok(Principal {
            email: email.to_string(),
        })
    }
}
