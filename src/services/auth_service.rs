//! Bearer-credential gate shared by every guarded operation.
//!
//! Two trust domains exist and they are never interchangeable: ID tokens
//! from the identity provider, and session tokens this service signs itself.
//! Each operation picks one [`TrustScheme`] at routing time.

use crate::services::session_service::SessionTokens;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer credential")]
    MissingCredential,
    #[error("invalid credential: {0}")]
    InvalidCredential(String),
    #[error("identity provider unavailable: {0}")]
    Authority(String),
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// The authenticated caller, identified by email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustScheme {
    /// ID tokens minted by the external identity provider.
    IdentityProvider,
    /// Session tokens minted by `POST /getToken`.
    Session,
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Principal, AuthError>;
}

/// Verifiers for both trust schemes, shared as application data.
pub struct Authenticators {
    identity: Arc<dyn TokenVerifier>,
    sessions: Arc<SessionTokens>,
}

impl Authenticators {
    pub fn new(identity: Arc<dyn TokenVerifier>, sessions: Arc<SessionTokens>) -> Self {
        Self { identity, sessions }
    }

    pub fn sessions(&self) -> &SessionTokens {
        &self.sessions
    }

    /// Checks the raw `Authorization` header value against `scheme`.
    pub async fn authenticate(
        &self,
        scheme: TrustScheme,
        authorization: Option<&str>,
    ) -> Result<Principal, AuthError> {
        let token = bearer_token(authorization)?;
        match scheme {
            TrustScheme::IdentityProvider => self.identity.verify(token).await,
            TrustScheme::Session => self.sessions.verify(token).await,
        }
    }
}

/// Splits `Bearer <token>` and returns the token.
pub fn bearer_token(authorization: Option<&str>) -> Result<&str, AuthError> {
    let header = authorization.map(str::trim).ok_or(AuthError::MissingCredential)?;
    let (scheme, token) = header.split_once(' ').ok_or(AuthError::MissingCredential)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidCredential(format!(
            "unsupported authorization scheme {}",
            scheme
        )));
    }

    match token.trim() {
        "" => Err(AuthError::MissingCredential),
        token => Ok(token),
    }
}
