//! Fixtures shared by gate and handler tests.

use crate::services::auth_service::Authenticators;
use crate::services::identity_service::tests::{id_token, preloaded_verifier};
use crate::services::session_service::SessionTokens;
use serde_json::json;
use std::sync::Arc;

pub const TEST_SECRET: &str = "test-session-secret";

/// Both schemes wired with test keys; the identity provider is never contacted.
pub fn test_authenticators() -> Authenticators {
    Authenticators::new(
        Arc::new(preloaded_verifier()),
        Arc::new(SessionTokens::new(TEST_SECRET)),
    )
}

pub fn identity_token(email: &str) -> String {
    id_token(email)
}

pub fn session_token(email: &str) -> String {
    SessionTokens::new(TEST_SECRET)
        .issue(json!({ "email": email }).as_object().cloned().unwrap_or_default())
        .unwrap()
}
