//! Verification of identity-provider ID tokens (Firebase Authentication).
//!
//! Tokens are RS256 JWTs signed with one of the provider's rotating keys,
//! published as a JWK set. Keys are cached for as long as the key endpoint's
//! `Cache-Control: max-age` allows. A token naming an unknown `kid` triggers
//! a refresh at most once per minute; otherwise it is rejected outright.

use crate::services::auth_service::{AuthError, Principal, TokenVerifier};
use async_trait::async_trait;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::header::{HeaderMap, CACHE_CONTROL};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

pub const GOOGLE_SECURETOKEN_KEYS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const ISSUER_PREFIX: &str = "https://securetoken.google.com/";
const DEFAULT_KEYS_TTL: Duration = Duration::from_secs(60 * 60);
const UNKNOWN_KID_REFETCH_COOLDOWN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct IdentityClaims {
    sub: String,
    email: Option<String>,
}

/// Fetched key set. `last_fetch` is the most recent fetch attempt.
#[derive(Default)]
struct KeyCache {
    keys: Option<JwkSet>,
    expires_at: Option<Instant>,
    last_fetch: Option<Instant>,
}

impl KeyCache {
    fn is_fresh(&self) -> bool {
        self.expires_at.is_some_and(|at| at > Instant::now())
    }

    fn key(&self, kid: &str) -> Option<&Jwk> {
        self.keys.as_ref()?.find(kid)
    }

    /// Refetching for an unknown `kid` is allowed once per cooldown.
    fn may_refetch(&self, cooldown: Duration) -> bool {
        self.last_fetch.map_or(true, |at| at.elapsed() >= cooldown)
    }
}

pub struct FirebaseVerifier {
    project_id: String,
    keys_url: String,
    http: reqwest::Client,
    cache: RwLock<KeyCache>,
}

impl FirebaseVerifier {
    pub fn new(project_id: impl Into<String>, keys_url: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            keys_url: keys_url.into(),
            http: reqwest::Client::new(),
            cache: RwLock::new(KeyCache::default()),
        }
    }

    fn issuer(&self) -> String {
        format!("{}{}", ISSUER_PREFIX, self.project_id)
    }

    async fn signing_key(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        {
            let cache = self.cache.read().await;
            if cache.is_fresh() {
                if let Some(jwk) = cache.key(kid) {
                    return decoding_key(jwk);
                }
            }
        }

        // Held across the fetch so concurrent misses share one request.
        let mut cache = self.cache.write().await;
        if cache.is_fresh() {
            if let Some(jwk) = cache.key(kid) {
                return decoding_key(jwk);
            }
            if !cache.may_refetch(UNKNOWN_KID_REFETCH_COOLDOWN) {
                return Err(unknown_key(kid));
            }
            cache.last_fetch = Some(Instant::now());
            // The current keys stay in place when the provider is unreachable.
            match self.fetch_keys().await {
                Ok(fetched) => *cache = fetched,
                Err(e) => {
                    log::warn!("⚠️  Signing key refresh for unknown kid failed: {}", e);
                    return Err(unknown_key(kid));
                }
            }
        } else {
            *cache = self.fetch_keys().await?;
        }
        match cache.key(kid) {
            Some(jwk) => decoding_key(jwk),
            None => Err(unknown_key(kid)),
        }
    }

    async fn fetch_keys(&self) -> Result<KeyCache, AuthError> {
        log::info!("🔑 Fetching identity provider signing keys");

        let response = self
            .http
            .get(&self.keys_url)
            .send()
            .await
            .map_err(|e| AuthError::Authority(format!("failed to fetch signing keys: {}", e)))?;

        if !response.status().is_success() {
            return Err(AuthError::Authority(format!(
                "signing key endpoint returned {}",
                response.status()
            )));
        }

        let ttl = max_age(response.headers()).unwrap_or(DEFAULT_KEYS_TTL);
        let keys: JwkSet = response
            .json()
            .await
            .map_err(|e| AuthError::Authority(format!("failed to parse signing keys: {}", e)))?;

        log::info!("✅ Loaded {} signing keys (cached for {}s)", keys.keys.len(), ttl.as_secs());

        let now = Instant::now();
        Ok(KeyCache {
            keys: Some(keys),
            expires_at: Some(now + ttl),
            last_fetch: Some(now),
        })
    }
}

fn unknown_key(kid: &str) -> AuthError {
    AuthError::InvalidCredential(format!("unknown signing key {}", kid))
}

fn decoding_key(jwk: &Jwk) -> Result<DecodingKey, AuthError> {
    DecodingKey::from_jwk(jwk).map_err(|e| AuthError::InvalidCredential(format!("unusable signing key: {}", e)))
}

fn max_age(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(CACHE_CONTROL)?
        .to_str()
        .ok()?
        .split(',')
        .find_map(|directive| directive.trim().strip_prefix("max-age=")?.parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[async_trait]
impl TokenVerifier for FirebaseVerifier {
    async fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::InvalidCredential(e.to_string()))?;

        if header.alg != Algorithm::RS256 {
            return Err(AuthError::InvalidCredential(format!(
                "unexpected token algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidCredential("token has no key id".to_string()))?;

        let key = self.signing_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.set_issuer(&[self.issuer()]);
        validation.set_required_spec_claims(&["exp", "aud", "iss", "sub"]);

        let claims = decode::<IdentityClaims>(token, &key, &validation)
            .map_err(|e| AuthError::InvalidCredential(e.to_string()))?
            .claims;

        if claims.sub.is_empty() {
            return Err(AuthError::InvalidCredential("token has an empty subject".to_string()));
        }

        let email = claims
            .email
            .filter(|email| !email.is_empty())
            .ok_or_else(|| AuthError::InvalidCredential("token carries no email".to_string()))?;

        Ok(Principal { email })
    }
}
