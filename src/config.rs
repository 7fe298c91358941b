//! Process configuration, read from the environment (and `.env` via dotenv).

use crate::services::identity_service::GOOGLE_SECURETOKEN_KEYS_URL;
use base64::Engine;
use serde::Deserialize;
use thiserror::Error;

const MEMORY_STORE_SCHEME: &str = "memory://";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreConfig {
    Mongo { uri: String, db_name: String },
    /// Non-persistent store for local runs.
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub store: StoreConfig,
    pub jwt_secret: String,
    pub firebase_project_id: String,
    pub firebase_keys_url: String,
    pub cors_allowed_origins: Vec<String>,
}

/// The subset of a service-account key this service reads.
#[derive(Deserialize)]
struct ServiceAccount {
    project_id: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match get("PORT") {
            Some(port) => port.parse::<u16>().map_err(|e| ConfigError::Invalid {
                key: "PORT",
                reason: e.to_string(),
            })?,
            None => 3000,
        };

        let db_name = get("DB_NAME").unwrap_or_else(|| "smart_deals".to_string());
        let store = match get("DATABASE_URL") {
            Some(url) if url.starts_with(MEMORY_STORE_SCHEME) => StoreConfig::Memory,
            Some(uri) => StoreConfig::Mongo { uri, db_name },
            None => {
                let user = get("DB_USER").ok_or(ConfigError::Missing("DATABASE_URL or DB_USER"))?;
                let pass = get("DB_PASS").ok_or(ConfigError::Missing("DB_PASS"))?;
                let host = get("DB_HOST").ok_or(ConfigError::Missing("DB_HOST"))?;
                StoreConfig::Mongo {
                    uri: format!(
                        "mongodb+srv://{}:{}@{}/{}?retryWrites=true&w=majority",
                        user, pass, host, db_name
                    ),
                    db_name,
                }
            }
        };

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let firebase_project_id = match get("FIREBASE_PROJECT_ID") {
            Some(project_id) => project_id,
            None => {
                let key = get("FIREBASE_SERVICE_KEY")
                    .ok_or(ConfigError::Missing("FIREBASE_PROJECT_ID or FIREBASE_SERVICE_KEY"))?;
                project_id_from_service_key(&key)?
            }
        };

        Ok(Config {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            store,
            jwt_secret,
            firebase_project_id,
            firebase_keys_url: get("FIREBASE_KEYS_URL")
                .unwrap_or_else(|| GOOGLE_SECURETOKEN_KEYS_URL.to_string()),
            cors_allowed_origins: get("CORS_ALLOWED_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(str::trim)
                        .filter(|origin| !origin.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

/// Reads `project_id` from a base64-encoded service-account JSON key.
fn project_id_from_service_key(encoded: &str) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        key: "FIREBASE_SERVICE_KEY",
        reason,
    };

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| invalid(e.to_string()))?;
    let account: ServiceAccount = serde_json::from_slice(&decoded).map_err(|e| invalid(e.to_string()))?;

    if account.project_id.is_empty() {
        return Err(invalid("project_id is empty".to_string()));
    }
    Ok(account.project_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    const BASE: [(&str, &str); 3] = [
        ("DATABASE_URL", "mongodb://localhost:27017"),
        ("JWT_SECRET", "secret"),
        ("FIREBASE_PROJECT_ID", "smart-deals"),
    ];

    #[test]
    fn applies_defaults() {
        let config = config(&BASE).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(
            config.store,
            StoreConfig::Mongo {
                uri: "mongodb://localhost:27017".to_string(),
                db_name: "smart_deals".to_string()
            }
        );
        assert_eq!(config.firebase_keys_url, GOOGLE_SECURETOKEN_KEYS_URL);
        assert!(config.cors_allowed_origins.is_empty());
    }

    #[test]
    fn assembles_atlas_uri_from_parts() {
        let config = config(&[
            ("DB_USER", "app"),
            ("DB_PASS", "pw"),
            ("DB_HOST", "cluster0.example.mongodb.net"),
            ("DB_NAME", "market"),
            ("JWT_SECRET", "secret"),
            ("FIREBASE_PROJECT_ID", "smart-deals"),
        ])
        .unwrap();

        assert_eq!(
            config.store,
            StoreConfig::Mongo {
                uri: "mongodb+srv://app:pw@cluster0.example.mongodb.net/market?retryWrites=true&w=majority"
                    .to_string(),
                db_name: "market".to_string()
            }
        );
    }

    #[test]
    fn memory_url_selects_memory_store() {
        let mut vars = BASE.to_vec();
        vars[0] = ("DATABASE_URL", "memory://");
        assert_eq!(config(&vars).unwrap().store, StoreConfig::Memory);
    }

    #[test]
    fn reads_project_id_from_service_key() {
        let key = base64::engine::general_purpose::STANDARD
            .encode(r#"{"type":"service_account","project_id":"from-key","private_key_id":"abc"}"#);
        let config = config(&[
            ("DATABASE_URL", "memory://"),
            ("JWT_SECRET", "secret"),
            ("FIREBASE_SERVICE_KEY", key.as_str()),
        ])
        .unwrap();

        assert_eq!(config.firebase_project_id, "from-key");
    }

    #[test]
    fn splits_cors_origins() {
        let mut vars = BASE.to_vec();
        vars.push(("CORS_ALLOWED_ORIGINS", "http://localhost:5173, https://deals.example.com,"));

        assert_eq!(
            config(&vars).unwrap().cors_allowed_origins,
            vec!["http://localhost:5173", "https://deals.example.com"]
        );
    }

    #[rstest]
    #[case("JWT_SECRET")]
    #[case("FIREBASE_PROJECT_ID")]
    #[case("DATABASE_URL")]
    fn missing_required_values_fail(#[case] removed: &str) {
        let vars: Vec<_> = BASE.iter().copied().filter(|(k, _)| *k != removed).collect();
        assert!(matches!(config(&vars), Err(ConfigError::Missing(_))));
    }

    #[test]
    fn rejects_bad_port_and_service_key() {
        let mut vars = BASE.to_vec();
        vars.push(("PORT", "eighty"));
        assert!(matches!(config(&vars), Err(ConfigError::Invalid { key: "PORT", .. })));

        let broken = config(&[
            ("DATABASE_URL", "memory://"),
            ("JWT_SECRET", "secret"),
            ("FIREBASE_SERVICE_KEY", "%%%not-base64%%%"),
        ]);
        assert!(matches!(broken, Err(ConfigError::Invalid { key: "FIREBASE_SERVICE_KEY", .. })));
    }
}
