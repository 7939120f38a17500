//! Configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `CART_API_BASE_URL` - Base URL of the cart REST service. When unset the
//!   in-process server cart is used.
//! - `CART_API_TOKEN` - Bearer token identifying the authenticated session
//! - `CART_API_TIMEOUT_SECS` - Request timeout (default: 10)
//! - `CART_STORE_DIR` - Directory of the local cart document (default: `.cart`)
//! - `CART_STORE_KEY` - Name of the local cart document (default: `cart`)
//! - `CART_USER_ID` - User the in-process server cart acts for (default: `demo-user`)

use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

use crate::store::DEFAULT_STORE_KEY;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_STORE_DIR: &str = ".cart";
const DEFAULT_USER_ID: &str = "demo-user";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart engine configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Remote cart service, if any
    pub api: Option<ApiConfig>,
    /// Directory holding the local cart document
    pub store_dir: PathBuf,
    /// Local cart document name
    pub store_key: String,
    /// User id for the in-process server cart
    pub user_id: String,
}

/// Remote cart REST service configuration.
#[derive(Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: Option<SecretString>,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            api: None,
            store_dir: PathBuf::from(DEFAULT_STORE_DIR),
            store_key: DEFAULT_STORE_KEY.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
        }
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let api = match get("CART_API_BASE_URL") {
            Some(base_url) => {
                let timeout_secs = match get("CART_API_TIMEOUT_SECS") {
                    Some(raw) => parse_timeout(&raw)?,
                    None => DEFAULT_TIMEOUT_SECS,
                };
                Some(ApiConfig {
                    base_url,
                    token: get("CART_API_TOKEN").map(SecretString::from),
                    timeout_secs,
                })
            }
            None => None,
        };

        Ok(Self {
            api,
            store_dir: get("CART_STORE_DIR").map_or(defaults.store_dir, PathBuf::from),
            store_key: get("CART_STORE_KEY").unwrap_or(defaults.store_key),
            user_id: get("CART_USER_ID").unwrap_or(defaults.user_id),
        })
    }
}

fn parse_timeout(raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidEnvVar(
            "CART_API_TIMEOUT_SECS".into(),
            "must be greater than zero".into(),
        )),
        Ok(secs) => Ok(secs),
        Err(e) => Err(ConfigError::InvalidEnvVar(
            "CART_API_TIMEOUT_SECS".into(),
            e.to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<CartConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        CartConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_api() {
        let config = load(&[]).unwrap();
        assert!(config.api.is_none());
        assert_eq!(config.store_dir, PathBuf::from(".cart"));
        assert_eq!(config.store_key, "cart");
        assert_eq!(config.user_id, "demo-user");
    }

    #[test]
    fn test_api_settings() {
        let config = load(&[
            ("CART_API_BASE_URL", "https://shop.example.com/api"),
            ("CART_API_TOKEN", "tok"),
            ("CART_API_TIMEOUT_SECS", "3"),
            ("CART_STORE_KEY", "guest"),
        ])
        .unwrap();
        let api = config.api.unwrap();
        assert_eq!(api.base_url, "https://shop.example.com/api");
        assert_eq!(api.timeout_secs, 3);
        assert!(api.token.is_some());
        assert!(!format!("{api:?}").contains("tok\""));
        assert_eq!(config.store_key, "guest");
    }

    #[test]
    fn test_invalid_timeout() {
        let err = load(&[
            ("CART_API_BASE_URL", "https://shop.example.com"),
            ("CART_API_TIMEOUT_SECS", "soon"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(name, _) if name == "CART_API_TIMEOUT_SECS"));

        assert!(load(&[
            ("CART_API_BASE_URL", "https://shop.example.com"),
            ("CART_API_TIMEOUT_SECS", "0"),
        ])
        .is_err());
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = load(&[("CART_API_BASE_URL", "  "), ("CART_STORE_DIR", "")]).unwrap();
        assert!(config.api.is_none());
        assert_eq!(config.store_dir, PathBuf::from(".cart"));
    }
}
