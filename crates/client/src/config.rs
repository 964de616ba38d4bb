//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MERCADITO_API_BASE_URL` - Base URL of the Mercadito REST backend
//!
//! ## Optional
//! - `MERCADITO_DATA_DIR` - Directory for durable local state
//!   (default: `.mercadito`)
//! - `MERCADITO_REQUEST_TIMEOUT_SECS` - Per-request HTTP timeout (default: 30)
//! - `MERCADITO_CATEGORY_TTL_SECS` - Category/subcategory cache TTL
//!   (default: 600; categories change rarely)
//! - `MERCADITO_PRODUCT_TTL_SECS` - Product cache TTL (default: 300)
//! - `MERCADITO_PRODUCT_CACHE_CAPACITY` - Max entries per product cache
//!   (default: 50)
//! - `MERCADITO_CATEGORY_CACHE_CAPACITY` - Max entries per category cache
//!   (default: 50)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_DATA_DIR: &str = ".mercadito";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CATEGORY_TTL_SECS: u64 = 600;
const DEFAULT_PRODUCT_TTL_SECS: u64 = 300;
const DEFAULT_CACHE_CAPACITY: usize = 50;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST backend (e.g., `https://api.example.com/api/v1/`)
    pub api_base_url: Url,
    /// Directory holding the durable key-value store
    pub data_dir: PathBuf,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
    /// TTL for category and subcategory lookups
    pub category_ttl: Duration,
    /// TTL for product listing and detail lookups
    pub product_ttl: Duration,
    /// Max entries in each product cache (listings, details)
    pub product_cache_capacity: usize,
    /// Max entries in each category cache
    pub category_cache_capacity: usize,
}

impl ClientConfig {
    /// Create a configuration with defaults for everything but the base URL.
    #[must_use]
    pub fn new(api_base_url: Url) -> Self {
        Self {
            api_base_url,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            category_ttl: Duration::from_secs(DEFAULT_CATEGORY_TTL_SECS),
            product_ttl: Duration::from_secs(DEFAULT_PRODUCT_TTL_SECS),
            product_cache_capacity: DEFAULT_CACHE_CAPACITY,
            category_cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or any
    /// variable fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = get_required_env("MERCADITO_API_BASE_URL")?
            .parse::<Url>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("MERCADITO_API_BASE_URL".to_string(), e.to_string())
            })?;

        let data_dir = PathBuf::from(get_env_or_default("MERCADITO_DATA_DIR", DEFAULT_DATA_DIR));

        let request_timeout =
            Duration::from_secs(get_parsed_or_default("MERCADITO_REQUEST_TIMEOUT_SECS", {
                DEFAULT_REQUEST_TIMEOUT_SECS
            })?);
        let category_ttl =
            Duration::from_secs(get_parsed_or_default("MERCADITO_CATEGORY_TTL_SECS", {
                DEFAULT_CATEGORY_TTL_SECS
            })?);
        let product_ttl = Duration::from_secs(get_parsed_or_default(
            "MERCADITO_PRODUCT_TTL_SECS",
            DEFAULT_PRODUCT_TTL_SECS,
        )?);

        let product_cache_capacity = get_parsed_or_default(
            "MERCADITO_PRODUCT_CACHE_CAPACITY",
            DEFAULT_CACHE_CAPACITY,
        )?;
        let category_cache_capacity = get_parsed_or_default(
            "MERCADITO_CATEGORY_CACHE_CAPACITY",
            DEFAULT_CACHE_CAPACITY,
        )?;

        Ok(Self {
            api_base_url,
            data_dir,
            request_timeout,
            category_ttl,
            product_ttl,
            product_cache_capacity,
            category_cache_capacity,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get an environment variable parsed to `T`, falling back to a default when
/// the variable is unset.
fn get_parsed_or_default<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("https://api.example.com/v1/".parse().unwrap());
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.category_ttl, Duration::from_secs(600));
        assert_eq!(config.product_ttl, Duration::from_secs(300));
        assert_eq!(config.product_cache_capacity, 50);
        assert_eq!(config.data_dir, PathBuf::from(".mercadito"));
    }

    #[test]
    fn test_category_ttl_longer_than_product_ttl() {
        // Categories change less often than products; the defaults encode that.
        let config = ClientConfig::new("https://api.example.com/v1/".parse().unwrap());
        assert!(config.category_ttl > config.product_ttl);
    }
}
