//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CORALCART_API_URL` - Base URL of the remote commerce gateway
//!   (e.g. `https://api.example.com/api`)
//!
//! ## Optional
//! - `CORALCART_DATA_DIR` - Directory for persisted client state: local
//!   cart, auth token, user record (default: `.coralcart`)
//! - `CORALCART_SERVER_CART` - Prefer the server-backed cart for
//!   authenticated sessions (default: `true`)

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Base URL of the remote commerce gateway.
    pub api_base_url: Url,
    /// Directory for persisted client-side state.
    pub data_dir: PathBuf,
    /// Whether authenticated sessions use the server-backed cart.
    pub prefer_server_cart: bool,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from a `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = get_required_env("CORALCART_API_URL")?
            .parse::<Url>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("CORALCART_API_URL".to_string(), e.to_string())
            })?;

        let data_dir = PathBuf::from(get_env_or_default("CORALCART_DATA_DIR", ".coralcart"));

        let prefer_server_cart = parse_bool(&get_env_or_default("CORALCART_SERVER_CART", "true"))
            .ok_or_else(|| {
            ConfigError::InvalidEnvVar(
                "CORALCART_SERVER_CART".to_string(),
                "expected true/false".to_string(),
            )
        })?;

        Ok(Self {
            api_base_url,
            data_dir,
            prefer_server_cart,
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

/// Parse the usual boolean spellings.
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
