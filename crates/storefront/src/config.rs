//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `BEELIVERY_DATA_DIR` - Directory of the file-backed store (default: .beelivery)
//! - `BEELIVERY_CART_KEY` - Key of the cart record (default: beelivery_cart_v1)
//! - `BEELIVERY_THEME_KEY` - Key of the theme record (default: beelivery_theme_v1)
//! - `BEELIVERY_CHECKOUT_URL` - Link opened at checkout (default: <https://wa.link/nazqhe>)
//! - `BEELIVERY_CURRENCY` - Display currency code (default: BRL)
//! - `BEELIVERY_NOTICE_MS` - How long notices stay visible, in milliseconds (default: 1400)

use std::path::PathBuf;
use std::time::Duration;

use beelivery_core::CurrencyCode;
use thiserror::Error;
use url::Url;

use crate::store::{self, RecordKeys};

const DEFAULT_DATA_DIR: &str = ".beelivery";
const DEFAULT_CART_KEY: &str = "beelivery_cart_v1";
const DEFAULT_THEME_KEY: &str = "beelivery_theme_v1";
const DEFAULT_CHECKOUT_URL: &str = "https://wa.link/nazqhe";
const DEFAULT_NOTICE_MS: u64 = 1400;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Cart and theme records cannot share the key {0:?}")]
    DuplicateKey(String),
}

/// Storefront widget configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Directory of the file-backed store
    pub data_dir: PathBuf,
    /// Keys of the cart and theme records
    pub keys: RecordKeys,
    /// Link returned by checkout
    pub checkout_url: Url,
    /// Currency used when formatting prices
    pub currency: CurrencyCode,
    /// How long a notice stays visible
    pub notice_duration: Duration,
}

impl StorefrontConfig {
    /// The built-in defaults, ignoring the environment.
    ///
    /// # Errors
    ///
    /// Same as [`StorefrontConfig::from_lookup`].
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::from_lookup(|_| None)
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid, or if the
    /// cart and theme keys collide.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Same as [`StorefrontConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let data_dir = PathBuf::from(get_or("BEELIVERY_DATA_DIR", DEFAULT_DATA_DIR));

        let cart = validated_key(
            "BEELIVERY_CART_KEY",
            get_or("BEELIVERY_CART_KEY", DEFAULT_CART_KEY),
        )?;
        let theme = validated_key(
            "BEELIVERY_THEME_KEY",
            get_or("BEELIVERY_THEME_KEY", DEFAULT_THEME_KEY),
        )?;
        if cart == theme {
            return Err(ConfigError::DuplicateKey(cart));
        }

        let checkout_url =
            parse_checkout_url(&get_or("BEELIVERY_CHECKOUT_URL", DEFAULT_CHECKOUT_URL))?;

        let currency = get_or("BEELIVERY_CURRENCY", CurrencyCode::default().code())
            .parse::<CurrencyCode>()
            .map_err(|e| ConfigError::InvalidEnvVar("BEELIVERY_CURRENCY".to_string(), e))?;

        let notice_ms = get_or("BEELIVERY_NOTICE_MS", &DEFAULT_NOTICE_MS.to_string())
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("BEELIVERY_NOTICE_MS".to_string(), e.to_string())
            })?;

        Ok(Self {
            data_dir,
            keys: RecordKeys { cart, theme },
            checkout_url,
            currency,
            notice_duration: Duration::from_millis(notice_ms),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Validate a record key against the store's key rules.
fn validated_key(var_name: &str, key: String) -> Result<String, ConfigError> {
    store::validate_key(&key)
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;
    Ok(key)
}

/// Parse the checkout link; only http and https are accepted.
fn parse_checkout_url(value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|e| {
        ConfigError::InvalidEnvVar("BEELIVERY_CHECKOUT_URL".to_string(), e.to_string())
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidEnvVar(
            "BEELIVERY_CHECKOUT_URL".to_string(),
            format!("unsupported scheme '{other}'"),
        )),
    }
}
