//! Persistent key-value storage and the record adapter.
//!
//! A [`KeyValueStore`] holds string values under string keys with
//! full-record overwrite semantics. [`RecordStore`] layers the two logical
//! records on top of it:
//!
//! - the cart, a JSON array of lines
//! - the theme, the literal `light` or `dark`
//!
//! Reads are tolerant: a missing, unreadable, or structurally invalid record
//! yields the default value (empty cart, light theme) and never an error.

mod file;
mod memory;

use std::fmt;
use std::sync::Arc;

use beelivery_core::{Cart, Theme};
use thiserror::Error;
use tracing::{debug, warn};

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::{Result, StoreError};

/// Maximum length of a store key.
pub const MAX_KEY_LENGTH: usize = 128;

/// A durable string key-value store shared by every context of a scope.
///
/// `set` replaces the whole value; a concurrent `get` observes either the
/// previous or the new value, never a partial write.
pub trait KeyValueStore: Send + Sync + fmt::Debug {
    /// Read the value stored under `key`, or `None` if the key is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Check that `key` can be stored by every backend.
///
/// Keys are 1-128 characters of `[A-Za-z0-9_.-]` and do not start with `.`.
///
/// # Errors
///
/// Returns `StoreError::InvalidKey` otherwise.
pub fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key.len() <= MAX_KEY_LENGTH
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

/// Keys of the two logical records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordKeys {
    pub cart: String,
    pub theme: String,
}

impl Default for RecordKeys {
    fn default() -> Self {
        Self {
            cart: "beelivery_cart_v1".to_string(),
            theme: "beelivery_theme_v1".to_string(),
        }
    }
}

/// Why a stored record was discarded.
#[derive(Debug, Error)]
enum RecordError {
    #[error("malformed cart record: {0}")]
    Cart(#[from] serde_json::Error),
    #[error("unknown theme {0:?}")]
    Theme(String),
}

/// Typed access to the cart and theme records.
#[derive(Debug, Clone)]
pub struct RecordStore {
    backend: Arc<dyn KeyValueStore>,
    keys: RecordKeys,
}

impl RecordStore {
    #[must_use]
    pub fn new(backend: Arc<dyn KeyValueStore>, keys: RecordKeys) -> Self {
        Self { backend, keys }
    }

    #[must_use]
    pub const fn keys(&self) -> &RecordKeys {
        &self.keys
    }

    /// Read the cart, falling back to an empty cart.
    #[must_use]
    pub fn read_cart(&self) -> Cart {
        self.read_record(&self.keys.cart, |raw| Ok(serde_json::from_str(raw)?))
    }

    /// Overwrite the cart record.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails.
    pub fn write_cart(&self, cart: &Cart) -> Result<()> {
        let raw = serde_json::to_string(cart)?;
        self.backend.set(&self.keys.cart, &raw)
    }

    /// Read the theme, falling back to light.
    #[must_use]
    pub fn read_theme(&self) -> Theme {
        self.read_record(&self.keys.theme, |raw| {
            raw.trim()
                .parse::<Theme>()
                .map_err(|_| RecordError::Theme(raw.to_string()))
        })
    }

    /// Overwrite the theme record.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails.
    pub fn write_theme(&self, theme: Theme) -> Result<()> {
        self.backend.set(&self.keys.theme, theme.as_str())
    }

    fn read_record<T: Default>(
        &self,
        key: &str,
        parse: impl FnOnce(&str) -> std::result::Result<T, RecordError>,
    ) -> T {
        let raw = match self.backend.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key, "Record absent, using default");
                return T::default();
            }
            Err(e) => {
                warn!(key, error = %e, "Failed to read record, using default");
                return T::default();
            }
        };

        parse(&raw).unwrap_or_else(|e| {
            warn!(key, error = %e, "Discarding unreadable record");
            T::default()
        })
    }
}
