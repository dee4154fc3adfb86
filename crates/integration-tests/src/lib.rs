//! Integration tests for the Beelivery storefront widget.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p beelivery-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_sync` - several contexts sharing one in-memory scope
//! - `file_store` - contexts in separate scopes over one data directory

use std::sync::Arc;
use std::time::Duration;

use beelivery_core::{Product, ProductId};
use beelivery_storefront::{BrowsingContext, Catalog, FileStore, StorageScope, StorefrontConfig};
use tokio::sync::mpsc;

/// How long a test waits for a notification to reach a listener.
pub const SYNC_TIMEOUT: Duration = Duration::from_secs(2);

/// Look up a product of the built-in catalog.
///
/// # Panics
///
/// Panics if `id` is not in the catalog.
#[must_use]
pub fn catalog_product(id: &str) -> Product {
    let id = ProductId::parse(id).expect("valid product id");
    Catalog::builtin()
        .find(&id)
        .cloned()
        .expect("product in built-in catalog")
}

/// A file-backed scope over `dir`, standing in for one process.
///
/// # Panics
///
/// Panics if the directory cannot be opened.
#[must_use]
pub fn file_scope(dir: &std::path::Path) -> StorageScope {
    let store = FileStore::open(dir).expect("open file store");
    StorageScope::new(Arc::new(store))
}

/// Open a context with the default configuration.
///
/// # Panics
///
/// Panics if the built-in defaults do not validate.
#[must_use]
pub fn open_context(scope: &StorageScope) -> BrowsingContext {
    let config = StorefrontConfig::defaults().expect("default configuration");
    BrowsingContext::open(scope, &config)
}

/// Forward every cart total count reported by `context`'s hooks.
#[must_use]
pub fn cart_counts(context: &BrowsingContext) -> mpsc::UnboundedReceiver<u64> {
    let (tx, rx) = mpsc::unbounded_channel();
    context.on_cart_changed(move |summary| {
        let _ = tx.send(summary.total_count);
    });
    rx
}

/// Wait until `rx` reports `expected`, skipping earlier values.
///
/// # Panics
///
/// Panics if `expected` does not arrive within [`SYNC_TIMEOUT`].
pub async fn wait_for<T: PartialEq + std::fmt::Debug>(
    rx: &mut mpsc::UnboundedReceiver<T>,
    expected: T,
) {
    let result = tokio::time::timeout(SYNC_TIMEOUT, async {
        while let Some(value) = rx.recv().await {
            if value == expected {
                return;
            }
        }
        panic!("channel closed before {expected:?} arrived");
    })
    .await;
    assert!(result.is_ok(), "timed out waiting for {expected:?}");
}
