//! CLI command implementations.
//!
//! Output goes through `tracing` at info level, like every other message
//! this binary prints.

pub mod cart;
pub mod catalog;
pub mod theme;
pub mod watch;

use std::sync::Arc;

use beelivery_core::{Product, ProductId};
use beelivery_storefront::views::CartView;
use beelivery_storefront::{
    BrowsingContext, Catalog, FileStore, StorageScope, StoreError, StorefrontConfig,
};
use tracing::info;

/// Errors specific to CLI commands.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown product: {0}")]
    UnknownProduct(ProductId),
}

/// One browsing context on the configured data directory.
pub struct Storefront {
    pub config: StorefrontConfig,
    pub store: FileStore,
    pub context: BrowsingContext,
}

impl Storefront {
    /// Open the file store and a context on it. Notices are logged.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created.
    pub fn open(config: StorefrontConfig) -> Result<Self, StoreError> {
        let store = FileStore::open(&config.data_dir)?;
        let scope = StorageScope::new(Arc::new(store.clone()));
        let context = BrowsingContext::open(&scope, &config);
        context.on_notice(|notice| info!("{}", notice.message));

        Ok(Self {
            config,
            store,
            context,
        })
    }
}

/// Look up `id` in the built-in catalog.
///
/// # Errors
///
/// Returns an error if `id` is malformed or not in the catalog.
pub fn find_product(id: &str) -> Result<Product, Box<dyn std::error::Error>> {
    let id = ProductId::parse(id)?;
    let product = Catalog::builtin()
        .find(&id)
        .cloned()
        .ok_or(CommandError::UnknownProduct(id))?;
    Ok(product)
}

/// Log a cart view, one line per item, then the total.
pub fn render_cart(view: &CartView) {
    if view.is_empty() {
        info!("Your cart is empty.");
        return;
    }
    for item in &view.items {
        info!(
            id = %item.id,
            "{} x{} @ {} = {}",
            item.name, item.quantity, item.price, item.line_price
        );
    }
    info!(items = view.item_count, "Total: {}", view.subtotal);
}
