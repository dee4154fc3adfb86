//! Catalog listing.

use beelivery_core::CategoryFilter;
use beelivery_storefront::Catalog;
use beelivery_storefront::views::ProductCardView;
use tracing::info;

use super::{Storefront, find_product};

/// List products matching `query` in `filter`, then the cart badge.
pub fn list(app: &Storefront, query: &str, filter: CategoryFilter) {
    let catalog = Catalog::builtin();
    let products = catalog.search(query, filter);

    if products.is_empty() {
        info!("No products found.");
    }
    for product in products {
        let card = ProductCardView::new(product, app.config.currency);
        info!(id = %card.id, category = %card.category, "{} - {}", card.name, card.price);
    }

    info!(items = app.context.total_count(), "Cart");
}

/// Show one product as a notice.
///
/// # Errors
///
/// Returns an error if `id` is malformed or not in the catalog.
pub fn show(app: &Storefront, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    app.context.view_product(&find_product(id)?);
    Ok(())
}
