//! Cart commands.

use beelivery_core::{ProductId, QuantityChange, QuantityOutcome};
use beelivery_storefront::views::CartView;
use tracing::{info, warn};

use super::{Storefront, find_product, render_cart};

/// Show the cart.
pub fn show(app: &Storefront) {
    render_cart(&CartView::new(
        &app.context.cart_summary(),
        app.config.currency,
    ));
}

/// Add one unit of the catalog product `id`.
///
/// # Errors
///
/// Returns an error if `id` is malformed or not in the catalog.
pub fn add(app: &Storefront, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    app.context.add_item(&find_product(id)?);
    show(app);
    Ok(())
}

/// Apply a quantity change to the line for `id`.
///
/// # Errors
///
/// Returns an error if `id` is malformed.
pub fn change(
    app: &Storefront,
    id: &str,
    change: QuantityChange,
) -> Result<(), Box<dyn std::error::Error>> {
    let id = ProductId::parse(id)?;
    match app.context.change_quantity(&id, change) {
        QuantityOutcome::Missing => warn!(product_id = %id, "Product is not in the cart"),
        QuantityOutcome::Updated(quantity) => {
            info!(product_id = %id, quantity, "Quantity updated");
        }
        QuantityOutcome::Removed => info!(product_id = %id, "Removed from cart"),
    }
    show(app);
    Ok(())
}

/// Empty the cart.
pub fn clear(app: &Storefront) {
    app.context.clear_cart();
    show(app);
}

/// Empty the cart and print where to continue.
pub fn checkout(app: &Storefront) {
    let summary = app.context.cart_summary();
    if summary.cart.is_empty() {
        warn!("Checking out an empty cart");
    } else {
        info!(
            items = summary.total_count,
            "Order total: {}",
            summary.total_price.format(app.config.currency)
        );
    }
    let url = app.context.checkout();
    info!("Continue at {url}");
}
