//! Display data for external renderers.
//!
//! Prices are pre-formatted in the configured currency so renderers only
//! place strings.

use beelivery_core::{CartLine, CurrencyCode, Product, Theme};

use crate::hooks::CartSummary;

/// Cart item display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItemView {
    pub id: String,
    pub name: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
    pub image: String,
}

/// Cart display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u64,
}

impl CartView {
    /// Build the view from a freshly read summary.
    #[must_use]
    pub fn new(summary: &CartSummary, currency: CurrencyCode) -> Self {
        Self {
            items: summary
                .cart
                .lines()
                .iter()
                .map(|line| CartItemView::new(line, currency))
                .collect(),
            subtotal: summary.total_price.format(currency),
            item_count: summary.total_count,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl CartItemView {
    #[must_use]
    pub fn new(line: &CartLine, currency: CurrencyCode) -> Self {
        Self {
            id: line.id.to_string(),
            name: line.name.clone(),
            quantity: line.quantity,
            price: line.price.format(currency),
            line_price: line.line_total().format(currency),
            image: line.image_ref.clone(),
        }
    }
}

/// Catalog card display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCardView {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: String,
    pub image: String,
}

impl ProductCardView {
    #[must_use]
    pub fn new(product: &Product, currency: CurrencyCode) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            category: product.category.to_string(),
            price: product.price.format(currency),
            image: product.image_ref.clone(),
        }
    }
}

/// Icon of the theme toggle: offers the sun while dark, the moon while light.
#[must_use]
pub const fn theme_icon(theme: Theme) -> &'static str {
    match theme {
        Theme::Dark => "☀️",
        Theme::Light => "🌙",
    }
}
