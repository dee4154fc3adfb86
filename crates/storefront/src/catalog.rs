//! Static product catalog with search and category filter.

use beelivery_core::{CategoryFilter, Product, ProductId};
use tracing::error;

const BUILTIN_CATALOG: &str = include_str!("../catalog.json");

/// An immutable list of products in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    #[must_use]
    pub const fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// Parse a catalog from a JSON array of products.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a product is invalid.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json).map(Self::new)
    }

    /// The storefront's built-in catalog.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_CATALOG).unwrap_or_else(|e| {
            error!(error = %e, "Built-in catalog is invalid");
            Self::default()
        })
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn find(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|product| &product.id == id)
    }

    /// Products in `filter`'s category whose name contains `query`,
    /// ignoring case. A blank query matches every name.
    #[must_use]
    pub fn search(&self, query: &str, filter: CategoryFilter) -> Vec<&Product> {
        let needle = query.trim().to_lowercase();
        self.products
            .iter()
            .filter(|product| filter.matches(product.category))
            .filter(|product| needle.is_empty() || product.name.to_lowercase().contains(&needle))
            .collect()
    }
}
