//! Catalog product types.

use serde::{Deserialize, Serialize};

use super::{Price, ProductId};

/// Product category.
///
/// Serialized with the catalog's wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "cupcakes")]
    Cupcakes,
    #[serde(rename = "bolos")]
    Cakes,
    #[serde(rename = "doces")]
    Sweets,
}

impl Category {
    /// Wire name of the category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cupcakes => "cupcakes",
            Self::Cakes => "bolos",
            Self::Sweets => "doces",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cupcakes" => Ok(Self::Cupcakes),
            "bolos" => Ok(Self::Cakes),
            "doces" => Ok(Self::Sweets),
            _ => Err(format!("invalid category: {s}")),
        }
    }
}

/// Category filter for catalog searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CategoryFilter {
    /// Every category.
    #[default]
    All,
    /// A single category.
    Only(Category),
}

impl CategoryFilter {
    /// Whether `category` passes the filter.
    #[must_use]
    pub fn matches(self, category: Category) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == category,
        }
    }
}

impl std::str::FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(Self::All);
        }
        s.parse().map(Self::Only)
    }
}

/// A read-only catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(alias = "cat")]
    pub category: Category,
    #[serde(rename = "imageRef", alias = "img")]
    pub image_ref: String,
}
