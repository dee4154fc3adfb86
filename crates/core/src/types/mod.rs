//! Core types for Beelivery.
//!
//! This module provides type-safe wrappers for the storefront's domain concepts.

pub mod cart;
pub mod id;
pub mod price;
pub mod product;
pub mod theme;

pub use cart::{Cart, CartError, CartLine, QuantityChange, QuantityOutcome};
pub use id::{ProductId, ProductIdError};
pub use price::{CurrencyCode, Price, PriceError};
pub use product::{Category, CategoryFilter, Product};
pub use theme::Theme;
