//! Cart lines and the cart mutation rules.
//!
//! A [`Cart`] is an ordered list of [`CartLine`]s in first-add order. Two
//! invariants hold for every `Cart` value, including deserialized ones:
//!
//! - no two lines share a product id
//! - every line has a quantity of at least 1
//! - the total price is representable
//!
//! A line whose quantity would drop below 1 is removed instead of stored.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{Price, Product, ProductId};

/// Structural violations found when building a cart from raw lines.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// A line has a quantity of zero.
    #[error("line {0} has zero quantity")]
    ZeroQuantity(ProductId),
    /// Two lines share the same product id.
    #[error("duplicate line for product {0}")]
    DuplicateLine(ProductId),
    /// The cart total does not fit in a price.
    #[error("cart total is out of range")]
    TotalOverflow,
}

/// One entry in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(rename = "imageRef", alias = "img")]
    pub image_ref: String,
    #[serde(alias = "qty")]
    pub quantity: u32,
}

impl CartLine {
    /// A new line for `product` with quantity 1.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            image_ref: product.image_ref.clone(),
            quantity: 1,
        }
    }

    /// `price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// A quantity adjustment for an existing line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuantityChange {
    /// Add one unit.
    Increment,
    /// Remove one unit; the line is deleted when it reaches zero.
    Decrement,
    /// Delete the line regardless of its quantity.
    Remove,
}

impl QuantityChange {
    /// Map a `+1` / `-1` / `0` delta. `0` is the remove sentinel.
    ///
    /// Any other delta returns `None`.
    #[must_use]
    pub const fn from_delta(delta: i64) -> Option<Self> {
        match delta {
            1 => Some(Self::Increment),
            -1 => Some(Self::Decrement),
            0 => Some(Self::Remove),
            _ => None,
        }
    }
}

/// What a quantity change did to the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityOutcome {
    /// No line with that id; nothing changed.
    Missing,
    /// The line now has this quantity.
    Updated(u32),
    /// The line was deleted.
    Removed,
}

/// An ordered shopping cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CartLine>", into = "Vec<CartLine>")]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Lines in first-add order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Consume the cart and return its lines.
    #[must_use]
    pub fn into_lines(self) -> Vec<CartLine> {
        self.lines
    }

    /// Find the line for `id`.
    #[must_use]
    pub fn line(&self, id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.id == id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Add one unit of `product` and return the line's new quantity.
    ///
    /// An existing line is incremented; otherwise a new line is appended,
    /// copying the product's name, price, and image. If the total would go
    /// out of range the cart is left as is and the current quantity (0 for
    /// an absent line) is returned.
    pub fn add(&mut self, product: &Product) -> u32 {
        if !self.can_add(product.price) {
            return self.line(&product.id).map_or(0, |line| line.quantity);
        }
        if let Some(line) = self.lines.iter_mut().find(|line| line.id == product.id) {
            line.quantity = line.quantity.saturating_add(1);
            return line.quantity;
        }
        self.lines.push(CartLine::from_product(product));
        1
    }

    /// Apply `change` to the line for `id`. An absent id is a no-op.
    pub fn change_quantity(&mut self, id: &ProductId, change: QuantityChange) -> QuantityOutcome {
        let Some(idx) = self.lines.iter().position(|line| &line.id == id) else {
            return QuantityOutcome::Missing;
        };

        let next = match (change, self.lines.get(idx)) {
            (QuantityChange::Remove, _) | (_, None) => 0,
            (QuantityChange::Increment, Some(line)) if !self.can_add(line.price) => {
                return QuantityOutcome::Updated(line.quantity);
            }
            (QuantityChange::Increment, Some(line)) => line.quantity.saturating_add(1),
            (QuantityChange::Decrement, Some(line)) => line.quantity.saturating_sub(1),
        };

        if next < 1 {
            self.lines.remove(idx);
            return QuantityOutcome::Removed;
        }

        if let Some(line) = self.lines.get_mut(idx) {
            line.quantity = next;
        }
        QuantityOutcome::Updated(next)
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn total_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Sum of `price × quantity` over all lines.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// The total price, or `None` if it is not representable.
    #[must_use]
    pub fn checked_total_price(&self) -> Option<Price> {
        checked_total(&self.lines)
    }

    fn can_add(&self, price: Price) -> bool {
        self.checked_total_price()
            .and_then(|total| total.checked_add(price))
            .is_some()
    }
}

fn checked_total(lines: &[CartLine]) -> Option<Price> {
    lines.iter().try_fold(Price::ZERO, |total, line| {
        line.price
            .checked_times(line.quantity)
            .and_then(|line_total| total.checked_add(line_total))
    })
}

impl TryFrom<Vec<CartLine>> for Cart {
    type Error = CartError;

    fn try_from(lines: Vec<CartLine>) -> Result<Self, Self::Error> {
        let mut seen = HashSet::with_capacity(lines.len());
        for line in &lines {
            if line.quantity == 0 {
                return Err(CartError::ZeroQuantity(line.id.clone()));
            }
            if !seen.insert(&line.id) {
                return Err(CartError::DuplicateLine(line.id.clone()));
            }
        }
        if checked_total(&lines).is_none() {
            return Err(CartError::TotalOverflow);
        }
        Ok(Self { lines })
    }
}

impl From<Cart> for Vec<CartLine> {
    fn from(cart: Cart) -> Self {
        cart.lines
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::Category;

    fn cupcake() -> Product {
        Product {
            id: ProductId::parse("p1").unwrap(),
            name: "Cupcake Morango".to_string(),
            price: Price::from_cents(990),
            category: Category::Cupcakes,
            image_ref: "cupika cake.jpeg".to_string(),
        }
    }

    fn brownie() -> Product {
        Product {
            id: ProductId::parse("p5").unwrap(),
            name: "Brownie (un)".to_string(),
            price: Price::from_cents(650),
            category: Category::Sweets,
            image_ref: "brownie.jpeg".to_string(),
        }
    }

    #[test]
    fn test_repeated_add_keeps_single_line() {
        let mut cart = Cart::new();
        for expected in 1..=5 {
            assert_eq!(cart.add(&cupcake()), expected);
        }
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.lines()[0].quantity, 5);
    }

    #[test]
    fn test_add_copies_product_fields() {
        let mut cart = Cart::new();
        cart.add(&cupcake());
        let line = &cart.lines()[0];
        assert_eq!(line.name, "Cupcake Morango");
        assert_eq!(line.price, Price::from_cents(990));
        assert_eq!(line.image_ref, "cupika cake.jpeg");
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut cart = Cart::new();
        cart.add(&brownie());
        cart.add(&cupcake());
        cart.add(&brownie());
        let ids: Vec<_> = cart.lines().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["p5", "p1"]);
    }

    #[test]
    fn test_increment_then_decrement_to_removal() {
        let mut cart = Cart::new();
        cart.add(&cupcake());
        let id = cupcake().id;

        assert_eq!(
            cart.change_quantity(&id, QuantityChange::Increment),
            QuantityOutcome::Updated(2)
        );
        assert_eq!(
            cart.change_quantity(&id, QuantityChange::Decrement),
            QuantityOutcome::Updated(1)
        );
        assert_eq!(
            cart.change_quantity(&id, QuantityChange::Decrement),
            QuantityOutcome::Removed
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_ignores_quantity_and_is_idempotent() {
        let mut cart = Cart::new();
        for _ in 0..4 {
            cart.add(&cupcake());
        }
        let id = cupcake().id;
        assert_eq!(
            cart.change_quantity(&id, QuantityChange::Remove),
            QuantityOutcome::Removed
        );
        assert_eq!(
            cart.change_quantity(&id, QuantityChange::Remove),
            QuantityOutcome::Missing
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn test_change_missing_id_is_noop() {
        let mut cart = Cart::new();
        cart.add(&brownie());
        let before = cart.clone();
        let outcome = cart.change_quantity(&cupcake().id, QuantityChange::Decrement);
        assert_eq!(outcome, QuantityOutcome::Missing);
        assert_eq!(cart, before);
    }

    #[test]
    fn test_totals() {
        let mut cart = Cart::new();
        cart.add(&cupcake());
        cart.add(&cupcake());
        cart.add(&brownie());
        assert_eq!(cart.total_count(), 3);
        assert_eq!(cart.total_price(), Price::from_cents(2630));
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add(&cupcake());
        cart.clear();
        assert_eq!(cart.total_count(), 0);
        assert_eq!(cart.total_price(), Price::ZERO);
    }

    #[test]
    fn test_from_delta() {
        assert_eq!(QuantityChange::from_delta(1), Some(QuantityChange::Increment));
        assert_eq!(QuantityChange::from_delta(-1), Some(QuantityChange::Decrement));
        assert_eq!(QuantityChange::from_delta(0), Some(QuantityChange::Remove));
        assert_eq!(QuantityChange::from_delta(2), None);
    }

    #[test]
    fn test_deserialize_rejects_zero_quantity() {
        let json = r#"[{"id":"p1","name":"x","price":1,"imageRef":"a","quantity":0}]"#;
        assert!(serde_json::from_str::<Cart>(json).is_err());
    }

    #[test]
    fn test_deserialize_rejects_duplicate_ids() {
        let json = r#"[
            {"id":"p1","name":"x","price":1,"imageRef":"a","quantity":1},
            {"id":"p1","name":"x","price":1,"imageRef":"a","quantity":2}
        ]"#;
        assert!(serde_json::from_str::<Cart>(json).is_err());
    }

    #[test]
    fn test_deserialize_rejects_out_of_range_totals() {
        let line_overflow =
            r#"[{"id":"p1","name":"x","price":50000000000000000000000000000,"imageRef":"a","quantity":2}]"#;
        assert!(serde_json::from_str::<Cart>(line_overflow).is_err());

        let sum_overflow = r#"[
            {"id":"p1","name":"x","price":50000000000000000000000000000,"imageRef":"a","quantity":1},
            {"id":"p2","name":"y","price":50000000000000000000000000000,"imageRef":"b","quantity":1}
        ]"#;
        assert!(serde_json::from_str::<Cart>(sum_overflow).is_err());

        let lines: Vec<CartLine> = serde_json::from_str(sum_overflow).unwrap();
        assert_eq!(Cart::try_from(lines), Err(CartError::TotalOverflow));
    }

    #[test]
    fn test_add_stops_at_range_limit() {
        let mut expensive = cupcake();
        expensive.price = "50000000000000000000000000000".parse().unwrap();

        let mut cart = Cart::new();
        assert_eq!(cart.add(&expensive), 1);
        assert_eq!(cart.add(&expensive), 1);
        assert_eq!(
            cart.change_quantity(&expensive.id, QuantityChange::Increment),
            QuantityOutcome::Updated(1)
        );

        let mut other = brownie();
        other.price = "30000000000000000000000000000".parse().unwrap();
        assert_eq!(cart.add(&other), 0);
        assert!(cart.line(&other.id).is_none());
        assert!(cart.checked_total_price().is_some());
    }

    #[test]
    fn test_deserialize_legacy_field_names() {
        let json = r#"[{"id":"p1","name":"Cupcake Morango","price":9.9,"cat":"cupcakes","img":"cupika cake.jpeg","qty":2}]"#;
        let cart: Cart = serde_json::from_str(json).unwrap();
        assert_eq!(cart.total_count(), 2);
        assert_eq!(cart.total_price(), Price::from_cents(1980));
    }

    #[test]
    fn test_serialized_layout() {
        let mut cart = Cart::new();
        cart.add(&brownie());
        let value = serde_json::to_value(&cart).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{
                "id": "p5",
                "name": "Brownie (un)",
                "price": 6.5,
                "imageRef": "brownie.jpeg",
                "quantity": 1
            }])
        );
    }
}
