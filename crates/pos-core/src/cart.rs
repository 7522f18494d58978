//! # Cart (Sale Aggregate Builder)
//!
//! Accumulates candidate line items in memory before a sale is committed.
//! Nothing here touches storage: the cart is a plain mutable ordered
//! mapping from product id to line, and any screen refresh is the caller's
//! concern.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Caller Action           Cart Operation       Checks            │
//! │  ─────────────           ──────────────       ──────            │
//! │  Scan product ─────────► add_line()      ───► qty > 0           │
//! │                                               product active    │
//! │                                               cumulative ≤ stock│
//! │  Remove line ──────────► remove_line()   ───► (none, no-op ok)  │
//! │  Show total ───────────► total()         ───► pure, no effects  │
//! │  Cancel / post-commit ─► clear()                                │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `product_id`: adding the same product again
//!   merges into the existing line (quantity summed), never a second row
//! - Every line has `quantity > 0` and `unit_price_cents >= 0`
//! - Insertion order is preserved; it is the order lines are persisted in
//! - A rejected `add_line` leaves the cart exactly as it was

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Product;
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

/// A candidate line item: one product with a cumulative quantity.
///
/// Name, unit price and the stock level are snapshots taken when the
/// product was first added. The price snapshot is what gets persisted at
/// commit; the stock snapshot only feeds the optimistic pre-check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    /// Product ID (UUID).
    pub product_id: String,

    /// Product name at time of adding (frozen).
    pub name: String,

    /// Price in cents at time of adding (frozen). A later catalog price
    /// change does not reprice a cart that is already open.
    pub unit_price_cents: i64,

    /// Stock known at time of adding. Advisory: the authoritative check
    /// happens again at commit via the stock ledger.
    pub stock_on_hand: i64,

    /// Cumulative quantity for this product.
    pub quantity: i64,
}

impl CartLine {
    fn from_product(product: &Product, quantity: i64) -> Self {
        CartLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price_cents: product.price_cents,
            stock_on_hand: product.stock_on_hand,
            quantity,
        }
    }

    /// Line subtotal: quantity × unit price, exact in cents. Saturating,
    /// like [`Money`] multiplication.
    #[inline]
    pub fn subtotal_cents(&self) -> i64 {
        self.unit_price_cents.saturating_mul(self.quantity)
    }

    /// Line subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents())
    }
}

/// The in-memory, not-yet-persisted cart for one sale session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Adds a product to the cart, or merges into the existing line.
    ///
    /// ## Checks (in order)
    /// 1. `quantity > 0`, else [`CoreError::InvalidQuantity`]
    /// 2. product is active, else [`CoreError::ProductInactive`]
    /// 3. the *cumulative* quantity for this product fits within the
    ///    stock the caller just read, else [`CoreError::InsufficientStock`]
    ///
    /// When the product already has a line, the checks run against the new
    /// cumulative quantity and, on failure, the existing line keeps its
    /// previous quantity.
    pub fn add_line(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return Err(CoreError::InvalidQuantity { quantity });
        }
        if !product.is_active {
            return Err(CoreError::ProductInactive {
                name: product.name.clone(),
            });
        }

        let existing = self
            .lines
            .iter()
            .position(|l| l.product_id == product.id);

        let cumulative = match existing {
            Some(idx) => self.lines[idx].quantity + quantity,
            None => quantity,
        };

        if cumulative > MAX_LINE_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: cumulative,
                max: MAX_LINE_QUANTITY,
            });
        }

        // Optimistic pre-check against the freshest stock the caller has.
        // The stock ledger repeats this atomically at commit.
        if cumulative > product.stock_on_hand {
            return Err(CoreError::InsufficientStock {
                name: product.name.clone(),
                available: product.stock_on_hand,
                requested: cumulative,
            });
        }

        match existing {
            Some(idx) => {
                // Merge: quantity summed, price kept from first add.
                self.lines[idx].quantity = cumulative;
            }
            None => {
                if self.lines.len() >= MAX_CART_LINES {
                    return Err(CoreError::CartTooLarge {
                        max: MAX_CART_LINES,
                    });
                }
                self.lines.push(CartLine::from_product(product, quantity));
            }
        }

        Ok(())
    }

    /// Removes the line for `product_id` if present; no-op otherwise.
    pub fn remove_line(&mut self, product_id: &str) {
        self.lines.retain(|l| l.product_id != product_id);
    }

    /// Sum of all line subtotals. Pure, no side effects.
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents())
    }

    /// Sum of all line subtotals in cents.
    pub fn total_cents(&self) -> i64 {
        self.lines.iter().map(|l| l.subtotal_cents()).sum()
    }

    /// Empties the cart. Used on cancel or post-commit reset; has no
    /// storage-side effect.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Checks if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Number of distinct lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_product(id: &str, price_cents: i64, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            barcode: None,
            price_cents,
            stock_on_hand: stock,
            reorder_threshold: 0,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn add_line_accumulates_subtotals() {
        let mut cart = Cart::new();
        cart.add_line(&test_product("1", 999, 100), 2).unwrap();
        cart.add_line(&test_product("2", 500, 100), 1).unwrap();

        assert_eq!(cart.line_count(), 2);
        assert_eq!(cart.total_quantity(), 3);
        assert_eq!(cart.total_cents(), 2498);
    }

    #[test]
    fn same_product_merges_into_one_line() {
        let mut cart = Cart::new();
        let product = test_product("1", 999, 100);

        cart.add_line(&product, 3).unwrap();
        cart.add_line(&product, 4).unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.lines()[0].quantity, 7);
    }

    #[test]
    fn rejects_non_positive_quantity() {
        let mut cart = Cart::new();
        let product = test_product("1", 999, 100);

        assert!(matches!(
            cart.add_line(&product, 0),
            Err(CoreError::InvalidQuantity { quantity: 0 })
        ));
        assert!(matches!(
            cart.add_line(&product, -3),
            Err(CoreError::InvalidQuantity { .. })
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn rejects_inactive_product() {
        let mut cart = Cart::new();
        let mut product = test_product("1", 999, 100);
        product.is_active = false;

        assert!(matches!(
            cart.add_line(&product, 1),
            Err(CoreError::ProductInactive { .. })
        ));
    }

    #[test]
    fn cumulative_quantity_checked_against_stock() {
        // Stock 5: adding 3 then 4 must fail on the second add (7 > 5)
        // and leave the cart at quantity 3.
        let mut cart = Cart::new();
        let product = test_product("1", 1000, 5);

        cart.add_line(&product, 3).unwrap();
        let err = cart.add_line(&product, 4).unwrap_err();

        match err {
            CoreError::InsufficientStock {
                available,
                requested,
                ..
            } => {
                assert_eq!(available, 5);
                assert_eq!(requested, 7);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(cart.lines()[0].quantity, 3);
        assert_eq!(cart.total_cents(), 3000);
    }

    #[test]
    fn merged_line_keeps_first_price() {
        let mut cart = Cart::new();
        let mut product = test_product("1", 1000, 50);

        cart.add_line(&product, 1).unwrap();
        product.price_cents = 1500; // catalog price changed mid-session
        cart.add_line(&product, 1).unwrap();

        assert_eq!(cart.lines()[0].unit_price_cents, 1000);
        assert_eq!(cart.total_cents(), 2000);
    }

    #[test]
    fn remove_line_is_noop_when_absent() {
        let mut cart = Cart::new();
        cart.add_line(&test_product("1", 999, 10), 1).unwrap();

        cart.remove_line("nope");
        assert_eq!(cart.line_count(), 1);

        cart.remove_line("1");
        assert!(cart.is_empty());
    }

    #[test]
    fn clear_empties_cart() {
        let mut cart = Cart::new();
        cart.add_line(&test_product("1", 999, 10), 2).unwrap();
        assert!(!cart.is_empty());

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total_cents(), 0);
    }

    #[test]
    fn line_quantity_ceiling() {
        let mut cart = Cart::new();
        let product = test_product("1", 100, 10_000);

        cart.add_line(&product, 999).unwrap();
        assert!(matches!(
            cart.add_line(&product, 1),
            Err(CoreError::QuantityTooLarge { .. })
        ));
        assert_eq!(cart.lines()[0].quantity, 999);
    }
}
