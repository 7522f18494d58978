//! # Domain Types
//!
//! Core domain types used throughout the POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐       │
//! │  │   Product    │  │     Sale     │  │ SaleLineItem │       │
//! │  │ ───────────  │  │ ───────────  │  │ ───────────  │       │
//! │  │ id (UUID)    │  │ id (UUID)    │  │ id (UUID)    │       │
//! │  │ barcode      │  │ user_id (FK) │  │ sale_id (FK) │       │
//! │  │ price_cents  │  │ customer_id  │  │ quantity     │       │
//! │  │ stock_on_hand│  │ total_cents  │  │ unit_price   │       │
//! │  └──────────────┘  └──────────────┘  └──────────────┘       │
//! │                                                             │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐       │
//! │  │   Customer   │  │     User     │  │     Role     │       │
//! │  │ (optional on │  │ login, hash, │  │ Administrator│       │
//! │  │  a sale)     │  │ role, active │  │ Clerk        │       │
//! │  └──────────────┘  └──────────────┘  └──────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every entity id is a UUID v4 string: immutable, globally unique without
//! coordination.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
///
/// Ownership split: catalog edits mutate every field except
/// `stock_on_hand`; that field is owned by the stock ledger and only moves
/// through its atomic decrement/increment operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to the operator.
    pub name: String,

    /// Barcode (EAN-13, UPC-A, ...). Unique when present.
    pub barcode: Option<String>,

    /// Price in cents (smallest currency unit), non-negative.
    pub price_cents: i64,

    /// Authoritative sellable stock. Never negative at rest.
    pub stock_on_hand: i64,

    /// Stock level at or below which the product shows up on the
    /// reorder report.
    pub reorder_threshold: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money value.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether `quantity` units could be sold at the stock level
    /// currently known to this snapshot.
    ///
    /// Advisory only: the stock ledger re-checks atomically at commit.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.is_active && self.stock_on_hand >= quantity
    }

    /// Whether the product has fallen to its reorder threshold.
    #[inline]
    pub fn needs_reorder(&self) -> bool {
        self.stock_on_hand <= self.reorder_threshold
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer that may optionally be attached to a sale.
///
/// No invariants beyond field presence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub tax_id: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// User & Role
// =============================================================================

/// Operator role.
///
/// A closed two-variant enum with exhaustive matching: role checks are
/// never string comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access, including catalog and user maintenance.
    Administrator,
    /// Sales capture only.
    Clerk,
}

impl Role {
    #[inline]
    pub fn is_administrator(&self) -> bool {
        matches!(self, Role::Administrator)
    }
}

/// A system user (operator).
///
/// Invariant, enforced by the user repository: at least one active
/// Administrator exists at all times.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    pub name: String,
    /// Unique login name.
    pub login: String,
    /// Opaque credential hash; scheme lives in the auth module.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale
// =============================================================================

/// A committed sale.
///
/// Created exactly once by the commit protocol and never mutated
/// afterwards (the administrative purge deletes, it does not edit).
/// `total_cents` equals the sum of line subtotals exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    /// Operator who captured the sale. Required, immutable.
    pub user_id: String,
    /// Optional customer reference.
    pub customer_id: Option<String>,
    /// Derived total: Σ line subtotals, to the cent.
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the total as a Money value.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Sale Line Item
// =============================================================================

/// One product/quantity/price entry within a committed sale.
///
/// Uses the snapshot pattern: name and unit price are frozen at commit
/// time and do not track later catalog changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLineItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Position within the sale, following cart insertion order. Has no
    /// effect on totals; preserved for audit/display fidelity.
    pub line_no: i64,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Positive quantity sold.
    pub quantity: i64,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Derived: quantity × unit_price_cents.
    pub subtotal_cents: i64,
}

impl SaleLineItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: i64, active: bool) -> Product {
        Product {
            id: "p-1".to_string(),
            name: "Test".to_string(),
            barcode: None,
            price_cents: 100,
            stock_on_hand: stock,
            reorder_threshold: 2,
            is_active: active,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn can_sell_respects_stock_and_active_flag() {
        assert!(product(5, true).can_sell(5));
        assert!(!product(5, true).can_sell(6));
        assert!(!product(5, false).can_sell(1));
    }

    #[test]
    fn needs_reorder_at_threshold() {
        assert!(product(2, true).needs_reorder());
        assert!(!product(3, true).needs_reorder());
    }

    #[test]
    fn role_check_is_exhaustive() {
        assert!(Role::Administrator.is_administrator());
        assert!(!Role::Clerk.is_administrator());
    }
}
