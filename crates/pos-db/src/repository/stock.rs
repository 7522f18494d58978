//! # Stock Ledger
//!
//! Owns the authoritative `stock_on_hand` counter per product and the
//! atomic decrement/increment operations.
//!
//! ## The Check-and-Decrement Problem
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  ❌ WRONG: read-then-write from application code                │
//! │                                                                 │
//! │     Session A: read stock = 5          Session B: read stock = 5│
//! │     Session A: 5 ≥ 3, write 2          Session B: 5 ≥ 3, write 2│
//! │                                                                 │
//! │     6 units sold out of 5. Lost update.                         │
//! │                                                                 │
//! │  ✅ CORRECT: one conditional UPDATE                             │
//! │                                                                 │
//! │     UPDATE products SET stock_on_hand = stock_on_hand - ?       │
//! │     WHERE id = ? AND stock_on_hand >= ?                         │
//! │                                                                 │
//! │     The check and the write are a single statement. SQLite      │
//! │     serializes writers, so concurrent decrements against the    │
//! │     same product behave as if run one after another, even       │
//! │     from independent processes sharing the database file.       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both operations are exposed against the pool and against an open
//! transaction connection; the sale commit protocol runs decrements on
//! its own transaction so the stock effect becomes durable together with
//! the sale rows.

use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;
use tracing::debug;

use crate::error::DbError;

/// Outcomes of a stock mutation.
///
/// Both rejection variants are clean: no row changed, nothing to undo.
#[derive(Debug, Error)]
pub enum StockError {
    /// Quantity must be positive. A negative decrement would satisfy the
    /// `stock_on_hand >= ?` condition trivially and *add* stock, so both
    /// mutations reject non-positive amounts before any SQL runs.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// No active product with this id.
    #[error("product not found: {0}")]
    ProductNotFound(String),

    /// The requested quantity exceeds the stock available right now.
    #[error("insufficient stock for '{name}': available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        name: String,
        available: i64,
        requested: i64,
    },

    /// Underlying storage failure.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<sqlx::Error> for StockError {
    fn from(err: sqlx::Error) -> Self {
        StockError::Db(DbError::from(err))
    }
}

/// The stock ledger: sole writer of `products.stock_on_hand`.
#[derive(Debug, Clone)]
pub struct StockLedger {
    pool: SqlitePool,
}

impl StockLedger {
    /// Creates a new StockLedger.
    pub fn new(pool: SqlitePool) -> Self {
        StockLedger { pool }
    }

    /// Atomically decrements stock if at least `quantity` units are
    /// available, returning the new stock level.
    ///
    /// The check "stock ≥ quantity" and the subtraction form one
    /// indivisible unit: no other decrement can observe or apply between
    /// them. Inactive products are treated as not found: they are not
    /// sellable and their counters stay frozen.
    pub async fn try_decrement(&self, product_id: &str, quantity: i64) -> Result<i64, StockError> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        try_decrement_on(&mut conn, product_id, quantity).await
    }

    /// Increments stock (corrections, returns, restocking), returning the
    /// new stock level. The inverse of `try_decrement`: always succeeds
    /// for an existing product and a positive quantity, no ceiling check.
    pub async fn increment(&self, product_id: &str, quantity: i64) -> Result<i64, StockError> {
        if quantity <= 0 {
            return Err(StockError::InvalidQuantity(quantity));
        }

        debug!(product_id = %product_id, quantity = %quantity, "incrementing stock");

        let updated: Option<(i64,)> = sqlx::query_as(
            r#"
            UPDATE products
            SET stock_on_hand = stock_on_hand + ?2
            WHERE id = ?1
            RETURNING stock_on_hand
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some((new_stock,)) => Ok(new_stock),
            None => Err(StockError::ProductNotFound(product_id.to_string())),
        }
    }

    /// Current stock level, for diagnostics and tests.
    pub async fn level(&self, product_id: &str) -> Result<i64, StockError> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT stock_on_hand FROM products WHERE id = ?1")
                .bind(product_id)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((stock,)) => Ok(stock),
            None => Err(StockError::ProductNotFound(product_id.to_string())),
        }
    }
}

/// Conditional decrement against an explicit connection.
///
/// Used by [`StockLedger::try_decrement`] with a pooled connection and by
/// the sale commit protocol with its transaction connection, so the
/// decrement participates in the commit's all-or-nothing scope.
pub(crate) async fn try_decrement_on(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: i64,
) -> Result<i64, StockError> {
    if quantity <= 0 {
        return Err(StockError::InvalidQuantity(quantity));
    }

    debug!(product_id = %product_id, quantity = %quantity, "decrementing stock");

    let updated: Option<(i64,)> = sqlx::query_as(
        r#"
        UPDATE products
        SET stock_on_hand = stock_on_hand - ?2
        WHERE id = ?1 AND is_active = 1 AND stock_on_hand >= ?2
        RETURNING stock_on_hand
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some((new_stock,)) = updated {
        return Ok(new_stock);
    }

    // No row matched: find out why, for a precise error.
    let row: Option<(String, i64)> =
        sqlx::query_as("SELECT name, stock_on_hand FROM products WHERE id = ?1 AND is_active = 1")
            .bind(product_id)
            .fetch_optional(&mut *conn)
            .await?;

    match row {
        Some((name, available)) => Err(StockError::InsufficientStock {
            product_id: product_id.to_string(),
            name,
            available,
            requested: quantity,
        }),
        None => Err(StockError::ProductNotFound(product_id.to_string())),
    }
}
