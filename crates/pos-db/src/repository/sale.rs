//! # Sale Commit Protocol
//!
//! Turns a cart into durable rows: one sale header, one item row per cart
//! line, and one stock decrement per line - all inside a single
//! transaction.
//!
//! ## All-or-Nothing
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                         │
//! │    1. verify the user exists and is active                     │
//! │    2. INSERT sale header (total = Σ line subtotals)            │
//! │    3. for each cart line, in insertion order:                  │
//! │         INSERT sale item (line_no = position)                  │
//! │         conditional stock decrement                            │
//! │  COMMIT          ── only if every step succeeded               │
//! │                                                                │
//! │  Any failure → ROLLBACK: no sale row, no item rows, and every  │
//! │  stock counter exactly as it was. The caller's cart is not     │
//! │  touched either way; clearing it after success is the caller's │
//! │  decision.                                                     │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rollback is automatic: dropping an uncommitted [`sqlx::Transaction`]
//! rolls it back, so every early `?` return unwinds cleanly.
//!
//! The stock decrement inside step 3 is the same conditional UPDATE the
//! stock ledger uses standalone, run on the transaction's connection. A
//! line for a vanished or deactivated product fails as `ProductNotFound`;
//! one whose quantity exceeds current stock fails as `InsufficientStock`
//! with the live number, so the register can offer to retry with less.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::stock::{self, StockError};
use pos_core::{Cart, Sale, SaleLineItem};

/// Why a sale commit was rejected or failed.
#[derive(Debug, Error)]
pub enum CommitError {
    /// The cart has no lines; an empty sale is never recorded.
    #[error("cannot commit an empty cart")]
    EmptyCart,

    /// The committing user does not exist or is inactive.
    #[error("invalid or inactive user: {0}")]
    InvalidUser(String),

    /// A cart line references a product that no longer exists or was
    /// deactivated after it entered the cart.
    #[error("product not found: {0}")]
    ProductNotFound(String),

    /// A cart line's quantity exceeds the stock available at commit time.
    #[error("insufficient stock for '{name}': available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        name: String,
        available: i64,
        requested: i64,
    },

    /// Storage failure unrelated to business rules.
    #[error(transparent)]
    Failed(#[from] DbError),
}

impl From<sqlx::Error> for CommitError {
    fn from(err: sqlx::Error) -> Self {
        CommitError::Failed(DbError::from(err))
    }
}

impl From<StockError> for CommitError {
    fn from(err: StockError) -> Self {
        match err {
            // Unreachable from commit: every cart line has quantity > 0.
            StockError::InvalidQuantity(quantity) => {
                CommitError::Failed(DbError::Internal(format!("invalid quantity: {quantity}")))
            }
            StockError::ProductNotFound(id) => CommitError::ProductNotFound(id),
            StockError::InsufficientStock {
                product_id,
                name,
                available,
                requested,
            } => CommitError::InsufficientStock {
                product_id,
                name,
                available,
                requested,
            },
            StockError::Db(db) => CommitError::Failed(db),
        }
    }
}

/// Repository for committed sales: the commit protocol itself, reads of
/// sale history, and retention maintenance.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Commits a cart as a sale.
    ///
    /// On success returns the recorded [`Sale`]; its `total_cents` equals
    /// the sum of the item subtotals by construction. On any error the
    /// database is untouched.
    pub async fn commit(
        &self,
        user_id: &str,
        customer_id: Option<&str>,
        cart: &Cart,
    ) -> Result<Sale, CommitError> {
        if cart.is_empty() {
            return Err(CommitError::EmptyCart);
        }

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        // The committing operator must be real and active. Checked inside
        // the transaction so a concurrent deactivation can't slide in
        // between the check and the insert.
        let active: Option<(bool,)> = sqlx::query_as("SELECT is_active FROM users WHERE id = ?1")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;

        match active {
            Some((true,)) => {}
            _ => return Err(CommitError::InvalidUser(user_id.to_string())),
        }

        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            customer_id: customer_id.map(str::to_string),
            total_cents: cart.total_cents(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO sales (id, user_id, customer_id, total_cents, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.user_id)
        .bind(&sale.customer_id)
        .bind(sale.total_cents)
        .bind(sale.created_at)
        .execute(&mut *tx)
        .await?;

        for (idx, line) in cart.lines().iter().enumerate() {
            let line_no = (idx + 1) as i64;

            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, product_id, line_no, name_snapshot,
                    quantity, unit_price_cents, subtotal_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&sale.id)
            .bind(&line.product_id)
            .bind(line_no)
            .bind(&line.name)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .bind(line.subtotal_cents())
            .execute(&mut *tx)
            .await
            .map_err(|e| match DbError::from(e) {
                // The product row is gone entirely: the FK fires before
                // the decrement would.
                DbError::ForeignKeyViolation { .. } => {
                    CommitError::ProductNotFound(line.product_id.clone())
                }
                other => CommitError::Failed(other),
            })?;

            let remaining = stock::try_decrement_on(&mut *tx, &line.product_id, line.quantity)
                .await
                .map_err(|e| {
                    warn!(
                        product_id = %line.product_id,
                        quantity = line.quantity,
                        error = %e,
                        "sale commit aborted at stock decrement"
                    );
                    CommitError::from(e)
                })?;

            debug!(
                product_id = %line.product_id,
                quantity = line.quantity,
                remaining,
                "sale line recorded"
            );
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(
            sale_id = %sale.id,
            user_id = %sale.user_id,
            lines = cart.line_count(),
            total_cents = sale.total_cents,
            "sale committed"
        );

        Ok(sale)
    }

    /// Gets a sale header by ID.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Sale>, DbError> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, user_id, customer_id, total_cents, created_at
            FROM sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets a sale's line items in their original cart order.
    pub async fn get_items(&self, sale_id: &str) -> Result<Vec<SaleLineItem>, DbError> {
        let items = sqlx::query_as::<_, SaleLineItem>(
            r#"
            SELECT id, sale_id, product_id, line_no, name_snapshot,
                   quantity, unit_price_cents, subtotal_cents
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY line_no
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists sales whose timestamp falls in `[from, to)`, newest first.
    pub async fn list_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Sale>, DbError> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, user_id, customer_id, total_cents, created_at
            FROM sales
            WHERE created_at >= ?1 AND created_at < ?2
            ORDER BY created_at DESC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Returns (sale_count, revenue_cents) for sales in `[from, to)`.
    pub async fn totals_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<(i64, i64), DbError> {
        let row: (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(total_cents), 0)
            FROM sales
            WHERE created_at >= ?1 AND created_at < ?2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Deletes sales (and their items) older than `cutoff`. Returns the
    /// number of sales removed. Stock is not restored: this is retention
    /// cleanup, not a refund.
    pub async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM sale_items
            WHERE sale_id IN (SELECT id FROM sales WHERE created_at < ?1)
            "#,
        )
        .bind(cutoff)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM sales WHERE created_at < ?1")
            .bind(cutoff)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let purged = result.rows_affected();
        if purged > 0 {
            info!(purged, "purged old sales");
        }
        Ok(purged)
    }

    /// Deletes all sale history. Returns the number of sales removed.
    pub async fn purge_all(&self) -> Result<u64, DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM sale_items").execute(&mut *tx).await?;
        let result = sqlx::query("DELETE FROM sales").execute(&mut *tx).await?;

        tx.commit().await?;

        let purged = result.rows_affected();
        info!(purged, "purged all sales");
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::test_support::insert_test_product;
    use crate::repository::user::test_support::insert_test_user;
    use chrono::Duration;
    use pos_core::Role;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn cart_with(db: &Database, product_id: &str, quantity: i64) -> Cart {
        let product = db.products().get_by_id(product_id).await.unwrap().unwrap();
        let mut cart = Cart::new();
        cart.add_line(&product, quantity).unwrap();
        cart
    }

    #[tokio::test]
    async fn commit_records_sale_items_and_stock() {
        let db = test_db().await;
        let user = insert_test_user(&db, "maria", Role::Clerk).await;
        let beans = insert_test_product(&db, "Beans", 1000, 10).await;
        let milk = insert_test_product(&db, "Milk", 450, 20).await;

        let mut cart = cart_with(&db, &beans, 3).await;
        let milk_product = db.products().get_by_id(&milk).await.unwrap().unwrap();
        cart.add_line(&milk_product, 2).unwrap();

        let sale = db.sales().commit(&user, None, &cart).await.unwrap();

        assert_eq!(sale.total_cents, 3 * 1000 + 2 * 450);

        let items = db.sales().get_items(&sale.id).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].line_no, 1);
        assert_eq!(items[0].name_snapshot, "Beans");
        assert_eq!(items[1].line_no, 2);
        assert_eq!(
            sale.total_cents,
            items.iter().map(|i| i.subtotal_cents).sum::<i64>()
        );

        assert_eq!(db.stock().level(&beans).await.unwrap(), 7);
        assert_eq!(db.stock().level(&milk).await.unwrap(), 18);
    }

    #[tokio::test]
    async fn empty_cart_is_rejected_before_any_io() {
        let db = test_db().await;
        let user = insert_test_user(&db, "maria", Role::Clerk).await;

        let err = db.sales().commit(&user, None, &Cart::new()).await.unwrap_err();
        assert!(matches!(err, CommitError::EmptyCart));
    }

    #[tokio::test]
    async fn inactive_user_cannot_commit() {
        let db = test_db().await;
        insert_test_user(&db, "root", Role::Administrator).await;
        let clerk = insert_test_user(&db, "maria", Role::Clerk).await;
        let beans = insert_test_product(&db, "Beans", 1000, 10).await;
        let cart = cart_with(&db, &beans, 1).await;

        db.users().deactivate(&clerk).await.unwrap();

        let err = db.sales().commit(&clerk, None, &cart).await.unwrap_err();
        assert!(matches!(err, CommitError::InvalidUser(_)));
        assert_eq!(db.stock().level(&beans).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn unknown_user_cannot_commit() {
        let db = test_db().await;
        let beans = insert_test_product(&db, "Beans", 1000, 10).await;
        let cart = cart_with(&db, &beans, 1).await;

        let err = db.sales().commit("ghost", None, &cart).await.unwrap_err();
        assert!(matches!(err, CommitError::InvalidUser(_)));
    }

    #[tokio::test]
    async fn failed_commit_leaves_no_trace() {
        // Second line oversells: the first line's insert and decrement
        // must be rolled back along with everything else.
        let db = test_db().await;
        let user = insert_test_user(&db, "maria", Role::Clerk).await;
        let beans = insert_test_product(&db, "Beans", 1000, 10).await;
        let milk = insert_test_product(&db, "Milk", 450, 1).await;

        let mut cart = cart_with(&db, &beans, 3).await;
        let mut milk_product = db.products().get_by_id(&milk).await.unwrap().unwrap();
        // Stale snapshot: the cart believes more stock exists than does.
        milk_product.stock_on_hand = 10;
        cart.add_line(&milk_product, 5).unwrap();

        let err = db.sales().commit(&user, None, &cart).await.unwrap_err();
        match err {
            CommitError::InsufficientStock {
                available,
                requested,
                ..
            } => {
                assert_eq!(available, 1);
                assert_eq!(requested, 5);
            }
            other => panic!("unexpected error: {other}"),
        }

        // Stock fully restored, zero rows written.
        assert_eq!(db.stock().level(&beans).await.unwrap(), 10);
        assert_eq!(db.stock().level(&milk).await.unwrap(), 1);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
        let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale_items")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(items, 0);
    }

    #[tokio::test]
    async fn product_deactivated_after_carting_aborts_commit() {
        let db = test_db().await;
        let user = insert_test_user(&db, "maria", Role::Clerk).await;
        let beans = insert_test_product(&db, "Beans", 1000, 10).await;
        let cart = cart_with(&db, &beans, 2).await;

        db.products().soft_delete(&beans).await.unwrap();

        let err = db.sales().commit(&user, None, &cart).await.unwrap_err();
        assert!(matches!(err, CommitError::ProductNotFound(_)));
        assert_eq!(db.stock().level(&beans).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn concurrent_commits_never_oversell() {
        // Stock of 5, three commits wanting 3 each: exactly one succeeds
        // (5 - 3 = 2 leaves too little for another 3).
        let db = test_db().await;
        let user = insert_test_user(&db, "maria", Role::Clerk).await;
        let beans = insert_test_product(&db, "Beans", 1000, 5).await;

        // Build every cart against the stock-of-5 snapshot before any
        // commit runs, so only the commits race on the decrement.
        let mut carts = Vec::new();
        for _ in 0..3 {
            carts.push(cart_with(&db, &beans, 3).await);
        }

        let mut handles = Vec::new();
        for cart in carts {
            let db = db.clone();
            let user = user.clone();
            handles.push(tokio::spawn(async move {
                db.sales().commit(&user, None, &cart).await
            }));
        }

        let mut ok = 0;
        let mut short = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(CommitError::InsufficientStock { .. }) => short += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(ok, 1);
        assert_eq!(short, 2);
        assert_eq!(db.stock().level(&beans).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn commit_with_customer_is_linked() {
        let db = test_db().await;
        let user = insert_test_user(&db, "maria", Role::Clerk).await;
        let beans = insert_test_product(&db, "Beans", 1000, 10).await;
        let cart = cart_with(&db, &beans, 1).await;

        let customer = pos_core::Customer {
            id: "cust-1".to_string(),
            name: "Ana".to_string(),
            tax_id: None,
            phone: None,
            email: None,
            is_active: true,
            created_at: Utc::now(),
        };
        db.customers().insert(&customer).await.unwrap();

        let sale = db
            .sales()
            .commit(&user, Some("cust-1"), &cart)
            .await
            .unwrap();
        assert_eq!(sale.customer_id.as_deref(), Some("cust-1"));

        let loaded = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(loaded.total_cents, sale.total_cents);
    }

    #[tokio::test]
    async fn reporting_window_and_purge() {
        let db = test_db().await;
        let user = insert_test_user(&db, "maria", Role::Clerk).await;
        let beans = insert_test_product(&db, "Beans", 1000, 50).await;

        for _ in 0..3 {
            let cart = cart_with(&db, &beans, 2).await;
            db.sales().commit(&user, None, &cart).await.unwrap();
        }

        let now = Utc::now();
        let (count, revenue) = db
            .sales()
            .totals_between(now - Duration::hours(1), now + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(count, 3);
        assert_eq!(revenue, 3 * 2 * 1000);

        let listed = db
            .sales()
            .list_between(now - Duration::hours(1), now + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(listed.len(), 3);

        // Nothing is older than an hour: purge_before removes nothing.
        assert_eq!(
            db.sales().purge_before(now - Duration::hours(1)).await.unwrap(),
            0
        );
        assert_eq!(db.sales().purge_all().await.unwrap(), 3);

        let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale_items")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(items, 0);
        // Stock untouched by the purge.
        assert_eq!(db.stock().level(&beans).await.unwrap(), 44);
    }
}
