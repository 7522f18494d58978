//! # Product Repository
//!
//! Catalog operations for products: plain single-row CRUD with field
//! validation at the caller and constraints in the schema.
//!
//! One deliberate gap: nothing here writes `stock_on_hand` except
//! `insert` (initial level); every later stock movement goes through the
//! stock ledger's atomic operations.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use pos_core::Product;

/// Repository for product catalog operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, barcode, price_cents, stock_on_hand,
                   reorder_threshold, is_active, created_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets an *active* product by its barcode, the scan path at the
    /// register. Inactive products are invisible here.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, barcode, price_cents, stock_on_hand,
                   reorder_threshold, is_active, created_at
            FROM products
            WHERE barcode = ?1 AND is_active = 1
            "#,
        )
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists active products ordered by name.
    pub async fn list_active(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, barcode, price_cents, stock_on_hand,
                   reorder_threshold, is_active, created_at
            FROM products
            WHERE is_active = 1
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Lists active products at or below their reorder threshold.
    pub async fn list_below_reorder(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, barcode, price_cents, stock_on_hand,
                   reorder_threshold, is_active, created_at
            FROM products
            WHERE is_active = 1 AND stock_on_hand <= reorder_threshold
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a new product.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - barcode already exists
    /// * `DbError::CheckViolation` - negative price or stock
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, barcode, price_cents, stock_on_hand,
                reorder_threshold, is_active, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.barcode)
        .bind(product.price_cents)
        .bind(product.stock_on_hand)
        .bind(product.reorder_threshold)
        .bind(product.is_active)
        .bind(product.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing product's catalog fields.
    ///
    /// `stock_on_hand` is intentionally absent: stock moves only through
    /// the stock ledger.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                barcode = ?3,
                price_cents = ?4,
                reorder_threshold = ?5,
                is_active = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.barcode)
        .bind(product.price_cents)
        .bind(product.reorder_threshold)
        .bind(product.is_active)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("product", &product.id));
        }

        Ok(())
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// Historical sales keep referencing it; it simply stops being
    /// sellable and disappears from barcode lookup.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "soft-deleting product");

        let result = sqlx::query("UPDATE products SET is_active = 0 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Generates a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;

    fn sample(barcode: Option<&str>) -> Product {
        Product {
            id: generate_product_id(),
            name: "Arabica Beans 1kg".to_string(),
            barcode: barcode.map(str::to_string),
            price_cents: 4590,
            stock_on_hand: 12,
            reorder_threshold: 3,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn insert_and_get_round_trip() {
        let db = test_db().await;
        let product = sample(Some("7891000100103"));

        db.products().insert(&product).await.unwrap();

        let loaded = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, product.name);
        assert_eq!(loaded.price_cents, 4590);
        assert_eq!(loaded.stock_on_hand, 12);
        assert!(loaded.is_active);
    }

    #[tokio::test]
    async fn barcode_lookup_sees_only_active() {
        let db = test_db().await;
        let product = sample(Some("123-ABC"));
        db.products().insert(&product).await.unwrap();

        assert!(db
            .products()
            .get_by_barcode("123-ABC")
            .await
            .unwrap()
            .is_some());

        db.products().soft_delete(&product.id).await.unwrap();
        assert!(db
            .products()
            .get_by_barcode("123-ABC")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn duplicate_barcode_rejected() {
        let db = test_db().await;
        db.products().insert(&sample(Some("SAME"))).await.unwrap();

        let err = db.products().insert(&sample(Some("SAME"))).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn multiple_products_without_barcode_allowed() {
        // UNIQUE on a nullable column: NULLs never collide.
        let db = test_db().await;
        db.products().insert(&sample(None)).await.unwrap();
        db.products().insert(&sample(None)).await.unwrap();

        assert_eq!(db.products().count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn update_does_not_touch_stock() {
        let db = test_db().await;
        let mut product = sample(None);
        db.products().insert(&product).await.unwrap();

        product.name = "Arabica Beans 500g".to_string();
        product.stock_on_hand = 999; // must be ignored
        db.products().update(&product).await.unwrap();

        let loaded = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Arabica Beans 500g");
        assert_eq!(loaded.stock_on_hand, 12);
    }

    #[tokio::test]
    async fn reorder_report_lists_low_stock() {
        let db = test_db().await;
        let mut low = sample(None);
        low.stock_on_hand = 2; // threshold 3
        db.products().insert(&low).await.unwrap();
        db.products().insert(&sample(None)).await.unwrap();

        let below = db.products().list_below_reorder().await.unwrap();
        assert_eq!(below.len(), 1);
        assert_eq!(below[0].id, low.id);
    }
}
