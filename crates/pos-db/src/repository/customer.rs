//! Customer repository. Same shape as the product repository: soft
//! deletes, active-only listing, constraint errors surfaced as `DbError`.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use pos_core::Customer;

/// Repository for customer records.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Gets a customer by ID, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, tax_id, phone, email, is_active, created_at
            FROM customers
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Lists active customers ordered by name.
    pub async fn list_active(&self) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, tax_id, phone, email, is_active, created_at
            FROM customers
            WHERE is_active = 1
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Inserts a new customer.
    pub async fn insert(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, name = %customer.name, "inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (id, name, tax_id, phone, email, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.tax_id)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(customer.is_active)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing customer.
    pub async fn update(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, "updating customer");

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                name = ?2,
                tax_id = ?3,
                phone = ?4,
                email = ?5,
                is_active = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.tax_id)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(customer.is_active)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("customer", &customer.id));
        }

        Ok(())
    }

    /// Soft-deletes a customer. Historical sales keep their reference.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "soft-deleting customer");

        let result = sqlx::query("UPDATE customers SET is_active = 0 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("customer", id));
        }

        Ok(())
    }
}
