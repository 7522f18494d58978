//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  SQLite Error (sqlx::Error)                                 │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  DbError (this module) ← adds context and categorization    │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  StockError / CommitError ← business outcomes on top        │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Database operation errors.
///
/// These wrap sqlx errors and provide additional context for debugging
/// and user feedback. Catalog-level constraint violations are reported
/// as-is to the caller without retry.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation (duplicate barcode, duplicate login).
    #[error("duplicate {field}: already exists")]
    UniqueViolation { field: String },

    /// Foreign key constraint violation.
    #[error("foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A CHECK constraint rejected a write (negative stock or price
    /// reaching the store through a non-ledger path).
    #[error("constraint violation: {message}")]
    CheckViolation { message: String },

    /// Deactivating or deleting this user would leave the system with no
    /// active administrator.
    #[error("cannot remove the last active administrator")]
    LastAdministrator,

    /// Database connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite constraint messages:
                //   "UNIQUE constraint failed: <table>.<column>"
                //   "FOREIGN KEY constraint failed"
                //   "CHECK constraint failed: <expr>"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation { field }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
