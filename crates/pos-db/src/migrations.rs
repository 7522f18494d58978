//! # Database Migrations
//!
//! Embedded SQL migrations.
//!
//! The `sqlx::migrate!()` macro embeds all SQL files from
//! `migrations/sqlite/` (workspace root) into the binary at compile time;
//! no runtime file access is needed. Applied migrations are tracked in the
//! `_sqlx_migrations` table, so running them is idempotent.
//!
//! ## Adding New Migrations
//! 1. Create a new file with the next sequence number:
//!    `NNN_description.sql` (e.g. `002_add_customer_index.sql`)
//! 2. Write idempotent SQL (use `IF NOT EXISTS` where possible)
//! 3. **NEVER** modify existing migrations - always add new ones

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending database migrations, in filename order, each in its
/// own transaction.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("all migrations applied");
    Ok(())
}

/// Returns (total_migrations, applied_migrations) for diagnostics.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}
