//! # User Repository
//!
//! Operator accounts. Roles are a closed enum (`administrator` / `clerk`)
//! enforced both in the type system and by a CHECK constraint in the
//! schema, so no free-text role string ever reaches a comparison.
//!
//! The one non-trivial rule lives here: the system must never lose its
//! last active administrator. Deactivation counts the remaining active
//! administrators and the deactivation itself inside one transaction, so
//! two concurrent deactivations cannot both slip past the count.

use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use pos_core::{Role, User};

/// Repository for operator accounts.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Gets a user by ID, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, login, password_hash, role, is_active, created_at
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets a user by ID only if the account is active. The sale commit
    /// validates its operator through this view.
    pub async fn get_active_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, login, password_hash, role, is_active, created_at
            FROM users
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets an active user by login (the authentication lookup).
    pub async fn get_by_login(&self, login: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, login, password_hash, role, is_active, created_at
            FROM users
            WHERE login = ?1 AND is_active = 1
            "#,
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Lists all users, active and inactive, ordered by name.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, login, password_hash, role, is_active, created_at
            FROM users
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Inserts a new user. The password must already be hashed.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - login already taken
    pub async fn insert(&self, user: &User) -> DbResult<()> {
        debug!(id = %user.id, login = %user.login, role = ?user.role, "inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (id, name, login, password_hash, role, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.login)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.is_active)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates a user's display name, login and role. The password hash
    /// and the active flag have their own dedicated operations.
    ///
    /// Demoting the last active administrator to clerk is refused for the
    /// same reason deactivating it is.
    pub async fn update(&self, user: &User) -> DbResult<()> {
        debug!(id = %user.id, "updating user");

        let mut tx = self.pool.begin().await?;

        if user.role != Role::Administrator {
            let current: Option<(Role, bool)> =
                sqlx::query_as("SELECT role, is_active FROM users WHERE id = ?1")
                    .bind(&user.id)
                    .fetch_optional(&mut *tx)
                    .await?;

            if let Some((Role::Administrator, true)) = current {
                let admins: i64 = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM users WHERE role = 'administrator' AND is_active = 1",
                )
                .fetch_one(&mut *tx)
                .await?;

                if admins <= 1 {
                    warn!(id = %user.id, "refusing to demote last active administrator");
                    return Err(DbError::LastAdministrator);
                }
            }
        }

        let result = sqlx::query(
            r#"
            UPDATE users SET
                name = ?2,
                login = ?3,
                role = ?4
            WHERE id = ?1
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.login)
        .bind(user.role)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("user", &user.id));
        }

        tx.commit().await?;
        Ok(())
    }

    /// Replaces a user's password hash.
    pub async fn set_password_hash(&self, id: &str, password_hash: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET password_hash = ?2 WHERE id = ?1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("user", id));
        }

        Ok(())
    }

    /// Deactivates a user account.
    ///
    /// Refuses with [`DbError::LastAdministrator`] when the target is the
    /// only remaining active administrator. The count and the update run
    /// in one transaction; with SQLite's single-writer model two racing
    /// deactivations serialize, and the second one re-counts after the
    /// first committed.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let target: Option<(Role, bool)> =
            sqlx::query_as("SELECT role, is_active FROM users WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let (role, is_active) = match target {
            Some(row) => row,
            None => return Err(DbError::not_found("user", id)),
        };

        if !is_active {
            // Already inactive: nothing to do, nothing to protect.
            return Ok(());
        }

        if role == Role::Administrator {
            let admins: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM users WHERE role = 'administrator' AND is_active = 1",
            )
            .fetch_one(&mut *tx)
            .await?;

            if admins <= 1 {
                warn!(id = %id, "refusing to deactivate last active administrator");
                return Err(DbError::LastAdministrator);
            }
        }

        sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        debug!(id = %id, "user deactivated");
        Ok(())
    }

    /// Reactivates a user account.
    pub async fn reactivate(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET is_active = 1 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("user", id));
        }

        Ok(())
    }

    /// Counts active administrators.
    pub async fn active_administrator_count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE role = 'administrator' AND is_active = 1",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::insert_test_user;
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn login_lookup_sees_only_active() {
        let db = test_db().await;
        let id = insert_test_user(&db, "maria", Role::Clerk).await;
        insert_test_user(&db, "root", Role::Administrator).await;

        assert!(db.users().get_by_login("maria").await.unwrap().is_some());

        db.users().deactivate(&id).await.unwrap();
        assert!(db.users().get_by_login("maria").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_login_rejected() {
        let db = test_db().await;
        insert_test_user(&db, "maria", Role::Clerk).await;

        let user = User {
            id: "other".to_string(),
            name: "Other".to_string(),
            login: "maria".to_string(),
            password_hash: "x".to_string(),
            role: Role::Clerk,
            is_active: true,
            created_at: chrono::Utc::now(),
        };
        let err = db.users().insert(&user).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn last_administrator_cannot_be_deactivated() {
        let db = test_db().await;
        let admin = insert_test_user(&db, "root", Role::Administrator).await;
        insert_test_user(&db, "maria", Role::Clerk).await;

        let err = db.users().deactivate(&admin).await.unwrap_err();
        assert!(matches!(err, DbError::LastAdministrator));

        // Still active.
        let loaded = db.users().get_by_id(&admin).await.unwrap().unwrap();
        assert!(loaded.is_active);
    }

    #[tokio::test]
    async fn second_administrator_frees_the_first() {
        let db = test_db().await;
        let first = insert_test_user(&db, "root", Role::Administrator).await;
        insert_test_user(&db, "backup", Role::Administrator).await;

        db.users().deactivate(&first).await.unwrap();
        assert_eq!(db.users().active_administrator_count().await.unwrap(), 1);

        // Now "backup" is the last one standing.
        let backup = db.users().get_by_login("backup").await.unwrap().unwrap();
        let err = db.users().deactivate(&backup.id).await.unwrap_err();
        assert!(matches!(err, DbError::LastAdministrator));
    }

    #[tokio::test]
    async fn last_administrator_cannot_be_demoted() {
        let db = test_db().await;
        let admin = insert_test_user(&db, "root", Role::Administrator).await;

        let mut user = db.users().get_by_id(&admin).await.unwrap().unwrap();
        user.role = Role::Clerk;

        let err = db.users().update(&user).await.unwrap_err();
        assert!(matches!(err, DbError::LastAdministrator));
    }

    #[tokio::test]
    async fn active_view_hides_deactivated_users() {
        let db = test_db().await;
        insert_test_user(&db, "root", Role::Administrator).await;
        let clerk = insert_test_user(&db, "maria", Role::Clerk).await;

        assert!(db.users().get_active_by_id(&clerk).await.unwrap().is_some());
        db.users().deactivate(&clerk).await.unwrap();
        assert!(db.users().get_active_by_id(&clerk).await.unwrap().is_none());
        assert!(db.users().get_by_id(&clerk).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn deactivating_inactive_user_is_a_no_op() {
        let db = test_db().await;
        insert_test_user(&db, "root", Role::Administrator).await;
        let clerk = insert_test_user(&db, "maria", Role::Clerk).await;

        db.users().deactivate(&clerk).await.unwrap();
        db.users().deactivate(&clerk).await.unwrap();

        db.users().reactivate(&clerk).await.unwrap();
        let loaded = db.users().get_by_id(&clerk).await.unwrap().unwrap();
        assert!(loaded.is_active);
    }
}
