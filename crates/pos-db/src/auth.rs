//! # Authentication
//!
//! Login verification and password hashing.
//!
//! Passwords are hashed with Argon2id (salted, memory-hard); the PHC
//! string stored in `users.password_hash` carries the salt and parameters,
//! so verification needs nothing but the stored string and the candidate
//! password.
//!
//! Failed logins collapse to a single [`AuthError::InvalidCredentials`]
//! variant: whether the login is unknown, the account inactive, or the
//! password wrong is not revealed to the caller.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::user::UserRepository;
use pos_core::{Role, User};

/// Default first-run administrator credentials. The password must be
/// changed after first login; `ensure_default_admin` only seeds an empty
/// user table.
pub const DEFAULT_ADMIN_LOGIN: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Authentication failures.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown login, inactive account, or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Hashing or hash-parsing failure.
    #[error("password hashing failed: {0}")]
    Hashing(String),

    /// Underlying storage failure.
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Hashes a password into a PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hashing(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verifies a password against a stored PHC string.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| AuthError::Hashing(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// The authentication gate: login verification and first-run seeding.
#[derive(Debug, Clone)]
pub struct AuthService {
    pool: SqlitePool,
}

impl AuthService {
    /// Creates a new AuthService.
    pub fn new(pool: SqlitePool) -> Self {
        AuthService { pool }
    }

    fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    /// Verifies a login/password pair against active users.
    ///
    /// Returns the authenticated [`User`] on success. Every failure mode
    /// is the same [`AuthError::InvalidCredentials`].
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<User, AuthError> {
        let user = match self.users().get_by_login(login).await? {
            Some(user) => user,
            None => {
                warn!(login = %login, "authentication failed: unknown or inactive login");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !verify_password(password, &user.password_hash)? {
            warn!(login = %login, "authentication failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        info!(login = %login, role = ?user.role, "user authenticated");
        Ok(user)
    }

    /// Registers a new user, hashing the given plaintext password.
    pub async fn register(
        &self,
        name: &str,
        login: &str,
        password: &str,
        role: Role,
    ) -> Result<User, AuthError> {
        let user = User {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            login: login.to_string(),
            password_hash: hash_password(password)?,
            role,
            is_active: true,
            created_at: Utc::now(),
        };

        self.users().insert(&user).await?;
        info!(login = %login, role = ?role, "user registered");
        Ok(user)
    }

    /// Changes a user's password after verifying the current one.
    pub async fn change_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let user = self
            .users()
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(current_password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        self.users()
            .set_password_hash(user_id, &hash_password(new_password)?)
            .await?;
        info!(login = %user.login, "password changed");
        Ok(())
    }

    /// Seeds the default administrator account if no user exists yet.
    ///
    /// Only ever fires against a completely empty user table, so a
    /// deliberately renamed or deactivated "admin" never comes back.
    /// Returns true if the account was created.
    pub async fn ensure_default_admin(&self) -> Result<bool, AuthError> {
        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from)?;

        if existing > 0 {
            return Ok(false);
        }

        self.register(
            "Administrator",
            DEFAULT_ADMIN_LOGIN,
            DEFAULT_ADMIN_PASSWORD,
            Role::Administrator,
        )
        .await?;

        warn!(
            login = DEFAULT_ADMIN_LOGIN,
            "default administrator created; change its password"
        );
        Ok(true)
    }
}
