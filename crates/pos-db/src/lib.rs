//! # pos-db - Storage Layer
//!
//! SQLite persistence for the point-of-sale system: connection pooling,
//! embedded migrations, repositories, the stock ledger, the sale commit
//! protocol, and authentication.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      Database                           │
//! │   (pool + WAL + migrations, cheap to clone)             │
//! ├──────────┬──────────┬─────────┬──────────┬──────────────┤
//! │ products │customers │  users  │  stock   │    sales     │
//! │  (CRUD)  │  (CRUD)  │ (roles) │ (ledger) │   (commit)   │
//! ├──────────┴──────────┴─────────┴──────────┴──────────────┤
//! │                     auth (argon2)                       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Business rules that need no I/O (cart arithmetic, money, validation)
//! live in [`pos_core`]; this crate enforces the rules that only the
//! database can enforce: atomic stock decrements, all-or-nothing sale
//! commits, unique logins and barcodes, the last-administrator guard.
//!
//! ## Quick Start
//! ```rust,ignore
//! use pos_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./pos.db")).await?;
//! db.auth().ensure_default_admin().await?;
//!
//! let user = db.auth().authenticate("admin", "admin123").await?;
//! let product = db.products().get_by_barcode("7891000100103").await?;
//! ```

pub mod auth;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use auth::{AuthError, AuthService};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::customer::CustomerRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::{CommitError, SaleRepository};
pub use repository::stock::{StockError, StockLedger};
pub use repository::user::UserRepository;

// Storage works in terms of the core domain types.
pub use pos_core::{Cart, CartLine, Customer, Product, Role, Sale, SaleLineItem, User};
