//! # pos-core: Pure Business Logic for the Retail POS
//!
//! This crate is the **heart** of the POS. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        POS Architecture                         │
//! │                                                                 │
//! │  Caller (UI-equivalent session)                                 │
//! │       │ build cart, then commit                                 │
//! │  ┌────▼────────────────────────────────────────────────────┐    │
//! │  │               ★ pos-core (THIS CRATE) ★                 │    │
//! │  │                                                         │    │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌────────────┐    │    │
//! │  │   │  types  │ │  money  │ │  cart   │ │ validation │    │    │
//! │  │   │ Product │ │  Money  │ │  Cart   │ │   rules    │    │    │
//! │  │   │  Sale   │ │ (cents) │ │CartLine │ │   checks   │    │    │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └────────────┘    │    │
//! │  │                                                         │    │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS    │    │
//! │  └────┬────────────────────────────────────────────────────┘    │
//! │       │                                                         │
//! │  ┌────▼────────────────────────────────────────────────────┐    │
//! │  │                 pos-db (Database Layer)                 │    │
//! │  │   SQLite repositories, stock ledger, sale commit        │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Customer, User, Sale, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - The in-memory sale aggregate builder
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level validation rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input = same output
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are cents (i64), exact to two
//!    decimal places
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

pub mod cart;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

pub use cart::{Cart, CartLine};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
///
/// Prevents runaway carts and keeps transactions a sensible size.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line in a cart.
///
/// Prevents accidental over-ordering (e.g. typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Maximum unit price in cents ($1,000,000.00).
///
/// Keeps catalog prices in a range where any line subtotal
/// (price × [`MAX_LINE_QUANTITY`]) and any cart total fit comfortably
/// in i64 cents.
pub const MAX_PRICE_CENTS: i64 = 100_000_000;
