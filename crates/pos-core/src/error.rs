//! # Error Types
//!
//! Domain-specific error types for pos-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  pos-core errors (this file)                                │
//! │  ├── CoreError        - Business-rule rejections            │
//! │  └── ValidationError  - Field-level input failures          │
//! │                                                             │
//! │  pos-db errors (separate crate)                             │
//! │  ├── DbError          - Database operation failures         │
//! │  ├── StockError       - Atomic decrement outcomes           │
//! │  └── CommitError      - Sale commit protocol outcomes       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product name, quantities, ...)
//! 3. Errors are enum variants, never String
//! 4. A rejected operation leaves its input untouched

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business-rule errors raised while building a cart.
///
/// Every variant is a clean rejection: the cart is left exactly as it was
/// before the failing call, so the caller can correct and retry.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Quantity must be a positive integer.
    #[error("invalid quantity: {quantity}")]
    InvalidQuantity { quantity: i64 },

    /// Product is soft-deleted / flagged inactive and cannot be sold.
    #[error("product '{name}' is inactive")]
    ProductInactive { name: String },

    /// Requested quantity exceeds the stock known at add-to-cart time.
    ///
    /// This is the *optimistic* pre-check. The authoritative check happens
    /// again at commit time in the stock ledger, because stock may change
    /// between adding to the cart and committing the sale.
    #[error("insufficient stock for '{name}': available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Cart has reached the maximum number of distinct lines.
    #[error("cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Cumulative line quantity exceeds the per-line ceiling.
    #[error("quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Field-level validation failure.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any business logic runs; caller-correctable, no state
/// change.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. malformed barcode or login).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        let err = CoreError::InsufficientStock {
            name: "Arabica Beans 1kg".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "insufficient stock for 'Arabica Beans 1kg': available 3, requested 5"
        );
    }

    #[test]
    fn validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");
    }

    #[test]
    fn validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "price".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
