//! # Validation Module
//!
//! Field-level validation for catalog input.
//!
//! ## Validation Strategy
//! Defense in depth: these checks run before business logic, and the
//! database repeats the structural ones (NOT NULL, UNIQUE, FK) as
//! constraints.
//!
//! ## Usage
//! ```rust
//! use pos_core::validation::{validate_product_name, validate_quantity};
//!
//! validate_product_name("Arabica Beans 1kg").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::{MAX_LINE_QUANTITY, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name: required, at most 200 characters.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_required_name("name", name, 200)
}

/// Validates a customer name: required, at most 200 characters.
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    validate_required_name("name", name, 200)
}

/// Validates a user display name: required, at most 100 characters.
pub fn validate_user_name(name: &str) -> ValidationResult<()> {
    validate_required_name("name", name, 100)
}

fn validate_required_name(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    if value.len() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a barcode.
///
/// ## Rules
/// - Must not be empty (omit the field entirely for unbarcoded products)
/// - At most 50 characters
/// - Digits, letters and hyphens only
pub fn validate_barcode(barcode: &str) -> ValidationResult<()> {
    let barcode = barcode.trim();

    if barcode.is_empty() {
        return Err(ValidationError::Required {
            field: "barcode".to_string(),
        });
    }
    if barcode.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: 50,
        });
    }
    if !barcode.chars().all(|c| c.is_alphanumeric() || c == '-') {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must contain only letters, numbers and hyphens".to_string(),
        });
    }

    Ok(())
}

/// Validates a login name.
///
/// ## Rules
/// - Required, at most 50 characters
/// - Letters, numbers, dots, hyphens and underscores; no spaces
pub fn validate_login(login: &str) -> ValidationResult<()> {
    let login = login.trim();

    if login.is_empty() {
        return Err(ValidationError::Required {
            field: "login".to_string(),
        });
    }
    if login.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "login".to_string(),
            max: 50,
        });
    }
    if !login
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "login".to_string(),
            reason: "must contain only letters, numbers, dots, hyphens and underscores"
                .to_string(),
        });
    }

    Ok(())
}

/// Validates an e-mail address. Format check only, no delivery guarantee.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: 200,
        });
    }
    let valid = email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
        .unwrap_or(false);
    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@domain.tld".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity: positive, at most [`MAX_LINE_QUANTITY`].
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents: non-negative, at most [`MAX_PRICE_CENTS`].
/// Zero is allowed (free items).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 || cents > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a stock level for catalog edits: non-negative.
///
/// Stock may only dip below zero transiently inside the ledger's own
/// transaction, never through a catalog write.
pub fn validate_stock_on_hand(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock_on_hand".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_name() {
        assert!(validate_product_name("Arabica Beans 1kg").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name("   ").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn barcode() {
        assert!(validate_barcode("7891000100103").is_ok());
        assert!(validate_barcode("ABC-123").is_ok());
        assert!(validate_barcode("").is_err());
        assert!(validate_barcode("has space").is_err());
        assert!(validate_barcode(&"9".repeat(60)).is_err());
    }

    #[test]
    fn login() {
        assert!(validate_login("admin").is_ok());
        assert!(validate_login("maria.souza_2").is_ok());
        assert!(validate_login("").is_err());
        assert!(validate_login("has space").is_err());
    }

    #[test]
    fn email() {
        assert!(validate_email("ana@example.com").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("@example.com").is_err());
    }

    #[test]
    fn quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(1099).is_ok());
        assert!(validate_price_cents(MAX_PRICE_CENTS).is_ok());
        assert!(validate_price_cents(MAX_PRICE_CENTS + 1).is_err());
        assert!(validate_price_cents(-100).is_err());
    }

    #[test]
    fn stock_on_hand() {
        assert!(validate_stock_on_hand(0).is_ok());
        assert!(validate_stock_on_hand(500).is_ok());
        assert!(validate_stock_on_hand(-1).is_err());
    }
}
