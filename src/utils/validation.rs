//! Validation helpers
//!
//! Custom `validator` functions for request DTOs. These only check shape;
//! business rules live in the services.

use rust_decimal::Decimal;
use validator::ValidationError;

/// Reject blank strings (whitespace only counts as blank)
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_blank");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Reject negative decimals
pub fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        let mut error = ValidationError::new("non_negative");
        error.add_param("value".into(), &value.to_string());
        error.add_param("min".into(), &0);
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("Depot 4").is_ok());
        assert!(validate_not_blank("   ").is_err());
        assert!(validate_not_blank("").is_err());
    }

    #[test]
    fn test_validate_non_negative() {
        assert!(validate_non_negative(&Decimal::ZERO).is_ok());
        assert!(validate_non_negative(&Decimal::new(125, 1)).is_ok());
        assert!(validate_non_negative(&Decimal::new(-1, 2)).is_err());
    }
}
