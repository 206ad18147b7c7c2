//! Validation utilities for the Bakehouse Inventory Platform

use rust_decimal::Decimal;

// ============================================================================
// Quantity Validations
// ============================================================================

/// Validate that a quantity is strictly positive
pub fn validate_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate stock thresholds: minimum must not exceed ideal
pub fn validate_stock_thresholds(minimum: Decimal, ideal: Decimal) -> Result<(), &'static str> {
    if minimum < Decimal::ZERO || ideal < Decimal::ZERO {
        return Err("Stock thresholds cannot be negative");
    }
    if minimum > ideal {
        return Err("Minimum stock cannot exceed ideal stock");
    }
    Ok(())
}

/// Validate a unit of measure (short free-form label)
pub fn validate_unit(unit: &str) -> Result<(), &'static str> {
    if unit.trim().is_empty() {
        return Err("Unit is required");
    }
    if unit.len() > 16 {
        return Err("Unit must be at most 16 characters");
    }
    Ok(())
}

// ============================================================================
// Batch Number Validations
// ============================================================================

/// Validate an ingredient batch number format
/// Format: BAT-YYYY-NNNNN (e.g. BAT-2025-00042)
pub fn validate_batch_number(batch_number: &str) -> Result<(), &'static str> {
    let parts: Vec<&str> = batch_number.split('-').collect();

    if parts.len() != 3 {
        return Err("Batch number must be in format BAT-YYYY-NNNNN");
    }

    if parts[0] != "BAT" {
        return Err("Batch number must start with 'BAT'");
    }

    if parts[1].len() != 4 || !parts[1].chars().all(|c| c.is_ascii_digit()) {
        return Err("Invalid year in batch number");
    }

    if parts[2].len() != 5 || !parts[2].chars().all(|c| c.is_ascii_digit()) {
        return Err("Invalid sequence number in batch number");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(Decimal::from(10)).is_ok());
        assert!(validate_quantity(Decimal::ZERO).is_err());
        assert!(validate_quantity(Decimal::from(-5)).is_err());
    }

    #[test]
    fn test_validate_stock_thresholds_valid() {
        assert!(validate_stock_thresholds(Decimal::from(5), Decimal::from(20)).is_ok());
        assert!(validate_stock_thresholds(Decimal::ZERO, Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_validate_stock_thresholds_invalid() {
        assert!(validate_stock_thresholds(Decimal::from(25), Decimal::from(20)).is_err());
        assert!(validate_stock_thresholds(Decimal::from(-1), Decimal::from(20)).is_err());
    }

    #[test]
    fn test_validate_unit() {
        assert!(validate_unit("kg").is_ok());
        assert!(validate_unit("pcs").is_ok());
        assert!(validate_unit("").is_err());
        assert!(validate_unit("   ").is_err());
        assert!(validate_unit("a-very-long-unit-name").is_err());
    }

    #[test]
    fn test_validate_batch_number_valid() {
        assert!(validate_batch_number("BAT-2025-00042").is_ok());
        assert!(validate_batch_number("BAT-2024-99999").is_ok());
    }

    #[test]
    fn test_validate_batch_number_invalid() {
        assert!(validate_batch_number("BAT-25-42").is_err());
        assert!(validate_batch_number("LOT-2025-00042").is_err());
        assert!(validate_batch_number("BAT202500042").is_err());
        assert!(validate_batch_number("BAT-2025-0042").is_err());
    }
}
