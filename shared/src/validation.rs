//! Validation utilities for the Retail Management Platform

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Validate that a stock quantity is strictly positive.
pub fn validate_positive_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be greater than zero");
    }
    Ok(())
}

/// Validate a sale discount percentage (0 to 100 inclusive).
pub fn validate_discount_percent(discount: Decimal) -> Result<(), &'static str> {
    if discount < Decimal::ZERO || discount > Decimal::from(100) {
        return Err("Discount must be between 0 and 100 percent");
    }
    Ok(())
}

/// Validate an invoice number against the `INV-YYYYMMDD-NNNN` format.
pub fn validate_invoice_number(invoice_no: &str) -> bool {
    let parts: Vec<&str> = invoice_no.split('-').collect();
    if parts.len() != 3 || parts[0] != "INV" {
        return false;
    }
    let date_ok = parts[1].len() == 8 && parts[1].chars().all(|c| c.is_ascii_digit());
    let seq_ok = parts[2].len() == 4 && parts[2].chars().all(|c| c.is_ascii_digit());
    date_ok && seq_ok
}

/// Extract the sale date embedded in an invoice number.
pub fn extract_date_from_invoice_number(invoice_no: &str) -> Option<NaiveDate> {
    if !validate_invoice_number(invoice_no) {
        return None;
    }
    let date_part = invoice_no.split('-').nth(1)?;
    NaiveDate::parse_from_str(date_part, "%Y%m%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_invoice_numbers() {
        assert!(validate_invoice_number("INV-20250115-0001"));
        assert!(validate_invoice_number("INV-20251231-9999"));
    }

    #[test]
    fn rejects_malformed_invoice_numbers() {
        assert!(!validate_invoice_number("INV-2025011-0001"));
        assert!(!validate_invoice_number("INV-20250115-001"));
        assert!(!validate_invoice_number("SALE-20250115-0001"));
        assert!(!validate_invoice_number("INV-20250115-00A1"));
        assert!(!validate_invoice_number(""));
    }

    #[test]
    fn extracts_embedded_date() {
        let date = extract_date_from_invoice_number("INV-20250115-0042").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
    }

    #[test]
    fn extract_rejects_impossible_dates() {
        assert!(extract_date_from_invoice_number("INV-20251340-0001").is_none());
    }

    #[test]
    fn discount_bounds() {
        assert!(validate_discount_percent(Decimal::ZERO).is_ok());
        assert!(validate_discount_percent(Decimal::from(100)).is_ok());
        assert!(validate_discount_percent(Decimal::from(101)).is_err());
        assert!(validate_discount_percent(Decimal::from(-1)).is_err());
    }
}
