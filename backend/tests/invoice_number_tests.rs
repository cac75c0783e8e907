//! Invoice number format tests
//!
//! The wire format is `INV-YYYYMMDD-NNNN`. These tests pin the format
//! validation and the date embedded in the number; uniqueness itself is
//! enforced by the database constraint.

use chrono::{Datelike, NaiveDate};
use proptest::prelude::*;
use shared::validation::{extract_date_from_invoice_number, validate_invoice_number};

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn well_formed_numbers_validate() {
        assert!(validate_invoice_number("INV-20250101-0001"));
        assert!(validate_invoice_number("INV-20251231-0042"));
        assert!(validate_invoice_number("INV-20250630-9999"));
    }

    #[test]
    fn sequence_must_be_four_digits() {
        assert!(!validate_invoice_number("INV-20250101-1"));
        assert!(!validate_invoice_number("INV-20250101-012"));
        assert!(!validate_invoice_number("INV-20250101-10000"));
    }

    #[test]
    fn prefix_and_date_are_mandatory() {
        assert!(!validate_invoice_number("INVOICE-20250101-0001"));
        assert!(!validate_invoice_number("INV-250101-0001"));
        assert!(!validate_invoice_number("INV--0001"));
        assert!(!validate_invoice_number("INV-20250101"));
    }

    #[test]
    fn embedded_date_comes_back_out() {
        let date = extract_date_from_invoice_number("INV-20250307-0015").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 3, 7).unwrap());
    }

    #[test]
    fn calendar_impossible_dates_are_rejected() {
        assert!(extract_date_from_invoice_number("INV-20250230-0001").is_none());
        assert!(extract_date_from_invoice_number("INV-20251301-0001").is_none());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;

    fn date_strategy() -> impl Strategy<Value = NaiveDate> {
        (2020i32..=2035, 1u32..=12, 1u32..=28)
            .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Any date and in-range sequence produce a number that validates
        /// and carries its date intact.
        #[test]
        fn formatted_numbers_round_trip(date in date_strategy(), sequence in 0u32..=9999) {
            let invoice_no = format!("INV-{}-{:04}", date.format("%Y%m%d"), sequence);

            prop_assert!(validate_invoice_number(&invoice_no));
            prop_assert_eq!(extract_date_from_invoice_number(&invoice_no), Some(date));
        }

        /// Same-day numbers only differ in the sequence part.
        #[test]
        fn same_day_numbers_share_a_date_scope(
            date in date_strategy(),
            a in 0u32..=9999,
            b in 0u32..=9999
        ) {
            let first = format!("INV-{}-{:04}", date.format("%Y%m%d"), a);
            let second = format!("INV-{}-{:04}", date.format("%Y%m%d"), b);

            let first_date = extract_date_from_invoice_number(&first).unwrap();
            let second_date = extract_date_from_invoice_number(&second).unwrap();
            prop_assert_eq!(first_date, second_date);
            prop_assert_eq!(first_date.year(), date.year());
            prop_assert_eq!((first == second), (a == b));
        }
    }
}
