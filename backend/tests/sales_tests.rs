//! Sales calculation tests
//!
//! Invoice totals and discount handling for the sale orchestrator.

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{calculate_invoice_totals, validation::validate_discount_percent, PaymentMode};
use std::str::FromStr;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn multi_line_subtotal() {
        let totals = calculate_invoice_totals(
            &[(2, dec("45.00")), (1, dec("120.00")), (4, dec("7.50"))],
            Decimal::ZERO,
        );

        assert_eq!(totals.subtotal, dec("240.00"));
        assert_eq!(totals.total_amount, dec("240.00"));
    }

    #[test]
    fn full_discount_zeroes_the_total() {
        let totals = calculate_invoice_totals(&[(3, dec("10.00"))], dec("100"));

        assert_eq!(totals.discount_amount, dec("30.00"));
        assert_eq!(totals.total_amount, Decimal::ZERO);
    }

    #[test]
    fn fractional_discount_keeps_decimal_precision() {
        let totals = calculate_invoice_totals(&[(1, dec("99.99"))], dec("12.5"));

        assert_eq!(totals.discount_amount, dec("12.498750"));
        assert_eq!(totals.total_amount, totals.subtotal - totals.discount_amount);
    }

    #[test]
    fn discount_validation_bounds() {
        assert!(validate_discount_percent(dec("0")).is_ok());
        assert!(validate_discount_percent(dec("12.5")).is_ok());
        assert!(validate_discount_percent(dec("100")).is_ok());
        assert!(validate_discount_percent(dec("100.01")).is_err());
        assert!(validate_discount_percent(dec("-0.01")).is_err());
    }

    #[test]
    fn payment_modes_round_trip_through_storage_strings() {
        for mode in [
            PaymentMode::Cash,
            PaymentMode::Card,
            PaymentMode::BankTransfer,
            PaymentMode::Credit,
        ] {
            assert_eq!(PaymentMode::from_str(mode.as_str()), Some(mode));
        }
        assert_eq!(PaymentMode::from_str("CHEQUE"), None);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;

    fn price_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=100000i64).prop_map(|n| Decimal::new(n, 2))
    }

    fn line_strategy() -> impl Strategy<Value = (i32, Decimal)> {
        (1i32..=100, price_strategy())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The total is always the subtotal minus the discount amount, and
        /// never negative for a valid discount.
        #[test]
        fn totals_are_internally_consistent(
            items in prop::collection::vec(line_strategy(), 1..8),
            discount_cents in 0i64..=10000
        ) {
            let discount = Decimal::new(discount_cents, 2);
            let totals = calculate_invoice_totals(&items, discount);

            prop_assert_eq!(totals.total_amount, totals.subtotal - totals.discount_amount);
            prop_assert!(totals.total_amount >= Decimal::ZERO);
            prop_assert!(totals.discount_amount <= totals.subtotal);
        }

        /// Zero discount leaves the subtotal untouched.
        #[test]
        fn zero_discount_is_identity(items in prop::collection::vec(line_strategy(), 1..8)) {
            let totals = calculate_invoice_totals(&items, Decimal::ZERO);

            prop_assert_eq!(totals.total_amount, totals.subtotal);
            prop_assert_eq!(totals.discount_amount, Decimal::ZERO);
        }

        /// The subtotal is the sum of quantity times unit price per line.
        #[test]
        fn subtotal_matches_line_sum(items in prop::collection::vec(line_strategy(), 1..8)) {
            let expected: Decimal = items
                .iter()
                .map(|(qty, price)| Decimal::from(*qty) * price)
                .sum();

            let totals = calculate_invoice_totals(&items, Decimal::ZERO);
            prop_assert_eq!(totals.subtotal, expected);
        }
    }
}
