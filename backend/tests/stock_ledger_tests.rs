//! Stock ledger tests
//!
//! Covers the ledger sign convention and the invariant that the inventory
//! counter equals the sum of the signed ledger deltas for a (shop, product).

use proptest::prelude::*;
use shared::StockChangeType;

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn receipts_are_positive() {
        assert_eq!(StockChangeType::PurchaseIn.signed_delta(50), 50);
        // Callers may pass the raw magnitude either way round.
        assert_eq!(StockChangeType::PurchaseIn.signed_delta(-50), 50);
    }

    #[test]
    fn sales_and_returns_are_negative() {
        assert_eq!(StockChangeType::SaleOut.signed_delta(30), -30);
        assert_eq!(StockChangeType::SaleOut.signed_delta(-30), -30);
        assert_eq!(StockChangeType::ReturnToSupplier.signed_delta(5), -5);
        assert_eq!(StockChangeType::ReturnToSupplier.signed_delta(-5), -5);
    }

    #[test]
    fn manual_adjustments_keep_their_sign() {
        assert_eq!(StockChangeType::ManualAdjustment.signed_delta(12), 12);
        assert_eq!(StockChangeType::ManualAdjustment.signed_delta(-12), -12);
    }

    #[test]
    fn change_types_round_trip_through_storage_strings() {
        for change_type in [
            StockChangeType::PurchaseIn,
            StockChangeType::SaleOut,
            StockChangeType::ReturnToSupplier,
            StockChangeType::ManualAdjustment,
        ] {
            assert_eq!(
                StockChangeType::from_str(change_type.as_str()),
                Some(change_type)
            );
        }
        assert_eq!(StockChangeType::from_str("SALE_IN"), None);
    }

    /// Receive 50, sell 30, return 5 to the supplier: the counter lands on
    /// 15 and equals the sum of the signed ledger deltas.
    #[test]
    fn ledger_sums_to_counter_through_a_product_lifecycle() {
        let movements = [
            (StockChangeType::PurchaseIn, 50),
            (StockChangeType::SaleOut, 30),
            (StockChangeType::ReturnToSupplier, 5),
        ];

        let mut counter = 0;
        let mut ledger = Vec::new();
        for (change_type, quantity) in movements {
            let delta = change_type.signed_delta(quantity);
            counter += delta;
            ledger.push(delta);
        }

        assert_eq!(counter, 15);
        assert_eq!(ledger.iter().sum::<i32>(), counter);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;

    fn change_type_strategy() -> impl Strategy<Value = StockChangeType> {
        prop_oneof![
            Just(StockChangeType::PurchaseIn),
            Just(StockChangeType::SaleOut),
            Just(StockChangeType::ReturnToSupplier),
            Just(StockChangeType::ManualAdjustment),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// The counter always equals the running sum of signed deltas, no
        /// matter how movements interleave.
        #[test]
        fn counter_equals_ledger_sum(
            movements in prop::collection::vec((change_type_strategy(), -500i32..=500), 1..40)
        ) {
            let mut counter = 0i32;
            let mut ledger_sum = 0i32;
            for (change_type, quantity) in movements {
                let delta = change_type.signed_delta(quantity);
                counter += delta;
                ledger_sum += delta;
            }
            prop_assert_eq!(counter, ledger_sum);
        }

        /// Non-adjustment movements never lose magnitude when signed.
        #[test]
        fn signing_preserves_magnitude(
            change_type in change_type_strategy(),
            quantity in -500i32..=500
        ) {
            let delta = change_type.signed_delta(quantity);
            prop_assert_eq!(delta.abs(), quantity.abs());
        }

        /// Receipts can only raise the counter; sales and supplier returns
        /// can only lower it.
        #[test]
        fn movement_direction_matches_kind(quantity in 1i32..=500) {
            prop_assert!(StockChangeType::PurchaseIn.signed_delta(quantity) > 0);
            prop_assert!(StockChangeType::SaleOut.signed_delta(quantity) < 0);
            prop_assert!(StockChangeType::ReturnToSupplier.signed_delta(quantity) < 0);
        }
    }
}
