//! Supplier return tests
//!
//! Covers the bookkeeping for returning part of a purchase line: the line
//! is named by its batch, quantities are guarded against what that line
//! received, and received/returned move together.

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::PurchaseItem;
use uuid::Uuid;

fn line(purchase_id: Uuid, product_id: Uuid, batch_id: Uuid, received: i32) -> PurchaseItem {
    PurchaseItem {
        id: Uuid::new_v4(),
        purchase_id,
        product_id,
        quantity: received,
        unit_price: Decimal::new(750, 2),
        received_qty: received,
        returned_qty: 0,
        batch_id: Some(batch_id),
    }
}

/// The orchestrator's line lookup: a purchase can carry several lines of
/// the same product, so the batch id is part of the key.
fn select_line<'a>(
    lines: &'a mut [PurchaseItem],
    purchase_id: Uuid,
    product_id: Uuid,
    batch_id: Uuid,
) -> Option<&'a mut PurchaseItem> {
    lines.iter_mut().find(|l| {
        l.purchase_id == purchase_id && l.product_id == product_id && l.batch_id == Some(batch_id)
    })
}

/// The orchestrator's return bookkeeping over in-memory state. Returns
/// false when the guard rejects the quantity, in which case nothing moves.
fn apply_return(
    item: &mut PurchaseItem,
    batch_remaining: &mut i32,
    counter: &mut i32,
    quantity: i32,
) -> bool {
    if quantity <= 0 || quantity > item.received_qty || quantity > *batch_remaining {
        return false;
    }
    item.received_qty -= quantity;
    item.returned_qty += quantity;
    *batch_remaining -= quantity;
    *counter -= quantity;
    true
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// One purchase, one product, two lots. A return against the second
    /// lot must be guarded by and recorded on the second lot's line, never
    /// the sibling line that happens to share the product.
    #[test]
    fn return_binds_to_the_line_owning_the_batch() {
        let purchase_id = Uuid::new_v4();
        let product_id = Uuid::new_v4();
        let first_lot = Uuid::new_v4();
        let second_lot = Uuid::new_v4();

        let mut lines = vec![
            line(purchase_id, product_id, first_lot, 10),
            line(purchase_id, product_id, second_lot, 3),
        ];
        let mut second_lot_remaining = 3;
        let mut counter = 13;

        // Returning 5 of the second lot exceeds the 3 that lot's line
        // received; the sibling line's 10 must not satisfy the guard.
        let selected = select_line(&mut lines, purchase_id, product_id, second_lot).unwrap();
        assert!(!apply_return(
            selected,
            &mut second_lot_remaining,
            &mut counter,
            5
        ));
        assert_eq!(lines[0].received_qty, 10);
        assert_eq!(lines[1].received_qty, 3);
        assert_eq!(second_lot_remaining, 3);
        assert_eq!(counter, 13);

        // A return that fits lands on the second lot's line only.
        let selected = select_line(&mut lines, purchase_id, product_id, second_lot).unwrap();
        assert!(apply_return(
            selected,
            &mut second_lot_remaining,
            &mut counter,
            2
        ));
        assert_eq!(lines[1].received_qty, 1);
        assert_eq!(lines[1].returned_qty, 2);
        assert_eq!(second_lot_remaining, 1);
        assert_eq!(counter, 11);
        // Sibling line untouched.
        assert_eq!(lines[0].received_qty, 10);
        assert_eq!(lines[0].returned_qty, 0);
    }

    #[test]
    fn unknown_batch_selects_no_line() {
        let purchase_id = Uuid::new_v4();
        let product_id = Uuid::new_v4();
        let mut lines = vec![line(purchase_id, product_id, Uuid::new_v4(), 10)];

        assert!(select_line(&mut lines, purchase_id, product_id, Uuid::new_v4()).is_none());
    }

    #[test]
    fn over_return_moves_nothing() {
        let purchase_id = Uuid::new_v4();
        let product_id = Uuid::new_v4();
        let lot = Uuid::new_v4();
        let mut lines = vec![line(purchase_id, product_id, lot, 4)];
        let mut remaining = 4;
        let mut counter = 4;

        let selected = select_line(&mut lines, purchase_id, product_id, lot).unwrap();
        assert!(!apply_return(selected, &mut remaining, &mut counter, 6));
        assert_eq!(lines[0].received_qty, 4);
        assert_eq!(lines[0].returned_qty, 0);
        assert_eq!(remaining, 4);
        assert_eq!(counter, 4);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Whatever sequence of returns is attempted, a line conserves
        /// `received + returned` at the originally received quantity.
        #[test]
        fn received_plus_returned_is_conserved(
            initial in 1i32..=200,
            attempts in prop::collection::vec(1i32..=50, 1..20)
        ) {
            let purchase_id = Uuid::new_v4();
            let product_id = Uuid::new_v4();
            let lot = Uuid::new_v4();
            let mut item = line(purchase_id, product_id, lot, initial);
            let mut remaining = initial;
            let mut counter = initial;

            for quantity in attempts {
                apply_return(&mut item, &mut remaining, &mut counter, quantity);
                prop_assert_eq!(item.received_qty + item.returned_qty, initial);
                prop_assert!(item.received_qty >= 0);
                prop_assert_eq!(remaining, item.received_qty);
            }
        }

        /// Returns against one lot never move a sibling line of the same
        /// product.
        #[test]
        fn sibling_lines_never_move(
            first in 1i32..=100,
            second in 1i32..=100,
            quantity in 1i32..=100
        ) {
            let purchase_id = Uuid::new_v4();
            let product_id = Uuid::new_v4();
            let first_lot = Uuid::new_v4();
            let second_lot = Uuid::new_v4();
            let mut lines = vec![
                line(purchase_id, product_id, first_lot, first),
                line(purchase_id, product_id, second_lot, second),
            ];
            let mut remaining = second;
            let mut counter = first + second;

            let selected =
                select_line(&mut lines, purchase_id, product_id, second_lot).unwrap();
            apply_return(selected, &mut remaining, &mut counter, quantity);

            prop_assert_eq!(lines[0].received_qty, first);
            prop_assert_eq!(lines[0].returned_qty, 0);
        }
    }
}
