//! Allocation engine
//!
//! Pure planning step for sales: given the FEFO-ordered batches with
//! remaining stock for a (shop, product), split a requested quantity
//! across as many batches as needed. Performs no mutation; the sale
//! orchestrator applies the plan atomically.

use crate::error::{AppError, AppResult};
use shared::{BatchAllocation, ProductBatch};

/// Plan batch draws for `required_qty` units of a product.
///
/// `batches` must already be in FEFO order (`BatchService` guarantees
/// this) and contain only batches with remaining stock. `aggregate_qty`
/// is the inventory counter for the (shop, product); it is only consulted
/// to tell "no stock" apart from "counter and batches disagree".
pub fn plan_allocations(
    product_name: &str,
    aggregate_qty: i32,
    batches: &[ProductBatch],
    required_qty: i32,
) -> AppResult<Vec<BatchAllocation>> {
    if required_qty <= 0 {
        return Err(AppError::Validation {
            field: "quantity".to_string(),
            message: "Requested quantity must be greater than zero".to_string(),
        });
    }

    if batches.is_empty() && aggregate_qty > 0 {
        // The counter says stock exists but no batch backs it. This is a
        // data-integrity bug requiring manual reconciliation, not "no
        // stock".
        return Err(AppError::LedgerInconsistency(format!(
            "Inventory shows {} units of {} but no batches have remaining stock",
            aggregate_qty, product_name
        )));
    }

    let mut allocations = Vec::new();
    let mut remaining = required_qty;

    for batch in batches {
        if remaining <= 0 {
            break;
        }

        let take = remaining.min(batch.remaining_qty);
        allocations.push(BatchAllocation {
            batch_id: batch.id,
            quantity: take,
            unit_price: batch.unit_price,
        });
        remaining -= take;
    }

    if remaining > 0 {
        return Err(AppError::InsufficientInventory {
            product: product_name.to_string(),
            missing: remaining,
        });
    }

    Ok(allocations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn batch(remaining: i32, expiry: Option<(i32, u32, u32)>, created_day: u32) -> ProductBatch {
        ProductBatch {
            id: Uuid::new_v4(),
            batch_number: format!("BATCH-1700000000000-TEST{:02}", created_day),
            supplier_batch_id: None,
            purchase_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            quantity: remaining,
            remaining_qty: remaining,
            unit_price: Decimal::new(1000, 2),
            manufacturing_date: None,
            expiry_date: expiry.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            created_at: Utc.with_ymd_and_hms(2024, 11, created_day, 8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn splits_across_batches_in_order() {
        // Earliest expiry first, undated last; FEFO order as the batch
        // store returns it.
        let batches = vec![
            batch(5, Some((2025, 1, 1)), 1),
            batch(5, Some((2025, 6, 1)), 2),
            batch(5, None, 3),
        ];

        let plan = plan_allocations("Milk", 15, &batches, 7).unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].batch_id, batches[0].id);
        assert_eq!(plan[0].quantity, 5);
        assert_eq!(plan[1].batch_id, batches[1].id);
        assert_eq!(plan[1].quantity, 2);
    }

    #[test]
    fn exact_fit_drains_one_batch() {
        let batches = vec![batch(5, Some((2025, 1, 1)), 1), batch(5, None, 2)];

        let plan = plan_allocations("Milk", 10, &batches, 5).unwrap();

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].quantity, 5);
    }

    #[test]
    fn shortfall_reports_missing_units() {
        let batches = vec![batch(3, Some((2025, 1, 1)), 1)];

        let err = plan_allocations("Milk", 3, &batches, 10).unwrap_err();

        match err {
            AppError::InsufficientInventory { product, missing } => {
                assert_eq!(product, "Milk");
                assert_eq!(missing, 7);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn counter_without_batches_is_an_inconsistency() {
        let err = plan_allocations("Milk", 12, &[], 5).unwrap_err();

        assert!(matches!(err, AppError::LedgerInconsistency(_)));
    }

    #[test]
    fn no_counter_and_no_batches_is_just_no_stock() {
        let err = plan_allocations("Milk", 0, &[], 5).unwrap_err();

        assert!(matches!(err, AppError::InsufficientInventory { .. }));
    }

    #[test]
    fn rejects_non_positive_quantity() {
        let batches = vec![batch(5, None, 1)];

        assert!(matches!(
            plan_allocations("Milk", 5, &batches, 0),
            Err(AppError::Validation { .. })
        ));
        assert!(matches!(
            plan_allocations("Milk", 5, &batches, -3),
            Err(AppError::Validation { .. })
        ));
    }

    // The sale orchestrator's apply step, over in-memory state: draw each
    // allocation down from its batch and the counter.
    fn apply(counter: &mut i32, batches: &mut [ProductBatch], plan: &[BatchAllocation]) {
        for allocation in plan {
            let batch = batches
                .iter_mut()
                .find(|b| b.id == allocation.batch_id)
                .unwrap();
            batch.remaining_qty -= allocation.quantity;
            *counter -= allocation.quantity;
        }
    }

    #[test]
    fn short_second_line_applies_nothing() {
        // Two-line sale; the second line is short. Planning runs for every
        // line before anything is applied, so the first line's stock must
        // not move.
        let mut tea_batches = vec![batch(10, Some((2025, 1, 1)), 1)];
        let mut tea_counter = 10;
        let mut milk_batches = vec![batch(2, Some((2025, 2, 1)), 2)];
        let mut milk_counter = 2;

        let planned: AppResult<Vec<Vec<BatchAllocation>>> = [
            plan_allocations("Tea", tea_counter, &tea_batches, 4),
            plan_allocations("Milk", milk_counter, &milk_batches, 5),
        ]
        .into_iter()
        .collect();

        match planned {
            Ok(plans) => {
                apply(&mut tea_counter, &mut tea_batches, &plans[0]);
                apply(&mut milk_counter, &mut milk_batches, &plans[1]);
                panic!("planning should have failed on the short line");
            }
            Err(AppError::InsufficientInventory { product, missing }) => {
                assert_eq!(product, "Milk");
                assert_eq!(missing, 3);
            }
            Err(other) => panic!("unexpected error: {:?}", other),
        }

        assert_eq!(tea_counter, 10);
        assert_eq!(tea_batches[0].remaining_qty, 10);
        assert_eq!(milk_counter, 2);
        assert_eq!(milk_batches[0].remaining_qty, 2);
    }

    #[test]
    fn fully_planned_sale_applies_every_line() {
        let mut tea_batches = vec![batch(3, Some((2025, 1, 1)), 1), batch(7, None, 2)];
        let mut tea_counter = 10;
        let mut milk_batches = vec![batch(2, Some((2025, 2, 1)), 3)];
        let mut milk_counter = 2;

        let plans = [
            plan_allocations("Tea", tea_counter, &tea_batches, 5).unwrap(),
            plan_allocations("Milk", milk_counter, &milk_batches, 2).unwrap(),
        ];
        apply(&mut tea_counter, &mut tea_batches, &plans[0]);
        apply(&mut milk_counter, &mut milk_batches, &plans[1]);

        assert_eq!(tea_counter, 5);
        assert_eq!(tea_batches[0].remaining_qty, 0);
        assert_eq!(tea_batches[1].remaining_qty, 5);
        assert_eq!(milk_counter, 0);
        assert_eq!(milk_batches[0].remaining_qty, 0);

        // Counter and batch totals stay in step after the apply.
        let tea_backing: i32 = tea_batches.iter().map(|b| b.remaining_qty).sum();
        assert_eq!(tea_counter, tea_backing);
    }

    #[test]
    fn allocations_preserve_batch_prices() {
        let mut cheap = batch(4, Some((2025, 2, 1)), 1);
        cheap.unit_price = Decimal::new(500, 2);
        let mut dear = batch(4, Some((2025, 3, 1)), 2);
        dear.unit_price = Decimal::new(900, 2);

        let plan = plan_allocations("Milk", 8, &[cheap.clone(), dear.clone()], 6).unwrap();

        assert_eq!(plan[0].unit_price, cheap.unit_price);
        assert_eq!(plan[1].unit_price, dear.unit_price);
    }
}
