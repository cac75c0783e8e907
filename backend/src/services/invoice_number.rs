//! Invoice number allocation
//!
//! Invoice numbers are `INV-YYYYMMDD-NNNN`: date-scoped with a 4-digit
//! sequence. The first candidate comes from the same-day sale count; the
//! unique constraint on `sales.invoice_no` is the authority on
//! uniqueness, and the sale orchestrator retries with random suffixes on
//! collision inside the owning transaction. Uniqueness is never decided
//! from a prior read.

use chrono::NaiveDate;
use rand::Rng;
use sqlx::{Postgres, Transaction};

use crate::error::AppResult;

/// Maximum collision retries before giving up with
/// `InvoiceNumberExhausted`.
pub const MAX_INVOICE_ATTEMPTS: u32 = 100;

/// Format an invoice number for a sale date and sequence number.
pub fn format_invoice_number(date: NaiveDate, sequence: u32) -> String {
    format!("INV-{}-{:04}", date.format("%Y%m%d"), sequence)
}

/// First candidate for `date`: the number of sales already recorded that
/// calendar day, plus one. Concurrent sales can race on this count; the
/// caller resolves collisions against the unique constraint.
pub async fn first_candidate(
    tx: &mut Transaction<'_, Postgres>,
    date: NaiveDate,
) -> AppResult<String> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM sales
        WHERE sale_date >= $1::date AND sale_date < $1::date + INTERVAL '1 day'
        "#,
    )
    .bind(date)
    .fetch_one(&mut **tx)
    .await?;

    Ok(format_invoice_number(date, candidate_sequence(count)))
}

/// The sequence space is 4 digits, so past 9999 same-day sales the count
/// wraps and the collision retry finds a free slot.
fn candidate_sequence(count: i64) -> u32 {
    ((count + 1) % 10_000) as u32
}

/// Fresh candidate after a collision: same date scope, random 4-digit
/// sequence.
pub fn random_candidate(date: NaiveDate) -> String {
    let sequence = rand::thread_rng().gen_range(0..=9999);
    format_invoice_number(date, sequence)
}
