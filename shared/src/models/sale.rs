//! Sales models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMode {
    Cash,
    Card,
    BankTransfer,
    Credit,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Cash => "CASH",
            PaymentMode::Card => "CARD",
            PaymentMode::BankTransfer => "BANK_TRANSFER",
            PaymentMode::Credit => "CREDIT",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "CASH" => Some(PaymentMode::Cash),
            "CARD" => Some(PaymentMode::Card),
            "BANK_TRANSFER" => Some(PaymentMode::BankTransfer),
            "CREDIT" => Some(PaymentMode::Credit),
            _ => None,
        }
    }
}

/// A completed sale. The invoice number is the external correlation key
/// carried into the stock ledger's reason text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub customer_id: Uuid,
    pub invoice_no: String,
    pub total_amount: Decimal,
    pub discount_percent: Decimal,
    pub payment_mode: PaymentMode,
    pub sale_date: DateTime<Utc>,
    pub created_by: Option<Uuid>,
}

/// One line of a sale. Batch consumption is not recorded here; it lives
/// in the stock ledger keyed by batch id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItem {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Sale together with its line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleWithItems {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

/// Totals breakdown for an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub discount_percent: Decimal,
    pub discount_amount: Decimal,
    pub total_amount: Decimal,
}

/// Calculate invoice totals from line quantities and unit prices.
pub fn calculate_invoice_totals(
    items: &[(i32, Decimal)],
    discount_percent: Decimal,
) -> InvoiceTotals {
    let subtotal: Decimal = items
        .iter()
        .map(|(qty, unit_price)| Decimal::from(*qty) * unit_price)
        .sum();
    let discount_amount = subtotal * discount_percent / Decimal::from(100);
    InvoiceTotals {
        subtotal,
        discount_percent,
        discount_amount,
        total_amount: subtotal - discount_amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn totals_without_discount() {
        let totals = calculate_invoice_totals(&[(3, dec("10.00")), (2, dec("5.50"))], Decimal::ZERO);
        assert_eq!(totals.subtotal, dec("41.00"));
        assert_eq!(totals.discount_amount, Decimal::ZERO);
        assert_eq!(totals.total_amount, dec("41.00"));
    }

    #[test]
    fn totals_with_discount() {
        let totals = calculate_invoice_totals(&[(10, dec("20.00"))], dec("25"));
        assert_eq!(totals.subtotal, dec("200.00"));
        assert_eq!(totals.discount_amount, dec("50.00"));
        assert_eq!(totals.total_amount, dec("150.00"));
    }
}
