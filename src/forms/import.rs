//! CSV import of transactions.

use std::io::Read;

use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;

use crate::codec::parse_date;
use crate::domain::query::start_of_day;
use crate::domain::transaction::NewTransaction;
use crate::domain::types::{Amount, PaymentMethod, TransactionStatus, TypeConstraintError};
use crate::forms::FormError;

const REQUIRED_COLUMNS: &[&str] = &["status", "payment_method", "amount", "customer_name"];

#[derive(Debug, Deserialize)]
struct ImportRow {
    status: String,
    payment_method: String,
    amount: String,
    customer_name: String,
    #[serde(default)]
    paid_amount: Option<String>,
    #[serde(default)]
    refunded_amount: Option<String>,
    #[serde(default)]
    installments: Option<i32>,
    #[serde(default)]
    card_brand: Option<String>,
    #[serde(default)]
    customer_email: Option<String>,
    #[serde(default)]
    customer_document: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}

fn parse_amount(value: Option<&str>) -> Result<Option<i64>, TypeConstraintError> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => Ok(Some(value.parse::<Amount>()?.cents())),
        None => Ok(None),
    }
}

fn parse_created_at(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|date_time| date_time.naive_utc())
        })
        .or_else(|| parse_date(value).map(start_of_day))
}

impl ImportRow {
    fn into_transaction(self) -> Result<NewTransaction, TypeConstraintError> {
        let status: TransactionStatus = self.status.parse()?;
        let payment_method: PaymentMethod = self.payment_method.parse()?;
        let amount = parse_amount(Some(self.amount.as_str()))?.unwrap_or_default();
        let paid_amount = parse_amount(self.paid_amount.as_deref())?.unwrap_or(amount);
        let refunded_amount = parse_amount(self.refunded_amount.as_deref())?.unwrap_or_default();
        let created_at = match self.created_at.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => Some(
                parse_created_at(value)
                    .ok_or_else(|| TypeConstraintError::InvalidValue(value.to_string()))?,
            ),
            _ => None,
        };

        Ok(NewTransaction::try_new(
            status,
            payment_method,
            self.card_brand,
            amount,
            paid_amount,
            self.installments.unwrap_or(1),
            self.customer_name,
            self.customer_email,
            created_at,
        )?
        .with_refunded_amount(refunded_amount)?
        .with_customer_document(self.customer_document))
    }
}

/// Reads transactions from CSV with a header line. Columns may come in any
/// order; amounts are in currency units.
pub fn parse_transactions_csv<R: Read>(reader: R) -> Result<Vec<NewTransaction>, FormError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = rdr.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|header| header == *column) {
            return Err(FormError::MissingColumn(*column));
        }
    }

    let mut transactions = Vec::new();
    for (index, row) in rdr.deserialize::<ImportRow>().enumerate() {
        let line = index as u64 + 2;
        let row = row.map_err(|err| FormError::InvalidRow {
            line,
            reason: err.to_string(),
        })?;
        let transaction = row.into_transaction().map_err(|err| FormError::InvalidRow {
            line,
            reason: err.to_string(),
        })?;
        transactions.push(transaction);
    }

    Ok(transactions)
}
