use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::{
    Amount, PaymentMethod, TransactionId, TransactionStatus, TypeConstraintError,
};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: TransactionId,
    pub status: TransactionStatus,
    pub payment_method: PaymentMethod,
    pub card_brand: Option<String>,
    pub amount: Amount,
    pub paid_amount: Amount,
    pub refunded_amount: Amount,
    pub installments: i32,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_document: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewTransaction {
    pub status: TransactionStatus,
    pub payment_method: PaymentMethod,
    pub card_brand: Option<String>,
    pub amount: Amount,
    pub paid_amount: Amount,
    pub refunded_amount: Amount,
    pub installments: i32,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_document: Option<String>,
    pub created_at: NaiveDateTime,
}

impl NewTransaction {
    /// Builds a transaction record, trimming and lower-casing free text.
    #[allow(clippy::too_many_arguments)]
    pub fn try_new(
        status: TransactionStatus,
        payment_method: PaymentMethod,
        card_brand: Option<String>,
        amount: i64,
        paid_amount: i64,
        installments: i32,
        customer_name: String,
        customer_email: Option<String>,
        created_at: Option<NaiveDateTime>,
    ) -> Result<Self, TypeConstraintError> {
        let customer_name = customer_name.trim().to_string();
        if customer_name.is_empty() {
            return Err(TypeConstraintError::EmptyString);
        }
        if installments < 1 {
            return Err(TypeConstraintError::InvalidValue(format!(
                "installments: {installments}"
            )));
        }

        Ok(Self {
            status,
            payment_method,
            card_brand: card_brand
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty()),
            amount: Amount::new(amount)?,
            paid_amount: Amount::new(paid_amount)?,
            refunded_amount: Amount::default(),
            installments,
            customer_name,
            customer_email: customer_email
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty()),
            customer_document: None,
            created_at: created_at.unwrap_or_else(|| Utc::now().naive_utc()),
        })
    }

    pub fn with_refunded_amount(mut self, cents: i64) -> Result<Self, TypeConstraintError> {
        self.refunded_amount = Amount::new(cents)?;
        Ok(self)
    }

    pub fn with_customer_document(mut self, document: Option<String>) -> Self {
        self.customer_document = document
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self
    }
}

/// Per-day aggregate used by the results chart.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub count: u64,
    pub amount: i64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ResultList {
    pub rows: Vec<Transaction>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultChart {
    pub dataset: Vec<ChartPoint>,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentTotals {
    pub amount: i64,
    pub paid_amount: i64,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultTotals {
    pub count: u64,
    pub payment: Option<PaymentTotals>,
}

/// One page of matching transactions plus aggregates over all matches.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub list: ResultList,
    pub chart: ResultChart,
    pub total: ResultTotals,
}

impl SearchResult {
    /// Paid amount over all matches, zero when totals are missing.
    pub fn paid_amount(&self) -> i64 {
        self.total.payment.map_or(0, |payment| payment.paid_amount)
    }
}
