use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::transaction::{
    NewTransaction as DomainNewTransaction, Transaction as DomainTransaction,
};
use crate::domain::types::{Amount, TransactionId, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::transactions)]
/// Diesel model for [`crate::domain::transaction::Transaction`].
pub struct Transaction {
    pub id: i32,
    pub status: String,
    pub payment_method: String,
    pub card_brand: Option<String>,
    pub amount: i32,
    pub paid_amount: i32,
    pub refunded_amount: i32,
    pub installments: i32,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_document: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::transactions)]
/// Insertable form of [`Transaction`].
pub struct NewTransaction<'a> {
    pub status: &'a str,
    pub payment_method: &'a str,
    pub card_brand: Option<&'a str>,
    pub amount: i32,
    pub paid_amount: i32,
    pub refunded_amount: i32,
    pub installments: i32,
    pub customer_name: &'a str,
    pub customer_email: Option<&'a str>,
    pub customer_document: Option<&'a str>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

fn to_column(amount: Amount) -> Result<i32, TypeConstraintError> {
    i32::try_from(amount.cents())
        .map_err(|_| TypeConstraintError::InvalidValue(format!("amount {amount} is too large")))
}

impl TryFrom<Transaction> for DomainTransaction {
    type Error = TypeConstraintError;

    fn try_from(tx: Transaction) -> Result<Self, Self::Error> {
        Ok(Self {
            id: TransactionId::new(tx.id)?,
            status: tx.status.parse()?,
            payment_method: tx.payment_method.parse()?,
            card_brand: tx.card_brand,
            amount: Amount::new(tx.amount.into())?,
            paid_amount: Amount::new(tx.paid_amount.into())?,
            refunded_amount: Amount::new(tx.refunded_amount.into())?,
            installments: tx.installments,
            customer_name: tx.customer_name,
            customer_email: tx.customer_email,
            customer_document: tx.customer_document,
            created_at: tx.created_at,
            updated_at: tx.updated_at,
        })
    }
}

impl<'a> TryFrom<&'a DomainNewTransaction> for NewTransaction<'a> {
    type Error = TypeConstraintError;

    fn try_from(tx: &'a DomainNewTransaction) -> Result<Self, Self::Error> {
        Ok(Self {
            status: tx.status.as_str(),
            payment_method: tx.payment_method.as_str(),
            card_brand: tx.card_brand.as_deref(),
            amount: to_column(tx.amount)?,
            paid_amount: to_column(tx.paid_amount)?,
            refunded_amount: to_column(tx.refunded_amount)?,
            installments: tx.installments,
            customer_name: tx.customer_name.as_str(),
            customer_email: tx.customer_email.as_deref(),
            customer_document: tx.customer_document.as_deref(),
            created_at: tx.created_at,
            updated_at: tx.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{PaymentMethod, TransactionStatus};
    use chrono::Utc;

    fn db_row(status: &str) -> Transaction {
        let now = Utc::now().naive_utc();
        Transaction {
            id: 7,
            status: status.to_string(),
            payment_method: "boleto".to_string(),
            card_brand: None,
            amount: 2500,
            paid_amount: 2500,
            refunded_amount: 0,
            installments: 1,
            customer_name: "Ana".to_string(),
            customer_email: Some("ana@example.com".to_string()),
            customer_document: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn row_into_domain() {
        let domain = DomainTransaction::try_from(db_row("paid")).unwrap();
        assert_eq!(domain.id.get(), 7);
        assert_eq!(domain.status, TransactionStatus::Paid);
        assert_eq!(domain.payment_method, PaymentMethod::Boleto);
        assert_eq!(domain.amount.cents(), 2500);
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(DomainTransaction::try_from(db_row("lost")).is_err());
    }

    #[test]
    fn domain_new_into_insertable() {
        let domain = DomainNewTransaction::try_new(
            TransactionStatus::Refused,
            PaymentMethod::CreditCard,
            Some("visa".into()),
            990,
            0,
            3,
            "Bob".into(),
            None,
            None,
        )
        .unwrap();

        let new = NewTransaction::try_from(&domain).unwrap();

        assert_eq!(new.status, "refused");
        assert_eq!(new.payment_method, "credit_card");
        assert_eq!(new.card_brand, Some("visa"));
        assert_eq!(new.amount, 990);
        assert_eq!(new.installments, 3);
        assert_eq!(new.created_at, new.updated_at);
    }
}
