//! Filter option metadata and active-filter tag compilation.

use serde::{Deserialize, Serialize};

use crate::domain::query::Filters;
use crate::domain::types::{PaymentMethod, TransactionStatus};

/// Selectable value inside a filter group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    pub label: String,
    pub value: String,
}

impl FilterOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Group of checkboxes stored under `key` in [`Filters`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptionGroup {
    pub key: String,
    pub name: String,
    pub items: Vec<FilterOption>,
}

impl FilterOptionGroup {
    pub fn label_for(&self, value: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|item| item.value == value)
            .map(|item| item.label.as_str())
    }
}

/// Chip summarizing one active filter group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FilterTag {
    pub key: String,
    pub name: String,
    pub items: Vec<String>,
}

/// Resolves selected raw values to labels, group by group.
///
/// Groups keep the order of `groups`; labels keep the selection order.
/// Unknown values are skipped and groups without any resolved label are left
/// out.
pub fn compile_tags(groups: &[FilterOptionGroup], selected: &Filters) -> Vec<FilterTag> {
    groups
        .iter()
        .filter_map(|group| {
            let values = selected.get(&group.key)?;
            let items: Vec<String> = values
                .iter()
                .filter_map(|value| group.label_for(value))
                .map(str::to_string)
                .collect();

            (!items.is_empty()).then(|| FilterTag {
                key: group.key.clone(),
                name: group.name.clone(),
                items,
            })
        })
        .collect()
}

pub fn status_label(status: TransactionStatus) -> &'static str {
    match status {
        TransactionStatus::Processing => "Processing",
        TransactionStatus::Authorized => "Authorized",
        TransactionStatus::Paid => "Paid",
        TransactionStatus::Refunded => "Refunded",
        TransactionStatus::WaitingPayment => "Waiting payment",
        TransactionStatus::PendingRefund => "Pending refund",
        TransactionStatus::Refused => "Refused",
        TransactionStatus::Chargedback => "Chargeback",
        TransactionStatus::Analyzing => "Analyzing",
        TransactionStatus::PendingReview => "Pending review",
    }
}

pub fn payment_method_label(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::CreditCard => "Credit card",
        PaymentMethod::DebitCard => "Debit card",
        PaymentMethod::Boleto => "Boleto",
    }
}

const CARD_BRANDS: &[(&str, &str)] = &[
    ("Visa", "visa"),
    ("Mastercard", "mastercard"),
    ("American Express", "amex"),
    ("Elo", "elo"),
    ("Hipercard", "hipercard"),
    ("Diners", "diners"),
    ("Discover", "discover"),
    ("Aura", "aura"),
    ("JCB", "jcb"),
];

/// Filter groups offered on the transaction search screen.
pub fn transaction_filter_options() -> Vec<FilterOptionGroup> {
    vec![
        FilterOptionGroup {
            key: "status".to_string(),
            name: "Status".to_string(),
            items: TransactionStatus::ALL
                .iter()
                .map(|status| FilterOption::new(status_label(*status), status.as_str()))
                .collect(),
        },
        FilterOptionGroup {
            key: "payment_method".to_string(),
            name: "Payment method".to_string(),
            items: PaymentMethod::ALL
                .iter()
                .map(|method| FilterOption::new(payment_method_label(*method), method.as_str()))
                .collect(),
        },
        FilterOptionGroup {
            key: "card_brand".to_string(),
            name: "Card brand".to_string(),
            items: CARD_BRANDS
                .iter()
                .map(|(label, value)| FilterOption::new(*label, *value))
                .collect(),
        },
    ]
}
