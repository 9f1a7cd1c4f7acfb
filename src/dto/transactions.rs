use serde::Serialize;

use crate::codec::{self, DATE_FORMAT};
use crate::controller::{SearchController, Status};
use crate::domain::filter::{
    FilterOptionGroup, FilterTag, payment_method_label, status_label,
};
use crate::domain::query::{DatePreset, Query};
use crate::domain::transaction::{ChartPoint, Transaction};
use crate::domain::types::{Amount, ExportFormat, SortOrder};
use crate::pagination::PageLinks;

/// One table row, pre-formatted for display.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionRow {
    pub index: usize,
    pub id: i32,
    pub status: &'static str,
    pub status_label: &'static str,
    pub payment_method: &'static str,
    pub card_brand: String,
    pub amount: String,
    pub paid_amount: String,
    pub installments: i32,
    pub customer_name: String,
    pub customer_email: String,
    pub created_at: String,
}

impl TransactionRow {
    fn new(index: usize, tx: &Transaction) -> Self {
        Self {
            index,
            id: tx.id.get(),
            status: tx.status.as_str(),
            status_label: status_label(tx.status),
            payment_method: payment_method_label(tx.payment_method),
            card_brand: tx.card_brand.clone().unwrap_or_default(),
            amount: tx.amount.to_string(),
            paid_amount: tx.paid_amount.to_string(),
            installments: tx.installments,
            customer_name: tx.customer_name.clone(),
            customer_email: tx.customer_email.clone().unwrap_or_default(),
            created_at: tx.created_at.format("%m/%d/%Y %H:%M").to_string(),
        }
    }
}

/// Sortable table header; `next_order` is what a click applies.
#[derive(Debug, Clone, Serialize)]
pub struct SortColumn {
    pub field: &'static str,
    pub label: &'static str,
    pub active: bool,
    pub next_order: SortOrder,
}

const SORT_COLUMNS: &[(&str, &str)] = &[
    ("id", "ID"),
    ("status", "Status"),
    ("customer_name", "Customer"),
    ("amount", "Amount"),
    ("paid_amount", "Paid"),
    ("created_at", "Created"),
];

#[derive(Debug, Clone, Serialize)]
pub struct ChartRow {
    pub date: String,
    pub count: u64,
    pub amount: String,
}

impl From<&ChartPoint> for ChartRow {
    fn from(point: &ChartPoint) -> Self {
        Self {
            date: point.date.format(DATE_FORMAT).to_string(),
            count: point.count,
            amount: money(point.amount),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterChoice {
    pub label: String,
    pub value: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterGroupView {
    pub key: String,
    pub name: String,
    pub items: Vec<FilterChoice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PresetView {
    pub key: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportLink {
    pub format: &'static str,
    pub href: String,
}

/// Data required to render the transaction search template.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionsPageData {
    /// Query string the page was rendered for; posted back by every form.
    pub location: String,
    pub query: Query,
    pub start: String,
    pub end: String,
    pub columns: Vec<SortColumn>,
    pub rows: Vec<TransactionRow>,
    pub chart: Vec<ChartRow>,
    pub total_count: u64,
    pub total_amount: String,
    pub paid_amount: String,
    pub pages: PageLinks,
    pub tags: Vec<FilterTag>,
    pub filter_groups: Vec<FilterGroupView>,
    pub presets: Vec<PresetView>,
    pub exports: Vec<ExportLink>,
    pub status: Status,
    pub exporting: bool,
    pub collapsed: bool,
    pub pending_reviews_count: Option<u64>,
}

/// Cents as currency units, e.g. `1234.56`.
pub fn money(cents: i64) -> String {
    Amount::new(cents).map(|amount| amount.to_string()).unwrap_or_default()
}

impl TransactionsPageData {
    pub fn new(
        controller: &SearchController,
        location: &str,
        groups: &[FilterOptionGroup],
    ) -> Self {
        let state = controller.state();
        let query = &state.query;
        let format_day = |value: Option<chrono::NaiveDateTime>| {
            value
                .map(|date_time| date_time.format(DATE_FORMAT).to_string())
                .unwrap_or_default()
        };

        let filter_groups = groups
            .iter()
            .map(|group| {
                let selected = query.filters.get(&group.key);
                FilterGroupView {
                    key: group.key.clone(),
                    name: group.name.clone(),
                    items: group
                        .items
                        .iter()
                        .map(|item| FilterChoice {
                            label: item.label.clone(),
                            value: item.value.clone(),
                            selected: selected.is_some_and(|values| values.contains(&item.value)),
                        })
                        .collect(),
                }
            })
            .collect();

        let search = codec::serialize(query).unwrap_or_else(|err| {
            log::warn!("Failed to serialize export query: {err}");
            String::new()
        });
        let exports = ExportFormat::ALL
            .iter()
            .map(|format| ExportLink {
                format: format.as_str(),
                href: format!("/transactions/export?format={format}&{search}"),
            })
            .collect();

        let payment = state.result.total.payment.unwrap_or_default();

        Self {
            location: location.to_string(),
            query: query.clone(),
            start: format_day(query.dates.start),
            end: format_day(query.dates.end),
            columns: SORT_COLUMNS
                .iter()
                .map(|&(field, label)| {
                    let active = query.sort.field.first().map(String::as_str) == Some(field);
                    SortColumn {
                        field,
                        label,
                        active,
                        next_order: if active && query.sort.order == SortOrder::Descending {
                            SortOrder::Ascending
                        } else {
                            SortOrder::Descending
                        },
                    }
                })
                .collect(),
            rows: state
                .result
                .list
                .rows
                .iter()
                .enumerate()
                .map(|(index, tx)| TransactionRow::new(index, tx))
                .collect(),
            chart: state.result.chart.dataset.iter().map(ChartRow::from).collect(),
            total_count: state.result.total.count,
            total_amount: money(payment.amount),
            paid_amount: money(payment.paid_amount),
            pages: PageLinks::new(u64::from(query.offset), state.total_pages()),
            tags: controller.filter_tags(groups),
            filter_groups,
            presets: DatePreset::ALL
                .iter()
                .map(|preset| PresetView {
                    key: preset.key(),
                    label: preset.label(),
                })
                .collect(),
            exports,
            status: state.status,
            exporting: state.exporting,
            collapsed: state.collapsed,
            pending_reviews_count: state.pending_reviews_count,
        }
    }
}
