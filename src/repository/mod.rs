use chrono::NaiveDateTime;

use crate::db::{DbConnection, DbPool};
use crate::domain::query::Query;
use crate::domain::transaction::{ChartPoint, NewTransaction, Transaction};
use crate::domain::types::{SortOrder, TransactionId, TransactionStatus};
use crate::repository::errors::RepositoryResult;

pub mod errors;
#[cfg(feature = "test-mocks")]
pub mod mock;
pub mod transaction;

/// Diesel-backed repository over the shared connection pool.
#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool,
}

impl DieselRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
}

/// Columns the transaction list can be ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    CreatedAt,
    Id,
    Amount,
    PaidAmount,
    Status,
    CustomerName,
}

impl SortField {
    /// Unknown names fall back to `created_at`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "id" => SortField::Id,
            "amount" => SortField::Amount,
            "paid_amount" => SortField::PaidAmount,
            "status" => SortField::Status,
            "customer_name" | "name" => SortField::CustomerName,
            _ => SortField::CreatedAt,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransactionListQuery {
    pub search: Option<String>,
    pub statuses: Vec<String>,
    pub payment_methods: Vec<String>,
    pub card_brands: Vec<String>,
    pub created_from: Option<NaiveDateTime>,
    pub created_to: Option<NaiveDateTime>,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
    pub pagination: Option<Pagination>,
}

impl TransactionListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        let term = term.into().trim().to_string();
        self.search = (!term.is_empty()).then_some(term);
        self
    }

    pub fn statuses(mut self, statuses: Vec<String>) -> Self {
        self.statuses = statuses;
        self
    }

    pub fn payment_methods(mut self, methods: Vec<String>) -> Self {
        self.payment_methods = methods;
        self
    }

    pub fn card_brands(mut self, brands: Vec<String>) -> Self {
        self.card_brands = brands;
        self
    }

    pub fn created_between(
        mut self,
        from: Option<NaiveDateTime>,
        to: Option<NaiveDateTime>,
    ) -> Self {
        self.created_from = from;
        self.created_to = to;
        self
    }

    pub fn order_by(mut self, field: SortField, order: SortOrder) -> Self {
        self.sort_field = field;
        self.sort_order = order;
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination {
            page: page.max(1),
            per_page,
        });
        self
    }

    /// Repository filter for a search query, paginated by its offset and count.
    pub fn from_query(query: &Query) -> Self {
        let selected = |key: &str| query.filters.get(key).cloned().unwrap_or_default();
        let sort_field = query
            .sort
            .field
            .first()
            .map(|name| SortField::from_name(name))
            .unwrap_or_default();

        Self::new()
            .search(query.search.as_str())
            .statuses(selected("status"))
            .payment_methods(selected("payment_method"))
            .card_brands(selected("card_brand"))
            .created_between(query.dates.start, query.dates.end)
            .order_by(sort_field, query.sort.order)
            .paginate(query.offset as usize, query.count as usize)
    }
}

/// Aggregates over every transaction matching a filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionSummary {
    pub amount: i64,
    pub paid_amount: i64,
    pub daily: Vec<ChartPoint>,
}

pub trait TransactionReader {
    fn get_transaction_by_id(&self, id: TransactionId) -> RepositoryResult<Option<Transaction>>;
    fn list_transactions(
        &self,
        query: &TransactionListQuery,
    ) -> RepositoryResult<(usize, Vec<Transaction>)>;
    fn summarize_transactions(
        &self,
        query: &TransactionListQuery,
    ) -> RepositoryResult<TransactionSummary>;
    fn count_transactions_by_status(&self, status: TransactionStatus) -> RepositoryResult<usize>;
}

pub trait TransactionWriter {
    fn create_transactions(&self, new_transactions: &[NewTransaction]) -> RepositoryResult<usize>;
}
