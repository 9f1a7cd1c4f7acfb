use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use diesel::dsl::sum;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;

use crate::domain::transaction::{ChartPoint, NewTransaction, Transaction};
use crate::domain::types::{SortOrder, TransactionId, TransactionStatus};
use crate::models::transaction::{
    NewTransaction as DbNewTransaction, Transaction as DbTransaction,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{
    DieselRepository, SortField, TransactionListQuery, TransactionReader, TransactionSummary,
    TransactionWriter,
};
use crate::schema::transactions;

type BoxedTransactions = transactions::BoxedQuery<'static, Sqlite>;

/// `LIKE` pattern matching `term` anywhere, with its wildcards taken literally.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Transactions matching every filter of `query`, unordered and unpaginated.
fn filtered(query: &TransactionListQuery) -> BoxedTransactions {
    let mut items = transactions::table.into_boxed();

    if let Some(term) = query.search.as_deref() {
        let pattern = contains_pattern(term);
        let text_match = transactions::customer_name
            .like(pattern.clone())
            .escape('\\')
            .or(transactions::customer_email
                .like(pattern.clone())
                .escape('\\'))
            .or(transactions::customer_document.like(pattern).escape('\\'));
        items = match term.parse::<i32>() {
            Ok(id) => items.filter(text_match.or(transactions::id.eq(id))),
            Err(_) => items.filter(text_match),
        };
    }
    if !query.statuses.is_empty() {
        items = items.filter(transactions::status.eq_any(query.statuses.clone()));
    }
    if !query.payment_methods.is_empty() {
        items = items.filter(transactions::payment_method.eq_any(query.payment_methods.clone()));
    }
    if !query.card_brands.is_empty() {
        items = items.filter(transactions::card_brand.eq_any(query.card_brands.clone()));
    }
    if let Some(from) = query.created_from {
        items = items.filter(transactions::created_at.ge(from));
    }
    if let Some(to) = query.created_to {
        items = items.filter(transactions::created_at.le(to));
    }

    items
}

fn ordered(items: BoxedTransactions, field: SortField, order: SortOrder) -> BoxedTransactions {
    macro_rules! by {
        ($column:expr) => {
            match order {
                SortOrder::Ascending => items
                    .order_by($column.asc())
                    .then_order_by(transactions::id.asc()),
                SortOrder::Descending => items
                    .order_by($column.desc())
                    .then_order_by(transactions::id.desc()),
            }
        };
    }

    match field {
        SortField::CreatedAt => by!(transactions::created_at),
        SortField::Id => by!(transactions::id),
        SortField::Amount => by!(transactions::amount),
        SortField::PaidAmount => by!(transactions::paid_amount),
        SortField::Status => by!(transactions::status),
        SortField::CustomerName => by!(transactions::customer_name),
    }
}

fn into_domain(rows: Vec<DbTransaction>) -> RepositoryResult<Vec<Transaction>> {
    rows.into_iter()
        .map(|row| Transaction::try_from(row).map_err(RepositoryError::from))
        .collect()
}

/// Groups `(created_at, amount)` pairs by calendar day, oldest first.
fn daily_points(rows: Vec<(NaiveDateTime, i32)>) -> Vec<ChartPoint> {
    let mut days: BTreeMap<NaiveDate, (u64, i64)> = BTreeMap::new();
    for (created_at, amount) in rows {
        let entry = days.entry(created_at.date()).or_default();
        entry.0 += 1;
        entry.1 += i64::from(amount);
    }

    days.into_iter()
        .map(|(date, (count, amount))| ChartPoint {
            date,
            count,
            amount,
        })
        .collect()
}

impl TransactionReader for DieselRepository {
    fn get_transaction_by_id(&self, id: TransactionId) -> RepositoryResult<Option<Transaction>> {
        let mut conn = self.conn()?;
        let row = transactions::table
            .find(id.get())
            .first::<DbTransaction>(&mut conn)
            .optional()?;

        row.map(Transaction::try_from)
            .transpose()
            .map_err(RepositoryError::from)
    }

    fn list_transactions(
        &self,
        query: &TransactionListQuery,
    ) -> RepositoryResult<(usize, Vec<Transaction>)> {
        let mut conn = self.conn()?;

        let total: i64 = filtered(query).count().get_result(&mut conn)?;

        let mut items = ordered(filtered(query), query.sort_field, query.sort_order);
        if let Some(pagination) = &query.pagination {
            let per_page = i64::try_from(pagination.per_page).unwrap_or(i64::MAX);
            let skipped = i64::try_from(pagination.page.max(1) - 1)
                .ok()
                .and_then(|pages| pages.checked_mul(per_page));
            match skipped {
                Some(offset) if offset < total => {
                    items = items.limit(per_page).offset(offset);
                }
                _ => return Ok((total as usize, Vec::new())),
            }
        }

        let rows = items.load::<DbTransaction>(&mut conn)?;

        Ok((total as usize, into_domain(rows)?))
    }

    fn summarize_transactions(
        &self,
        query: &TransactionListQuery,
    ) -> RepositoryResult<TransactionSummary> {
        let mut conn = self.conn()?;

        let (amount, paid_amount): (Option<i64>, Option<i64>) = filtered(query)
            .select((sum(transactions::amount), sum(transactions::paid_amount)))
            .get_result(&mut conn)?;

        let pairs = filtered(query)
            .select((transactions::created_at, transactions::amount))
            .load::<(NaiveDateTime, i32)>(&mut conn)?;

        Ok(TransactionSummary {
            amount: amount.unwrap_or_default(),
            paid_amount: paid_amount.unwrap_or_default(),
            daily: daily_points(pairs),
        })
    }

    fn count_transactions_by_status(&self, status: TransactionStatus) -> RepositoryResult<usize> {
        let mut conn = self.conn()?;
        let count: i64 = transactions::table
            .filter(transactions::status.eq(status.as_str()))
            .count()
            .get_result(&mut conn)?;

        Ok(count as usize)
    }
}

impl TransactionWriter for DieselRepository {
    fn create_transactions(&self, new_transactions: &[NewTransaction]) -> RepositoryResult<usize> {
        let insertables = new_transactions
            .iter()
            .map(DbNewTransaction::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let mut conn = self.conn()?;
        let affected = diesel::insert_into(transactions::table)
            .values(&insertables)
            .execute(&mut conn)?;

        Ok(affected)
    }
}
