//! Transaction search, export and review counters.

use crate::domain::export::{ExportCell, ExportData};
use crate::domain::query::Query;
use crate::domain::transaction::{
    NewTransaction, PaymentTotals, ResultChart, ResultList, ResultTotals, SearchResult,
    Transaction,
};
use crate::domain::types::{ExportFormat, TransactionId, TransactionStatus};
use crate::export;
use crate::repository::{TransactionListQuery, TransactionReader, TransactionWriter};
use crate::services::{ServiceError, ServiceResult};

/// Column headers of exported files.
pub const EXPORT_HEADERS: &[&str] = &[
    "id",
    "status",
    "payment_method",
    "card_brand",
    "amount",
    "paid_amount",
    "refunded_amount",
    "installments",
    "customer_name",
    "customer_email",
    "customer_document",
    "created_at",
];

const EXPORT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Loads one page of transactions plus totals and the per-day chart.
pub fn search_transactions<R>(repo: &R, query: &Query) -> ServiceResult<SearchResult>
where
    R: TransactionReader + ?Sized,
{
    let list_query = TransactionListQuery::from_query(query);

    let (total, rows) = repo.list_transactions(&list_query).map_err(|err| {
        log::error!("Failed to list transactions: {err}");
        err
    })?;

    let summary = repo.summarize_transactions(&list_query).map_err(|err| {
        log::error!("Failed to summarize transactions: {err}");
        err
    })?;

    Ok(SearchResult {
        list: ResultList { rows },
        chart: ResultChart {
            dataset: summary.daily,
        },
        total: ResultTotals {
            count: total as u64,
            payment: Some(PaymentTotals {
                amount: summary.amount,
                paid_amount: summary.paid_amount,
            }),
        },
    })
}

fn export_row(tx: &Transaction) -> Vec<ExportCell> {
    vec![
        ExportCell::Number(f64::from(tx.id.get())),
        tx.status.as_str().into(),
        tx.payment_method.as_str().into(),
        tx.card_brand.clone().into(),
        ExportCell::Number(tx.amount.cents() as f64 / 100.0),
        ExportCell::Number(tx.paid_amount.cents() as f64 / 100.0),
        ExportCell::Number(tx.refunded_amount.cents() as f64 / 100.0),
        ExportCell::Number(f64::from(tx.installments)),
        tx.customer_name.as_str().into(),
        tx.customer_email.clone().into(),
        tx.customer_document.clone().into(),
        tx.created_at.format(EXPORT_DATE_FORMAT).to_string().into(),
    ]
}

fn export_table(rows: &[Transaction]) -> Vec<Vec<ExportCell>> {
    let header = EXPORT_HEADERS.iter().map(|name| (*name).into()).collect();
    std::iter::once(header)
        .chain(rows.iter().map(export_row))
        .collect()
}

fn delimited(rows: &[Transaction]) -> ServiceResult<String> {
    let internal = |err: String| ServiceError::Internal(format!("csv: {err}"));
    let bytes = export::delimited_bytes(&ExportData::Table(export_table(rows)))
        .map_err(|err| internal(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| internal(err.to_string()))
}

/// Produces every transaction matched by `query` in the requested shape.
pub fn export_transactions<R>(
    repo: &R,
    query: &Query,
    format: ExportFormat,
) -> ServiceResult<ExportData>
where
    R: TransactionReader + ?Sized,
{
    let (_, rows) = repo
        .list_transactions(&TransactionListQuery::from_query(query))
        .map_err(|err| {
            log::error!("Failed to load transactions for export: {err}");
            err
        })?;

    log::info!("Exporting {} transactions as {format}", rows.len());

    match format {
        ExportFormat::Csv => Ok(ExportData::Delimited(delimited(&rows)?)),
        ExportFormat::Xls => Ok(ExportData::Table(export_table(&rows))),
    }
}

/// Number of transactions waiting for manual review.
pub fn count_pending_reviews<R>(repo: &R) -> ServiceResult<u64>
where
    R: TransactionReader + ?Sized,
{
    let count = repo
        .count_transactions_by_status(TransactionStatus::PendingReview)
        .map_err(|err| {
            log::error!("Failed to count pending reviews: {err}");
            err
        })?;

    Ok(count as u64)
}

pub fn load_transaction<R>(repo: &R, id: i32) -> ServiceResult<Transaction>
where
    R: TransactionReader + ?Sized,
{
    let id = TransactionId::new(id)?;
    repo.get_transaction_by_id(id)?
        .ok_or(ServiceError::NotFound)
}

/// Stores imported transactions, returning the number of inserted rows.
pub fn import_transactions<R>(repo: &R, transactions: &[NewTransaction]) -> ServiceResult<usize>
where
    R: TransactionWriter + ?Sized,
{
    if transactions.is_empty() {
        return Ok(0);
    }

    let inserted = repo.create_transactions(transactions).map_err(|err| {
        log::error!("Failed to import transactions: {err}");
        err
    })?;

    log::info!("Imported {inserted} transactions");
    Ok(inserted)
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::codec;
    use crate::domain::transaction::ChartPoint;
    use crate::domain::types::{Amount, PaymentMethod};
    use crate::repository::TransactionSummary;
    use crate::repository::errors::RepositoryError;
    use crate::repository::mock::MockRepository;

    fn sample(id: i32, status: TransactionStatus) -> Transaction {
        let created_at = NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        Transaction {
            id: TransactionId::new(id).unwrap(),
            status,
            payment_method: PaymentMethod::CreditCard,
            card_brand: Some("visa".into()),
            amount: Amount::new(1050).unwrap(),
            paid_amount: Amount::new(1050).unwrap(),
            refunded_amount: Amount::default(),
            installments: 2,
            customer_name: "Ana, Maria".into(),
            customer_email: None,
            customer_document: None,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn search_combines_page_and_summary() {
        let mut repo = MockRepository::new();
        repo.expect_list_transactions()
            .withf(|query| {
                query.statuses == vec!["paid".to_string()]
                    && query.pagination.map(|p| (p.page, p.per_page)) == Some((2, 15))
            })
            .times(1)
            .returning(|_| Ok((16, vec![sample(16, TransactionStatus::Paid)])));
        repo.expect_summarize_transactions()
            .times(1)
            .returning(|_| {
                Ok(TransactionSummary {
                    amount: 20000,
                    paid_amount: 15000,
                    daily: vec![ChartPoint {
                        date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                        count: 16,
                        amount: 20000,
                    }],
                })
            });

        let query = codec::parse("offset=2&filters[status][0]=paid");
        let result = search_transactions(&repo, &query).expect("search succeeds");

        assert_eq!(result.total.count, 16);
        assert_eq!(result.paid_amount(), 15000);
        assert_eq!(result.list.rows.len(), 1);
        assert_eq!(result.chart.dataset.len(), 1);
    }

    #[test]
    fn search_propagates_repository_failures() {
        let mut repo = MockRepository::new();
        repo.expect_list_transactions()
            .returning(|_| Err(RepositoryError::ConnectionError("down".into())));
        repo.expect_summarize_transactions().times(0);

        let result = search_transactions(&repo, &Query::default());

        assert!(matches!(result, Err(ServiceError::Repository(_))));
    }

    #[test]
    fn csv_export_quotes_fields_and_starts_with_header() {
        let mut repo = MockRepository::new();
        repo.expect_list_transactions()
            .returning(|_| Ok((1, vec![sample(1, TransactionStatus::Paid)])));

        let data = export_transactions(&repo, &Query::default(), ExportFormat::Csv).unwrap();

        let ExportData::Delimited(text) = data else {
            panic!("csv export must be delimited text");
        };
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(EXPORT_HEADERS.join(",").as_str()));
        let row = lines.next().unwrap();
        assert!(row.starts_with("1,paid,credit_card,visa,10.5,10.5,0,2,"));
        assert!(row.contains("\"Ana, Maria\""));
    }

    #[test]
    fn xls_export_is_a_table() {
        let mut repo = MockRepository::new();
        repo.expect_list_transactions().returning(|_| {
            Ok((
                2,
                vec![
                    sample(1, TransactionStatus::Paid),
                    sample(2, TransactionStatus::Refused),
                ],
            ))
        });

        let data = export_transactions(&repo, &Query::default(), ExportFormat::Xls).unwrap();

        let ExportData::Table(rows) = data else {
            panic!("xls export must be a table");
        };
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0], ExportCell::Text("id".into()));
        assert_eq!(rows[2][1], ExportCell::Text("refused".into()));
        assert_eq!(rows[1][4], ExportCell::Number(10.5));
        assert_eq!(rows[1][9], ExportCell::Empty);
    }

    #[test]
    fn pending_reviews_counts_by_status() {
        let mut repo = MockRepository::new();
        repo.expect_count_transactions_by_status()
            .withf(|status| *status == TransactionStatus::PendingReview)
            .times(1)
            .returning(|_| Ok(4));

        assert_eq!(count_pending_reviews(&repo).unwrap(), 4);
    }

    #[test]
    fn load_transaction_reports_missing_rows() {
        let mut repo = MockRepository::new();
        repo.expect_get_transaction_by_id().returning(|_| Ok(None));

        assert!(matches!(load_transaction(&repo, 9), Err(ServiceError::NotFound)));
        assert!(matches!(
            load_transaction(&repo, 0),
            Err(ServiceError::TypeConstraint(_))
        ));
    }

    #[test]
    fn empty_import_skips_repository() {
        let mut repo = MockRepository::new();
        repo.expect_create_transactions().times(0);

        assert_eq!(import_transactions(&repo, &[]).unwrap(), 0);
    }
}
