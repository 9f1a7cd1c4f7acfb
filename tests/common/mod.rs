#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use pilot::db::{DbPool, establish_connection_pool};
use pilot::domain::transaction::NewTransaction;
use pilot::domain::types::{PaymentMethod, TransactionStatus};
use tempfile::TempDir;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// SQLite database in a temporary directory, migrated and removed on drop.
pub struct TestDb {
    _dir: TempDir,
    pool: DbPool,
}

impl TestDb {
    pub fn new(name: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join(name);
        let pool = establish_connection_pool(path.to_str().expect("utf-8 path"))
            .expect("create connection pool");

        let mut conn = pool.get().expect("get connection");
        conn.run_pending_migrations(MIGRATIONS)
            .expect("run migrations");

        Self { _dir: dir, pool }
    }

    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }
}

pub fn at(month: u32, day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, month, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

pub fn new_transaction(
    name: &str,
    status: TransactionStatus,
    method: PaymentMethod,
    amount: i64,
    created_at: NaiveDateTime,
) -> NewTransaction {
    let card_brand = (method != PaymentMethod::Boleto).then(|| "visa".to_string());
    NewTransaction::try_new(
        status,
        method,
        card_brand,
        amount,
        if status == TransactionStatus::Paid { amount } else { 0 },
        1,
        name.to_string(),
        Some(format!("{}@example.com", name.to_lowercase())),
        Some(created_at),
    )
    .unwrap()
}

/// Four transactions spread over three days.
pub fn seed() -> Vec<NewTransaction> {
    vec![
        new_transaction("Alice", TransactionStatus::Paid, PaymentMethod::CreditCard, 1000, at(3, 1, 9)),
        new_transaction("Bob", TransactionStatus::Refused, PaymentMethod::DebitCard, 2500, at(3, 1, 18)),
        new_transaction("Carla", TransactionStatus::PendingReview, PaymentMethod::Boleto, 700, at(3, 2, 12)),
        new_transaction("Dan", TransactionStatus::Paid, PaymentMethod::CreditCard, 300, at(3, 5, 8)),
    ]
}
