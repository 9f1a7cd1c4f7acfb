//! Mock repository implementations for isolating services in tests.

use mockall::mock;

use crate::domain::transaction::{NewTransaction, Transaction};
use crate::domain::types::{TransactionId, TransactionStatus};
use crate::repository::errors::RepositoryResult;
use crate::repository::{
    TransactionListQuery, TransactionReader, TransactionSummary, TransactionWriter,
};

mock! {
    pub Repository {}

    impl TransactionReader for Repository {
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

    impl TransactionWriter for Repository {
        fn create_transactions(&self, new_transactions: &[NewTransaction]) -> RepositoryResult<usize>;
    }
}
