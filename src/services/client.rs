use std::future::{Future, ready};

use crate::controller::runner::{ClientError, TransactionsClient};
use crate::domain::export::ExportData;
use crate::domain::query::Query;
use crate::domain::transaction::SearchResult;
use crate::domain::types::ExportFormat;
use crate::repository::TransactionReader;
use crate::services::transactions;

/// Search client answering straight from the repository.
pub struct RepositoryClient<'a, R: ?Sized> {
    repo: &'a R,
}

impl<'a, R: TransactionReader + ?Sized> RepositoryClient<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }
}

impl<R: TransactionReader + ?Sized> TransactionsClient for RepositoryClient<'_, R> {
    fn search(&self, query: &Query) -> impl Future<Output = Result<SearchResult, ClientError>> {
        ready(transactions::search_transactions(self.repo, query).map_err(ClientError::from))
    }

    fn export_data(
        &self,
        query: &Query,
        format: ExportFormat,
    ) -> impl Future<Output = Result<ExportData, ClientError>> {
        ready(
            transactions::export_transactions(self.repo, query, format).map_err(ClientError::from),
        )
    }

    fn count_pending_reviews(&self) -> impl Future<Output = Result<u64, ClientError>> {
        ready(transactions::count_pending_reviews(self.repo).map_err(ClientError::from))
    }
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use super::*;
    use crate::controller::runner::{LogObserver, MemoryHistory, SearchRunner};
    use crate::controller::{Action, SearchController, Status};
    use crate::export::{BufferedSink, ExportEmitter};
    use crate::repository::TransactionSummary;
    use crate::repository::errors::RepositoryError;
    use crate::repository::mock::MockRepository;

    #[actix_web::test]
    async fn runner_over_repository_client() {
        let mut repo = MockRepository::new();
        repo.expect_list_transactions()
            .returning(|_| Ok((0, Vec::new())));
        repo.expect_summarize_transactions()
            .returning(|_| Ok(TransactionSummary::default()));
        repo.expect_count_transactions_by_status()
            .returning(|_| Err(RepositoryError::ConnectionError("busy".into())));

        let mut runner = SearchRunner::new(
            SearchController::new("", Query::default()),
            RepositoryClient::new(&repo),
            MemoryHistory::default(),
            LogObserver,
            ExportEmitter::new(BufferedSink::default()),
            "Pilot",
        );
        runner.dispatch(Action::Mount).await;

        let state = runner.controller().state();
        assert_eq!(state.status, Status::Ready);
        assert_eq!(state.pending_reviews_count, None);
    }
}
