//! Executes controller effects against injected collaborators.

use std::collections::VecDeque;
use std::future::Future;

use chrono::{Local, NaiveDateTime};
use thiserror::Error;

use crate::controller::{Action, Effect, SearchController};
use crate::domain::export::ExportData;
use crate::domain::query::Query;
use crate::domain::transaction::SearchResult;
use crate::domain::types::ExportFormat;
use crate::export::{DownloadSink, ExportEmitter, export_filename_base};
use crate::services::ServiceError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("transactions API unavailable: {0}")]
    Unavailable(String),
}

/// Data source the search screen talks to.
pub trait TransactionsClient {
    fn search(&self, query: &Query) -> impl Future<Output = Result<SearchResult, ClientError>>;

    fn export_data(
        &self,
        query: &Query,
        format: ExportFormat,
    ) -> impl Future<Output = Result<ExportData, ClientError>>;

    fn count_pending_reviews(&self) -> impl Future<Output = Result<u64, ClientError>>;
}

/// URL bar of the screen.
pub trait History {
    fn push(&mut self, pathname: &str, search: &str);
    fn navigate(&mut self, path: &str);
}

/// Gets told when searches start, finish or get cleared.
pub trait SearchObserver {
    fn search_requested(&mut self, query: &Query);
    fn search_received(&mut self, query: &Query, result: &SearchResult);
    fn search_cleared(&mut self);
}

/// History that only remembers where it was sent.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryHistory {
    pub pushed: Vec<String>,
    pub navigated: Option<String>,
}

impl MemoryHistory {
    pub fn last_pushed(&self) -> Option<&str> {
        self.pushed.last().map(String::as_str)
    }
}

impl History for MemoryHistory {
    fn push(&mut self, pathname: &str, search: &str) {
        self.pushed.push(format!("{pathname}?{search}"));
    }

    fn navigate(&mut self, path: &str) {
        self.navigated = Some(path.to_string());
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl SearchObserver for LogObserver {
    fn search_requested(&mut self, query: &Query) {
        log::debug!("Searching transactions: {query:?}");
    }

    fn search_received(&mut self, _query: &Query, result: &SearchResult) {
        log::debug!(
            "Received {} of {} transactions",
            result.list.rows.len(),
            result.total.count
        );
    }

    fn search_cleared(&mut self) {
        log::debug!("Search filters cleared");
    }
}

pub struct SearchRunner<C, H, O, S> {
    controller: SearchController,
    client: C,
    history: H,
    observer: O,
    emitter: ExportEmitter<S>,
    product_name: String,
}

impl<C, H, O, S> SearchRunner<C, H, O, S>
where
    C: TransactionsClient,
    H: History,
    O: SearchObserver,
    S: DownloadSink,
{
    pub fn new(
        controller: SearchController,
        client: C,
        history: H,
        observer: O,
        emitter: ExportEmitter<S>,
        product_name: impl Into<String>,
    ) -> Self {
        Self {
            controller,
            client,
            history,
            observer,
            emitter,
            product_name: product_name.into(),
        }
    }

    pub fn controller(&self) -> &SearchController {
        &self.controller
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn emitter(&self) -> &ExportEmitter<S> {
        &self.emitter
    }

    pub fn into_parts(self) -> (SearchController, H, ExportEmitter<S>) {
        (self.controller, self.history, self.emitter)
    }

    /// Dispatches `action` and performs effects until none are left.
    pub async fn dispatch(&mut self, action: Action) {
        let mut queue: VecDeque<Effect> = self.controller.dispatch(action).into();

        while let Some(effect) = queue.pop_front() {
            if let Some(follow_up) = self.perform(effect).await {
                queue.extend(self.controller.dispatch(follow_up));
            }
        }
    }

    async fn perform(&mut self, effect: Effect) -> Option<Action> {
        match effect {
            Effect::PushLocation { pathname, search } => {
                self.history.push(&pathname, &search);
                None
            }
            Effect::Navigate(path) => {
                self.history.navigate(&path);
                None
            }
            Effect::SearchRequested(query) => {
                self.observer.search_requested(&query);
                None
            }
            Effect::SearchReceived(query) => {
                self.observer
                    .search_received(&query, &self.controller.state().result);
                None
            }
            Effect::ClearRequested => {
                self.observer.search_cleared();
                None
            }
            Effect::Search { request, query } => Some(match self.client.search(&query).await {
                Ok(result) => Action::SearchSucceeded { request, result },
                Err(err) => Action::SearchFailed {
                    request,
                    reason: err.to_string(),
                },
            }),
            Effect::Export { query, format } => {
                Some(match self.client.export_data(&query, format).await {
                    Ok(data) => Action::ExportSucceeded { format, data },
                    Err(err) => Action::ExportFailed {
                        reason: err.to_string(),
                    },
                })
            }
            Effect::CountPendingReviews => match self.client.count_pending_reviews().await {
                Ok(count) => Some(Action::PendingReviewsCounted(count)),
                Err(err) => {
                    log::warn!("Failed to count pending reviews: {err}");
                    None
                }
            },
            Effect::Download { format, data } => {
                let base = export_filename_base(&self.product_name, now());
                if let Err(err) = self.emitter.emit(format, &data, &base) {
                    log::error!("Failed to deliver {format} export: {err}");
                }
                None
            }
        }
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}
