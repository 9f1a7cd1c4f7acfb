//! Search screen state machine.
//!
//! [`SearchController::dispatch`] applies one [`Action`] to the screen state
//! and returns the [`Effect`]s the caller has to perform. Effects that produce
//! data (searches, exports, counters) are answered by dispatching the matching
//! completion action back in; [`runner::SearchRunner`] drives that loop.

use serde::Serialize;

use crate::codec;
use crate::domain::export::ExportData;
use crate::domain::filter::{FilterOptionGroup, FilterTag, compile_tags};
use crate::domain::query::{DateRange, FilterConfirmation, Query, QueryPatch, merge_selected};
use crate::domain::transaction::SearchResult;
use crate::domain::types::{ExportFormat, SortOrder, ViewMode};

pub mod runner;

/// Path the search screen lives on.
pub const TRANSACTIONS_PATH: &str = "/transactions";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}

/// Identifier of an issued search; only the latest one is accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RequestId(u64);

impl RequestId {
    pub const fn get(self) -> u64 {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Mount,
    LocationChanged(Query),
    FilterChange(QueryPatch),
    FilterConfirm(FilterConfirmation),
    FilterClear,
    PendingReviewsFilter,
    DatePresetChange(DateRange),
    PageChange(u32),
    PageCountChange(u32),
    OrderChange(Vec<String>, SortOrder),
    SelectRows(Vec<usize>),
    ExpandRows(Vec<usize>),
    ViewModeChange(ViewMode),
    ChartsCollapse,
    RowDetails(usize),
    Export(ExportFormat),
    SearchSucceeded {
        request: RequestId,
        result: SearchResult,
    },
    SearchFailed {
        request: RequestId,
        reason: String,
    },
    ExportSucceeded {
        format: ExportFormat,
        data: ExportData,
    },
    ExportFailed {
        reason: String,
    },
    PendingReviewsCounted(u64),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Replace the browser URL with `pathname?search`.
    PushLocation { pathname: String, search: String },
    /// Leave the screen for another page.
    Navigate(String),
    Search { request: RequestId, query: Query },
    Export { query: Query, format: ExportFormat },
    CountPendingReviews,
    Download { format: ExportFormat, data: ExportData },
    SearchRequested(Query),
    SearchReceived(Query),
    ClearRequested,
}

/// Everything the search screen renders.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchState {
    pub query: Query,
    pub result: SearchResult,
    pub status: Status,
    pub exporting: bool,
    pub confirmation_disabled: bool,
    pub expanded_rows: Vec<usize>,
    pub selected_rows: Vec<usize>,
    pub collapsed: bool,
    pub view_mode: ViewMode,
    pub show_date_input_calendar: bool,
    pub pending_reviews_count: Option<u64>,
}

impl SearchState {
    fn new(query: Query) -> Self {
        Self {
            query,
            result: SearchResult::default(),
            status: Status::Idle,
            exporting: false,
            confirmation_disabled: true,
            expanded_rows: Vec::new(),
            selected_rows: Vec::new(),
            collapsed: true,
            view_mode: ViewMode::default(),
            show_date_input_calendar: false,
            pending_reviews_count: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == Status::Loading
    }

    /// Pages available for the current result and page size.
    pub fn total_pages(&self) -> u64 {
        self.query.total_pages(self.result.total.count)
    }
}

pub struct SearchController {
    state: SearchState,
    /// Query string of the current URL, without the leading `?`.
    location: String,
    next_request: u64,
    pending: Option<RequestId>,
}

impl SearchController {
    /// Starts from the query in `location`, or from `default_query` when the
    /// location carries none.
    pub fn new(location: &str, default_query: Query) -> Self {
        let location = location.trim().trim_start_matches('?').to_string();
        let query = if location.is_empty() {
            default_query
        } else {
            codec::parse(&location)
        };

        Self {
            state: SearchState::new(query),
            location,
            next_request: 0,
            pending: None,
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Active-filter chips: the selection in the URL overlaid with local edits.
    pub fn filter_tags(&self, groups: &[FilterOptionGroup]) -> Vec<FilterTag> {
        let url = codec::parse(&self.location).filters;
        compile_tags(groups, &merge_selected(&url, &self.state.query.filters))
    }

    pub fn dispatch(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::Mount => {
                let query = self.state.query.clone();
                let mut effects = self.request_data(query);
                effects.push(Effect::CountPendingReviews);
                effects
            }
            Action::LocationChanged(query) => self.update_query(query),
            Action::FilterChange(patch) => {
                self.state.query = self.state.query.apply_patch(patch);
                self.state.confirmation_disabled = false;
                Vec::new()
            }
            Action::FilterConfirm(confirmation) => {
                self.state.confirmation_disabled = true;
                let query = self.state.query.confirm(confirmation);
                self.update_query(query)
            }
            Action::FilterClear => {
                self.state.confirmation_disabled = true;
                self.state.show_date_input_calendar = false;
                let query = self.state.query.cleared();
                let mut effects = vec![Effect::ClearRequested];
                effects.extend(self.update_query(query));
                effects
            }
            Action::PendingReviewsFilter => {
                self.state.confirmation_disabled = true;
                let query = self.state.query.confirm(FilterConfirmation::pending_reviews());
                self.update_query(query)
            }
            Action::DatePresetChange(dates) => {
                self.state.query = self.state.query.with_dates(dates);
                self.state.show_date_input_calendar = true;
                self.state.confirmation_disabled = false;
                Vec::new()
            }
            Action::PageChange(page) => {
                let query = self.state.query.with_page(page);
                self.update_query(query)
            }
            Action::PageCountChange(count) => {
                let query = self.state.query.with_page_count(count);
                self.update_query(query)
            }
            Action::OrderChange(field, order) => {
                let query = self.state.query.with_order(field, order);
                self.update_query(query)
            }
            Action::SelectRows(rows) => {
                self.state.selected_rows = rows;
                Vec::new()
            }
            Action::ExpandRows(rows) => {
                self.state.expanded_rows = rows;
                Vec::new()
            }
            Action::ViewModeChange(mode) => {
                self.state.view_mode = mode;
                Vec::new()
            }
            Action::ChartsCollapse => {
                self.state.collapsed = !self.state.collapsed;
                Vec::new()
            }
            Action::RowDetails(index) => match self.state.result.list.rows.get(index) {
                Some(row) => vec![Effect::Navigate(format!("{TRANSACTIONS_PATH}/{}", row.id))],
                None => {
                    log::warn!("No transaction row at index {index}");
                    Vec::new()
                }
            },
            Action::Export(format) => {
                if self.state.exporting {
                    return Vec::new();
                }
                self.state.exporting = true;
                let query = self.state.query.for_export(self.state.result.total.count);
                vec![Effect::Export { query, format }]
            }
            Action::SearchSucceeded { request, result } => {
                if self.pending != Some(request) {
                    log::debug!("Ignoring stale search response {}", request.get());
                    return Vec::new();
                }
                self.pending = None;
                self.state.result = result;
                self.state.status = Status::Ready;
                vec![Effect::SearchReceived(self.state.query.clone())]
            }
            Action::SearchFailed { request, reason } => {
                if self.pending != Some(request) {
                    log::debug!("Ignoring stale search failure {}", request.get());
                    return Vec::new();
                }
                log::error!("Transaction search failed: {reason}");
                self.pending = None;
                self.state.status = Status::Error;
                Vec::new()
            }
            Action::ExportSucceeded { format, data } => {
                self.state.exporting = false;
                vec![Effect::Download { format, data }]
            }
            Action::ExportFailed { reason } => {
                log::error!("Transaction export failed: {reason}");
                self.state.exporting = false;
                Vec::new()
            }
            Action::PendingReviewsCounted(count) => {
                self.state.pending_reviews_count = Some(count);
                Vec::new()
            }
        }
    }

    /// Adopts `query`, pushing it to the URL and fetching only when the
    /// serialized form differs from the current location.
    fn update_query(&mut self, query: Query) -> Vec<Effect> {
        self.state.expanded_rows.clear();
        self.state.selected_rows.clear();
        self.state.query = query;

        let search = match codec::serialize(&self.state.query) {
            Ok(search) => search,
            Err(err) => {
                log::error!("Failed to serialize search query: {err}");
                return Vec::new();
            }
        };
        if search == self.location {
            return Vec::new();
        }

        self.location = search.clone();
        let mut effects = vec![Effect::PushLocation {
            pathname: TRANSACTIONS_PATH.to_string(),
            search,
        }];
        effects.extend(self.request_data(self.state.query.clone()));
        effects
    }

    fn request_data(&mut self, query: Query) -> Vec<Effect> {
        self.next_request += 1;
        let request = RequestId(self.next_request);
        self.pending = Some(request);
        self.state.status = Status::Loading;

        vec![
            Effect::SearchRequested(query.clone()),
            Effect::Search { request, query },
        ]
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::query::{Filters, Sort};
    use crate::domain::transaction::{ResultList, ResultTotals, Transaction};
    use crate::domain::types::{Amount, PaymentMethod, TransactionId, TransactionStatus};

    fn search_effect(effects: &[Effect]) -> Option<(RequestId, Query)> {
        effects.iter().find_map(|effect| match effect {
            Effect::Search { request, query } => Some((*request, query.clone())),
            _ => None,
        })
    }

    fn pushed(effects: &[Effect]) -> Option<&str> {
        effects.iter().find_map(|effect| match effect {
            Effect::PushLocation { search, .. } => Some(search.as_str()),
            _ => None,
        })
    }

    fn row(id: i32) -> Transaction {
        let at = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        Transaction {
            id: TransactionId::new(id).unwrap(),
            status: TransactionStatus::Paid,
            payment_method: PaymentMethod::Boleto,
            card_brand: None,
            amount: Amount::new(100).unwrap(),
            paid_amount: Amount::new(100).unwrap(),
            refunded_amount: Amount::default(),
            installments: 1,
            customer_name: "Ana".into(),
            customer_email: None,
            customer_document: None,
            created_at: at,
            updated_at: at,
        }
    }

    fn result_with(total: u64, ids: &[i32]) -> SearchResult {
        SearchResult {
            list: ResultList {
                rows: ids.iter().copied().map(row).collect(),
            },
            total: ResultTotals {
                count: total,
                payment: None,
            },
            ..SearchResult::default()
        }
    }

    #[test]
    fn mount_reads_location_and_fetches() {
        let mut controller = SearchController::new("?offset=3&search=ana", Query::default());

        let effects = controller.dispatch(Action::Mount);

        let (_, query) = search_effect(&effects).expect("mount fetches");
        assert_eq!(query.offset, 3);
        assert_eq!(query.search, "ana");
        assert!(effects.contains(&Effect::CountPendingReviews));
        assert!(pushed(&effects).is_none());
        assert_eq!(controller.state().status, Status::Loading);
    }

    #[test]
    fn mount_without_location_uses_default_query() {
        let default_query = Query {
            count: 30,
            ..Query::default()
        };
        let mut controller = SearchController::new("", default_query);

        let effects = controller.dispatch(Action::Mount);

        assert_eq!(search_effect(&effects).unwrap().1.count, 30);
    }

    #[test]
    fn filter_change_merges_without_fetching() {
        let mut controller = SearchController::new("", Query::default());
        assert!(controller.state().confirmation_disabled);

        let effects = controller.dispatch(Action::FilterChange(QueryPatch {
            search: Some("abc".into()),
            ..QueryPatch::default()
        }));

        assert!(effects.is_empty());
        assert_eq!(controller.state().query.search, "abc");
        assert!(!controller.state().confirmation_disabled);
    }

    #[test]
    fn filter_tags_overlay_local_edits_on_url_selection() {
        let mut controller =
            SearchController::new("filters[status][0]=paid", Query::default());
        controller.dispatch(Action::Mount);

        let mut filters = Filters::new();
        filters.insert("payment_method".into(), vec!["boleto".into()]);
        controller.dispatch(Action::FilterChange(QueryPatch {
            filters: Some(filters),
            ..QueryPatch::default()
        }));

        let tags = controller.filter_tags(&crate::domain::filter::transaction_filter_options());
        let names: Vec<_> = tags.iter().map(|tag| tag.name.as_str()).collect();
        assert_eq!(names, vec!["Status", "Payment method"]);
        assert_eq!(tags[1].items, vec!["Boleto"]);
    }

    #[test]
    fn filter_confirm_resets_offset_and_pushes() {
        let mut controller = SearchController::new("offset=4", Query::default());

        let effects = controller.dispatch(Action::FilterConfirm(FilterConfirmation {
            search: "abc".into(),
            ..FilterConfirmation::default()
        }));

        let (_, query) = search_effect(&effects).unwrap();
        assert_eq!(query.offset, 1);
        assert_eq!(query.search, "abc");
        assert!(pushed(&effects).unwrap().contains("search=abc"));
        assert!(controller.state().confirmation_disabled);
        assert_eq!(
            effects.first(),
            Some(&Effect::PushLocation {
                pathname: TRANSACTIONS_PATH.into(),
                search: controller.location().to_string(),
            })
        );
    }

    #[test]
    fn identical_query_fetches_once() {
        let mut controller = SearchController::new("", Query::default());
        let query = Query {
            search: "abc".into(),
            ..Query::default()
        };

        let first = controller.dispatch(Action::LocationChanged(query.clone()));
        let second = controller.dispatch(Action::LocationChanged(query));

        assert!(search_effect(&first).is_some());
        assert!(second.is_empty());
    }

    #[test]
    fn update_query_clears_row_selection() {
        let mut controller = SearchController::new("", Query::default());
        controller.dispatch(Action::SelectRows(vec![1, 2]));
        controller.dispatch(Action::ExpandRows(vec![0]));

        controller.dispatch(Action::PageChange(2));

        assert!(controller.state().selected_rows.is_empty());
        assert!(controller.state().expanded_rows.is_empty());
    }

    #[test]
    fn count_and_order_changes_rewind_to_first_page() {
        let mut controller = SearchController::new("offset=5", Query::default());

        let effects = controller.dispatch(Action::PageCountChange(50));
        let (_, query) = search_effect(&effects).unwrap();
        assert_eq!((query.offset, query.count), (1, 50));

        controller.dispatch(Action::PageChange(3));
        let effects =
            controller.dispatch(Action::OrderChange(vec!["amount".into()], SortOrder::Ascending));
        let (_, query) = search_effect(&effects).unwrap();
        assert_eq!(query.offset, 1);
        assert_eq!(query.sort, Sort::new(vec!["amount".into()], SortOrder::Ascending));
    }

    #[test]
    fn filter_clear_notifies_and_resets_filters() {
        let mut controller =
            SearchController::new("search=x&filters[status][0]=paid", Query::default());

        let effects = controller.dispatch(Action::FilterClear);

        assert_eq!(effects.first(), Some(&Effect::ClearRequested));
        assert!(controller.state().query.filters.is_empty());
        assert!(controller.state().query.search.is_empty());
        assert!(search_effect(&effects).is_some());
    }

    #[test]
    fn pending_reviews_filter_sorts_oldest_first() {
        let mut controller = SearchController::new("search=x", Query::default());

        let effects = controller.dispatch(Action::PendingReviewsFilter);

        let (_, query) = search_effect(&effects).unwrap();
        let mut expected = Filters::new();
        expected.insert("status".into(), vec!["pending_review".into()]);
        assert_eq!(query.filters, expected);
        assert!(query.search.is_empty());
        assert_eq!(query.sort.order, SortOrder::Ascending);
    }

    #[test]
    fn date_preset_only_updates_local_state() {
        let mut controller = SearchController::new("", Query::default());
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();

        let effects =
            controller.dispatch(Action::DatePresetChange(DateRange::from_days(Some(day), Some(day))));

        assert!(effects.is_empty());
        assert!(controller.state().show_date_input_calendar);
        assert!(controller.state().query.dates.start.is_some());
    }

    #[test]
    fn stale_search_responses_are_ignored() {
        let mut controller = SearchController::new("", Query::default());
        let (first, _) = search_effect(&controller.dispatch(Action::Mount)).unwrap();
        let (second, _) = search_effect(&controller.dispatch(Action::PageChange(2))).unwrap();

        let stale = controller.dispatch(Action::SearchSucceeded {
            request: first,
            result: result_with(99, &[1]),
        });
        assert!(stale.is_empty());
        assert!(controller.state().is_loading());

        let fresh = controller.dispatch(Action::SearchSucceeded {
            request: second,
            result: result_with(20, &[2]),
        });
        assert!(matches!(fresh.as_slice(), [Effect::SearchReceived(_)]));
        assert_eq!(controller.state().status, Status::Ready);
        assert_eq!(controller.state().result.total.count, 20);
        assert_eq!(controller.state().total_pages(), 2);
    }

    #[test]
    fn search_failure_sets_error_state() {
        let mut controller = SearchController::new("", Query::default());
        let (request, _) = search_effect(&controller.dispatch(Action::Mount)).unwrap();

        controller.dispatch(Action::SearchFailed {
            request,
            reason: "boom".into(),
        });

        assert_eq!(controller.state().status, Status::Error);
        assert!(!controller.state().is_loading());
    }

    #[test]
    fn export_requests_every_row_and_clears_flag() {
        let mut controller = SearchController::new("offset=2&count=10", Query::default());
        let (request, _) = search_effect(&controller.dispatch(Action::Mount)).unwrap();
        controller.dispatch(Action::SearchSucceeded {
            request,
            result: result_with(42, &[1]),
        });

        let effects = controller.dispatch(Action::Export(ExportFormat::Csv));
        let Some(Effect::Export { query, format }) = effects.first() else {
            panic!("export effect expected");
        };
        assert_eq!((query.count, query.offset), (42, 1));
        assert_eq!(*format, ExportFormat::Csv);
        assert!(controller.state().exporting);
        assert!(controller.dispatch(Action::Export(ExportFormat::Csv)).is_empty());

        let data = ExportData::Delimited("id\n1\n".into());
        let effects = controller.dispatch(Action::ExportSucceeded {
            format: ExportFormat::Csv,
            data: data.clone(),
        });
        assert_eq!(
            effects,
            vec![Effect::Download {
                format: ExportFormat::Csv,
                data
            }]
        );
        assert!(!controller.state().exporting);
    }

    #[test]
    fn export_failure_clears_flag() {
        let mut controller = SearchController::new("", Query::default());
        controller.dispatch(Action::Export(ExportFormat::Xls));

        controller.dispatch(Action::ExportFailed {
            reason: "down".into(),
        });

        assert!(!controller.state().exporting);
    }

    #[test]
    fn row_details_navigates_to_transaction() {
        let mut controller = SearchController::new("", Query::default());
        let (request, _) = search_effect(&controller.dispatch(Action::Mount)).unwrap();
        controller.dispatch(Action::SearchSucceeded {
            request,
            result: result_with(2, &[7, 8]),
        });

        assert_eq!(
            controller.dispatch(Action::RowDetails(1)),
            vec![Effect::Navigate("/transactions/8".into())]
        );
        assert!(controller.dispatch(Action::RowDetails(5)).is_empty());
    }

    #[test]
    fn presentation_toggles() {
        let mut controller = SearchController::new("", Query::default());
        assert!(controller.state().collapsed);

        controller.dispatch(Action::ChartsCollapse);
        controller.dispatch(Action::ViewModeChange(ViewMode::Chart));
        controller.dispatch(Action::PendingReviewsCounted(3));

        assert!(!controller.state().collapsed);
        assert_eq!(controller.state().view_mode, ViewMode::Chart);
        assert_eq!(controller.state().pending_reviews_count, Some(3));
    }
}
