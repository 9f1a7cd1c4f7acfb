//! Search parameters driving a transaction search.
//!
//! A [`Query`] is an immutable value: every interaction on the search screen
//! produces a new query through one of the typed merge functions below.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::domain::types::{SortOrder, TransactionStatus};

pub const DEFAULT_COUNT: u32 = 15;
pub const DEFAULT_OFFSET: u32 = 1;
pub const DEFAULT_SORT_FIELD: &str = "created_at";

/// Selected filter values keyed by filter group key.
pub type Filters = BTreeMap<String, Vec<String>>;

/// Result ordering.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: Vec<String>,
    pub order: SortOrder,
}

impl Sort {
    pub fn new(field: Vec<String>, order: SortOrder) -> Self {
        Self { field, order }
    }
}

impl Default for Sort {
    fn default() -> Self {
        Self {
            field: vec![DEFAULT_SORT_FIELD.to_string()],
            order: SortOrder::default(),
        }
    }
}

/// Inclusive creation date range. Bounds are kept at start and end of day.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl DateRange {
    /// Builds a range from calendar days, widening them to whole days.
    pub fn from_days(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self {
            start: start.map(start_of_day),
            end: end.map(end_of_day),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Last representable millisecond of `date`.
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or_else(|| start_of_day(date))
}

/// Shortcut ranges offered next to the date inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePreset {
    Today,
    Last7Days,
    Last15Days,
    Last30Days,
}

impl DatePreset {
    pub const ALL: &'static [DatePreset] = &[
        DatePreset::Today,
        DatePreset::Last7Days,
        DatePreset::Last15Days,
        DatePreset::Last30Days,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            DatePreset::Today => "today",
            DatePreset::Last7Days => "last_7_days",
            DatePreset::Last15Days => "last_15_days",
            DatePreset::Last30Days => "last_30_days",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            DatePreset::Today => "Today",
            DatePreset::Last7Days => "Last 7 days",
            DatePreset::Last15Days => "Last 15 days",
            DatePreset::Last30Days => "Last 30 days",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|preset| preset.key() == key)
    }

    /// Range ending on `today`, both bounds inclusive.
    pub fn range(self, today: NaiveDate) -> DateRange {
        let days_back = match self {
            DatePreset::Today => 0,
            DatePreset::Last7Days => 6,
            DatePreset::Last15Days => 14,
            DatePreset::Last30Days => 29,
        };
        let start = today - Duration::days(days_back);
        DateRange::from_days(Some(start), Some(today))
    }
}

/// Complete set of search parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub search: String,
    /// 1-based page number.
    pub offset: u32,
    /// Page size.
    pub count: u32,
    pub sort: Sort,
    pub dates: DateRange,
    pub filters: Filters,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            search: String::new(),
            offset: DEFAULT_OFFSET,
            count: DEFAULT_COUNT,
            sort: Sort::default(),
            dates: DateRange::default(),
            filters: Filters::new(),
        }
    }
}

/// Unconfirmed edits coming from the filter form. `None` keeps the current value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryPatch {
    pub search: Option<String>,
    pub dates: Option<DateRange>,
    pub filters: Option<Filters>,
    pub sort: Option<Sort>,
    pub count: Option<u32>,
    pub offset: Option<u32>,
}

/// Fields submitted when the user applies the filter form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterConfirmation {
    pub search: String,
    pub dates: DateRange,
    pub filters: Filters,
    /// `None` keeps the current ordering.
    pub sort: Option<Sort>,
}

impl FilterConfirmation {
    /// Transactions waiting for manual review, oldest first.
    pub fn pending_reviews() -> Self {
        let mut filters = Filters::new();
        filters.insert(
            "status".to_string(),
            vec![TransactionStatus::PendingReview.as_str().to_string()],
        );
        Self {
            search: String::new(),
            dates: DateRange::default(),
            filters,
            sort: Some(Sort::new(
                vec![DEFAULT_SORT_FIELD.to_string()],
                SortOrder::Ascending,
            )),
        }
    }
}

impl Query {
    /// Shallow merge per top-level field; the patch wins where it is set.
    pub fn apply_patch(&self, patch: QueryPatch) -> Query {
        let current = self.clone();
        Query {
            search: patch.search.unwrap_or(current.search),
            offset: patch.offset.unwrap_or(current.offset),
            count: patch.count.unwrap_or(current.count),
            sort: patch.sort.unwrap_or(current.sort),
            dates: patch.dates.unwrap_or(current.dates),
            filters: patch.filters.unwrap_or(current.filters),
        }
    }

    /// Applies confirmed filter fields and rewinds to the first page.
    /// Confirmed fields win; the sort is kept when none was confirmed.
    pub fn confirm(&self, confirmation: FilterConfirmation) -> Query {
        Query {
            search: confirmation.search,
            dates: confirmation.dates,
            filters: confirmation.filters,
            sort: confirmation.sort.unwrap_or_else(|| self.sort.clone()),
            offset: DEFAULT_OFFSET,
            count: self.count,
        }
    }

    /// Drops search text, filters and dates; keeps page size and ordering.
    pub fn cleared(&self) -> Query {
        Query {
            search: String::new(),
            dates: DateRange::default(),
            filters: Filters::new(),
            offset: DEFAULT_OFFSET,
            ..self.clone()
        }
    }

    pub fn with_page(&self, page: u32) -> Query {
        Query {
            offset: page.max(DEFAULT_OFFSET),
            ..self.clone()
        }
    }

    pub fn with_page_count(&self, count: u32) -> Query {
        Query {
            count: if count == 0 { DEFAULT_COUNT } else { count },
            offset: DEFAULT_OFFSET,
            ..self.clone()
        }
    }

    pub fn with_order(&self, field: Vec<String>, order: SortOrder) -> Query {
        let field = if field.is_empty() {
            Sort::default().field
        } else {
            field
        };
        Query {
            sort: Sort::new(field, order),
            offset: DEFAULT_OFFSET,
            ..self.clone()
        }
    }

    pub fn with_dates(&self, dates: DateRange) -> Query {
        Query {
            dates,
            ..self.clone()
        }
    }

    /// Query covering every matching row in a single page.
    pub fn for_export(&self, total: u64) -> Query {
        let count = u32::try_from(total).unwrap_or(u32::MAX);
        Query {
            count: if count == 0 { self.count } else { count },
            offset: DEFAULT_OFFSET,
            ..self.clone()
        }
    }

    /// Number of pages needed to show `total` rows.
    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.count.max(1)))
    }
}

/// Merges URL-sourced and locally edited selections; local wins per key.
pub fn merge_selected(url: &Filters, local: &Filters) -> Filters {
    let mut merged = url.clone();
    for (key, values) in local {
        merged.insert(key.clone(), values.clone());
    }
    merged
}
