use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

use crate::codec::parse_date;
use crate::domain::query::{DatePreset, DateRange, FilterConfirmation, Filters};
use crate::domain::types::{ExportFormat, SortOrder};
use crate::forms::FormError;

#[derive(Deserialize)]
/// Form carrying only the query string the screen was rendered with.
pub struct LocationForm {
    #[serde(default)]
    pub location: String,
}

#[derive(Deserialize, Default)]
/// Filter panel submission. Selected options arrive as repeated
/// `filter=<group>:<value>` fields.
pub struct FilterForm {
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    #[serde(default)]
    pub preset: Option<String>,
    #[serde(default)]
    pub filter: Vec<String>,
}

impl FilterForm {
    /// Parses a urlencoded body with repeated keys.
    pub fn from_bytes(body: &[u8]) -> Result<Self, FormError> {
        serde_html_form::from_bytes(body).map_err(|err| FormError::Body(err.to_string()))
    }

    /// Preset picked in the date shortcut list, if any.
    fn preset(&self) -> Option<DatePreset> {
        self.preset
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .and_then(DatePreset::from_key)
    }

    /// Range typed into the date inputs; unreadable bounds are dropped.
    fn typed_dates(&self) -> DateRange {
        DateRange::from_days(parse_date(&self.start), parse_date(&self.end))
    }

    pub fn dates(&self, today: NaiveDate) -> DateRange {
        match self.preset() {
            Some(preset) => preset.range(today),
            None => self.typed_dates(),
        }
    }

    pub fn filters(&self) -> Result<Filters, FormError> {
        let mut filters = Filters::new();
        for entry in &self.filter {
            let (key, value) = entry
                .split_once(':')
                .map(|(key, value)| (key.trim(), value.trim()))
                .filter(|(key, value)| !key.is_empty() && !value.is_empty())
                .ok_or_else(|| FormError::InvalidFilter(entry.clone()))?;
            let values = filters.entry(key.to_string()).or_default();
            if !values.iter().any(|existing| existing == value) {
                values.push(value.to_string());
            }
        }
        Ok(filters)
    }

    pub fn confirmation(&self, dates: DateRange) -> Result<FilterConfirmation, FormError> {
        Ok(FilterConfirmation {
            search: self.search.trim().to_string(),
            dates,
            filters: self.filters()?,
            sort: None,
        })
    }
}

#[derive(Deserialize, Validate)]
pub struct PageForm {
    #[serde(default)]
    pub location: String,
    #[validate(range(min = 1))]
    pub page: u32,
}

#[derive(Deserialize, Validate)]
pub struct PageCountForm {
    #[serde(default)]
    pub location: String,
    #[validate(range(min = 1, max = 500))]
    pub count: u32,
}

#[derive(Deserialize, Validate)]
pub struct OrderForm {
    #[serde(default)]
    pub location: String,
    #[validate(length(min = 1))]
    pub field: String,
    pub order: String,
}

impl OrderForm {
    pub fn fields(&self) -> Vec<String> {
        self.field
            .split(',')
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn sort_order(&self) -> Result<SortOrder, FormError> {
        self.order
            .parse()
            .map_err(|_| FormError::InvalidSortOrder(self.order.clone()))
    }
}

#[derive(Deserialize)]
/// Query parameters of the export download; the rest of the query string is
/// the search itself.
pub struct ExportParams {
    pub format: ExportFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn filter_form_reads_repeated_fields() {
        let form = FilterForm::from_bytes(
            b"location=offset%3D2&search=+ana+&start=2024-01-02&end=&filter=status%3Apaid\
              &filter=status%3Arefused&filter=card_brand%3Avisa&filter=status%3Apaid",
        )
        .unwrap();

        assert_eq!(form.location, "offset=2");
        let confirmation = form.confirmation(form.dates(day(3, 1))).unwrap();
        assert_eq!(confirmation.search, "ana");
        assert_eq!(
            confirmation.filters.get("status"),
            Some(&vec!["paid".to_string(), "refused".to_string()])
        );
        assert_eq!(confirmation.filters.get("card_brand").map(Vec::len), Some(1));
        assert!(confirmation.dates.start.is_some());
        assert!(confirmation.dates.end.is_none());
        assert!(confirmation.sort.is_none());
    }

    #[test]
    fn preset_wins_over_typed_dates() {
        let form = FilterForm {
            start: "01/01/2020".into(),
            preset: Some("last_7_days".into()),
            ..FilterForm::default()
        };

        assert_eq!(form.dates(day(3, 10)), DatePreset::Last7Days.range(day(3, 10)));
    }

    #[test]
    fn malformed_filter_is_rejected() {
        let form = FilterForm {
            filter: vec!["status".into()],
            ..FilterForm::default()
        };

        assert!(matches!(form.filters(), Err(FormError::InvalidFilter(_))));
    }

    #[test]
    fn order_form_splits_fields_and_parses_order() {
        let form = OrderForm {
            location: String::new(),
            field: "amount, id".into(),
            order: "asc".into(),
        };

        assert_eq!(form.fields(), vec!["amount", "id"]);
        assert_eq!(form.sort_order().unwrap(), SortOrder::Ascending);

        let bad = OrderForm {
            order: "sideways".into(),
            ..form
        };
        assert!(bad.sort_order().is_err());
    }

    #[test]
    fn page_count_is_bounded() {
        let form = PageCountForm {
            location: String::new(),
            count: 0,
        };
        assert!(form.validate().is_err());
    }
}
