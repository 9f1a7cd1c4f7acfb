//! Conversion between [`Query`] values and URL query strings.
//!
//! Query strings use bracket notation for nested fields, e.g.
//! `dates[start]=01/31/2024&filters[status][0]=paid&sort[field][0]=created_at`.
//! Dates travel as `MM/DD/YYYY`; parsing widens them back to start and end of
//! day. Anything missing or malformed falls back to the query defaults.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate};
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::query::{
    DEFAULT_COUNT, DEFAULT_OFFSET, DateRange, Filters, Query, Sort,
};

/// Day format used in URLs.
pub const DATE_FORMAT: &str = "%m/%d/%Y";

const MAX_DEPTH: usize = 5;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode query string: {0}")]
    Encode(#[from] serde_qs::Error),
}

/// One value or a list of values for the same key.
#[derive(Debug, Default)]
struct Values(Vec<String>);

impl<'de> Deserialize<'de> for Values {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ValuesVisitor;

        impl<'de> Visitor<'de> for ValuesVisitor {
            type Value = Values;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or a list of strings")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Values, E> {
                Ok(Values(vec![value.to_string()]))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Values, A::Error> {
                let mut values = Vec::new();
                while let Some(value) = seq.next_element::<String>()? {
                    values.push(value);
                }
                Ok(Values(values))
            }

            // `key[1]=b&key[0]=a` may arrive as a map keyed by position.
            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Values, A::Error> {
                let mut entries = Vec::new();
                while let Some((key, value)) = map.next_entry::<String, String>()? {
                    entries.push((key.parse::<usize>().unwrap_or(usize::MAX), value));
                }
                entries.sort_by_key(|(position, _)| *position);
                Ok(Values(entries.into_iter().map(|(_, value)| value).collect()))
            }
        }

        deserializer.deserialize_any(ValuesVisitor)
    }
}

impl Values {
    fn into_non_empty(self) -> Vec<String> {
        self.0
            .into_iter()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawDates {
    start: Option<String>,
    end: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSort {
    field: Option<Values>,
    order: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawQuery {
    search: Option<String>,
    offset: Option<String>,
    count: Option<String>,
    sort: Option<RawSort>,
    dates: Option<RawDates>,
    filters: Option<BTreeMap<String, Values>>,
}

impl RawQuery {
    /// Fills fields still missing here from `other`; filter keys are unioned.
    fn absorb(&mut self, other: RawQuery) {
        self.search = self.search.take().or(other.search);
        self.offset = self.offset.take().or(other.offset);
        self.count = self.count.take().or(other.count);
        self.sort = self.sort.take().or(other.sort);
        self.dates = self.dates.take().or(other.dates);
        if let Some(filters) = other.filters {
            self.filters.get_or_insert_with(BTreeMap::new).extend(filters);
        }
    }
}

#[derive(Serialize)]
struct DateParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end: Option<String>,
}

#[derive(Serialize)]
struct SortParams<'a> {
    field: &'a [String],
    order: &'static str,
}

#[derive(Serialize)]
struct QueryParams<'a> {
    count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    dates: Option<DateParams>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    filters: BTreeMap<&'a str, &'a [String]>,
    offset: u32,
    search: &'a str,
    sort: SortParams<'a>,
}

/// Parses a day in `MM/DD/YYYY`, ISO `YYYY-MM-DD` or RFC 3339 form.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|date_time| date_time.date_naive())
        })
}

fn parse_number(value: Option<&str>, default: u32) -> u32 {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(|value| value.parse::<u32>().ok())
        .filter(|number| *number > 0)
        .unwrap_or(default)
}

fn normalize(raw: RawQuery) -> Query {
    let dates = raw.dates.unwrap_or_default();
    let dates = DateRange::from_days(
        dates.start.as_deref().and_then(parse_date),
        dates.end.as_deref().and_then(parse_date),
    );

    let raw_sort = raw.sort.unwrap_or_default();
    let default_sort = Sort::default();
    let field = raw_sort
        .field
        .map(Values::into_non_empty)
        .filter(|field| !field.is_empty())
        .unwrap_or(default_sort.field);
    let order = raw_sort
        .order
        .as_deref()
        .and_then(|order| order.parse().ok())
        .unwrap_or(default_sort.order);

    let filters: Filters = raw
        .filters
        .unwrap_or_default()
        .into_iter()
        .map(|(key, values)| (key, values.into_non_empty()))
        .filter(|(_, values)| !values.is_empty())
        .collect();

    Query {
        search: raw.search.unwrap_or_default(),
        offset: parse_number(raw.offset.as_deref(), DEFAULT_OFFSET),
        count: parse_number(raw.count.as_deref(), DEFAULT_COUNT),
        sort: Sort::new(field, order),
        dates,
        filters,
    }
}

fn decode(input: &str) -> Result<RawQuery, serde_qs::Error> {
    serde_qs::Config::new(MAX_DEPTH, false).deserialize_str::<RawQuery>(input)
}

/// Field a `key=value` pair belongs to: the top-level key, or
/// `filters[<key>]` for filter selections.
fn field_group(pair: &str) -> String {
    let key = pair
        .split('=')
        .next()
        .unwrap_or_default()
        .replace("%5B", "[")
        .replace("%5b", "[")
        .replace("%5D", "]")
        .replace("%5d", "]");
    let end = if key.starts_with("filters[") {
        key.find(']').map_or(key.len(), |close| close + 1)
    } else {
        key.find('[').unwrap_or(key.len())
    };
    key[..end].to_string()
}

/// Decodes each field on its own, dropping only the ones that fail.
fn decode_by_field(input: &str) -> RawQuery {
    let mut groups: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for pair in input.split('&').filter(|pair| !pair.is_empty()) {
        groups.entry(field_group(pair)).or_default().push(pair);
    }

    let mut raw = RawQuery::default();
    for (group, pairs) in groups {
        match decode(&pairs.join("&")) {
            Ok(part) => raw.absorb(part),
            Err(err) => log::warn!("Ignoring malformed query field {group:?}: {err}"),
        }
    }
    raw
}

/// Parses a URL query string (with or without the leading `?`).
///
/// Never fails: fields that cannot be decoded fall back to their defaults
/// while the rest of the query is kept.
pub fn parse(query_string: &str) -> Query {
    let input = query_string.strip_prefix('?').unwrap_or(query_string);
    if input.trim().is_empty() {
        return Query::default();
    }

    let raw = decode(input).unwrap_or_else(|err| {
        log::warn!("Malformed query string {input:?}: {err}");
        decode_by_field(input)
    });

    normalize(raw)
}

/// Encodes `query` as a URL query string without the leading `?`.
pub fn serialize(query: &Query) -> Result<String, CodecError> {
    let dates = (!query.dates.is_empty()).then(|| DateParams {
        start: query
            .dates
            .start
            .map(|start| start.format(DATE_FORMAT).to_string()),
        end: query
            .dates
            .end
            .map(|end| end.format(DATE_FORMAT).to_string()),
    });

    let params = QueryParams {
        count: query.count,
        dates,
        filters: query
            .filters
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(key, values)| (key.as_str(), values.as_slice()))
            .collect(),
        offset: query.offset,
        search: &query.search,
        sort: SortParams {
            field: &query.sort.field,
            order: query.sort.order.as_str(),
        },
    };

    Ok(serde_qs::to_string(&params)?)
}
