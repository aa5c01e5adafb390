//! Store-independent query model
//!
//! A [`Filter`] describes which documents a loader wants. The same value is
//! used twice: adapters translate it into their native query language, and
//! loaders evaluate it in memory against exploded rows, because an
//! element-membership query only proves that *one* array element matched.

use crate::core::normalize::datetime::parse_datetime_value;
use chrono::NaiveDateTime;
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// A document as returned by a store: a JSON object
pub type Document = Map<String, Value>;

/// Predicate over documents or rows
///
/// Field names may be dotted paths (`content.dateStatusAlarm`).
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches everything
    All,
    /// Field equals value
    Eq { field: String, value: Value },
    /// Field equals one of the values
    In { field: String, values: Vec<Value> },
    /// Field is a string containing `needle`, ignoring case
    ContainsIgnoreCase { field: String, needle: String },
    /// Field is a timestamp within `[start, end]`
    DateRange {
        field: String,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    /// At least one element of the array field matches `element`
    ElemMatch {
        array_field: String,
        element: Box<Filter>,
    },
    /// All sub-filters match
    And(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_in<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Filter::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains_ignore_case(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Filter::ContainsIgnoreCase {
            field: field.into(),
            needle: needle.into(),
        }
    }

    pub fn date_range(field: impl Into<String>, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Filter::DateRange {
            field: field.into(),
            start,
            end,
        }
    }

    pub fn elem_match(array_field: impl Into<String>, element: Filter) -> Self {
        Filter::ElemMatch {
            array_field: array_field.into(),
            element: Box::new(element),
        }
    }

    /// Conjunction that drops `All` members and unwraps single filters
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut parts: Vec<Filter> = Vec::new();
        for filter in filters {
            match filter {
                Filter::All => {}
                Filter::And(inner) => parts.extend(inner),
                other => parts.push(other),
            }
        }
        match parts.len() {
            0 => Filter::All,
            1 => parts.remove(0),
            _ => Filter::And(parts),
        }
    }

    /// Evaluates the filter against a document or row
    pub fn matches(&self, doc: &Map<String, Value>) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq { field, value } => lookup(doc, field).is_some_and(|v| v == value),
            Filter::In { field, values } => {
                lookup(doc, field).is_some_and(|v| values.iter().any(|c| c == v))
            }
            Filter::ContainsIgnoreCase { field, needle } => lookup(doc, field)
                .and_then(Value::as_str)
                .is_some_and(|s| s.to_lowercase().contains(&needle.to_lowercase())),
            Filter::DateRange { field, start, end } => lookup(doc, field)
                .and_then(parse_datetime_value)
                .is_some_and(|ts| ts >= *start && ts <= *end),
            Filter::ElemMatch {
                array_field,
                element,
            } => match lookup(doc, array_field) {
                Some(Value::Array(items)) => items.iter().any(|item| match item {
                    Value::Object(map) => element.matches(map),
                    _ => false,
                }),
                _ => false,
            },
            Filter::And(filters) => filters.iter().all(|f| f.matches(doc)),
        }
    }
}

/// Sort order on one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub descending: bool,
}

impl SortSpec {
    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    /// Orders two documents by this spec; missing values sort last
    pub fn compare(&self, a: &Map<String, Value>, b: &Map<String, Value>) -> Ordering {
        let left = lookup(a, &self.field).filter(|v| !v.is_null());
        let right = lookup(b, &self.field).filter(|v| !v.is_null());
        match (left, right) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(l), Some(r)) => {
                let ord = compare_values(l, r);
                if self.descending {
                    ord.reverse()
                } else {
                    ord
                }
            }
        }
    }
}

/// A find request: filter, optional limit, optional sort
#[derive(Debug, Clone, PartialEq)]
pub struct FindQuery {
    pub filter: Filter,
    pub limit: Option<usize>,
    pub sort: Option<SortSpec>,
}

impl FindQuery {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            limit: None,
            sort: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn sorted_by(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }
}

impl Default for FindQuery {
    fn default() -> Self {
        Self::new(Filter::All)
    }
}

/// Resolves a dotted path inside a document
///
/// A key that literally contains the full path takes precedence, so
/// flattened rows can be queried with the same path.
pub fn lookup<'a>(doc: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    if let Some(value) = doc.get(path) {
        return Some(value);
    }
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return x.partial_cmp(&y).unwrap_or(Ordering::Equal);
    }
    if let (Some(x), Some(y)) = (parse_datetime_value(a), parse_datetime_value(b)) {
        return x.cmp(&y);
    }
    a.to_string().cmp(&b.to_string())
}
