//! Translation of [`Filter`] into MongoDB query documents

use crate::adapters::store::{Filter, SortSpec};
use crate::domain::{Result, StoreError};
use bson::{Bson, Document};
use chrono::NaiveDateTime;
use serde_json::Value;

/// Builds the query document for `filter`
///
/// # Errors
///
/// Returns [`StoreError::QueryFailed`] if a filter value has no BSON form.
pub fn to_query_document(collection: &str, filter: &Filter) -> Result<Document> {
    let mut doc = Document::new();
    match filter {
        Filter::All => {}
        Filter::Eq { field, value } => {
            doc.insert(field.clone(), to_bson(collection, value)?);
        }
        Filter::In { field, values } => {
            let values = values
                .iter()
                .map(|v| to_bson(collection, v))
                .collect::<Result<Vec<_>>>()?;
            let mut cond = Document::new();
            cond.insert("$in", values);
            doc.insert(field.clone(), cond);
        }
        Filter::ContainsIgnoreCase { field, needle } => {
            let mut cond = Document::new();
            cond.insert("$regex", regex::escape(needle));
            cond.insert("$options", "i");
            doc.insert(field.clone(), cond);
        }
        Filter::DateRange { field, start, end } => {
            let mut cond = Document::new();
            cond.insert("$gte", to_bson_datetime(*start));
            cond.insert("$lte", to_bson_datetime(*end));
            doc.insert(field.clone(), cond);
        }
        Filter::ElemMatch {
            array_field,
            element,
        } => {
            let mut cond = Document::new();
            cond.insert("$elemMatch", to_query_document(collection, element)?);
            doc.insert(array_field.clone(), cond);
        }
        Filter::And(filters) => {
            let parts = filters
                .iter()
                .map(|f| to_query_document(collection, f).map(Bson::Document))
                .collect::<Result<Vec<_>>>()?;
            if !parts.is_empty() {
                doc.insert("$and", parts);
            }
        }
    }
    Ok(doc)
}

/// Builds the sort document for `sort`
pub fn to_sort_document(sort: &SortSpec) -> Document {
    let mut doc = Document::new();
    doc.insert(sort.field.clone(), if sort.descending { -1 } else { 1 });
    doc
}

fn to_bson(collection: &str, value: &Value) -> Result<Bson> {
    Bson::try_from(value.clone()).map_err(|e| {
        StoreError::QueryFailed {
            collection: collection.to_string(),
            message: format!("filter value {value} has no BSON form: {e}"),
        }
        .into()
    })
}

fn to_bson_datetime(ts: NaiveDateTime) -> bson::DateTime {
    bson::DateTime::from_chrono(ts.and_utc())
}
