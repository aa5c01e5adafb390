//! Tabular result type
//!
//! Every loader, the join engine and the dispatcher exchange a
//! [`MetricTable`]: an ordered column list plus rows keyed by column name.
//! A row always holds a value (possibly `null`) for every column, so
//! consumers can rely on the schema regardless of which source documents
//! were present.

use crate::domain::ids::{ProtocolId, ProtocolIdSet, PROTOCOL_ID};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// A single table row keyed by column name
pub type Row = Map<String, Value>;

/// Column-ordered table of JSON cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricTable {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl MetricTable {
    /// Creates an empty table with the given schema
    pub fn empty(schema: &[&str]) -> Self {
        Self {
            columns: schema.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Creates an empty table from owned column names
    pub fn with_columns(columns: Vec<String>) -> Self {
        Self {
            columns: crate::core::normalize::columns::dedupe_names(columns),
            rows: Vec::new(),
        }
    }

    /// Builds a table whose schema is the union of the row keys,
    /// in first-seen order
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut table = Self::default();
        for row in rows {
            table.push_row(row);
        }
        table
    }

    /// Projects rows onto a fixed schema
    ///
    /// Missing columns are filled with `null` and columns outside the schema
    /// are dropped.
    pub fn project(rows: Vec<Row>, schema: &[&str]) -> Self {
        let mut table = Self::empty(schema);
        table.rows = rows
            .into_iter()
            .map(|mut row| {
                schema
                    .iter()
                    .map(|c| (c.to_string(), row.remove(*c).unwrap_or(Value::Null)))
                    .collect()
            })
            .collect();
        table
    }

    /// Column names in schema order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows of the table
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Consumes the table and returns its rows
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true when the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns true if the schema contains `name`
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Appends a row, widening the schema for unseen columns
    pub fn push_row(&mut self, mut row: Row) {
        for key in row.keys() {
            if !self.has_column(key) {
                self.columns.push(key.clone());
                for existing in &mut self.rows {
                    existing.insert(key.clone(), Value::Null);
                }
            }
        }
        for column in &self.columns {
            if !row.contains_key(column) {
                row.insert(column.clone(), Value::Null);
            }
        }
        self.rows.push(row);
    }

    /// Adds any missing schema columns, null-filled
    pub fn ensure_columns(&mut self, schema: &[&str]) {
        for column in schema {
            if !self.has_column(column) {
                self.columns.push(column.to_string());
                for row in &mut self.rows {
                    row.insert(column.to_string(), Value::Null);
                }
            }
        }
    }

    /// Sets (or adds) a column computed from each row
    pub fn set_column<F>(&mut self, name: &str, mut f: F)
    where
        F: FnMut(&Row) -> Value,
    {
        if !self.has_column(name) {
            self.columns.push(name.to_string());
        }
        for row in &mut self.rows {
            let value = f(row);
            row.insert(name.to_string(), value);
        }
    }

    /// Replaces every value of an existing column
    ///
    /// Does nothing when the column is absent.
    pub fn map_column<F>(&mut self, name: &str, mut f: F)
    where
        F: FnMut(Value) -> Value,
    {
        if !self.has_column(name) {
            return;
        }
        for row in &mut self.rows {
            let value = row.remove(name).unwrap_or(Value::Null);
            row.insert(name.to_string(), f(value));
        }
    }

    /// Iterates the values of one column (`null` for absent columns)
    pub fn column_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.rows.iter().map(move |r| r.get(name).unwrap_or(&Value::Null))
    }

    /// Keeps only rows matching the predicate
    pub fn retain<F>(&mut self, f: F)
    where
        F: FnMut(&Row) -> bool,
    {
        self.rows.retain(f);
    }

    /// Keeps only rows whose protocol identifier is in `allowed`
    pub fn retain_protocol_ids(&mut self, allowed: &ProtocolIdSet) {
        self.rows.retain(|row| {
            row.get(PROTOCOL_ID)
                .and_then(ProtocolId::from_value)
                .map(|id| allowed.contains(&id))
                .unwrap_or(false)
        });
    }

    /// Distinct protocol identifiers present in the table
    pub fn protocol_ids(&self) -> ProtocolIdSet {
        self.column_values(PROTOCOL_ID)
            .filter_map(ProtocolId::from_value)
            .collect()
    }

    /// Appends the rows of `other`, unioning the schemas
    pub fn concat(mut self, other: MetricTable) -> Self {
        for column in other.columns {
            if !self.has_column(&column) {
                for row in &mut self.rows {
                    row.insert(column.clone(), Value::Null);
                }
                self.columns.push(column);
            }
        }
        for row in other.rows {
            self.push_row(row);
        }
        self
    }

    /// Serializes each row as one JSON object, columns in schema order
    pub fn to_json_lines(&self) -> crate::domain::Result<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                serde_json::to_string(&OrderedRow {
                    columns: &self.columns,
                    row,
                })
                .map_err(Into::into)
            })
            .collect()
    }
}

/// Serializes a row following the table's column order
struct OrderedRow<'a> {
    columns: &'a [String],
    row: &'a Row,
}

impl Serialize for OrderedRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for column in self.columns {
            map.serialize_entry(column, self.row.get(column).unwrap_or(&Value::Null))?;
        }
        map.end()
    }
}

impl Serialize for MetricTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(&OrderedRow {
                columns: &self.columns,
                row,
            })?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("row must be an object"),
        }
    }

    #[test]
    fn test_empty_keeps_schema() {
        let table = MetricTable::empty(&["protocolId", "value"]);
        assert!(table.is_empty());
        assert_eq!(table.columns(), &["protocolId", "value"]);
    }

    #[test]
    fn test_project_fills_nulls_and_drops_extras() {
        let table = MetricTable::project(
            vec![row(json!({"protocolId": "a", "extra": 1}))],
            &["protocolId", "value"],
        );
        assert_eq!(table.columns(), &["protocolId", "value"]);
        assert_eq!(table.rows()[0]["value"], Value::Null);
        assert!(!table.rows()[0].contains_key("extra"));
    }

    #[test]
    fn test_push_row_widens_schema() {
        let mut table = MetricTable::from_rows(vec![row(json!({"protocolId": "a"}))]);
        table.push_row(row(json!({"protocolId": "b", "x": 2})));
        assert_eq!(table.columns(), &["protocolId", "x"]);
        assert_eq!(table.rows()[0]["x"], Value::Null);
        assert_eq!(table.rows()[1]["x"], json!(2));
    }

    #[test]
    fn test_retain_protocol_ids() {
        let mut table = MetricTable::from_rows(vec![
            row(json!({"protocolId": "a"})),
            row(json!({"protocolId": "b"})),
            row(json!({"protocolId": null})),
        ]);
        let allowed: ProtocolIdSet = [ProtocolId::new("b").unwrap()].into_iter().collect();
        table.retain_protocol_ids(&allowed);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0]["protocolId"], json!("b"));
    }

    #[test]
    fn test_concat_unions_schema() {
        let left = MetricTable::from_rows(vec![row(json!({"protocolId": "a", "naca_value": "6"}))]);
        let right =
            MetricTable::from_rows(vec![row(json!({"protocolId": "b", "rea_value": "ja"}))]);
        let combined = left.concat(right);
        assert_eq!(combined.len(), 2);
        assert_eq!(combined.columns(), &["protocolId", "naca_value", "rea_value"]);
        assert_eq!(combined.rows()[0]["rea_value"], Value::Null);
        assert_eq!(combined.rows()[1]["naca_value"], Value::Null);
    }

    #[test]
    fn test_json_lines_follow_column_order() {
        let mut table = MetricTable::empty(&["protocolId", "b", "a"]);
        table.push_row(row(json!({"a": 1, "b": 2, "protocolId": "p"})));
        let lines = table.to_json_lines().unwrap();
        assert_eq!(lines, vec![r#"{"protocolId":"p","b":2,"a":1}"#.to_string()]);
    }

    #[test]
    fn test_ensure_columns() {
        let mut table = MetricTable::from_rows(vec![row(json!({"protocolId": "a"}))]);
        table.ensure_columns(&["protocolId", "missionDate"]);
        assert_eq!(table.columns(), &["protocolId", "missionDate"]);
        assert_eq!(table.rows()[0]["missionDate"], Value::Null);
    }

    #[test]
    fn test_map_column() {
        let mut table = MetricTable::from_rows(vec![row(json!({"protocolId": "a", "v": "1"}))]);
        table.map_column("v", |_| json!(true));
        assert_eq!(table.rows()[0]["v"], json!(true));
        table.map_column("missing", |_| json!(false));
        assert_eq!(table.columns(), &["protocolId", "v"]);
    }
}
