//! Date and time recombination
//!
//! Mission records frequently split one instant across a date field and a
//! time field. Recombination never fails: anything that does not parse
//! yields `null` and a debug log entry.

use crate::domain::MetricTable;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;

/// Status names whose date and time halves are recombined in detail records
pub const STATUS_NAMES: [&str; 10] = [
    "StatusAlarm",
    "Status1",
    "Status2",
    "Status3",
    "Status4",
    "Status4b",
    "Status7",
    "Status8",
    "Status8b",
    "StatusEnd",
];

/// Index columns carrying a single date/time value
pub const INDEX_DATE_FIELDS: [&str; 3] = ["missionDate", "createdAt", "updatedAt"];

const DATE_FORMATS: [&str; 3] = ["%d.%m.%Y", "%Y-%m-%d", "%d.%m.%y"];
const TIME_FORMATS: [&str; 3] = ["%H:%M:%S", "%H:%M:%S%.f", "%H:%M"];
const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

/// Renders a timestamp the way every table stores it
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Parses a calendar date in one of the accepted formats
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
        .or_else(|| parse_datetime(input).map(|ts| ts.date()))
}

/// Parses a wall-clock time in one of the accepted formats
pub fn parse_time(input: &str) -> Option<NaiveTime> {
    let input = input.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(input, fmt).ok())
}

/// Parses a full timestamp
///
/// RFC 3339 values are converted to UTC and the offset is dropped. A bare
/// date is read as midnight.
pub fn parse_datetime(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Some(ts.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parses a timestamp cell in any shape a store may produce
///
/// Accepts strings, epoch milliseconds and extended-JSON `$date` wrappers.
pub fn parse_datetime_value(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(s) => parse_datetime(s),
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(|ts| ts.naive_utc()),
        Value::Object(map) => match map.get("$date")? {
            Value::Object(inner) => inner
                .get("$numberLong")
                .and_then(Value::as_str)
                .and_then(|s| s.parse::<i64>().ok())
                .and_then(DateTime::from_timestamp_millis)
                .map(|ts| ts.naive_utc()),
            other => parse_datetime_value(other),
        },
        _ => None,
    }
}

/// Combines a date half and a time half into one timestamp
///
/// Returns `None` when either half is missing or unparsable.
pub fn combine_date_time(date: Option<&str>, time: Option<&str>) -> Option<NaiveDateTime> {
    let date = date.map(str::trim).filter(|d| !d.is_empty())?;
    let time = time.map(str::trim).filter(|t| !t.is_empty())?;

    let combined = format!("{date} {time}");
    if let Some(ts) = parse_datetime(&combined) {
        return Some(ts);
    }

    let result = parse_date(date).zip(parse_time(time)).map(|(d, t)| d.and_time(t));
    if result.is_none() {
        tracing::debug!(date, time, "Unparsable date/time pair");
    }
    result
}

/// Cell-level variant of [`combine_date_time`]
///
/// Non-string halves count as missing.
pub fn combine_values(date: &Value, time: &Value) -> Value {
    combine_date_time(date.as_str(), time.as_str())
        .map(|ts| Value::String(format_timestamp(ts)))
        .unwrap_or(Value::Null)
}

/// Normalizes a single date/time cell to an ISO-8601 string or `null`
pub fn normalize_datetime_value(value: Value) -> Value {
    if value.is_null() {
        return value;
    }
    match parse_datetime_value(&value) {
        Some(ts) => Value::String(format_timestamp(ts)),
        None => {
            tracing::debug!(value = %value, "Unparsable timestamp");
            Value::Null
        }
    }
}

/// Normalizes the index date columns in place
///
/// Returns how many non-null values could not be parsed.
pub fn normalize_index_dates(table: &mut MetricTable) -> usize {
    let mut dropped = 0;
    for field in INDEX_DATE_FIELDS {
        table.map_column(field, |value| {
            let was_present = !value.is_null();
            let normalized = normalize_datetime_value(value);
            if was_present && normalized.is_null() {
                dropped += 1;
            }
            normalized
        });
    }
    dropped
}

/// Adds one combined timestamp column per status name
///
/// The halves are read from `content_date<Name>` / `content_time<Name>`,
/// falling back to `date<Name>` / `time<Name>`. The status column is always
/// added so the schema does not depend on which halves were present.
/// Returns how many rows had at least one half but no usable timestamp.
pub fn combine_status_fields(table: &mut MetricTable) -> usize {
    let mut dropped = 0;
    for name in STATUS_NAMES {
        let date_col = pick_column(table, &[format!("content_date{name}"), format!("date{name}")]);
        let time_col = pick_column(table, &[format!("content_time{name}"), format!("time{name}")]);

        table.set_column(name, |row| {
            let date = date_col
                .as_deref()
                .and_then(|c| row.get(c))
                .unwrap_or(&Value::Null);
            let time = time_col
                .as_deref()
                .and_then(|c| row.get(c))
                .unwrap_or(&Value::Null);
            let combined = combine_values(date, time);
            if combined.is_null() && (!date.is_null() || !time.is_null()) {
                dropped += 1;
            }
            combined
        });
    }
    dropped
}

fn pick_column(table: &MetricTable, candidates: &[String]) -> Option<String> {
    candidates.iter().find(|c| table.has_column(c)).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test]
    fn test_combine_german_date_and_time() {
        let ts = combine_date_time(Some("15.03.2024"), Some("08:30:00")).unwrap();
        assert_eq!(format_timestamp(ts), "2024-03-15T08:30:00");
    }

    #[test_case(None, Some("08:30:00") ; "missing date")]
    #[test_case(Some("15.03.2024"), None ; "missing time")]
    #[test_case(Some("15.03.2024"), Some("") ; "blank time")]
    #[test_case(Some("not a date"), Some("08:30:00") ; "garbage date")]
    #[test_case(Some("15.03.2024"), Some("25:99") ; "garbage time")]
    fn test_combine_yields_none(date: Option<&str>, time: Option<&str>) {
        assert!(combine_date_time(date, time).is_none());
    }

    #[test]
    fn test_combine_iso_date_and_short_time() {
        let ts = combine_date_time(Some("2024-03-15"), Some("08:30")).unwrap();
        assert_eq!(format_timestamp(ts), "2024-03-15T08:30:00");
    }

    #[test]
    fn test_combine_values_non_string_is_null() {
        assert_eq!(combine_values(&json!(15032024), &json!("08:30:00")), Value::Null);
    }

    #[test]
    fn test_parse_datetime_value_shapes() {
        let expected = "2024-03-15T08:30:00";
        let shapes = [
            json!("2024-03-15T08:30:00Z"),
            json!("2024-03-15T08:30:00.000"),
            json!({"$date": "2024-03-15T08:30:00Z"}),
            json!({"$date": {"$numberLong": "1710491400000"}}),
            json!(1710491400000i64),
        ];
        for shape in shapes {
            let ts = parse_datetime_value(&shape).unwrap();
            assert_eq!(format_timestamp(ts), expected, "shape {shape}");
        }
    }

    #[test]
    fn test_normalize_datetime_value() {
        assert_eq!(normalize_datetime_value(Value::Null), Value::Null);
        assert_eq!(normalize_datetime_value(json!("garbage")), Value::Null);
        assert_eq!(
            normalize_datetime_value(json!("2024-01-02")),
            json!("2024-01-02T00:00:00")
        );
    }

    #[test]
    fn test_combine_status_fields() {
        let mut table = MetricTable::from_rows(vec![
            json!({
                "protocolId": "P-1",
                "content_dateStatusAlarm": "15.03.2024",
                "content_timeStatusAlarm": "08:30:00",
                "content_dateStatus3": "15.03.2024",
                "content_timeStatus3": "kaputt"
            })
            .as_object()
            .cloned()
            .unwrap(),
        ]);
        let dropped = combine_status_fields(&mut table);
        let row = &table.rows()[0];
        assert_eq!(row["StatusAlarm"], json!("2024-03-15T08:30:00"));
        assert_eq!(row["Status3"], Value::Null);
        assert_eq!(row["StatusEnd"], Value::Null);
        assert!(table.has_column("Status8b"));
        assert_eq!(dropped, 1);
    }

    #[test]
    fn test_combine_status_fields_unprefixed() {
        let mut table = MetricTable::from_rows(vec![json!({
            "protocolId": "P-2",
            "dateStatus4": "2024-03-15",
            "timeStatus4": "09:00:00"
        })
        .as_object()
        .cloned()
        .unwrap()]);
        combine_status_fields(&mut table);
        assert_eq!(table.rows()[0]["Status4"], json!("2024-03-15T09:00:00"));
    }
}
