//! Numeric parsing of free-form measurement values

use serde_json::{Number, Value};

/// Parses a measurement cell into a JSON number
///
/// Numbers pass through. Strings are trimmed and may use a decimal comma
/// (`"36,8"`). Anything else yields `null`.
pub fn parse_number(value: &Value) -> Value {
    match value {
        Value::Number(_) => value.clone(),
        Value::String(s) => {
            let normalized = s.trim().replace(',', ".");
            if let Ok(int) = normalized.parse::<i64>() {
                return Value::from(int);
            }
            normalized
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Null)
        }
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case(json!("15"), json!(15) ; "integer string")]
    #[test_case(json!("36,8"), json!(36.8) ; "decimal comma")]
    #[test_case(json!(" 98.5 "), json!(98.5) ; "padded decimal point")]
    #[test_case(json!(120), json!(120) ; "number")]
    #[test_case(json!("n.m."), json!(null) ; "not measurable")]
    #[test_case(json!("NaN"), json!(null) ; "nan")]
    #[test_case(json!(null), json!(null) ; "null")]
    #[test_case(json!(true), json!(null) ; "bool")]
    fn test_parse_number(input: Value, expected: Value) {
        assert_eq!(parse_number(&input), expected);
    }
}
