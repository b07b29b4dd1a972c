//! `WHERE` clause builders for list queries.
//!
//! Each entity has a closed set of filter keys, modelled as an enum of
//! criteria. A filter keeps its criteria in the order they were given and
//! renders them as an `AND`-joined [`Fragment`](crate::fragment::Fragment);
//! criteria that produce no clause are skipped before placeholders are
//! numbered.
//!
//! ```ignore
//! let filter = JobFilter::from_json(&json!({"minSalary": 90000, "hasEquity": false}))?;
//! let clause = filter.where_clause();
//! assert_eq!(clause.sql, r#""salary" >= $1"#);
//! ```

mod company;
mod job;

pub use company::{CompanyCriterion, CompanyFilter};
pub use job::{JobCriterion, JobFilter};

use crate::error::{JoblyError, JoblyResult};
use serde_json::{Map, Value};

/// `%value%`, for a case-insensitive substring match.
pub(crate) fn substring_pattern(value: &str) -> String {
    format!("%{value}%")
}

pub(crate) fn not_a_filter(key: &str) -> JoblyError {
    JoblyError::bad_request(format!("{key} is not an appropriate filter option"))
}

pub(crate) fn filter_object(value: &Value) -> JoblyResult<&Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(JoblyError::bad_request("filter must be a JSON object")),
    }
}

pub(crate) fn json_string(key: &str, value: &Value) -> JoblyResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        _ => Err(JoblyError::bad_request(format!("{key} must be a string"))),
    }
}

/// A JSON integer, or a string holding one (query strings arrive as text).
pub(crate) fn json_int(key: &str, value: &Value) -> JoblyResult<i32> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| JoblyError::bad_request(format!("{key} must be an integer")))
}

pub(crate) fn json_bool(key: &str, value: &Value) -> JoblyResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) => parse_bool(key, s),
        _ => Err(JoblyError::bad_request(format!("{key} must be true or false"))),
    }
}

pub(crate) fn parse_int(key: &str, raw: &str) -> JoblyResult<i32> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| JoblyError::bad_request(format!("{key} must be an integer")))
}

pub(crate) fn parse_bool(key: &str, raw: &str) -> JoblyResult<bool> {
    match raw.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(JoblyError::bad_request(format!("{key} must be true or false"))),
    }
}

/// Insert `item` into `items`, replacing an earlier item of the same kind in
/// place.
pub(crate) fn replace_or_push<T>(items: &mut Vec<T>, item: T) {
    let kind = std::mem::discriminant(&item);
    match items.iter_mut().find(|c| std::mem::discriminant(&**c) == kind) {
        Some(slot) => *slot = item,
        None => items.push(item),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_int_accepts_numbers_and_numeric_strings() {
        assert_eq!(json_int("minSalary", &json!(90000)).unwrap(), 90000);
        assert_eq!(json_int("minSalary", &json!(" 12 ")).unwrap(), 12);
        assert!(json_int("minSalary", &json!(1.5)).unwrap_err().is_bad_request());
        assert!(json_int("minSalary", &json!("ten")).unwrap_err().is_bad_request());
        assert!(json_int("minSalary", &json!(i64::MAX)).is_err());
    }

    #[test]
    fn bools_are_strict() {
        assert!(json_bool("hasEquity", &json!(true)).unwrap());
        assert!(!json_bool("hasEquity", &json!("false")).unwrap());
        assert!(json_bool("hasEquity", &json!("yes")).is_err());
        assert!(json_bool("hasEquity", &json!(1)).is_err());
    }

    #[test]
    fn unknown_key_message_names_the_key() {
        assert_eq!(
            not_a_filter("notAFilter").to_string(),
            "Bad request: notAFilter is not an appropriate filter option"
        );
    }
}
