//! `SET` list builder for partial updates.
//!
//! An update carries only the fields the caller wants changed. Each field
//! becomes one `"column"=$n` assignment; logical (camelCase) names are
//! translated to storage columns through a [`FieldMap`], and names missing
//! from the map pass through unchanged.

use crate::error::{JoblyError, JoblyResult};
use crate::fragment::{Clause, Fragment, Operator, SqlFragment};
use crate::ident::Column;
use crate::value::SqlValue;
use serde_json::Value;

/// Logical field name to storage column name.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldMap<'a> {
    pairs: &'a [(&'a str, &'a str)],
}

impl<'a> FieldMap<'a> {
    pub const EMPTY: FieldMap<'static> = FieldMap { pairs: &[] };

    pub const fn new(pairs: &'a [(&'a str, &'a str)]) -> Self {
        Self { pairs }
    }

    /// Column for `key`, or `key` itself when unmapped.
    pub fn resolve<'k>(&self, key: &'k str) -> &'k str
    where
        'a: 'k,
    {
        self.pairs
            .iter()
            .find(|(logical, _)| *logical == key)
            .map_or(key, |(_, column)| *column)
    }
}

/// Ordered field/value pairs to write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateData {
    fields: Vec<(String, SqlValue)>,
}

impl UpdateData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a JSON object, keeping its key order.
    ///
    /// Anything but a non-empty object fails with `BadRequest("No data")`.
    pub fn from_json(value: &Value) -> JoblyResult<Self> {
        let map = match value {
            Value::Object(map) if !map.is_empty() => map,
            _ => return Err(no_data()),
        };

        let mut data = Self::new();
        for (key, value) in map {
            data.set(key.as_str(), SqlValue::from_json(value)?);
        }
        Ok(data)
    }

    /// Set `key`, replacing an earlier value in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<SqlValue>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&SqlValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

fn no_data() -> JoblyError {
    JoblyError::bad_request("No data")
}

/// Build the assignment list for `data`, one clause per field in order.
pub fn set_clause(data: &UpdateData, map: &FieldMap<'_>) -> JoblyResult<Fragment> {
    if data.is_empty() {
        return Err(no_data());
    }

    let mut fragment = Fragment::comma();
    for (key, value) in data.iter() {
        let column = Column::new(map.resolve(key))?;
        fragment.push(Clause::bind(column, Operator::Assign, value.clone()));
    }
    Ok(fragment)
}

/// Render a partial update from a raw JSON body.
///
/// ```
/// use jobly::partial_update::{FieldMap, sql_for_partial_update};
/// use serde_json::json;
///
/// let map = FieldMap::new(&[("firstName", "first_name")]);
/// let set = sql_for_partial_update(&json!({"firstName": "Aliya", "age": 32}), &map).unwrap();
/// assert_eq!(set.sql, r#""first_name"=$1, "age"=$2"#);
/// assert_eq!(set.params.len(), 2);
/// ```
pub fn sql_for_partial_update(data: &Value, map: &FieldMap<'_>) -> JoblyResult<SqlFragment> {
    let data = UpdateData::from_json(data)?;
    Ok(set_clause(&data, map)?.render())
}
