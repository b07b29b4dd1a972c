//! Scalar parameter values.
//!
//! Update and filter inputs carry loosely typed scalars (a JSON body may hold a
//! string, an integer, a decimal, a boolean or null). [`SqlValue`] keeps that
//! scalar as-is and adapts it to the column type Postgres infers for the
//! placeholder when the statement is executed.

use crate::error::{JoblyError, JoblyResult};
use bytes::BytesMut;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::Value;
use std::error::Error;
use std::fmt;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

/// A scalar bound to a `$n` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Decimal(Decimal),
    Text(String),
}

impl SqlValue {
    /// Convert a JSON scalar.
    ///
    /// Integers stay integers, other numbers become decimals. Arrays and
    /// objects are a `BadRequest`.
    pub fn from_json(value: &Value) -> JoblyResult<Self> {
        match value {
            Value::Null => Ok(Self::Null),
            Value::Bool(b) => Ok(Self::Bool(*b)),
            Value::String(s) => Ok(Self::Text(s.clone())),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    return Ok(Self::Int(i));
                }
                n.to_string()
                    .parse::<Decimal>()
                    .map(Self::Decimal)
                    .or_else(|_| Decimal::from_scientific(&n.to_string()).map(Self::Decimal))
                    .map_err(|_| JoblyError::bad_request(format!("unsupported number: {n}")))
            }
            Value::Array(_) | Value::Object(_) => Err(JoblyError::bad_request(
                "only scalar values can be bound as parameters",
            )),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<Decimal> for SqlValue {
    fn from(v: Decimal) -> Self {
        Self::Decimal(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

fn out_of_range(value: impl fmt::Display, ty: &Type) -> Box<dyn Error + Sync + Send> {
    format!("value {value} does not fit column type {ty}").into()
}

impl ToSql for SqlValue {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Self::Null => Ok(IsNull::Yes),
            Self::Bool(b) => b.to_sql_checked(ty, out),
            Self::Text(s) => s.to_sql_checked(ty, out),
            Self::Int(i) => {
                if *ty == Type::INT2 {
                    i16::try_from(*i)
                        .map_err(|_| out_of_range(i, ty))?
                        .to_sql(ty, out)
                } else if *ty == Type::INT4 {
                    i32::try_from(*i)
                        .map_err(|_| out_of_range(i, ty))?
                        .to_sql(ty, out)
                } else if *ty == Type::NUMERIC {
                    Decimal::from(*i).to_sql(ty, out)
                } else if *ty == Type::FLOAT8 {
                    (*i as f64).to_sql(ty, out)
                } else {
                    i.to_sql_checked(ty, out)
                }
            }
            Self::Decimal(d) => {
                if *ty == Type::FLOAT8 {
                    d.to_f64().ok_or_else(|| out_of_range(d, ty))?.to_sql(ty, out)
                } else {
                    d.to_sql_checked(ty, out)
                }
            }
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_scalars_convert() {
        assert_eq!(SqlValue::from_json(&json!(null)).unwrap(), SqlValue::Null);
        assert_eq!(SqlValue::from_json(&json!(true)).unwrap(), SqlValue::Bool(true));
        assert_eq!(SqlValue::from_json(&json!(10)).unwrap(), SqlValue::Int(10));
        assert_eq!(
            SqlValue::from_json(&json!("New Description")).unwrap(),
            SqlValue::Text("New Description".into())
        );
        assert_eq!(
            SqlValue::from_json(&json!(0.5)).unwrap(),
            SqlValue::Decimal(Decimal::new(5, 1))
        );
    }

    #[test]
    fn json_containers_are_rejected() {
        assert!(SqlValue::from_json(&json!([1])).unwrap_err().is_bad_request());
        assert!(SqlValue::from_json(&json!({"a": 1})).unwrap_err().is_bad_request());
    }

    #[test]
    fn option_maps_to_null() {
        assert_eq!(SqlValue::from(None::<i32>), SqlValue::Null);
        assert_eq!(SqlValue::from(Some("x")), SqlValue::Text("x".into()));
    }

    #[test]
    fn int_encodes_for_int4_columns() {
        let mut buf = BytesMut::new();
        let r = SqlValue::Int(90000).to_sql_checked(&Type::INT4, &mut buf).unwrap();
        assert!(matches!(r, IsNull::No));
        assert_eq!(buf.len(), 4);
    }

    #[test]
    fn int_out_of_range_for_int2_errors() {
        let mut buf = BytesMut::new();
        assert!(SqlValue::Int(90000).to_sql_checked(&Type::INT2, &mut buf).is_err());
    }

    #[test]
    fn text_into_int_column_errors() {
        let mut buf = BytesMut::new();
        assert!(SqlValue::from("x").to_sql_checked(&Type::INT4, &mut buf).is_err());
    }

    #[test]
    fn null_is_null_for_any_type() {
        let mut buf = BytesMut::new();
        let r = SqlValue::Null.to_sql_checked(&Type::NUMERIC, &mut buf).unwrap();
        assert!(matches!(r, IsNull::Yes));
    }
}
