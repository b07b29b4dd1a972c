//! Safe SQL column identifiers.
//!
//! Fragment builders always emit columns in quoted form (`"num_employees"`).
//! [`Column`] owns that rendering: any character except NUL is allowed, and
//! embedded `"` is escaped as `""`, so a caller-supplied field name can never
//! terminate the identifier early.
//!
//! # Example
//! ```ignore
//! use jobly::Column;
//!
//! let c = Column::new("num_employees")?;
//! assert_eq!(c.to_sql(), r#""num_employees""#);
//! # Ok::<(), jobly::JoblyError>(())
//! ```

use crate::error::{JoblyError, JoblyResult};
use std::fmt;

/// A single quoted column name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column(String);

impl Column {
    /// Validate and wrap a column name.
    pub fn new(name: impl Into<String>) -> JoblyResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(JoblyError::bad_request("Column name cannot be empty"));
        }
        if name.contains('\0') {
            return Err(JoblyError::bad_request(
                "Column name cannot contain NUL character",
            ));
        }
        Ok(Self(name))
    }

    /// The unquoted name.
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Render the column as a quoted SQL identifier.
    pub fn to_sql(&self) -> String {
        let mut out = String::with_capacity(self.0.len() + 2);
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        out.push('"');
        for ch in self.0.chars() {
            if ch == '"' {
                out.push_str("\"\"");
            } else {
                out.push(ch);
            }
        }
        out.push('"');
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}
