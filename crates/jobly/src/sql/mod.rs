//! Dynamic SQL builder.
//!
//! `Sql` composes statements without manually tracking placeholder indices:
//! literal text and bound values are pushed in order, and `$1, $2, ...` are
//! assigned when the statement is rendered.
//!
//! # Example
//!
//! ```ignore
//! use jobly::sql;
//!
//! let mut q = sql("SELECT handle, name FROM companies");
//! q.push_where(&filter.to_fragment());
//! q.push(" ORDER BY name");
//!
//! let companies: Vec<Company> = q.fetch_all_as(&conn).await?;
//! ```

mod builder;
mod parts;


pub use builder::Sql;

/// Start building a SQL statement.
pub fn sql(initial_sql: impl Into<String>) -> Sql {
    Sql::new(initial_sql)
}
