use super::parts::SqlPart;
use crate::client::GenericClient;
use crate::error::{JoblyError, JoblyResult};
use crate::fragment::Fragment;
use crate::ident::Column;
use crate::row::FromRow;
use crate::value::SqlValue;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// A parameter-safe dynamic SQL builder.
///
/// `Sql` stores SQL pieces and parameters separately and generates `$1, $2, ...`
/// placeholders automatically in the final SQL string.
#[must_use]
#[derive(Debug, Clone)]
pub struct Sql {
    pub(super) parts: Vec<SqlPart>,
    pub(super) params: Vec<SqlValue>,
    tag: Option<String>,
}

impl Sql {
    /// Create a new builder with an initial SQL fragment.
    pub fn new(initial_sql: impl Into<String>) -> Self {
        Self {
            parts: vec![SqlPart::Raw(initial_sql.into())],
            params: Vec::new(),
            tag: None,
        }
    }

    /// Create an empty builder.
    pub fn empty() -> Self {
        Self {
            parts: Vec::new(),
            params: Vec::new(),
            tag: None,
        }
    }

    /// Associate a tag for logging.
    pub fn tag(&mut self, tag: impl Into<String>) -> &mut Self {
        self.tag = Some(tag.into());
        self
    }

    /// Append raw SQL (no parameters).
    pub fn push(&mut self, sql: &str) -> &mut Self {
        if sql.is_empty() {
            return self;
        }

        match self.parts.last_mut() {
            Some(SqlPart::Raw(last)) => last.push_str(sql),
            _ => self.parts.push(SqlPart::Raw(sql.to_string())),
        }
        self
    }

    /// Append a parameter placeholder and bind its value.
    pub fn push_bind(&mut self, value: impl Into<SqlValue>) -> &mut Self {
        self.parts.push(SqlPart::Param);
        self.params.push(value.into());
        self
    }

    /// Append a quoted column identifier.
    pub fn push_column(&mut self, column: &Column) -> &mut Self {
        match self.parts.last_mut() {
            Some(SqlPart::Raw(last)) => column.write_sql(last),
            _ => {
                let mut s = String::new();
                column.write_sql(&mut s);
                self.parts.push(SqlPart::Raw(s));
            }
        }
        self
    }

    /// Append a fragment's clauses, continuing the placeholder numbering.
    pub fn push_fragment(&mut self, fragment: &Fragment) -> &mut Self {
        fragment.write_to(self);
        self
    }

    /// Append ` WHERE <fragment>`.
    ///
    /// If the fragment has no clauses, nothing is appended: a dangling
    /// `WHERE` is never emitted.
    pub fn push_where(&mut self, fragment: &Fragment) -> &mut Self {
        if fragment.is_empty() {
            return self;
        }
        self.push(" WHERE ");
        self.push_fragment(fragment)
    }

    /// Number of bound parameters so far.
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Bound parameters, in placeholder order.
    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    /// Take the bound parameters.
    pub fn into_params(self) -> Vec<SqlValue> {
        self.params
    }

    /// Render SQL with `$1, $2, ...` placeholders.
    pub fn to_sql(&self) -> String {
        let cap: usize = self
            .parts
            .iter()
            .map(|p| match p {
                SqlPart::Raw(s) => s.len(),
                SqlPart::Param => 4,
            })
            .sum();

        let mut out = String::with_capacity(cap);
        let mut idx: usize = 0;
        for part in &self.parts {
            match part {
                SqlPart::Raw(s) => out.push_str(s),
                SqlPart::Param => {
                    idx += 1;
                    out.push('$');
                    out.push_str(&idx.to_string());
                }
            }
        }
        out
    }

    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|p| p as &(dyn ToSql + Sync))
            .collect()
    }

    pub(crate) fn validate(&self) -> JoblyResult<()> {
        let placeholder_count = self
            .parts
            .iter()
            .filter(|p| matches!(p, SqlPart::Param))
            .count();

        if placeholder_count != self.params.len() {
            let params_len = self.params.len();
            return Err(JoblyError::internal(format!(
                "Sql: placeholders({placeholder_count}) != params({params_len})"
            )));
        }
        Ok(())
    }

    async fn rows(&self, conn: &impl GenericClient) -> JoblyResult<Vec<Row>> {
        self.validate()?;
        let sql = self.to_sql();
        let params = self.params_ref();
        match self.tag.as_deref() {
            Some(tag) => conn.query_tagged(tag, &sql, &params).await,
            None => conn.query(&sql, &params).await,
        }
    }

    /// Run the statement and map every row to `T`.
    pub async fn fetch_all_as<T: FromRow>(&self, conn: &impl GenericClient) -> JoblyResult<Vec<T>> {
        self.rows(conn).await?.iter().map(T::from_row).collect()
    }

    /// Run the statement and return the first row, if any.
    pub async fn fetch_opt(&self, conn: &impl GenericClient) -> JoblyResult<Option<Row>> {
        Ok(self.rows(conn).await?.into_iter().next())
    }

    pub async fn fetch_opt_as<T: FromRow>(&self, conn: &impl GenericClient) -> JoblyResult<Option<T>> {
        self.fetch_opt(conn).await?.as_ref().map(T::from_row).transpose()
    }

    /// Like [`Sql::fetch_opt_as`], but no row is an error. Used for
    /// `INSERT ... RETURNING`, which always yields one.
    pub async fn fetch_one_as<T: FromRow>(&self, conn: &impl GenericClient) -> JoblyResult<T> {
        let row = self
            .fetch_opt(conn)
            .await?
            .ok_or_else(|| JoblyError::internal("statement returned no row"))?;
        T::from_row(&row)
    }
}
