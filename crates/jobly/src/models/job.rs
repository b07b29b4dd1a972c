use crate::client::GenericClient;
use crate::error::{JoblyError, JoblyResult};
use crate::filter::JobFilter;
use crate::partial_update::{FieldMap, UpdateData, set_clause};
use crate::row::{FromRow, RowExt};
use crate::sql::sql;
use crate::validate::Body;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tokio_postgres::Row;

/// Job update keys already match their column names.
pub const JOB_FIELDS: FieldMap<'static> = FieldMap::EMPTY;

const RETURNING: &str = "id, title, salary, equity, company_handle";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

impl FromRow for Job {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            title: row.try_get_column("title")?,
            salary: row.try_get_column("salary")?,
            equity: row.try_get_column("equity")?,
            company_handle: row.try_get_column("company_handle")?,
        })
    }
}

/// Payload for creating a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJob {
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

impl NewJob {
    /// Validate a `{title, salary?, equity?, companyHandle}` body.
    pub fn from_json(value: &Value) -> JoblyResult<Self> {
        let mut body = Body::open(value, &["title", "salary", "equity", "companyHandle"])?;
        let title = body.string_len("title", true, 1, None);
        let salary = body.int("salary", false, 0);
        let equity = body.decimal("equity", false, Decimal::ZERO, Decimal::ONE);
        let company_handle = body.string_len("companyHandle", true, 1, Some(25));
        body.finish()?;

        match (title, company_handle) {
            (Some(title), Some(company_handle)) => Ok(Self {
                title,
                salary,
                equity,
                company_handle,
            }),
            _ => Err(JoblyError::bad_request("incomplete job")),
        }
    }
}

/// Partial update for a job. The id and company cannot be changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobUpdate {
    pub title: Option<String>,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
}

impl JobUpdate {
    pub fn from_json(value: &Value) -> JoblyResult<Self> {
        let mut body = Body::open(value, &["title", "salary", "equity"])?;
        let update = Self {
            title: body.string_len("title", false, 1, None),
            salary: body.int("salary", false, 0),
            equity: body.decimal("equity", false, Decimal::ZERO, Decimal::ONE),
        };
        body.finish()?;
        Ok(update)
    }

    pub fn to_update_data(&self) -> UpdateData {
        let mut data = UpdateData::new();
        if let Some(title) = &self.title {
            data.set("title", title.as_str());
        }
        if let Some(salary) = self.salary {
            data.set("salary", salary);
        }
        if let Some(equity) = self.equity {
            data.set("equity", equity);
        }
        data
    }
}

fn no_job(title: &str) -> JoblyError {
    JoblyError::not_found(format!("No job: {title}"))
}

/// Titles key the job routes, so each one may name at most one row.
async fn ensure_title_free(conn: &impl GenericClient, title: &str) -> JoblyResult<()> {
    let mut check = sql("SELECT title FROM jobs WHERE title = ");
    check.push_bind(title).tag("jobs.duplicate_check");
    if check.fetch_opt(conn).await?.is_some() {
        return Err(JoblyError::conflict(format!("Duplicate job: {title}")));
    }
    Ok(())
}

impl Job {
    /// Insert a job. Fails with `Conflict` if the title is taken.
    ///
    /// An unknown company surfaces as a foreign-key violation.
    pub async fn create(conn: &impl GenericClient, new: &NewJob) -> JoblyResult<Job> {
        ensure_title_free(conn, &new.title).await?;

        let mut q = sql("INSERT INTO jobs (title, salary, equity, company_handle) VALUES (");
        q.push_bind(new.title.as_str())
            .push(", ")
            .push_bind(new.salary)
            .push(", ")
            .push_bind(new.equity)
            .push(", ")
            .push_bind(new.company_handle.as_str())
            .push(") RETURNING ")
            .push(RETURNING)
            .tag("jobs.create");
        q.fetch_one_as(conn).await
    }

    /// All jobs ordered by title, optionally filtered.
    pub async fn find_all(
        conn: &impl GenericClient,
        filter: Option<&JobFilter>,
    ) -> JoblyResult<Vec<Job>> {
        let mut q = sql("SELECT ");
        q.push(RETURNING).push(" FROM jobs");
        if let Some(filter) = filter {
            // hasEquity=false alone leaves nothing; push_where then adds no WHERE
            q.push_where(&filter.to_fragment()?);
        }
        q.push(" ORDER BY title").tag("jobs.find_all");
        q.fetch_all_as(conn).await
    }

    pub async fn get(conn: &impl GenericClient, title: &str) -> JoblyResult<Job> {
        let mut q = sql("SELECT ");
        q.push(RETURNING)
            .push(" FROM jobs WHERE title = ")
            .push_bind(title)
            .tag("jobs.get");
        q.fetch_opt_as(conn).await?.ok_or_else(|| no_job(title))
    }

    /// Apply a partial update and return the updated job.
    ///
    /// Renaming onto a title another job already holds fails with `Conflict`.
    pub async fn update(
        conn: &impl GenericClient,
        title: &str,
        update: &JobUpdate,
    ) -> JoblyResult<Job> {
        let set = set_clause(&update.to_update_data(), &JOB_FIELDS)?;
        if let Some(new_title) = update.title.as_deref().filter(|t| *t != title) {
            ensure_title_free(conn, new_title).await?;
        }

        let mut q = sql("UPDATE jobs SET ");
        q.push_fragment(&set)
            .push(" WHERE title = ")
            .push_bind(title)
            .push(" RETURNING ")
            .push(RETURNING)
            .tag("jobs.update");
        q.fetch_opt_as(conn).await?.ok_or_else(|| no_job(title))
    }

    /// Delete a job, returning its title.
    pub async fn remove(conn: &impl GenericClient, title: &str) -> JoblyResult<String> {
        let mut q = sql("DELETE FROM jobs WHERE title = ");
        q.push_bind(title)
            .push(" RETURNING title")
            .tag("jobs.remove");
        let row = q.fetch_opt(conn).await?.ok_or_else(|| no_job(title))?;
        row.try_get_column("title")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SqlValue;
    use serde_json::json;

    #[test]
    fn new_job_accepts_string_equity() {
        let new = NewJob::from_json(&json!({
            "title": "coder",
            "salary": 75000,
            "equity": "0.5",
            "companyHandle": "c1",
        }))
        .unwrap();
        assert_eq!(new.equity, Some(Decimal::new(5, 1)));
        assert_eq!(new.salary, Some(75000));
    }

    #[test]
    fn new_job_requires_title_and_company() {
        let JoblyError::Invalid(errors) = NewJob::from_json(&json!({"salary": 1})).unwrap_err()
        else {
            panic!("expected validation errors");
        };
        assert!(errors.has_field("title"));
        assert!(errors.has_field("companyHandle"));
    }

    #[test]
    fn update_rejects_id_company_and_bad_types() {
        for body in [
            json!({"id": 3}),
            json!({"companyHandle": "c2"}),
            json!({"salary": "not-an-integer"}),
            json!({"equity": 1.5}),
        ] {
            let err = JobUpdate::from_json(&body).unwrap_err();
            assert_eq!(err.status_code(), 400, "{body}");
        }
    }

    #[test]
    fn update_writes_fields_in_declaration_order() {
        let update = JobUpdate::from_json(&json!({"equity": "0.1", "title": "new"})).unwrap();
        let set = set_clause(&update.to_update_data(), &JOB_FIELDS)
            .unwrap()
            .render();
        assert_eq!(set.sql, r#""title"=$1, "equity"=$2"#);
        assert_eq!(
            set.params,
            vec![SqlValue::from("new"), SqlValue::Decimal(Decimal::new(1, 1))]
        );
    }

    #[test]
    fn serializes_camel_case_with_string_equity() {
        let job = Job {
            id: 1,
            title: "j1".into(),
            salary: None,
            equity: Some(Decimal::new(5, 1)),
            company_handle: "c1".into(),
        };
        assert_eq!(
            serde_json::to_value(&job).unwrap(),
            json!({"id": 1, "title": "j1", "salary": null, "equity": "0.5", "companyHandle": "c1"})
        );
    }
}
