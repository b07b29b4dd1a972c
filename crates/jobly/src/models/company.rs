use crate::client::GenericClient;
use crate::error::{JoblyError, JoblyResult};
use crate::filter::CompanyFilter;
use crate::partial_update::{FieldMap, UpdateData, set_clause};
use crate::row::{FromRow, RowExt};
use crate::sql::sql;
use crate::validate::{Body, ValidationCode, ValidationError, regex_is_match};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tokio_postgres::Row;

/// Logical update keys that differ from their column names.
pub const COMPANY_FIELDS: FieldMap<'static> =
    FieldMap::new(&[("numEmployees", "num_employees"), ("logoUrl", "logo_url")]);

const RETURNING: &str = "handle, name, description, num_employees, logo_url";

const HANDLE_PATTERN: &str = r"^[a-z0-9_-]+$";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub handle: String,
    pub name: String,
    pub description: String,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

impl FromRow for Company {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            handle: row.try_get_column("handle")?,
            name: row.try_get_column("name")?,
            description: row.try_get_column("description")?,
            num_employees: row.try_get_column("num_employees")?,
            logo_url: row.try_get_column("logo_url")?,
        })
    }
}

/// A job as listed under its company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyJob {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
}

impl FromRow for CompanyJob {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            title: row.try_get_column("title")?,
            salary: row.try_get_column("salary")?,
            equity: row.try_get_column("equity")?,
        })
    }
}

/// A company together with its jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyDetail {
    #[serde(flatten)]
    pub company: Company,
    pub jobs: Vec<CompanyJob>,
}

/// Payload for creating a company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCompany {
    pub handle: String,
    pub name: String,
    pub description: String,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

impl NewCompany {
    /// Validate a `{handle, name, description, numEmployees?, logoUrl?}` body.
    pub fn from_json(value: &Value) -> JoblyResult<Self> {
        let mut body = Body::open(
            value,
            &["handle", "name", "description", "numEmployees", "logoUrl"],
        )?;

        let handle = body.string_len("handle", true, 1, Some(25));
        if let Some(h) = &handle {
            if !regex_is_match(HANDLE_PATTERN, h) {
                body.reject(ValidationError::new(
                    "handle",
                    ValidationCode::Regex,
                    "handle may only contain lowercase letters, digits, '-' and '_'",
                ));
            }
        }
        let name = body.string_len("name", true, 1, None);
        let description = body.string("description", true);
        let num_employees = body.int("numEmployees", false, 0);
        let logo_url = body.url("logoUrl", false);
        body.finish()?;

        match (handle, name, description) {
            (Some(handle), Some(name), Some(description)) => Ok(Self {
                handle,
                name,
                description,
                num_employees,
                logo_url,
            }),
            _ => Err(JoblyError::bad_request("incomplete company")),
        }
    }
}

/// Partial update for a company. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

impl CompanyUpdate {
    /// Validate a `{name?, description?, numEmployees?, logoUrl?}` body.
    ///
    /// `handle` cannot be changed and is rejected like any unknown field.
    pub fn from_json(value: &Value) -> JoblyResult<Self> {
        let mut body = Body::open(value, &["name", "description", "numEmployees", "logoUrl"])?;
        let update = Self {
            name: body.string_len("name", false, 1, None),
            description: body.string("description", false),
            num_employees: body.int("numEmployees", false, 0),
            logo_url: body.url("logoUrl", false),
        };
        body.finish()?;
        Ok(update)
    }

    /// Set fields keyed by their logical names, in declaration order.
    pub fn to_update_data(&self) -> UpdateData {
        let mut data = UpdateData::new();
        if let Some(name) = &self.name {
            data.set("name", name.as_str());
        }
        if let Some(description) = &self.description {
            data.set("description", description.as_str());
        }
        if let Some(n) = self.num_employees {
            data.set("numEmployees", n);
        }
        if let Some(url) = &self.logo_url {
            data.set("logoUrl", url.as_str());
        }
        data
    }
}

fn no_company(handle: &str) -> JoblyError {
    JoblyError::not_found(format!("No company: {handle}"))
}

impl Company {
    /// Insert a company. Fails with `Conflict` if the handle is taken.
    pub async fn create(conn: &impl GenericClient, new: &NewCompany) -> JoblyResult<Company> {
        let mut check = sql("SELECT handle FROM companies WHERE handle = ");
        check.push_bind(new.handle.as_str()).tag("companies.duplicate_check");
        if check.fetch_opt(conn).await?.is_some() {
            return Err(JoblyError::conflict(format!(
                "Duplicate company: {}",
                new.handle
            )));
        }

        let mut q = sql(
            "INSERT INTO companies (handle, name, description, num_employees, logo_url) VALUES (",
        );
        q.push_bind(new.handle.as_str())
            .push(", ")
            .push_bind(new.name.as_str())
            .push(", ")
            .push_bind(new.description.as_str())
            .push(", ")
            .push_bind(new.num_employees)
            .push(", ")
            .push_bind(new.logo_url.clone())
            .push(") RETURNING ")
            .push(RETURNING)
            .tag("companies.create");
        q.fetch_one_as(conn).await
    }

    /// All companies ordered by name, optionally filtered.
    ///
    /// A filter whose clauses are all dropped lists every company.
    pub async fn find_all(
        conn: &impl GenericClient,
        filter: Option<&CompanyFilter>,
    ) -> JoblyResult<Vec<Company>> {
        let mut q = sql("SELECT ");
        q.push(RETURNING).push(" FROM companies");
        if let Some(filter) = filter {
            filter.check_range()?;
            q.push_where(&filter.to_fragment()?);
        }
        q.push(" ORDER BY name").tag("companies.find_all");
        q.fetch_all_as(conn).await
    }

    /// A company and its jobs (possibly none).
    pub async fn get(conn: &impl GenericClient, handle: &str) -> JoblyResult<CompanyDetail> {
        let mut q = sql("SELECT ");
        q.push(RETURNING)
            .push(" FROM companies WHERE handle = ")
            .push_bind(handle)
            .tag("companies.get");
        let company: Company = q
            .fetch_opt_as(conn)
            .await?
            .ok_or_else(|| no_company(handle))?;

        let mut jobs = sql("SELECT id, title, salary, equity FROM jobs WHERE company_handle = ");
        jobs.push_bind(handle)
            .push(" ORDER BY id")
            .tag("companies.get.jobs");
        let jobs = jobs.fetch_all_as(conn).await?;

        Ok(CompanyDetail { company, jobs })
    }

    /// Apply a partial update and return the updated company.
    pub async fn update(
        conn: &impl GenericClient,
        handle: &str,
        update: &CompanyUpdate,
    ) -> JoblyResult<Company> {
        let set = set_clause(&update.to_update_data(), &COMPANY_FIELDS)?;

        let mut q = sql("UPDATE companies SET ");
        q.push_fragment(&set)
            .push(" WHERE handle = ")
            .push_bind(handle)
            .push(" RETURNING ")
            .push(RETURNING)
            .tag("companies.update");
        q.fetch_opt_as(conn).await?.ok_or_else(|| no_company(handle))
    }

    /// Delete a company; its jobs go with it.
    pub async fn remove(conn: &impl GenericClient, handle: &str) -> JoblyResult<()> {
        let mut q = sql("DELETE FROM companies WHERE handle = ");
        q.push_bind(handle)
            .push(" RETURNING handle")
            .tag("companies.remove");
        match q.fetch_opt(conn).await? {
            Some(_) => Ok(()),
            None => Err(no_company(handle)),
        }
    }
}
