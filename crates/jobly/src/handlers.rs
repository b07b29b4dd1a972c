//! Request handlers for the company and job routes.
//!
//! | Route                       | Role   | Body                 |
//! |-----------------------------|--------|----------------------|
//! | `POST /companies`           | admin  | `{company}` (201)    |
//! | `GET /companies`            | any    | `{companies}`        |
//! | `GET /companies/:handle`    | any    | `{company}` + jobs   |
//! | `PATCH /companies/:handle`  | admin  | `{company}`          |
//! | `DELETE /companies/:handle` | admin  | `{deleted: handle}`  |
//! | `POST /jobs`                | admin  | `{job}` (201)        |
//! | `GET /jobs`                 | any    | `{jobs}`             |
//! | `GET /jobs/:title`          | any    | `{job}`              |
//! | `PATCH /jobs/:title`        | admin  | `{job}`              |
//! | `DELETE /jobs/:title`       | admin  | `{deleted: title}`   |
//!
//! Failures become `{"error": {"message", "status"}}` with the status from
//! [`JoblyError::status_code`].

use crate::access::Caller;
use crate::client::GenericClient;
use crate::error::{JoblyError, JoblyResult};
use crate::filter::{CompanyFilter, JobFilter};
use crate::models::{Company, CompanyUpdate, Job, JobUpdate, NewCompany, NewJob};
use serde::Serialize;
use serde_json::{Value, json};

/// A status code and JSON body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub status: u16,
    pub body: Value,
}

impl Response {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn created(body: Value) -> Self {
        Self { status: 201, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Body for a failed request.
pub fn error_body(err: &JoblyError) -> Value {
    json!({
        "error": {
            "message": err.message(),
            "status": err.status_code(),
        }
    })
}

impl From<JoblyError> for Response {
    fn from(err: JoblyError) -> Self {
        let status = err.status_code();
        if status >= 500 {
            tracing::error!(error = %err, "request failed");
        } else {
            tracing::debug!(status, error = %err, "request rejected");
        }
        Self {
            status,
            body: error_body(&err),
        }
    }
}

async fn respond(handler: impl Future<Output = JoblyResult<Response>>) -> Response {
    handler.await.unwrap_or_else(Response::from)
}

/// Route handlers over a database client.
pub struct Handlers<C> {
    conn: C,
}

impl<C: GenericClient> Handlers<C> {
    pub fn new(conn: C) -> Self {
        Self { conn }
    }

    pub fn client(&self) -> &C {
        &self.conn
    }

    /// `POST /companies`
    pub async fn create_company(&self, caller: &Caller, body: &Value) -> Response {
        respond(async {
            caller.ensure_admin()?;
            let new = NewCompany::from_json(body)?;
            let company = Company::create(&self.conn, &new).await?;
            Ok(Response::created(json!({ "company": company })))
        })
        .await
    }

    /// `GET /companies` with query-string filters.
    pub async fn list_companies(&self, query: &[(String, String)]) -> Response {
        respond(async {
            let filter = if query.is_empty() {
                None
            } else {
                Some(CompanyFilter::from_query(query.iter().map(|(k, v)| (k, v)))?)
            };
            let companies = Company::find_all(&self.conn, filter.as_ref()).await?;
            Ok(Response::ok(json!({ "companies": companies })))
        })
        .await
    }

    /// `GET /companies/:handle`
    pub async fn get_company(&self, handle: &str) -> Response {
        respond(async {
            let company = Company::get(&self.conn, handle).await?;
            Ok(Response::ok(json!({ "company": company })))
        })
        .await
    }

    /// `PATCH /companies/:handle`
    pub async fn update_company(&self, caller: &Caller, handle: &str, body: &Value) -> Response {
        respond(async {
            caller.ensure_admin()?;
            let update = CompanyUpdate::from_json(body)?;
            let company = Company::update(&self.conn, handle, &update).await?;
            Ok(Response::ok(json!({ "company": company })))
        })
        .await
    }

    /// `DELETE /companies/:handle`
    pub async fn delete_company(&self, caller: &Caller, handle: &str) -> Response {
        respond(async {
            caller.ensure_admin()?;
            Company::remove(&self.conn, handle).await?;
            Ok(Response::ok(json!({ "deleted": handle })))
        })
        .await
    }

    /// `POST /jobs`
    pub async fn create_job(&self, caller: &Caller, body: &Value) -> Response {
        respond(async {
            caller.ensure_admin()?;
            let new = NewJob::from_json(body)?;
            let job = Job::create(&self.conn, &new).await?;
            Ok(Response::created(json!({ "job": job })))
        })
        .await
    }

    /// `GET /jobs` with query-string filters.
    pub async fn list_jobs(&self, query: &[(String, String)]) -> Response {
        respond(async {
            let filter = if query.is_empty() {
                None
            } else {
                Some(JobFilter::from_query(query.iter().map(|(k, v)| (k, v)))?)
            };
            let jobs = Job::find_all(&self.conn, filter.as_ref()).await?;
            Ok(Response::ok(json!({ "jobs": jobs })))
        })
        .await
    }

    /// `GET /jobs/:title`
    pub async fn get_job(&self, title: &str) -> Response {
        respond(async {
            let job = Job::get(&self.conn, title).await?;
            Ok(Response::ok(json!({ "job": job })))
        })
        .await
    }

    /// `PATCH /jobs/:title`
    pub async fn update_job(&self, caller: &Caller, title: &str, body: &Value) -> Response {
        respond(async {
            caller.ensure_admin()?;
            let update = JobUpdate::from_json(body)?;
            let job = Job::update(&self.conn, title, &update).await?;
            Ok(Response::ok(json!({ "job": job })))
        })
        .await
    }

    /// `DELETE /jobs/:title`
    pub async fn delete_job(&self, caller: &Caller, title: &str) -> Response {
        respond(async {
            caller.ensure_admin()?;
            let deleted = Job::remove(&self.conn, title).await?;
            Ok(Response::ok(json!({ "deleted": deleted })))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_postgres::Row;
    use tokio_postgres::types::ToSql;

    /// A client that must never be reached.
    struct Unreachable;

    impl GenericClient for Unreachable {
        async fn query(&self, sql: &str, _: &[&(dyn ToSql + Sync)]) -> JoblyResult<Vec<Row>> {
            panic!("unexpected query: {sql}")
        }

        async fn batch_execute(&self, sql: &str) -> JoblyResult<()> {
            panic!("unexpected batch: {sql}")
        }
    }

    #[test]
    fn error_body_shape() {
        let body = error_body(&JoblyError::not_found("No company: nope"));
        assert_eq!(
            body,
            json!({"error": {"message": "No company: nope", "status": 404}})
        );
    }

    #[tokio::test]
    async fn writes_require_admin_before_touching_the_database() {
        let h = Handlers::new(Unreachable);
        let body = json!({"title": "new"});

        for caller in [Caller::Anonymous, Caller::user("u1")] {
            let responses = [
                h.create_company(&caller, &body).await,
                h.update_company(&caller, "c1", &body).await,
                h.delete_company(&caller, "c1").await,
                h.create_job(&caller, &body).await,
                h.update_job(&caller, "j1", &body).await,
                h.delete_job(&caller, "j1").await,
            ];
            for r in responses {
                assert_eq!(r.status, 401);
                assert_eq!(r.body["error"]["status"], 401);
            }
        }
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_before_querying() {
        let h = Handlers::new(Unreachable);
        let admin = Caller::admin("admin");

        let r = h
            .update_job(&admin, "j1", &json!({"salary": "not-an-integer"}))
            .await;
        assert_eq!(r.status, 400);

        let r = h.update_company(&admin, "c1", &json!({})).await;
        assert_eq!(r.status, 400);
        assert_eq!(r.body["error"]["message"], "No data");

        let r = h
            .list_jobs(&[("notAFilter".to_string(), "x".to_string())])
            .await;
        assert_eq!(r.status, 400);
        assert_eq!(
            r.body["error"]["message"],
            "notAFilter is not an appropriate filter option"
        );

        let r = h
            .list_companies(&[
                ("minEmployees".to_string(), "10".to_string()),
                ("maxEmployees".to_string(), "1".to_string()),
            ])
            .await;
        assert_eq!(r.status, 400);
        assert!(!r.is_success());
    }
}
