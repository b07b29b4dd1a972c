#![allow(dead_code)]

use jobly::{GenericClient, JoblyError, JoblyResult};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio_postgres::{Client, NoTls};

const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

const SEED_SQL: &str = "
INSERT INTO companies (handle, name, num_employees, description, logo_url)
VALUES ('c1', 'C1', 1, 'Desc1', 'http://c1.img'),
       ('c2', 'C2', 2, 'Desc2', 'http://c2.img'),
       ('c3', 'C3', 3, 'Desc3', 'http://c3.img');

INSERT INTO jobs (title, salary, equity, company_handle)
VALUES ('j1', 75000, 0.5, 'c1'),
       ('j2', 95000, 0.5, 'c2'),
       ('j3', 175000, 0.5, 'c3');
";

/// A connection scoped to a private, seeded schema.
pub struct TestDb {
    pub client: Client,
    schema: String,
}

impl TestDb {
    /// Connect and seed, or `None` when `DATABASE_URL` is unset.
    pub async fn connect(test_name: &str) -> JoblyResult<Option<Self>> {
        let database_url = match std::env::var("DATABASE_URL") {
            Ok(v) => v,
            Err(_) => {
                eprintln!("DATABASE_URL is not set; skipping {test_name}");
                return Ok(None);
            }
        };

        let (client, connection) = tokio_postgres::connect(&database_url, NoTls)
            .await
            .map_err(JoblyError::from_db_error)?;
        tokio::spawn(async move {
            let _ = connection.await;
        });

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock before UNIX_EPOCH")
            .as_nanos();
        let schema = format!("jobly_test_{}_{}", std::process::id(), nanos);

        GenericClient::batch_execute(
            &client,
            &format!("CREATE SCHEMA {schema}; SET search_path TO {schema};"),
        )
        .await?;
        GenericClient::batch_execute(&client, SCHEMA_SQL).await?;
        GenericClient::batch_execute(&client, SEED_SQL).await?;

        Ok(Some(Self { client, schema }))
    }

    pub async fn teardown(self) -> JoblyResult<()> {
        GenericClient::batch_execute(
            &self.client,
            &format!("DROP SCHEMA IF EXISTS {} CASCADE", self.schema),
        )
        .await
    }
}
