//! # jobly
//!
//! Data layer for a small job board: companies and the jobs they post, stored
//! in PostgreSQL.
//!
//! ## Features
//!
//! - **Positional fragments**: partial-update `SET` lists and per-entity `WHERE`
//!   filters render to SQL text plus a parameter list whose `$n` placeholders
//!   always line up, even when a filter drops a clause
//! - **Closed inputs**: filter and update keys are enums and structs; unknown
//!   keys are a `BadRequest`
//! - **Repositories**: `create / find_all / get / update / remove` for companies
//!   and jobs over any `GenericClient`
//! - **Handlers**: the route table as methods returning a status and JSON body
//! - **Statement logging** through `tracing`
//!
//! ```ignore
//! use jobly::{JobFilter, Job};
//! use serde_json::json;
//!
//! let pool = jobly::create_pool("postgresql:///jobly")?;
//! let client = pool.get().await?;
//!
//! let filter = JobFilter::from_json(&json!({"minSalary": 90000, "hasEquity": true}))?;
//! let jobs = Job::find_all(&client, Some(&filter)).await?;
//! ```

pub mod access;
pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod fragment;
pub mod handlers;
pub mod ident;
pub mod models;
pub mod monitor;
pub mod partial_update;
pub mod row;
pub mod sql;
pub mod validate;
pub mod value;

pub use access::Caller;
pub use client::GenericClient;
pub use config::JoblyConfig;
pub use error::{JoblyError, JoblyResult};
pub use filter::{CompanyCriterion, CompanyFilter, JobCriterion, JobFilter};
pub use fragment::{Clause, Connective, Fragment, Operand, Operator, SqlFragment};
pub use handlers::{Handlers, Response, error_body};
pub use ident::Column;
pub use models::{
    COMPANY_FIELDS, Company, CompanyDetail, CompanyJob, CompanyUpdate, JOB_FIELDS, Job, JobUpdate,
    NewCompany, NewJob,
};
pub use monitor::{SqlLogConfig, TracingClient};
pub use partial_update::{FieldMap, UpdateData, set_clause, sql_for_partial_update};
pub use row::{FromRow, RowExt};
pub use sql::{Sql, sql};
pub use value::SqlValue;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{Pool, PoolClient, create_pool, create_pool_with_config};
