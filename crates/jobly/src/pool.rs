//! Connection pool utilities

use crate::config::JoblyConfig;
use crate::error::{JoblyError, JoblyResult};
use deadpool_postgres::{Manager, ManagerConfig, RecyclingMethod};
use tokio_postgres::NoTls;

pub use deadpool_postgres::{Client as PoolClient, Pool};

/// Create a `NoTls` pool for `database_url` with the default size.
///
/// # Example
///
/// ```ignore
/// let pool = jobly::create_pool("postgresql:///jobly")?;
/// let client = pool.get().await?;
/// let jobs = Job::find_all(&client, None).await?;
/// ```
pub fn create_pool(database_url: &str) -> JoblyResult<Pool> {
    create_pool_with_size(database_url, crate::config::DEFAULT_MAX_CONNECTIONS)
}

/// Create a pool sized from `config`.
pub fn create_pool_with_config(config: &JoblyConfig) -> JoblyResult<Pool> {
    create_pool_with_size(&config.database_url, config.max_connections)
}

fn create_pool_with_size(database_url: &str, max_size: usize) -> JoblyResult<Pool> {
    let pg_config: tokio_postgres::Config = database_url
        .parse()
        .map_err(|e: tokio_postgres::Error| JoblyError::Connection(e.to_string()))?;

    let manager_config = ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    };
    let mgr = Manager::from_config(pg_config, NoTls, manager_config);
    Pool::builder(mgr)
        .max_size(max_size)
        .build()
        .map_err(|e| JoblyError::Pool(e.to_string()))
}
