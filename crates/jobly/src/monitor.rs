//! Statement logging via `tracing`.
//!
//! [`TracingClient`] wraps any [`GenericClient`] and emits one event per
//! statement on the `jobly.sql` target: the (possibly truncated) SQL, the
//! parameter count, rows returned or affected, and the elapsed time.
//! Statements slower than the configured threshold are logged at `WARN`;
//! failures are logged at `ERROR` with the error.
//!
//! # Example
//!
//! ```rust,ignore
//! use jobly::monitor::{SqlLogConfig, TracingClient};
//! use std::time::Duration;
//!
//! let client = TracingClient::new(pool.get().await?)
//!     .with_config(SqlLogConfig::new().slow_query_threshold(Duration::from_millis(250)));
//! let companies = Company::find_all(&client, None).await?;
//! ```

use crate::client::GenericClient;
use crate::error::JoblyResult;
use std::time::{Duration, Instant};
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;
use tracing::Level;

/// Settings for [`TracingClient`].
#[derive(Debug, Clone)]
pub struct SqlLogConfig {
    /// Level for ordinary statements.
    pub level: Level,
    /// Statements slower than this are logged at `WARN`.
    pub slow_query_threshold: Option<Duration>,
    /// Truncate long SQL strings (in bytes, on a char boundary). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for SqlLogConfig {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            slow_query_threshold: None,
            max_sql_length: Some(200),
        }
    }
}

impl SqlLogConfig {
    /// Create a new config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set the slow query threshold.
    pub fn slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = Some(threshold);
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    /// Level for a statement that took `elapsed`: `ERROR` on failure, `WARN`
    /// past the slow threshold, the configured level otherwise.
    pub fn event_level(&self, elapsed: Duration, failed: bool) -> Level {
        if failed {
            Level::ERROR
        } else if self.is_slow(elapsed) {
            Level::WARN
        } else {
            self.level
        }
    }

    fn is_slow(&self, elapsed: Duration) -> bool {
        self.slow_query_threshold
            .is_some_and(|threshold| elapsed > threshold)
    }

    fn display_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }
}

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

/// A client wrapper that logs every statement it runs.
pub struct TracingClient<C> {
    client: C,
    config: SqlLogConfig,
}

impl<C: GenericClient> TracingClient<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            config: SqlLogConfig::default(),
        }
    }

    /// Set the logging configuration.
    pub fn with_config(mut self, config: SqlLogConfig) -> Self {
        self.config = config;
        self
    }

    fn report<T>(
        &self,
        tag: Option<&str>,
        sql: &str,
        param_count: usize,
        elapsed: Duration,
        result: &JoblyResult<T>,
        rows: impl FnOnce(&T) -> u64,
    ) {
        /// Dispatch a tracing event at a runtime-determined level.
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let tag = tag.unwrap_or("-");
        let sql = self.config.display_sql(sql);
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;

        match result {
            Ok(value) => {
                let slow = self.config.is_slow(elapsed);
                emit_at_level!(
                    self.config.event_level(elapsed, false),
                    target: "jobly.sql",
                    tag,
                    param_count,
                    rows = rows(value),
                    elapsed_ms,
                    slow,
                    sql = %sql,
                );
            }
            Err(err) => {
                tracing::error!(
                    target: "jobly.sql",
                    tag,
                    param_count,
                    elapsed_ms,
                    error = %err,
                    sql = %sql,
                    "statement failed"
                );
            }
        }
    }

    async fn run_query(
        &self,
        tag: Option<&str>,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> JoblyResult<Vec<Row>> {
        let start = Instant::now();
        let result = self.client.query(sql, params).await;
        self.report(tag, sql, params.len(), start.elapsed(), &result, |rows| {
            rows.len() as u64
        });
        result
    }
}

impl<C: GenericClient> GenericClient for TracingClient<C> {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> JoblyResult<Vec<Row>> {
        self.run_query(None, sql, params).await
    }

    async fn query_tagged(
        &self,
        tag: &str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> JoblyResult<Vec<Row>> {
        self.run_query(Some(tag), sql, params).await
    }

    async fn batch_execute(&self, sql: &str) -> JoblyResult<()> {
        let start = Instant::now();
        let result = self.client.batch_execute(sql).await;
        self.report(None, sql, 0, start.elapsed(), &result, |_| 0);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundary() {
        let sql = "SELECT 'ééé'";
        // byte 11 falls inside the second 'é'
        assert_eq!(truncate_sql_bytes(sql, 11), "SELECT 'é");
        assert_eq!(truncate_sql_bytes(sql, 100), sql);
    }

    #[test]
    fn display_sql_appends_ellipsis_only_when_truncated() {
        let cfg = SqlLogConfig::new().max_sql_length(6);
        assert_eq!(cfg.display_sql("SELECT 1"), "SELECT...");
        assert_eq!(cfg.display_sql("SELECT"), "SELECT");
        assert_eq!(
            SqlLogConfig::new().no_truncate().display_sql("SELECT 1"),
            "SELECT 1"
        );
    }

    #[test]
    fn builder_sets_threshold_and_level() {
        let cfg = SqlLogConfig::new()
            .level(Level::INFO)
            .slow_query_threshold(Duration::from_millis(250));
        assert_eq!(cfg.level, Level::INFO);
        assert_eq!(cfg.slow_query_threshold, Some(Duration::from_millis(250)));
    }

    #[test]
    fn failures_log_at_error_even_when_slow() {
        let cfg = SqlLogConfig::new().slow_query_threshold(Duration::from_millis(100));
        let fast = Duration::from_millis(5);
        let slow = Duration::from_millis(500);

        assert_eq!(cfg.event_level(fast, false), Level::DEBUG);
        assert_eq!(cfg.event_level(slow, false), Level::WARN);
        assert_eq!(cfg.event_level(fast, true), Level::ERROR);
        assert_eq!(cfg.event_level(slow, true), Level::ERROR);
        assert_eq!(SqlLogConfig::new().event_level(slow, false), Level::DEBUG);
    }
}
