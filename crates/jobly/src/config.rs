//! Runtime configuration.
//!
//! Settings come from a TOML file or from the environment (a `.env` file is
//! read first when present):
//!
//! ```toml
//! [database]
//! url = "${DATABASE_URL}"
//! max_connections = 16
//!
//! [logging]
//! slow_query_ms = 250
//! max_sql_length = 200
//! ```
//!
//! Without an explicit URL, `JOBLY_ENV=test` selects `DATABASE_URL_TEST`
//! (default `postgresql:///jobly_test`); otherwise `DATABASE_URL` is used
//! (default `postgresql:///jobly`).

use crate::error::{JoblyError, JoblyResult};
use crate::monitor::SqlLogConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_DATABASE_URL: &str = "postgresql:///jobly";
pub const DEFAULT_TEST_DATABASE_URL: &str = "postgresql:///jobly_test";
pub const DEFAULT_MAX_CONNECTIONS: usize = 16;

/// Resolved settings.
#[derive(Debug, Clone, PartialEq)]
pub struct JoblyConfig {
    pub database_url: String,
    pub max_connections: usize,
    pub slow_query_threshold: Option<Duration>,
    pub max_sql_length: Option<usize>,
}

impl Default for JoblyConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            slow_query_threshold: None,
            max_sql_length: Some(200),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    database: DatabaseSection,
    #[serde(default)]
    logging: LoggingSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DatabaseSection {
    url: Option<String>,
    max_connections: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LoggingSection {
    slow_query_ms: Option<u64>,
    max_sql_length: Option<usize>,
}

impl JoblyConfig {
    /// Build from environment variables, reading `.env` if present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::default().database_url(database_uri(|key| std::env::var(key).ok()))
    }

    /// Load a TOML file, expanding `${VAR}` references from the environment.
    pub fn load(path: impl AsRef<Path>) -> JoblyResult<Self> {
        let path = path.as_ref();
        let _ = dotenvy::dotenv();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            JoblyError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw, |key| std::env::var(key).ok())
    }

    /// Parse TOML text, resolving `${VAR}` and the default URL through `lookup`.
    pub fn from_toml_str(
        raw: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> JoblyResult<Self> {
        let file: ConfigFile =
            toml::from_str(raw).map_err(|e| JoblyError::Config(format!("invalid config: {e}")))?;

        let database_url = match file.database.url {
            Some(url) => expand_env_vars(&url, &lookup)?,
            None => database_uri(&lookup),
        };
        if database_url.trim().is_empty() {
            return Err(JoblyError::Config("database.url must not be empty".into()));
        }

        let max_connections = file
            .database
            .max_connections
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);
        if max_connections == 0 {
            return Err(JoblyError::Config(
                "database.max_connections must be at least 1".into(),
            ));
        }

        let mut config = Self::default()
            .database_url(database_url)
            .max_connections(max_connections);
        config.slow_query_threshold = file.logging.slow_query_ms.map(Duration::from_millis);
        if let Some(len) = file.logging.max_sql_length {
            config.max_sql_length = Some(len);
        }
        Ok(config)
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    pub fn max_connections(mut self, n: usize) -> Self {
        self.max_connections = n;
        self
    }

    pub fn slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = Some(threshold);
        self
    }

    /// Statement logging settings derived from this config.
    pub fn sql_log_config(&self) -> SqlLogConfig {
        let mut log = SqlLogConfig::new();
        if let Some(threshold) = self.slow_query_threshold {
            log = log.slow_query_threshold(threshold);
        }
        match self.max_sql_length {
            Some(len) => log.max_sql_length(len),
            None => log.no_truncate(),
        }
    }
}

/// Pick the database URL for the current environment.
pub fn database_uri(lookup: impl Fn(&str) -> Option<String>) -> String {
    let (key, default) = if lookup("JOBLY_ENV").as_deref() == Some("test") {
        ("DATABASE_URL_TEST", DEFAULT_TEST_DATABASE_URL)
    } else {
        ("DATABASE_URL", DEFAULT_DATABASE_URL)
    };
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn expand_env_vars(input: &str, lookup: impl Fn(&str) -> Option<String>) -> JoblyResult<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next();

            let mut key = String::new();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '}' {
                    closed = true;
                    break;
                }
                key.push(ch);
            }

            if !closed {
                return Err(JoblyError::Config(format!(
                    "unterminated env var reference: ${{{key}}}"
                )));
            }
            if key.is_empty() {
                return Err(JoblyError::Config("invalid env var reference: ${}".into()));
            }

            let value = lookup(&key).ok_or_else(|| {
                JoblyError::Config(format!("missing env var for config expansion: {key}"))
            })?;
            out.push_str(&value);
            continue;
        }

        out.push(c);
    }

    Ok(out)
}
