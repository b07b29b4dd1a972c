use crate::cli::{CompaniesCommand, GlobalArgs, JobsCommand};
use jobly::{Handlers, JoblyConfig, PoolClient, Response, TracingClient};
use std::path::Path;

const DEFAULT_CONFIG: &str = "jobly.toml";

fn load_config(global: &GlobalArgs) -> anyhow::Result<JoblyConfig> {
    let mut config = match &global.config {
        Some(path) => JoblyConfig::load(path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => JoblyConfig::load(DEFAULT_CONFIG)?,
        None => JoblyConfig::from_env(),
    };
    if let Some(url) = &global.database {
        config = config.database_url(url.as_str());
    }
    Ok(config)
}

async fn with_handlers<F, Fut>(global: &GlobalArgs, f: F) -> anyhow::Result<()>
where
    F: FnOnce(Handlers<TracingClient<PoolClient>>) -> Fut,
    Fut: Future<Output = Response>,
{
    let config = load_config(global)?;
    let pool = jobly::create_pool_with_config(&config)?;
    let client = pool.get().await.map_err(jobly::JoblyError::from)?;
    tracing::debug!(max_connections = config.max_connections, "connected");

    let client = TracingClient::new(client).with_config(config.sql_log_config());
    print_response(f(Handlers::new(client)).await)
}

fn print_response(response: Response) -> anyhow::Result<()> {
    if !response.is_success() {
        let message = response.body["error"]["message"]
            .as_str()
            .unwrap_or("request failed");
        anyhow::bail!("{message} (status {})", response.status);
    }
    println!("{}", serde_json::to_string_pretty(&response.body)?);
    Ok(())
}

pub async fn companies(global: &GlobalArgs, cmd: CompaniesCommand) -> anyhow::Result<()> {
    with_handlers(global, |h| async move {
        match cmd {
            CompaniesCommand::List(filters) => h.list_companies(&filters).await,
            CompaniesCommand::Get(handle) => h.get_company(&handle).await,
        }
    })
    .await
}

pub async fn jobs(global: &GlobalArgs, cmd: JobsCommand) -> anyhow::Result<()> {
    with_handlers(global, |h| async move {
        match cmd {
            JobsCommand::List(filters) => h.list_jobs(&filters).await,
            JobsCommand::Get(title) => h.get_job(&title).await,
        }
    })
    .await
}
