// One-shot sync runner, the scheduled-job entry point of the connector
//
// Usage: bi-sync <client-id> <organization-id>

use anyhow::Result;
use common::config::Settings;
use common::connector::{ProcessLauncher, SyncOptions, SyncProcess, WebContentRoot};
use common::db::pool::DbPool;
use common::db::repositories::PgMessageResolver;
use common::models::RequestContext;
use common::properties::PropertiesFile;
use common::store::PgConnectorStore;
use common::telemetry;
use std::sync::Arc;
use tracing::{error, info};

fn parse_context(mut args: impl Iterator<Item = String>) -> Result<RequestContext> {
    match (args.next(), args.next(), args.next()) {
        (Some(client_id), Some(organization_id), None) => {
            Ok(RequestContext::new(client_id, organization_id))
        }
        _ => Err(anyhow::anyhow!(
            "usage: bi-sync <client-id> <organization-id>"
        )),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let ctx = parse_context(std::env::args().skip(1))?;

    // Load configuration
    let settings = Settings::load().map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
    settings
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    telemetry::init_logging(
        &settings.observability.log_level,
        settings.observability.tracing_endpoint.as_deref(),
    )?;

    info!(
        client_id = %ctx.client_id,
        organization_id = %ctx.organization_id,
        "Starting BI sync"
    );

    // Initialize database pool
    let db_pool = DbPool::new(&settings.database).await.map_err(|e| {
        error!(error = %e, "Failed to initialize database pool");
        anyhow::anyhow!("Database initialization error: {}", e)
    })?;

    let launcher = ProcessLauncher::new(
        settings.launcher.interpreter.clone(),
        Arc::new(WebContentRoot::new(settings.launcher.web_content_root.clone())),
    )
    .with_capture_output(settings.launcher.capture_output);

    let process = SyncProcess::new(
        Arc::new(PgConnectorStore::new(db_pool.clone())),
        Arc::new(launcher),
        Arc::new(PgMessageResolver::new(db_pool.clone())),
        Arc::new(PropertiesFile::new(settings.properties.path.clone())),
    )
    .with_options(SyncOptions::from(&settings.launcher));

    let outcome = process.run(&ctx).await;
    db_pool.close().await;
    telemetry::shutdown_tracer();

    match outcome {
        Ok(report) => {
            for line in &report.log {
                println!("{}", line);
            }
            info!(
                connection_id = %report.connection_id,
                launched = report.launched.len(),
                "BI sync finished"
            );
            Ok(())
        }
        Err(err) => {
            error!(key = %err.key, "BI sync failed");
            Err(anyhow::anyhow!("{}: {}", err.key, err.message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> impl Iterator<Item = String> {
        values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn test_parse_context() {
        let ctx = parse_context(args(&["CLIENT", "ORG"])).unwrap();
        assert_eq!(ctx.client_id, "CLIENT");
        assert_eq!(ctx.organization_id, "ORG");
    }

    #[test]
    fn test_parse_context_rejects_wrong_arity() {
        assert!(parse_context(args(&["CLIENT"])).is_err());
        assert!(parse_context(args(&["A", "B", "C"])).is_err());
    }
}
