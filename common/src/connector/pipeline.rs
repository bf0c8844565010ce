// Sync process: resolve configuration for a request context and launch every
// data destination script of the resolved connection.

use super::arguments::{build_arguments, render_arguments, SharedArguments};
use super::credentials::DatabaseCredentials;
use super::destination::resolve_destination_vars;
use super::hierarchy::HierarchyLookup;
use super::launcher::{LaunchRequest, ScriptLauncher};
use super::webhook_chain::resolve_webhook_auth;
use crate::config::{ArgumentMode, LauncherConfig};
use crate::errors::{ConnectorError, ProcessError};
use crate::messages::MessageResolver;
use crate::models::{DataDestination, RequestContext};
use crate::properties::PropertiesProvider;
use crate::store::ConnectorStore;
use crate::telemetry;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

pub const CONTEXT_URL_KEY: &str = "context.url";

/// Line-oriented log of one process run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessLogger {
    lines: Vec<String>,
}

impl ProcessLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn logln(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::info!(target: "process_log", "{}", line);
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

/// One destination script that was started
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchedScript {
    pub destination_id: String,
    pub script_path: PathBuf,
    pub pid: Option<u32>,
    /// Only set when the run waits for each script
    pub exit_code: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub connection_id: String,
    pub launched: Vec<LaunchedScript>,
    pub log: Vec<String>,
}

/// Launch behaviour of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    pub argument_mode: ArgumentMode,
    pub wait_for_exit: bool,
    pub timeout: Option<Duration>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            argument_mode: ArgumentMode::Discrete,
            wait_for_exit: false,
            timeout: None,
        }
    }
}

impl From<&LauncherConfig> for SyncOptions {
    fn from(config: &LauncherConfig) -> Self {
        Self {
            argument_mode: config.argument_mode,
            wait_for_exit: config.wait_for_exit,
            timeout: config.timeout_seconds.map(Duration::from_secs),
        }
    }
}

/// The "run process" action of the connector
pub struct SyncProcess {
    store: Arc<dyn ConnectorStore>,
    launcher: Arc<dyn ScriptLauncher>,
    messages: Arc<dyn MessageResolver>,
    properties: Arc<dyn PropertiesProvider>,
    options: SyncOptions,
}

impl SyncProcess {
    pub fn new(
        store: Arc<dyn ConnectorStore>,
        launcher: Arc<dyn ScriptLauncher>,
        messages: Arc<dyn MessageResolver>,
        properties: Arc<dyn PropertiesProvider>,
    ) -> Self {
        Self {
            store,
            launcher,
            messages,
            properties,
            options: SyncOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    /// Run one synchronous pass for `ctx`
    ///
    /// Destinations launched before a failure stay launched. Every failure
    /// is written to the process log and surfaced with its message key.
    #[instrument(skip(self), fields(client_id = %ctx.client_id, organization_id = %ctx.organization_id))]
    pub async fn run(&self, ctx: &RequestContext) -> Result<SyncReport, ProcessError> {
        let mut log = ProcessLogger::new();

        match self.execute(ctx, &mut log).await {
            Ok((connection_id, launched)) => {
                telemetry::record_sync_run("success");
                log.logln(format!("Launched {} data destination script(s)", launched.len()));
                Ok(SyncReport {
                    connection_id,
                    launched,
                    log: log.into_lines(),
                })
            }
            Err(err) => {
                telemetry::record_sync_run("failure");
                if err.is_internal() {
                    tracing::error!(error = %err, "Sync process failed unexpectedly");
                } else {
                    tracing::warn!(error = %err, key = err.message_key(), "Sync process failed");
                }
                let process_error = ProcessError::resolve(&err, self.messages.as_ref()).await;
                log.logln(process_error.message.clone());
                Err(process_error)
            }
        }
    }

    async fn execute(
        &self,
        ctx: &RequestContext,
        log: &mut ProcessLogger,
    ) -> Result<(String, Vec<LaunchedScript>), ConnectorError> {
        let properties = self.properties.load().await?;

        let organization = self
            .store
            .organization(&ctx.organization_id)
            .await?
            .ok_or_else(|| ConnectorError::ConfigNotFound {
                organization_id: ctx.organization_id.clone(),
            })?;

        let lookup = HierarchyLookup::new(self.store.as_ref());
        let max_depth = lookup.ancestor_count(&organization).await?;
        let config = lookup.find_config(&organization, max_depth).await?;
        log.logln(format!("Using connection configuration {}", config.id));

        let webhook = resolve_webhook_auth(self.store.as_ref(), &config).await?;

        let base_url = properties
            .get(CONTEXT_URL_KEY)
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConnectorError::ContextUrlNotFound)?
            .to_string();

        let credentials = DatabaseCredentials::resolve(&properties)?;

        let destinations = self.store.data_destinations(&config.id).await?;
        if destinations.is_empty() {
            return Err(ConnectorError::NoDataDestinations(config.id.clone()));
        }

        let shared = SharedArguments::new(&credentials, &base_url, ctx, &organization, &webhook);

        let mut launched = Vec::with_capacity(destinations.len());
        for destination in &destinations {
            let script = self
                .launch_destination(&config.repository_path, destination, &shared, &credentials, log)
                .await?;
            launched.push(script);
        }

        Ok((config.id, launched))
    }

    #[instrument(skip_all, fields(destination_id = %destination.id))]
    async fn launch_destination(
        &self,
        repository_path: &str,
        destination: &DataDestination,
        shared: &SharedArguments,
        credentials: &DatabaseCredentials,
        log: &mut ProcessLogger,
    ) -> Result<LaunchedScript, ConnectorError> {
        let variables = self.store.execution_variables(&destination.id).await?;
        let destination_args = resolve_destination_vars(&destination.id, &variables, credentials)?;
        if destination_args.used_global_credentials {
            tracing::debug!("Destination uses the global database credentials");
            log.logln(format!(
                "bbdd_user or bbdd_password variables not found for destination {}, \
                 using the global database credentials",
                destination.id
            ));
        }

        let arguments = render_arguments(
            build_arguments(shared, &destination_args),
            self.options.argument_mode,
        )?;

        let request = LaunchRequest {
            repository_path: repository_path.to_string(),
            script_name: destination.script_path.clone(),
            arguments,
        };

        let handle = self.launcher.launch(&request).await.inspect_err(|err| {
            let reason = match err {
                ConnectorError::ScriptNotFound { .. } => "not_found",
                _ => "spawn",
            };
            telemetry::record_script_launch_failure(reason);
        })?;
        telemetry::record_script_launched(&destination.script_path);
        log.logln(format!("Executing {}", handle.script_path().display()));

        let script_path = handle.script_path().to_path_buf();
        let pid = handle.pid();
        let exit_code = if self.options.wait_for_exit {
            let exit = handle.wait(self.options.timeout).await?;
            log.logln(format!(
                "{} finished with exit code {}",
                script_path.display(),
                exit.code.map_or_else(|| "none".to_string(), |c| c.to_string())
            ));
            exit.code
        } else {
            None
        };

        Ok(LaunchedScript {
            destination_id: destination.id.clone(),
            script_path,
            pid,
            exit_code,
        })
    }
}
