// BI connector pipeline: configuration lookup, credential and variable
// resolution, script launch and the script-facing log writer.

pub mod arguments;
pub mod credentials;
pub mod destination;
pub mod hierarchy;
pub mod launcher;
pub mod log_writer;
pub mod pipeline;
pub mod webhook_chain;

pub use credentials::DatabaseCredentials;
pub use hierarchy::HierarchyLookup;
pub use launcher::{
    LaunchHandle, LaunchRequest, PathResolver, ProcessLauncher, ScriptLauncher, WebContentRoot,
};
pub use log_writer::LogWriter;
pub use pipeline::{LaunchedScript, ProcessLogger, SyncOptions, SyncProcess, SyncReport};
pub use webhook_chain::{authenticate_webhook, WebhookAuth};
