// BI log writer, called back by the export scripts through the log webhook

use crate::errors::ConnectorError;
use crate::models::{LogEntry, NewLogEntry};
use crate::store::ConnectorStore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

pub const PARAM_ORGANIZATION: &str = "organization";
pub const PARAM_CLIENT: &str = "client";
pub const PARAM_LOG_TYPE: &str = "logtype";
pub const PARAM_DESCRIPTION: &str = "description";

pub struct LogWriter {
    store: Arc<dyn ConnectorStore>,
}

impl LogWriter {
    pub fn new(store: Arc<dyn ConnectorStore>) -> Self {
        Self { store }
    }

    /// Persist one log line sent by a script
    ///
    /// `organization` must name an existing organization and `logtype` must
    /// be present. The client defaults to the tenant owning the organization
    /// and the description to an empty message.
    #[instrument(skip(self, params))]
    pub async fn write(&self, params: &HashMap<String, String>) -> Result<LogEntry, ConnectorError> {
        let param = |name: &str| {
            params
                .get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        };

        let organization_id = param(PARAM_ORGANIZATION)
            .ok_or_else(|| ConnectorError::LogCreationError("organization is required".to_string()))?;
        let log_type = param(PARAM_LOG_TYPE)
            .ok_or_else(|| ConnectorError::LogCreationError("logtype is required".to_string()))?;

        let organization = self
            .store
            .organization(organization_id)
            .await
            .map_err(|e| ConnectorError::LogCreationError(e.to_string()))?
            .ok_or_else(|| {
                ConnectorError::LogCreationError(format!(
                    "organization {} not found",
                    organization_id
                ))
            })?;

        let entry = NewLogEntry {
            client_id: param(PARAM_CLIENT)
                .map(str::to_string)
                .unwrap_or(organization.client_id),
            organization_id: organization.id,
            log_type: log_type.to_string(),
            message: params.get(PARAM_DESCRIPTION).cloned().unwrap_or_default(),
        };

        let stored = self.store.insert_log(&entry).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to insert BI log entry");
            ConnectorError::LogCreationError(e.to_string())
        })?;

        tracing::debug!(log_id = %stored.id, log_type = %stored.log_type, "BI log entry created");
        Ok(stored)
    }
}
