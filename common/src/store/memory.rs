// In-memory ConnectorStore used by tests and local demos

use super::{new_record_id, ConnectorStore};
use crate::errors::DatabaseError;
use crate::models::{
    ConnectionConfig, DataDestination, ExecutionVariable, LogEntry, NewLogEntry, Organization,
    WebhookAccessGrant, WebhookAccessToken, WebhookDefinition,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock};

#[derive(Debug, Default)]
struct Records {
    organizations: BTreeMap<String, Organization>,
    connections: BTreeMap<String, ConnectionConfig>,
    definitions: BTreeMap<String, WebhookDefinition>,
    grants: BTreeMap<String, WebhookAccessGrant>,
    tokens: BTreeMap<String, WebhookAccessToken>,
    destinations: BTreeMap<String, DataDestination>,
    variables: Vec<ExecutionVariable>,
}

/// Connector records held in process memory
///
/// Records are keyed by id, so iteration order (and therefore "first match")
/// is by id. Execution variables keep insertion order.
#[derive(Debug, Default)]
pub struct InMemoryConnectorStore {
    records: RwLock<Records>,
    logs: Mutex<Vec<LogEntry>>,
    fail_log_writes: AtomicBool,
}

impl InMemoryConnectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_organization(self, organization: Organization) -> Self {
        self.write(|r| {
            r.organizations.insert(organization.id.clone(), organization);
        });
        self
    }

    pub fn with_connection(self, connection: ConnectionConfig) -> Self {
        self.write(|r| {
            r.connections.insert(connection.id.clone(), connection);
        });
        self
    }

    pub fn with_webhook_definition(self, definition: WebhookDefinition) -> Self {
        self.write(|r| {
            r.definitions.insert(definition.id.clone(), definition);
        });
        self
    }

    pub fn with_webhook_grant(self, grant: WebhookAccessGrant) -> Self {
        self.write(|r| {
            r.grants.insert(grant.id.clone(), grant);
        });
        self
    }

    pub fn with_webhook_token(self, token: WebhookAccessToken) -> Self {
        self.write(|r| {
            r.tokens.insert(token.id.clone(), token);
        });
        self
    }

    pub fn with_destination(self, destination: DataDestination) -> Self {
        self.write(|r| {
            r.destinations.insert(destination.id.clone(), destination);
        });
        self
    }

    pub fn with_variable(self, variable: ExecutionVariable) -> Self {
        self.write(|r| r.variables.push(variable));
        self
    }

    /// Make every subsequent `insert_log` fail
    pub fn fail_log_writes(&self, fail: bool) {
        self.fail_log_writes.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of the log entries written so far
    pub fn logs(&self) -> Vec<LogEntry> {
        self.logs
            .lock()
            .map(|logs| logs.clone())
            .unwrap_or_default()
    }

    fn write(&self, apply: impl FnOnce(&mut Records)) {
        let mut guard = match self.records.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        apply(&mut guard);
    }

    fn read<T>(&self, query: impl FnOnce(&Records) -> T) -> Result<T, DatabaseError> {
        let guard = self
            .records
            .read()
            .map_err(|e| DatabaseError::QueryFailed(format!("store lock poisoned: {}", e)))?;
        Ok(query(&guard))
    }
}

#[async_trait]
impl ConnectorStore for InMemoryConnectorStore {
    async fn organization(&self, id: &str) -> Result<Option<Organization>, DatabaseError> {
        self.read(|r| r.organizations.get(id).cloned())
    }

    async fn connection_for_organization(
        &self,
        organization_id: &str,
    ) -> Result<Option<ConnectionConfig>, DatabaseError> {
        self.read(|r| {
            r.connections
                .values()
                .find(|c| c.organization_id == organization_id)
                .cloned()
        })
    }

    async fn webhook_definition(
        &self,
        id: &str,
    ) -> Result<Option<WebhookDefinition>, DatabaseError> {
        self.read(|r| r.definitions.get(id).cloned())
    }

    async fn webhook_definition_by_name(
        &self,
        name: &str,
    ) -> Result<Option<WebhookDefinition>, DatabaseError> {
        self.read(|r| r.definitions.values().find(|d| d.name == name).cloned())
    }

    async fn webhook_access_grants(
        &self,
        definition_id: &str,
    ) -> Result<Vec<WebhookAccessGrant>, DatabaseError> {
        self.read(|r| {
            r.grants
                .values()
                .filter(|g| g.definition_id == definition_id)
                .cloned()
                .collect()
        })
    }

    async fn webhook_token(&self, id: &str) -> Result<Option<WebhookAccessToken>, DatabaseError> {
        self.read(|r| r.tokens.get(id).cloned())
    }

    async fn data_destinations(
        &self,
        connection_id: &str,
    ) -> Result<Vec<DataDestination>, DatabaseError> {
        self.read(|r| {
            r.destinations
                .values()
                .filter(|d| d.connection_id == connection_id)
                .cloned()
                .collect()
        })
    }

    async fn execution_variables(
        &self,
        destination_id: &str,
    ) -> Result<Vec<ExecutionVariable>, DatabaseError> {
        self.read(|r| {
            r.variables
                .iter()
                .filter(|v| v.destination_id == destination_id)
                .cloned()
                .collect()
        })
    }

    async fn insert_log(&self, entry: &NewLogEntry) -> Result<LogEntry, DatabaseError> {
        if self.fail_log_writes.load(Ordering::SeqCst) {
            return Err(DatabaseError::QueryFailed(
                "log writes disabled".to_string(),
            ));
        }

        let stored = LogEntry {
            id: new_record_id(),
            client_id: entry.client_id.clone(),
            organization_id: entry.organization_id.clone(),
            log_type: entry.log_type.clone(),
            message: entry.message.clone(),
            created: Utc::now(),
        };

        self.logs
            .lock()
            .map_err(|e| DatabaseError::QueryFailed(format!("log lock poisoned: {}", e)))?
            .push(stored.clone());
        Ok(stored)
    }
}
