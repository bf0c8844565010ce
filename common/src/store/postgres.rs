// ConnectorStore backed by the ERP's PostgreSQL database

use super::ConnectorStore;
use crate::db::repositories::{
    ConnectionRepository, LogRepository, OrganizationRepository, WebhookRepository,
};
use crate::db::DbPool;
use crate::errors::DatabaseError;
use crate::models::{
    ConnectionConfig, DataDestination, ExecutionVariable, LogEntry, NewLogEntry, Organization,
    WebhookAccessGrant, WebhookAccessToken, WebhookDefinition,
};
use async_trait::async_trait;

pub struct PgConnectorStore {
    organizations: OrganizationRepository,
    connections: ConnectionRepository,
    webhooks: WebhookRepository,
    logs: LogRepository,
}

impl PgConnectorStore {
    pub fn new(pool: DbPool) -> Self {
        Self {
            organizations: OrganizationRepository::new(pool.clone()),
            connections: ConnectionRepository::new(pool.clone()),
            webhooks: WebhookRepository::new(pool.clone()),
            logs: LogRepository::new(pool),
        }
    }
}

#[async_trait]
impl ConnectorStore for PgConnectorStore {
    async fn organization(&self, id: &str) -> Result<Option<Organization>, DatabaseError> {
        self.organizations.find_by_id(id).await
    }

    async fn connection_for_organization(
        &self,
        organization_id: &str,
    ) -> Result<Option<ConnectionConfig>, DatabaseError> {
        self.connections.find_by_organization(organization_id).await
    }

    async fn webhook_definition(
        &self,
        id: &str,
    ) -> Result<Option<WebhookDefinition>, DatabaseError> {
        self.webhooks.find_definition(id).await
    }

    async fn webhook_definition_by_name(
        &self,
        name: &str,
    ) -> Result<Option<WebhookDefinition>, DatabaseError> {
        self.webhooks.find_definition_by_name(name).await
    }

    async fn webhook_access_grants(
        &self,
        definition_id: &str,
    ) -> Result<Vec<WebhookAccessGrant>, DatabaseError> {
        self.webhooks.find_grants(definition_id).await
    }

    async fn webhook_token(&self, id: &str) -> Result<Option<WebhookAccessToken>, DatabaseError> {
        self.webhooks.find_token(id).await
    }

    async fn data_destinations(
        &self,
        connection_id: &str,
    ) -> Result<Vec<DataDestination>, DatabaseError> {
        self.connections.find_destinations(connection_id).await
    }

    async fn execution_variables(
        &self,
        destination_id: &str,
    ) -> Result<Vec<ExecutionVariable>, DatabaseError> {
        self.connections.find_variables(destination_id).await
    }

    async fn insert_log(&self, entry: &NewLogEntry) -> Result<LogEntry, DatabaseError> {
        self.logs.create(entry).await
    }
}
