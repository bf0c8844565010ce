// Read access to connector configuration and the BI log sink
// The pipeline only talks to this trait; Postgres and in-memory backends implement it.

pub mod memory;
pub mod postgres;

use crate::errors::DatabaseError;
use crate::models::{
    ConnectionConfig, DataDestination, ExecutionVariable, LogEntry, NewLogEntry, Organization,
    WebhookAccessGrant, WebhookAccessToken, WebhookDefinition,
};
use async_trait::async_trait;

pub use memory::InMemoryConnectorStore;
pub use postgres::PgConnectorStore;

/// Persistence operations used by the connector
#[async_trait]
pub trait ConnectorStore: Send + Sync {
    /// Organization by id, with its parent in the organization tree
    async fn organization(&self, id: &str) -> Result<Option<Organization>, DatabaseError>;

    /// Connection configuration attached exactly to `organization_id`
    ///
    /// When several exist, the first by id is returned.
    async fn connection_for_organization(
        &self,
        organization_id: &str,
    ) -> Result<Option<ConnectionConfig>, DatabaseError>;

    async fn webhook_definition(&self, id: &str)
        -> Result<Option<WebhookDefinition>, DatabaseError>;

    /// Webhook definition by its unique name, as sent by webhook callers
    async fn webhook_definition_by_name(
        &self,
        name: &str,
    ) -> Result<Option<WebhookDefinition>, DatabaseError>;

    /// All access grants of a webhook definition, active or not
    async fn webhook_access_grants(
        &self,
        definition_id: &str,
    ) -> Result<Vec<WebhookAccessGrant>, DatabaseError>;

    async fn webhook_token(&self, id: &str) -> Result<Option<WebhookAccessToken>, DatabaseError>;

    async fn data_destinations(
        &self,
        connection_id: &str,
    ) -> Result<Vec<DataDestination>, DatabaseError>;

    async fn execution_variables(
        &self,
        destination_id: &str,
    ) -> Result<Vec<ExecutionVariable>, DatabaseError>;

    /// Persist a BI log entry, returning the stored record
    async fn insert_log(&self, entry: &NewLogEntry) -> Result<LogEntry, DatabaseError>;
}

/// New 32 character upper-case hex record id, as used by the ERP
pub fn new_record_id() -> String {
    uuid::Uuid::new_v4().simple().to_string().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_format() {
        let id = new_record_id();
        assert_eq!(id.len(), 32);
        assert!(id
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
        assert_ne!(id, new_record_id());
    }
}
