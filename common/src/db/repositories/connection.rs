// BI connection, data destination and execution variable queries

use crate::db::DbPool;
use crate::errors::DatabaseError;
use crate::models::{ConnectionConfig, DataDestination, ExecutionVariable};
use tracing::instrument;

/// Repository for the ETPBIC connection tables
pub struct ConnectionRepository {
    pool: DbPool,
}

impl ConnectionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Connection configured exactly on `organization_id`
    #[instrument(skip(self))]
    pub async fn find_by_organization(
        &self,
        organization_id: &str,
    ) -> Result<Option<ConnectionConfig>, DatabaseError> {
        let connection = sqlx::query_as::<_, ConnectionConfig>(
            r#"
            SELECT etpbic_connection_id AS id,
                   ad_org_id AS organization_id,
                   repository_path,
                   smfwhe_definedwebhook_id AS webhook_id
            FROM etpbic_connection
            WHERE ad_org_id = $1
              AND isactive = 'Y'
            ORDER BY etpbic_connection_id
            LIMIT 1
            "#,
        )
        .bind(organization_id)
        .fetch_optional(self.pool.pool())
        .await?;

        Ok(connection)
    }

    #[instrument(skip(self))]
    pub async fn find_destinations(
        &self,
        connection_id: &str,
    ) -> Result<Vec<DataDestination>, DatabaseError> {
        let destinations = sqlx::query_as::<_, DataDestination>(
            r#"
            SELECT etpbic_data_dest_id AS id,
                   etpbic_connection_id AS connection_id,
                   script_path
            FROM etpbic_data_dest
            WHERE etpbic_connection_id = $1
              AND isactive = 'Y'
            ORDER BY etpbic_data_dest_id
            "#,
        )
        .bind(connection_id)
        .fetch_all(self.pool.pool())
        .await?;

        tracing::debug!(count = destinations.len(), "Found data destinations");
        Ok(destinations)
    }

    #[instrument(skip(self))]
    pub async fn find_variables(
        &self,
        destination_id: &str,
    ) -> Result<Vec<ExecutionVariable>, DatabaseError> {
        let variables = sqlx::query_as::<_, ExecutionVariable>(
            r#"
            SELECT etpbic_exec_variables_id AS id,
                   etpbic_data_dest_id AS destination_id,
                   variable,
                   value
            FROM etpbic_exec_variables
            WHERE etpbic_data_dest_id = $1
              AND isactive = 'Y'
            ORDER BY created, etpbic_exec_variables_id
            "#,
        )
        .bind(destination_id)
        .fetch_all(self.pool.pool())
        .await?;

        tracing::debug!(count = variables.len(), "Found execution variables");
        Ok(variables)
    }
}
