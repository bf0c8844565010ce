// BI log table writes

use crate::db::DbPool;
use crate::errors::DatabaseError;
use crate::models::{LogEntry, NewLogEntry};
use crate::store::new_record_id;
use tracing::instrument;

pub struct LogRepository {
    pool: DbPool,
}

impl LogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a log entry authored by the system user
    #[instrument(skip(self, entry), fields(organization_id = %entry.organization_id, log_type = %entry.log_type))]
    pub async fn create(&self, entry: &NewLogEntry) -> Result<LogEntry, DatabaseError> {
        let stored = sqlx::query_as::<_, LogEntry>(
            r#"
            INSERT INTO etpbic_log (
                etpbic_log_id, ad_client_id, ad_org_id, isactive,
                created, createdby, updated, updatedby,
                logtype, message
            )
            VALUES ($1, $2, $3, 'Y', NOW(), '100', NOW(), '100', $4, $5)
            RETURNING etpbic_log_id AS id,
                      ad_client_id AS client_id,
                      ad_org_id AS organization_id,
                      logtype AS log_type,
                      message,
                      created AT TIME ZONE 'UTC' AS created
            "#,
        )
        .bind(new_record_id())
        .bind(&entry.client_id)
        .bind(&entry.organization_id)
        .bind(&entry.log_type)
        .bind(&entry.message)
        .fetch_one(self.pool.pool())
        .await?;

        tracing::info!(log_id = %stored.id, "Created BI log entry");
        Ok(stored)
    }
}
