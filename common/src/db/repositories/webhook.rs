use crate::db::DbPool;
use crate::errors::DatabaseError;
use crate::models::{WebhookAccessGrant, WebhookAccessToken, WebhookDefinition};

/// WebhookRepository reads the defined-webhook, access and token tables
pub struct WebhookRepository {
    pool: DbPool,
}

impl WebhookRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_definition(
        &self,
        id: &str,
    ) -> Result<Option<WebhookDefinition>, DatabaseError> {
        let definition = sqlx::query_as::<_, WebhookDefinition>(
            r#"
            SELECT smfwhe_definedwebhook_id AS id, name
            FROM smfwhe_definedwebhook
            WHERE smfwhe_definedwebhook_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.pool())
        .await?;

        Ok(definition)
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_definition_by_name(
        &self,
        name: &str,
    ) -> Result<Option<WebhookDefinition>, DatabaseError> {
        let definition = sqlx::query_as::<_, WebhookDefinition>(
            r#"
            SELECT smfwhe_definedwebhook_id AS id, name
            FROM smfwhe_definedwebhook
            WHERE name = $1
            LIMIT 1
            "#,
        )
        .bind(name)
        .fetch_optional(self.pool.pool())
        .await?;

        Ok(definition)
    }

    /// Access grants of a definition, newest first
    #[tracing::instrument(skip(self))]
    pub async fn find_grants(
        &self,
        definition_id: &str,
    ) -> Result<Vec<WebhookAccessGrant>, DatabaseError> {
        let grants = sqlx::query_as::<_, WebhookAccessGrant>(
            r#"
            SELECT smfwhe_definedwebhook_acc_id AS id,
                   smfwhe_definedwebhook_id AS definition_id,
                   smfwhe_definedwebhook_token_id AS token_id,
                   (isactive = 'Y') AS active,
                   created AT TIME ZONE 'UTC' AS created
            FROM smfwhe_definedwebhook_acc
            WHERE smfwhe_definedwebhook_id = $1
            ORDER BY created DESC
            "#,
        )
        .bind(definition_id)
        .fetch_all(self.pool.pool())
        .await?;

        tracing::debug!(count = grants.len(), "Found webhook access grants");
        Ok(grants)
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_token(&self, id: &str) -> Result<Option<WebhookAccessToken>, DatabaseError> {
        let token = sqlx::query_as::<_, WebhookAccessToken>(
            r#"
            SELECT smfwhe_definedwebhook_token_id AS id, apikey AS api_key
            FROM smfwhe_definedwebhook_token
            WHERE smfwhe_definedwebhook_token_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.pool())
        .await?;

        Ok(token)
    }
}
