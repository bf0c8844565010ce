// ERP message catalogue (ad_message) lookups

use crate::db::DbPool;
use crate::errors::DatabaseError;
use crate::messages::{DefaultMessages, MessageResolver};
use async_trait::async_trait;
use tracing::instrument;

pub struct MessageRepository {
    pool: DbPool,
}

impl MessageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn find_text(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let text = sqlx::query_scalar::<_, String>(
            r#"
            SELECT msgtext
            FROM ad_message
            WHERE value = $1
            LIMIT 1
            "#,
        )
        .bind(key)
        .fetch_optional(self.pool.pool())
        .await?;

        Ok(text)
    }
}

/// Resolves keys from ad_message, falling back to the built-in texts
pub struct PgMessageResolver {
    repository: MessageRepository,
}

impl PgMessageResolver {
    pub fn new(pool: DbPool) -> Self {
        Self {
            repository: MessageRepository::new(pool),
        }
    }
}

#[async_trait]
impl MessageResolver for PgMessageResolver {
    async fn resolve(&self, key: &str) -> String {
        match self.repository.find_text(key).await {
            Ok(Some(text)) if !text.trim().is_empty() => text,
            Ok(_) => DefaultMessages.resolve(key).await,
            Err(e) => {
                tracing::warn!(error = %e, key = key, "Message lookup failed, using built-in text");
                DefaultMessages.resolve(key).await
            }
        }
    }
}
