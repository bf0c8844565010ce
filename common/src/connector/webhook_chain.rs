// Webhook credential chain: definition -> access grant -> access token

use crate::errors::ConnectorError;
use crate::models::{ConnectionConfig, WebhookAccessGrant, WebhookDefinition};
use crate::store::ConnectorStore;
use tracing::instrument;

/// Credentials the export script uses to call back into the ERP
#[derive(Clone, PartialEq, Eq)]
pub struct WebhookAuth {
    pub name: String,
    pub api_key: String,
}

impl std::fmt::Debug for WebhookAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookAuth")
            .field("name", &self.name)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Pick the grant to use among those of one definition
///
/// Only active grants count. With more than one, the most recently created
/// wins (ties broken by id) and the ambiguity is logged.
pub fn select_grant(grants: &[WebhookAccessGrant]) -> Option<&WebhookAccessGrant> {
    let active: Vec<&WebhookAccessGrant> = grants.iter().filter(|g| g.active).collect();
    if active.len() > 1 {
        tracing::warn!(
            count = active.len(),
            "Several active webhook access grants, using the most recent one"
        );
    }
    active
        .into_iter()
        .max_by(|a, b| a.created.cmp(&b.created).then_with(|| b.id.cmp(&a.id)))
}

/// Follow the three hops, failing at the first missing link
#[instrument(skip(store, config), fields(connection_id = %config.id))]
pub async fn resolve_webhook_auth(
    store: &dyn ConnectorStore,
    config: &ConnectionConfig,
) -> Result<WebhookAuth, ConnectorError> {
    let no_webhook = || ConnectorError::NoWebhook(config.id.clone());

    let definition_id = config.webhook_id.as_deref().ok_or_else(no_webhook)?;
    let definition = store
        .webhook_definition(definition_id)
        .await?
        .ok_or_else(no_webhook)?;

    let grants = store.webhook_access_grants(&definition.id).await?;
    let grant = select_grant(&grants)
        .ok_or_else(|| ConnectorError::NoWebhookAccess(definition.id.clone()))?;

    let no_token = || ConnectorError::NoWebhookToken(grant.id.clone());
    let token_id = grant.token_id.as_deref().ok_or_else(no_token)?;
    let api_key = store
        .webhook_token(token_id)
        .await?
        .and_then(|token| token.api_key)
        .filter(|key| !key.is_empty())
        .ok_or_else(no_token)?;

    tracing::debug!(webhook = %definition.name, "Resolved webhook credentials");
    Ok(WebhookAuth {
        name: definition.name,
        api_key,
    })
}

/// Check the `name` and `apikey` pair a webhook caller presents
///
/// The pair is accepted when `name` is a defined webhook and one of its
/// active grants points at a token with that API key. The reason for a
/// rejection is logged but never returned to the caller.
#[instrument(skip(store, api_key))]
pub async fn authenticate_webhook(
    store: &dyn ConnectorStore,
    name: &str,
    api_key: &str,
) -> Result<WebhookDefinition, ConnectorError> {
    let rejected = |reason: &str| {
        tracing::warn!(webhook = %name, reason = reason, "Webhook credentials rejected");
        ConnectorError::Unauthorized(name.to_string())
    };

    if name.is_empty() || api_key.is_empty() {
        return Err(rejected("missing name or apikey"));
    }

    let definition = store
        .webhook_definition_by_name(name)
        .await?
        .ok_or_else(|| rejected("unknown webhook"))?;

    let grants = store.webhook_access_grants(&definition.id).await?;
    for grant in grants.iter().filter(|g| g.active) {
        let Some(token_id) = grant.token_id.as_deref() else {
            continue;
        };
        let matches = store
            .webhook_token(token_id)
            .await?
            .and_then(|token| token.api_key)
            .is_some_and(|key| key == api_key);
        if matches {
            tracing::debug!(webhook = %name, grant_id = %grant.id, "Webhook caller authenticated");
            return Ok(definition);
        }
    }

    Err(rejected("no active grant with that apikey"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{WebhookAccessToken, WebhookDefinition};
    use crate::store::InMemoryConnectorStore;
    use chrono::{Duration, TimeZone, Utc};

    fn config(webhook_id: Option<&str>) -> ConnectionConfig {
        ConnectionConfig {
            id: "CONN".to_string(),
            organization_id: "ORG".to_string(),
            repository_path: "/repo".to_string(),
            webhook_id: webhook_id.map(str::to_string),
        }
    }

    fn grant(id: &str, token: Option<&str>, active: bool, age_days: i64) -> WebhookAccessGrant {
        WebhookAccessGrant {
            id: id.to_string(),
            definition_id: "WH".to_string(),
            token_id: token.map(str::to_string),
            active,
            created: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap() - Duration::days(age_days),
        }
    }

    fn token(id: &str, key: &str) -> WebhookAccessToken {
        WebhookAccessToken {
            id: id.to_string(),
            api_key: Some(key.to_string()),
        }
    }

    fn definition() -> WebhookDefinition {
        WebhookDefinition {
            id: "WH".to_string(),
            name: "ETPBIC_FillLogWindow".to_string(),
        }
    }

    #[tokio::test]
    async fn test_full_chain_resolves() {
        let store = InMemoryConnectorStore::new()
            .with_webhook_definition(definition())
            .with_webhook_grant(grant("G1", Some("T1"), true, 0))
            .with_webhook_token(token("T1", "api-key-1"));

        let auth = resolve_webhook_auth(&store, &config(Some("WH"))).await.unwrap();
        assert_eq!(auth.name, "ETPBIC_FillLogWindow");
        assert_eq!(auth.api_key, "api-key-1");
    }

    #[tokio::test]
    async fn test_missing_reference_is_no_webhook() {
        let store = InMemoryConnectorStore::new();
        let result = resolve_webhook_auth(&store, &config(None)).await;
        assert!(matches!(result, Err(ConnectorError::NoWebhook(_))));

        let result = resolve_webhook_auth(&store, &config(Some("WH"))).await;
        assert!(matches!(result, Err(ConnectorError::NoWebhook(_))));
    }

    #[tokio::test]
    async fn test_missing_grant_is_no_access() {
        let store = InMemoryConnectorStore::new()
            .with_webhook_definition(definition())
            .with_webhook_grant(grant("G1", Some("T1"), false, 0));

        let result = resolve_webhook_auth(&store, &config(Some("WH"))).await;
        assert!(matches!(result, Err(ConnectorError::NoWebhookAccess(_))));
    }

    #[tokio::test]
    async fn test_missing_token_is_no_token() {
        let store = InMemoryConnectorStore::new()
            .with_webhook_definition(definition())
            .with_webhook_grant(grant("G1", None, true, 0));
        let result = resolve_webhook_auth(&store, &config(Some("WH"))).await;
        assert!(matches!(result, Err(ConnectorError::NoWebhookToken(id)) if id == "G1"));

        let store = InMemoryConnectorStore::new()
            .with_webhook_definition(definition())
            .with_webhook_grant(grant("G1", Some("T-missing"), true, 0));
        let result = resolve_webhook_auth(&store, &config(Some("WH"))).await;
        assert!(matches!(result, Err(ConnectorError::NoWebhookToken(_))));
    }

    #[tokio::test]
    async fn test_most_recent_active_grant_wins() {
        let store = InMemoryConnectorStore::new()
            .with_webhook_definition(definition())
            .with_webhook_grant(grant("G-old", Some("T-old"), true, 30))
            .with_webhook_grant(grant("G-new", Some("T-new"), true, 1))
            .with_webhook_grant(grant("G-newest-inactive", Some("T-x"), false, 0))
            .with_webhook_token(token("T-old", "old-key"))
            .with_webhook_token(token("T-new", "new-key"));

        let auth = resolve_webhook_auth(&store, &config(Some("WH"))).await.unwrap();
        assert_eq!(auth.api_key, "new-key");
    }

    #[test]
    fn test_equal_timestamps_prefer_smaller_id() {
        let grants = vec![
            grant("G-b", Some("T-b"), true, 5),
            grant("G-a", Some("T-a"), true, 5),
            grant("G-c", Some("T-c"), true, 5),
        ];
        assert_eq!(select_grant(&grants).unwrap().id, "G-a");

        let reversed: Vec<_> = grants.into_iter().rev().collect();
        assert_eq!(select_grant(&reversed).unwrap().id, "G-a");
    }

    #[tokio::test]
    async fn test_tied_grants_resolve_the_smaller_id_token() {
        let store = InMemoryConnectorStore::new()
            .with_webhook_definition(definition())
            .with_webhook_grant(grant("G-b", Some("T-b"), true, 2))
            .with_webhook_grant(grant("G-a", Some("T-a"), true, 2))
            .with_webhook_token(token("T-a", "key-a"))
            .with_webhook_token(token("T-b", "key-b"));

        let auth = resolve_webhook_auth(&store, &config(Some("WH"))).await.unwrap();
        assert_eq!(auth.api_key, "key-a");
    }

    fn authenticated_store() -> InMemoryConnectorStore {
        InMemoryConnectorStore::new()
            .with_webhook_definition(definition())
            .with_webhook_grant(grant("G-old", Some("T-old"), true, 30))
            .with_webhook_grant(grant("G-off", Some("T-off"), false, 0))
            .with_webhook_token(token("T-old", "old-key"))
            .with_webhook_token(token("T-off", "off-key"))
    }

    #[tokio::test]
    async fn test_authenticate_accepts_any_active_grant_key() {
        let store = authenticated_store();
        let definition = authenticate_webhook(&store, "ETPBIC_FillLogWindow", "old-key")
            .await
            .unwrap();
        assert_eq!(definition.id, "WH");
    }

    #[tokio::test]
    async fn test_authenticate_rejects_bad_credentials() {
        let store = authenticated_store();
        for (name, key) in [
            ("ETPBIC_FillLogWindow", "wrong-key"),
            ("ETPBIC_FillLogWindow", "off-key"),
            ("ETPBIC_FillLogWindow", ""),
            ("Unknown", "old-key"),
            ("", "old-key"),
        ] {
            let result = authenticate_webhook(&store, name, key).await;
            assert!(
                matches!(result, Err(ConnectorError::Unauthorized(_))),
                "{name}/{key} should be rejected"
            );
        }
    }

    #[test]
    fn test_auth_debug_redacts_key() {
        let auth = WebhookAuth {
            name: "hook".to_string(),
            api_key: "very-secret".to_string(),
        };
        assert!(!format!("{:?}", auth).contains("very-secret"));
    }
}
