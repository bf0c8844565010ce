use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// Request Context
// ============================================================================

/// Client and organization a process runs on behalf of
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub client_id: String,
    pub organization_id: String,
}

impl RequestContext {
    pub fn new(client_id: impl Into<String>, organization_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            organization_id: organization_id.into(),
        }
    }
}

/// Client id of the system tenant
pub const SYSTEM_CLIENT_ID: &str = "0";

// ============================================================================
// Organization Models
// ============================================================================

/// Node of the organization tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Organization {
    pub id: String,
    pub name: String,
    /// `None` at the root of the tree
    pub parent_id: Option<String>,
    /// Tenant owning the unit
    pub client_id: String,
}

impl Organization {
    /// Unit of the system client; see [`Organization::with_client`]
    pub fn new(id: impl Into<String>, name: impl Into<String>, parent_id: Option<&str>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: parent_id.map(str::to_string),
            client_id: SYSTEM_CLIENT_ID.to_string(),
        }
    }

    pub fn with_client(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    /// Parent id, treating a self reference as the root marker
    pub fn parent(&self) -> Option<&str> {
        self.parent_id
            .as_deref()
            .filter(|parent| !parent.is_empty() && *parent != self.id)
    }
}

// ============================================================================
// Connection Models
// ============================================================================

/// BI connection configuration scoped to one organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ConnectionConfig {
    pub id: String,
    pub organization_id: String,
    pub repository_path: String,
    pub webhook_id: Option<String>,
}

/// One export target (script) of a connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DataDestination {
    pub id: String,
    pub connection_id: String,
    pub script_path: String,
}

/// Named parameter attached to a data destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ExecutionVariable {
    pub id: String,
    pub destination_id: String,
    pub variable: String,
    pub value: Option<String>,
}

impl ExecutionVariable {
    pub fn new(
        id: impl Into<String>,
        destination_id: impl Into<String>,
        variable: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            destination_id: destination_id.into(),
            variable: variable.into(),
            value: Some(value.into()),
        }
    }
}

// ============================================================================
// Webhook Models
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct WebhookDefinition {
    pub id: String,
    pub name: String,
}

/// Grant linking a webhook definition to an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct WebhookAccessGrant {
    pub id: String,
    pub definition_id: String,
    pub token_id: Option<String>,
    pub active: bool,
    pub created: DateTime<Utc>,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct WebhookAccessToken {
    pub id: String,
    pub api_key: Option<String>,
}

impl std::fmt::Debug for WebhookAccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookAccessToken")
            .field("id", &self.id)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

// ============================================================================
// Log Models
// ============================================================================

/// Log line reported back by an export script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLogEntry {
    pub client_id: String,
    pub organization_id: String,
    pub log_type: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct LogEntry {
    pub id: String,
    pub client_id: String,
    pub organization_id: String,
    pub log_type: String,
    pub message: String,
    pub created: DateTime<Utc>,
}
