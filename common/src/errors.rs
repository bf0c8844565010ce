// Error taxonomy for the BI connector
// Every domain failure carries the ERP message key used to render it for end users.

use crate::messages::MessageResolver;
use std::path::PathBuf;
use thiserror::Error;

/// Message key used when an unexpected fault reaches the process boundary
pub const INTERNAL_ERROR_KEY: &str = "ETPBIC_InternalError";

/// Message key for rejected webhook credentials
pub const UNAUTHORIZED_KEY: &str = "ETPBIC_WebhookUnauthorized";

/// Database-specific errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Database health check failed: {0}")]
    HealthCheckFailed(String),

    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Duplicate key violation: {0}")]
    DuplicateKey(String),

    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),
}

/// Connector errors
///
/// Variants map one-to-one onto the user-facing message keys. `Database` and
/// `Internal` are the only kinds that are not expected business failures.
#[derive(Error, Debug)]
pub enum ConnectorError {
    #[error("No connection configuration found for organization {organization_id} or any ancestor")]
    ConfigNotFound { organization_id: String },

    #[error("Webhook definition not found for connection {0}")]
    NoWebhook(String),

    #[error("No access grant found for webhook {0}")]
    NoWebhookAccess(String),

    #[error("Webhook access grant {0} has no token")]
    NoWebhookToken(String),

    #[error("Application property 'context.url' is not defined")]
    ContextUrlNotFound,

    #[error("Database URL '{url}' is not shaped like scheme://host:port")]
    InvalidDatabaseUrl { url: String },

    #[error("No data destinations configured for connection {0}")]
    NoDataDestinations(String),

    #[error("Data destination {destination_id} is missing required variables: {}", missing.join(", "))]
    MissingRequiredVariables {
        destination_id: String,
        missing: Vec<&'static str>,
    },

    #[error("Script not found: {}", path.display())]
    ScriptNotFound { path: PathBuf },

    #[error("Failed to launch script {}: {reason}", path.display())]
    ScriptLaunchFailed { path: PathBuf, reason: String },

    #[error("Script {} did not finish within {seconds} seconds", path.display())]
    ScriptTimedOut { path: PathBuf, seconds: u64 },

    #[error("Argument at position {position} contains the ',' separator")]
    ArgumentContainsDelimiter { position: usize },

    #[error("Query must start with SELECT")]
    InvalidQuerySyntax,

    #[error("Delimiter '{value}' must be exactly one character")]
    InvalidDelimiter { value: String },

    #[error("Etendo base queries cannot be deleted")]
    CantDeleteBaseQuery,

    #[error("Failed to create log entry: {0}")]
    LogCreationError(String),

    #[error("Webhook credentials rejected: {0}")]
    Unauthorized(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConnectorError {
    /// ERP message key identifying this failure
    pub fn message_key(&self) -> &'static str {
        match self {
            ConnectorError::ConfigNotFound { .. } => "ETPBIC_NullConfigError",
            ConnectorError::NoWebhook(_) => "ETPBIC_NoWebhookError",
            ConnectorError::NoWebhookAccess(_) => "ETPBIC_NoWebhookAccessError",
            ConnectorError::NoWebhookToken(_) => "ETPBIC_NoWebhookTokenError",
            ConnectorError::ContextUrlNotFound => "ETPBIC_ContextUrlNotFound",
            ConnectorError::InvalidDatabaseUrl { .. } => "ETPBIC_InvalidDatabaseUrl",
            ConnectorError::NoDataDestinations(_) => "ETPBIC_NoDataDestError",
            ConnectorError::MissingRequiredVariables { .. } => "ETPBIC_VariablesNotFoundError",
            ConnectorError::ScriptNotFound { .. } => "ETPBIC_ScriptNotFound",
            ConnectorError::ScriptLaunchFailed { .. }
            | ConnectorError::ScriptTimedOut { .. }
            | ConnectorError::ArgumentContainsDelimiter { .. } => "ETPBIC_ExecutePythonError",
            ConnectorError::InvalidQuerySyntax => "ETPBIC_InvalidQuerySyntax",
            ConnectorError::InvalidDelimiter { .. } => "ETPBIC_InvalidDelimiter",
            ConnectorError::CantDeleteBaseQuery => "ETPBIC_CantDeleteEtendoQuery",
            ConnectorError::LogCreationError(_) => "ETPBIC_LogCreationError",
            ConnectorError::Unauthorized(_) => UNAUTHORIZED_KEY,
            ConnectorError::Database(_) | ConnectorError::Internal(_) => INTERNAL_ERROR_KEY,
        }
    }

    /// True for faults that are not part of the expected failure taxonomy
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            ConnectorError::Database(_) | ConnectorError::Internal(_)
        )
    }

    /// True for failures raised by the administrative input validators
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ConnectorError::InvalidQuerySyntax
                | ConnectorError::InvalidDelimiter { .. }
                | ConnectorError::CantDeleteBaseQuery
        )
    }
}

/// The single user-facing failure kind
///
/// Callers only see the message key and its resolved text. The distinct
/// `ConnectorError` kinds stay available internally until this boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ProcessError {
    pub key: String,
    pub message: String,
}

impl ProcessError {
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Render a connector error through the message catalogue
    ///
    /// Internal faults keep their own text since the catalogue has nothing
    /// meaningful to say about them.
    pub async fn resolve(err: &ConnectorError, messages: &dyn MessageResolver) -> Self {
        let key = err.message_key();
        let message = if err.is_internal() {
            err.to_string()
        } else {
            messages.resolve(key).await
        };
        Self::new(key, message)
    }
}

// Implement From for common external errors
impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if let Some(code) = db_err.code() {
                    match code.as_ref() {
                        "23505" => DatabaseError::DuplicateKey(db_err.message().to_string()),
                        "23503" => DatabaseError::ForeignKeyViolation(db_err.message().to_string()),
                        _ => DatabaseError::QueryFailed(db_err.message().to_string()),
                    }
                } else {
                    DatabaseError::QueryFailed(db_err.message().to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<std::io::Error> for ConnectorError {
    fn from(err: std::io::Error) -> Self {
        ConnectorError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::DefaultMessages;

    #[test]
    fn test_message_keys_match_catalogue() {
        assert_eq!(
            ConnectorError::ConfigNotFound {
                organization_id: "A".to_string()
            }
            .message_key(),
            "ETPBIC_NullConfigError"
        );
        assert_eq!(
            ConnectorError::NoWebhookAccess("W".to_string()).message_key(),
            "ETPBIC_NoWebhookAccessError"
        );
        assert_eq!(
            ConnectorError::Unauthorized("bad key".to_string()).message_key(),
            UNAUTHORIZED_KEY
        );
        assert_eq!(
            ConnectorError::CantDeleteBaseQuery.message_key(),
            "ETPBIC_CantDeleteEtendoQuery"
        );
        assert_eq!(
            ConnectorError::ScriptTimedOut {
                path: PathBuf::from("/x.py"),
                seconds: 5
            }
            .message_key(),
            "ETPBIC_ExecutePythonError"
        );
    }

    #[test]
    fn test_missing_variables_display_lists_names() {
        let err = ConnectorError::MissingRequiredVariables {
            destination_id: "D1".to_string(),
            missing: vec!["client", "user"],
        };
        assert_eq!(
            err.to_string(),
            "Data destination D1 is missing required variables: client, user"
        );
    }

    #[test]
    fn test_internal_classification() {
        assert!(ConnectorError::Internal("boom".to_string()).is_internal());
        assert!(ConnectorError::Database(DatabaseError::QueryFailed("x".to_string())).is_internal());
        assert!(!ConnectorError::ContextUrlNotFound.is_internal());
        assert!(ConnectorError::InvalidQuerySyntax.is_validation());
        assert!(!ConnectorError::ContextUrlNotFound.is_validation());
    }

    #[tokio::test]
    async fn test_process_error_resolves_known_key() {
        let err = ConnectorError::ContextUrlNotFound;
        let resolved = ProcessError::resolve(&err, &DefaultMessages).await;
        assert_eq!(resolved.key, "ETPBIC_ContextUrlNotFound");
        assert_ne!(resolved.message, resolved.key);
    }

    #[tokio::test]
    async fn test_process_error_keeps_internal_text() {
        let err = ConnectorError::Internal("disk on fire".to_string());
        let resolved = ProcessError::resolve(&err, &DefaultMessages).await;
        assert_eq!(resolved.key, INTERNAL_ERROR_KEY);
        assert_eq!(resolved.message, "Internal error: disk on fire");
        assert_eq!(resolved.to_string(), resolved.message);
    }
}
