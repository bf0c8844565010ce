// Message catalogue lookups
// Keys are opaque identifiers; the ERP owns the translated texts.

use async_trait::async_trait;

/// Resolves a message key into human readable text
#[async_trait]
pub trait MessageResolver: Send + Sync {
    /// Resolve `key`, returning the key itself when no text is known
    async fn resolve(&self, key: &str) -> String;
}

/// Built-in English texts used when the ERP catalogue is unavailable
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMessages;

impl DefaultMessages {
    pub fn text(key: &str) -> Option<&'static str> {
        let text = match key {
            "ETPBIC_NullConfigError" => {
                "No BI connection configuration found for the current organization or its parents."
            }
            "ETPBIC_NoWebhookError" => "The BI connection has no webhook defined.",
            "ETPBIC_NoWebhookAccessError" => "The webhook of the BI connection has no access defined.",
            "ETPBIC_NoWebhookTokenError" => "The webhook access has no token defined.",
            "ETPBIC_ContextUrlNotFound" => "context.url is not defined in Openbravo.properties.",
            "ETPBIC_InvalidDatabaseUrl" => "bbdd.url in Openbravo.properties must look like scheme://host:port.",
            "ETPBIC_NoDataDestError" | "ETPBIC_NoDataDestinations" => {
                "The BI connection has no data destinations."
            }
            "ETPBIC_VariablesNotFoundError" => {
                "Execution variables client, user and ip are required for every data destination."
            }
            "ETPBIC_ScriptNotFound" => "The script of the data destination was not found.",
            "ETPBIC_ExecutePythonError" => "There was an error executing the script.",
            "ETPBIC_InvalidQuerySyntax" => "The query must be a SELECT statement.",
            "ETPBIC_InvalidDelimiter" => "The delimiter must be a single character.",
            "ETPBIC_CantDeleteEtendoQuery" => "Etendo base queries can not be deleted.",
            "ETPBIC_LogCreationError" => "The log entry could not be created.",
            "ETPBIC_WebhookUnauthorized" => "The webhook name or API key is not valid.",
            _ => return None,
        };
        Some(text)
    }
}

#[async_trait]
impl MessageResolver for DefaultMessages {
    async fn resolve(&self, key: &str) -> String {
        Self::text(key)
            .map(str::to_string)
            .unwrap_or_else(|| key.to_string())
    }
}
