// Positional argument contract of the export scripts
//
// Order: sid, host, port, base url, client id, organization id, webhook
// name, webhook api key, organization name, then per destination: client,
// user, ip, port, path, db user, db password, private key path.

use super::credentials::DatabaseCredentials;
use super::destination::DestinationArgs;
use super::webhook_chain::WebhookAuth;
use crate::config::ArgumentMode;
use crate::errors::ConnectorError;
use crate::models::{Organization, RequestContext};

const SEPARATOR: char = ',';

/// Replace the joined-mode separator in free text
pub fn sanitize(value: &str) -> String {
    value.replace(SEPARATOR, "_")
}

/// Values shared by every destination of one run
#[derive(Clone, PartialEq, Eq)]
pub struct SharedArguments {
    pub sid: String,
    pub host: String,
    pub port: String,
    pub base_url: String,
    pub client_id: String,
    pub organization_id: String,
    pub webhook_name: String,
    pub webhook_api_key: String,
    pub organization_name: String,
}

impl SharedArguments {
    pub fn new(
        credentials: &DatabaseCredentials,
        base_url: &str,
        ctx: &RequestContext,
        organization: &Organization,
        webhook: &WebhookAuth,
    ) -> Self {
        Self {
            sid: credentials.sid.clone(),
            host: credentials.host.clone(),
            port: credentials.port.clone(),
            base_url: base_url.to_string(),
            client_id: ctx.client_id.clone(),
            organization_id: organization.id.clone(),
            webhook_name: webhook.name.clone(),
            webhook_api_key: webhook.api_key.clone(),
            organization_name: sanitize(&organization.name),
        }
    }
}

impl std::fmt::Debug for SharedArguments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedArguments")
            .field("sid", &self.sid)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("organization_id", &self.organization_id)
            .field("webhook_name", &self.webhook_name)
            .field("organization_name", &self.organization_name)
            .finish_non_exhaustive()
    }
}

/// Fresh ordered value list for one destination
pub fn build_arguments(shared: &SharedArguments, destination: &DestinationArgs) -> Vec<String> {
    vec![
        shared.sid.clone(),
        shared.host.clone(),
        shared.port.clone(),
        shared.base_url.clone(),
        shared.client_id.clone(),
        shared.organization_id.clone(),
        shared.webhook_name.clone(),
        shared.webhook_api_key.clone(),
        shared.organization_name.clone(),
        sanitize(&destination.client),
        destination.user.clone(),
        destination.ip.clone(),
        destination.port.clone(),
        destination.path.clone(),
        destination.db_user.clone(),
        destination.db_password.clone(),
        destination.private_key_path.clone(),
    ]
}

/// Shape the value list into process arguments
///
/// In joined mode any value still holding the separator is rejected, since
/// it would shift every later position.
pub fn render_arguments(
    values: Vec<String>,
    mode: ArgumentMode,
) -> Result<Vec<String>, ConnectorError> {
    match mode {
        ArgumentMode::Discrete => Ok(values),
        ArgumentMode::Joined => {
            if let Some(position) = values.iter().position(|v| v.contains(SEPARATOR)) {
                return Err(ConnectorError::ArgumentContainsDelimiter { position });
            }
            Ok(vec![values.join(",")])
        }
    }
}
