// Database credentials from the application properties
// `bbdd.readonly.*` keys win over their primary `bbdd.*` counterparts.

use crate::errors::ConnectorError;
use crate::properties::ApplicationProperties;
use regex::Regex;
use std::sync::OnceLock;

/// Value of `bbdd.readonly.<name>` when present, otherwise `bbdd.<name>`
///
/// Missing keys resolve to an empty string; the consumer decides whether
/// that is acceptable.
pub fn prefer_readonly(props: &ApplicationProperties, name: &str) -> String {
    let readonly_key = format!("bbdd.readonly.{}", name);
    if props.contains(&readonly_key) {
        return props.get(&readonly_key).unwrap_or_default().to_string();
    }
    props
        .get(&format!("bbdd.{}", name))
        .unwrap_or_default()
        .to_string()
}

fn url_separator() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| Regex::new("://|:").expect("Invalid URL separator pattern"))
}

/// Split a JDBC style URL into `(host, port)`
///
/// The URL is split on `://` or `:`; host is the third token and port the
/// fourth, cut at the first `/`, `?` or `;`. So
/// `jdbc:postgresql://host1:5432/db` yields `("host1", "5432")`.
pub fn split_database_url(url: &str) -> Result<(String, String), ConnectorError> {
    let invalid = || ConnectorError::InvalidDatabaseUrl {
        url: url.to_string(),
    };

    let parts: Vec<&str> = url_separator().split(url).collect();
    if parts.len() < 4 {
        return Err(invalid());
    }

    let host = parts[2].trim();
    let port = parts[3]
        .split(['/', '?', ';'])
        .next()
        .unwrap_or_default()
        .trim();

    if host.is_empty() || port.is_empty() || !port.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    Ok((host.to_string(), port.to_string()))
}

/// Global database connection parameters
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseCredentials {
    pub sid: String,
    pub user: String,
    pub password: String,
    pub url: String,
    pub host: String,
    pub port: String,
}

impl DatabaseCredentials {
    pub fn resolve(props: &ApplicationProperties) -> Result<Self, ConnectorError> {
        let url = prefer_readonly(props, "url");
        let (host, port) = split_database_url(&url)?;

        Ok(Self {
            sid: prefer_readonly(props, "sid"),
            user: prefer_readonly(props, "user"),
            password: prefer_readonly(props, "password"),
            url,
            host,
            port,
        })
    }
}

impl std::fmt::Debug for DatabaseCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseCredentials")
            .field("sid", &self.sid)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}
