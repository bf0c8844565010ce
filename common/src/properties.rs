// ERP application properties (Openbravo.properties style key=value file)

use crate::errors::ConnectorError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::instrument;

/// Immutable flat key/value bag read once per process run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationProperties {
    values: HashMap<String, String>,
}

impl ApplicationProperties {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parse the contents of a properties file
    ///
    /// Follows the `java.util.Properties` text format: `=`, `:` or
    /// whitespace separators, `#`/`!` comments, backslash line
    /// continuations and `\\`, `\:`, `\t`, `\uXXXX` style escapes. Later
    /// duplicates override earlier ones.
    pub fn parse(contents: &str) -> Result<Self, ConnectorError> {
        let mut values = HashMap::new();
        let mut logical = String::new();
        let mut continuing = false;

        for raw in contents.lines() {
            let line = raw.trim_start_matches(is_blank_char);
            if !continuing && (line.is_empty() || line.starts_with('#') || line.starts_with('!')) {
                continue;
            }

            // An odd number of trailing backslashes continues the line
            let trailing = line.chars().rev().take_while(|c| *c == '\\').count();
            continuing = trailing % 2 == 1;
            if continuing {
                logical.push_str(&line[..line.len() - 1]);
                continue;
            }
            logical.push_str(line);

            let (key, value) = split_entry(&logical)?;
            values.insert(key, value);
            logical.clear();
        }

        if !logical.is_empty() {
            let (key, value) = split_entry(&logical)?;
            values.insert(key, value);
        }

        Ok(Self { values })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn is_blank_char(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\u{000C}')
}

/// Split a logical line at the first unescaped separator and unescape both halves
fn split_entry(line: &str) -> Result<(String, String), ConnectorError> {
    let mut key_end = line.len();
    let mut escaped = false;
    for (idx, c) in line.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '=' || c == ':' || is_blank_char(c) {
            key_end = idx;
            break;
        }
    }

    let rest = line[key_end..].trim_start_matches(is_blank_char);
    let rest = rest
        .strip_prefix(['=', ':'])
        .unwrap_or(rest)
        .trim_start_matches(is_blank_char);

    Ok((unescape(&line[..key_end])?, unescape(rest)?))
}

fn unescape(text: &str) -> Result<String, ConnectorError> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{000C}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let decoded = u32::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|_| hex.len() == 4)
                    .and_then(char::from_u32)
                    .ok_or_else(|| {
                        ConnectorError::Internal(format!("Malformed \\uXXXX escape: \\u{}", hex))
                    })?;
                out.push(decoded);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    Ok(out)
}

/// Source of application properties, consulted fresh on every run
#[async_trait]
pub trait PropertiesProvider: Send + Sync {
    async fn load(&self) -> Result<ApplicationProperties, ConnectorError>;
}

/// Properties read from a file on disk
#[derive(Debug, Clone)]
pub struct PropertiesFile {
    path: PathBuf,
}

impl PropertiesFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PropertiesProvider for PropertiesFile {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> Result<ApplicationProperties, ConnectorError> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to read application properties");
            ConnectorError::Internal(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let properties = ApplicationProperties::parse(&contents).map_err(|e| {
            tracing::error!(error = %e, "Failed to parse application properties");
            e
        })?;
        tracing::debug!(count = properties.len(), "Loaded application properties");
        Ok(properties)
    }
}

#[async_trait]
impl PropertiesProvider for ApplicationProperties {
    async fn load(&self) -> Result<ApplicationProperties, ConnectorError> {
        Ok(self.clone())
    }
}
