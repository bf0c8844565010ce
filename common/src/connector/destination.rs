// Execution variables of a data destination, dispatched by name into fixed slots

use super::credentials::DatabaseCredentials;
use crate::errors::ConnectorError;
use crate::models::ExecutionVariable;

pub const DEFAULT_SSH_PORT: &str = "22";

/// Slot a recognised variable name is stored in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Client,
    User,
    Ip,
    Port,
    Path,
    DbUser,
    DbPassword,
    PrivateKeyPath,
}

impl Slot {
    fn from_name(name: &str) -> Option<Self> {
        let slot = match name.to_lowercase().as_str() {
            "client" => Slot::Client,
            "user" => Slot::User,
            "ip" => Slot::Ip,
            "port" => Slot::Port,
            "path" => Slot::Path,
            "bbdd_user" => Slot::DbUser,
            "bbdd_password" => Slot::DbPassword,
            "private-key-path" => Slot::PrivateKeyPath,
            _ => return None,
        };
        Some(slot)
    }
}

/// Raw slot values after one scan over the variables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableSlots {
    pub client: String,
    pub user: String,
    pub ip: String,
    pub port: String,
    pub path: String,
    pub db_user: String,
    pub db_password: String,
    pub private_key_path: String,
}

impl VariableSlots {
    /// Assign each recognised variable to its slot
    ///
    /// Unknown names are skipped. A repeated name keeps its last value.
    pub fn scan(vars: &[ExecutionVariable]) -> Self {
        let mut slots = Self::default();
        for var in vars {
            let Some(slot) = Slot::from_name(var.variable.trim()) else {
                continue;
            };
            let value = var.value.clone().unwrap_or_default();
            match slot {
                Slot::Client => slots.client = value,
                Slot::User => slots.user = value,
                Slot::Ip => slots.ip = value,
                Slot::Port => slots.port = value,
                Slot::Path => slots.path = value,
                Slot::DbUser => slots.db_user = value,
                Slot::DbPassword => slots.db_password = value,
                Slot::PrivateKeyPath => slots.private_key_path = value,
            }
        }
        slots
    }

    fn missing_required(&self) -> Vec<&'static str> {
        [
            ("client", &self.client),
            ("user", &self.user),
            ("ip", &self.ip),
        ]
        .into_iter()
        .filter(|(_, value)| is_blank(value))
        .map(|(name, _)| name)
        .collect()
    }
}

/// Per-destination values ready for argument assembly
#[derive(Clone, PartialEq, Eq)]
pub struct DestinationArgs {
    pub client: String,
    pub user: String,
    pub ip: String,
    pub port: String,
    pub path: String,
    pub db_user: String,
    pub db_password: String,
    pub private_key_path: String,
    /// True when the global database credentials replaced missing overrides
    pub used_global_credentials: bool,
}

impl std::fmt::Debug for DestinationArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DestinationArgs")
            .field("client", &self.client)
            .field("user", &self.user)
            .field("ip", &self.ip)
            .field("port", &self.port)
            .field("path", &self.path)
            .field("db_user", &self.db_user)
            .field("db_password", &"<redacted>")
            .field("private_key_path", &self.private_key_path)
            .field("used_global_credentials", &self.used_global_credentials)
            .finish()
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Default an empty port to 22
pub fn resolve_port(port: &str) -> String {
    if is_blank(port) {
        DEFAULT_SSH_PORT.to_string()
    } else {
        port.trim().to_string()
    }
}

/// Append a trailing `/` unless already present
pub fn with_trailing_separator(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{}/", path)
    }
}

/// Resolve a destination's variables into launch values
///
/// Defaults are applied only after the scan, so the result does not depend
/// on variable order (apart from repeated names). When either database
/// override is blank, both fall back to the global credentials.
pub fn resolve_destination_vars(
    destination_id: &str,
    vars: &[ExecutionVariable],
    global: &DatabaseCredentials,
) -> Result<DestinationArgs, ConnectorError> {
    let slots = VariableSlots::scan(vars);

    let missing = slots.missing_required();
    if !missing.is_empty() {
        return Err(ConnectorError::MissingRequiredVariables {
            destination_id: destination_id.to_string(),
            missing,
        });
    }

    let used_global_credentials = is_blank(&slots.db_user) || is_blank(&slots.db_password);
    let (db_user, db_password) = if used_global_credentials {
        (global.user.clone(), global.password.clone())
    } else {
        (slots.db_user, slots.db_password)
    };

    Ok(DestinationArgs {
        port: resolve_port(&slots.port),
        path: with_trailing_separator(&slots.path),
        client: slots.client,
        user: slots.user,
        ip: slots.ip,
        db_user,
        db_password,
        private_key_path: slots.private_key_path,
        used_global_credentials,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str, value: &str) -> ExecutionVariable {
        ExecutionVariable::new(format!("V-{}", name), "D1", name, value)
    }

    fn global() -> DatabaseCredentials {
        DatabaseCredentials {
            sid: "etendo".to_string(),
            user: "global_user".to_string(),
            password: "global_pass".to_string(),
            url: "jdbc:postgresql://localhost:5432".to_string(),
            host: "localhost".to_string(),
            port: "5432".to_string(),
        }
    }

    #[test]
    fn test_names_match_case_insensitively() {
        let vars = vec![
            var("CLIENT", "acme"),
            var("User", "sftp"),
            var("ip", "10.0.0.1"),
            var("PORT", ""),
        ];
        let args = resolve_destination_vars("D1", &vars, &global()).unwrap();
        assert_eq!(args.client, "acme");
        assert_eq!(args.user, "sftp");
        assert_eq!(args.port, "22");
    }

    #[test]
    fn test_missing_user_is_reported() {
        let vars = vec![var("CLIENT", "acme"), var("ip", "10.0.0.1"), var("PORT", "")];
        let err = resolve_destination_vars("D1", &vars, &global()).unwrap_err();
        assert!(matches!(
            err,
            ConnectorError::MissingRequiredVariables { ref missing, .. } if missing == &vec!["user"]
        ));
    }

    #[test]
    fn test_blank_user_is_missing() {
        let vars = vec![var("client", "acme"), var("user", "   "), var("ip", "10.0.0.1")];
        assert!(resolve_destination_vars("D1", &vars, &global()).is_err());
    }

    #[test]
    fn test_unknown_variables_are_ignored() {
        let vars = vec![
            var("client", "acme"),
            var("user", "u"),
            var("ip", "h"),
            var("csv_separator", ";"),
            var("something_new", "x"),
        ];
        assert!(resolve_destination_vars("D1", &vars, &global()).is_ok());
    }

    #[test]
    fn test_global_credentials_fill_blank_overrides() {
        let vars = vec![
            var("client", "acme"),
            var("user", "u"),
            var("ip", "h"),
            var("bbdd_user", "local_user"),
            var("bbdd_password", ""),
        ];
        let args = resolve_destination_vars("D1", &vars, &global()).unwrap();
        assert!(args.used_global_credentials);
        assert_eq!(args.db_user, "global_user");
        assert_eq!(args.db_password, "global_pass");
    }

    #[test]
    fn test_complete_overrides_are_kept() {
        let vars = vec![
            var("client", "acme"),
            var("user", "u"),
            var("ip", "h"),
            var("BBDD_USER", "local_user"),
            var("bbdd_password", "local_pass"),
            var("private-key-path", "/keys/id_rsa"),
            var("path", "/upload"),
            var("port", "2222"),
        ];
        let args = resolve_destination_vars("D1", &vars, &global()).unwrap();
        assert!(!args.used_global_credentials);
        assert_eq!(args.db_user, "local_user");
        assert_eq!(args.db_password, "local_pass");
        assert_eq!(args.private_key_path, "/keys/id_rsa");
        assert_eq!(args.path, "/upload/");
        assert_eq!(args.port, "2222");
    }

    #[test]
    fn test_trailing_separator_is_idempotent() {
        assert_eq!(with_trailing_separator("/data"), "/data/");
        assert_eq!(with_trailing_separator("/data/"), "/data/");
        assert_eq!(with_trailing_separator(""), "/");
    }

    #[test]
    fn test_missing_value_counts_as_blank() {
        let mut client = var("client", "acme");
        client.value = None;
        let vars = vec![client, var("user", "u"), var("ip", "h")];
        let err = resolve_destination_vars("D1", &vars, &global()).unwrap_err();
        assert_eq!(err.message_key(), "ETPBIC_VariablesNotFoundError");
    }

    #[test]
    fn test_debug_hides_password() {
        let vars = vec![
            var("client", "acme"),
            var("user", "u"),
            var("ip", "h"),
            var("bbdd_user", "x"),
            var("bbdd_password", "hunter2"),
        ];
        let args = resolve_destination_vars("D1", &vars, &global()).unwrap();
        assert!(!format!("{:?}", args).contains("hunter2"));
    }
}
