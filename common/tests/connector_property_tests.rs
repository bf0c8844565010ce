// Property-based tests for the connector resolvers

use common::connector::credentials::{prefer_readonly, split_database_url, DatabaseCredentials};
use common::connector::destination::resolve_destination_vars;
use common::connector::launcher::{normalize_repository_path, normalize_script_name};
use common::models::ExecutionVariable;
use common::properties::ApplicationProperties;
use proptest::prelude::*;

fn global() -> DatabaseCredentials {
    DatabaseCredentials {
        sid: "etendo".to_string(),
        user: "global".to_string(),
        password: "global_pass".to_string(),
        url: "jdbc:postgresql://localhost:5432".to_string(),
        host: "localhost".to_string(),
        port: "5432".to_string(),
    }
}

// Readonly keys always win over their primary counterparts
#[test]
fn property_readonly_key_preferred() {
    proptest!(|(
        name in prop::sample::select(vec!["sid", "user", "password", "url"]),
        primary in "[a-z0-9]{1,12}",
        readonly in "[a-z0-9]{1,12}",
    )| {
        let both = ApplicationProperties::from_pairs([
            (format!("bbdd.{}", name), primary.clone()),
            (format!("bbdd.readonly.{}", name), readonly.clone()),
        ]);
        prop_assert_eq!(prefer_readonly(&both, name), readonly);

        let only_primary = ApplicationProperties::from_pairs([(format!("bbdd.{}", name), primary.clone())]);
        prop_assert_eq!(prefer_readonly(&only_primary, name), primary);
    });
}

// Any scheme://host:port[/db] URL splits back into its host and port
#[test]
fn property_database_url_split() {
    proptest!(|(
        scheme in prop::sample::select(vec!["jdbc:postgresql", "postgresql", "jdbc:mysql"]),
        host in "[a-z][a-z0-9.-]{0,20}",
        port in 1u16..,
        database in prop::option::of("[a-z_]{1,10}"),
    )| {
        let mut url = format!("{}://{}:{}", scheme, host, port);
        if let Some(db) = &database {
            url.push('/');
            url.push_str(db);
        }

        let (parsed_host, parsed_port) = split_database_url(&url).unwrap();
        prop_assert_eq!(parsed_host, host);
        prop_assert_eq!(parsed_port, port.to_string());
    });
}

// Normalization is idempotent
#[test]
fn property_path_normalization_idempotent() {
    proptest!(|(path in "[a-z/]{0,20}", script in "[a-z_]{1,12}(\\.py)?")| {
        let once = normalize_repository_path(&path);
        prop_assert!(once.ends_with('/'));
        prop_assert_eq!(normalize_repository_path(&once), once.clone());

        let name = normalize_script_name(&script);
        prop_assert!(name.ends_with(".py"));
        prop_assert_eq!(normalize_script_name(&name), name.clone());
    });
}

// Variable order does not change the resolved destination, as long as names are distinct
#[test]
fn property_destination_resolution_order_independent() {
    proptest!(|(
        client in "[a-z]{1,8}",
        user in "[a-z]{1,8}",
        ip in "[0-9.]{7,15}",
        port in prop::option::of("[0-9]{2,5}"),
        path in "[a-z/]{0,10}",
        extra in prop::collection::vec("[a-z]{3,8}_x", 0..4),
        seed in any::<u64>(),
    )| {
        let mut vars = vec![
            ExecutionVariable::new("1", "D", "client", client.clone()),
            ExecutionVariable::new("2", "D", "USER", user.clone()),
            ExecutionVariable::new("3", "D", "Ip", ip.clone()),
            ExecutionVariable::new("4", "D", "port", port.clone().unwrap_or_default()),
            ExecutionVariable::new("5", "D", "path", path.clone()),
        ];
        for (i, name) in extra.iter().enumerate() {
            vars.push(ExecutionVariable::new(format!("x{}", i), "D", name.clone(), "ignored"));
        }

        let forward = resolve_destination_vars("D", &vars, &global()).unwrap();

        let len = vars.len();
        vars.rotate_left((seed as usize) % len);
        vars.reverse();
        let shuffled = resolve_destination_vars("D", &vars, &global()).unwrap();

        prop_assert_eq!(&forward, &shuffled);
        prop_assert_eq!(forward.port, port.unwrap_or_else(|| "22".to_string()));
        prop_assert!(forward.path.ends_with('/'));
        prop_assert_eq!(forward.db_user, "global");
    });
}
