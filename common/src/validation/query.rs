// Stored BI queries must be plain SELECT statements

use super::{EntityEvent, EventKind, PersistenceObserver};
use crate::errors::ConnectorError;
use crate::telemetry;

pub const QUERY_ENTITY: &str = "ETPBIC_Query";
pub const CUSTOM_QUERY_ENTITY: &str = "ETPBIC_Query_Custom";
pub const QUERY_FIELD: &str = "query";
pub const BASE_QUERY_FLAG: &str = "isetendobase";

/// Accept only text that starts with `select`, ignoring case and surrounding whitespace
pub fn validate_query(query: &str) -> Result<(), ConnectorError> {
    if !query.trim().to_lowercase().starts_with("select") {
        telemetry::record_validation_rejection("query_syntax");
        return Err(ConnectorError::InvalidQuerySyntax);
    }
    tracing::info!("Query accepted");
    Ok(())
}

fn validate_query_field(event: &EntityEvent) -> Result<(), ConnectorError> {
    match event.text(QUERY_FIELD) {
        Some(query) => validate_query(query),
        None => {
            telemetry::record_validation_rejection("query_syntax");
            Err(ConnectorError::InvalidQuerySyntax)
        }
    }
}

/// Queries shipped with the module: validated on write, never deleted when flagged
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseQueryHandler;

impl PersistenceObserver for BaseQueryHandler {
    fn observed_entities(&self) -> &[&'static str] {
        &[QUERY_ENTITY]
    }

    fn on_event(&self, event: &EntityEvent) -> Result<(), ConnectorError> {
        match event.kind {
            EventKind::New | EventKind::Update => validate_query_field(event),
            EventKind::Delete => {
                // An unflagged record is a user query
                if event.flag(BASE_QUERY_FLAG).unwrap_or(false) {
                    tracing::debug!("Refusing to delete base query");
                    telemetry::record_validation_rejection("base_query_delete");
                    return Err(ConnectorError::CantDeleteBaseQuery);
                }
                Ok(())
            }
        }
    }
}

/// User defined queries: validated on write only
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomQueryHandler;

impl PersistenceObserver for CustomQueryHandler {
    fn observed_entities(&self) -> &[&'static str] {
        &[CUSTOM_QUERY_ENTITY]
    }

    fn on_event(&self, event: &EntityEvent) -> Result<(), ConnectorError> {
        match event.kind {
            EventKind::New | EventKind::Update => validate_query_field(event),
            EventKind::Delete => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_statements_pass() {
        assert!(validate_query("SELECT * FROM t").is_ok());
        assert!(validate_query("  select id from t  ").is_ok());
        assert!(validate_query(
            "SELECT o.id, SUM(l.amount) FROM c_order o \
             JOIN c_orderline l ON l.c_order_id = o.c_order_id \
             WHERE o.issotrx = 'Y' GROUP BY o.id"
        )
        .is_ok());
        assert!(validate_query("\n\tSeLeCt 1").is_ok());
    }

    #[test]
    fn test_other_statements_fail() {
        for query in ["INSERT INTO t VALUES (1)", "UPDATE t SET x=1", "DELETE FROM t", ""] {
            assert!(
                matches!(validate_query(query), Err(ConnectorError::InvalidQuerySyntax)),
                "{} should be rejected",
                query
            );
        }
    }

    #[test]
    fn test_base_handler_checks_new_and_update() {
        for kind in [EventKind::New, EventKind::Update] {
            let ok = EntityEvent::new(QUERY_ENTITY, kind).with_field(QUERY_FIELD, "select 1");
            assert!(BaseQueryHandler.on_event(&ok).is_ok());

            let bad = EntityEvent::new(QUERY_ENTITY, kind).with_field(QUERY_FIELD, "drop table t");
            assert!(BaseQueryHandler.on_event(&bad).is_err());
        }
    }

    #[test]
    fn test_missing_query_field_is_rejected() {
        let event = EntityEvent::new(CUSTOM_QUERY_ENTITY, EventKind::New);
        assert!(matches!(
            CustomQueryHandler.on_event(&event),
            Err(ConnectorError::InvalidQuerySyntax)
        ));
    }

    #[test]
    fn test_base_query_cannot_be_deleted() {
        let event = EntityEvent::new(QUERY_ENTITY, EventKind::Delete)
            .with_field(BASE_QUERY_FLAG, true)
            .with_field(QUERY_FIELD, "select 1");
        let err = BaseQueryHandler.on_event(&event).unwrap_err();
        assert_eq!(err.message_key(), "ETPBIC_CantDeleteEtendoQuery");
    }

    #[test]
    fn test_user_query_can_be_deleted() {
        let event = EntityEvent::new(QUERY_ENTITY, EventKind::Delete)
            .with_field(BASE_QUERY_FLAG, "N")
            .with_field(QUERY_FIELD, "not even a query");
        assert!(BaseQueryHandler.on_event(&event).is_ok());

        let unflagged = EntityEvent::new(QUERY_ENTITY, EventKind::Delete);
        assert!(BaseQueryHandler.on_event(&unflagged).is_ok());
    }

    #[test]
    fn test_custom_query_delete_is_not_guarded() {
        let event = EntityEvent::new(CUSTOM_QUERY_ENTITY, EventKind::Delete)
            .with_field(BASE_QUERY_FLAG, true);
        assert!(CustomQueryHandler.on_event(&event).is_ok());
    }
}
