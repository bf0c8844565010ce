// CSV delimiter validation for connections and execution variables

use super::{EntityEvent, EventKind, PersistenceObserver};
use crate::errors::ConnectorError;
use crate::telemetry;

pub const CONNECTION_ENTITY: &str = "ETPBIC_Connection";
pub const CSV_SEPARATOR_FIELD: &str = "csvSeparator";

pub const VARIABLE_ENTITY: &str = "ETPBIC_Execution_Variables";
pub const VARIABLE_NAME_FIELD: &str = "variable";
pub const VARIABLE_VALUE_FIELD: &str = "value";
pub const CSV_SEPARATOR_VARIABLE: &str = "csv_separator";

/// A delimiter is exactly one character
pub fn validate_delimiter(value: &str) -> Result<(), ConnectorError> {
    if value.chars().count() != 1 {
        telemetry::record_validation_rejection("delimiter");
        return Err(ConnectorError::InvalidDelimiter {
            value: value.to_string(),
        });
    }
    Ok(())
}

fn validate_delimiter_field(event: &EntityEvent, field: &str) -> Result<(), ConnectorError> {
    match event.text(field) {
        Some(value) => validate_delimiter(value),
        None => {
            telemetry::record_validation_rejection("delimiter");
            Err(ConnectorError::InvalidDelimiter {
                value: String::new(),
            })
        }
    }
}

fn is_write(kind: EventKind) -> bool {
    matches!(kind, EventKind::New | EventKind::Update)
}

/// Separator configured on a connection record
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionDelimiterValidator;

impl PersistenceObserver for ConnectionDelimiterValidator {
    fn observed_entities(&self) -> &[&'static str] {
        &[CONNECTION_ENTITY]
    }

    fn on_event(&self, event: &EntityEvent) -> Result<(), ConnectorError> {
        if !is_write(event.kind) {
            return Ok(());
        }
        validate_delimiter_field(event, CSV_SEPARATOR_FIELD)
    }
}

/// Execution variables named `csv_separator`
#[derive(Debug, Clone, Copy, Default)]
pub struct VariableDelimiterValidator;

impl PersistenceObserver for VariableDelimiterValidator {
    fn observed_entities(&self) -> &[&'static str] {
        &[VARIABLE_ENTITY]
    }

    fn on_event(&self, event: &EntityEvent) -> Result<(), ConnectorError> {
        if !is_write(event.kind) {
            return Ok(());
        }
        let is_separator = event
            .text(VARIABLE_NAME_FIELD)
            .is_some_and(|name| name.eq_ignore_ascii_case(CSV_SEPARATOR_VARIABLE));
        if !is_separator {
            return Ok(());
        }
        validate_delimiter_field(event, VARIABLE_VALUE_FIELD)
    }
}
