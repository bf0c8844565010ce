// Persistence-event validators for the connector's administrative records
//
// Each observer declares the entities it watches; the registry routes an
// event to every observer of its entity and stops at the first rejection.

pub mod delimiter;
pub mod query;

use crate::errors::ConnectorError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub use delimiter::{
    validate_delimiter, ConnectionDelimiterValidator, VariableDelimiterValidator,
};
pub use query::{validate_query, BaseQueryHandler, CustomQueryHandler};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    New,
    Update,
    Delete,
}

/// A record about to be persisted, with its current field values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityEvent {
    pub entity: String,
    pub kind: EventKind,
    #[serde(default)]
    pub state: HashMap<String, Value>,
}

impl EntityEvent {
    pub fn new(entity: impl Into<String>, kind: EventKind) -> Self {
        Self {
            entity: entity.into(),
            kind,
            state: HashMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.state.insert(name.into(), value.into());
        self
    }

    /// String value of a field, `None` when absent or not a string
    pub fn text(&self, field: &str) -> Option<&str> {
        self.state.get(field).and_then(Value::as_str)
    }

    /// Boolean flag, accepting ERP style `"Y"`/`"N"` as well
    pub fn flag(&self, field: &str) -> Option<bool> {
        match self.state.get(field)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) if s.eq_ignore_ascii_case("y") => Some(true),
            Value::String(s) if s.eq_ignore_ascii_case("n") => Some(false),
            _ => None,
        }
    }
}

/// Rejects persistence events that would store invalid data
pub trait PersistenceObserver: Send + Sync {
    fn observed_entities(&self) -> &[&'static str];

    fn on_event(&self, event: &EntityEvent) -> Result<(), ConnectorError>;

    fn observes(&self, entity: &str) -> bool {
        self.observed_entities().iter().any(|e| *e == entity)
    }
}

#[derive(Clone, Default)]
pub struct ObserverRegistry {
    observers: Vec<Arc<dyn PersistenceObserver>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every connector validator installed
    pub fn with_defaults() -> Self {
        Self::new()
            .register(Arc::new(BaseQueryHandler))
            .register(Arc::new(CustomQueryHandler))
            .register(Arc::new(ConnectionDelimiterValidator))
            .register(Arc::new(VariableDelimiterValidator))
    }

    pub fn register(mut self, observer: Arc<dyn PersistenceObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Run every observer of the event's entity
    ///
    /// Events for entities nobody observes pass.
    pub fn dispatch(&self, event: &EntityEvent) -> Result<(), ConnectorError> {
        for observer in self.observers.iter().filter(|o| o.observes(&event.entity)) {
            observer.on_event(event)?;
        }
        Ok(())
    }
}
