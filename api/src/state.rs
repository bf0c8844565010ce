use std::sync::Arc;

use common::connector::{LogWriter, SyncProcess};
use common::messages::MessageResolver;
use common::store::ConnectorStore;
use common::validation::ObserverRegistry;
use metrics_exporter_prometheus::PrometheusHandle;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ConnectorStore>,
    pub sync: Arc<SyncProcess>,
    pub log_writer: Arc<LogWriter>,
    pub validators: Arc<ObserverRegistry>,
    pub messages: Arc<dyn MessageResolver>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ConnectorStore>,
        sync: SyncProcess,
        messages: Arc<dyn MessageResolver>,
    ) -> Self {
        Self {
            log_writer: Arc::new(LogWriter::new(store.clone())),
            store,
            sync: Arc::new(sync),
            validators: Arc::new(ObserverRegistry::with_defaults()),
            messages,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
