use std::collections::BTreeMap;
use std::sync::Arc;

use lbx_storage::{ListOptions, SortDirection, Storage, StorageExt};
use lbx_types::LogEvent;
use tracing::debug;

use crate::error::ServerResult;

/// Records audit events in the logging storage.
#[derive(Clone)]
pub struct EventLogger {
    storage: Arc<dyn Storage>,
}

impl EventLogger {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub async fn log<K, V>(
        &self,
        event_type: &str,
        context: impl IntoIterator<Item = (K, V)>,
    ) -> ServerResult<LogEvent>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let context: BTreeMap<String, String> = context
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let event = LogEvent::new(event_type, context);
        self.storage.save(&event).await?;
        debug!(event = %event.event_type, id = %event.id, "event logged");
        Ok(event)
    }

    /// Most recent events first.
    pub async fn recent(&self, limit: usize) -> ServerResult<Vec<LogEvent>> {
        let options = ListOptions::new()
            .order_by("time", SortDirection::Descending)
            .limit(limit);
        Ok(self.storage.list::<LogEvent>(&options).await?)
    }
}

impl std::fmt::Debug for EventLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLogger")
            .field("storage", &self.storage.backend_name())
            .finish()
    }
}
