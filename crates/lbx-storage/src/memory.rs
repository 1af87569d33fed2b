use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use lbx_types::RawObject;
use tracing::debug;

use crate::error::{lock_poisoned, StorageError, StorageResult};
use crate::list::ListOptions;
use crate::traits::Storage;

type RecordKey = (String, String);

/// In-memory, HashMap-based storage.
///
/// Intended for tests and ephemeral deployments. Records are keyed by
/// `(kind, id)` behind a `RwLock` and cloned on read/write. Everything is
/// lost when the storage is dropped.
pub struct MemoryStorage {
    records: RwLock<HashMap<RecordKey, RawObject>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Number of records across all kinds.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted list of kinds that currently hold at least one record.
    pub fn kinds(&self) -> Vec<String> {
        let Ok(records) = self.records.read() else {
            return Vec::new();
        };
        let mut kinds: Vec<String> = records.keys().map(|(kind, _)| kind.clone()).collect();
        kinds.sort();
        kinds.dedup();
        kinds
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn init(&self) -> StorageResult<()> {
        debug!("memory storage ready");
        Ok(())
    }

    async fn get_raw(&self, kind: &str, id: &str) -> StorageResult<RawObject> {
        let records = self.records.read().map_err(lock_poisoned)?;
        records
            .get(&(kind.to_string(), id.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::not_found(kind, id))
    }

    async fn save_raw(&self, kind: &str, id: &str, raw: RawObject) -> StorageResult<()> {
        let mut records = self.records.write().map_err(lock_poisoned)?;
        records.insert((kind.to_string(), id.to_string()), raw);
        debug!(kind, id, "saved record");
        Ok(())
    }

    async fn delete_raw(&self, kind: &str, id: &str) -> StorageResult<()> {
        let mut records = self.records.write().map_err(lock_poisoned)?;
        let existed = records
            .remove(&(kind.to_string(), id.to_string()))
            .is_some();
        debug!(kind, id, existed, "deleted record");
        Ok(())
    }

    async fn list_raw(&self, kind: &str, options: &ListOptions) -> StorageResult<Vec<RawObject>> {
        let records = self.records.read().map_err(lock_poisoned)?;
        Ok(options.apply(
            records
                .iter()
                .filter(|((k, _), _)| k == kind)
                .map(|((_, id), raw)| (id.clone(), raw.clone())),
        ))
    }

    async fn clear(&self) -> StorageResult<()> {
        self.records.write().map_err(lock_poisoned)?.clear();
        debug!("memory storage cleared");
        Ok(())
    }
}

impl std::fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStorage")
            .field("record_count", &self.len())
            .finish()
    }
}
