//! In-memory record store
//!
//! Useful for testing and development. Can be switched into an
//! "unavailable" mode to exercise storage-failure handling.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{StoreKey, Timestamp};
use crate::ports::{stamp_record, RecordKind, RecordStore, StoreError};

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    records: Arc<RwLock<HashMap<(RecordKind, StoreKey), Value>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every call fails with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Writes a raw value without stamping (for seeding corrupt records).
    pub async fn put_raw(&self, kind: RecordKind, key: StoreKey, value: Value) {
        self.records.write().await.insert((kind, key), value);
    }

    pub async fn len(&self, kind: RecordKind) -> usize {
        self.records
            .read()
            .await
            .keys()
            .filter(|(k, _)| *k == kind)
            .count()
    }

    pub async fn clear(&self) {
        self.records.write().await.clear();
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("in-memory store switched off"));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn get(&self, kind: RecordKind, key: &StoreKey) -> Result<Option<Value>, StoreError> {
        self.check_available()?;
        Ok(self.records.read().await.get(&(kind, key.clone())).cloned())
    }

    async fn set(&self, kind: RecordKind, key: &StoreKey, record: Value) -> Result<Value, StoreError> {
        self.check_available()?;
        let mut records = self.records.write().await;
        let slot = (kind, key.clone());
        let stamped = stamp_record(records.get(&slot), record, Timestamp::now())?;
        records.insert(slot, stamped.clone());
        Ok(stamped)
    }

    async fn delete(&self, kind: RecordKind, key: &StoreKey) -> Result<(), StoreError> {
        self.check_available()?;
        self.records.write().await.remove(&(kind, key.clone()));
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
