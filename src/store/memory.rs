//! In-memory store for tests and in-process pipelines.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::Store;
use super::traits::check_key;
use crate::error::StoreError;
use crate::record::MessageRecord;

/// Records held in a sorted map; `list_ids` is in id order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<String, MessageRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn put(&self, id: &str, record: &MessageRecord) -> Result<(), StoreError> {
        check_key(id, record)?;
        self.records
            .write()
            .await
            .insert(id.to_string(), record.clone());
        Ok(())
    }

    async fn list_ids(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.records.read().await.keys().cloned().collect())
    }

    async fn get(&self, id: &str) -> Result<MessageRecord, StoreError> {
        self.records
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }
}
