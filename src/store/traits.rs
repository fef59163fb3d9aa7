//! `Store` trait: backend-agnostic record persistence.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::record::MessageRecord;

/// Key-value store of message records, keyed by message id.
///
/// The fetch loop only writes and the loader only reads; backings need no
/// cross-call transactions.
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert or overwrite the record stored under `id`.
    ///
    /// `record.id` must equal `id`; otherwise `StoreError::KeyMismatch`.
    async fn put(&self, id: &str, record: &MessageRecord) -> Result<(), StoreError>;

    /// Every stored id, in the backing's enumeration order.
    async fn list_ids(&self) -> Result<Vec<String>, StoreError>;

    /// Fetch one record. A missing id is `StoreError::NotFound`.
    async fn get(&self, id: &str) -> Result<MessageRecord, StoreError>;
}

/// A record is only ever stored under its own id.
pub(crate) fn check_key(key: &str, record: &MessageRecord) -> Result<(), StoreError> {
    if record.id != key {
        return Err(StoreError::KeyMismatch {
            key: key.to_string(),
            record_id: record.id.clone(),
        });
    }
    Ok(())
}
