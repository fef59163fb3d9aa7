//! Read path: load every stored record back into memory.

use tracing::debug;

use crate::error::Result;
use crate::record::MessageRecord;
use crate::store::Store;

/// Load all records in the store's enumeration order.
///
/// The first record that cannot be read or parsed aborts the load.
pub async fn load_all(store: &dyn Store) -> Result<Vec<MessageRecord>> {
    let ids = store.list_ids().await?;
    let mut records = Vec::with_capacity(ids.len());
    for id in &ids {
        records.push(store.get(id).await?);
    }
    debug!(count = records.len(), "Loaded stored records");
    Ok(records)
}
