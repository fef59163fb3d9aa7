//! Directory-backed store: one pretty-printed JSON file per message id.
//!
//! Layout: `<dir>/<id>.json`. Keys are written sorted with 4-space
//! indentation. Writes go to a sibling temp file first and are renamed into
//! place, so a crashed run never leaves a half-written record behind.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tokio::fs;
use tracing::{debug, info};

use super::Store;
use super::traits::check_key;
use crate::error::StoreError;
use crate::record::MessageRecord;

const RECORD_EXT: &str = "json";

/// File-per-record store rooted at a directory.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    /// Open a store at `dir`, creating the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        info!(path = %dir.display(), "Record store opened");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `id`.
    pub fn record_path(&self, id: &str) -> Result<PathBuf, StoreError> {
        validate_id(id)?;
        Ok(self.dir.join(format!("{id}.{RECORD_EXT}")))
    }
}

#[async_trait]
impl Store for JsonDirStore {
    async fn put(&self, id: &str, record: &MessageRecord) -> Result<(), StoreError> {
        let path = self.record_path(id)?;
        check_key(id, record)?;
        let tmp = self.dir.join(format!(".{id}.{RECORD_EXT}.tmp"));

        fs::write(&tmp, to_sorted_json(record)?).await?;
        fs::rename(&tmp, &path).await?;
        debug!(id = id, path = %path.display(), "Record written");
        Ok(())
    }

    async fn list_ids(&self) -> Result<Vec<String>, StoreError> {
        let mut ids = Vec::new();
        let mut read_dir = fs::read_dir(&self.dir).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXT) {
                continue;
            }
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if validate_id(stem).is_ok() {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    async fn get(&self, id: &str) -> Result<MessageRecord, StoreError> {
        let path = self.record_path(id)?;
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound { id: id.to_string() });
            }
            Err(e) => return Err(e.into()),
        };
        let record: MessageRecord =
            serde_json::from_str(&content).map_err(|source| StoreError::Parse { path, source })?;
        check_key(id, &record)?;
        Ok(record)
    }
}

/// Reject ids that would escape the directory or collide with temp files.
fn validate_id(id: &str) -> Result<(), StoreError> {
    let invalid = id.is_empty()
        || id.starts_with('.')
        || id.contains(['/', '\\', '\0']);
    if invalid {
        return Err(StoreError::InvalidId { id: id.to_string() });
    }
    Ok(())
}

/// Serialise with sorted keys and 4-space indentation.
fn to_sorted_json(record: &MessageRecord) -> Result<Vec<u8>, StoreError> {
    // serde_json's Map is a BTreeMap, so routing through Value sorts the keys.
    let value = serde_json::to_value(record)?;
    let mut out = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;
    out.push(b'\n');
    Ok(out)
}
