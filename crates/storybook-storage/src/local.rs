use crate::keys::validate_slot;
use crate::traits::{GuestStore, StorageError, StorageResult};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// File-backed guest store: one `<slot>.json` document per slot.
#[derive(Clone, Debug)]
pub struct FileGuestStore {
    base_path: PathBuf,
}

impl FileGuestStore {
    /// Create a new FileGuestStore, creating the directory if needed.
    ///
    /// # Arguments
    /// * `base_path` - Directory for slot files (e.g., ".storefront")
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create guest store directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(FileGuestStore { base_path })
    }

    pub fn base_path(&self) -> &std::path::Path {
        &self.base_path
    }

    fn slot_path(&self, slot: &str) -> StorageResult<PathBuf> {
        validate_slot(slot)?;
        Ok(self.base_path.join(format!("{}.json", slot)))
    }
}

#[async_trait]
impl GuestStore for FileGuestStore {
    async fn get(&self, slot: &str) -> StorageResult<Option<serde_json::Value>> {
        let path = self.slot_path(slot)?;
        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice(&data) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                // A corrupt slot should not block the flow; treat it as empty.
                tracing::warn!(slot = %slot, error = %e, "Discarding unreadable guest slot");
                Ok(None)
            }
        }
    }

    async fn put(&self, slot: &str, value: serde_json::Value) -> StorageResult<()> {
        let path = self.slot_path(slot)?;
        let tmp_path = self.base_path.join(format!(".{}.json.tmp", slot));
        let data = serde_json::to_vec(&value)?;

        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(&data).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&tmp_path, &path).await?;
        tracing::debug!(slot = %slot, bytes = data.len(), "Guest slot written");
        Ok(())
    }

    async fn remove(&self, slot: &str) -> StorageResult<()> {
        let path = self.slot_path(slot)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
