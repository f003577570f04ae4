use crate::keys::validate_slot;
use crate::traits::{GuestStore, StorageResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-process guest store. Contents are lost when the process exits.
#[derive(Clone, Debug, Default)]
pub struct MemoryGuestStore {
    slots: Arc<RwLock<HashMap<String, serde_json::Value>>>,
    writes: Arc<std::sync::atomic::AtomicUsize>,
}

impl MemoryGuestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `put` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl GuestStore for MemoryGuestStore {
    async fn get(&self, slot: &str) -> StorageResult<Option<serde_json::Value>> {
        validate_slot(slot)?;
        Ok(self.slots.read().await.get(slot).cloned())
    }

    async fn put(&self, slot: &str, value: serde_json::Value) -> StorageResult<()> {
        validate_slot(slot)?;
        self.slots.write().await.insert(slot.to_string(), value);
        self.writes
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }

    async fn remove(&self, slot: &str) -> StorageResult<()> {
        validate_slot(slot)?;
        self.slots.write().await.remove(slot);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
