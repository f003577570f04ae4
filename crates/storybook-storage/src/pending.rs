//! Typed access to the well-known guest slots.

use crate::keys::{GUEST_SESSION_SLOT, PENDING_PERSONALIZATION_SLOT};
use crate::traits::{GuestStore, StorageResult};
use storybook_core::models::PendingPersonalization;
use uuid::Uuid;

/// Persist the guest's draft payload (including inline photo data).
pub async fn save_pending_personalization(
    store: &dyn GuestStore,
    pending: &PendingPersonalization,
) -> StorageResult<()> {
    store
        .put(PENDING_PERSONALIZATION_SLOT, serde_json::to_value(pending)?)
        .await
}

pub async fn load_pending_personalization(
    store: &dyn GuestStore,
) -> StorageResult<Option<PendingPersonalization>> {
    match store.get(PENDING_PERSONALIZATION_SLOT).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

pub async fn clear_pending_personalization(store: &dyn GuestStore) -> StorageResult<()> {
    store.remove(PENDING_PERSONALIZATION_SLOT).await
}

/// Guest session id, created and persisted on first use.
pub async fn guest_session_id(store: &dyn GuestStore) -> StorageResult<String> {
    if let Some(serde_json::Value::String(id)) = store.get(GUEST_SESSION_SLOT).await? {
        if !id.is_empty() {
            return Ok(id);
        }
    }

    let id = Uuid::new_v4().to_string();
    store
        .put(GUEST_SESSION_SLOT, serde_json::Value::String(id.clone()))
        .await?;
    tracing::info!("Created new guest session");
    Ok(id)
}
