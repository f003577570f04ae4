//! Guest store factory

use crate::local::FileGuestStore;
use crate::traits::{GuestStore, StorageResult};
use std::sync::Arc;
use storybook_core::StorefrontConfig;

/// Create the guest store configured by `STOREFRONT_GUEST_STORE_DIR`.
pub async fn create_guest_store(config: &StorefrontConfig) -> StorageResult<Arc<dyn GuestStore>> {
    let store = FileGuestStore::new(&config.guest_store_dir).await?;
    tracing::debug!(path = %config.guest_store_dir.display(), "Guest store ready");
    Ok(Arc::new(store))
}
