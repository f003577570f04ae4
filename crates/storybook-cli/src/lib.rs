//! Shared setup for the `storybook` binary.

use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use storybook_api_client::{ApiClient, PhotoUpload, StorefrontApi};
use storybook_core::StorefrontConfig;
use storybook_query::QueryClient;
use storybook_storage::{create_guest_store, guest_session_id, GuestStore};
use storybook_wizard::{StaticAuth, Wizard};

/// Everything a command needs to talk to the storefront.
pub struct Storefront {
    pub config: StorefrontConfig,
    pub api: Arc<dyn StorefrontApi>,
    pub queries: QueryClient,
    pub guest_store: Arc<dyn GuestStore>,
}

impl Storefront {
    /// Build from environment. Guests get a persistent session id for cart calls.
    pub async fn connect() -> anyhow::Result<Self> {
        let config = StorefrontConfig::from_env().context("Invalid storefront configuration")?;
        let guest_store = create_guest_store(&config)
            .await
            .context("Failed to open guest store")?;

        let guest_session = if config.has_access_token() {
            None
        } else {
            Some(
                guest_session_id(guest_store.as_ref())
                    .await
                    .context("Failed to load guest session")?,
            )
        };

        let client = ApiClient::from_config(&config, guest_session)?;
        tracing::debug!(api_url = %client.base_url(), authenticated = config.has_access_token(), "Storefront client ready");

        Ok(Self {
            queries: QueryClient::from_config(&config),
            api: Arc::new(client),
            guest_store,
            config,
        })
    }

    pub fn wizard(&self) -> Wizard {
        Wizard::new(
            self.api.clone(),
            self.queries.clone(),
            self.guest_store.clone(),
            Arc::new(StaticAuth::from_config(&self.config)),
        )
        .with_config(&self.config)
    }
}

/// Declared content type for a photo file, by extension.
pub fn content_type_for_path(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

pub fn is_remote(photo: &str) -> bool {
    photo.starts_with("http://") || photo.starts_with("https://")
}

/// Read a photo file. Unknown extensions are sent as `application/octet-stream`
/// and rejected by photo validation.
pub async fn load_photo(path: &Path) -> anyhow::Result<PhotoUpload> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read photo {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("photo")
        .to_string();
    let content_type = content_type_for_path(path).unwrap_or("application/octet-stream");
    Ok(PhotoUpload::new(file_name, content_type, bytes.into()))
}

/// Initialize tracing for the CLI.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type_for_path(Path::new("mia.JPG")), Some("image/jpeg"));
        assert_eq!(content_type_for_path(Path::new("mia.webp")), Some("image/webp"));
        assert_eq!(content_type_for_path(Path::new("mia.gif")), None);
        assert_eq!(content_type_for_path(Path::new("mia")), None);
    }

    #[test]
    fn remote_photos_are_detected() {
        assert!(is_remote("https://cdn.example.com/mia.png"));
        assert!(!is_remote("./mia.png"));
    }

    #[tokio::test]
    async fn load_photo_reads_bytes_and_type() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mia.png");
        std::fs::write(&path, b"\x89PNG").unwrap();

        let photo = load_photo(&path).await.unwrap();
        assert_eq!(photo.file_name, "mia.png");
        assert_eq!(photo.content_type, "image/png");
        assert_eq!(photo.size(), 4);
    }
}
