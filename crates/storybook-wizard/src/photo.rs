//! Photo capture state
//!
//! A selected photo is tracked as two independent pieces:
//! - a local preview handle, released when replaced or removed
//! - an artifact that will be referenced by the draft: inline bytes (carried as a
//!   `data:` URL until a draft exists) or a remote URL
//!
//! Upload progress is a separate [`UploadStatus`].

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use storybook_api_client::PhotoUpload;
use storybook_core::validation::{validate_photo_file, PhotoPolicy};
use storybook_core::ValidationError;

#[derive(Debug, Default)]
struct RegistryState {
    next_id: u64,
    live: HashSet<u64>,
}

/// Hands out local preview handles and tracks which ones are still alive.
#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, photo: &PhotoUpload) -> PreviewHandle {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state.next_id += 1;
        let id = state.next_id;
        state.live.insert(id);

        PreviewHandle {
            id,
            url: format!("blob:preview/{}/{}", id, photo.file_name),
            registry: self.state.clone(),
        }
    }

    /// Number of handles that have not been released.
    pub fn live_count(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .live
            .len()
    }
}

/// Local, revocable preview of a selected photo. Released on drop.
#[derive(Debug)]
pub struct PreviewHandle {
    id: u64,
    url: String,
    registry: Arc<Mutex<RegistryState>>,
}

impl PreviewHandle {
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        let mut state = self
            .registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state.live.remove(&self.id);
        tracing::trace!(preview_id = self.id, "Photo preview released");
    }
}

/// What the draft's `childPhotoUrl` will point at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoArtifact {
    /// Bytes not uploaded yet, represented as a `data:` URL.
    Inline(PhotoUpload),
    Remote(String),
}

impl PhotoArtifact {
    /// Parse a stored photo URL back into an artifact.
    pub fn from_url(url: &str) -> Result<Self, ValidationError> {
        if url.starts_with("data:") {
            return parse_data_url(url)
                .map(PhotoArtifact::Inline)
                .ok_or_else(|| ValidationError::InvalidPhotoUrl("Malformed inline photo".to_string()));
        }
        parse_remote_url(url).map(PhotoArtifact::Remote)
    }

    pub fn url(&self) -> String {
        match self {
            PhotoArtifact::Inline(photo) => to_data_url(photo),
            PhotoArtifact::Remote(url) => url.clone(),
        }
    }

    pub fn as_inline(&self) -> Option<&PhotoUpload> {
        match self {
            PhotoArtifact::Inline(photo) => Some(photo),
            PhotoArtifact::Remote(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UploadStatus {
    #[default]
    Idle,
    /// Percentage of bytes sent, 0-99 until the server acknowledges.
    Uploading(u8),
    /// Shown briefly after the server acknowledged the upload.
    Complete,
}

/// Photo half of the child-info form.
#[derive(Debug, Default)]
pub struct PhotoState {
    preview: Option<PreviewHandle>,
    artifact: Option<PhotoArtifact>,
    status: UploadStatus,
}

impl PhotoState {
    pub fn preview_url(&self) -> Option<String> {
        match (&self.preview, &self.artifact) {
            (Some(handle), _) => Some(handle.url().to_string()),
            (None, Some(PhotoArtifact::Remote(url))) => Some(url.clone()),
            _ => None,
        }
    }

    pub fn artifact(&self) -> Option<&PhotoArtifact> {
        self.artifact.as_ref()
    }

    /// URL to submit as `childPhotoUrl`. None while an upload is in flight.
    pub fn photo_url(&self) -> Option<String> {
        self.artifact.as_ref().map(PhotoArtifact::url)
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn is_uploading(&self) -> bool {
        matches!(self.status, UploadStatus::Uploading(_))
    }

    pub fn clear(&mut self) {
        self.preview = None;
        self.artifact = None;
        self.status = UploadStatus::Idle;
    }

    /// Keep the photo locally as inline bytes.
    pub fn set_inline(&mut self, preview: PreviewHandle, photo: PhotoUpload) {
        self.preview = Some(preview);
        self.artifact = Some(PhotoArtifact::Inline(photo));
        self.status = UploadStatus::Idle;
    }

    pub fn set_remote(&mut self, url: String) {
        self.preview = None;
        self.artifact = Some(PhotoArtifact::Remote(url));
        self.status = UploadStatus::Idle;
    }

    /// Show the preview immediately while the bytes go to the server.
    pub fn begin_upload(&mut self, preview: PreviewHandle) {
        self.preview = Some(preview);
        self.artifact = None;
        self.status = UploadStatus::Uploading(0);
    }

    /// Record upload progress. Never moves backwards and stays below 100 until
    /// [`complete_upload`](Self::complete_upload).
    pub fn report_progress(&mut self, percent: u8) {
        if let UploadStatus::Uploading(current) = self.status {
            self.status = UploadStatus::Uploading(current.max(percent.min(99)));
        }
    }

    pub fn complete_upload(&mut self, url: String) {
        self.artifact = Some(PhotoArtifact::Remote(url));
        self.status = UploadStatus::Complete;
    }

    /// Return to idle after the completion hold. No-op if something else happened
    /// to the photo in the meantime.
    pub fn finish_hold(&mut self) {
        if self.status == UploadStatus::Complete {
            self.status = UploadStatus::Idle;
        }
    }

    /// Reset to a previously submitted photo URL, re-priming the preview.
    pub fn rehydrate(&mut self, url: &str, registry: &PreviewRegistry) {
        match PhotoArtifact::from_url(url) {
            Ok(PhotoArtifact::Inline(photo)) => {
                let preview = registry.create(&photo);
                self.set_inline(preview, photo);
            }
            Ok(PhotoArtifact::Remote(url)) => self.set_remote(url),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unusable photo while restoring form");
                self.clear();
            }
        }
    }
}

pub fn validate_photo(photo: &PhotoUpload, policy: &PhotoPolicy) -> Result<(), ValidationError> {
    validate_photo_file(&photo.content_type, photo.size(), policy)
}

/// Encode photo bytes as `data:<mime>;base64,<payload>`.
pub fn to_data_url(photo: &PhotoUpload) -> String {
    format!(
        "data:{};base64,{}",
        photo.content_type,
        STANDARD.encode(&photo.bytes)
    )
}

fn parse_data_url(url: &str) -> Option<PhotoUpload> {
    let rest = url.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let content_type = meta.strip_suffix(";base64")?;
    let bytes = STANDARD.decode(payload.trim()).ok()?;

    let extension = match content_type.rsplit('/').next() {
        Some("jpeg") | None => "jpg",
        Some(other) => other,
    };
    Some(PhotoUpload::new(
        format!("photo.{}", extension),
        content_type,
        Bytes::from(bytes),
    ))
}

/// Accept a pasted photo URL: absolute http(s) with a host.
pub fn parse_remote_url(url: &str) -> Result<String, ValidationError> {
    let trimmed = url.trim();
    let parsed = reqwest::Url::parse(trimmed)
        .map_err(|e| ValidationError::InvalidPhotoUrl(format!("Invalid URL format: {}", e)))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ValidationError::InvalidPhotoUrl(
            "URL must start with http:// or https://".to_string(),
        ));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(ValidationError::InvalidPhotoUrl(
            "URL must have a host".to_string(),
        ));
    }

    Ok(parsed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(len: usize) -> PhotoUpload {
        PhotoUpload::new("mia.png", "image/png", Bytes::from(vec![1u8; len]))
    }

    #[test]
    fn preview_handles_are_released_on_drop() {
        let registry = PreviewRegistry::new();
        let first = registry.create(&png(4));
        let second = registry.create(&png(4));
        assert_eq!(registry.live_count(), 2);
        assert_ne!(first.url(), second.url());

        drop(first);
        assert_eq!(registry.live_count(), 1);
        drop(second);
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn replacing_photo_releases_previous_preview() {
        let registry = PreviewRegistry::new();
        let mut state = PhotoState::default();

        state.set_inline(registry.create(&png(4)), png(4));
        state.set_inline(registry.create(&png(8)), png(8));
        assert_eq!(registry.live_count(), 1);

        state.clear();
        assert_eq!(registry.live_count(), 0);
        assert!(state.photo_url().is_none());
    }

    #[test]
    fn data_url_round_trips_bytes_and_type() {
        let photo = PhotoUpload::new("x.webp", "image/webp", Bytes::from_static(b"\x00\x01hello"));
        let url = to_data_url(&photo);
        assert!(url.starts_with("data:image/webp;base64,"));

        match PhotoArtifact::from_url(&url).unwrap() {
            PhotoArtifact::Inline(decoded) => {
                assert_eq!(decoded.bytes, photo.bytes);
                assert_eq!(decoded.content_type, "image/webp");
                assert_eq!(decoded.file_name, "photo.webp");
            }
            other => panic!("expected inline artifact, got {:?}", other),
        }
    }

    #[test]
    fn remote_urls_must_be_http() {
        assert!(parse_remote_url("https://cdn.example.com/mia.png").is_ok());
        assert!(matches!(
            parse_remote_url("ftp://cdn.example.com/mia.png"),
            Err(ValidationError::InvalidPhotoUrl(_))
        ));
        assert!(parse_remote_url("not a url").is_err());
        assert!(PhotoArtifact::from_url("data:image/png;base64").is_err());
    }

    #[test]
    fn progress_is_monotonic_and_capped_until_acknowledged() {
        let registry = PreviewRegistry::new();
        let mut state = PhotoState::default();
        state.begin_upload(registry.create(&png(4)));
        assert!(state.photo_url().is_none());

        state.report_progress(40);
        state.report_progress(20);
        assert_eq!(state.status(), UploadStatus::Uploading(40));
        state.report_progress(100);
        assert_eq!(state.status(), UploadStatus::Uploading(99));

        state.complete_upload("https://cdn.example.com/p.png".to_string());
        assert_eq!(state.status(), UploadStatus::Complete);
        state.finish_hold();
        assert_eq!(state.status(), UploadStatus::Idle);
        assert_eq!(state.photo_url().as_deref(), Some("https://cdn.example.com/p.png"));
        // Local preview stays while the remote artifact is adopted.
        assert!(state.preview_url().unwrap().starts_with("blob:preview/"));
    }

    #[test]
    fn size_boundary_is_inclusive() {
        let policy = PhotoPolicy::default();
        let max = policy.max_size_bytes as usize;
        assert!(validate_photo(&png(max), &policy).is_ok());
        let err = validate_photo(&png(max + 1), &policy).unwrap_err();
        assert_eq!(err.reason(), "file-too-large");
    }
}
