//! Domain methods for the storefront API client.
//!
//! Each method performs exactly one REST call. No retries and no caching here;
//! caching is the query layer's job.

use crate::traits::ProgressCallback;
use crate::ApiClient;
use bytes::Bytes;
use futures::stream;
use storybook_core::models::{
    AddCartItemRequest, Book, BookPage, Cart, CartItem, CatalogFilters,
    CreatePersonalizationRequest, PersonalizationDraft, UpdateCartItemRequest,
    UpdatePersonalizationRequest, UploadPhotoResponse,
};
use storybook_core::AppError;

/// Size of the slices the photo body is streamed in; one progress tick per slice.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Photo bytes plus the metadata declared by the picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl PhotoUpload {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Slice the photo bytes into a stream that reports the share of bytes handed to
/// the transport as a 0-100 percentage.
fn progress_stream(
    data: Bytes,
    progress: Option<ProgressCallback>,
) -> impl futures::Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
    let total = data.len();
    let chunks: Vec<Bytes> = (0..total)
        .step_by(UPLOAD_CHUNK_SIZE)
        .map(|start| data.slice(start..(start + UPLOAD_CHUNK_SIZE).min(total)))
        .collect();

    let mut sent = 0usize;
    stream::iter(chunks.into_iter().map(move |chunk| {
        sent += chunk.len();
        if let Some(report) = &progress {
            report(((sent * 100) / total.max(1)).min(100) as u8);
        }
        Ok::<Bytes, std::io::Error>(chunk)
    }))
}

fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

impl ApiClient {
    /// List catalog books matching the filters (`GET /books`).
    pub async fn list_books(&self, filters: &CatalogFilters) -> Result<BookPage, AppError> {
        self.get("/books", &filters.to_query_params()).await
    }

    /// Book detail including its languages (`GET /books/{slug}`).
    pub async fn get_book(&self, slug: &str) -> Result<Book, AppError> {
        self.get(&format!("/books/{}", encode_segment(slug)), &[])
            .await
    }

    /// Create a new personalization draft (`POST /personalizations`).
    pub async fn create_personalization(
        &self,
        request: &CreatePersonalizationRequest,
    ) -> Result<PersonalizationDraft, AppError> {
        let draft: PersonalizationDraft = self.post_json("/personalizations", request).await?;
        tracing::debug!(personalization_id = %draft.id, status = %draft.status, "Personalization created");
        Ok(draft)
    }

    pub async fn get_personalization(&self, id: &str) -> Result<PersonalizationDraft, AppError> {
        self.get(&format!("/personalizations/{}", encode_segment(id)), &[])
            .await
    }

    /// Partial update of a draft (`PUT /personalizations/{id}`).
    pub async fn update_personalization(
        &self,
        id: &str,
        request: &UpdatePersonalizationRequest,
    ) -> Result<PersonalizationDraft, AppError> {
        self.put_json(&format!("/personalizations/{}", encode_segment(id)), request)
            .await
    }

    /// Upload the child's photo to an existing draft
    /// (`POST /personalizations/{id}/upload-photo`).
    pub async fn upload_photo(
        &self,
        id: &str,
        photo: PhotoUpload,
        progress: Option<ProgressCallback>,
    ) -> Result<UploadPhotoResponse, AppError> {
        let length = photo.size();
        let part = reqwest::multipart::Part::stream_with_length(
            reqwest::Body::wrap_stream(progress_stream(photo.bytes, progress)),
            length,
        )
        .file_name(photo.file_name)
        .mime_str(&photo.content_type)
        .map_err(|e| AppError::Transport(format!("Invalid content type: {}", e)))?;

        let form = reqwest::multipart::Form::new().part("photo", part);
        self.post_multipart(
            &format!("/personalizations/{}/upload-photo", encode_segment(id)),
            form,
        )
        .await
    }

    pub async fn get_cart(&self) -> Result<Cart, AppError> {
        self.get("/cart", &[]).await
    }

    /// Add a line item to the cart (`POST /cart/items`).
    pub async fn add_cart_item(&self, request: &AddCartItemRequest) -> Result<CartItem, AppError> {
        self.post_json("/cart/items", request).await
    }

    pub async fn update_cart_item(&self, item_id: &str, quantity: u32) -> Result<CartItem, AppError> {
        self.put_json(
            &format!("/cart/items/{}", encode_segment(item_id)),
            &UpdateCartItemRequest { quantity },
        )
        .await
    }

    pub async fn remove_cart_item(&self, item_id: &str) -> Result<(), AppError> {
        self.delete(&format!("/cart/items/{}", encode_segment(item_id)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::sync::{Arc, Mutex};

    #[test]
    fn photo_upload_reports_size() {
        let photo = PhotoUpload::new("a.png", "image/png", Bytes::from_static(b"12345"));
        assert_eq!(photo.size(), 5);
    }

    #[test]
    fn segments_are_percent_encoded() {
        assert_eq!(encode_segment("a b/c"), "a%20b%2Fc");
    }

    #[tokio::test]
    async fn progress_body_reports_monotonic_percentages() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback: ProgressCallback = Arc::new(move |pct| sink.lock().unwrap().push(pct));

        let data = Bytes::from(vec![0u8; UPLOAD_CHUNK_SIZE * 3 + 10]);
        let stream = progress_stream(data, Some(callback));
        futures::pin_mut!(stream);
        while let Some(chunk) = stream.next().await {
            chunk.unwrap();
        }

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*seen.last().unwrap(), 100);
    }
}
