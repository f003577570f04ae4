//! Storefront API abstraction trait
//!
//! The wizard and the CLI talk to the backend through [`StorefrontApi`] so the
//! reconciliation logic can run against any implementation, including recording
//! fakes in tests.

use crate::api::PhotoUpload;
use crate::ApiClient;
use async_trait::async_trait;
use std::sync::Arc;
use storybook_core::models::{
    AddCartItemRequest, Book, BookPage, Cart, CartItem, CatalogFilters,
    CreatePersonalizationRequest, PersonalizationDraft, UpdatePersonalizationRequest,
    UploadPhotoResponse,
};
use storybook_core::AppError;

/// Receives upload progress as a percentage of bytes sent (0-100).
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

#[async_trait]
pub trait StorefrontApi: Send + Sync {
    async fn list_books(&self, filters: &CatalogFilters) -> Result<BookPage, AppError>;

    async fn get_book(&self, slug: &str) -> Result<Book, AppError>;

    async fn create_personalization(
        &self,
        request: &CreatePersonalizationRequest,
    ) -> Result<PersonalizationDraft, AppError>;

    async fn get_personalization(&self, id: &str) -> Result<PersonalizationDraft, AppError>;

    async fn update_personalization(
        &self,
        id: &str,
        request: &UpdatePersonalizationRequest,
    ) -> Result<PersonalizationDraft, AppError>;

    async fn upload_photo(
        &self,
        id: &str,
        photo: PhotoUpload,
        progress: Option<ProgressCallback>,
    ) -> Result<UploadPhotoResponse, AppError>;

    async fn get_cart(&self) -> Result<Cart, AppError>;

    async fn add_cart_item(&self, request: &AddCartItemRequest) -> Result<CartItem, AppError>;

    async fn update_cart_item(&self, item_id: &str, quantity: u32) -> Result<CartItem, AppError>;

    async fn remove_cart_item(&self, item_id: &str) -> Result<(), AppError>;
}

#[async_trait]
impl StorefrontApi for ApiClient {
    async fn list_books(&self, filters: &CatalogFilters) -> Result<BookPage, AppError> {
        ApiClient::list_books(self, filters).await
    }

    async fn get_book(&self, slug: &str) -> Result<Book, AppError> {
        ApiClient::get_book(self, slug).await
    }

    async fn create_personalization(
        &self,
        request: &CreatePersonalizationRequest,
    ) -> Result<PersonalizationDraft, AppError> {
        ApiClient::create_personalization(self, request).await
    }

    async fn get_personalization(&self, id: &str) -> Result<PersonalizationDraft, AppError> {
        ApiClient::get_personalization(self, id).await
    }

    async fn update_personalization(
        &self,
        id: &str,
        request: &UpdatePersonalizationRequest,
    ) -> Result<PersonalizationDraft, AppError> {
        ApiClient::update_personalization(self, id, request).await
    }

    async fn upload_photo(
        &self,
        id: &str,
        photo: PhotoUpload,
        progress: Option<ProgressCallback>,
    ) -> Result<UploadPhotoResponse, AppError> {
        ApiClient::upload_photo(self, id, photo, progress).await
    }

    async fn get_cart(&self) -> Result<Cart, AppError> {
        ApiClient::get_cart(self).await
    }

    async fn add_cart_item(&self, request: &AddCartItemRequest) -> Result<CartItem, AppError> {
        ApiClient::add_cart_item(self, request).await
    }

    async fn update_cart_item(&self, item_id: &str, quantity: u32) -> Result<CartItem, AppError> {
        ApiClient::update_cart_item(self, item_id, quantity).await
    }

    async fn remove_cart_item(&self, item_id: &str) -> Result<(), AppError> {
        ApiClient::remove_cart_item(self, item_id).await
    }
}
