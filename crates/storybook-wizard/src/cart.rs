//! Cart access through the shared query cache.
//!
//! Reads go through the `cart` query; every mutation invalidates it so other
//! views (e.g. the header badge) refetch.

use std::sync::Arc;
use storybook_api_client::StorefrontApi;
use storybook_core::models::{Cart, CartItem};
use storybook_core::{AppError, ValidationError};
use storybook_query::{QueryClient, QueryKey};

#[derive(Clone)]
pub struct CartService {
    api: Arc<dyn StorefrontApi>,
    queries: QueryClient,
}

impl CartService {
    pub fn new(api: Arc<dyn StorefrontApi>, queries: QueryClient) -> Self {
        Self { api, queries }
    }

    pub async fn cart(&self) -> Result<Cart, AppError> {
        let api = self.api.clone();
        self.queries
            .fetch(QueryKey::cart(), move || async move { api.get_cart().await })
            .await
    }

    /// Number of books in the cart.
    pub async fn item_count(&self) -> Result<u32, AppError> {
        Ok(self.cart().await?.item_count())
    }

    pub async fn update_quantity(&self, item_id: &str, quantity: u32) -> Result<CartItem, AppError> {
        if quantity == 0 {
            return Err(ValidationError::field("quantity", "Quantity must be at least 1").into());
        }
        let item = self.api.update_cart_item(item_id, quantity).await?;
        self.queries.invalidate("cart");
        tracing::info!(cart_item_id = %item_id, quantity, "Cart item updated");
        Ok(item)
    }

    pub async fn remove_item(&self, item_id: &str) -> Result<(), AppError> {
        self.api.remove_cart_item(item_id).await?;
        self.queries.invalidate("cart");
        tracing::info!(cart_item_id = %item_id, "Cart item removed");
        Ok(())
    }
}
