//! Catalog listing
//!
//! Filter state is mirrored into a URL query string so listings can be shared and
//! restored. Search input is debounced before it reaches the API.

use std::sync::Arc;
use std::time::Duration;
use storybook_api_client::StorefrontApi;
use storybook_core::models::{BookPage, CatalogFilters};
use storybook_core::{AppError, StorefrontConfig};
use storybook_query::{QueryClient, QueryKey};
use tokio::sync::mpsc;

pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

pub struct Catalog {
    api: Arc<dyn StorefrontApi>,
    queries: QueryClient,
    filters: CatalogFilters,
    search_debounce: Duration,
}

impl Catalog {
    pub fn new(api: Arc<dyn StorefrontApi>, queries: QueryClient) -> Self {
        Self::with_filters(api, queries, CatalogFilters::default())
    }

    pub fn with_filters(
        api: Arc<dyn StorefrontApi>,
        queries: QueryClient,
        filters: CatalogFilters,
    ) -> Self {
        Self {
            api,
            queries,
            filters,
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
        }
    }

    pub fn from_config(
        api: Arc<dyn StorefrontApi>,
        queries: QueryClient,
        config: &StorefrontConfig,
    ) -> Self {
        Self::new(api, queries).with_search_debounce(config.search_debounce)
    }

    pub fn with_search_debounce(mut self, window: Duration) -> Self {
        self.search_debounce = window;
        self
    }

    /// Restore a listing from its URL query string.
    pub fn from_url_query(api: Arc<dyn StorefrontApi>, queries: QueryClient, query: &str) -> Self {
        Self::with_filters(api, queries, CatalogFilters::from_url_query(query))
    }

    pub fn filters(&self) -> &CatalogFilters {
        &self.filters
    }

    /// Mutable filters. The setters on [`CatalogFilters`] reset the page.
    pub fn filters_mut(&mut self) -> &mut CatalogFilters {
        &mut self.filters
    }

    pub fn url_query(&self) -> String {
        self.filters.to_url_query()
    }

    /// Current page of books, served from the query cache when fresh.
    pub async fn load(&self) -> Result<BookPage, AppError> {
        let api = self.api.clone();
        let filters = self.filters.clone();
        self.queries
            .fetch(QueryKey::books(&self.filters), move || async move {
                api.list_books(&filters).await
            })
            .await
    }

    /// Drive the listing from search-box input.
    ///
    /// Keystrokes are debounced; each settled search text resets the page and
    /// yields one listing result. The task ends when either side closes.
    pub fn watch_search(
        mut self,
        input: mpsc::Receiver<String>,
    ) -> mpsc::Receiver<Result<BookPage, AppError>> {
        let (tx, rx) = mpsc::channel(4);
        let mut settled = debounce(self.search_debounce, input);
        tokio::spawn(async move {
            while let Some(text) = settled.recv().await {
                self.filters.set_search(Some(text));
                tracing::debug!(query = %self.url_query(), "Catalog search settled");
                let result = self.load().await;
                if tx.send(result).await.is_err() {
                    return;
                }
            }
        });
        rx
    }
}

/// Forward the latest value from `input` once it has been quiet for `window`.
///
/// Values superseded within the window are dropped. A pending value is flushed
/// when the input closes.
pub fn debounce<T>(window: Duration, mut input: mpsc::Receiver<T>) -> mpsc::Receiver<T>
where
    T: Send + 'static,
{
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        while let Some(mut latest) = input.recv().await {
            loop {
                tokio::select! {
                    next = input.recv() => match next {
                        Some(value) => latest = value,
                        None => {
                            let _ = tx.send(latest).await;
                            return;
                        }
                    },
                    _ = tokio::time::sleep(window) => break,
                }
            }
            if tx.send(latest).await.is_err() {
                return;
            }
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn emits_only_the_latest_value_after_quiet_period() {
        let (tx, rx) = mpsc::channel(8);
        let mut out = debounce(Duration::from_millis(300), rx);
        let start = Instant::now();

        tx.send("s".to_string()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send("sp".to_string()).await.unwrap();
        tx.send("space".to_string()).await.unwrap();

        assert_eq!(out.recv().await.as_deref(), Some("space"));
        assert!(start.elapsed() >= Duration::from_millis(400));

        drop(tx);
        assert_eq!(out.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn separate_bursts_are_emitted_separately() {
        let (tx, rx) = mpsc::channel(8);
        let mut out = debounce(Duration::from_millis(300), rx);

        tx.send(1u32).await.unwrap();
        assert_eq!(out.recv().await, Some(1));
        tx.send(2).await.unwrap();
        assert_eq!(out.recv().await, Some(2));
    }
}
