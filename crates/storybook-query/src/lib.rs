//! Storybook Query Library
//!
//! Client-side request cache keyed by resource + parameters. Provides request
//! deduplication, a staleness window with background refresh, and prefix
//! invalidation so mutations can force other views (cart badge) to refetch.

pub mod cache;
pub mod key;

pub use cache::{QueryClient, DEFAULT_CACHE_CAPACITY};
pub use key::QueryKey;
