//! Guest store abstraction trait
//!
//! This module defines the GuestStore trait that all guest-local backends implement.

use async_trait::async_trait;
use storybook_core::AppError;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid slot key: {0}")]
    InvalidKey(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Storage(err.to_string())
    }
}

/// Key/value store for JSON documents that must outlive a page session.
#[async_trait]
pub trait GuestStore: Send + Sync {
    /// Read a slot. Missing slots are `Ok(None)`.
    async fn get(&self, slot: &str) -> StorageResult<Option<serde_json::Value>>;

    /// Replace the contents of a slot.
    async fn put(&self, slot: &str, value: serde_json::Value) -> StorageResult<()>;

    /// Remove a slot. Removing a missing slot is not an error.
    async fn remove(&self, slot: &str) -> StorageResult<()>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}
