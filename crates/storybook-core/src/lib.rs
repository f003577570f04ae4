//! Storybook Core Library
//!
//! This crate provides the domain models, error types, configuration, and validation
//! rules shared by every storefront component: the API client, the query cache,
//! the guest store and the personalization wizard.

pub mod config;
pub mod error;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::StorefrontConfig;
pub use error::{AppError, ErrorMetadata, LogLevel, ValidationError, ValidationErrors};
