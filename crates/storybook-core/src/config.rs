//! Configuration module
//!
//! Storefront client settings: API location, session flag, guest store location,
//! cache staleness, debounce and upload timing, and photo limits.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::validation::{PhotoPolicy, ALLOWED_PHOTO_CONTENT_TYPES};

// Common constants
const DEFAULT_API_URL: &str = "http://localhost:8000/api";
const DEFAULT_GUEST_STORE_DIR: &str = ".storefront";
const HTTP_TIMEOUT_SECS: u64 = 30;
const QUERY_STALE_SECS: u64 = 300;
const SEARCH_DEBOUNCE_MS: u64 = 300;
const UPLOAD_HOLD_MS: u64 = 500;
const MAX_PHOTO_SIZE_MB: u64 = 10;

#[derive(Clone, Debug)]
pub struct StorefrontConfig {
    pub api_url: String,
    /// Presence of a token is the client-side "authenticated" flag.
    pub access_token: Option<String>,
    pub guest_store_dir: PathBuf,
    pub http_timeout: Duration,
    /// How long a cached query response is served without re-fetching.
    pub query_stale_time: Duration,
    pub search_debounce: Duration,
    /// How long the upload indicator stays at 100% before returning to idle.
    pub upload_complete_hold: Duration,
    pub photo_policy: PhotoPolicy,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            access_token: None,
            guest_store_dir: PathBuf::from(DEFAULT_GUEST_STORE_DIR),
            http_timeout: Duration::from_secs(HTTP_TIMEOUT_SECS),
            query_stale_time: Duration::from_secs(QUERY_STALE_SECS),
            search_debounce: Duration::from_millis(SEARCH_DEBOUNCE_MS),
            upload_complete_hold: Duration::from_millis(UPLOAD_HOLD_MS),
            photo_policy: PhotoPolicy::default(),
        }
    }
}

/// Convert the `MAX_PHOTO_SIZE_MB` setting to bytes.
fn photo_size_bytes(megabytes: u64) -> Result<u64, anyhow::Error> {
    megabytes
        .checked_mul(1024 * 1024)
        .ok_or_else(|| anyhow::anyhow!("MAX_PHOTO_SIZE_MB is too large: {}", megabytes))
}

impl StorefrontConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let api_url = env::var("STOREFRONT_API_URL")
            .or_else(|_| env::var("API_URL"))
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let access_token = env::var("STOREFRONT_ACCESS_TOKEN")
            .or_else(|_| env::var("ACCESS_TOKEN"))
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let max_photo_size_mb = env::var("MAX_PHOTO_SIZE_MB")
            .unwrap_or_else(|_| MAX_PHOTO_SIZE_MB.to_string())
            .parse::<u64>()
            .unwrap_or(MAX_PHOTO_SIZE_MB);

        let allowed_content_types = env::var("ALLOWED_PHOTO_CONTENT_TYPES")
            .unwrap_or_else(|_| ALLOWED_PHOTO_CONTENT_TYPES.join(","))
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        let config = StorefrontConfig {
            api_url: api_url.trim_end_matches('/').to_string(),
            access_token,
            guest_store_dir: env::var("STOREFRONT_GUEST_STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_GUEST_STORE_DIR)),
            http_timeout: Duration::from_secs(
                env::var("STOREFRONT_HTTP_TIMEOUT_SECS")
                    .unwrap_or_else(|_| HTTP_TIMEOUT_SECS.to_string())
                    .parse()
                    .unwrap_or(HTTP_TIMEOUT_SECS),
            ),
            query_stale_time: Duration::from_secs(
                env::var("STOREFRONT_QUERY_STALE_SECS")
                    .unwrap_or_else(|_| QUERY_STALE_SECS.to_string())
                    .parse()
                    .unwrap_or(QUERY_STALE_SECS),
            ),
            search_debounce: Duration::from_millis(
                env::var("STOREFRONT_SEARCH_DEBOUNCE_MS")
                    .unwrap_or_else(|_| SEARCH_DEBOUNCE_MS.to_string())
                    .parse()
                    .unwrap_or(SEARCH_DEBOUNCE_MS),
            ),
            upload_complete_hold: Duration::from_millis(
                env::var("STOREFRONT_UPLOAD_HOLD_MS")
                    .unwrap_or_else(|_| UPLOAD_HOLD_MS.to_string())
                    .parse()
                    .unwrap_or(UPLOAD_HOLD_MS),
            ),
            photo_policy: PhotoPolicy {
                max_size_bytes: photo_size_bytes(max_photo_size_mb)?,
                allowed_content_types,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(anyhow::anyhow!(
                "STOREFRONT_API_URL must be an http(s) URL, got '{}'",
                self.api_url
            ));
        }

        if self.photo_policy.max_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_PHOTO_SIZE_MB must be greater than 0"));
        }

        if self.photo_policy.allowed_content_types.is_empty() {
            return Err(anyhow::anyhow!(
                "ALLOWED_PHOTO_CONTENT_TYPES must list at least one MIME type"
            ));
        }

        if self.http_timeout.is_zero() {
            return Err(anyhow::anyhow!(
                "STOREFRONT_HTTP_TIMEOUT_SECS must be greater than 0"
            ));
        }

        Ok(())
    }

    /// Client-side heuristic: a stored token means "authenticated".
    pub fn has_access_token(&self) -> bool {
        self.access_token.is_some()
    }
}
