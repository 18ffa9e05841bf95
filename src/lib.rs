//! Agora-Harvest: a municipal event harvesting pipeline
//!
//! This crate collects candidate events from configured external sources
//! (open-data APIs and listing web pages), normalizes them into canonical
//! event records, deduplicates them against the persisted store, and writes
//! a per-source audit log for every collection run.

pub mod analyze;
pub mod collect;
pub mod config;
pub mod connector;
pub mod extract;
pub mod model;
pub mod normalize;
pub mod storage;

use thiserror::Error;

/// Main error type for Agora-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Source settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Vendor API error {code} for {url}: {message}")]
    VendorApi {
        url: String,
        code: String,
        message: String,
    },

    #[error("Unexpected payload shape for {url}: {message}")]
    PayloadShape { url: String, message: String },

    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Unknown region id: {0}")]
    UnknownRegion(i64),

    #[error("Page renderer error: {0}")]
    Render(String),

    #[error("Site analysis failed for {url}: {message}")]
    Analyze { url: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors from the per-source settings payload (opaque JSON on a descriptor)
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Malformed settings JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid settings: {0}")]
    Invalid(String),
}

/// Result type alias for Agora-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::AppConfig;
pub use model::{AgeRange, Category, RawEvent, SourceDescriptor, SourceKind, SourceSettings};
pub use storage::{RunStatus, SqliteStorage, Storage};
