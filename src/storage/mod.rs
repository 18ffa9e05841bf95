//! Storage module for the persisted event store
//!
//! Handles all database operations for the pipeline: the region/source
//! catalog, persisted events with their deduplication identity, and the
//! append-only collection run log.

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use chrono::NaiveDateTime;

use crate::config::AppConfig;
use crate::model::Category;

/// A region row
#[derive(Debug, Clone)]
pub struct RegionRecord {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub enabled: bool,
}

/// A persisted event row
#[derive(Debug, Clone)]
pub struct EventRecord {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub start_at: NaiveDateTime,
    pub end_at: Option<NaiveDateTime>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub location: Option<String>,
    pub address: Option<String>,
    pub age_min: u32,
    pub age_max: u32,
    /// JSON array of target-group tags
    pub target_groups: Option<String>,
    pub is_free: bool,
    pub fee: Option<String>,
    pub origin_url: String,
    pub registration_url: Option<String>,
    pub image_url: Option<String>,
    pub category: Category,
    pub organizer: Option<String>,
    pub contact: Option<String>,
    pub region_id: i64,
    pub source_id: Option<i64>,
    pub view_count: i64,
    pub active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub synced_at: Option<NaiveDateTime>,
}

/// Fields for a new source row
#[derive(Debug, Clone)]
pub struct NewSource {
    pub name: String,
    pub kind: crate::model::SourceKind,
    pub url: String,
    pub region_id: i64,
    pub enabled: bool,
    pub settings: String,
}

/// Outcome of one collection run against one source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Fields for a new collection log row
#[derive(Debug, Clone)]
pub struct NewRunLog {
    pub source_id: i64,
    pub status: RunStatus,
    pub collected: u32,
    pub added: u32,
    pub updated: u32,
    pub error_message: Option<String>,
    pub started_at: NaiveDateTime,
    pub completed_at: NaiveDateTime,
}

/// A collection log row, joined with its source name for display
#[derive(Debug, Clone)]
pub struct RunLogRecord {
    pub id: i64,
    pub source_id: i64,
    pub source_name: String,
    pub status: RunStatus,
    pub collected: u32,
    pub added: u32,
    pub updated: u32,
    pub error_message: Option<String>,
    pub started_at: NaiveDateTime,
    pub completed_at: NaiveDateTime,
}

/// Seeds the region/source catalog from the app configuration
///
/// Regions are upserted by code. Sources are inserted only when absent by
/// name: descriptors are edited through the administrative surface, so an
/// existing row wins over the config file.
pub fn sync_catalog<S: Storage>(storage: &mut S, config: &AppConfig) -> StorageResult<()> {
    for region in &config.regions {
        storage.upsert_region(&region.name, &region.code, region.enabled)?;
    }

    for entry in &config.sources {
        if storage.get_source_by_name(&entry.name)?.is_some() {
            continue;
        }
        let region = storage
            .get_region_by_code(&entry.region)?
            .ok_or_else(|| StorageError::RegionNotFound(entry.region.clone()))?;
        let id = storage.insert_source(&NewSource {
            name: entry.name.clone(),
            kind: entry.kind,
            url: entry.url.clone(),
            region_id: region.id,
            enabled: entry.enabled,
            settings: entry.settings_json(),
        })?;
        tracing::info!("Seeded source '{}' (id {})", entry.name, id);
    }

    Ok(())
}
