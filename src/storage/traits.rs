//! Storage trait and error types

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::model::{RawEvent, SourceDescriptor};
use crate::storage::{EventRecord, NewRunLog, NewSource, RegionRecord, RunLogRecord};

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Region not found: {0}")]
    RegionNotFound(String),

    #[error("Source not found: {0}")]
    SourceNotFound(String),

    #[error("Event not found: {0}")]
    EventNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Defines all database operations needed by the pipeline. The merger's
/// identity lookup and the subsequent write are two separate calls; nothing
/// here makes that sequence atomic across concurrent runs.
pub trait Storage {
    // ===== Regions =====

    /// Inserts or updates a region by code, returning its id
    fn upsert_region(&mut self, name: &str, code: &str, enabled: bool) -> StorageResult<i64>;

    /// Gets a region by id
    fn get_region(&self, id: i64) -> StorageResult<RegionRecord>;

    /// Gets a region by its stable code
    fn get_region_by_code(&self, code: &str) -> StorageResult<Option<RegionRecord>>;

    /// Lists all regions
    fn list_regions(&self) -> StorageResult<Vec<RegionRecord>>;

    // ===== Sources =====

    /// Inserts a new source descriptor, returning its id
    fn insert_source(&mut self, source: &NewSource) -> StorageResult<i64>;

    /// Gets a source by id
    fn get_source(&self, id: i64) -> StorageResult<SourceDescriptor>;

    /// Gets a source by its unique name
    fn get_source_by_name(&self, name: &str) -> StorageResult<Option<SourceDescriptor>>;

    /// Lists all sources
    fn list_sources(&self) -> StorageResult<Vec<SourceDescriptor>>;

    /// Lists sources eligible for collection: enabled, in an enabled region
    fn list_collectable_sources(&self) -> StorageResult<Vec<SourceDescriptor>>;

    /// Updates a source's target URL and settings payload
    ///
    /// The kind is deliberately not updatable; switching extraction strategy
    /// requires a new descriptor.
    fn update_source(&mut self, id: i64, url: &str, settings: &str) -> StorageResult<()>;

    /// Enables or disables a source
    fn set_source_enabled(&mut self, id: i64, enabled: bool) -> StorageResult<()>;

    /// Records a collection attempt timestamp on a source
    fn touch_source_collected(&mut self, id: i64, at: NaiveDateTime) -> StorageResult<()>;

    /// Deletes a source descriptor
    fn delete_source(&mut self, id: i64) -> StorageResult<()>;

    // ===== Events =====

    /// Looks up an active event by its deduplication identity
    fn find_event_by_identity(
        &self,
        title: &str,
        start: NaiveDateTime,
    ) -> StorageResult<Option<EventRecord>>;

    /// Inserts a new event carrying all candidate fields
    fn insert_event(
        &mut self,
        candidate: &RawEvent,
        source_id: i64,
        now: NaiveDateTime,
    ) -> StorageResult<i64>;

    /// Refreshes an existing event from a re-collected candidate
    ///
    /// Only the description (when the candidate provides one), the origin
    /// URL, and the sync timestamp are touched; everything else keeps its
    /// originally recorded value.
    fn refresh_event(
        &mut self,
        id: i64,
        description: Option<&str>,
        origin_url: &str,
        synced_at: NaiveDateTime,
    ) -> StorageResult<()>;

    /// Counts all active events
    fn count_events(&self) -> StorageResult<u64>;

    /// Counts active events recorded from one source
    fn count_events_for_source(&self, source_id: i64) -> StorageResult<u64>;

    // ===== Collection logs =====

    /// Appends one collection log row
    fn insert_run_log(&mut self, log: &NewRunLog) -> StorageResult<i64>;

    /// Lists the most recent collection log rows, newest first
    fn recent_run_logs(&self, limit: u32) -> StorageResult<Vec<RunLogRecord>>;

    /// Lists all collection log rows for one source, oldest first
    fn run_logs_for_source(&self, source_id: i64) -> StorageResult<Vec<RunLogRecord>>;
}
