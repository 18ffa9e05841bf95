//! SQLite storage implementation

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

use crate::model::{Category, RawEvent, SourceDescriptor, SourceKind};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{EventRecord, NewRunLog, NewSource, RegionRecord, RunLogRecord, RunStatus};

/// Timestamp format used for all TEXT datetime columns
const DB_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates a database at the given path
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn to_db_time(ts: NaiveDateTime) -> String {
    ts.format(DB_TIME_FORMAT).to_string()
}

fn from_db_time(text: &str, column: usize) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, DB_TIME_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn opt_from_db_time(text: Option<String>, column: usize) -> rusqlite::Result<Option<NaiveDateTime>> {
    text.map(|t| from_db_time(&t, column)).transpose()
}

const SOURCE_COLUMNS: &str =
    "id, name, kind, url, region_id, enabled, settings, last_collected_at";

fn row_to_source(row: &Row<'_>) -> rusqlite::Result<SourceDescriptor> {
    let kind_str: String = row.get(2)?;
    let kind = SourceKind::from_db_string(&kind_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown source kind '{}'", kind_str).into(),
        )
    })?;
    Ok(SourceDescriptor {
        id: row.get(0)?,
        name: row.get(1)?,
        kind,
        url: row.get(3)?,
        region_id: row.get(4)?,
        enabled: row.get(5)?,
        settings: row.get(6)?,
        last_collected_at: opt_from_db_time(row.get(7)?, 7)?,
    })
}

const EVENT_COLUMNS: &str = "id, title, description, start_at, end_at, start_time, end_time, \
     location, address, age_min, age_max, target_groups, is_free, fee, origin_url, \
     registration_url, image_url, category, organizer, contact, region_id, source_id, \
     view_count, active, created_at, updated_at, synced_at";

fn row_to_event(row: &Row<'_>) -> rusqlite::Result<EventRecord> {
    let start_at: String = row.get(3)?;
    let created_at: String = row.get(24)?;
    let updated_at: String = row.get(25)?;
    let category_str: String = row.get(17)?;

    Ok(EventRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        start_at: from_db_time(&start_at, 3)?,
        end_at: opt_from_db_time(row.get(4)?, 4)?,
        start_time: row.get(5)?,
        end_time: row.get(6)?,
        location: row.get(7)?,
        address: row.get(8)?,
        age_min: row.get(9)?,
        age_max: row.get(10)?,
        target_groups: row.get(11)?,
        is_free: row.get(12)?,
        fee: row.get(13)?,
        origin_url: row.get(14)?,
        registration_url: row.get(15)?,
        image_url: row.get(16)?,
        category: Category::from_db_string(&category_str).unwrap_or_default(),
        organizer: row.get(18)?,
        contact: row.get(19)?,
        region_id: row.get(20)?,
        source_id: row.get(21)?,
        view_count: row.get(22)?,
        active: row.get(23)?,
        created_at: from_db_time(&created_at, 24)?,
        updated_at: from_db_time(&updated_at, 25)?,
        synced_at: opt_from_db_time(row.get(26)?, 26)?,
    })
}

fn row_to_run_log(row: &Row<'_>) -> rusqlite::Result<RunLogRecord> {
    let status_str: String = row.get(3)?;
    let started_at: String = row.get(8)?;
    let completed_at: String = row.get(9)?;

    Ok(RunLogRecord {
        id: row.get(0)?,
        source_id: row.get(1)?,
        source_name: row.get(2)?,
        status: RunStatus::from_db_string(&status_str).unwrap_or(RunStatus::Failed),
        collected: row.get(4)?,
        added: row.get(5)?,
        updated: row.get(6)?,
        error_message: row.get(7)?,
        started_at: from_db_time(&started_at, 8)?,
        completed_at: from_db_time(&completed_at, 9)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Regions =====

    fn upsert_region(&mut self, name: &str, code: &str, enabled: bool) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO regions (name, code, enabled) VALUES (?1, ?2, ?3)
             ON CONFLICT(code) DO UPDATE SET name = excluded.name, enabled = excluded.enabled",
            params![name, code, enabled],
        )?;

        let id = self.conn.query_row(
            "SELECT id FROM regions WHERE code = ?1",
            params![code],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn get_region(&self, id: i64) -> StorageResult<RegionRecord> {
        self.conn
            .query_row(
                "SELECT id, name, code, enabled FROM regions WHERE id = ?1",
                params![id],
                |row| {
                    Ok(RegionRecord {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        code: row.get(2)?,
                        enabled: row.get(3)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| StorageError::RegionNotFound(format!("id {}", id)))
    }

    fn get_region_by_code(&self, code: &str) -> StorageResult<Option<RegionRecord>> {
        let region = self
            .conn
            .query_row(
                "SELECT id, name, code, enabled FROM regions WHERE code = ?1",
                params![code],
                |row| {
                    Ok(RegionRecord {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        code: row.get(2)?,
                        enabled: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(region)
    }

    fn list_regions(&self) -> StorageResult<Vec<RegionRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, code, enabled FROM regions ORDER BY id")?;
        let regions = stmt
            .query_map([], |row| {
                Ok(RegionRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    code: row.get(2)?,
                    enabled: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(regions)
    }

    // ===== Sources =====

    fn insert_source(&mut self, source: &NewSource) -> StorageResult<i64> {
        let now = to_db_time(chrono::Local::now().naive_local());
        self.conn.execute(
            "INSERT INTO sources (name, kind, url, region_id, enabled, settings, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                source.name,
                source.kind.to_db_string(),
                source.url,
                source.region_id,
                source.enabled,
                source.settings,
                now
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_source(&self, id: i64) -> StorageResult<SourceDescriptor> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM sources WHERE id = ?1", SOURCE_COLUMNS),
                params![id],
                row_to_source,
            )
            .optional()?
            .ok_or_else(|| StorageError::SourceNotFound(format!("id {}", id)))
    }

    fn get_source_by_name(&self, name: &str) -> StorageResult<Option<SourceDescriptor>> {
        let source = self
            .conn
            .query_row(
                &format!("SELECT {} FROM sources WHERE name = ?1", SOURCE_COLUMNS),
                params![name],
                row_to_source,
            )
            .optional()?;
        Ok(source)
    }

    fn list_sources(&self) -> StorageResult<Vec<SourceDescriptor>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM sources ORDER BY id", SOURCE_COLUMNS))?;
        let sources = stmt
            .query_map([], row_to_source)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sources)
    }

    fn list_collectable_sources(&self) -> StorageResult<Vec<SourceDescriptor>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.id, s.name, s.kind, s.url, s.region_id, s.enabled, s.settings, s.last_collected_at
             FROM sources s
             JOIN regions r ON r.id = s.region_id
             WHERE s.enabled = 1 AND r.enabled = 1
             ORDER BY s.id",
        )?;
        let sources = stmt
            .query_map([], row_to_source)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sources)
    }

    fn update_source(&mut self, id: i64, url: &str, settings: &str) -> StorageResult<()> {
        let changed = self.conn.execute(
            "UPDATE sources SET url = ?1, settings = ?2 WHERE id = ?3",
            params![url, settings, id],
        )?;
        if changed == 0 {
            return Err(StorageError::SourceNotFound(format!("id {}", id)));
        }
        Ok(())
    }

    fn set_source_enabled(&mut self, id: i64, enabled: bool) -> StorageResult<()> {
        let changed = self.conn.execute(
            "UPDATE sources SET enabled = ?1 WHERE id = ?2",
            params![enabled, id],
        )?;
        if changed == 0 {
            return Err(StorageError::SourceNotFound(format!("id {}", id)));
        }
        Ok(())
    }

    fn touch_source_collected(&mut self, id: i64, at: NaiveDateTime) -> StorageResult<()> {
        let changed = self.conn.execute(
            "UPDATE sources SET last_collected_at = ?1 WHERE id = ?2",
            params![to_db_time(at), id],
        )?;
        if changed == 0 {
            return Err(StorageError::SourceNotFound(format!("id {}", id)));
        }
        Ok(())
    }

    fn delete_source(&mut self, id: i64) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM sources WHERE id = ?1", params![id])?;
        Ok(())
    }

    // ===== Events =====

    fn find_event_by_identity(
        &self,
        title: &str,
        start: NaiveDateTime,
    ) -> StorageResult<Option<EventRecord>> {
        let event = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM events WHERE title = ?1 AND start_at = ?2 AND active = 1",
                    EVENT_COLUMNS
                ),
                params![title, to_db_time(start)],
                row_to_event,
            )
            .optional()?;
        Ok(event)
    }

    fn insert_event(
        &mut self,
        candidate: &RawEvent,
        source_id: i64,
        now: NaiveDateTime,
    ) -> StorageResult<i64> {
        let target_groups = if candidate.target_groups.is_empty() {
            None
        } else {
            Some(
                serde_json::to_string(&candidate.target_groups)
                    .map_err(|e| StorageError::Serialization(e.to_string()))?,
            )
        };
        let now_str = to_db_time(now);

        self.conn.execute(
            "INSERT INTO events
             (title, description, start_at, end_at, start_time, end_time, location, address,
              age_min, age_max, target_groups, is_free, fee, origin_url, registration_url,
              image_url, category, organizer, contact, region_id, source_id,
              created_at, updated_at, synced_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                     ?17, ?18, ?19, ?20, ?21, ?22, ?22, ?22)",
            params![
                candidate.title,
                candidate.description,
                to_db_time(candidate.start),
                candidate.end.map(to_db_time),
                candidate.start_time,
                candidate.end_time,
                candidate.location,
                candidate.address,
                candidate.age_range.min,
                candidate.age_range.max,
                target_groups,
                candidate.is_free,
                candidate.fee,
                candidate.origin_url,
                candidate.registration_url,
                candidate.image_url,
                candidate.category.to_db_string(),
                candidate.organizer,
                candidate.contact,
                candidate.region_id,
                source_id,
                now_str,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn refresh_event(
        &mut self,
        id: i64,
        description: Option<&str>,
        origin_url: &str,
        synced_at: NaiveDateTime,
    ) -> StorageResult<()> {
        let now_str = to_db_time(synced_at);
        let changed = self.conn.execute(
            "UPDATE events
             SET description = COALESCE(?1, description), origin_url = ?2,
                 synced_at = ?3, updated_at = ?3
             WHERE id = ?4",
            params![description, origin_url, now_str, id],
        )?;
        if changed == 0 {
            return Err(StorageError::EventNotFound(id));
        }
        Ok(())
    }

    fn count_events(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM events WHERE active = 1", [], |row| {
                row.get(0)
            })?;
        Ok(count as u64)
    }

    fn count_events_for_source(&self, source_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM events WHERE source_id = ?1 AND active = 1",
            params![source_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Collection logs =====

    fn insert_run_log(&mut self, log: &NewRunLog) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO collection_logs
             (source_id, status, events_collected, events_added, events_updated,
              error_message, started_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                log.source_id,
                log.status.to_db_string(),
                log.collected,
                log.added,
                log.updated,
                log.error_message,
                to_db_time(log.started_at),
                to_db_time(log.completed_at),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn recent_run_logs(&self, limit: u32) -> StorageResult<Vec<RunLogRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT l.id, l.source_id, s.name, l.status, l.events_collected, l.events_added,
                    l.events_updated, l.error_message, l.started_at, l.completed_at
             FROM collection_logs l
             JOIN sources s ON s.id = l.source_id
             ORDER BY l.id DESC
             LIMIT ?1",
        )?;
        let logs = stmt
            .query_map(params![limit], row_to_run_log)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    fn run_logs_for_source(&self, source_id: i64) -> StorageResult<Vec<RunLogRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT l.id, l.source_id, s.name, l.status, l.events_collected, l.events_added,
                    l.events_updated, l.error_message, l.started_at, l.completed_at
             FROM collection_logs l
             JOIN sources s ON s.id = l.source_id
             WHERE l.source_id = ?1
             ORDER BY l.id",
        )?;
        let logs = stmt
            .query_map(params![source_id], row_to_run_log)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }
}
