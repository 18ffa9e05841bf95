//! Database schema definitions
//!
//! All SQL schema definitions for the Agora-Harvest database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Regions that own sources and events
CREATE TABLE IF NOT EXISTS regions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    code TEXT NOT NULL UNIQUE,
    enabled INTEGER NOT NULL DEFAULT 1
);

-- Configured external origins
CREATE TABLE IF NOT EXISTS sources (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    kind TEXT NOT NULL,
    url TEXT NOT NULL,
    region_id INTEGER NOT NULL REFERENCES regions(id),
    enabled INTEGER NOT NULL DEFAULT 1,
    settings TEXT NOT NULL DEFAULT '{}',
    last_collected_at TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sources_region ON sources(region_id);

-- Persisted events
CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT,
    start_at TEXT NOT NULL,
    end_at TEXT,
    start_time TEXT,
    end_time TEXT,
    location TEXT,
    address TEXT,
    age_min INTEGER NOT NULL DEFAULT 0,
    age_max INTEGER NOT NULL DEFAULT 999,
    target_groups TEXT,
    is_free INTEGER NOT NULL DEFAULT 1,
    fee TEXT,
    origin_url TEXT NOT NULL,
    registration_url TEXT,
    image_url TEXT,
    category TEXT NOT NULL,
    organizer TEXT,
    contact TEXT,
    region_id INTEGER NOT NULL REFERENCES regions(id),
    source_id INTEGER REFERENCES sources(id),
    view_count INTEGER NOT NULL DEFAULT 0,
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    synced_at TEXT
);

-- Deduplication identity: (title, start) among active events
CREATE UNIQUE INDEX IF NOT EXISTS idx_events_identity ON events(title, start_at) WHERE active = 1;
CREATE INDEX IF NOT EXISTS idx_events_start ON events(start_at);
CREATE INDEX IF NOT EXISTS idx_events_region ON events(region_id);

-- One audit row per (source, run); append-only
CREATE TABLE IF NOT EXISTS collection_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_id INTEGER NOT NULL REFERENCES sources(id),
    status TEXT NOT NULL,
    events_collected INTEGER NOT NULL DEFAULT 0,
    events_added INTEGER NOT NULL DEFAULT 0,
    events_updated INTEGER NOT NULL DEFAULT 0,
    error_message TEXT,
    started_at TEXT NOT NULL,
    completed_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_collection_logs_source ON collection_logs(source_id);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_initializes() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn test_tables_exist_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        for table in ["regions", "sources", "events", "collection_logs"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table {} should exist", table);
        }
    }

    #[test]
    fn test_identity_index_rejects_duplicates_among_active() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        conn.execute(
            "INSERT INTO regions (name, code) VALUES ('Riverdale', 'riverdale')",
            [],
        )
        .unwrap();

        let insert = "INSERT INTO events
            (title, start_at, origin_url, category, region_id, active, created_at, updated_at)
            VALUES ('Fair', '2025-03-01T00:00:00', 'https://x.test/', 'festival', 1, ?1,
                    '2025-01-01T00:00:00', '2025-01-01T00:00:00')";

        conn.execute(insert, [1]).unwrap();
        assert!(conn.execute(insert, [1]).is_err());

        // Inactive rows are outside the identity constraint
        assert!(conn.execute(insert, [0]).is_ok());
    }
}
