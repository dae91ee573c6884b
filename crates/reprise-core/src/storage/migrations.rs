//! Database Migrations
//!
//! Schema migration definitions for the SQLite store.

/// Migration definitions
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema: progress, review slots, cycle log",
        up: MIGRATION_V1_UP,
    },
    Migration {
        version: 2,
        description: "Partial index on pending slots for load snapshots",
        up: MIGRATION_V2_UP,
    },
];

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Version number
    pub version: u32,
    /// Description
    pub description: &'static str,
    /// SQL to apply
    pub up: &'static str,
}

/// V1: Initial schema
const MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS progress (
    id TEXT PRIMARY KEY,
    learner_id TEXT NOT NULL,
    unit_id TEXT NOT NULL,
    unit_size INTEGER NOT NULL DEFAULT 0,
    cycle_state TEXT NOT NULL DEFAULT 'FIRST_TIME',
    first_learning_date TEXT,
    next_due_date TEXT,
    percent_complete INTEGER NOT NULL DEFAULT 0
        CHECK (percent_complete BETWEEN 0 AND 100),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,

    UNIQUE (learner_id, unit_id)
);

CREATE INDEX IF NOT EXISTS idx_progress_next_due ON progress(next_due_date);
CREATE INDEX IF NOT EXISTS idx_progress_learner ON progress(learner_id);

-- One row per scheduled review. Rows are never deleted; a generation is
-- identified by (progress_id, cycle).
CREATE TABLE IF NOT EXISTS review_slots (
    id TEXT PRIMARY KEY,
    progress_id TEXT NOT NULL REFERENCES progress(id) ON DELETE CASCADE,
    cycle TEXT NOT NULL,
    slot_order INTEGER NOT NULL CHECK (slot_order BETWEEN 1 AND 5),
    status TEXT NOT NULL DEFAULT 'NOT_STARTED',
    review_date TEXT NOT NULL,
    completed_on TEXT,

    UNIQUE (progress_id, cycle, slot_order)
);

CREATE INDEX IF NOT EXISTS idx_slots_progress ON review_slots(progress_id, cycle, slot_order);
CREATE INDEX IF NOT EXISTS idx_slots_review_date ON review_slots(review_date);

-- Append-only; the latest start per state wins
CREATE TABLE IF NOT EXISTS cycle_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    progress_id TEXT NOT NULL REFERENCES progress(id) ON DELETE CASCADE,
    cycle_state TEXT NOT NULL,
    start_date TEXT NOT NULL,
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_cycle_log_progress ON cycle_log(progress_id, cycle_state);

-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);

INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, datetime('now'));
"#;

/// V2: Load snapshots only ever read pending slots
const MIGRATION_V2_UP: &str = r#"
CREATE INDEX IF NOT EXISTS idx_slots_pending_date
    ON review_slots(review_date)
    WHERE status = 'NOT_STARTED';

CREATE INDEX IF NOT EXISTS idx_slots_pending_progress
    ON review_slots(progress_id, review_date)
    WHERE status = 'NOT_STARTED';

UPDATE schema_version SET version = 2, applied_at = datetime('now');
"#;

/// Get current schema version from database
pub fn get_current_version(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .or(Ok(0))
}

/// Apply pending migrations
pub fn apply_migrations(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    let current_version = get_current_version(conn)?;
    let mut applied = 0;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                "Applying migration v{}: {}",
                migration.version,
                migration.description
            );

            conn.execute_batch(migration.up)?;
            applied += 1;
        }
    }

    Ok(applied)
}
