//! SQLite Storage Implementation
//!
//! Durable store for progress records, review slots and the cycle log.
//! One writer and one reader connection over the same WAL database.

use chrono::{NaiveDate, Utc};
use directories::ProjectDirs;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use super::{CycleLog, ProgressStore, Result, SlotStore, StorageError};
use crate::model::{
    CycleLogEntry, CycleState, LearningUnit, Progress, ReviewSlot, SlotOrder, SlotStatus,
};
use crate::schedule::DateLoad;

const PROGRESS_COLUMNS: &str = "id, learner_id, unit_id, unit_size, cycle_state, \
     first_learning_date, next_due_date, percent_complete";

const SLOT_COLUMNS: &str = "id, progress_id, cycle, slot_order, status, review_date, completed_on";

// ============================================================================
// SQLITE STORE
// ============================================================================

/// SQLite-backed store
pub struct SqliteStore {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
    path: PathBuf,
}

impl SqliteStore {
    /// Apply connection PRAGMAs
    fn configure_connection(conn: &Connection) -> Result<()> {
        // Apply encryption key if SQLCipher is enabled and key is provided
        #[cfg(feature = "encryption")]
        {
            if let Ok(key) = std::env::var("REPRISE_ENCRYPTION_KEY") {
                if !key.is_empty() {
                    conn.pragma_update(None, "key", &key)?;
                }
            }
        }

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -16000;
             PRAGMA temp_store = MEMORY;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;
             PRAGMA journal_size_limit = 67108864;",
        )?;

        Ok(())
    }

    /// Open (creating if needed) the database at `db_path`, or at the
    /// platform data directory when `None`.
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(p) => p,
            None => Self::default_path()?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let writer_conn = Connection::open(&path)?;

        // Restrict database file permissions to owner-only on Unix
        #[cfg(unix)]
        if path.exists() {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&path, perms);
        }

        Self::configure_connection(&writer_conn)?;

        // Apply migrations on writer only
        let applied = super::migrations::apply_migrations(&writer_conn)?;
        if applied > 0 {
            tracing::info!(path = %path.display(), applied, "Schema migrated");
        }

        let reader_conn = Connection::open(&path)?;
        Self::configure_connection(&reader_conn)?;

        Ok(Self {
            writer: Mutex::new(writer_conn),
            reader: Mutex::new(reader_conn),
            path,
        })
    }

    /// `<data dir>/reprise.db`, creating the directory owner-only
    pub fn default_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "reprise", "core").ok_or_else(|| {
            StorageError::Init("Could not determine project directories".to_string())
        })?;

        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            let _ = std::fs::set_permissions(data_dir, perms);
        }
        Ok(data_dir.join("reprise.db"))
    }

    /// Database file location
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Applied schema version
    pub fn schema_version(&self) -> Result<u32> {
        let reader = self.reader()?;
        Ok(super::migrations::get_current_version(&reader)?)
    }

    fn writer(&self) -> Result<MutexGuard<'_, Connection>> {
        self.writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))
    }

    fn reader(&self) -> Result<MutexGuard<'_, Connection>> {
        self.reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))
    }

    // ========================================================================
    // ROW MAPPING
    // ========================================================================

    /// Map a stored enum name through `parse`, failing the row on unknown values
    fn parse_name<T>(
        value: &str,
        column: usize,
        field_name: &str,
        parse: fn(&str) -> Option<T>,
    ) -> rusqlite::Result<T> {
        parse(value).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                Box::new(StorageError::InvalidData(format!(
                    "Invalid {} '{}'",
                    field_name, value
                ))),
            )
        })
    }

    fn row_to_progress(row: &Row) -> rusqlite::Result<Progress> {
        let cycle_state: String = row.get("cycle_state")?;
        let percent: i64 = row.get("percent_complete")?;

        Ok(Progress {
            id: row.get("id")?,
            learner_id: row.get("learner_id")?,
            unit: LearningUnit {
                id: row.get("unit_id")?,
                size: row.get("unit_size")?,
            },
            cycle_state: Self::parse_name(&cycle_state, 4, "cycle state", CycleState::parse_name)?,
            first_learning_date: row.get("first_learning_date")?,
            next_due_date: row.get("next_due_date")?,
            percent_complete: percent.clamp(0, 100) as u8,
        })
    }

    fn row_to_slot(row: &Row) -> rusqlite::Result<ReviewSlot> {
        let cycle: String = row.get("cycle")?;
        let status: String = row.get("status")?;
        let order: u8 = row.get("slot_order")?;

        Ok(ReviewSlot {
            id: row.get("id")?,
            progress_id: row.get("progress_id")?,
            cycle: Self::parse_name(&cycle, 2, "cycle", CycleState::parse_name)?,
            order: SlotOrder::new(order).ok_or_else(|| {
                rusqlite::Error::IntegralValueOutOfRange(3, i64::from(order))
            })?,
            status: Self::parse_name(&status, 4, "slot status", SlotStatus::parse_name)?,
            review_date: row.get("review_date")?,
            completed_on: row.get("completed_on")?,
        })
    }

    fn query_slots(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<ReviewSlot>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare_cached(sql)?;
        let slots = stmt
            .query_map(params, Self::row_to_slot)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(slots)
    }
}

// ============================================================================
// PROGRESS
// ============================================================================

impl ProgressStore for SqliteStore {
    fn get_progress(&self, id: &str) -> Result<Option<Progress>> {
        let reader = self.reader()?;
        let sql = format!("SELECT {} FROM progress WHERE id = ?1", PROGRESS_COLUMNS);
        let progress = reader
            .query_row(&sql, params![id], Self::row_to_progress)
            .optional()?;
        Ok(progress)
    }

    fn save_progress(&self, progress: &Progress) -> Result<()> {
        let writer = self.writer()?;
        let now = Utc::now().to_rfc3339();
        writer.execute(
            "INSERT INTO progress (
                id, learner_id, unit_id, unit_size, cycle_state,
                first_learning_date, next_due_date, percent_complete,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            ON CONFLICT(id) DO UPDATE SET
                learner_id = excluded.learner_id,
                unit_id = excluded.unit_id,
                unit_size = excluded.unit_size,
                cycle_state = excluded.cycle_state,
                first_learning_date = excluded.first_learning_date,
                next_due_date = excluded.next_due_date,
                percent_complete = excluded.percent_complete,
                updated_at = excluded.updated_at",
            params![
                progress.id,
                progress.learner_id,
                progress.unit.id,
                progress.unit.size,
                progress.cycle_state.as_str(),
                progress.first_learning_date,
                progress.next_due_date,
                progress.percent_complete,
                now,
            ],
        )?;
        Ok(())
    }

    fn exists_for_learner_and_unit(&self, learner_id: &str, unit_id: &str) -> Result<bool> {
        let reader = self.reader()?;
        let exists: bool = reader.query_row(
            "SELECT EXISTS(SELECT 1 FROM progress WHERE learner_id = ?1 AND unit_id = ?2)",
            params![learner_id, unit_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn list_due(&self, on: NaiveDate) -> Result<Vec<Progress>> {
        let reader = self.reader()?;
        let sql = format!(
            "SELECT {} FROM progress
             WHERE next_due_date IS NOT NULL AND next_due_date <= ?1
             ORDER BY next_due_date, id",
            PROGRESS_COLUMNS
        );
        let mut stmt = reader.prepare_cached(&sql)?;
        let due = stmt
            .query_map(params![on], Self::row_to_progress)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(due)
    }
}

// ============================================================================
// REVIEW SLOTS
// ============================================================================

impl SlotStore for SqliteStore {
    fn count_total(&self, progress_id: &str, cycle: CycleState) -> Result<usize> {
        let reader = self.reader()?;
        let count: i64 = reader.query_row(
            "SELECT COUNT(*) FROM review_slots WHERE progress_id = ?1 AND cycle = ?2",
            params![progress_id, cycle.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn count_by_status(
        &self,
        progress_id: &str,
        cycle: CycleState,
        status: SlotStatus,
    ) -> Result<usize> {
        let reader = self.reader()?;
        let count: i64 = reader.query_row(
            "SELECT COUNT(*) FROM review_slots
             WHERE progress_id = ?1 AND cycle = ?2 AND status = ?3",
            params![progress_id, cycle.as_str(), status.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn find_all_ordered(&self, progress_id: &str) -> Result<Vec<ReviewSlot>> {
        // Cycle names do not sort in cycle order; rank them explicitly
        let mut slots = self.query_slots(
            &format!(
                "SELECT {} FROM review_slots WHERE progress_id = ?1",
                SLOT_COLUMNS
            ),
            params![progress_id],
        )?;
        slots.sort_by_key(|s| (s.cycle, s.order));
        Ok(slots)
    }

    fn find_generation(&self, progress_id: &str, cycle: CycleState) -> Result<Vec<ReviewSlot>> {
        self.query_slots(
            &format!(
                "SELECT {} FROM review_slots
                 WHERE progress_id = ?1 AND cycle = ?2
                 ORDER BY slot_order",
                SLOT_COLUMNS
            ),
            params![progress_id, cycle.as_str()],
        )
    }

    fn find_pending(&self, progress_id: &str) -> Result<Vec<ReviewSlot>> {
        self.query_slots(
            &format!(
                "SELECT {} FROM review_slots
                 WHERE progress_id = ?1 AND status = 'NOT_STARTED'
                 ORDER BY review_date, slot_order",
                SLOT_COLUMNS
            ),
            params![progress_id],
        )
    }

    fn save_all(&self, slots: &[ReviewSlot]) -> Result<()> {
        let mut writer = self.writer()?;
        let tx = writer.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO review_slots (
                    id, progress_id, cycle, slot_order, status, review_date, completed_on
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(id) DO UPDATE SET
                    status = excluded.status,
                    review_date = excluded.review_date,
                    completed_on = excluded.completed_on",
            )?;
            for slot in slots {
                stmt.execute(params![
                    slot.id,
                    slot.progress_id,
                    slot.cycle.as_str(),
                    slot.order.get(),
                    slot.status.as_str(),
                    slot.review_date,
                    slot.completed_on,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn count_by_date_range(&self, start: NaiveDate, end: NaiveDate) -> Result<DateLoad> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare_cached(
            "SELECT review_date, COUNT(*) FROM review_slots
             WHERE status = 'NOT_STARTED' AND review_date BETWEEN ?1 AND ?2
             GROUP BY review_date",
        )?;
        let load = stmt
            .query_map(params![start, end], |row| {
                Ok((row.get::<_, NaiveDate>(0)?, row.get::<_, u32>(1)?))
            })?
            .collect::<rusqlite::Result<DateLoad>>()?;
        Ok(load)
    }
}

// ============================================================================
// CYCLE LOG
// ============================================================================

impl CycleLog for SqliteStore {
    fn append(&self, progress_id: &str, state: CycleState, start_date: NaiveDate) -> Result<()> {
        let writer = self.writer()?;
        writer.execute(
            "INSERT INTO cycle_log (progress_id, cycle_state, start_date, recorded_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![progress_id, state.as_str(), start_date, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn latest_start_for(&self, progress_id: &str, state: CycleState) -> Result<Option<NaiveDate>> {
        let reader = self.reader()?;
        let latest: Option<NaiveDate> = reader.query_row(
            "SELECT MAX(start_date) FROM cycle_log WHERE progress_id = ?1 AND cycle_state = ?2",
            params![progress_id, state.as_str()],
            |row| row.get(0),
        )?;
        Ok(latest)
    }

    fn entries_for(&self, progress_id: &str) -> Result<Vec<CycleLogEntry>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare_cached(
            "SELECT progress_id, cycle_state, start_date FROM cycle_log
             WHERE progress_id = ?1 ORDER BY id",
        )?;
        let entries = stmt
            .query_map(params![progress_id], |row| {
                let state: String = row.get(1)?;
                Ok(CycleLogEntry {
                    progress_id: row.get(0)?,
                    cycle_state: Self::parse_name(&state, 1, "cycle state", CycleState::parse_name)?,
                    start_date: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }
}
