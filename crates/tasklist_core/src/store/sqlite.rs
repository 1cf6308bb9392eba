//! SQLite-backed record store.
//!
//! # Responsibility
//! - Own the single connection for a session from `open` to `close`.
//! - Apply each mutation inside an `IMMEDIATE` transaction.
//!
//! # Invariants
//! - Text is validated before a transaction is started.
//! - Ids come from `AUTOINCREMENT` and are never reassigned after delete.
//! - A new `created_at` is never below the newest stored one.
//! - Read paths reject invalid persisted rows instead of masking them.

use super::{RecordRepository, StoreError, StoreResult};
use crate::db::{open_db_in_memory, open_db_with, DbError, OpenOptions};
use crate::model::record::{normalize_text, Record, RecordFilter, RecordId};
use log::{debug, info, warn};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

const TASK_SELECT_SQL: &str = "SELECT id, text, done, created_at FROM tasks";
const REQUIRED_COLUMNS: [&str; 4] = ["id", "text", "done", "created_at"];

/// Record store holding an explicitly owned SQLite connection.
pub struct SqliteRecordStore {
    conn: Connection,
}

impl SqliteRecordStore {
    /// Opens (and migrates) the database at `path` with default options.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with(path, &OpenOptions::default())
    }

    pub fn open_with(path: impl AsRef<Path>, options: &OpenOptions) -> StoreResult<Self> {
        let conn = open_db_with(path, options)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = open_db_in_memory()?;
        Self::from_connection(conn)
    }

    /// Wraps an already-migrated connection.
    ///
    /// # Errors
    /// - `StorageUnavailable` when the `tasks` table or one of its columns is
    ///   missing.
    pub fn from_connection(conn: Connection) -> StoreResult<Self> {
        ensure_store_connection_ready(&conn)?;
        Ok(Self { conn })
    }

    /// Releases the connection.
    ///
    /// Dropping the store also releases it; `close` exists to observe the
    /// outcome.
    pub fn close(self) -> StoreResult<()> {
        match self.conn.close() {
            Ok(()) => {
                info!("event=store_close module=store status=ok");
                Ok(())
            }
            Err((_conn, err)) => {
                warn!("event=store_close module=store status=error error={err}");
                Err(err.into())
            }
        }
    }

    fn begin(&mut self) -> StoreResult<Transaction<'_>> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }
}

impl RecordRepository for SqliteRecordStore {
    fn create(&mut self, text: &str) -> StoreResult<Record> {
        let text = normalize_text(text)?;

        let tx = self.begin()?;
        // Never stamp below the newest row, so a clock stepping back cannot
        // list a new record under older ones; equal stamps fall back to id.
        let newest: i64 = tx.query_row(
            "SELECT COALESCE(MAX(created_at), 0) FROM tasks;",
            [],
            |row| row.get(0),
        )?;
        let created_at = now_epoch_ms().max(newest);
        tx.execute(
            "INSERT INTO tasks (text, done, created_at) VALUES (?1, 0, ?2);",
            params![text.as_str(), created_at],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        debug!("event=record_create module=store status=ok id={id}");
        Ok(Record {
            id,
            text,
            done: false,
            created_at,
        })
    }

    fn update(&mut self, id: RecordId, text: &str) -> StoreResult<()> {
        let text = normalize_text(text)?;

        let tx = self.begin()?;
        let changed = tx.execute(
            "UPDATE tasks SET text = ?1 WHERE id = ?2;",
            params![text.as_str(), id],
        )?;
        commit_single_row(tx, changed, id)?;

        debug!("event=record_update module=store status=ok id={id}");
        Ok(())
    }

    fn toggle_done(&mut self, id: RecordId) -> StoreResult<()> {
        let tx = self.begin()?;
        let changed = tx.execute("UPDATE tasks SET done = 1 - done WHERE id = ?1;", [id])?;
        commit_single_row(tx, changed, id)?;

        debug!("event=record_toggle module=store status=ok id={id}");
        Ok(())
    }

    fn delete(&mut self, id: RecordId) -> StoreResult<()> {
        let tx = self.begin()?;
        let changed = tx.execute("DELETE FROM tasks WHERE id = ?1;", [id])?;
        commit_single_row(tx, changed, id)?;

        debug!("event=record_delete module=store status=ok id={id}");
        Ok(())
    }

    fn delete_where(&mut self, filter: RecordFilter) -> StoreResult<usize> {
        let sql = match filter {
            RecordFilter::All => "DELETE FROM tasks;",
            RecordFilter::Active => "DELETE FROM tasks WHERE done = 0;",
            RecordFilter::Completed => "DELETE FROM tasks WHERE done = 1;",
        };

        let tx = self.begin()?;
        let removed = tx.execute(sql, [])?;
        tx.commit()?;

        debug!(
            "event=record_delete_where module=store status=ok filter={} removed={removed}",
            filter
        );
        Ok(removed)
    }

    fn list_all(&self) -> StoreResult<Vec<Record>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{TASK_SELECT_SQL} ORDER BY created_at DESC, id DESC;"))?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();

        while let Some(row) = rows.next()? {
            records.push(parse_record_row(row)?);
        }

        Ok(records)
    }

    fn get(&self, id: RecordId) -> StoreResult<Option<Record>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let row = stmt
            .query_row([id], |row| {
                Ok((
                    row.get::<_, RecordId>("id")?,
                    row.get::<_, String>("text")?,
                    row.get::<_, i64>("done")?,
                    row.get::<_, i64>("created_at")?,
                ))
            })
            .optional()?;

        row.map(|(id, text, done, created_at)| build_record(id, text, done, created_at))
            .transpose()
    }
}

/// Commits a single-row mutation, or rolls it back as `NotFound` when no row
/// matched.
fn commit_single_row(tx: Transaction<'_>, changed: usize, id: RecordId) -> StoreResult<()> {
    if changed == 0 {
        tx.rollback()?;
        debug!("event=record_lookup module=store status=not_found id={id}");
        return Err(StoreError::NotFound(id));
    }
    tx.commit()?;
    Ok(())
}

fn parse_record_row(row: &Row<'_>) -> StoreResult<Record> {
    build_record(
        row.get("id")?,
        row.get("text")?,
        row.get("done")?,
        row.get("created_at")?,
    )
}

fn build_record(id: RecordId, text: String, done: i64, created_at: i64) -> StoreResult<Record> {
    let done = match done {
        0 => false,
        1 => true,
        other => {
            return Err(DbError::InvalidData(format!(
                "invalid done value `{other}` in tasks.done for id {id}"
            ))
            .into());
        }
    };

    if text.trim().is_empty() {
        return Err(DbError::InvalidData(format!("empty text in tasks.text for id {id}")).into());
    }

    Ok(Record {
        id,
        text,
        done,
        created_at,
    })
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

fn ensure_store_connection_ready(conn: &Connection) -> Result<(), DbError> {
    if !table_exists(conn, "tasks")? {
        return Err(DbError::MissingRequiredTable("tasks"));
    }

    for column in REQUIRED_COLUMNS {
        if !table_has_column(conn, "tasks", column)? {
            return Err(DbError::MissingRequiredColumn {
                table: "tasks",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool, DbError> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> Result<bool, DbError> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
