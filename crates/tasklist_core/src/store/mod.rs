//! Record store contract and its SQLite implementation.
//!
//! # Responsibility
//! - Define the durable mutation and read primitives the view model uses.
//! - Map backend failures onto a small, stable error taxonomy.
//!
//! # Invariants
//! - Every mutation is one indivisible transaction; a failed call leaves the
//!   collection exactly as it was.
//! - Mutations take `&mut self`, so one handle never runs two writes at once.
//! - `list_all` orders by `created_at DESC, id DESC`.

use crate::db::DbError;
use crate::model::record::{Record, RecordFilter, RecordId, RecordValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

mod sqlite;

pub use sqlite::SqliteRecordStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Error taxonomy for store operations.
#[derive(Debug)]
pub enum StoreError {
    /// The backing medium cannot be opened or operated. Fatal to the session.
    StorageUnavailable(DbError),
    /// Rejected before any write was attempted.
    InvalidInput(RecordValidationError),
    /// The referenced record does not exist; nothing was changed.
    NotFound(RecordId),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StorageUnavailable(err) => write!(f, "storage unavailable: {err}"),
            Self::InvalidInput(err) => write!(f, "invalid input: {err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StorageUnavailable(err) => Some(err),
            Self::InvalidInput(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::StorageUnavailable(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::StorageUnavailable(DbError::Sqlite(value))
    }
}

impl From<RecordValidationError> for StoreError {
    fn from(value: RecordValidationError) -> Self {
        Self::InvalidInput(value)
    }
}

/// Durable record collection.
///
/// Implementations never retry internally.
pub trait RecordRepository {
    /// Persists a new open record with trimmed `text` and returns it.
    fn create(&mut self, text: &str) -> StoreResult<Record>;
    /// Replaces the text of an existing record. `done`, `id` and
    /// `created_at` are left untouched.
    fn update(&mut self, id: RecordId, text: &str) -> StoreResult<()>;
    /// Flips the completion flag.
    fn toggle_done(&mut self, id: RecordId) -> StoreResult<()>;
    fn delete(&mut self, id: RecordId) -> StoreResult<()>;
    /// Removes every record matching `filter` in one transaction and returns
    /// how many were removed.
    fn delete_where(&mut self, filter: RecordFilter) -> StoreResult<usize>;
    /// Full ordered read of committed state.
    fn list_all(&self) -> StoreResult<Vec<Record>>;
    fn get(&self, id: RecordId) -> StoreResult<Option<Record>>;
}
