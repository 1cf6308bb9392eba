//! Task record domain model.
//!
//! # Responsibility
//! - Define the record shape returned by store reads.
//! - Own text normalization and the completion filters shared by the
//!   store (bulk delete predicate) and the view model (projections).
//!
//! # Invariants
//! - `id` is store-assigned and never reused for another record.
//! - `text` is stored trimmed and is never empty.
//! - `created_at` never changes after creation.

use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Store-assigned record identifier.
pub type RecordId = i64;

/// One stored task as last read from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub id: RecordId,
    pub text: String,
    pub done: bool,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Validation error for record text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordValidationError {
    /// Text is empty or whitespace only.
    EmptyText,
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyText => write!(f, "record text must not be empty"),
        }
    }
}

impl Error for RecordValidationError {}

/// Trims `text` and rejects it when nothing is left.
///
/// Both the store and the view model call this, so the persisted value is
/// always the normalized one.
pub fn normalize_text(text: &str) -> Result<String, RecordValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(RecordValidationError::EmptyText);
    }
    Ok(trimmed.to_string())
}

/// Completion filter over records.
///
/// Used as the view model projection and as the predicate of bulk deletes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecordFilter {
    #[default]
    All,
    /// `done = false`.
    Active,
    /// `done = true`.
    Completed,
}

impl RecordFilter {
    pub fn matches(self, record: &Record) -> bool {
        match self {
            Self::All => true,
            Self::Active => !record.done,
            Self::Completed => record.done,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

impl Display for RecordFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordFilter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            other => Err(format!(
                "unsupported filter `{other}`; expected all|active|completed"
            )),
        }
    }
}

/// Totals over a record sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecordCounts {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
}

impl RecordCounts {
    pub fn from_records(records: &[Record]) -> Self {
        let completed = records.iter().filter(|record| record.done).count();
        Self {
            total: records.len(),
            active: records.len() - completed,
            completed,
        }
    }
}
