//! Domain model for the task list.
//!
//! # Invariants
//! - Every record is identified by a store-assigned `RecordId`.
//! - Deletion is a hard delete; ids are still never reused.

pub mod record;
