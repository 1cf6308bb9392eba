//! Core of the task list: durable record store and the view model over it.
//! This crate is the single source of truth for record invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;

pub use db::OpenOptions;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::record::{
    normalize_text, Record, RecordCounts, RecordFilter, RecordId, RecordValidationError,
};
pub use service::task_list::TaskListViewModel;
pub use store::{RecordRepository, SqliteRecordStore, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
