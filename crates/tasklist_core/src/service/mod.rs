//! Use-case layer over the record store.
//!
//! # Responsibility
//! - Keep presentation callers decoupled from storage details.

pub mod task_list;
