//! Task list view model.
//!
//! # Responsibility
//! - Cache the latest full read of the store.
//! - Derive filtered projections from that cache.
//! - Dispatch user mutations to the store, one at a time.
//!
//! # Invariants
//! - `all` is only ever replaced wholesale by `refresh()`.
//! - A successful mutation is always followed by `refresh()`.
//! - A failed mutation (or failed refresh) leaves `all` untouched and the
//!   store error is returned unchanged.

use crate::model::record::{normalize_text, Record, RecordCounts, RecordFilter, RecordId};
use crate::store::{RecordRepository, StoreResult};
use log::{debug, warn};

/// Reload-after-write view over a record store.
pub struct TaskListViewModel<S: RecordRepository> {
    store: S,
    all: Vec<Record>,
    filter: RecordFilter,
}

impl<S: RecordRepository> TaskListViewModel<S> {
    /// Wraps `store` with an empty cache and the `All` filter.
    ///
    /// Callers must `refresh()` before the first render; see [`Self::load`].
    pub fn new(store: S) -> Self {
        Self {
            store,
            all: Vec::new(),
            filter: RecordFilter::All,
        }
    }

    /// Wraps `store` and performs the startup read.
    pub fn load(store: S) -> StoreResult<Self> {
        let mut view_model = Self::new(store);
        view_model.refresh()?;
        Ok(view_model)
    }

    /// Replaces the cache with a fresh full read.
    pub fn refresh(&mut self) -> StoreResult<()> {
        match self.store.list_all() {
            Ok(records) => {
                self.all = records;
                Ok(())
            }
            Err(err) => {
                warn!("event=view_refresh module=service status=error error={err}");
                Err(err)
            }
        }
    }

    /// Cached records matching the current filter, in store order.
    pub fn visible(&self) -> Vec<Record> {
        self.all
            .iter()
            .filter(|record| self.filter.matches(record))
            .cloned()
            .collect()
    }

    pub fn filter(&self) -> RecordFilter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: RecordFilter) {
        self.filter = filter;
    }

    /// Last full read, unfiltered.
    pub fn all(&self) -> &[Record] {
        &self.all
    }

    pub fn counts(&self) -> RecordCounts {
        RecordCounts::from_records(&self.all)
    }

    /// Whether "clear completed" would remove anything.
    pub fn has_completed(&self) -> bool {
        self.all.iter().any(|record| record.done)
    }

    /// Creates a record and reloads the cache.
    ///
    /// A `StorageUnavailable` error may come from the reload after the insert
    /// already committed; check `refresh()` before retrying to avoid a
    /// duplicate.
    pub fn add(&mut self, text: &str) -> StoreResult<Record> {
        let record = self.store.create(text)?;
        self.after_mutation("add")?;
        Ok(record)
    }

    /// Replaces the text of `id`.
    ///
    /// Blank text is rejected here before the store is touched.
    pub fn edit(&mut self, id: RecordId, text: &str) -> StoreResult<()> {
        let text = normalize_text(text)?;
        self.store.update(id, &text)?;
        self.after_mutation("edit")
    }

    pub fn toggle(&mut self, id: RecordId) -> StoreResult<()> {
        self.store.toggle_done(id)?;
        self.after_mutation("toggle")
    }

    pub fn remove(&mut self, id: RecordId) -> StoreResult<()> {
        self.store.delete(id)?;
        self.after_mutation("remove")
    }

    /// Deletes every completed record and returns how many were removed.
    ///
    /// Confirmation is the caller's job.
    pub fn clear_completed(&mut self) -> StoreResult<usize> {
        let removed = self.store.delete_where(RecordFilter::Completed)?;
        self.after_mutation("clear_completed")?;
        Ok(removed)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Gives the store back so the host can close it.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Reloads after a committed write. An error here means the write is
    /// already durable and only the cache is behind.
    fn after_mutation(&mut self, action: &'static str) -> StoreResult<()> {
        self.refresh()?;
        debug!(
            "event=view_mutation module=service status=ok action={action} total={}",
            self.all.len()
        );
        Ok(())
    }
}
