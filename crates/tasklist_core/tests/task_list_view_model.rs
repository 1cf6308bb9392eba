use std::cell::Cell;
use std::rc::Rc;
use tasklist_core::db::DbError;
use tasklist_core::{
    Record, RecordCounts, RecordFilter, RecordId, RecordRepository, SqliteRecordStore, StoreError,
    StoreResult, TaskListViewModel,
};

fn view_model() -> TaskListViewModel<SqliteRecordStore> {
    TaskListViewModel::load(SqliteRecordStore::open_in_memory().unwrap()).unwrap()
}

/// Store wrapper whose reads can be switched to fail from outside.
struct FlakyStore {
    inner: SqliteRecordStore,
    fail_list: Rc<Cell<bool>>,
    update_calls: usize,
}

impl FlakyStore {
    fn new() -> (Self, Rc<Cell<bool>>) {
        let fail_list = Rc::new(Cell::new(false));
        let store = Self {
            inner: SqliteRecordStore::open_in_memory().unwrap(),
            fail_list: Rc::clone(&fail_list),
            update_calls: 0,
        };
        (store, fail_list)
    }
}

impl RecordRepository for FlakyStore {
    fn create(&mut self, text: &str) -> StoreResult<Record> {
        self.inner.create(text)
    }

    fn update(&mut self, id: RecordId, text: &str) -> StoreResult<()> {
        self.update_calls += 1;
        self.inner.update(id, text)
    }

    fn toggle_done(&mut self, id: RecordId) -> StoreResult<()> {
        self.inner.toggle_done(id)
    }

    fn delete(&mut self, id: RecordId) -> StoreResult<()> {
        self.inner.delete(id)
    }

    fn delete_where(&mut self, filter: RecordFilter) -> StoreResult<usize> {
        self.inner.delete_where(filter)
    }

    fn list_all(&self) -> StoreResult<Vec<Record>> {
        if self.fail_list.get() {
            return Err(StoreError::StorageUnavailable(DbError::InvalidData(
                "injected read failure".to_string(),
            )));
        }
        self.inner.list_all()
    }

    fn get(&self, id: RecordId) -> StoreResult<Option<Record>> {
        self.inner.get(id)
    }
}

#[test]
fn new_view_model_starts_empty_with_all_filter() {
    let view_model = TaskListViewModel::new(SqliteRecordStore::open_in_memory().unwrap());

    assert!(view_model.all().is_empty());
    assert_eq!(view_model.filter(), RecordFilter::All);
}

#[test]
fn load_reads_existing_records() {
    let mut store = SqliteRecordStore::open_in_memory().unwrap();
    store.create("already there").unwrap();

    let view_model = TaskListViewModel::load(store).unwrap();

    assert_eq!(view_model.all().len(), 1);
    assert_eq!(view_model.visible()[0].text, "already there");
}

#[test]
fn buy_milk_lifecycle() {
    let mut view_model = view_model();

    let milk = view_model.add("Buy milk").unwrap();
    assert_eq!(view_model.visible(), vec![milk.clone()]);

    view_model.toggle(milk.id).unwrap();
    assert!(view_model.all()[0].done);

    view_model.set_filter(RecordFilter::Active);
    assert!(view_model.visible().is_empty());

    view_model.set_filter(RecordFilter::Completed);
    let completed = view_model.visible();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].id, milk.id);

    assert_eq!(view_model.clear_completed().unwrap(), 1);
    assert!(view_model.all().is_empty());
    assert!(view_model.store().list_all().unwrap().is_empty());
}

#[test]
fn visible_keeps_store_order_under_each_filter() {
    let mut view_model = view_model();
    let r1 = view_model.add("R1").unwrap();
    let r2 = view_model.add("R2").unwrap();
    let r3 = view_model.add("R3").unwrap();
    view_model.toggle(r2.id).unwrap();

    let ids = |records: Vec<Record>| records.into_iter().map(|r| r.id).collect::<Vec<_>>();

    assert_eq!(ids(view_model.visible()), vec![r3.id, r2.id, r1.id]);
    view_model.set_filter(RecordFilter::Active);
    assert_eq!(ids(view_model.visible()), vec![r3.id, r1.id]);
    view_model.set_filter(RecordFilter::Completed);
    assert_eq!(ids(view_model.visible()), vec![r2.id]);
}

#[test]
fn every_mutation_refreshes_the_cache() {
    let mut view_model = view_model();

    let task = view_model.add("draft").unwrap();
    assert_eq!(view_model.all().len(), 1);

    view_model.edit(task.id, "final").unwrap();
    assert_eq!(view_model.all()[0].text, "final");
    assert_eq!(view_model.all()[0].created_at, task.created_at);

    view_model.toggle(task.id).unwrap();
    assert!(view_model.all()[0].done);

    view_model.remove(task.id).unwrap();
    assert!(view_model.all().is_empty());
}

#[test]
fn add_with_empty_text_fails_and_leaves_cache_empty() {
    let mut view_model = view_model();

    let err = view_model.add("").unwrap_err();

    assert!(err.is_invalid_input());
    assert!(view_model.all().is_empty());
    assert!(view_model.store().list_all().unwrap().is_empty());
}

#[test]
fn edit_rejects_blank_text_without_calling_the_store() {
    let (mut store, _) = FlakyStore::new();
    let task = store.create("keep").unwrap();
    let mut view_model = TaskListViewModel::load(store).unwrap();

    let err = view_model.edit(task.id, "   ").unwrap_err();

    assert!(err.is_invalid_input());
    assert_eq!(view_model.store().update_calls, 0);
    assert_eq!(view_model.all()[0].text, "keep");
}

#[test]
fn failed_mutation_surfaces_not_found_and_keeps_visible_state() {
    let mut view_model = view_model();
    let task = view_model.add("only").unwrap();
    let before = view_model.visible();
    let missing = task.id + 1;

    assert!(matches!(
        view_model.toggle(missing).unwrap_err(),
        StoreError::NotFound(id) if id == missing
    ));
    assert!(view_model.remove(missing).unwrap_err().is_not_found());
    assert!(view_model.edit(missing, "x").unwrap_err().is_not_found());

    assert_eq!(view_model.visible(), before);
}

#[test]
fn failed_refresh_keeps_previous_cache() {
    let (store, fail_list) = FlakyStore::new();
    let mut view_model = TaskListViewModel::load(store).unwrap();
    view_model.add("first").unwrap();
    let before = view_model.all().to_vec();

    fail_list.set(true);
    assert!(view_model.refresh().unwrap_err().is_storage_unavailable());
    assert_eq!(view_model.all(), before.as_slice());

    let err = view_model.add("second").unwrap_err();
    assert!(err.is_storage_unavailable());
    assert_eq!(view_model.all(), before.as_slice());

    fail_list.set(false);
    view_model.refresh().unwrap();
    assert_eq!(view_model.all().len(), 2);
    assert_eq!(view_model.all()[0].text, "second");
}

#[test]
fn clear_completed_with_nothing_completed_returns_zero() {
    let mut view_model = view_model();
    view_model.add("open").unwrap();

    assert!(!view_model.has_completed());
    assert_eq!(view_model.clear_completed().unwrap(), 0);
    assert_eq!(view_model.all().len(), 1);
}

#[test]
fn counts_follow_the_cache() {
    let mut view_model = view_model();
    let a = view_model.add("a").unwrap();
    view_model.add("b").unwrap();
    view_model.toggle(a.id).unwrap();

    assert!(view_model.has_completed());
    assert_eq!(
        view_model.counts(),
        RecordCounts {
            total: 2,
            active: 1,
            completed: 1
        }
    );
}

#[test]
fn visible_records_serialize_for_hosts() {
    let mut view_model = view_model();
    let task = view_model.add("serialize me").unwrap();

    let json = serde_json::to_value(view_model.visible()).unwrap();

    assert_eq!(json[0]["id"], task.id);
    assert_eq!(json[0]["text"], "serialize me");
    assert_eq!(json[0]["done"], false);
}
