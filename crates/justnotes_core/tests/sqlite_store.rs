use justnotes_core::db::{open_db, open_db_in_memory};
use justnotes_core::{
    ManualClock, NoteRepository, NoteStore, SqliteNoteRepository, StoreError,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

fn sqlite_store(
    conn: rusqlite::Connection,
    clock: Arc<ManualClock>,
) -> NoteStore<SqliteNoteRepository> {
    NoteStore::new(SqliteNoteRepository::try_new(conn).unwrap()).with_clock(clock)
}

fn file_store(path: &Path, clock: Arc<ManualClock>) -> NoteStore<SqliteNoteRepository> {
    sqlite_store(open_db(path).unwrap(), clock)
}

#[test]
fn sqlite_crud_roundtrip() {
    let clock = Arc::new(ManualClock::new(1_000));
    let store = sqlite_store(open_db_in_memory().unwrap(), clock.clone());

    let note = store.add("Groceries", "Milk").unwrap();
    assert_eq!(note.id, 1);
    assert_eq!(store.get_by_id(note.id).unwrap(), Some(note.clone()));

    clock.advance(5);
    let updated = store.update(&note.with_text("Groceries v2", "Milk")).unwrap();
    assert_eq!(updated.updated_at, 1_005);
    assert_eq!(store.get_by_id(note.id).unwrap(), Some(updated));

    store.delete_by_id(note.id).unwrap();
    assert_eq!(store.get_by_id(note.id).unwrap(), None);
    store.delete_by_id(note.id).unwrap();
}

#[test]
fn sqlite_update_of_missing_note_is_not_found() {
    let store = sqlite_store(open_db_in_memory().unwrap(), Arc::new(ManualClock::new(0)));
    let note = store.add("a", "").unwrap();
    store.delete_by_id(note.id).unwrap();

    let err = store.update(&note).expect_err("deleted note must not update");
    assert!(matches!(err, StoreError::NotFound(id) if id == note.id));
}

#[test]
fn scan_orders_by_updated_desc_then_insertion() {
    let clock = Arc::new(ManualClock::new(500));
    let store = sqlite_store(open_db_in_memory().unwrap(), clock.clone());
    let a = store.add("a", "").unwrap();
    let b = store.add("b", "").unwrap();
    clock.advance(1);
    let c = store.add("c", "").unwrap();

    let ids: Vec<_> = store.snapshot().unwrap().iter().map(|note| note.id).collect();
    assert_eq!(ids, vec![c.id, a.id, b.id]);
}

#[test]
fn warm_snapshot_matches_fresh_backend_scan() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.db");
    let clock = Arc::new(ManualClock::new(10));
    let store = file_store(&path, clock.clone());
    let stream = store.list().unwrap();

    let first = store.add("first", "").unwrap();
    clock.advance(3);
    store.add("second", "").unwrap();
    clock.advance(3);
    store.update(&first.with_text("first edited", "")).unwrap();

    let reader = SqliteNoteRepository::try_new(open_db(&path).unwrap()).unwrap();
    assert_eq!(*stream.current(), reader.list_notes().unwrap());
}

#[test]
fn notes_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.db");
    let clock = Arc::new(ManualClock::new(77));

    let created = {
        let store = file_store(&path, clock.clone());
        store.add("persisted", "body").unwrap()
    };

    let reopened = file_store(&path, clock);
    let snapshot = reopened.snapshot().unwrap();
    assert_eq!(snapshot.as_slice(), [created]);
}

#[test]
fn resubscribe_within_grace_skips_backend_scan() {
    let store = sqlite_store(open_db_in_memory().unwrap(), Arc::new(ManualClock::new(0)))
        .with_subscriber_grace(Duration::from_secs(30));
    store.add("a", "").unwrap();

    drop(store.list().unwrap());
    drop(store.list().unwrap());
    let stream = store.list().unwrap();

    assert_eq!(store.backend_scans(), 1);
    assert_eq!(stream.current().len(), 1);
}
