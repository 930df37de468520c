use justnotes_core::{
    InMemoryNoteRepository, ManualClock, Note, NoteId, NoteRepository, NoteStore, NoteUseCases,
    NotesUiState, NotesViewModel, RepoResult,
};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::timeout;

type Store = NoteStore<InMemoryNoteRepository>;

fn setup() -> (Arc<Store>, Arc<ManualClock>, NotesViewModel<InMemoryNoteRepository>) {
    let clock = Arc::new(ManualClock::new(1_000));
    let store = Arc::new(NoteStore::new(InMemoryNoteRepository::new()).with_clock(clock.clone()));
    let view_model = NotesViewModel::new(NoteUseCases::new(Arc::clone(&store)), Handle::current());
    (store, clock, view_model)
}

async fn wait_for<R: NoteRepository>(
    view_model: &NotesViewModel<R>,
    predicate: impl FnMut(&NotesUiState) -> bool,
) -> NotesUiState {
    let mut rx = view_model.subscribe_state();
    let state = timeout(Duration::from_secs(5), rx.wait_for(predicate))
        .await
        .expect("state did not settle in time")
        .expect("view-model state channel closed");
    state.clone()
}

#[tokio::test]
async fn loads_initial_list_and_clears_loading_flag() {
    let (store, _, view_model) = setup();
    store.add("existing", "").unwrap();

    let state = wait_for(&view_model, |state| !state.is_loading).await;
    assert_eq!(state.notes.len(), 1);
    assert_eq!(state.selected_note_id, None);
    assert_eq!(state.error_message, None);
}

#[tokio::test]
async fn add_note_selects_created_note() {
    let (_, _, view_model) = setup();
    view_model.add_note("Groceries", "Milk").await.unwrap();

    let state = wait_for(&view_model, |state| state.notes.len() == 1).await;
    let selected = state.selected_note.expect("created note is selected");
    assert_eq!(selected.title, "Groceries");
    assert_eq!(state.selected_note_id, Some(selected.id));
}

#[tokio::test]
async fn update_note_rerenders_list_in_new_order() {
    let (store, clock, view_model) = setup();
    let first = store.add("first", "").unwrap();
    clock.advance(1);
    store.add("second", "").unwrap();
    wait_for(&view_model, |state| state.notes.len() == 2).await;

    clock.advance(1);
    view_model.update_note(&first, "first v2", "body").await.unwrap();

    let state = wait_for(&view_model, |state| state.notes[0].title == "first v2").await;
    assert_eq!(state.notes[0].id, first.id);
    assert_eq!(state.notes[0].content, "body");
    assert_eq!(state.error_message, None);
}

#[tokio::test]
async fn selection_follows_latest_snapshot() {
    let (store, _, view_model) = setup();
    let note = store.add("draft", "").unwrap();
    wait_for(&view_model, |state| state.notes.len() == 1).await;

    view_model.select_note(Some(note.id));
    assert_eq!(view_model.state().selected_note, Some(note.clone()));

    store.update(&note.with_text("renamed", "")).unwrap();
    let state = wait_for(&view_model, |state| {
        state
            .selected_note
            .as_ref()
            .is_some_and(|selected| selected.title == "renamed")
    })
    .await;
    assert_eq!(state.selected_note_id, Some(note.id));

    view_model.select_note(None);
    let state = view_model.state();
    assert_eq!(state.selected_note_id, None);
    assert_eq!(state.selected_note, None);
}

#[tokio::test]
async fn deleting_selected_note_clears_selection() {
    let (store, _, view_model) = setup();
    let note = store.add("doomed", "").unwrap();
    wait_for(&view_model, |state| state.notes.len() == 1).await;
    view_model.select_note(Some(note.id));

    view_model.delete_note(note.id).await.unwrap();

    let state = wait_for(&view_model, |state| state.notes.is_empty()).await;
    assert_eq!(state.selected_note_id, None);
    assert_eq!(state.selected_note, None);
}

#[tokio::test]
async fn deleting_missing_note_surfaces_no_error() {
    let (store, _, view_model) = setup();
    store.add("keep", "").unwrap();
    wait_for(&view_model, |state| state.notes.len() == 1).await;

    view_model.delete_note(9_999).await.unwrap();

    let state = view_model.state();
    assert_eq!(state.error_message, None);
    assert_eq!(state.notes.len(), 1);
}

#[tokio::test]
async fn batch_delete_removes_every_listed_note() {
    let (store, _, view_model) = setup();
    let a = store.add("a", "").unwrap();
    let b = store.add("b", "").unwrap();
    let c = store.add("c", "").unwrap();
    wait_for(&view_model, |state| state.notes.len() == 3).await;

    view_model.delete_notes(vec![a.id, c.id]).await.unwrap();

    let state = wait_for(&view_model, |state| state.notes.len() == 1).await;
    assert_eq!(state.notes[0].id, b.id);
}

#[tokio::test]
async fn failed_update_sets_error_and_keeps_state() {
    let (store, _, view_model) = setup();
    let kept = store.add("kept", "").unwrap();
    let before = wait_for(&view_model, |state| state.notes.len() == 1).await;

    let mut ghost = kept.clone();
    ghost.id = 4_242;
    view_model.update_note(&ghost, "ghost", "").await.unwrap();

    let after = view_model.state();
    let message = after.error_message.clone().expect("error is surfaced");
    assert!(message.contains("not found"), "{message}");
    assert_eq!(after.notes, before.notes);

    view_model.clear_error();
    assert_eq!(view_model.state().error_message, None);
}

#[tokio::test]
async fn updating_a_draft_is_a_validation_error() {
    let (_, _, view_model) = setup();
    wait_for(&view_model, |state| !state.is_loading).await;

    view_model
        .update_note(&Note::draft("unsaved", ""), "unsaved", "")
        .await
        .unwrap();

    let message = view_model.state().error_message.expect("error is surfaced");
    assert!(message.contains("invalid note"), "{message}");
}

#[tokio::test]
async fn closed_view_model_ignores_late_results() {
    let (store, _, view_model) = setup();
    wait_for(&view_model, |state| !state.is_loading).await;
    let before = view_model.state();

    view_model.close();
    assert!(view_model.is_closed());
    view_model.add_note("after close", "").await.unwrap();
    view_model.select_note(Some(1));

    assert_eq!(view_model.state(), before);
    assert_eq!(store.snapshot().unwrap().len(), 0);
}

/// Holds every insert until the test releases it.
struct GatedRepo {
    inner: InMemoryNoteRepository,
    entered: mpsc::Sender<()>,
    release: mpsc::Receiver<()>,
}

impl NoteRepository for GatedRepo {
    fn insert_note(&mut self, title: &str, content: &str, now_ms: i64) -> RepoResult<Note> {
        self.entered.send(()).unwrap();
        self.release.recv().unwrap();
        self.inner.insert_note(title, content, now_ms)
    }

    fn update_note(&mut self, note: &Note) -> RepoResult<()> {
        self.inner.update_note(note)
    }

    fn delete_note(&mut self, id: NoteId) -> RepoResult<bool> {
        self.inner.delete_note(id)
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        self.inner.get_note(id)
    }

    fn list_notes(&self) -> RepoResult<Vec<Note>> {
        self.inner.list_notes()
    }
}

#[tokio::test]
async fn add_in_flight_at_close_lands_in_store_but_not_in_state() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let store = Arc::new(NoteStore::new(GatedRepo {
        inner: InMemoryNoteRepository::new(),
        entered: entered_tx,
        release: release_rx,
    }));
    let view_model = NotesViewModel::new(NoteUseCases::new(Arc::clone(&store)), Handle::current());
    wait_for(&view_model, |state| !state.is_loading).await;
    let before = view_model.state();

    let pending = view_model.add_note("in flight", "");
    tokio::task::spawn_blocking(move || entered_rx.recv_timeout(Duration::from_secs(5)))
        .await
        .unwrap()
        .expect("insert reached the backend");
    view_model.close();
    release_tx.send(()).unwrap();

    timeout(Duration::from_secs(5), pending)
        .await
        .expect("add finished after release")
        .unwrap();
    let stored = store.snapshot().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].title, "in flight");
    assert_eq!(view_model.state(), before);
}

#[tokio::test]
async fn dropping_view_model_releases_its_subscription() {
    let (store, _, view_model) = setup();
    wait_for(&view_model, |state| !state.is_loading).await;
    assert_eq!(store.subscriber_count(), 1);

    drop(view_model);
    timeout(Duration::from_secs(5), async {
        while store.subscriber_count() != 0 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("collector released its stream");
}
