//! Platform-neutral notes view-model.
//!
//! # Responsibility
//! - Mirror the store's snapshot stream into one observable `NotesUiState`.
//! - Run UI intents on blocking workers and marshal results back into state.
//! - Track the selected note (`None` means composing a new note).
//!
//! # Invariants
//! - After `close()` nothing writes to state, including mutations that were
//!   already running when the scope ended.
//! - Failures only set `error_message`; the rest of the state is kept.

use crate::model::note::{Note, NoteId};
use crate::repo::note_repo::NoteRepository;
use crate::service::note_use_cases::NoteUseCases;
use crate::store::note_store::NoteSnapshot;
use crate::store::{StoreError, StoreResult};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Everything a notes screen renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotesUiState {
    /// Sorted newest first.
    pub notes: NoteSnapshot,
    /// `None` means "compose a new note".
    pub selected_note_id: Option<NoteId>,
    /// The selected note as found in `notes`.
    pub selected_note: Option<Note>,
    /// True until the first snapshot arrives.
    pub is_loading: bool,
    /// Last user-visible failure, if any.
    pub error_message: Option<String>,
}

impl NotesUiState {
    fn refresh_selection(&mut self) {
        self.selected_note = self
            .selected_note_id
            .and_then(|id| self.notes.iter().find(|note| note.id == id).cloned());
    }
}

#[derive(Default)]
struct ViewScope {
    closed: AtomicBool,
}

impl ViewScope {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// Bridges one UI scope to the note use cases.
pub struct NotesViewModel<R: NoteRepository> {
    use_cases: NoteUseCases<R>,
    runtime: Handle,
    state: Arc<watch::Sender<NotesUiState>>,
    scope: Arc<ViewScope>,
    collector: JoinHandle<()>,
}

impl<R: NoteRepository> NotesViewModel<R> {
    /// Starts observing the note list on `runtime`.
    pub fn new(use_cases: NoteUseCases<R>, runtime: Handle) -> Self {
        let (state, _) = watch::channel(NotesUiState {
            is_loading: true,
            ..NotesUiState::default()
        });
        let state = Arc::new(state);
        let scope = Arc::new(ViewScope::default());
        let collector = runtime.spawn(collect_notes(
            use_cases.clone(),
            Arc::clone(&state),
            Arc::clone(&scope),
        ));

        Self {
            use_cases,
            runtime,
            state,
            scope,
            collector,
        }
    }

    /// Current state copy.
    pub fn state(&self) -> NotesUiState {
        self.state.borrow().clone()
    }

    /// Receiver for UI re-render triggers.
    pub fn subscribe_state(&self) -> watch::Receiver<NotesUiState> {
        self.state.subscribe()
    }

    /// Selects a note for the detail screen; `None` switches to compose mode.
    pub fn select_note(&self, id: Option<NoteId>) {
        modify_open(&self.state, &self.scope, |state| {
            state.selected_note_id = id;
            state.refresh_selection();
        });
    }

    /// Creates a note and selects it once stored.
    pub fn add_note(&self, title: impl Into<String>, content: impl Into<String>) -> JoinHandle<()> {
        let (title, content) = (title.into(), content.into());
        self.dispatch(
            "note_add",
            move |use_cases| use_cases.add.run(&title, &content),
            |state, note: Note| {
                state.selected_note_id = Some(note.id);
                state.refresh_selection();
                if state.selected_note.is_none() {
                    // Snapshot not collected yet.
                    state.selected_note = Some(note);
                }
            },
        )
    }

    /// Saves new title/content for `note`.
    pub fn update_note(
        &self,
        note: &Note,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> JoinHandle<()> {
        let edited = note.with_text(title, content);
        self.dispatch(
            "note_update",
            move |use_cases| use_cases.update.run(&edited),
            |_, _| {},
        )
    }

    /// Deletes one note and drops the selection if it pointed there.
    pub fn delete_note(&self, id: NoteId) -> JoinHandle<()> {
        self.delete_notes(vec![id])
    }

    /// Deletes several notes, continuing past failures and reporting the first.
    pub fn delete_notes(&self, ids: Vec<NoteId>) -> JoinHandle<()> {
        let requested = ids.clone();
        self.dispatch(
            "note_delete",
            move |use_cases| {
                let mut first_error: Option<StoreError> = None;
                for id in &ids {
                    if let Err(err) = use_cases.delete.run(*id) {
                        first_error.get_or_insert(err);
                    }
                }
                first_error.map_or(Ok(()), Err)
            },
            move |state, ()| {
                if state
                    .selected_note_id
                    .is_some_and(|selected| requested.contains(&selected))
                {
                    state.selected_note_id = None;
                    state.selected_note = None;
                }
            },
        )
    }

    /// Dismisses the last error.
    pub fn clear_error(&self) {
        self.state.send_if_modified(|state| {
            !self.scope.is_closed() && state.error_message.take().is_some()
        });
    }

    /// Ends the UI scope. Idempotent.
    pub fn close(&self) {
        // Flipped under the state lock so no in-flight write lands after it.
        let mut already_closed = true;
        self.state.send_if_modified(|_| {
            already_closed = self.scope.closed.swap(true, Ordering::AcqRel);
            false
        });
        if already_closed {
            return;
        }
        self.collector.abort();
        info!("event=vm_close module=viewmodel status=ok");
    }

    pub fn is_closed(&self) -> bool {
        self.scope.is_closed()
    }

    fn dispatch<T, Op, Apply>(&self, event: &'static str, op: Op, apply: Apply) -> JoinHandle<()>
    where
        T: Send + 'static,
        Op: FnOnce(&NoteUseCases<R>) -> StoreResult<T> + Send + 'static,
        Apply: FnOnce(&mut NotesUiState, T) + Send + 'static,
    {
        let use_cases = self.use_cases.clone();
        let state = Arc::clone(&self.state);
        let scope = Arc::clone(&self.scope);
        self.runtime.spawn(async move {
            if scope.is_closed() {
                return;
            }
            let outcome = tokio::task::spawn_blocking(move || op(&use_cases)).await;
            if scope.is_closed() {
                debug!("event={event} module=viewmodel status=discarded reason=scope_closed");
                return;
            }

            let message = match outcome {
                Ok(Ok(value)) => {
                    modify_open(&state, &scope, |state| {
                        state.error_message = None;
                        apply(state, value);
                    });
                    return;
                }
                Ok(Err(err)) => err.to_string(),
                Err(join_err) => format!("operation did not complete: {join_err}"),
            };
            warn!("event={event} module=viewmodel status=error error={message}");
            modify_open(&state, &scope, |state| state.error_message = Some(message));
        })
    }
}

impl<R: NoteRepository> Drop for NotesViewModel<R> {
    fn drop(&mut self) {
        self.close();
    }
}

async fn collect_notes<R: NoteRepository>(
    use_cases: NoteUseCases<R>,
    state: Arc<watch::Sender<NotesUiState>>,
    scope: Arc<ViewScope>,
) {
    // Subscribing may scan the backend.
    let subscribed = tokio::task::spawn_blocking(move || use_cases.list.run()).await;
    let mut stream = match subscribed {
        Ok(Ok(stream)) => stream,
        Ok(Err(err)) => return report_collect_failure(&state, &scope, err.to_string()),
        Err(join_err) => return report_collect_failure(&state, &scope, join_err.to_string()),
    };

    while let Some(snapshot) = stream.next().await {
        let applied = modify_open(&state, &scope, |state| {
            state.notes = snapshot;
            state.is_loading = false;
            state.refresh_selection();
        });
        if !applied {
            break;
        }
    }
    debug!("event=vm_collect module=viewmodel status=stopped");
}

fn report_collect_failure(
    state: &watch::Sender<NotesUiState>,
    scope: &ViewScope,
    message: String,
) {
    warn!("event=vm_collect module=viewmodel status=error error={message}");
    modify_open(state, scope, |state| {
        state.is_loading = false;
        state.error_message = Some(message);
    });
}

/// Writes `state` unless the scope is closed. Returns whether it wrote.
///
/// The closed check runs under the channel's write lock, the same lock
/// `close()` flips the flag under.
fn modify_open(
    state: &watch::Sender<NotesUiState>,
    scope: &ViewScope,
    modify: impl FnOnce(&mut NotesUiState),
) -> bool {
    state.send_if_modified(|current| {
        if scope.is_closed() {
            return false;
        }
        modify(current);
        true
    })
}
