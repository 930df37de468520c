//! Note use cases.
//!
//! # Responsibility
//! - Give view-models one narrow entry point per operation.
//! - Reject malformed input before it reaches the store.
//!
//! # Invariants
//! - Use cases add no behaviour beyond parameter validation; ordering,
//!   timestamps and ids stay the store's job.

use crate::model::note::{Note, NoteId};
use crate::repo::note_repo::NoteRepository;
use crate::store::note_store::{NoteStore, NoteStream};
use crate::store::StoreResult;
use std::sync::Arc;

/// Creates a note from title and content.
pub struct AddNote<R: NoteRepository> {
    store: Arc<NoteStore<R>>,
}

impl<R: NoteRepository> AddNote<R> {
    pub fn new(store: Arc<NoteStore<R>>) -> Self {
        Self { store }
    }

    pub fn run(&self, title: &str, content: &str) -> StoreResult<Note> {
        self.store.add(title, content)
    }
}

/// Saves edited title/content of an existing note.
pub struct UpdateNote<R: NoteRepository> {
    store: Arc<NoteStore<R>>,
}

impl<R: NoteRepository> UpdateNote<R> {
    pub fn new(store: Arc<NoteStore<R>>) -> Self {
        Self { store }
    }

    /// # Errors
    /// - `StoreError::Validation` for drafts without a store-assigned id.
    /// - `StoreError::NotFound` when the note no longer exists.
    pub fn run(&self, note: &Note) -> StoreResult<Note> {
        note.validate()?;
        self.store.update(note)
    }
}

/// Deletes a note; unknown ids are ignored.
pub struct DeleteNote<R: NoteRepository> {
    store: Arc<NoteStore<R>>,
}

impl<R: NoteRepository> DeleteNote<R> {
    pub fn new(store: Arc<NoteStore<R>>) -> Self {
        Self { store }
    }

    pub fn run(&self, id: NoteId) -> StoreResult<()> {
        self.store.delete_by_id(id)
    }
}

/// Looks up one note.
pub struct GetNote<R: NoteRepository> {
    store: Arc<NoteStore<R>>,
}

impl<R: NoteRepository> GetNote<R> {
    pub fn new(store: Arc<NoteStore<R>>) -> Self {
        Self { store }
    }

    pub fn run(&self, id: NoteId) -> StoreResult<Option<Note>> {
        self.store.get_by_id(id)
    }
}

/// Subscribes to the sorted note list.
pub struct ListNotes<R: NoteRepository> {
    store: Arc<NoteStore<R>>,
}

impl<R: NoteRepository> ListNotes<R> {
    pub fn new(store: Arc<NoteStore<R>>) -> Self {
        Self { store }
    }

    pub fn run(&self) -> StoreResult<NoteStream> {
        self.store.list()
    }
}

/// All note use cases wired to one store.
pub struct NoteUseCases<R: NoteRepository> {
    pub add: AddNote<R>,
    pub update: UpdateNote<R>,
    pub delete: DeleteNote<R>,
    pub get: GetNote<R>,
    pub list: ListNotes<R>,
}

impl<R: NoteRepository> NoteUseCases<R> {
    pub fn new(store: Arc<NoteStore<R>>) -> Self {
        Self {
            add: AddNote::new(Arc::clone(&store)),
            update: UpdateNote::new(Arc::clone(&store)),
            delete: DeleteNote::new(Arc::clone(&store)),
            get: GetNote::new(Arc::clone(&store)),
            list: ListNotes::new(store),
        }
    }
}

// Manual impl: derive would demand `R: Clone`.
impl<R: NoteRepository> Clone for NoteUseCases<R> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.add.store))
    }
}

#[cfg(test)]
mod tests {
    use super::NoteUseCases;
    use crate::model::note::Note;
    use crate::repo::memory_repo::InMemoryNoteRepository;
    use crate::store::note_store::NoteStore;
    use crate::store::StoreError;
    use std::sync::Arc;

    fn use_cases() -> NoteUseCases<InMemoryNoteRepository> {
        NoteUseCases::new(Arc::new(NoteStore::new(InMemoryNoteRepository::new())))
    }

    #[test]
    fn update_rejects_draft_without_id() {
        let use_cases = use_cases();
        let err = use_cases
            .update
            .run(&Note::draft("no id", ""))
            .expect_err("drafts must be rejected");
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn update_of_deleted_note_is_not_found() {
        let use_cases = use_cases();
        let note = use_cases.add.run("gone", "").unwrap();
        use_cases.delete.run(note.id).unwrap();
        let err = use_cases.update.run(&note).expect_err("missing note");
        assert!(matches!(err, StoreError::NotFound(id) if id == note.id));
    }

    #[test]
    fn clones_share_the_same_store() {
        let use_cases = use_cases();
        let cloned = use_cases.clone();
        let note = cloned.add.run("shared", "").unwrap();
        assert_eq!(use_cases.get.run(note.id).unwrap(), Some(note));
    }
}
