//! In-memory note repository.
//!
//! Backs front-ends that run without a database file and the store tests.
//! Ids come from a counter that only moves forward.

use crate::model::note::{Note, NoteId};
use crate::repo::note_repo::{sort_by_recency, NoteRepository, RepoError, RepoResult};

/// Vec-backed repository with monotonically increasing ids.
#[derive(Debug, Default)]
pub struct InMemoryNoteRepository {
    notes: Vec<Note>,
    last_id: NoteId,
}

impl InMemoryNoteRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NoteRepository for InMemoryNoteRepository {
    fn insert_note(&mut self, title: &str, content: &str, now_ms: i64) -> RepoResult<Note> {
        self.last_id += 1;
        let note = Note::created(self.last_id, title, content, now_ms);
        self.notes.push(note.clone());
        Ok(note)
    }

    fn update_note(&mut self, note: &Note) -> RepoResult<()> {
        let stored = self
            .notes
            .iter_mut()
            .find(|stored| stored.id == note.id)
            .ok_or(RepoError::NotFound(note.id))?;
        stored.title.clone_from(&note.title);
        stored.content.clone_from(&note.content);
        stored.updated_at = note.updated_at;
        Ok(())
    }

    fn delete_note(&mut self, id: NoteId) -> RepoResult<bool> {
        let before = self.notes.len();
        self.notes.retain(|note| note.id != id);
        Ok(self.notes.len() != before)
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        Ok(self.notes.iter().find(|note| note.id == id).cloned())
    }

    fn list_notes(&self) -> RepoResult<Vec<Note>> {
        let mut notes = self.notes.clone();
        sort_by_recency(&mut notes);
        Ok(notes)
    }
}
