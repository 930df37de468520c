//! Shared note core for the JustNotes front-ends.
//! This crate is the single source of truth for note invariants.

pub mod bootstrap;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;
pub mod viewmodel;

pub use bootstrap::{open_note_store, DynNoteStore};
pub use config::{CoreConfig, StorageMode};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::note::{sample_notes, Note, NoteId, NoteValidationError, UNSAVED_NOTE_ID};
pub use repo::memory_repo::InMemoryNoteRepository;
pub use repo::note_repo::{NoteRepository, RepoError, RepoResult, SqliteNoteRepository};
pub use service::note_use_cases::{
    AddNote, DeleteNote, GetNote, ListNotes, NoteUseCases, UpdateNote,
};
pub use store::clock::{Clock, ManualClock, SystemClock};
pub use store::note_store::{NoteSnapshot, NoteStore, NoteStream, DEFAULT_SUBSCRIBER_GRACE};
pub use store::{StoreError, StoreResult};
pub use viewmodel::notes_view_model::{NotesUiState, NotesViewModel};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
