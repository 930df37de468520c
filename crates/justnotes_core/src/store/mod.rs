//! Authoritative, observable note store.
//!
//! # Responsibility
//! - Own the note collection behind a single writer.
//! - Publish a fresh sorted snapshot after every committed mutation.
//!
//! # Invariants
//! - Snapshots are published while the writer lock is held, so observers
//!   see mutations in the order they were applied.
//! - Failed mutations never publish.

use crate::model::note::{NoteId, NoteValidationError};
use crate::repo::note_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod clock;
pub mod note_store;

pub type StoreResult<T> = Result<T, StoreError>;

/// Error taxonomy surfaced to use cases and view-models.
#[derive(Debug)]
pub enum StoreError {
    /// Target note does not exist.
    NotFound(NoteId),
    /// Caller handed over a note that fails validation.
    Validation(NoteValidationError),
    /// Persistent backend failure.
    Storage(RepoError),
    /// A writer panicked while holding the store lock.
    Poisoned,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::Validation(err) => write!(f, "invalid note: {err}"),
            Self::Storage(err) => write!(f, "storage failure: {err}"),
            Self::Poisoned => write!(f, "note store is unavailable after a writer panic"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::NotFound(_) | Self::Poisoned => None,
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Storage(other),
        }
    }
}

impl From<NoteValidationError> for StoreError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl StoreError {
    /// Stable machine-readable code for logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation",
            Self::Storage(_) => "storage",
            Self::Poisoned => "poisoned",
        }
    }
}
