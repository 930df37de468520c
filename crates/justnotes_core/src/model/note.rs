//! Note domain model.
//!
//! # Responsibility
//! - Define the canonical note record shared by every front-end.
//! - Validate identity and timestamp invariants before persistence.
//!
//! # Invariants
//! - `id` is assigned by the store and never reused for another note.
//! - `created_at` is set once; `updated_at >= created_at` always.
//! - Timestamps are Unix epoch milliseconds.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned note identifier.
///
/// Positive values are live ids. `UNSAVED_NOTE_ID` marks a draft that has
/// not been added to a store yet.
pub type NoteId = i64;

/// Sentinel id for drafts that were never persisted.
pub const UNSAVED_NOTE_ID: NoteId = 0;

/// One note as owned by the store and copied out to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    /// Unix epoch milliseconds, immutable after creation.
    pub created_at: i64,
    /// Unix epoch milliseconds, refreshed by every update.
    pub updated_at: i64,
}

/// Reasons a note cannot be handed to a mutating operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    /// The note carries no store-assigned id.
    MissingId(NoteId),
    /// `updated_at` is earlier than `created_at`.
    TimestampOrder { created_at: i64, updated_at: i64 },
    /// `updated_at` is already at the largest representable instant.
    TimestampExhausted { updated_at: i64 },
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingId(id) => write!(f, "note has no store-assigned id (got {id})"),
            Self::TimestampOrder {
                created_at,
                updated_at,
            } => write!(
                f,
                "updated_at ({updated_at}) must not be earlier than created_at ({created_at})"
            ),
            Self::TimestampExhausted { updated_at } => {
                write!(f, "updated_at ({updated_at}) cannot advance any further")
            }
        }
    }
}

impl Error for NoteValidationError {}

impl Note {
    /// Builds a freshly created note whose timestamps are both `now_ms`.
    pub fn created(
        id: NoteId,
        title: impl Into<String>,
        content: impl Into<String>,
        now_ms: i64,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            content: content.into(),
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    /// Builds an unsaved draft. Drafts fail `validate()` until a store adds them.
    pub fn draft(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self::created(UNSAVED_NOTE_ID, title, content, 0)
    }

    /// Returns a copy with new title/content, leaving identity and timestamps alone.
    pub fn with_text(&self, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..self.clone()
        }
    }

    /// Checks id and timestamp invariants.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if !self.is_saved() {
            return Err(NoteValidationError::MissingId(self.id));
        }
        if self.updated_at < self.created_at {
            return Err(NoteValidationError::TimestampOrder {
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }
        Ok(())
    }

    /// Whether this note has been persisted by a store.
    pub fn is_saved(&self) -> bool {
        self.id > UNSAVED_NOTE_ID
    }
}

/// Seed notes offered to a fresh in-memory store.
pub fn sample_notes() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "Grocery List",
            "Milk, Eggs, Bread\n- Whole milk\n- Organic eggs",
        ),
        ("Meeting Notes", "Discuss Q3 roadmap with team."),
        ("Book Ideas", "- Sci-fi novel\n- KMP tutorial book"),
    ]
}
