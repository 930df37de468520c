//! Domain model shared by store, use cases and view-models.
//!
//! # Invariants
//! - Every note is identified by a store-assigned `NoteId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod note;
