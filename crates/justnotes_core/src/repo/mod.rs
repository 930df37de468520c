//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the narrow data access contract the note store relies on.
//! - Isolate SQLite query details from store orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.
//! - List reads are ordered by `updated_at DESC, id ASC` in every backend.

pub mod memory_repo;
pub mod note_repo;
