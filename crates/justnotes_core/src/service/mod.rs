//! Core use-case layer.
//!
//! # Responsibility
//! - Forward view-model intents to the note store one operation at a time.
//! - Keep view-models decoupled from store internals.

pub mod note_use_cases;
