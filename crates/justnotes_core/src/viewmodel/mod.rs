//! View-models that platform shells bind their screens to.

pub mod notes_view_model;
