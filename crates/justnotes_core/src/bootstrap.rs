//! Application start-up wiring.
//!
//! Builds the one store instance a process owns from `CoreConfig`. Front-ends
//! call this once and hand the `Arc` to their use cases.

use crate::config::{CoreConfig, StorageMode};
use crate::db::open_db;
use crate::repo::memory_repo::InMemoryNoteRepository;
use crate::repo::note_repo::{NoteRepository, RepoError, SqliteNoteRepository};
use crate::store::note_store::NoteStore;
use crate::store::StoreResult;
use log::info;
use std::sync::Arc;

/// Store type whose backend is picked at runtime.
pub type DynNoteStore = NoteStore<Box<dyn NoteRepository>>;

/// Opens the configured backend and returns the shared store.
///
/// # Side effects
/// - SQLite mode creates the database directory and runs migrations.
/// - Seeds sample notes into an empty store when `seed_samples` is set.
pub fn open_note_store(config: &CoreConfig) -> StoreResult<Arc<DynNoteStore>> {
    let repo: Box<dyn NoteRepository> = match &config.storage {
        StorageMode::InMemory => Box::new(InMemoryNoteRepository::new()),
        StorageMode::Sqlite(path) => {
            let conn = open_db(path).map_err(RepoError::from)?;
            Box::new(SqliteNoteRepository::try_new(conn)?)
        }
    };

    let store = NoteStore::new(repo).with_subscriber_grace(config.subscriber_grace);
    let seeded = if config.seed_samples {
        store.seed_samples()?
    } else {
        0
    };
    info!(
        "event=store_open module=bootstrap status=ok storage={} seeded={seeded}",
        match config.storage {
            StorageMode::InMemory => "memory",
            StorageMode::Sqlite(_) => "sqlite",
        }
    );
    Ok(Arc::new(store))
}
