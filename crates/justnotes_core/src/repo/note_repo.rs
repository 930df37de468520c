//! Note repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide insert/select/update/delete over the `notes` table.
//! - Keep SQL text inside the persistence boundary.
//!
//! # Invariants
//! - Ids come from `AUTOINCREMENT` and are never reused.
//! - Read paths reject rows that violate `Note::validate()` instead of
//!   masking them.

use crate::db::DbError;
use crate::model::note::{Note, NoteId};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::cmp::Reverse;
use std::error::Error;
use std::fmt::{Display, Formatter};

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    title,
    content,
    created_at,
    updated_at
FROM notes";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for note persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(NoteId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage contract behind the note store.
///
/// Implementations are driven by a single writer; the store serializes
/// every call, so backends need no internal locking.
pub trait NoteRepository: Send + 'static {
    /// Inserts a note stamped with `now_ms` and returns it with its new id.
    fn insert_note(&mut self, title: &str, content: &str, now_ms: i64) -> RepoResult<Note>;
    /// Overwrites title, content and `updated_at` of the row with `note.id`.
    fn update_note(&mut self, note: &Note) -> RepoResult<()>;
    /// Removes one note. Returns whether a row was removed.
    fn delete_note(&mut self, id: NoteId) -> RepoResult<bool>;
    /// Point lookup.
    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Full scan ordered by `updated_at DESC, id ASC`.
    fn list_notes(&self) -> RepoResult<Vec<Note>>;
}

impl<R: NoteRepository + ?Sized> NoteRepository for Box<R> {
    fn insert_note(&mut self, title: &str, content: &str, now_ms: i64) -> RepoResult<Note> {
        (**self).insert_note(title, content, now_ms)
    }

    fn update_note(&mut self, note: &Note) -> RepoResult<()> {
        (**self).update_note(note)
    }

    fn delete_note(&mut self, id: NoteId) -> RepoResult<bool> {
        (**self).delete_note(id)
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        (**self).get_note(id)
    }

    fn list_notes(&self) -> RepoResult<Vec<Note>> {
        (**self).list_notes()
    }
}

/// Orders notes newest first; equal timestamps keep id (insertion) order.
pub fn sort_by_recency(notes: &mut [Note]) {
    notes.sort_by_key(|note| (Reverse(note.updated_at), note.id));
}

/// SQLite-backed note repository owning its connection.
pub struct SqliteNoteRepository {
    conn: Connection,
}

impl SqliteNoteRepository {
    /// Wraps a migrated connection after checking the `notes` schema.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        ensure_connection_ready(&conn)?;
        Ok(Self { conn })
    }

    /// Borrows the underlying connection for diagnostics and tests.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl NoteRepository for SqliteNoteRepository {
    fn insert_note(&mut self, title: &str, content: &str, now_ms: i64) -> RepoResult<Note> {
        self.conn.execute(
            "INSERT INTO notes (title, content, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3);",
            params![title, content, now_ms],
        )?;
        let id = self.conn.last_insert_rowid();
        Ok(Note::created(id, title, content, now_ms))
    }

    fn update_note(&mut self, note: &Note) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notes
             SET
                title = ?2,
                content = ?3,
                updated_at = ?4
             WHERE id = ?1;",
            params![
                note.id,
                note.title.as_str(),
                note.content.as_str(),
                note.updated_at
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(note.id));
        }
        Ok(())
    }

    fn delete_note(&mut self, id: NoteId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM notes WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
        let raw = stmt.query_row([id], read_note_row).optional()?;
        raw.map(checked).transpose()
    }

    fn list_notes(&self) -> RepoResult<Vec<Note>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "{NOTE_SELECT_SQL} ORDER BY updated_at DESC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(checked(read_note_row(row)?)?);
        }
        Ok(notes)
    }
}

fn read_note_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    Ok(Note {
        id: row.get("id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn checked(note: Note) -> RepoResult<Note> {
    note.validate()
        .map_err(|err| RepoError::InvalidData(format!("notes row {}: {err}", note.id)))?;
    Ok(note)
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = 'notes'
        );",
        [],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(RepoError::InvalidData(
            "missing required table `notes`; was the connection migrated?".to_string(),
        ));
    }

    let mut stmt = conn.prepare("PRAGMA table_info(notes);")?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    for required in ["id", "title", "content", "created_at", "updated_at"] {
        if !columns.iter().any(|column| column == required) {
            return Err(RepoError::InvalidData(format!(
                "missing required column `notes.{required}`"
            )));
        }
    }

    Ok(())
}
