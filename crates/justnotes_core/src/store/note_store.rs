//! Single-writer note store with a multicast snapshot stream.
//!
//! # Responsibility
//! - Serialize add/update/delete against one `NoteRepository`.
//! - Keep a sorted in-memory copy warm while anyone is watching and publish
//!   it through a `tokio::sync::watch` channel.
//!
//! # Invariants
//! - Lock order is writer, then presence. Stream handles only take presence.
//! - `update` strictly increases `updated_at` and never touches `created_at`.
//! - A subscription inside the grace window after the last handle dropped
//!   reuses the warm copy; outside it, exactly one backend scan runs.

use crate::model::note::{sample_notes, Note, NoteId, NoteValidationError};
use crate::repo::note_repo::{sort_by_recency, NoteRepository};
use crate::store::clock::{Clock, SystemClock};
use crate::store::{StoreError, StoreResult};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Default time the warm list survives after the last subscriber leaves.
pub const DEFAULT_SUBSCRIBER_GRACE: Duration = Duration::from_secs(5);

/// Immutable, shareable copy of the sorted note list.
pub type NoteSnapshot = Arc<Vec<Note>>;

struct Writer<R> {
    repo: R,
    /// Sorted copy of the backend. `None` means cold: the next subscription scans.
    warm: Option<Vec<Note>>,
}

#[derive(Default)]
struct Presence {
    live: usize,
    idle_since: Option<Instant>,
}

type SharedPresence = Arc<Mutex<Presence>>;

fn lock_presence(presence: &Mutex<Presence>) -> MutexGuard<'_, Presence> {
    // Two plain counters; a panicking holder cannot leave them half-written.
    presence.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Authoritative holder of all notes.
///
/// Construct one per application and share it through `Arc`.
pub struct NoteStore<R: NoteRepository> {
    writer: Mutex<Writer<R>>,
    snapshots: watch::Sender<NoteSnapshot>,
    presence: SharedPresence,
    clock: Arc<dyn Clock>,
    subscriber_grace: Duration,
    backend_scans: AtomicU64,
}

impl<R: NoteRepository> NoteStore<R> {
    /// Creates a cold store over `repo` using the wall clock.
    pub fn new(repo: R) -> Self {
        let (snapshots, _) = watch::channel(NoteSnapshot::default());
        Self {
            writer: Mutex::new(Writer { repo, warm: None }),
            snapshots,
            presence: SharedPresence::default(),
            clock: Arc::new(SystemClock),
            subscriber_grace: DEFAULT_SUBSCRIBER_GRACE,
            backend_scans: AtomicU64::new(0),
        }
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces how long the warm list outlives its last subscriber.
    pub fn with_subscriber_grace(mut self, grace: Duration) -> Self {
        self.subscriber_grace = grace;
        self
    }

    /// Subscribes to the sorted note list.
    ///
    /// The returned stream yields the latest snapshot on its first `next()`
    /// and every later snapshot after that (last value wins).
    ///
    /// # Errors
    /// - `StoreError::Storage` when a required backend scan fails.
    pub fn list(&self) -> StoreResult<NoteStream> {
        let mut writer = self.lock_writer()?;
        let mut presence = lock_presence(&self.presence);

        if writer.warm.is_none() || !self.is_warm(&presence) {
            let notes = writer.repo.list_notes()?;
            let scans = self.backend_scans.fetch_add(1, Ordering::Relaxed) + 1;
            debug!(
                "event=notes_scan module=store status=ok count={} scans={}",
                notes.len(),
                scans
            );
            self.snapshots.send_replace(Arc::new(notes.clone()));
            writer.warm = Some(notes);
        }

        presence.live += 1;
        presence.idle_since = None;
        Ok(NoteStream {
            rx: self.snapshots.subscribe(),
            primed: false,
            _presence: PresenceGuard {
                presence: Arc::clone(&self.presence),
            },
        })
    }

    /// Returns the current sorted list without subscribing.
    pub fn snapshot(&self) -> StoreResult<NoteSnapshot> {
        let writer = self.lock_writer()?;
        let presence = lock_presence(&self.presence);
        if writer.warm.is_some() && self.is_warm(&presence) {
            return Ok(self.snapshots.borrow().clone());
        }
        Ok(Arc::new(writer.repo.list_notes()?))
    }

    /// Point lookup. A missing id is `Ok(None)`.
    pub fn get_by_id(&self, id: NoteId) -> StoreResult<Option<Note>> {
        let writer = self.lock_writer()?;
        Ok(writer.repo.get_note(id)?)
    }

    /// Creates a note with a fresh id and `created_at == updated_at == now`.
    pub fn add(&self, title: &str, content: &str) -> StoreResult<Note> {
        let started_at = Instant::now();
        let mut writer = self.lock_writer()?;
        let note = match writer.repo.insert_note(title, content, self.clock.now_ms()) {
            Ok(note) => note,
            Err(err) => return Err(self.failed("note_add", started_at, err.into())),
        };

        self.publish(&mut writer, |notes| notes.push(note.clone()));
        info!(
            "event=note_add module=store status=ok note_id={} duration_ms={}",
            note.id,
            started_at.elapsed().as_millis()
        );
        Ok(note)
    }

    /// Replaces title and content of the stored note with `note.id`.
    ///
    /// The stored `created_at` is kept; `updated_at` becomes the later of now
    /// and one millisecond past its previous value.
    ///
    /// # Errors
    /// - `StoreError::NotFound` when no note has `note.id`.
    /// - `StoreError::Validation` when the stored `updated_at` cannot advance.
    pub fn update(&self, note: &Note) -> StoreResult<Note> {
        let started_at = Instant::now();
        let mut writer = self.lock_writer()?;
        let stored = match writer.repo.get_note(note.id) {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                return Err(self.failed("note_update", started_at, StoreError::NotFound(note.id)))
            }
            Err(err) => return Err(self.failed("note_update", started_at, err.into())),
        };

        let Some(next_tick) = stored.updated_at.checked_add(1) else {
            let exhausted = NoteValidationError::TimestampExhausted {
                updated_at: stored.updated_at,
            };
            return Err(self.failed("note_update", started_at, exhausted.into()));
        };
        let updated = Note {
            id: stored.id,
            title: note.title.clone(),
            content: note.content.clone(),
            created_at: stored.created_at,
            updated_at: self.clock.now_ms().max(next_tick),
        };
        if let Err(err) = writer.repo.update_note(&updated) {
            return Err(self.failed("note_update", started_at, err.into()));
        }

        self.publish(&mut writer, |notes| {
            if let Some(slot) = notes.iter_mut().find(|slot| slot.id == updated.id) {
                *slot = updated.clone();
            }
        });
        info!(
            "event=note_update module=store status=ok note_id={} duration_ms={}",
            updated.id,
            started_at.elapsed().as_millis()
        );
        Ok(updated)
    }

    /// Removes a note. Unknown ids are a silent no-op.
    pub fn delete_by_id(&self, id: NoteId) -> StoreResult<()> {
        let started_at = Instant::now();
        let mut writer = self.lock_writer()?;
        let removed = match writer.repo.delete_note(id) {
            Ok(removed) => removed,
            Err(err) => return Err(self.failed("note_delete", started_at, err.into())),
        };

        if removed {
            self.publish(&mut writer, |notes| notes.retain(|note| note.id != id));
        }
        info!(
            "event=note_delete module=store status=ok note_id={} removed={} duration_ms={}",
            id,
            removed,
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    /// Adds the built-in sample notes when the store is empty.
    ///
    /// Returns how many notes were added.
    pub fn seed_samples(&self) -> StoreResult<usize> {
        if !self.snapshot()?.is_empty() {
            return Ok(0);
        }
        let samples = sample_notes();
        for (title, content) in &samples {
            self.add(title, content)?;
        }
        Ok(samples.len())
    }

    /// Number of full backend scans performed so far.
    pub fn backend_scans(&self) -> u64 {
        self.backend_scans.load(Ordering::Relaxed)
    }

    /// Number of live `NoteStream` handles.
    pub fn subscriber_count(&self) -> usize {
        lock_presence(&self.presence).live
    }

    fn lock_writer(&self) -> StoreResult<MutexGuard<'_, Writer<R>>> {
        self.writer.lock().map_err(|_| {
            warn!("event=store_lock module=store status=error error_code=poisoned");
            StoreError::Poisoned
        })
    }

    fn is_warm(&self, presence: &Presence) -> bool {
        presence.live > 0
            || presence
                .idle_since
                .is_some_and(|since| since.elapsed() < self.subscriber_grace)
    }

    /// Applies `patch` to the warm copy and publishes it, or goes cold when
    /// nobody has watched within the grace window.
    fn publish(&self, writer: &mut Writer<R>, patch: impl FnOnce(&mut Vec<Note>)) {
        if !self.is_warm(&lock_presence(&self.presence)) {
            writer.warm = None;
            return;
        }
        if let Some(notes) = writer.warm.as_mut() {
            patch(notes);
            sort_by_recency(notes);
            self.snapshots.send_replace(Arc::new(notes.clone()));
        }
    }

    fn failed(&self, event: &'static str, started_at: Instant, err: StoreError) -> StoreError {
        warn!(
            "event={event} module=store status=error duration_ms={} error_code={} error={err}",
            started_at.elapsed().as_millis(),
            err.code()
        );
        err
    }
}

/// Subscription handle returned by `NoteStore::list`.
///
/// Dropping the handle unsubscribes.
pub struct NoteStream {
    rx: watch::Receiver<NoteSnapshot>,
    primed: bool,
    _presence: PresenceGuard,
}

impl NoteStream {
    /// Latest published snapshot.
    pub fn current(&self) -> NoteSnapshot {
        self.rx.borrow().clone()
    }

    /// Waits for the next snapshot.
    ///
    /// The first call resolves immediately with the latest snapshot. Returns
    /// `None` once the store has been dropped.
    pub async fn next(&mut self) -> Option<NoteSnapshot> {
        if !self.primed {
            self.primed = true;
            return Some(self.rx.borrow_and_update().clone());
        }
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

struct PresenceGuard {
    presence: SharedPresence,
}

impl Drop for PresenceGuard {
    fn drop(&mut self) {
        let mut presence = lock_presence(&self.presence);
        presence.live = presence.live.saturating_sub(1);
        if presence.live == 0 {
            presence.idle_since = Some(Instant::now());
        }
    }
}
