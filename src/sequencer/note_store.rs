// Note store - All scheduled notes of the project, sorted by start tick
// Written by the editor, read by the note scheduler

use crate::sequencer::note::{NoteId, ScheduledNote, TrackId};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global note ID generator (atomic for thread-safety)
static NEXT_NOTE_ID: AtomicU64 = AtomicU64::new(1);

/// Generate a unique note ID
pub fn generate_note_id() -> NoteId {
    NEXT_NOTE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Collection of notes keyed by id and addressable by track
///
/// Notes are kept sorted by start tick so "every note starting before X"
/// is a binary search followed by a slice.
#[derive(Debug, Clone, Default)]
pub struct NoteStore {
    notes: Vec<ScheduledNote>,
}

impl NoteStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// All notes, sorted by start tick
    pub fn notes(&self) -> &[ScheduledNote] {
        &self.notes
    }

    /// Add a note, replacing any note with the same id
    pub fn add_note(&mut self, note: ScheduledNote) {
        self.remove_note(note.id);

        // Keep notes sorted by start position for efficient playback
        let insert_pos = self
            .notes
            .partition_point(|n| (n.start_tick, n.id) < (note.start_tick, note.id));

        self.notes.insert(insert_pos, note);
    }

    /// Remove a note by ID
    pub fn remove_note(&mut self, note_id: NoteId) -> Option<ScheduledNote> {
        let index = self.notes.iter().position(|n| n.id == note_id)?;
        Some(self.notes.remove(index))
    }

    /// Get a note by ID
    pub fn get(&self, note_id: NoteId) -> Option<&ScheduledNote> {
        self.notes.iter().find(|n| n.id == note_id)
    }

    /// Every note whose start tick is strictly before `tick`
    pub fn starting_before(&self, tick: f64) -> &[ScheduledNote] {
        let end = self.notes.partition_point(|n| (n.start_tick as f64) < tick);
        &self.notes[..end]
    }

    /// Notes overlapping the tick range [from, to)
    pub fn notes_in_range(&self, from: f64, to: f64) -> impl Iterator<Item = &ScheduledNote> {
        self.starting_before(to)
            .iter()
            .filter(move |n| n.overlaps(from, to))
    }

    /// Notes of one track, in start order
    pub fn notes_on_track(&self, track: TrackId) -> impl Iterator<Item = &ScheduledNote> {
        self.notes.iter().filter(move |n| n.track == track)
    }

    /// Tracks that own at least one note
    pub fn tracks(&self) -> BTreeSet<TrackId> {
        self.notes.iter().map(|n| n.track).collect()
    }

    /// Delete every note of a track, returns how many were removed
    pub fn remove_track(&mut self, track: TrackId) -> usize {
        let before = self.notes.len();
        self.notes.retain(|n| n.track != track);
        before - self.notes.len()
    }

    /// Tick at which the last note ends
    pub fn end_tick(&self) -> u64 {
        self.notes.iter().map(|n| n.end_tick()).max().unwrap_or(0)
    }

    /// Clear all notes
    pub fn clear(&mut self) {
        self.notes.clear();
    }

    /// Get the number of notes
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

impl FromIterator<ScheduledNote> for NoteStore {
    fn from_iter<T: IntoIterator<Item = ScheduledNote>>(iter: T) -> Self {
        let mut store = Self::new();
        for note in iter {
            store.add_note(note);
        }
        store
    }
}
