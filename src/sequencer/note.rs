// Note representation for the sequencer
// A scheduled note is positioned in ticks and played through an instrument

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for notes
pub type NoteId = u64;

/// Identifier of the audio track a note belongs to
pub type TrackId = u32;

/// Name of the instrument a note is rendered with
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstrumentRef(pub String);

impl InstrumentRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstrumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A note on the symbolic timeline
///
/// Owned by the note store. The scheduler only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledNote {
    /// Unique identifier for this note
    pub id: NoteId,

    /// Track the note lives on
    pub track: TrackId,

    /// Semitone index (MIDI numbering, 60 = C4)
    pub pitch: u8,

    /// Start position in ticks
    pub start_tick: u64,

    /// Duration in ticks (> 0)
    pub duration_tick: u64,

    /// MIDI velocity (0-127)
    pub velocity: u8,

    /// Instrument used to render the note
    pub instrument: InstrumentRef,
}

impl ScheduledNote {
    /// Creates a new note
    pub fn new(
        id: NoteId,
        track: TrackId,
        pitch: u8,
        start_tick: u64,
        duration_tick: u64,
        velocity: u8,
        instrument: InstrumentRef,
    ) -> Self {
        assert!(pitch <= 127, "MIDI pitch must be 0-127");
        assert!(velocity <= 127, "MIDI velocity must be 0-127");
        assert!(duration_tick > 0, "Note duration must be > 0");

        Self {
            id,
            track,
            pitch,
            start_tick,
            duration_tick,
            velocity,
            instrument,
        }
    }

    /// Tick at which the note stops sounding
    pub fn end_tick(&self) -> u64 {
        self.start_tick + self.duration_tick
    }

    /// True if the note spans any part of [from, to)
    pub fn overlaps(&self, from: f64, to: f64) -> bool {
        (self.start_tick as f64) < to && (self.end_tick() as f64) > from
    }

    /// Get the note name (e.g., "C4", "A#5")
    pub fn note_name(&self) -> String {
        const NOTE_NAMES: [&str; 12] = [
            "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
        ];

        let octave = (self.pitch / 12) as i32 - 1;
        let note_index = (self.pitch % 12) as usize;

        format!("{}{}", NOTE_NAMES[note_index], octave)
    }
}
