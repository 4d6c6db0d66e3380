// Voice - One sound rendering or about to render

use crate::audio::backend::NodeId;
use crate::audio::buffer::AudioBuffer;
use crate::sequencer::note::NoteId;
use std::fmt;
use std::sync::Arc;

/// Identity of a voice: the note that owns it, or a metronome beat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoiceId {
    Note(NoteId),
    /// Metronome click, keyed by metronome run and beat index
    Click { run: u32, beat: u64 },
}

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceId::Note(id) => write!(f, "note#{}", id),
            VoiceId::Click { run, beat } => write!(f, "click#{}.{}", run, beat),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    /// Start time not reached yet
    Pending,
    Sounding,
    /// Envelope ramping down to zero
    Fading,
    /// Hard stop passed, waiting for the completion notification
    Released,
}

/// What the scheduler asks the pool to play
#[derive(Debug, Clone)]
pub struct VoiceSpec {
    pub id: VoiceId,
    pub pitch: u8,
    pub velocity: u8,
    pub buffer: Arc<AudioBuffer>,
    /// Absolute render time of the first audible sample
    pub start_at: f64,
    /// Seconds into the buffer
    pub offset: f64,
    /// Seconds until the natural release begins
    pub duration: f64,
    /// Entering in the middle of the note (fade in instead of starting at peak)
    pub mid_note: bool,
}

/// A voice owned by the pool
#[derive(Debug, Clone)]
pub struct VoiceInstance {
    pub id: VoiceId,
    pub pitch: u8,
    pub source: NodeId,
    pub envelope: NodeId,
    pub start_at: f64,
    /// When the envelope starts ramping down
    pub fade_start: f64,
    /// Hard stop, end of the fade
    pub scheduled_stop_time: f64,
    /// Admission order (lower = older)
    pub age: u64,
}

impl VoiceInstance {
    pub fn state_at(&self, now: f64) -> VoiceState {
        if now >= self.scheduled_stop_time {
            VoiceState::Released
        } else if now >= self.fade_start {
            VoiceState::Fading
        } else if now < self.start_at {
            VoiceState::Pending
        } else {
            VoiceState::Sounding
        }
    }

    /// Pending or sounding at `now`
    pub fn is_live_at(&self, now: f64) -> bool {
        matches!(self.state_at(now), VoiceState::Pending | VoiceState::Sounding)
    }
}
