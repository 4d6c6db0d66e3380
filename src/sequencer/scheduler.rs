// Note scheduler - Lookahead admission of notes into the voice pool
//
// Each pass hands the render backend absolute start times for every note
// entering the horizon, so timing precision comes from the render thread and
// not from the control loop timers.

use super::note::NoteId;
use super::note_store::NoteStore;
use super::timeline::TimeModel;
use crate::audio::backend::RenderBackend;
use crate::sampler::source::InstrumentSource;
use crate::synth::voice::{VoiceId, VoiceSpec};
use crate::synth::voice_pool::{PoolError, Settle, VoicePool};
use std::collections::HashSet;

/// What a scheduling pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    pub admitted: usize,
    /// Entered mid-note (fade-in from an offset)
    pub mid_note: usize,
    /// No buffer for the note's instrument and pitch
    pub missing: usize,
    /// Previous voice of the note still fading out; retried next pass
    pub deferred: usize,
    /// Rejected by the pool or the backend; retried next pass
    pub failed: usize,
}

pub struct NoteScheduler {
    lookahead_seconds: f64,
    /// Notes admitted (or given up on) during this session
    seen: HashSet<NoteId>,
    running: bool,
    passes: u64,
}

impl NoteScheduler {
    pub fn new(lookahead_seconds: f64) -> Self {
        Self {
            lookahead_seconds: lookahead_seconds.max(0.0),
            seen: HashSet::new(),
            running: false,
            passes: 0,
        }
    }

    /// Begin a session
    pub fn start(&mut self) {
        self.seen.clear();
        self.running = true;
    }

    /// End the session and fade out every voice
    pub fn stop<B: RenderBackend + ?Sized>(
        &mut self,
        pool: &mut VoicePool,
        backend: &mut B,
        grace: f64,
    ) -> Settle {
        self.running = false;
        self.seen.clear();
        pool.stop_all(backend, grace)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn has_seen(&self, id: NoteId) -> bool {
        self.seen.contains(&id)
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Passes run since creation
    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn lookahead_seconds(&self) -> f64 {
        self.lookahead_seconds
    }

    /// Admit every unseen note overlapping [playhead, playhead + lookahead)
    pub fn pass<B, I>(
        &mut self,
        playhead_seconds: f64,
        model: &TimeModel,
        notes: &NoteStore,
        instruments: &I,
        pool: &mut VoicePool,
        backend: &mut B,
    ) -> PassReport
    where
        B: RenderBackend + ?Sized,
        I: InstrumentSource + ?Sized,
    {
        let mut report = PassReport::default();
        if !self.running {
            return report;
        }
        self.passes += 1;

        let playhead_tick = model.seconds_to_tick(playhead_seconds.max(0.0));
        let horizon_tick = playhead_tick + model.seconds_to_tick(self.lookahead_seconds);
        let now = backend.current_time();

        for note in notes.starting_before(horizon_tick) {
            if note.end_tick() as f64 <= playhead_tick || self.seen.contains(&note.id) {
                continue;
            }

            let start_tick = note.start_tick as f64;
            let offset_ticks = (playhead_tick - start_tick).max(0.0);
            let remaining_ticks = note.end_tick() as f64 - start_tick.max(playhead_tick);

            let Some(buffer) = instruments.fetch_buffer(&note.instrument, note.pitch) else {
                tracing::warn!(
                    note = note.id,
                    instrument = %note.instrument,
                    pitch = note.pitch,
                    "No buffer for note, skipping"
                );
                self.seen.insert(note.id);
                report.missing += 1;
                continue;
            };

            let spec = VoiceSpec {
                id: VoiceId::Note(note.id),
                pitch: note.pitch,
                velocity: note.velocity,
                buffer,
                start_at: now + model.tick_to_seconds((start_tick - playhead_tick).max(0.0)),
                offset: model.tick_to_seconds(offset_ticks),
                duration: model.tick_to_seconds(remaining_ticks),
                mid_note: offset_ticks > 0.0,
            };

            match pool.admit(backend, spec) {
                Ok(_) => {
                    self.seen.insert(note.id);
                    report.admitted += 1;
                    if offset_ticks > 0.0 {
                        report.mid_note += 1;
                    }
                }
                Err(PoolError::DuplicateVoice(_)) => {
                    report.deferred += 1;
                }
                Err(e) => {
                    tracing::warn!(note = note.id, error = %e, "Failed to admit note");
                    report.failed += 1;
                }
            }
        }

        report
    }
}
