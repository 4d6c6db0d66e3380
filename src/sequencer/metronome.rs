// Metronome - Click track scheduled ahead of the render clock
//
// Beat n sits at n * seconds_per_beat on the timeline, whatever position
// playback started from. Clicks go through their own voice pool so they never
// take a note's place.

use super::timeline::TimeModel;
use crate::audio::backend::RenderBackend;
use crate::audio::buffer::AudioBuffer;
use crate::synth::voice::{VoiceId, VoiceSpec};
use crate::synth::voice_pool::{PoolError, Settle, VoicePool};
use std::f32::consts::PI;
use std::sync::Arc;

/// Tolerance when deciding whether a position sits on a beat boundary
const BEAT_EPSILON: f64 = 1e-9;

/// Metronome click type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickType {
    /// Click on first beat of bar (accent/downbeat)
    Accent,
    /// Click on other beats
    Regular,
}

impl ClickType {
    /// Downbeat when `beat` is a multiple of the measure length
    pub fn for_beat(beat: u64, beats_per_measure: u8) -> Self {
        if beat % beats_per_measure.max(1) as u64 == 0 {
            ClickType::Accent
        } else {
            ClickType::Regular
        }
    }

    /// Summing bus used in the click pool
    fn bus(self) -> u8 {
        match self {
            ClickType::Accent => 1,
            ClickType::Regular => 0,
        }
    }
}

/// Metronome click sounds
/// Pre-generated once, shared by every click voice
#[derive(Debug, Clone)]
pub struct MetronomeSound {
    accent: Arc<AudioBuffer>,
    regular: Arc<AudioBuffer>,
}

impl MetronomeSound {
    const CLICK_DURATION_MS: f32 = 10.0;

    pub fn new(sample_rate: u32) -> Self {
        let click_samples = ((Self::CLICK_DURATION_MS / 1000.0) * sample_rate as f32) as usize;

        Self {
            accent: Arc::new(Self::generate_click(sample_rate, click_samples, 1200.0, 0.6)),
            regular: Arc::new(Self::generate_click(sample_rate, click_samples, 800.0, 0.4)),
        }
    }

    /// Short sine burst with a fast exponential decay
    fn generate_click(
        sample_rate: u32,
        num_samples: usize,
        frequency: f32,
        amplitude: f32,
    ) -> AudioBuffer {
        let phase_increment = 2.0 * PI * frequency / sample_rate as f32;
        let samples = (0..num_samples)
            .map(|i| {
                let t = i as f32 / num_samples as f32;
                let envelope = (-t * 8.0).exp();
                (i as f32 * phase_increment).sin() * envelope * amplitude
            })
            .collect();

        AudioBuffer::new(samples, sample_rate)
    }

    pub fn click(&self, click_type: ClickType) -> Arc<AudioBuffer> {
        match click_type {
            ClickType::Accent => self.accent.clone(),
            ClickType::Regular => self.regular.clone(),
        }
    }

    pub fn click_duration_seconds(&self) -> f64 {
        self.accent.duration_seconds()
    }
}

/// Index of the first beat at or after `position`
///
/// A position on a boundary (within float noise) starts on that beat;
/// otherwise the next beat is `ceil(position / seconds_per_beat)`.
pub fn first_beat_index(position: f64, seconds_per_beat: f64) -> u64 {
    if seconds_per_beat <= 0.0 || !position.is_finite() || position <= 0.0 {
        return 0;
    }
    let beats = position / seconds_per_beat;
    let nearest = beats.round();
    if (beats - nearest).abs() < BEAT_EPSILON * beats.max(1.0) {
        nearest as u64
    } else {
        beats.ceil() as u64
    }
}

/// What a metronome pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClickReport {
    pub scheduled: usize,
    /// Beats already behind the playhead (after a tempo change)
    pub skipped: usize,
    pub failed: usize,
}

pub struct MetronomeScheduler {
    sound: MetronomeSound,
    enabled: bool,
    volume: f32,
    lookahead_seconds: f64,
    running: bool,
    next_beat: u64,
    /// Bumped on every start so a new run never reuses an earlier click id
    run: u32,
}

impl MetronomeScheduler {
    pub fn new(sample_rate: u32, lookahead_seconds: f64) -> Self {
        Self {
            sound: MetronomeSound::new(sample_rate),
            enabled: false,
            volume: 0.5,
            lookahead_seconds,
            running: false,
            next_beat: 0,
            run: 0,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Set metronome volume (0.0 to 1.0), applied as the click pool output gain
    pub fn set_volume<B: RenderBackend + ?Sized>(
        &mut self,
        pool: &mut VoicePool,
        backend: &mut B,
        volume: f32,
    ) -> Result<(), PoolError> {
        self.volume = if volume.is_finite() { volume.clamp(0.0, 1.0) } else { 0.0 };
        pool.set_output_gain(backend, self.volume)
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn next_beat(&self) -> u64 {
        self.next_beat
    }

    pub fn sound(&self) -> &MetronomeSound {
        &self.sound
    }

    /// Voice id of `beat` in the current run
    pub fn click_id(&self, beat: u64) -> VoiceId {
        VoiceId::Click { run: self.run, beat }
    }

    /// Begin clicking from timeline position `at`
    pub fn start(&mut self, at: f64, model: &TimeModel) {
        self.run = self.run.wrapping_add(1);
        self.next_beat = first_beat_index(at, model.seconds_per_beat());
        self.running = true;
    }

    /// Drop clicks not yet started and restart from the playhead
    pub fn resync<B: RenderBackend + ?Sized>(
        &mut self,
        playhead: f64,
        model: &TimeModel,
        pool: &mut VoicePool,
        backend: &mut B,
    ) {
        pool.cancel_pending(backend);
        self.start(playhead, model);
    }

    /// Stop clicking; clicks already sounding fade out
    pub fn stop<B: RenderBackend + ?Sized>(
        &mut self,
        pool: &mut VoicePool,
        backend: &mut B,
        grace: f64,
    ) -> Settle {
        self.running = false;
        pool.stop_all(backend, grace)
    }

    /// Stop future clicks but let the current one ring
    pub fn halt<B: RenderBackend + ?Sized>(&mut self, pool: &mut VoicePool, backend: &mut B) {
        self.running = false;
        pool.cancel_pending(backend);
    }

    /// Schedule every beat within the lookahead of `playhead`
    pub fn pass<B: RenderBackend + ?Sized>(
        &mut self,
        playhead: f64,
        model: &TimeModel,
        pool: &mut VoicePool,
        backend: &mut B,
    ) -> ClickReport {
        let mut report = ClickReport::default();
        if !self.running || !self.enabled {
            return report;
        }

        let seconds_per_beat = model.seconds_per_beat();
        let beats_per_measure = model.time_signature().beats_per_measure();
        let window_end = playhead + self.lookahead_seconds;
        let now = backend.current_time();

        while (self.next_beat as f64) * seconds_per_beat < playhead - BEAT_EPSILON {
            self.next_beat += 1;
            report.skipped += 1;
        }

        loop {
            let beat_time = self.next_beat as f64 * seconds_per_beat;
            if beat_time >= window_end {
                break;
            }

            let click_type = ClickType::for_beat(self.next_beat, beats_per_measure);
            let buffer = self.sound.click(click_type);
            let spec = VoiceSpec {
                id: self.click_id(self.next_beat),
                pitch: click_type.bus(),
                velocity: 127,
                duration: buffer.duration_seconds(),
                buffer,
                start_at: now + (beat_time - playhead).max(0.0),
                offset: 0.0,
                mid_note: false,
            };

            match pool.admit(backend, spec) {
                Ok(_) => report.scheduled += 1,
                Err(e) => {
                    tracing::warn!(beat = self.next_beat, error = %e, "Failed to schedule click");
                    report.failed += 1;
                }
            }
            self.next_beat += 1;
        }

        report
    }
}
