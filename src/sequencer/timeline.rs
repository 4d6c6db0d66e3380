// Timeline - Musical time model
// Converts between ticks, seconds and pixels for the current tempo and meter

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest accepted tempo
pub const MIN_BPM: f64 = 20.0;
/// Highest accepted tempo
pub const MAX_BPM: f64 = 999.0;
/// Tempo used when the input is not a usable number
pub const DEFAULT_BPM: f64 = 120.0;
/// Standard MIDI resolution (Pulses Per Quarter Note)
pub const DEFAULT_PPQN: u32 = 480;

/// Note values accepted as a time signature denominator
const ALLOWED_DENOMINATORS: [u8; 4] = [1, 2, 4, 8];

/// Time signature (numerator/denominator)
/// Example: 4/4 time = TimeSignature { numerator: 4, denominator: 4 }
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    numerator: u8,   // Beats per measure
    denominator: u8, // Note value of one beat (4 = quarter note, 8 = eighth note)
}

impl TimeSignature {
    /// Creates a time signature, correcting invalid input instead of failing
    ///
    /// A zero numerator becomes 1. The denominator snaps to the closest
    /// value of {1, 2, 4, 8}.
    pub fn new(numerator: u8, denominator: u8) -> Self {
        let denominator = ALLOWED_DENOMINATORS
            .iter()
            .copied()
            .min_by_key(|d| (*d as i16 - denominator as i16).abs())
            .unwrap_or(4);

        Self {
            numerator: numerator.max(1),
            denominator,
        }
    }

    /// Common 4/4 time signature
    pub fn four_four() -> Self {
        Self::new(4, 4)
    }

    /// Common 3/4 time signature (waltz)
    pub fn three_four() -> Self {
        Self::new(3, 4)
    }

    /// Common 6/8 time signature
    pub fn six_eight() -> Self {
        Self::new(6, 8)
    }

    /// Number of beats per measure
    pub fn beats_per_measure(&self) -> u8 {
        self.numerator
    }

    /// Note value of one beat
    pub fn note_value(&self) -> u8 {
        self.denominator
    }

    /// Beat duration relative to quarter note
    /// Example: 4/4 = 1.0, 6/8 = 0.5 (eighth notes)
    pub fn beat_duration_multiplier(&self) -> f64 {
        4.0 / self.denominator as f64
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::four_four()
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Tempo in BPM (quarter notes per minute)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tempo {
    bpm: f64,
}

impl Tempo {
    /// Creates a new tempo, clamped to [MIN_BPM, MAX_BPM]
    /// Non-finite input falls back to DEFAULT_BPM
    pub fn new(bpm: f64) -> Self {
        Self {
            bpm: Self::sanitize(bpm),
        }
    }

    fn sanitize(bpm: f64) -> f64 {
        if bpm.is_finite() {
            bpm.clamp(MIN_BPM, MAX_BPM)
        } else {
            DEFAULT_BPM
        }
    }

    /// Get BPM value
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Set BPM value (clamped)
    pub fn set_bpm(&mut self, bpm: f64) {
        self.bpm = Self::sanitize(bpm);
    }

    /// Duration of one quarter note in seconds
    pub fn quarter_duration_seconds(&self) -> f64 {
        60.0 / self.bpm
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self::new(DEFAULT_BPM)
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} BPM", self.bpm)
    }
}

/// Tempo/meter state and every tick <-> seconds <-> pixel conversion
///
/// Derived values are recomputed on every call so a tempo or meter change
/// only ever affects conversions made after it. Stop times already handed
/// to the rendering backend are absolute seconds and are not touched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeModel {
    tempo: Tempo,
    ppqn: u32,
    time_signature: TimeSignature,
}

impl TimeModel {
    pub fn new(tempo: Tempo, ppqn: u32, time_signature: TimeSignature) -> Self {
        Self {
            tempo,
            ppqn: ppqn.max(1),
            time_signature,
        }
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn bpm(&self) -> f64 {
        self.tempo.bpm()
    }

    pub fn set_bpm(&mut self, bpm: f64) {
        self.tempo.set_bpm(bpm);
    }

    pub fn ppqn(&self) -> u32 {
        self.ppqn
    }

    pub fn set_ppqn(&mut self, ppqn: u32) {
        self.ppqn = ppqn.max(1);
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    pub fn set_time_signature(&mut self, time_signature: TimeSignature) {
        self.time_signature = time_signature;
    }

    /// 60 / (bpm * ppqn)
    pub fn seconds_per_tick(&self) -> f64 {
        60.0 / (self.tempo.bpm() * self.ppqn as f64)
    }

    /// ppqn * 4 / denominator
    pub fn ticks_per_beat(&self) -> f64 {
        self.ppqn as f64 * self.time_signature.beat_duration_multiplier()
    }

    pub fn ticks_per_measure(&self) -> f64 {
        self.ticks_per_beat() * self.time_signature.beats_per_measure() as f64
    }

    pub fn seconds_per_beat(&self) -> f64 {
        self.ticks_per_beat() * self.seconds_per_tick()
    }

    pub fn seconds_per_measure(&self) -> f64 {
        self.ticks_per_measure() * self.seconds_per_tick()
    }

    pub fn tick_to_seconds(&self, tick: f64) -> f64 {
        tick * self.seconds_per_tick()
    }

    pub fn seconds_to_tick(&self, seconds: f64) -> f64 {
        seconds / self.seconds_per_tick()
    }

    /// Ticks covered by one pixel when `zoom` pixels represent one quarter note
    pub fn ticks_per_pixel(&self, zoom: f64) -> f64 {
        self.ppqn as f64 / zoom.max(f64::EPSILON)
    }

    pub fn tick_to_pixel(&self, tick: f64, zoom: f64) -> f64 {
        tick / self.ticks_per_pixel(zoom)
    }

    pub fn pixel_to_tick(&self, pixel: f64, zoom: f64) -> f64 {
        pixel * self.ticks_per_pixel(zoom)
    }

    pub fn seconds_to_pixel(&self, seconds: f64, zoom: f64) -> f64 {
        self.tick_to_pixel(self.seconds_to_tick(seconds), zoom)
    }
}

impl Default for TimeModel {
    fn default() -> Self {
        Self::new(Tempo::default(), DEFAULT_PPQN, TimeSignature::default())
    }
}

/// Musical time representation (bar:beat:tick), used for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MusicalTime {
    pub bar: u32,  // Bar number (1-based)
    pub beat: u32, // Beat within bar (1-based)
    pub tick: u32, // Tick within beat (0-based)
}

impl MusicalTime {
    /// Creates a new musical time position
    pub fn new(bar: u32, beat: u32, tick: u32) -> Self {
        Self { bar, beat, tick }
    }

    /// Zero position (bar 1, beat 1, tick 0)
    pub fn zero() -> Self {
        Self::new(1, 1, 0)
    }

    /// Create from a tick position on the timeline
    pub fn from_ticks(ticks: f64, model: &TimeModel) -> Self {
        let ticks = ticks.max(0.0);
        let ticks_per_beat = model.ticks_per_beat();
        let ticks_per_measure = model.ticks_per_measure();

        let bar = (ticks / ticks_per_measure).floor();
        let remaining = ticks - bar * ticks_per_measure;
        let beat = (remaining / ticks_per_beat).floor();
        let tick = (remaining - beat * ticks_per_beat).floor();

        Self::new(bar as u32 + 1, beat as u32 + 1, tick as u32)
    }

    /// Convert back to ticks from the start of the timeline
    pub fn to_ticks(&self, model: &TimeModel) -> f64 {
        let bar_0 = self.bar.saturating_sub(1) as f64;
        let beat_0 = self.beat.saturating_sub(1) as f64;
        bar_0 * model.ticks_per_measure() + beat_0 * model.ticks_per_beat() + self.tick as f64
    }
}

impl Default for MusicalTime {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for MusicalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}:{:03}", self.bar, self.beat, self.tick)
    }
}
