// Engine configuration - Scheduling constants, persisted as RON

use crate::sequencer::timeline::{
    DEFAULT_BPM, DEFAULT_PPQN, MAX_BPM, MIN_BPM, Tempo, TimeModel, TimeSignature,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("RON serialization error: {0}")]
    Serialize(#[from] ron::Error),
}

/// Tunables of the playback engine
///
/// Every field has a default, so a partial file only overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub bpm: f64,
    pub ppqn: u32,
    pub beats_per_measure: u8,
    pub note_value: u8,

    /// Note scheduler horizon
    pub lookahead_seconds: f64,
    /// Note scheduler re-arm interval (half the horizon when unset)
    pub rearm_seconds: Option<f64>,
    pub metronome_lookahead_seconds: f64,
    pub metronome_rearm_seconds: Option<f64>,

    pub max_concurrent_voices: usize,
    pub max_metronome_voices: usize,

    /// Shortest fade-out ever applied
    pub min_fade_ms: f64,
    /// Fade-in for mid-note entry
    pub fade_in_ms: f64,
    /// Fade-out at a note's natural end
    pub release_ms: f64,
    pub eviction_fade_ms: f64,
    /// Fade-out of every voice on stop
    pub stop_grace_ms: f64,
    /// Wait after the last stop before suspending the context
    pub settle_margin_ms: f64,
    /// Playhead poll interval while the page is hidden
    pub background_poll_ms: f64,

    pub metronome_enabled: bool,
    pub metronome_volume: f32,
    pub end_of_timeline_seconds: Option<f64>,

    pub command_queue_capacity: usize,
    pub notification_queue_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            ppqn: DEFAULT_PPQN,
            beats_per_measure: 4,
            note_value: 4,
            lookahead_seconds: 4.0,
            rearm_seconds: None,
            metronome_lookahead_seconds: 0.4,
            metronome_rearm_seconds: None,
            max_concurrent_voices: 10,
            max_metronome_voices: 16,
            min_fade_ms: 5.0,
            fade_in_ms: 10.0,
            release_ms: 20.0,
            eviction_fade_ms: 10.0,
            stop_grace_ms: 100.0,
            settle_margin_ms: 300.0,
            background_poll_ms: 17.0,
            metronome_enabled: false,
            metronome_volume: 0.5,
            end_of_timeline_seconds: None,
            command_queue_capacity: 4096,
            notification_queue_capacity: 1024,
        }
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

impl EngineConfig {
    /// Default config file location (`<config dir>/mymusic_playback/engine.ron`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mymusic_playback").join("engine.ron"))
    }

    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = ron::from_str(text)?;
        Ok(config.sanitized())
    }

    pub fn to_ron(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron(&text)
    }

    /// Load from `path`, falling back to defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_ron(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }

    /// Clamp every field into its usable range
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        self.bpm = finite_or(self.bpm, defaults.bpm).clamp(MIN_BPM, MAX_BPM);
        self.ppqn = self.ppqn.max(1);
        self.beats_per_measure = self.beats_per_measure.max(1);

        self.lookahead_seconds = finite_or(self.lookahead_seconds, defaults.lookahead_seconds).max(0.05);
        self.rearm_seconds = self
            .rearm_seconds
            .filter(|s| s.is_finite() && *s > 0.0)
            .map(|s| s.min(self.lookahead_seconds));
        self.metronome_lookahead_seconds = finite_or(
            self.metronome_lookahead_seconds,
            defaults.metronome_lookahead_seconds,
        )
        .max(0.05);
        self.metronome_rearm_seconds = self
            .metronome_rearm_seconds
            .filter(|s| s.is_finite() && *s > 0.0)
            .map(|s| s.min(self.metronome_lookahead_seconds));

        self.max_concurrent_voices = self.max_concurrent_voices.max(1);
        self.max_metronome_voices = self.max_metronome_voices.max(1);

        self.min_fade_ms = finite_or(self.min_fade_ms, defaults.min_fade_ms).max(5.0);
        self.fade_in_ms = finite_or(self.fade_in_ms, defaults.fade_in_ms).max(0.0);
        self.release_ms = finite_or(self.release_ms, defaults.release_ms).max(self.min_fade_ms);
        self.eviction_fade_ms =
            finite_or(self.eviction_fade_ms, defaults.eviction_fade_ms).max(self.min_fade_ms);
        self.stop_grace_ms =
            finite_or(self.stop_grace_ms, defaults.stop_grace_ms).max(self.min_fade_ms);
        self.settle_margin_ms = finite_or(self.settle_margin_ms, defaults.settle_margin_ms).max(0.0);
        self.background_poll_ms =
            finite_or(self.background_poll_ms, defaults.background_poll_ms).max(1.0);

        self.metronome_volume = if self.metronome_volume.is_finite() {
            self.metronome_volume.clamp(0.0, 1.0)
        } else {
            defaults.metronome_volume
        };
        self.end_of_timeline_seconds = self
            .end_of_timeline_seconds
            .filter(|s| s.is_finite() && *s >= 0.0);

        self.command_queue_capacity = self.command_queue_capacity.max(64);
        self.notification_queue_capacity = self.notification_queue_capacity.max(16);
        self
    }

    /// Tempo and meter the session starts with
    pub fn time_model(&self) -> TimeModel {
        TimeModel::new(
            Tempo::new(self.bpm),
            self.ppqn,
            TimeSignature::new(self.beats_per_measure, self.note_value),
        )
    }

    /// Note scheduler re-arm interval
    pub fn rearm_interval(&self) -> Duration {
        Duration::from_secs_f64(self.rearm_seconds.unwrap_or(self.lookahead_seconds / 2.0))
    }

    /// Metronome scheduler re-arm interval
    pub fn metronome_rearm_interval(&self) -> Duration {
        Duration::from_secs_f64(
            self.metronome_rearm_seconds
                .unwrap_or(self.metronome_lookahead_seconds / 2.0),
        )
    }

    pub fn background_poll_interval(&self) -> Duration {
        Duration::from_secs_f64(self.background_poll_ms / 1000.0)
    }
}
