// Fade envelope - Gain automation applied to every voice
//
// Fade-outs are linear to zero everywhere (early stop, stop-all, eviction,
// natural note end). Entry into the middle of a note ramps up exponentially
// from a small floor instead of starting at full level.

use crate::audio::automation::GainEvent;
use crate::config::EngineConfig;

/// Starting gain of an exponential fade-in (exponential ramps cannot start at 0)
pub const FADE_IN_FLOOR: f32 = 1e-4;

/// Shortest fade-out ever scheduled, in seconds
pub const MIN_FADE_SECONDS: f64 = 0.005;

/// Peak gain of a voice for a MIDI velocity: 0.2 + 0.8 * velocity / 127
#[inline]
pub fn peak_gain(velocity: u8) -> f32 {
    0.2 + 0.8 * velocity.min(127) as f32 / 127.0
}

/// Fade timings, in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadePolicy {
    pub min_fade: f64,
    pub fade_in: f64,
    pub release: f64,
    pub eviction_fade: f64,
    pub stop_grace: f64,
    pub settle_margin: f64,
}

impl FadePolicy {
    pub fn from_config(config: &EngineConfig) -> Self {
        let min_fade = (config.min_fade_ms / 1000.0).max(MIN_FADE_SECONDS);
        Self {
            min_fade,
            fade_in: (config.fade_in_ms / 1000.0).max(0.0),
            release: (config.release_ms / 1000.0).max(min_fade),
            eviction_fade: (config.eviction_fade_ms / 1000.0).max(min_fade),
            stop_grace: (config.stop_grace_ms / 1000.0).max(min_fade),
            settle_margin: (config.settle_margin_ms / 1000.0).max(0.0),
        }
    }

    /// Never fade faster than `min_fade`
    #[inline]
    pub fn clamp_fade(&self, duration: f64) -> f64 {
        if duration.is_finite() {
            duration.max(self.min_fade)
        } else {
            self.min_fade
        }
    }

    /// Envelope events for a voice starting at `at`
    ///
    /// From the note's beginning the gain is set straight to `peak`. Entering
    /// mid-note ramps exponentially from the floor to `peak` over `fade_in`.
    pub fn fade_in(&self, at: f64, peak: f32, mid_note: bool) -> Vec<GainEvent> {
        if !mid_note || self.fade_in <= 0.0 {
            return vec![GainEvent::SetValueAt { value: peak, at }];
        }
        vec![
            GainEvent::SetValueAt {
                value: FADE_IN_FLOOR,
                at,
            },
            GainEvent::ExponentialRampTo {
                value: peak,
                end: at + self.fade_in,
            },
        ]
    }

    /// Envelope events for a linear fade from whatever the gain is at `at` down
    /// to zero at `at + duration`
    pub fn fade_out(&self, at: f64, duration: f64) -> [GainEvent; 2] {
        [
            GainEvent::CancelAndHoldAt { at },
            GainEvent::LinearRampTo {
                value: 0.0,
                end: at + self.clamp_fade(duration),
            },
        ]
    }
}

impl Default for FadePolicy {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}
