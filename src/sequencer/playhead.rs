// Playhead tracker - Timeline position accumulated from render clock deltas
//
// The render clock is not a timeline position: it stops while the context is
// suspended and its reference changes across sessions. Each poll adds the
// clock delta since the previous poll to a position seeded with the seek
// target, so the playhead only ever moves forward within a session.

use std::time::Duration;

/// Whether the host page is visible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Foreground,
    /// Animation frames throttled or suspended by the host
    Background,
}

/// How the tracker wants to be polled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollMode {
    /// Once per rendered animation frame
    AnimationFrame,
    /// Fixed-interval timer
    Interval(Duration),
}

/// Result of one poll
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PollOutcome {
    /// Tracker not running
    Idle,
    /// First poll of the session: clock reference recorded, no movement
    Seeded,
    Advanced { delta: f64 },
    /// Clock went backwards: reference reset, no movement
    Reseeded,
    /// End of timeline reached; the tracker stopped itself
    ReachedEnd,
}

/// State of one playback session
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayheadState {
    pub position_seconds: f64,
    /// Render clock at the first poll of the session
    pub init_time: Option<f64>,
    pub last_sample_clock_value: Option<f64>,
    /// Sum of the clock jumps ignored by reseeding
    pub aggregated_drift: f64,
}

impl PlayheadState {
    fn seeded_at(position: f64) -> Self {
        Self {
            position_seconds: position.max(0.0),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlayheadTracker {
    state: PlayheadState,
    running: bool,
    end_of_timeline: Option<f64>,
    visibility: Visibility,
    background_interval: Duration,
}

impl PlayheadTracker {
    pub fn new(background_interval: Duration) -> Self {
        Self {
            state: PlayheadState::default(),
            running: false,
            end_of_timeline: None,
            visibility: Visibility::Foreground,
            background_interval,
        }
    }

    /// Begin a new session at `position` seconds
    pub fn start(&mut self, position: f64) {
        self.state = PlayheadState::seeded_at(position);
        self.running = true;
    }

    /// End the session; returns the final position
    pub fn stop(&mut self) -> f64 {
        self.running = false;
        self.state.position_seconds
    }

    /// Move the playhead while stopped (the next `start` reseeds anyway)
    pub fn set_position(&mut self, position: f64) {
        if !self.running {
            self.state = PlayheadState::seeded_at(position);
        }
    }

    pub fn poll(&mut self, clock_now: f64) -> PollOutcome {
        if !self.running {
            return PollOutcome::Idle;
        }

        let outcome = match self.state.last_sample_clock_value {
            None => {
                self.state.init_time = Some(clock_now);
                PollOutcome::Seeded
            }
            Some(previous) => {
                let delta = clock_now - previous;
                if delta < 0.0 {
                    self.state.aggregated_drift += delta;
                    PollOutcome::Reseeded
                } else {
                    self.state.position_seconds += delta;
                    PollOutcome::Advanced { delta }
                }
            }
        };
        self.state.last_sample_clock_value = Some(clock_now);

        if let Some(end) = self.end_of_timeline {
            if self.state.position_seconds >= end {
                self.running = false;
                return PollOutcome::ReachedEnd;
            }
        }

        outcome
    }

    pub fn position(&self) -> f64 {
        self.state.position_seconds
    }

    pub fn state(&self) -> &PlayheadState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_end_of_timeline(&mut self, end: Option<f64>) {
        self.end_of_timeline = end.filter(|e| e.is_finite() && *e >= 0.0);
    }

    pub fn end_of_timeline(&self) -> Option<f64> {
        self.end_of_timeline
    }

    pub fn set_visibility(&mut self, visibility: Visibility) {
        self.visibility = visibility;
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn poll_mode(&self) -> PollMode {
        match self.visibility {
            Visibility::Foreground => PollMode::AnimationFrame,
            Visibility::Background => PollMode::Interval(self.background_interval),
        }
    }
}

impl Default for PlayheadTracker {
    fn default() -> Self {
        Self::new(Duration::from_millis(17))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_poll_only_seeds() {
        let mut tracker = PlayheadTracker::default();
        tracker.start(2.0);

        assert_eq!(tracker.poll(100.0), PollOutcome::Seeded);
        assert_eq!(tracker.position(), 2.0);
        assert_eq!(tracker.state().init_time, Some(100.0));
    }

    #[test]
    fn test_accumulates_deltas_not_absolute_clock() {
        let mut tracker = PlayheadTracker::default();
        tracker.start(1.0);
        tracker.poll(50.0);
        tracker.poll(50.25);
        tracker.poll(50.5);

        assert!((tracker.position() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_backwards_clock_never_moves_playhead_back() {
        let mut tracker = PlayheadTracker::default();
        tracker.start(0.0);
        tracker.poll(10.0);
        tracker.poll(11.0);

        assert_eq!(tracker.poll(3.0), PollOutcome::Reseeded);
        assert_eq!(tracker.position(), 1.0);
        assert_eq!(tracker.state().aggregated_drift, -8.0);

        tracker.poll(3.5);
        assert_eq!(tracker.position(), 1.5);
    }

    #[test]
    fn test_reaching_end_stops_at_end() {
        let mut tracker = PlayheadTracker::default();
        tracker.set_end_of_timeline(Some(1.0));
        tracker.start(0.5);
        tracker.poll(0.0);

        assert_eq!(tracker.poll(0.75), PollOutcome::ReachedEnd);
        assert!(!tracker.is_running());
        assert!(tracker.position() >= 1.0);
        assert_eq!(tracker.poll(2.0), PollOutcome::Idle);
    }

    #[test]
    fn test_restart_is_a_new_session() {
        let mut tracker = PlayheadTracker::default();
        tracker.start(0.0);
        tracker.poll(0.0);
        tracker.poll(4.0);
        tracker.stop();

        tracker.start(1.0);
        assert_eq!(tracker.state().last_sample_clock_value, None);
        assert_eq!(tracker.poll(4.0), PollOutcome::Seeded);
        assert_eq!(tracker.position(), 1.0);
    }

    #[test]
    fn test_poll_mode_follows_visibility() {
        let mut tracker = PlayheadTracker::new(Duration::from_millis(17));
        assert_eq!(tracker.poll_mode(), PollMode::AnimationFrame);

        tracker.set_visibility(Visibility::Background);
        assert_eq!(
            tracker.poll_mode(),
            PollMode::Interval(Duration::from_millis(17))
        );
    }
}
