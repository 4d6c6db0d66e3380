// Gain automation - Sample-accurate parameter timeline
//
// Each gain node of the render graph owns one of these. Events are expressed
// in absolute render-clock seconds; ramps start at the previous event.

/// Automation event sent from the control thread
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GainEvent {
    /// Jump to `value` at `at`
    SetValueAt { value: f32, at: f64 },
    /// Linear ramp from the previous event to `value`, reached at `end`
    LinearRampTo { value: f32, end: f64 },
    /// Exponential ramp from the previous event to `value`, reached at `end`
    ExponentialRampTo { value: f32, end: f64 },
    /// Drop every event at or after `at` and hold the value the timeline had there
    CancelAndHoldAt { at: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Point {
    Set { time: f64, value: f32 },
    Linear { time: f64, value: f32 },
    Exponential { time: f64, value: f32 },
}

impl Point {
    fn time(&self) -> f64 {
        match *self {
            Point::Set { time, .. } | Point::Linear { time, .. } | Point::Exponential { time, .. } => {
                time
            }
        }
    }

    fn value(&self) -> f32 {
        match *self {
            Point::Set { value, .. }
            | Point::Linear { value, .. }
            | Point::Exponential { value, .. } => value,
        }
    }
}

/// Timeline of gain values
#[derive(Debug, Clone)]
pub struct GainAutomation {
    initial: f32,
    points: Vec<Point>,
}

impl GainAutomation {
    pub fn new(initial: f32) -> Self {
        Self {
            initial,
            points: Vec::new(),
        }
    }

    /// Apply an automation event
    pub fn apply(&mut self, event: GainEvent) {
        match event {
            GainEvent::SetValueAt { value, at } => self.insert(Point::Set { time: at, value }),
            GainEvent::LinearRampTo { value, end } => {
                self.insert(Point::Linear { time: end, value })
            }
            GainEvent::ExponentialRampTo { value, end } => {
                self.insert(Point::Exponential { time: end, value })
            }
            GainEvent::CancelAndHoldAt { at } => {
                let held = self.value_at(at);
                self.points.retain(|p| p.time() < at);
                self.points.push(Point::Set {
                    time: at,
                    value: held,
                });
            }
        }
    }

    fn insert(&mut self, point: Point) {
        // Events sharing a timestamp keep their arrival order
        let pos = self.points.partition_point(|p| p.time() <= point.time());
        self.points.insert(pos, point);
    }

    /// Gain at render time `t`
    #[inline]
    pub fn value_at(&self, t: f64) -> f32 {
        let mut prev_time = f64::NEG_INFINITY;
        let mut prev_value = self.initial;

        for point in &self.points {
            let time = point.time();
            if time <= t {
                prev_time = time;
                prev_value = point.value();
                continue;
            }

            // `point` is the first event in the future
            if !prev_time.is_finite() {
                return prev_value;
            }
            let progress = ((t - prev_time) / (time - prev_time)) as f32;
            return match *point {
                Point::Set { .. } => prev_value,
                Point::Linear { value, .. } => prev_value + (value - prev_value) * progress,
                Point::Exponential { value, .. } => {
                    exponential_interpolate(prev_value, value, progress)
                }
            };
        }

        prev_value
    }

    /// Forget events that can no longer influence values at or after `now`
    pub fn prune(&mut self, now: f64) {
        let past = self.points.partition_point(|p| p.time() <= now);
        if past > 1 {
            // Keep the most recent past event as the anchor of the next ramp
            self.points.drain(..past - 1);
        }
    }

    /// Number of stored events
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// v0 * (v1 / v0) ^ progress; holds v0 when the ramp crosses or touches zero
#[inline]
fn exponential_interpolate(v0: f32, v1: f32, progress: f32) -> f32 {
    if v0 == 0.0 || v1 == 0.0 || (v0 < 0.0) != (v1 < 0.0) {
        return v0;
    }
    v0 * (v1 / v0).powf(progress)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_initial_value() {
        let automation = GainAutomation::new(0.7);
        assert_eq!(automation.value_at(0.0), 0.7);
        assert_eq!(automation.value_at(100.0), 0.7);
    }

    #[test]
    fn test_set_value() {
        let mut automation = GainAutomation::new(0.0);
        automation.apply(GainEvent::SetValueAt { value: 1.0, at: 1.0 });

        assert_eq!(automation.value_at(0.5), 0.0);
        assert_eq!(automation.value_at(1.0), 1.0);
        assert_eq!(automation.value_at(2.0), 1.0);
    }

    #[test]
    fn test_linear_ramp() {
        let mut automation = GainAutomation::new(1.0);
        automation.apply(GainEvent::SetValueAt { value: 1.0, at: 1.0 });
        automation.apply(GainEvent::LinearRampTo { value: 0.0, end: 2.0 });

        assert!(approx(automation.value_at(1.0), 1.0));
        assert!(approx(automation.value_at(1.5), 0.5));
        assert!(approx(automation.value_at(1.9), 0.1));
        assert_eq!(automation.value_at(2.0), 0.0);
        assert_eq!(automation.value_at(3.0), 0.0);
    }

    #[test]
    fn test_exponential_ramp() {
        let mut automation = GainAutomation::new(0.0);
        automation.apply(GainEvent::SetValueAt { value: 0.01, at: 0.0 });
        automation.apply(GainEvent::ExponentialRampTo { value: 1.0, end: 1.0 });

        assert!(approx(automation.value_at(0.5), 0.1));
        assert!(approx(automation.value_at(1.0), 1.0));
    }

    #[test]
    fn test_exponential_ramp_to_zero_holds() {
        let mut automation = GainAutomation::new(0.0);
        automation.apply(GainEvent::SetValueAt { value: 1.0, at: 0.0 });
        automation.apply(GainEvent::ExponentialRampTo { value: 0.0, end: 1.0 });

        assert_eq!(automation.value_at(0.5), 1.0);
        assert_eq!(automation.value_at(1.0), 0.0);
    }

    #[test]
    fn test_cancel_and_hold_mid_ramp() {
        let mut automation = GainAutomation::new(1.0);
        automation.apply(GainEvent::SetValueAt { value: 1.0, at: 0.0 });
        automation.apply(GainEvent::LinearRampTo { value: 0.0, end: 2.0 });

        automation.apply(GainEvent::CancelAndHoldAt { at: 1.0 });
        assert!(approx(automation.value_at(1.0), 0.5));
        assert!(approx(automation.value_at(5.0), 0.5));

        automation.apply(GainEvent::LinearRampTo { value: 0.0, end: 1.5 });
        assert!(approx(automation.value_at(1.25), 0.25));
        assert_eq!(automation.value_at(1.5), 0.0);
    }

    #[test]
    fn test_cancel_drops_future_fade() {
        let mut automation = GainAutomation::new(1.0);
        automation.apply(GainEvent::SetValueAt { value: 1.0, at: 4.0 });
        automation.apply(GainEvent::LinearRampTo { value: 0.0, end: 4.02 });

        // An earlier stop replaces the note-off fade
        automation.apply(GainEvent::CancelAndHoldAt { at: 1.0 });
        automation.apply(GainEvent::LinearRampTo { value: 0.0, end: 1.1 });

        assert_eq!(automation.value_at(4.01), 0.0);
        assert_eq!(automation.len(), 2);
    }

    #[test]
    fn test_prune_keeps_anchor() {
        let mut automation = GainAutomation::new(0.0);
        automation.apply(GainEvent::SetValueAt { value: 0.2, at: 0.0 });
        automation.apply(GainEvent::SetValueAt { value: 0.4, at: 1.0 });
        automation.apply(GainEvent::SetValueAt { value: 1.0, at: 2.0 });
        automation.apply(GainEvent::LinearRampTo { value: 0.0, end: 4.0 });

        automation.prune(2.5);
        assert_eq!(automation.len(), 2);
        assert!(approx(automation.value_at(3.0), 0.5));
    }
}
