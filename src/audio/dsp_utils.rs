// DSP utilities - Output hygiene for the render callback

/// Flush denormals to zero
///
/// Denormal floats (very close to zero) are slow on some CPUs. Fading voices
/// produce long tails of them, so the output stage forces them to zero.
///
/// Threshold: 1e-15 (far below 32-bit float noise)
#[inline]
pub fn flush_denormals_to_zero(x: f32) -> f32 {
    if x.abs() < 1e-15 { 0.0 } else { x }
}

/// Soft clipping with tanh
///
/// Ten overlapping voices at full velocity can exceed 1.0; tanh keeps the
/// sum within [-1, 1] without hard-clip harmonics.
#[inline]
pub fn soft_clip(x: f32) -> f32 {
    x.tanh()
}

/// One-pole smoother for control values read in the callback
///
/// y[n] = y[n-1] + a * (x[n] - y[n-1])
pub struct OnePoleSmoother {
    current: f32,
    coefficient: f32,
}

impl OnePoleSmoother {
    /// # Arguments
    /// * `initial_value` - Starting value
    /// * `time_constant_ms` - Time to reach ~63% of the target
    /// * `sample_rate` - Sample rate in Hz
    ///
    /// # Example
    /// ```
    /// use mymusic_playback::audio::dsp_utils::OnePoleSmoother;
    /// let mut smoother = OnePoleSmoother::new(0.0, 10.0, 48000.0);
    /// assert!(smoother.process(1.0) > 0.0);
    /// ```
    pub fn new(initial_value: f32, time_constant_ms: f32, sample_rate: f32) -> Self {
        let time_constant_samples = (time_constant_ms * 0.001 * sample_rate).max(1.0);

        Self {
            current: initial_value,
            coefficient: (1.0 / time_constant_samples).min(1.0),
        }
    }

    #[inline]
    pub fn process(&mut self, target: f32) -> f32 {
        self.current += self.coefficient * (target - self.current);
        self.current = flush_denormals_to_zero(self.current);
        self.current
    }

    /// Jump to `value` without smoothing
    #[inline]
    pub fn reset(&mut self, value: f32) {
        self.current = value;
    }

    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_denormals() {
        assert_eq!(flush_denormals_to_zero(1e-20), 0.0);
        assert_eq!(flush_denormals_to_zero(0.1), 0.1);
        assert_eq!(flush_denormals_to_zero(-0.1), -0.1);
    }

    #[test]
    fn test_soft_clip_bounds() {
        assert_eq!(soft_clip(0.0), 0.0);
        assert!((soft_clip(0.2) - 0.2).abs() < 0.01);
        assert!(soft_clip(10.0) <= 1.0);
        assert!(soft_clip(-10.0) >= -1.0);
    }

    #[test]
    fn test_smoother_converges_without_overshoot() {
        let mut smoother = OnePoleSmoother::new(0.0, 10.0, 48000.0);

        let mut value = 0.0;
        for _ in 0..4800 {
            value = smoother.process(1.0);
            assert!(value <= 1.0);
        }
        assert!((value - 1.0).abs() < 0.01);

        smoother.reset(0.25);
        assert_eq!(smoother.get(), 0.25);
    }
}
