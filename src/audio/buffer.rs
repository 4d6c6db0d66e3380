// Decoded audio buffers shared between instruments and the render graph

use std::f32::consts::TAU;

/// Mono, decoded, immutable audio data
///
/// Shared behind an `Arc` by the instrument bank and every source playing it.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate: sample_rate.max(1),
        }
    }

    /// Downmix interleaved frames to mono
    pub fn from_interleaved(interleaved: &[f32], channels: u16, sample_rate: u32) -> Self {
        let channels = channels.max(1) as usize;
        let samples = interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();
        Self::new(samples, sample_rate)
    }

    /// Sine tone with a short attack and an exponential tail
    pub fn sine(frequency: f32, duration_seconds: f32, sample_rate: u32) -> Self {
        let num_samples = (duration_seconds.max(0.0) * sample_rate as f32) as usize;
        let attack = (0.002 * sample_rate as f32).max(1.0);
        let phase_increment = TAU * frequency / sample_rate as f32;

        let samples = (0..num_samples)
            .map(|i| {
                let t = i as f32 / num_samples as f32;
                let envelope = (i as f32 / attack).min(1.0) * (-t * 3.0).exp();
                (i as f32 * phase_increment).sin() * envelope * 0.5
            })
            .collect();

        Self::new(samples, sample_rate)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Linear interpolation at a fractional frame position, 0.0 outside the data
    #[inline]
    pub fn sample_at(&self, position: f64) -> f32 {
        if position < 0.0 {
            return 0.0;
        }
        let index = position as usize;
        let frac = (position - index as f64) as f32;
        let s1 = self.samples.get(index).copied().unwrap_or(0.0);
        let s2 = self.samples.get(index + 1).copied().unwrap_or(0.0);
        s1 + (s2 - s1) * frac
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration() {
        let buffer = AudioBuffer::new(vec![0.0; 48000], 48000);
        assert_eq!(buffer.duration_seconds(), 1.0);
        assert_eq!(buffer.len(), 48000);
    }

    #[test]
    fn test_interpolation() {
        let buffer = AudioBuffer::new(vec![0.0, 1.0], 48000);
        assert_eq!(buffer.sample_at(0.5), 0.5);
        assert_eq!(buffer.sample_at(1.0), 1.0);
        assert_eq!(buffer.sample_at(5.0), 0.0);
        assert_eq!(buffer.sample_at(-1.0), 0.0);
    }

    #[test]
    fn test_downmix() {
        let buffer = AudioBuffer::from_interleaved(&[1.0, 0.0, 0.5, 0.5], 2, 44100);
        assert_eq!(buffer.samples(), &[0.5, 0.5]);
    }

    #[test]
    fn test_sine_is_bounded() {
        let buffer = AudioBuffer::sine(440.0, 0.5, 48000);
        assert_eq!(buffer.len(), 24000);
        assert!(buffer.samples().iter().all(|s| s.abs() <= 0.5));
        assert!(buffer.samples().iter().any(|s| s.abs() > 0.1));
    }
}
