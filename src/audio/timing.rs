// Audio timing - The render clock
//
// The render thread is the only writer: it advances the sample counter after
// each rendered block. The control loop only reads it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared render clock, in frames since the context was created
#[derive(Debug, Clone)]
pub struct AudioTiming {
    /// Current sample position (incremented by the render callback)
    sample_position: Arc<AtomicU64>,
    /// Sample rate (for timestamp conversions)
    sample_rate: f64,
}

impl AudioTiming {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_position: Arc::new(AtomicU64::new(0)),
            sample_rate,
        }
    }

    /// Get current sample position (called from the control thread)
    pub fn current_sample(&self) -> u64 {
        self.sample_position.load(Ordering::Acquire)
    }

    /// Current render time in seconds
    pub fn current_time(&self) -> f64 {
        self.current_sample() as f64 / self.sample_rate
    }

    /// Advance sample position (called from the render callback)
    pub fn advance(&self, frames: usize) {
        self.sample_position
            .fetch_add(frames as u64, Ordering::Release);
    }

    /// Absolute time in seconds to the frame that starts at or after it
    /// (within a millionth of a frame, to absorb float rounding)
    pub fn seconds_to_frame(&self, seconds: f64) -> u64 {
        (seconds.max(0.0) * self.sample_rate - 1e-6).ceil().max(0.0) as u64
    }

    /// Get sample rate
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }
}
