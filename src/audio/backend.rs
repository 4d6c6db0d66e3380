// Rendering backend - What the schedulers need from an audio graph
//
// The control loop never renders audio itself. It creates nodes, wires them,
// hands the backend absolute start/stop times and gain automation, reads the
// render clock, and drains completion notifications.

use crate::audio::automation::GainEvent;
use crate::audio::buffer::AudioBuffer;
use crate::connection::status::ContextState;
use std::sync::Arc;
use thiserror::Error;

/// Identifier of a node in the render graph
pub type NodeId = u64;

/// Where a node's output goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// Another gain node (summing input)
    Node(NodeId),
    /// The device output
    Output,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("Rendering context is closed")]
    ContextClosed,

    #[error("Render command queue is full")]
    CommandQueueFull,

    #[error("Unknown render node: {0}")]
    UnknownNode(NodeId),
}

/// Rendering-graph contract
///
/// Every method is non-blocking. Commands take effect on the render thread
/// at the start of its next block; times are absolute render-clock seconds.
pub trait RenderBackend {
    /// Render clock in seconds; frozen while suspended
    fn current_time(&self) -> f64;

    fn sample_rate(&self) -> f64;

    fn state(&self) -> ContextState;

    /// Start (or keep) the clock running
    fn resume(&mut self) -> Result<(), BackendError>;

    /// Freeze the clock and silence the output
    fn suspend(&mut self) -> Result<(), BackendError>;

    /// Create a gain (summing) node
    fn create_gain(&mut self, initial: f32) -> Result<NodeId, BackendError>;

    /// Create a one-shot source reading `buffer`
    fn create_source(&mut self, buffer: Arc<AudioBuffer>) -> Result<NodeId, BackendError>;

    fn connect(&mut self, from: NodeId, to: Destination) -> Result<(), BackendError>;

    /// Remove a node from the graph; its id must not be used afterwards
    fn disconnect(&mut self, node: NodeId) -> Result<(), BackendError>;

    /// Begin playback at `at`, `offset` seconds into the buffer, for at most `duration` seconds
    fn start_source(
        &mut self,
        source: NodeId,
        at: f64,
        offset: f64,
        duration: Option<f64>,
    ) -> Result<(), BackendError>;

    /// Hard stop at `at`
    fn stop_source(&mut self, source: NodeId, at: f64) -> Result<(), BackendError>;

    fn schedule_gain(&mut self, gain: NodeId, event: GainEvent) -> Result<(), BackendError>;

    /// Next source that finished playing, if any
    fn poll_ended(&mut self) -> Option<NodeId>;

    /// Completions the render side could not deliver, since creation
    fn dropped_completions(&self) -> u64 {
        0
    }
}
