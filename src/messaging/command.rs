// Graph commands - Communication control thread → render thread

use crate::audio::automation::GainEvent;
use crate::audio::backend::{Destination, NodeId};
use crate::audio::buffer::AudioBuffer;
use std::sync::Arc;

/// One-way, fire-and-forget mutation of the render graph
///
/// Node ids are allocated on the control thread, so a command can refer to a
/// node created by an earlier command in the same batch.
#[derive(Debug, Clone)]
pub enum GraphCommand {
    CreateGain {
        id: NodeId,
        initial: f32,
    },
    CreateSource {
        id: NodeId,
        buffer: Arc<AudioBuffer>,
    },
    Connect {
        from: NodeId,
        to: Destination,
    },
    Disconnect {
        id: NodeId,
    },
    /// Start a source at absolute time `at`, `offset` seconds into its buffer,
    /// playing for at most `duration` seconds
    Start {
        id: NodeId,
        at: f64,
        offset: f64,
        duration: Option<f64>,
    },
    Stop {
        id: NodeId,
        at: f64,
    },
    Gain {
        id: NodeId,
        event: GainEvent,
    },
}
