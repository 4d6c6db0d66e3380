// MyMusic Playback - Library exports for the binary, tests and benchmarks

pub mod audio;
pub mod config;
pub mod connection;
pub mod control;
pub mod messaging;
pub mod sampler;
pub mod sequencer;
pub mod synth;

// Re-export commonly used types for convenience
pub use audio::backend::{BackendError, RenderBackend};
pub use audio::engine::AudioEngine;
pub use audio::graph::{GraphHandle, RenderGraph, render_graph};
pub use audio::timing::AudioTiming;
pub use config::EngineConfig;
pub use control::{HostClock, ManualClock, SystemClock};
pub use sampler::{InstrumentBank, InstrumentSource};
pub use sequencer::{
    InstrumentRef, MusicalTime, NoteStore, ScheduledNote, Tempo, TimeModel, TimeSignature,
    TransportError, TransportSession, TransportState, TransportStatus, Visibility,
};
pub use synth::voice_pool::{Settle, VoicePool};
