// Shared rig for the integration tests: a TransportSession over an offline
// render graph, driven by a manual clock in 5 ms steps.

#![allow(dead_code)]

use mymusic_playback::audio::automation::GainEvent;
use mymusic_playback::audio::backend::{BackendError, Destination, NodeId, RenderBackend};
use mymusic_playback::audio::buffer::AudioBuffer;
use mymusic_playback::connection::status::ContextState;
use mymusic_playback::{
    EngineConfig, GraphHandle, InstrumentBank, InstrumentRef, InstrumentSource, ManualClock,
    RenderGraph, ScheduledNote, TransportSession, render_graph,
};
use std::sync::Arc;
use std::time::Duration;

pub const RATE: f64 = 8000.0;
pub const STEP_MS: u64 = 5;

/// Backend call seen by the recorder
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Start {
        source: NodeId,
        at: f64,
        offset: f64,
        duration: Option<f64>,
    },
    Stop {
        source: NodeId,
        at: f64,
    },
    Gain {
        node: NodeId,
        event: GainEvent,
    },
    Suspend,
}

/// GraphHandle that remembers what the control loop asked of it
pub struct Recorder {
    pub inner: GraphHandle,
    pub calls: Vec<Call>,
}

impl Recorder {
    pub fn starts(&self) -> Vec<(NodeId, f64, f64)> {
        self.calls
            .iter()
            .filter_map(|c| match *c {
                Call::Start {
                    source, at, offset, ..
                } => Some((source, at, offset)),
                _ => None,
            })
            .collect()
    }

    pub fn gain_events(&self, node: NodeId) -> Vec<GainEvent> {
        self.calls
            .iter()
            .filter_map(|c| match *c {
                Call::Gain { node: n, event } if n == node => Some(event),
                _ => None,
            })
            .collect()
    }
}

impl RenderBackend for Recorder {
    fn current_time(&self) -> f64 {
        self.inner.current_time()
    }

    fn sample_rate(&self) -> f64 {
        self.inner.sample_rate()
    }

    fn state(&self) -> ContextState {
        self.inner.state()
    }

    fn resume(&mut self) -> Result<(), BackendError> {
        self.inner.resume()
    }

    fn suspend(&mut self) -> Result<(), BackendError> {
        self.calls.push(Call::Suspend);
        self.inner.suspend()
    }

    fn create_gain(&mut self, initial: f32) -> Result<NodeId, BackendError> {
        self.inner.create_gain(initial)
    }

    fn create_source(&mut self, buffer: Arc<AudioBuffer>) -> Result<NodeId, BackendError> {
        self.inner.create_source(buffer)
    }

    fn connect(&mut self, from: NodeId, to: Destination) -> Result<(), BackendError> {
        self.inner.connect(from, to)
    }

    fn disconnect(&mut self, node: NodeId) -> Result<(), BackendError> {
        self.inner.disconnect(node)
    }

    fn start_source(
        &mut self,
        source: NodeId,
        at: f64,
        offset: f64,
        duration: Option<f64>,
    ) -> Result<(), BackendError> {
        self.calls.push(Call::Start {
            source,
            at,
            offset,
            duration,
        });
        self.inner.start_source(source, at, offset, duration)
    }

    fn stop_source(&mut self, source: NodeId, at: f64) -> Result<(), BackendError> {
        self.calls.push(Call::Stop { source, at });
        self.inner.stop_source(source, at)
    }

    fn schedule_gain(&mut self, gain: NodeId, event: GainEvent) -> Result<(), BackendError> {
        self.calls.push(Call::Gain { node: gain, event });
        self.inner.schedule_gain(gain, event)
    }

    fn poll_ended(&mut self) -> Option<NodeId> {
        self.inner.poll_ended()
    }

    fn dropped_completions(&self) -> u64 {
        self.inner.dropped_completions()
    }
}

pub struct Rig {
    pub session: TransportSession<Recorder>,
    pub graph: RenderGraph,
    pub clock: ManualClock,
    /// Everything rendered so far
    pub output: Vec<f32>,
}

impl Rig {
    /// Session over a bank of 3 s sine tones named "sine"
    pub fn new(config: EngineConfig, notes: Vec<ScheduledNote>) -> Self {
        let bank = InstrumentBank::synthesized("sine", 24..108, 3.0, RATE as u32);
        Self::with_instruments(config, notes, Box::new(bank))
    }

    pub fn with_instruments(
        config: EngineConfig,
        notes: Vec<ScheduledNote>,
        instruments: Box<dyn InstrumentSource>,
    ) -> Self {
        let (handle, graph) = render_graph(RATE, 8192, 1024);
        let clock = ManualClock::new();

        let mut session = TransportSession::new(
            config,
            Recorder {
                inner: handle,
                calls: Vec::new(),
            },
            Box::new(clock.clone()),
            instruments,
        );
        for note in notes {
            session.notes_mut().add_note(note);
        }

        Self {
            session,
            graph,
            clock,
            output: Vec::new(),
        }
    }

    /// Advance host and render time together by `ms`, pumping every step
    pub fn run(&mut self, ms: u64) {
        let frames = (RATE as u64 * STEP_MS / 1000) as usize;
        let mut block = vec![0.0f32; frames];
        for _ in 0..ms / STEP_MS {
            self.clock.advance(Duration::from_millis(STEP_MS));
            self.graph.render(&mut block);
            self.output.extend_from_slice(&block);
            self.session.pump();
            self.session.on_animation_frame();
        }
    }

    pub fn render_time(&self) -> f64 {
        self.session.backend().current_time()
    }

    pub fn live_nodes(&self) -> usize {
        self.session.backend().inner.live_node_count()
    }
}

pub fn note(id: u64, pitch: u8, start_tick: u64, duration_tick: u64) -> ScheduledNote {
    ScheduledNote::new(
        id,
        0,
        pitch,
        start_tick,
        duration_tick,
        100,
        InstrumentRef::new("sine"),
    )
}

/// Largest absolute sample in `samples`
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
}
