// Render graph - Software implementation of the rendering backend
//
// Split in two halves connected by lock-free ringbufs:
// - `GraphHandle` lives on the control thread and implements `RenderBackend`
// - `RenderGraph` lives on the render thread (cpal callback or offline loop)
//
// Besides the queues, the two halves share the sample clock (`AudioTiming`,
// written by the render side), the context state atomic and a count of the
// completions dropped on a full notification queue.

use crate::audio::automation::{GainAutomation, GainEvent};
use crate::audio::backend::{BackendError, Destination, NodeId, RenderBackend};
use crate::audio::buffer::AudioBuffer;
use crate::audio::timing::AudioTiming;
use crate::connection::status::{AtomicContextState, ContextState};
use crate::messaging::channels::{
    CommandConsumer, CommandProducer, NotificationConsumer, NotificationProducer,
    create_command_channel, create_notification_channel,
};
use crate::messaging::command::GraphCommand;
use crate::messaging::notification::GraphNotification;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Create both halves of a render graph
pub fn render_graph(
    sample_rate: f64,
    command_capacity: usize,
    notification_capacity: usize,
) -> (GraphHandle, RenderGraph) {
    let (command_tx, command_rx) = create_command_channel(command_capacity.max(16));
    let (notification_tx, notification_rx) =
        create_notification_channel(notification_capacity.max(16));
    let timing = AudioTiming::new(sample_rate);
    let context = AtomicContextState::new(ContextState::Suspended);
    let dropped = Arc::new(AtomicU64::new(0));

    let handle = GraphHandle {
        commands: command_tx,
        notifications: notification_rx,
        timing: timing.clone(),
        context: context.clone(),
        dropped: Arc::clone(&dropped),
        next_id: 1,
        live: HashSet::new(),
    };

    let graph = RenderGraph {
        commands: command_rx,
        notifications: notification_tx,
        timing,
        context,
        dropped,
        sources: HashMap::new(),
        gains: HashMap::new(),
        order: Vec::new(),
        order_dirty: false,
    };

    (handle, graph)
}

// ============================================================================
// Control side
// ============================================================================

/// Control-thread half of the render graph
pub struct GraphHandle {
    commands: CommandProducer,
    notifications: NotificationConsumer,
    timing: AudioTiming,
    context: AtomicContextState,
    dropped: Arc<AtomicU64>,
    next_id: NodeId,
    /// Nodes created and not yet disconnected
    live: HashSet<NodeId>,
}

impl GraphHandle {
    /// Shared context state (the audio engine closes it on device failure)
    pub fn context(&self) -> AtomicContextState {
        self.context.clone()
    }

    /// Render clock shared with the render thread
    pub fn timing(&self) -> AudioTiming {
        self.timing.clone()
    }

    /// Permanently close the context
    pub fn close(&mut self) {
        self.context.set(ContextState::Closed);
    }

    /// Number of nodes created and not yet disconnected
    pub fn live_node_count(&self) -> usize {
        self.live.len()
    }

    fn send(&mut self, command: GraphCommand) -> Result<(), BackendError> {
        if self.context.get() == ContextState::Closed {
            return Err(BackendError::ContextClosed);
        }
        ringbuf::traits::Producer::try_push(&mut self.commands, command)
            .map_err(|_| BackendError::CommandQueueFull)
    }

    fn ensure_live(&self, id: NodeId) -> Result<(), BackendError> {
        if self.live.contains(&id) {
            Ok(())
        } else {
            Err(BackendError::UnknownNode(id))
        }
    }

    fn allocate(&mut self, command: impl FnOnce(NodeId) -> GraphCommand) -> Result<NodeId, BackendError> {
        let id = self.next_id;
        self.send(command(id))?;
        self.next_id += 1;
        self.live.insert(id);
        Ok(id)
    }
}

impl RenderBackend for GraphHandle {
    fn current_time(&self) -> f64 {
        self.timing.current_time()
    }

    fn sample_rate(&self) -> f64 {
        self.timing.sample_rate()
    }

    fn state(&self) -> ContextState {
        self.context.get()
    }

    fn resume(&mut self) -> Result<(), BackendError> {
        if self.context.transition(ContextState::Running) {
            Ok(())
        } else {
            Err(BackendError::ContextClosed)
        }
    }

    fn suspend(&mut self) -> Result<(), BackendError> {
        if self.context.transition(ContextState::Suspended) {
            Ok(())
        } else {
            Err(BackendError::ContextClosed)
        }
    }

    fn create_gain(&mut self, initial: f32) -> Result<NodeId, BackendError> {
        self.allocate(|id| GraphCommand::CreateGain { id, initial })
    }

    fn create_source(&mut self, buffer: Arc<AudioBuffer>) -> Result<NodeId, BackendError> {
        self.allocate(|id| GraphCommand::CreateSource { id, buffer })
    }

    fn connect(&mut self, from: NodeId, to: Destination) -> Result<(), BackendError> {
        self.ensure_live(from)?;
        if let Destination::Node(target) = to {
            self.ensure_live(target)?;
        }
        self.send(GraphCommand::Connect { from, to })
    }

    fn disconnect(&mut self, node: NodeId) -> Result<(), BackendError> {
        self.ensure_live(node)?;
        self.send(GraphCommand::Disconnect { id: node })?;
        self.live.remove(&node);
        Ok(())
    }

    fn start_source(
        &mut self,
        source: NodeId,
        at: f64,
        offset: f64,
        duration: Option<f64>,
    ) -> Result<(), BackendError> {
        self.ensure_live(source)?;
        self.send(GraphCommand::Start {
            id: source,
            at,
            offset,
            duration,
        })
    }

    fn stop_source(&mut self, source: NodeId, at: f64) -> Result<(), BackendError> {
        self.ensure_live(source)?;
        self.send(GraphCommand::Stop { id: source, at })
    }

    fn schedule_gain(&mut self, gain: NodeId, event: GainEvent) -> Result<(), BackendError> {
        self.ensure_live(gain)?;
        self.send(GraphCommand::Gain { id: gain, event })
    }

    fn poll_ended(&mut self) -> Option<NodeId> {
        while let Some(notification) = ringbuf::traits::Consumer::try_pop(&mut self.notifications) {
            match notification {
                GraphNotification::SourceEnded(id) => return Some(id),
            }
        }
        None
    }

    fn dropped_completions(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

// ============================================================================
// Render side
// ============================================================================

struct SourceNode {
    buffer: Arc<AudioBuffer>,
    output: Option<Destination>,
    /// Buffer frames advanced per output frame
    rate_ratio: f64,
    start_frame: Option<u64>,
    /// Start offset, in buffer frames
    offset: f64,
    end_frame: Option<u64>,
    stop_frame: Option<u64>,
    finished: bool,
}

impl SourceNode {
    /// Sample at output `frame`, or None when silent. Sets `finished` on the
    /// frame the source ends.
    #[inline]
    fn next(&mut self, frame: u64) -> Option<f32> {
        if self.finished {
            return None;
        }
        if self.stop_frame.is_some_and(|stop| frame >= stop)
            || self.end_frame.is_some_and(|end| frame >= end)
        {
            self.finished = true;
            return None;
        }

        let start = self.start_frame?;
        if frame < start {
            return None;
        }

        let position = self.offset + (frame - start) as f64 * self.rate_ratio;
        if position >= self.buffer.len() as f64 {
            self.finished = true;
            return None;
        }
        Some(self.buffer.sample_at(position))
    }
}

struct GainNode {
    automation: GainAutomation,
    output: Option<Destination>,
    input: f32,
}

/// Render-thread half of the render graph
pub struct RenderGraph {
    commands: CommandConsumer,
    notifications: NotificationProducer,
    timing: AudioTiming,
    context: AtomicContextState,
    /// Completions lost to a full notification queue
    dropped: Arc<AtomicU64>,
    sources: HashMap<NodeId, SourceNode>,
    gains: HashMap<NodeId, GainNode>,
    /// Gain nodes, furthest from the output first
    order: Vec<NodeId>,
    order_dirty: bool,
}

impl RenderGraph {
    pub fn sample_rate(&self) -> f64 {
        self.timing.sample_rate()
    }

    /// Nodes currently present on the render side
    pub fn node_count(&self) -> usize {
        self.sources.len() + self.gains.len()
    }

    /// Sources started and not finished
    pub fn playing_sources(&self) -> usize {
        self.sources
            .values()
            .filter(|s| s.start_frame.is_some() && !s.finished)
            .count()
    }

    /// Render one mono block and advance the clock
    ///
    /// Writes silence and leaves the clock untouched while suspended.
    pub fn render(&mut self, output: &mut [f32]) {
        self.apply_commands();

        if self.context.get() != ContextState::Running {
            output.fill(0.0);
            return;
        }

        if self.order_dirty {
            self.rebuild_order();
        }

        let sample_rate = self.timing.sample_rate();
        let first_frame = self.timing.current_sample();

        for (i, out) in output.iter_mut().enumerate() {
            let frame = first_frame + i as u64;
            let time = frame as f64 / sample_rate;

            for gain in self.gains.values_mut() {
                gain.input = 0.0;
            }

            let mut mix = 0.0f32;

            for (id, source) in self.sources.iter_mut() {
                let was_finished = source.finished;
                match source.next(frame) {
                    Some(sample) => match source.output {
                        Some(Destination::Node(target)) => {
                            if let Some(gain) = self.gains.get_mut(&target) {
                                gain.input += sample;
                            }
                        }
                        Some(Destination::Output) => mix += sample,
                        None => {}
                    },
                    None => {
                        if source.finished
                            && !was_finished
                            && ringbuf::traits::Producer::try_push(
                                &mut self.notifications,
                                GraphNotification::SourceEnded(*id),
                            )
                            .is_err()
                        {
                            self.dropped.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            }

            for index in 0..self.order.len() {
                let id = self.order[index];
                let Some(gain) = self.gains.get(&id) else {
                    continue;
                };
                let value = gain.input * gain.automation.value_at(time);
                match gain.output {
                    Some(Destination::Node(target)) => {
                        if let Some(next) = self.gains.get_mut(&target) {
                            next.input += value;
                        }
                    }
                    Some(Destination::Output) => mix += value,
                    None => {}
                }
            }

            *out = mix;
        }

        self.timing.advance(output.len());

        let now = self.timing.current_time();
        for gain in self.gains.values_mut() {
            gain.automation.prune(now);
        }
    }

    fn apply_commands(&mut self) {
        while let Some(command) = ringbuf::traits::Consumer::try_pop(&mut self.commands) {
            self.apply(command);
        }
    }

    fn apply(&mut self, command: GraphCommand) {
        match command {
            GraphCommand::CreateGain { id, initial } => {
                self.gains.insert(
                    id,
                    GainNode {
                        automation: GainAutomation::new(initial),
                        output: None,
                        input: 0.0,
                    },
                );
                self.order_dirty = true;
            }
            GraphCommand::CreateSource { id, buffer } => {
                let rate_ratio = buffer.sample_rate() as f64 / self.timing.sample_rate();
                self.sources.insert(
                    id,
                    SourceNode {
                        buffer,
                        output: None,
                        rate_ratio,
                        start_frame: None,
                        offset: 0.0,
                        end_frame: None,
                        stop_frame: None,
                        finished: false,
                    },
                );
            }
            GraphCommand::Connect { from, to } => {
                if let Some(source) = self.sources.get_mut(&from) {
                    source.output = Some(to);
                } else if let Some(gain) = self.gains.get_mut(&from) {
                    gain.output = Some(to);
                    self.order_dirty = true;
                }
            }
            GraphCommand::Disconnect { id } => {
                if self.sources.remove(&id).is_none() && self.gains.remove(&id).is_some() {
                    self.order_dirty = true;
                }
            }
            GraphCommand::Start {
                id,
                at,
                offset,
                duration,
            } => {
                let start_frame = self.timing.seconds_to_frame(at);
                let end_frame = duration.map(|d| self.timing.seconds_to_frame(at + d.max(0.0)));
                if let Some(source) = self.sources.get_mut(&id) {
                    source.start_frame = Some(start_frame);
                    source.offset = offset.max(0.0) * source.buffer.sample_rate() as f64;
                    source.end_frame = end_frame;
                }
            }
            GraphCommand::Stop { id, at } => {
                let stop_frame = self.timing.seconds_to_frame(at);
                if let Some(source) = self.sources.get_mut(&id) {
                    source.stop_frame =
                        Some(source.stop_frame.map_or(stop_frame, |s| s.min(stop_frame)));
                }
            }
            GraphCommand::Gain { id, event } => {
                if let Some(gain) = self.gains.get_mut(&id) {
                    gain.automation.apply(event);
                }
            }
        }
    }

    fn rebuild_order(&mut self) {
        let limit = self.gains.len();
        let mut depths: Vec<(usize, NodeId)> = self
            .gains
            .keys()
            .map(|&id| {
                let mut depth = 0;
                let mut current = self.gains.get(&id).and_then(|g| g.output);
                while let Some(Destination::Node(next)) = current {
                    depth += 1;
                    if depth > limit {
                        break; // cycle
                    }
                    current = self.gains.get(&next).and_then(|g| g.output);
                }
                (depth, id)
            })
            .collect();

        depths.sort_unstable_by(|a, b| b.cmp(a));
        self.order = depths.into_iter().map(|(_, id)| id).collect();
        self.order_dirty = false;
    }
}
