// Voice Pool - Admission, capacity and fade-governed termination of voices
//
// Every admitted voice owns two render nodes (source + envelope gain) and is
// routed into a per-pitch summing bus, itself routed into the pool output
// gain. The two voice nodes are disconnected exactly once, whichever path
// ends the voice (natural end, early stop, eviction, stop-all).
//
// At most `capacity` voices are pending or sounding at any render time.

use crate::audio::automation::GainEvent;
use crate::audio::backend::{BackendError, Destination, NodeId, RenderBackend};
use crate::synth::envelope::{FadePolicy, peak_gain};
use crate::synth::voice::{VoiceId, VoiceInstance, VoiceSpec, VoiceState};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("Voice {0} is already active")]
    DuplicateVoice(VoiceId),

    #[error("Unknown voice {0}")]
    UnknownVoice(VoiceId),

    #[error("Render backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Completion of a stop-all, in render time
///
/// Resolves once the last scheduled stop has passed plus the settle margin;
/// the rendering context must not be suspended before that.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settle {
    pub issued_at: f64,
    /// Latest hard stop among the faded voices
    pub last_stop: f64,
    pub resolves_at: f64,
}

impl Settle {
    pub fn is_resolved(&self, now: f64) -> bool {
        now >= self.resolves_at
    }

    /// Time left until resolution
    pub fn remaining(&self, now: f64) -> Duration {
        Duration::from_secs_f64((self.resolves_at - now).max(0.0))
    }

    /// Settle resolving when both `self` and `other` have
    pub fn merge(self, other: Settle) -> Settle {
        Settle {
            issued_at: self.issued_at.min(other.issued_at),
            last_stop: self.last_stop.max(other.last_stop),
            resolves_at: self.resolves_at.max(other.resolves_at),
        }
    }
}

pub struct VoicePool {
    capacity: usize,
    policy: FadePolicy,
    voices: Vec<VoiceInstance>,
    /// Per-pitch summing nodes, created on first use
    buses: HashMap<u8, NodeId>,
    output: Option<NodeId>,
    output_gain: f32,
    /// Age counter incremented on each admission for eviction priority
    age_counter: u64,
    evictions: u64,
    last_evicted: Option<VoiceId>,
}

impl VoicePool {
    pub fn new(capacity: usize, policy: FadePolicy) -> Self {
        Self {
            capacity: capacity.max(1),
            policy,
            voices: Vec::with_capacity(capacity.max(1) * 2),
            buses: HashMap::new(),
            output: None,
            output_gain: 1.0,
            age_counter: 0,
            evictions: 0,
            last_evicted: None,
        }
    }

    /// Pool whose output gain starts at `gain` (metronome volume)
    pub fn with_output_gain(mut self, gain: f32) -> Self {
        self.output_gain = gain.clamp(0.0, 1.0);
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> &FadePolicy {
        &self.policy
    }

    /// Voices held, whatever their state
    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn contains(&self, id: VoiceId) -> bool {
        self.voices.iter().any(|v| v.id == id)
    }

    pub fn voice(&self, id: VoiceId) -> Option<&VoiceInstance> {
        self.voices.iter().find(|v| v.id == id)
    }

    pub fn voices(&self) -> impl Iterator<Item = &VoiceInstance> {
        self.voices.iter()
    }

    pub fn state_of(&self, id: VoiceId, now: f64) -> Option<VoiceState> {
        self.voice(id).map(|v| v.state_at(now))
    }

    /// Voices audible at full level at `now`
    pub fn sounding_count(&self, now: f64) -> usize {
        self.voices
            .iter()
            .filter(|v| v.state_at(now) == VoiceState::Sounding)
            .count()
    }

    /// Voices pending or sounding at `now`
    pub fn live_count(&self, now: f64) -> usize {
        self.voices.iter().filter(|v| v.is_live_at(now)).count()
    }

    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    pub fn last_evicted(&self) -> Option<VoiceId> {
        self.last_evicted
    }

    pub fn output_gain(&self) -> f32 {
        self.output_gain
    }

    pub fn bus_count(&self) -> usize {
        self.buses.len()
    }

    /// Render nodes owned by the pool itself (buses and output)
    pub fn shared_node_count(&self) -> usize {
        self.buses.len() + usize::from(self.output.is_some())
    }

    /// Admit a voice and hand its start time to the backend
    ///
    /// When `capacity` voices are already pending or sounding, the oldest of
    /// them is retired first: dropped outright if it has not started yet,
    /// faded out over the eviction fade otherwise.
    pub fn admit<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        spec: VoiceSpec,
    ) -> Result<VoiceId, PoolError> {
        let now = backend.current_time();
        if let Some(existing) = self.voice(spec.id) {
            if existing.state_at(now) != VoiceState::Released {
                return Err(PoolError::DuplicateVoice(spec.id));
            }
            // Hard stop already passed; its completion was lost or is late
            self.release_completed(backend, spec.id)?;
        }

        let start_at = spec.start_at.max(now);
        let fade_start = start_at + spec.duration.max(0.0);

        self.make_room(backend, now)?;

        let bus = self.bus_for(backend, spec.pitch)?;
        let (source, envelope) = self.wire_voice(backend, &spec, bus, start_at, fade_start)?;

        self.age_counter = self.age_counter.wrapping_add(1);
        let voice = VoiceInstance {
            id: spec.id,
            pitch: spec.pitch,
            source,
            envelope,
            start_at,
            fade_start,
            scheduled_stop_time: fade_start + self.policy.clamp_fade(self.policy.release),
            age: self.age_counter,
        };

        tracing::debug!(
            voice = %voice.id,
            pitch = voice.pitch,
            start_at,
            offset = spec.offset,
            mid_note = spec.mid_note,
            "Voice admitted"
        );

        self.voices.push(voice);
        Ok(spec.id)
    }

    /// Fade a voice out linearly from `at`, then stop it
    ///
    /// An already scheduled stop that ends sooner wins.
    pub fn schedule_fade_stop<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        id: VoiceId,
        at: f64,
        fade: f64,
    ) -> Result<(), PoolError> {
        let now = backend.current_time();
        let policy = self.policy;
        let voice = self
            .voices
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or(PoolError::UnknownVoice(id))?;

        let at = at.max(now);
        if at >= voice.fade_start {
            return Ok(());
        }

        let end = (at + policy.clamp_fade(fade)).min(voice.scheduled_stop_time);
        if end - at < policy.min_fade {
            return Ok(());
        }

        for event in policy.fade_out(at, end - at) {
            backend.schedule_gain(voice.envelope, event)?;
        }
        backend.stop_source(voice.source, end)?;

        voice.fade_start = at;
        voice.scheduled_stop_time = end;
        Ok(())
    }

    /// Remove a voice whose sound ended and disconnect its nodes
    pub fn release_completed<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        id: VoiceId,
    ) -> Result<(), PoolError> {
        let index = self
            .voices
            .iter()
            .position(|v| v.id == id)
            .ok_or(PoolError::UnknownVoice(id))?;
        let voice = self.voices.swap_remove(index);
        Self::disconnect_voice(backend, &voice);
        Ok(())
    }

    /// Completion for render source `node`; false if no voice of this pool owns it
    pub fn release_source<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        node: NodeId,
    ) -> bool {
        match self.voices.iter().find(|v| v.source == node).map(|v| v.id) {
            Some(id) => self.release_completed(backend, id).is_ok(),
            None => false,
        }
    }

    /// Fade out every voice over `grace` seconds
    ///
    /// Voices that have not started yet are released immediately.
    pub fn stop_all<B: RenderBackend + ?Sized>(&mut self, backend: &mut B, grace: f64) -> Settle {
        let now = backend.current_time();
        let grace = self.policy.clamp_fade(grace);

        self.release_unstarted(backend, now);
        let ids: Vec<VoiceId> = self.voices.iter().map(|v| v.id).collect();
        for id in ids {
            if let Err(e) = self.schedule_fade_stop(backend, id, now, grace) {
                tracing::warn!(voice = %id, error = %e, "Failed to fade voice on stop");
            }
        }

        let last_stop = self
            .voices
            .iter()
            .map(|v| v.scheduled_stop_time)
            .fold(now + grace, f64::max);

        Settle {
            issued_at: now,
            last_stop,
            resolves_at: last_stop + self.policy.settle_margin,
        }
    }

    /// Stop every voice that has not started yet; sounding voices are left alone
    ///
    /// Voices starting later than one minimum fade from now are released at
    /// once; closer ones are faded from now, before they become audible.
    pub fn cancel_pending<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> usize {
        let now = backend.current_time();
        let released = self.release_unstarted(backend, now);
        let imminent: Vec<VoiceId> = self
            .voices
            .iter()
            .filter(|v| v.state_at(now) == VoiceState::Pending)
            .map(|v| v.id)
            .collect();

        for &id in &imminent {
            if let Err(e) = self.schedule_fade_stop(backend, id, now, self.policy.min_fade) {
                tracing::warn!(voice = %id, error = %e, "Failed to cancel pending voice");
            }
        }
        released + imminent.len()
    }

    /// Release voices whose hard stop passed more than `slack` seconds ago
    /// without a completion being received
    pub fn reap_stale<B: RenderBackend + ?Sized>(&mut self, backend: &mut B, slack: f64) -> usize {
        let cutoff = backend.current_time() - slack.max(0.0);
        let mut reaped = 0;
        let mut index = 0;
        while index < self.voices.len() {
            if self.voices[index].scheduled_stop_time < cutoff {
                let voice = self.voices.swap_remove(index);
                Self::disconnect_voice(backend, &voice);
                reaped += 1;
            } else {
                index += 1;
            }
        }
        reaped
    }

    /// Disconnect every voice still held, without waiting for completion
    pub fn clear<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> usize {
        let released = self.voices.len();
        for voice in self.voices.drain(..) {
            Self::disconnect_voice(backend, &voice);
        }
        released
    }

    /// Disconnect every node the pool created, buses and output included
    pub fn dispose<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) {
        self.clear(backend);
        for (_, bus) in self.buses.drain() {
            let _ = backend.disconnect(bus);
        }
        if let Some(output) = self.output.take() {
            let _ = backend.disconnect(output);
        }
    }

    /// Ramp the pool output gain to `gain`
    pub fn set_output_gain<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        gain: f32,
    ) -> Result<(), PoolError> {
        self.output_gain = if gain.is_finite() { gain.clamp(0.0, 1.0) } else { 0.0 };
        if let Some(output) = self.output {
            let now = backend.current_time();
            backend.schedule_gain(output, GainEvent::CancelAndHoldAt { at: now })?;
            backend.schedule_gain(
                output,
                GainEvent::LinearRampTo {
                    value: self.output_gain,
                    end: now + self.policy.min_fade,
                },
            )?;
        }
        Ok(())
    }

    /// Retire the oldest live voices until a new one fits under the cap
    fn make_room<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        now: f64,
    ) -> Result<(), PoolError> {
        while self.live_count(now) >= self.capacity {
            let Some(victim) = self
                .voices
                .iter()
                .filter(|v| v.is_live_at(now))
                .min_by_key(|v| v.age)
                .map(|v| v.id)
            else {
                return Ok(());
            };

            if self.is_unstarted(victim, now) {
                self.drop_voice(backend, victim);
            } else {
                self.schedule_fade_stop(backend, victim, now, self.policy.eviction_fade)?;
                if self.voice(victim).is_some_and(|v| v.is_live_at(now)) {
                    // Could not be shortened; give up rather than spin
                    return Ok(());
                }
            }

            self.evictions += 1;
            self.last_evicted = Some(victim);
            tracing::debug!(voice = %victim, at = now, "Voice evicted");
        }
        Ok(())
    }

    /// Starts far enough ahead that disconnecting it cannot cut audible sound
    fn is_unstarted(&self, id: VoiceId, now: f64) -> bool {
        self.voice(id)
            .is_some_and(|v| v.start_at >= now + self.policy.min_fade)
    }

    fn release_unstarted<B: RenderBackend + ?Sized>(&mut self, backend: &mut B, now: f64) -> usize {
        let unstarted: Vec<VoiceId> = self
            .voices
            .iter()
            .filter(|v| v.start_at >= now + self.policy.min_fade)
            .map(|v| v.id)
            .collect();
        for &id in &unstarted {
            self.drop_voice(backend, id);
        }
        unstarted.len()
    }

    fn drop_voice<B: RenderBackend + ?Sized>(&mut self, backend: &mut B, id: VoiceId) {
        if let Some(index) = self.voices.iter().position(|v| v.id == id) {
            let voice = self.voices.swap_remove(index);
            Self::disconnect_voice(backend, &voice);
        }
    }

    fn ensure_output<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
    ) -> Result<NodeId, BackendError> {
        if let Some(output) = self.output {
            return Ok(output);
        }
        let output = backend.create_gain(self.output_gain)?;
        if let Err(e) = backend.connect(output, Destination::Output) {
            let _ = backend.disconnect(output);
            return Err(e);
        }
        self.output = Some(output);
        Ok(output)
    }

    fn bus_for<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        pitch: u8,
    ) -> Result<NodeId, BackendError> {
        if let Some(&bus) = self.buses.get(&pitch) {
            return Ok(bus);
        }
        let output = self.ensure_output(backend)?;
        let bus = backend.create_gain(1.0)?;
        if let Err(e) = backend.connect(bus, Destination::Node(output)) {
            let _ = backend.disconnect(bus);
            return Err(e);
        }
        self.buses.insert(pitch, bus);
        Ok(bus)
    }

    /// Create, connect and program the two nodes of a voice; on failure
    /// nothing stays connected
    fn wire_voice<B: RenderBackend + ?Sized>(
        &self,
        backend: &mut B,
        spec: &VoiceSpec,
        bus: NodeId,
        start_at: f64,
        fade_start: f64,
    ) -> Result<(NodeId, NodeId), BackendError> {
        let envelope = backend.create_gain(0.0)?;
        let source = match backend.create_source(spec.buffer.clone()) {
            Ok(source) => source,
            Err(e) => {
                let _ = backend.disconnect(envelope);
                return Err(e);
            }
        };

        let programmed = (|| {
            backend.connect(envelope, Destination::Node(bus))?;
            backend.connect(source, Destination::Node(envelope))?;

            for event in self
                .policy
                .fade_in(start_at, peak_gain(spec.velocity), spec.mid_note)
            {
                backend.schedule_gain(envelope, event)?;
            }
            for event in self.policy.fade_out(fade_start, self.policy.release) {
                backend.schedule_gain(envelope, event)?;
            }

            backend.start_source(source, start_at, spec.offset.max(0.0), None)?;
            backend.stop_source(source, fade_start + self.policy.clamp_fade(self.policy.release))
        })();

        if let Err(e) = programmed {
            let _ = backend.disconnect(source);
            let _ = backend.disconnect(envelope);
            return Err(e);
        }
        Ok((source, envelope))
    }

    fn disconnect_voice<B: RenderBackend + ?Sized>(backend: &mut B, voice: &VoiceInstance) {
        for node in [voice.source, voice.envelope] {
            if let Err(e) = backend.disconnect(node) {
                tracing::warn!(voice = %voice.id, node, error = %e, "Failed to disconnect voice node");
            }
        }
    }
}
