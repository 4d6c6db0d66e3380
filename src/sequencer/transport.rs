// Transport - Playback sessions over the render backend
//
// One TransportSession lives for the whole application. It owns the note and
// metronome schedulers, both voice pools, the playhead and the control-loop
// timers, and is the only place where a play session starts or ends.

use super::metronome::{ClickReport, MetronomeScheduler};
use super::note_store::NoteStore;
use super::playhead::{PlayheadTracker, PollOutcome, Visibility};
use super::scheduler::{NoteScheduler, PassReport};
use super::timeline::{TimeModel, TimeSignature};
use crate::audio::backend::{BackendError, RenderBackend};
use crate::audio::parameters::AtomicF64;
use crate::config::EngineConfig;
use crate::connection::status::ContextState;
use crate::control::{CancelHandle, HostClock, TimerId, TimerQueue, TimerTask};
use crate::sampler::source::InstrumentSource;
use crate::synth::envelope::FadePolicy;
use crate::synth::voice_pool::{Settle, VoicePool};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;

/// Extra wait after the previous session's last stop before retrying
/// notes whose old voice was still fading when play started
const CATCH_UP_MARGIN: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Render context unavailable: {0}")]
    RenderContextUnavailable(#[from] BackendError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
}

impl TransportState {
    pub fn is_playing(&self) -> bool {
        matches!(self, TransportState::Playing)
    }
}

/// Values observed by the UI, written only by the control loop
#[derive(Default)]
pub struct SharedTransportState {
    playing: AtomicBool,
    metronome_enabled: AtomicBool,
    playhead_seconds: AtomicF64,
}

impl SharedTransportState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn publish_position(&self, seconds: f64) {
        self.playhead_seconds.set(seconds);
    }

    fn publish_playing(&self, playing: bool) {
        self.playing.store(playing, Ordering::Relaxed);
    }

    fn publish_metronome(&self, enabled: bool) {
        self.metronome_enabled.store(enabled, Ordering::Relaxed);
    }
}

/// Read-only view of the transport, cheap to clone
#[derive(Clone)]
pub struct TransportStatus {
    shared: Arc<SharedTransportState>,
}

impl TransportStatus {
    pub fn playhead_seconds(&self) -> f64 {
        self.shared.playhead_seconds.get()
    }

    pub fn is_playing(&self) -> bool {
        self.shared.playing.load(Ordering::Relaxed)
    }

    pub fn metronome_enabled(&self) -> bool {
        self.shared.metronome_enabled.load(Ordering::Relaxed)
    }
}

pub struct TransportSession<B: RenderBackend> {
    config: EngineConfig,
    backend: B,
    clock: Box<dyn HostClock>,
    instruments: Box<dyn InstrumentSource>,
    notes: NoteStore,
    model: TimeModel,

    voices: VoicePool,
    clicks: VoicePool,
    scheduler: NoteScheduler,
    metronome: MetronomeScheduler,
    playhead: PlayheadTracker,

    timers: TimerQueue,
    /// Timers of the current play session
    session_timers: CancelHandle,
    poll_timer: Option<TimerId>,
    suspend_timer: Option<TimerId>,
    pending_settle: Option<Settle>,
    /// Backend completion drops already accounted for
    dropped_seen: u64,

    state: TransportState,
    shared: Arc<SharedTransportState>,
    /// Timeline position while stopped
    position: f64,
    /// Where the current (or last) play session started
    last_start: f64,
}

impl<B: RenderBackend> TransportSession<B> {
    pub fn new(
        config: EngineConfig,
        backend: B,
        clock: Box<dyn HostClock>,
        instruments: Box<dyn InstrumentSource>,
    ) -> Self {
        let config = config.sanitized();
        let policy = FadePolicy::from_config(&config);

        let mut metronome = MetronomeScheduler::new(
            backend.sample_rate().round() as u32,
            config.metronome_lookahead_seconds,
        );
        metronome.set_enabled(config.metronome_enabled);

        let mut playhead = PlayheadTracker::new(config.background_poll_interval());
        playhead.set_end_of_timeline(config.end_of_timeline_seconds);

        let shared = SharedTransportState::new();
        shared.publish_metronome(config.metronome_enabled);

        Self {
            model: config.time_model(),
            voices: VoicePool::new(config.max_concurrent_voices, policy),
            clicks: VoicePool::new(config.max_metronome_voices, policy)
                .with_output_gain(config.metronome_volume),
            scheduler: NoteScheduler::new(config.lookahead_seconds),
            metronome,
            playhead,
            timers: TimerQueue::new(),
            session_timers: CancelHandle::new(),
            poll_timer: None,
            suspend_timer: None,
            pending_settle: None,
            dropped_seen: 0,
            state: TransportState::Stopped,
            shared,
            position: 0.0,
            last_start: 0.0,
            notes: NoteStore::new(),
            config,
            backend,
            clock,
            instruments,
        }
    }

    /// Start a play session at the current position
    ///
    /// No-op while already playing. Fails, leaving the transport stopped,
    /// when the render context cannot be resumed.
    pub fn play(&mut self) -> Result<(), TransportError> {
        if self.state.is_playing() {
            return Ok(());
        }

        if let Some(id) = self.suspend_timer.take() {
            self.timers.cancel(id);
        }
        self.pending_settle = None;

        if let Err(e) = self.backend.resume() {
            tracing::warn!(error = %e, "Cannot start playback");
            return Err(e.into());
        }

        self.state = TransportState::Playing;
        self.shared.publish_playing(true);
        self.last_start = self.position;

        self.playhead.start(self.position);
        self.playhead.poll(self.backend.current_time());

        self.scheduler.start();
        if self.metronome.is_enabled() {
            self.metronome.start(self.position, &self.model);
        }

        self.run_note_pass();
        self.run_metronome_pass();
        self.arm_session_timers();

        tracing::info!(
            position = self.position,
            bpm = self.model.bpm(),
            notes = self.notes.len(),
            "Playback started"
        );
        Ok(())
    }

    /// Stop and keep the position
    pub fn pause(&mut self) -> Option<Settle> {
        self.stop(false)
    }

    /// End the play session
    ///
    /// Every voice fades out over the stop grace. The render context is
    /// suspended once the returned settle has resolved, from `pump`.
    /// Returns None when the transport was not playing.
    pub fn stop(&mut self, return_to_last_start: bool) -> Option<Settle> {
        if !self.state.is_playing() {
            if return_to_last_start {
                self.move_to(self.last_start);
            }
            return None;
        }

        let cancelled = self.session_timers.cancel(&mut self.timers);
        self.session_timers = CancelHandle::new();
        self.poll_timer = None;

        if self.playhead.is_running() {
            self.playhead.poll(self.backend.current_time());
        }
        let reached = self.playhead.stop();

        let grace = self.config.stop_grace_ms / 1000.0;
        let settle = self
            .scheduler
            .stop(&mut self.voices, &mut self.backend, grace)
            .merge(self.metronome.stop(&mut self.clicks, &mut self.backend, grace));

        self.state = TransportState::Stopped;
        self.shared.publish_playing(false);
        self.move_to(if return_to_last_start {
            self.last_start
        } else {
            reached
        });

        let wait = settle.remaining(self.backend.current_time());
        self.suspend_timer = Some(
            self.timers
                .schedule_once(TimerTask::SuspendContext, self.clock.now() + wait),
        );
        self.pending_settle = Some(settle);

        tracing::info!(
            position = self.position,
            timers_cancelled = cancelled,
            settle_in = ?wait,
            "Playback stopped"
        );
        Some(settle)
    }

    /// Move the playhead; while playing this restarts the session there
    pub fn seek(&mut self, seconds: f64) -> Result<(), TransportError> {
        let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        if self.state.is_playing() {
            self.stop(false);
            self.move_to(seconds);
            self.play()
        } else {
            self.move_to(seconds);
            Ok(())
        }
    }

    /// Returns the new enabled state
    pub fn toggle_metronome(&mut self) -> bool {
        let enabled = !self.metronome.is_enabled();
        self.metronome.set_enabled(enabled);
        self.shared.publish_metronome(enabled);

        if self.state.is_playing() {
            if enabled {
                let playhead = self.playhead.position();
                self.metronome
                    .resync(playhead, &self.model, &mut self.clicks, &mut self.backend);
                self.run_metronome_pass();
            } else {
                self.metronome.halt(&mut self.clicks, &mut self.backend);
            }
        }

        tracing::info!(enabled, "Metronome toggled");
        enabled
    }

    pub fn update_metronome_volume(&mut self, gain: f32) {
        if let Err(e) = self
            .metronome
            .set_volume(&mut self.clicks, &mut self.backend, gain)
        {
            tracing::warn!(error = %e, "Failed to apply metronome volume");
        }
    }

    /// Change the tempo, keeping the musical position
    ///
    /// Voices already scheduled keep their times; while playing, the session
    /// restarts at the same tick under the new tempo.
    pub fn set_tempo(&mut self, bpm: f64) -> Result<(), TransportError> {
        if self.state.is_playing() {
            if self.playhead.is_running() {
                self.playhead.poll(self.backend.current_time());
            }
            let tick = self.model.seconds_to_tick(self.playhead.position());
            self.stop(false);
            self.retime(bpm);
            self.move_to(self.model.tick_to_seconds(tick));
            self.play()
        } else {
            let tick = self.model.seconds_to_tick(self.position);
            self.retime(bpm);
            self.move_to(self.model.tick_to_seconds(tick));
            Ok(())
        }
    }

    pub fn set_time_signature(&mut self, beats_per_measure: u8, note_value: u8) {
        self.model
            .set_time_signature(TimeSignature::new(beats_per_measure, note_value));

        if self.state.is_playing() && self.metronome.is_running() {
            if self.playhead.is_running() {
                self.playhead.poll(self.backend.current_time());
            }
            let playhead = self.playhead.position();
            self.metronome
                .resync(playhead, &self.model, &mut self.clicks, &mut self.backend);
            self.run_metronome_pass();
        }
    }

    /// Switch the playhead between animation-frame and interval polling
    pub fn set_visibility(&mut self, visibility: Visibility) {
        self.playhead.set_visibility(visibility);
        if !self.state.is_playing() {
            return;
        }

        match visibility {
            Visibility::Background => {
                if self.poll_timer.is_none() {
                    self.arm_poll_timer();
                }
            }
            Visibility::Foreground => {
                if let Some(id) = self.poll_timer.take() {
                    self.timers.cancel(id);
                }
            }
        }
    }

    pub fn set_end_of_timeline(&mut self, end: Option<f64>) {
        self.playhead.set_end_of_timeline(end);
    }

    /// Host animation frame; polls the playhead while foregrounded
    pub fn on_animation_frame(&mut self) -> PollOutcome {
        if !self.state.is_playing() || self.playhead.visibility() != Visibility::Foreground {
            return PollOutcome::Idle;
        }
        self.poll_playhead()
    }

    /// Run the control loop once: drain completions, then every due timer
    pub fn pump(&mut self) {
        self.drain_completions();

        let now = self.clock.now();
        while let Some((_, task)) = self.timers.pop_due(now) {
            match task {
                TimerTask::NotePass => {
                    if self.poll_playhead() != PollOutcome::ReachedEnd {
                        self.run_note_pass();
                    }
                }
                TimerTask::MetronomePass => {
                    if self.poll_playhead() != PollOutcome::ReachedEnd {
                        self.run_metronome_pass();
                    }
                }
                TimerTask::PlayheadPoll => {
                    self.poll_playhead();
                }
                TimerTask::SuspendContext => self.suspend_if_settled(),
            }
        }
    }

    /// Host time of the next timer, for hosts that sleep between pumps
    pub fn next_wakeup(&self) -> Option<Duration> {
        self.timers.next_due()
    }

    /// Tear everything down; nothing may be scheduled afterwards
    pub fn dispose(&mut self) {
        self.session_timers.cancel(&mut self.timers);
        self.timers.clear();

        self.playhead.stop();
        self.voices.dispose(&mut self.backend);
        self.clicks.dispose(&mut self.backend);
        if let Err(e) = self.backend.suspend() {
            tracing::debug!(error = %e, "Render context already gone");
        }

        self.state = TransportState::Stopped;
        self.shared.publish_playing(false);
        self.pending_settle = None;
        self.suspend_timer = None;
        self.poll_timer = None;
        tracing::info!("Transport disposed");
    }

    pub fn status(&self) -> TransportStatus {
        TransportStatus {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    /// Timeline position in seconds
    pub fn position(&self) -> f64 {
        if self.state.is_playing() {
            self.playhead.position()
        } else {
            self.position
        }
    }

    pub fn last_start(&self) -> f64 {
        self.last_start
    }

    pub fn notes(&self) -> &NoteStore {
        &self.notes
    }

    /// Edits reach the audio on the next scheduling pass
    pub fn notes_mut(&mut self) -> &mut NoteStore {
        &mut self.notes
    }

    pub fn model(&self) -> &TimeModel {
        &self.model
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn voice_pool(&self) -> &VoicePool {
        &self.voices
    }

    pub fn click_pool(&self) -> &VoicePool {
        &self.clicks
    }

    pub fn scheduler(&self) -> &NoteScheduler {
        &self.scheduler
    }

    pub fn metronome(&self) -> &MetronomeScheduler {
        &self.metronome
    }

    pub fn playhead(&self) -> &PlayheadTracker {
        &self.playhead
    }

    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    /// Stop that has not been followed by a suspend yet
    pub fn pending_settle(&self) -> Option<Settle> {
        self.pending_settle
    }

    fn move_to(&mut self, seconds: f64) {
        self.position = seconds;
        self.playhead.set_position(seconds);
        self.shared.publish_position(seconds);
    }

    fn retime(&mut self, bpm: f64) {
        self.model.set_bpm(bpm);
        tracing::info!(bpm = self.model.bpm(), "Tempo changed");
    }

    fn arm_session_timers(&mut self) {
        let now = self.clock.now();

        let rearm = self.config.rearm_interval();
        let id = self
            .timers
            .schedule_interval(TimerTask::NotePass, now + rearm, rearm);
        self.session_timers.track(id);

        let rearm = self.config.metronome_rearm_interval();
        let id = self
            .timers
            .schedule_interval(TimerTask::MetronomePass, now + rearm, rearm);
        self.session_timers.track(id);

        if self.playhead.visibility() == Visibility::Background {
            self.arm_poll_timer();
        }

        // Voices of the previous session still fading block re-admission of
        // their notes until they end
        if !self.voices.is_empty() {
            let render_now = self.backend.current_time();
            let last_stop = self
                .voices
                .voices()
                .map(|v| v.scheduled_stop_time)
                .fold(render_now, f64::max);
            let due = now + Duration::from_secs_f64(last_stop - render_now) + CATCH_UP_MARGIN;
            let id = self.timers.schedule_once(TimerTask::NotePass, due);
            self.session_timers.track(id);
        }
    }

    fn arm_poll_timer(&mut self) {
        let interval = self.config.background_poll_interval();
        let id = self.timers.schedule_interval(
            TimerTask::PlayheadPoll,
            self.clock.now() + interval,
            interval,
        );
        self.session_timers.track(id);
        self.poll_timer = Some(id);
    }

    fn poll_playhead(&mut self) -> PollOutcome {
        let outcome = self.playhead.poll(self.backend.current_time());
        self.shared.publish_position(self.playhead.position());

        if outcome == PollOutcome::ReachedEnd {
            tracing::info!(position = self.playhead.position(), "End of timeline reached");
            self.stop(false);
        }
        outcome
    }

    fn run_note_pass(&mut self) -> PassReport {
        let report = self.scheduler.pass(
            self.playhead.position(),
            &self.model,
            &self.notes,
            self.instruments.as_ref(),
            &mut self.voices,
            &mut self.backend,
        );
        if report != PassReport::default() {
            tracing::debug!(
                playhead = self.playhead.position(),
                admitted = report.admitted,
                mid_note = report.mid_note,
                missing = report.missing,
                deferred = report.deferred,
                failed = report.failed,
                "Note pass"
            );
        }
        report
    }

    fn run_metronome_pass(&mut self) -> ClickReport {
        self.metronome.pass(
            self.playhead.position(),
            &self.model,
            &mut self.clicks,
            &mut self.backend,
        )
    }

    fn drain_completions(&mut self) {
        while let Some(node) = self.backend.poll_ended() {
            let released = self.voices.release_source(&mut self.backend, node)
                || self.clicks.release_source(&mut self.backend, node);
            if !released {
                tracing::debug!(node, "Completion for a source no pool owns");
            }
        }

        // Lost completions: release whatever is past its hard stop
        let dropped = self.backend.dropped_completions();
        if dropped > self.dropped_seen {
            let slack = self.voices.policy().min_fade;
            let reaped = self.voices.reap_stale(&mut self.backend, slack)
                + self.clicks.reap_stale(&mut self.backend, slack);
            tracing::warn!(
                lost = dropped - self.dropped_seen,
                reaped,
                "Render completions dropped on a full queue"
            );
            self.dropped_seen = dropped;
        }
    }

    fn suspend_if_settled(&mut self) {
        self.suspend_timer = None;
        let Some(settle) = self.pending_settle else {
            return;
        };
        if self.state.is_playing() || self.backend.state() != ContextState::Running {
            self.pending_settle = None;
            return;
        }

        // Render clock behind host time: wait for it
        let now = self.backend.current_time();
        if !settle.is_resolved(now) {
            let wait = settle.remaining(now).max(Duration::from_millis(1));
            self.suspend_timer = Some(
                self.timers
                    .schedule_once(TimerTask::SuspendContext, self.clock.now() + wait),
            );
            return;
        }

        // Every hard stop has passed; anything left never reported its end
        let leftover = self.voices.clear(&mut self.backend) + self.clicks.clear(&mut self.backend);
        if leftover > 0 {
            tracing::debug!(leftover, "Released voices without completion");
        }

        match self.backend.suspend() {
            Ok(()) => tracing::info!(render_time = now, "Render context suspended"),
            Err(e) => tracing::warn!(error = %e, "Failed to suspend render context"),
        }
        self.pending_settle = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::graph::{GraphHandle, RenderGraph, render_graph};
    use crate::control::ManualClock;
    use crate::sampler::bank::InstrumentBank;
    use crate::sequencer::note::{InstrumentRef, ScheduledNote};

    const RATE: f64 = 8000.0;

    fn session() -> (TransportSession<GraphHandle>, RenderGraph, ManualClock) {
        let (handle, graph) = render_graph(RATE, 4096, 256);
        let clock = ManualClock::new();
        let bank = InstrumentBank::synthesized("sine", 48..84, 2.0, RATE as u32);
        let session = TransportSession::new(
            EngineConfig::default(),
            handle,
            Box::new(clock.clone()),
            Box::new(bank),
        );
        (session, graph, clock)
    }

    fn step(session: &mut TransportSession<GraphHandle>, graph: &mut RenderGraph, clock: &ManualClock, ms: u64) {
        let mut block = vec![0.0f32; (RATE as u64 * 5 / 1000) as usize];
        for _ in 0..ms / 5 {
            clock.advance(Duration::from_millis(5));
            graph.render(&mut block);
            session.pump();
            session.on_animation_frame();
        }
    }

    #[test]
    fn test_transport_state() {
        assert!(TransportState::Playing.is_playing());
        assert!(!TransportState::Stopped.is_playing());
        assert_eq!(TransportState::default(), TransportState::Stopped);
    }

    #[test]
    fn test_play_is_idempotent() {
        let (mut session, _graph, _clock) = session();
        session.play().unwrap();
        let timers = session.timers().len();

        session.play().unwrap();
        assert_eq!(session.timers().len(), timers);
        assert!(session.status().is_playing());
    }

    #[test]
    fn test_play_fails_on_closed_context() {
        let (mut session, _graph, _clock) = session();
        session.backend_mut().close();

        assert!(matches!(
            session.play(),
            Err(TransportError::RenderContextUnavailable(BackendError::ContextClosed))
        ));
        assert_eq!(session.state(), TransportState::Stopped);
        assert!(session.timers().is_empty());
    }

    #[test]
    fn test_status_follows_playhead() {
        let (mut session, mut graph, clock) = session();
        let status = session.status();

        session.play().unwrap();
        step(&mut session, &mut graph, &clock, 500);
        assert!((status.playhead_seconds() - 0.5).abs() < 0.011);

        session.pause();
        assert!(!status.is_playing());
        assert!((session.position() - 0.5).abs() < 0.011);
    }

    #[test]
    fn test_stop_returns_to_last_start() {
        let (mut session, mut graph, clock) = session();
        session.seek(1.0).unwrap();
        session.play().unwrap();
        step(&mut session, &mut graph, &clock, 300);

        session.stop(true);
        assert_eq!(session.position(), 1.0);
    }

    #[test]
    fn test_context_suspended_only_after_settle() {
        let (mut session, mut graph, clock) = session();
        session.notes_mut().add_note(ScheduledNote::new(
            1,
            0,
            60,
            0,
            1920,
            100,
            InstrumentRef::new("sine"),
        ));
        session.play().unwrap();
        step(&mut session, &mut graph, &clock, 200);

        let settle = session.stop(false).unwrap();
        assert!(settle.resolves_at >= settle.issued_at + 0.1 + 0.3 - 1e-9);

        step(&mut session, &mut graph, &clock, 350);
        assert_eq!(session.backend().state(), ContextState::Running);

        step(&mut session, &mut graph, &clock, 100);
        assert_eq!(session.backend().state(), ContextState::Suspended);
        assert!(session.voice_pool().is_empty());
    }

    #[test]
    fn test_play_cancels_pending_suspend() {
        let (mut session, mut graph, clock) = session();
        session.play().unwrap();
        step(&mut session, &mut graph, &clock, 50);
        session.pause();
        assert!(session.pending_settle().is_some());

        session.play().unwrap();
        step(&mut session, &mut graph, &clock, 1000);
        assert_eq!(session.backend().state(), ContextState::Running);
        assert_eq!(session.timers().fired(TimerTask::SuspendContext), 0);
    }

    #[test]
    fn test_set_tempo_keeps_musical_position() {
        let (mut session, _graph, _clock) = session();
        session.seek(2.0).unwrap();
        // 2 s at 120 BPM is beat 4; at 60 BPM beat 4 is at 4 s
        session.set_tempo(60.0).unwrap();
        assert!((session.position() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_toggle_metronome_while_playing_resyncs() {
        let (mut session, mut graph, clock) = session();
        session.play().unwrap();
        step(&mut session, &mut graph, &clock, 700);

        assert!(session.toggle_metronome());
        assert!(session.status().metronome_enabled());
        // Beat 2 (1.0 s) is the first beat at or after 0.7 s
        assert_eq!(session.metronome().next_beat(), 3);
        let beat_two = session.metronome().click_id(2);
        assert!(session.click_pool().contains(beat_two));
        assert!(!session.click_pool().contains(session.metronome().click_id(0)));
    }

    #[test]
    fn test_background_polling_uses_timer() {
        let (mut session, mut graph, clock) = session();
        session.set_visibility(Visibility::Background);
        session.play().unwrap();

        let mut block = vec![0.0f32; 40];
        for _ in 0..20 {
            clock.advance(Duration::from_millis(5));
            graph.render(&mut block);
            session.pump();
        }
        assert!(session.timers().fired(TimerTask::PlayheadPoll) >= 5);
        assert!(session.position() > 0.05);

        session.set_visibility(Visibility::Foreground);
        assert_eq!(session.timers().scheduled_count(TimerTask::PlayheadPoll), 0);
    }

    #[test]
    fn test_end_of_timeline_stops_playback() {
        let (mut session, mut graph, clock) = session();
        session.set_end_of_timeline(Some(0.25));
        session.play().unwrap();
        step(&mut session, &mut graph, &clock, 400);

        assert_eq!(session.state(), TransportState::Stopped);
        assert!(session.position() >= 0.25);
        assert!(session.position() < 0.3);
    }
}
