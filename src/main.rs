use mymusic_playback::sequencer::note_store::generate_note_id;
use mymusic_playback::{
    AudioEngine, EngineConfig, InstrumentBank, InstrumentRef, ScheduledNote, SystemClock,
    TransportSession, Visibility,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

/// Longest sleep between two control loop iterations
const MAX_IDLE: Duration = Duration::from_millis(5);

/// Give up waiting for the render context to settle after this long
const SETTLE_TIMEOUT: Duration = Duration::from_secs(2);

fn load_config() -> EngineConfig {
    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(EngineConfig::default_path);

    let Some(path) = path else {
        return EngineConfig::default();
    };

    match EngineConfig::load_or_default(&path) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "Configuration loaded");
            config
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Invalid configuration, using defaults");
            EngineConfig::default()
        }
    }
}

/// Two bars of C major arpeggio in eighth notes, with a sustained bass
fn demo_notes(ppqn: u64) -> Vec<ScheduledNote> {
    let piano = InstrumentRef::new("sine");
    let eighth = ppqn / 2;
    let pattern = [60u8, 64, 67, 72, 67, 64, 60, 55];

    let mut notes: Vec<ScheduledNote> = pattern
        .iter()
        .cycle()
        .take(16)
        .enumerate()
        .map(|(i, &pitch)| {
            ScheduledNote::new(
                generate_note_id(),
                0,
                pitch,
                i as u64 * eighth,
                eighth,
                90 + (i % 4 == 0) as u8 * 30,
                piano.clone(),
            )
        })
        .collect();

    notes.push(ScheduledNote::new(
        generate_note_id(),
        1,
        48,
        0,
        ppqn * 8,
        70,
        piano,
    ));
    notes
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    println!("=== MyMusic Playback ===");
    let config = load_config();

    let (engine, handle) = match AudioEngine::new(&config) {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let sample_rate = engine.sample_rate();
    let bank = InstrumentBank::synthesized("sine", 36..96, 4.5, sample_rate.round() as u32);
    let ppqn = config.ppqn as u64;

    let mut session = TransportSession::new(
        config,
        handle,
        Box::new(SystemClock::new()),
        Box::new(bank),
    );
    for note in demo_notes(ppqn) {
        session.notes_mut().add_note(note);
    }

    let end = session
        .model()
        .tick_to_seconds(session.notes().end_tick() as f64);
    session.set_end_of_timeline(Some(end));
    // No UI: keep the playhead on the interval timer
    session.set_visibility(Visibility::Background);
    session.toggle_metronome();

    if let Err(e) = session.play() {
        eprintln!("ERROR: {}", e);
        return ExitCode::FAILURE;
    }

    let status = session.status();
    while status.is_playing() {
        session.pump();
        std::thread::sleep(MAX_IDLE);
    }
    println!("Reached {:.2}s, waiting for the output to settle", status.playhead_seconds());

    let deadline = Instant::now() + SETTLE_TIMEOUT;
    while session.pending_settle().is_some() && Instant::now() < deadline {
        session.pump();
        std::thread::sleep(MAX_IDLE);
    }

    session.dispose();
    drop(engine);
    println!("Done");
    ExitCode::SUCCESS
}
