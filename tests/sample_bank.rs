// Integration test: playback from a sample bank loaded off disk

mod common;

use common::{Rig, note};
use mymusic_playback::sampler::{BankManifest, BankSample, InstrumentBank};
use mymusic_playback::synth::envelope::peak_gain;
use mymusic_playback::synth::voice::VoiceId;
use mymusic_playback::{EngineConfig, InstrumentRef, InstrumentSource};
use std::path::{Path, PathBuf};
use tempfile::tempdir;

/// Mono 16-bit WAV holding a constant value
fn write_dc_wav(path: &Path, sample_rate: u32, seconds: f32, value: i16) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for _ in 0..(sample_rate as f32 * seconds) as usize {
        writer.write_sample(value).unwrap();
    }
    writer.finalize().unwrap();
}

fn drum_bank(dir: &Path) -> InstrumentBank {
    write_dc_wav(&dir.join("kick.wav"), 22050, 1.0, 16384);

    let mut manifest = BankManifest::new("drums");
    manifest.add_sample(BankSample {
        instrument: "drums".to_string(),
        pitch: 36,
        sample_path: PathBuf::from("kick.wav"),
    });
    manifest.add_sample(BankSample {
        instrument: "drums".to_string(),
        pitch: 38,
        sample_path: PathBuf::from("snare_not_recorded_yet.wav"),
    });

    let manifest_path = dir.join("drums.json");
    manifest.save_to_file(&manifest_path).unwrap();
    InstrumentBank::load_manifest(&manifest_path).unwrap()
}

#[test]
fn test_loaded_bank_plays_at_velocity_gain() {
    let dir = tempdir().unwrap();
    let bank = drum_bank(dir.path());
    assert_eq!(bank.len(), 1);

    let mut kick = note(1, 36, 0, 480);
    kick.instrument = InstrumentRef::new("drums");
    let mut rig = Rig::with_instruments(EngineConfig::default(), vec![kick], Box::new(bank));

    rig.session.play().unwrap();
    rig.run(300);

    // 22.05 kHz file rendered at the graph rate, level = file level * velocity gain
    let expected = 0.5 * peak_gain(100);
    let sample = rig.output[(0.2 * common::RATE) as usize];
    assert!((sample - expected).abs() < 0.01, "got {}, expected {}", sample, expected);
}

#[test]
fn test_unmapped_pitch_is_skipped_during_playback() {
    let dir = tempdir().unwrap();
    let bank = drum_bank(dir.path());
    let drums = InstrumentRef::new("drums");
    assert!(bank.fetch_buffer(&drums, 38).is_none());

    let mut kick = note(1, 36, 0, 480);
    kick.instrument = drums.clone();
    let mut snare = note(2, 38, 0, 480);
    snare.instrument = drums;
    let mut rig = Rig::with_instruments(EngineConfig::default(), vec![kick, snare], Box::new(bank));

    rig.session.play().unwrap();
    assert!(rig.session.voice_pool().contains(VoiceId::Note(1)));
    assert!(!rig.session.voice_pool().contains(VoiceId::Note(2)));

    rig.run(1000);
    assert!(rig.session.voice_pool().is_empty());
}
