#[cfg(test)]
mod tests {
    use crate::sampler::bank::{BankManifest, BankSample, InstrumentBank};
    use crate::sampler::loader::{SampleError, load_sample};
    use crate::sampler::source::InstrumentSource;
    use crate::sequencer::note::InstrumentRef;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn write_wav(path: &Path, channels: u16, frames: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in frames {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_unsupported_format() {
        match load_sample(&PathBuf::from("test.xyz")) {
            Err(SampleError::Unsupported(ext)) => assert_eq!(ext, "xyz"),
            other => panic!("Unexpected result: {:?}", other.map(|b| b.len())),
        }
    }

    #[test]
    fn test_missing_wav_is_an_error() {
        assert!(load_sample(&PathBuf::from("does_not_exist.wav")).is_err());
    }

    #[test]
    fn test_wav_is_downmixed_to_mono() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, 2, &[16384, 0, 16384, 16384]);

        let buffer = load_sample(&path).unwrap();
        assert_eq!(buffer.sample_rate(), 22050);
        assert_eq!(buffer.len(), 2);
        assert!((buffer.samples()[0] - 0.25).abs() < 1e-3);
        assert!((buffer.samples()[1] - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_manifest_round_trip_and_load() {
        let dir = TempDir::new().unwrap();
        write_wav(&dir.path().join("c4.wav"), 1, &[1000; 64]);

        let mut manifest = BankManifest::new("piano");
        manifest.add_sample(BankSample {
            instrument: "piano".to_string(),
            pitch: 60,
            sample_path: PathBuf::from("c4.wav"),
        });
        manifest.add_sample(BankSample {
            instrument: "piano".to_string(),
            pitch: 62,
            sample_path: PathBuf::from("missing.wav"),
        });
        let manifest_path = dir.path().join("bank.json");
        manifest.save_to_file(&manifest_path).unwrap();
        assert_eq!(BankManifest::load_from_file(&manifest_path).unwrap(), manifest);

        // The undecodable entry is skipped, the rest loads
        let bank = InstrumentBank::load_manifest(&manifest_path).unwrap();
        assert_eq!(bank.name(), "piano");
        assert_eq!(bank.len(), 1);

        let piano = InstrumentRef::new("piano");
        assert_eq!(bank.fetch_buffer(&piano, 60).map(|b| b.len()), Some(64));
        assert!(bank.fetch_buffer(&piano, 62).is_none());
    }

    #[test]
    fn test_add_sample_replaces_same_pitch() {
        let mut manifest = BankManifest::new("drums");
        for path in ["a.wav", "b.wav"] {
            manifest.add_sample(BankSample {
                instrument: "kick".to_string(),
                pitch: 36,
                sample_path: PathBuf::from(path),
            });
        }
        assert_eq!(manifest.samples.len(), 1);
        assert_eq!(manifest.samples[0].sample_path, PathBuf::from("b.wav"));
    }

    #[test]
    fn test_synthesized_bank() {
        let bank = InstrumentBank::synthesized("sine", 60..72, 0.5, 48000);
        let sine = InstrumentRef::new("sine");

        assert_eq!(bank.len(), 12);
        assert!(bank.fetch_buffer(&sine, 60).is_some());
        assert!(bank.fetch_buffer(&sine, 72).is_none());
        assert!(bank.fetch_buffer(&InstrumentRef::new("organ"), 60).is_none());
    }
}
