// Instrument bank - In-memory buffers per (instrument, pitch), loadable from
// a JSON manifest

use crate::audio::buffer::AudioBuffer;
use crate::sampler::loader::{SampleError, load_sample};
use crate::sampler::source::InstrumentSource;
use crate::sequencer::note::InstrumentRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Serializable bank description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankManifest {
    pub name: String,
    pub samples: Vec<BankSample>,
}

/// One file of the bank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankSample {
    pub instrument: String,
    /// MIDI note number (0-127)
    pub pitch: u8,
    /// Relative to the manifest file
    pub sample_path: PathBuf,
}

impl BankManifest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            samples: Vec::new(),
        }
    }

    /// Add a mapping, replacing any existing one for the same instrument and pitch
    pub fn add_sample(&mut self, sample: BankSample) {
        self.samples
            .retain(|s| !(s.instrument == sample.instrument && s.pitch == sample.pitch));
        self.samples.push(sample);
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SampleError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, SampleError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[derive(Debug, Default)]
pub struct InstrumentBank {
    name: String,
    buffers: HashMap<(String, u8), Arc<AudioBuffer>>,
}

impl InstrumentBank {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            buffers: HashMap::new(),
        }
    }

    /// Sine tones at the equal-tempered frequency of every pitch in `pitches`
    pub fn synthesized(
        instrument: &str,
        pitches: impl IntoIterator<Item = u8>,
        duration_seconds: f32,
        sample_rate: u32,
    ) -> Self {
        let mut bank = Self::new(instrument);
        for pitch in pitches {
            let frequency = 440.0 * 2_f32.powf((pitch as f32 - 69.0) / 12.0);
            bank.insert(
                instrument,
                pitch,
                AudioBuffer::sine(frequency, duration_seconds, sample_rate),
            );
        }
        bank
    }

    /// Decode every file named by the manifest at `path`
    ///
    /// A file that fails to decode is logged and left out; the bank still loads.
    pub fn load_manifest<P: AsRef<Path>>(path: P) -> Result<Self, SampleError> {
        let path = path.as_ref();
        let manifest = BankManifest::load_from_file(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));

        let mut bank = Self::new(manifest.name.clone());
        for sample in &manifest.samples {
            let sample_path = base.join(&sample.sample_path);
            match load_sample(&sample_path) {
                Ok(buffer) => bank.insert(&sample.instrument, sample.pitch, buffer),
                Err(e) => tracing::warn!(
                    path = %sample_path.display(),
                    error = %e,
                    "Skipping undecodable sample"
                ),
            }
        }

        tracing::info!(bank = %bank.name, buffers = bank.len(), "Instrument bank loaded");
        Ok(bank)
    }

    pub fn insert(&mut self, instrument: &str, pitch: u8, buffer: AudioBuffer) {
        self.buffers
            .insert((instrument.to_string(), pitch), Arc::new(buffer));
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

impl InstrumentSource for InstrumentBank {
    fn fetch_buffer(&self, instrument: &InstrumentRef, pitch: u8) -> Option<Arc<AudioBuffer>> {
        self.buffers
            .get(&(instrument.as_str().to_string(), pitch))
            .cloned()
    }
}
