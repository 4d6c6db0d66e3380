// Sample loader - WAV (hound) and FLAC (claxon) files decoded to mono f32

use crate::audio::buffer::AudioBuffer;
use claxon::FlacReader;
use hound::{SampleFormat, WavReader};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SampleError {
    #[error("Unsupported file format: {0}")]
    Unsupported(String),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("FLAC error: {0}")]
    Flac(#[from] claxon::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bank manifest error: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// Decode an audio file, picking the decoder from the extension
pub fn load_sample(path: &Path) -> Result<AudioBuffer, SampleError> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "wav" => load_wav(path),
        "flac" => load_flac(path),
        other => Err(SampleError::Unsupported(other.to_string())),
    }
}

fn load_wav(path: &Path) -> Result<AudioBuffer, SampleError> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.into_samples::<f32>().collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    Ok(AudioBuffer::from_interleaved(
        &interleaved,
        spec.channels,
        spec.sample_rate,
    ))
}

fn load_flac(path: &Path) -> Result<AudioBuffer, SampleError> {
    let mut reader = FlacReader::open(path)?;
    let info = reader.streaminfo();
    let scale = (1i64 << (info.bits_per_sample.max(1) - 1)) as f32;

    let interleaved: Vec<f32> = reader
        .samples()
        .map(|s| s.map(|v| v as f32 / scale))
        .collect::<Result<_, _>>()?;

    Ok(AudioBuffer::from_interleaved(
        &interleaved,
        info.channels as u16,
        info.sample_rate,
    ))
}
