// Audio engine - cpal output stream driving the render graph
//
// The render graph is moved into the stream callback; the control loop keeps
// the matching `GraphHandle`. Rendering happens in f32 mono and is converted
// to the device sample format (F32, I16, U16) when written to the output.
//
// Note: on macOS (CoreAudio) the Stream is neither Send nor Sync, so the
// engine must stay on the thread that created it.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use thiserror::Error;

use crate::audio::dsp_utils::{OnePoleSmoother, flush_denormals_to_zero, soft_clip};
use crate::audio::format_conversion::write_mono_to_interleaved_frame;
use crate::audio::graph::{GraphHandle, RenderGraph, render_graph};
use crate::audio::parameters::AtomicF32;
use crate::config::EngineConfig;
use crate::connection::status::{AtomicContextState, ContextState};

/// Largest block rendered in one go; longer callbacks are split
const MAX_BLOCK_FRAMES: usize = 4096;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("No audio output device found")]
    NoDevice,

    #[error("Audio configuration error: {0}")]
    Config(String),

    #[error("Audio stream error: {0}")]
    Stream(String),
}

pub struct AudioEngine {
    _device: Device,
    _stream: Stream,
    sample_rate: f64,
    channels: usize,
    /// Master output volume (shared with the callback)
    pub volume: AtomicF32,
    context: AtomicContextState,
}

impl AudioEngine {
    /// Open the default output device and start rendering
    ///
    /// The context starts suspended: nothing advances until the transport
    /// resumes it through the returned handle.
    pub fn new(config: &EngineConfig) -> Result<(Self, GraphHandle), EngineError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(EngineError::NoDevice)?;

        tracing::info!(
            device = %device.name().unwrap_or_else(|_| "Unknown".to_string()),
            "Opening audio output"
        );

        let supported_config = device
            .default_output_config()
            .map_err(|e| EngineError::Config(e.to_string()))?;

        let sample_format = supported_config.sample_format();
        let sample_rate = supported_config.sample_rate().0 as f64;
        let channels = supported_config.channels() as usize;
        tracing::debug!(?sample_format, sample_rate, channels, "Output configuration");

        let config_stream: StreamConfig = supported_config.into();

        let (handle, graph) = render_graph(
            sample_rate,
            config.command_queue_capacity,
            config.notification_queue_capacity,
        );
        let context = handle.context();

        let volume = AtomicF32::new(1.0);

        let stream = match sample_format {
            SampleFormat::F32 => Self::build_stream::<f32>(
                &device,
                &config_stream,
                channels,
                graph,
                volume.clone(),
                context.clone(),
            ),
            SampleFormat::I16 => Self::build_stream::<i16>(
                &device,
                &config_stream,
                channels,
                graph,
                volume.clone(),
                context.clone(),
            ),
            SampleFormat::U16 => Self::build_stream::<u16>(
                &device,
                &config_stream,
                channels,
                graph,
                volume.clone(),
                context.clone(),
            ),
            other => {
                return Err(EngineError::Config(format!(
                    "Unsupported sample format: {:?}. Supported formats: F32, I16, U16",
                    other
                )));
            }
        }?;

        stream
            .play()
            .map_err(|e| EngineError::Stream(e.to_string()))?;

        tracing::info!(sample_rate, channels, "Audio engine started");

        Ok((
            Self {
                _device: device,
                _stream: stream,
                sample_rate,
                channels,
                volume,
                context,
            },
            handle,
        ))
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Context state as seen by the stream (Closed after a device error)
    pub fn context_state(&self) -> ContextState {
        self.context.get()
    }

    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        channels: usize,
        mut graph: RenderGraph,
        volume: AtomicF32,
        context: AtomicContextState,
    ) -> Result<Stream, EngineError>
    where
        T: SizedSample + FromSample<f32> + Send + 'static,
    {
        let channels = channels.max(1);
        let mut scratch = vec![0.0f32; MAX_BLOCK_FRAMES];
        let mut smoother = OnePoleSmoother::new(volume.get(), 10.0, graph.sample_rate() as f32);

        let stream = device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    // No allocations, no I/O, no blocking locks past this point
                    for chunk in data.chunks_mut(MAX_BLOCK_FRAMES * channels) {
                        let frames = chunk.len() / channels;
                        let block = &mut scratch[..frames];
                        graph.render(block);

                        for (frame, &mono) in chunk.chunks_mut(channels).zip(block.iter()) {
                            let gain = smoother.process(volume.get());
                            let sample = soft_clip(flush_denormals_to_zero(mono) * gain);
                            write_mono_to_interleaved_frame(sample, frame);
                        }
                    }
                },
                move |err| {
                    // Runs outside the render callback
                    tracing::error!(error = %err, "Audio stream error");
                    context.set(ContextState::Closed);
                },
                None,
            )
            .map_err(|e| EngineError::Stream(e.to_string()))?;

        Ok(stream)
    }
}
