//! Audio output host driving the synthesis engine from the device callback.

use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{error, info};

use crate::error::AudioError;
use crate::params::{audio_constants::BLOCK_SIZE, ConfigHandle};
use crate::shared::SharedState;
use crate::synth::SynthEngine;

/// Renders engine output into device buffers of any supported sample type
pub struct DeviceRenderer {
    engine: SynthEngine,
    channels: usize,
    scratch: Vec<f32>,
}

impl DeviceRenderer {
    pub fn new(engine: SynthEngine, channels: usize) -> Self {
        let channels = channels.max(1);
        Self {
            engine,
            channels,
            scratch: vec![0.0; BLOCK_SIZE * channels],
        }
    }

    pub fn engine(&self) -> &SynthEngine {
        &self.engine
    }

    /// Fill an interleaved device buffer, one block at a time
    pub fn fill<T>(&mut self, data: &mut [T])
    where
        T: cpal::SizedSample + cpal::FromSample<f32>,
    {
        for chunk in data.chunks_mut(self.scratch.len()) {
            let scratch = &mut self.scratch[..chunk.len()];
            self.engine.render_into(scratch, self.channels);
            for (out, &sample) in chunk.iter_mut().zip(scratch.iter()) {
                // Safety limiter: hard clip to ±1.0
                *out = T::from_sample(sample.clamp(-1.0, 1.0));
            }
        }
    }
}

/// Audio system owning the output stream
pub struct AudioSystem {
    /// Audio output stream (kept alive)
    stream: cpal::Stream,
    sample_rate_hz: u32,
    channels: usize,
}

impl AudioSystem {
    /// Open the default output device and start rendering.
    ///
    /// Any failure here is fatal and returned before the first callback.
    pub fn start(config: ConfigHandle, shared: Arc<SharedState>) -> Result<Self, AudioError> {
        config.load().validate()?;

        let host = cpal::default_host();
        info!("Audio host: {:?}", host.id());

        let device = host
            .default_output_device()
            .ok_or(AudioError::NoOutputDevice)?;

        let supported = device.default_output_config()?;
        let sample_rate_hz = supported.sample_rate().0;
        let channels = supported.channels() as usize;

        info!(
            "Audio: {} @ {}Hz, {} channel(s), {:?}",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate_hz,
            channels,
            supported.sample_format()
        );

        let engine = SynthEngine::new(sample_rate_hz, config, shared);
        let renderer = DeviceRenderer::new(engine, channels);
        let stream_config: cpal::StreamConfig = supported.config();

        let stream = match supported.sample_format() {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, renderer),
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, renderer),
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, renderer),
            other => return Err(AudioError::UnsupportedSampleFormat(other)),
        }?;

        stream.play()?;
        info!("Audio stream started");

        Ok(Self {
            stream,
            sample_rate_hz,
            channels,
        })
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Pause the stream; first step of shutdown
    pub fn stop(self) -> Result<(), AudioError> {
        self.stream.pause()?;
        info!("Audio stream stopped");
        Ok(())
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut renderer: DeviceRenderer,
) -> Result<cpal::Stream, AudioError>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| renderer.fill(data),
        |err| error!("Audio stream error: {}", err),
        None,
    )?;
    Ok(stream)
}
