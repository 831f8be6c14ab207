//! Output device stream driving the software mixer.

use crate::mixer::{render_or_silence, SharedMixer};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use loopcam_core::{LoopCamError, Result};
use tracing::{error, info};

/// Keeps the device stream alive. Dropping it stops output.
pub struct OutputStream {
    _stream: cpal::Stream,
    sample_rate: u32,
    channels: u16,
}

impl OutputStream {
    /// Open the default output device and render `mixer` into it.
    ///
    /// The mixer is switched to the device's sample rate before the stream
    /// starts.
    pub fn open_default(mixer: SharedMixer) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| LoopCamError::Device("no default output device".into()))?;
        let supported = device
            .default_output_config()
            .map_err(|e| LoopCamError::Device(e.to_string()))?;
        let sample_format = supported.sample_format();
        let config = supported.config();

        mixer.lock().set_sample_rate(config.sample_rate.0);

        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, mixer)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, mixer)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, mixer)?,
            other => {
                return Err(LoopCamError::Device(format!(
                    "unsupported sample format {other:?}"
                )))
            }
        };
        stream
            .play()
            .map_err(|e| LoopCamError::Device(e.to_string()))?;

        info!(
            device = device.name().unwrap_or_default().as_str(),
            sample_rate = config.sample_rate.0,
            channels = config.channels,
            "Audio output started"
        );

        Ok(Self {
            _stream: stream,
            sample_rate: config.sample_rate.0,
            channels: config.channels,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mixer: SharedMixer,
) -> Result<cpal::Stream>
where
    T: cpal::Sample + cpal::FromSample<f32> + cpal::SizedSample + Send + 'static,
{
    let channels = config.channels as usize;
    let mut scratch: Vec<f32> = Vec::new();

    device
        .build_output_stream(
            config,
            move |output: &mut [T], _| {
                let frames = output.len() / channels.max(1);
                scratch.resize(frames * 2, 0.0);
                render_or_silence(&mixer, &mut scratch);

                for (frame, stereo) in output.chunks_mut(channels).zip(scratch.chunks(2)) {
                    for (ch, sample) in frame.iter_mut().enumerate() {
                        // Mono devices get the left channel; extra channels repeat right.
                        let s = if ch == 0 { stereo[0] } else { stereo[1] };
                        *sample = T::from_sample(s);
                    }
                }
            },
            |e| error!(error = %e, "Audio stream error"),
            None,
        )
        .map_err(|e| LoopCamError::Device(e.to_string()))
}
