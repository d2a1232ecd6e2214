//! The live audio output: a cpal stream pulling frames from a shared [`Mixer`].

use crate::{
    error::HarmoniumError,
    mixer::{AudioSink, Mixer, VoiceId},
    samples::{SampleBank, SampleId},
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::{error, info};
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

/// Owns the output stream. Audio stops and the device is released when the
/// engine is dropped.
pub struct AudioEngine {
    mixer: Arc<Mutex<Mixer>>,

    /// Output stream (kept alive)
    _stream: cpal::Stream,
}

impl AudioEngine {
    /// Opens the default output device and starts streaming silence.
    pub fn start(bank: &SampleBank) -> Result<Self, HarmoniumError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(HarmoniumError::NoOutputDevice)?;
        let config = device.default_output_config()?;
        let channels = config.channels() as usize;
        let sample_rate = config.sample_rate().0;

        info!(
            "Audio: {} @ {}Hz, {} channel(s)",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate,
            channels
        );

        let mixer = Arc::new(Mutex::new(Mixer::new(bank, sample_rate)));
        let mixer_clone = Arc::clone(&mixer);

        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                mixer_clone.lock().unwrap().render_interleaved(data, channels);
            },
            |err| error!("Audio stream error: {}", err),
            None,
        )?;
        stream.play()?;

        Ok(Self {
            mixer,
            _stream: stream,
        })
    }

    /// Number of voices currently sounding.
    pub fn voice_count(&self) -> usize {
        self.mixer.lock().unwrap().voice_count()
    }
}

impl AudioSink for AudioEngine {
    fn play_looped(&mut self, sample: SampleId) -> VoiceId {
        self.mixer.lock().unwrap().play_looped(sample)
    }

    fn set_volume(&mut self, voice: VoiceId, volume: f32) {
        self.mixer.lock().unwrap().set_volume(voice, volume)
    }

    fn fade_out(&mut self, voice: VoiceId, duration: Duration) {
        self.mixer.lock().unwrap().fade_out(voice, duration)
    }
}
