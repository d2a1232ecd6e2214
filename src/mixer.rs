//! A small software mixer for looping sample voices.
//!
//! The mixer is plain data: it is driven by the audio callback through
//! [`Mixer::render_interleaved`] and controlled from the render loop through
//! the [`AudioSink`] trait. Keeping it free of any device makes it easy to
//! test and lets [`crate::audio_engine::AudioEngine`] wrap it in a mutex.

use crate::samples::{Sample, SampleBank, SampleId};

use log::{debug, warn};
use std::time::Duration;

/// Identifies one playing voice. Never reused within a mixer.
pub type VoiceId = u64;

/// The control surface the playback controller talks to.
pub trait AudioSink {
    /// Starts `sample` looping forever, silent until its volume is set.
    fn play_looped(&mut self, sample: SampleId) -> VoiceId;
    /// Sets a voice's volume, `[0, 1]`.
    fn set_volume(&mut self, voice: VoiceId, volume: f32);
    /// Ramps a voice down to silence over `duration`, then removes it.
    fn fade_out(&mut self, voice: VoiceId, duration: Duration);
}

#[derive(Debug, Clone, Copy)]
struct Fade {
    remaining: u64,
    total: u64,
}

#[derive(Debug, Clone)]
struct Voice {
    id: VoiceId,
    sample: SampleId,
    position: f64,
    step: f64,
    volume: f32,
    fade: Option<Fade>,
}

impl Voice {
    fn gain(&self) -> f32 {
        match self.fade {
            Some(Fade { remaining, total }) => self.volume * remaining as f32 / total as f32,
            None => self.volume,
        }
    }

    fn finished(&self) -> bool {
        matches!(self.fade, Some(Fade { remaining: 0, .. }))
    }

    /// Linear interpolation between neighbouring frames, wrapping at the end.
    fn next_frame(&mut self, sample: &Sample) -> f32 {
        let frames = &sample.frames;
        let len = frames.len();
        let i = self.position as usize % len;
        let frac = (self.position - self.position.floor()) as f32;
        let a = frames[i];
        let b = frames[(i + 1) % len];

        self.position += self.step;
        if self.position >= len as f64 {
            self.position -= len as f64 * (self.position / len as f64).floor();
        }
        a + (b - a) * frac
    }
}

/// Mixes every active voice into one output signal.
#[derive(Debug, Clone)]
pub struct Mixer {
    samples: Vec<Sample>,
    output_rate: u32,
    voices: Vec<Voice>,
    next_id: VoiceId,
}

impl Mixer {
    /// A silent mixer producing audio at `output_rate` frames per second.
    pub fn new(bank: &SampleBank, output_rate: u32) -> Self {
        Self {
            samples: bank.samples().to_vec(),
            output_rate: output_rate.max(1),
            voices: Vec::new(),
            next_id: 0,
        }
    }

    /// Output frames per second.
    pub fn output_rate(&self) -> u32 {
        self.output_rate
    }

    /// Voices still producing sound, including ones fading out.
    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    /// The volume last set on `voice`, ignoring any fade.
    pub fn volume(&self, voice: VoiceId) -> Option<f32> {
        self.voices.iter().find(|v| v.id == voice).map(|v| v.volume)
    }

    /// Whether `voice` is fading out.
    pub fn is_fading(&self, voice: VoiceId) -> bool {
        self.voices
            .iter()
            .any(|v| v.id == voice && v.fade.is_some())
    }

    /// Fills `out` with mono frames.
    pub fn render(&mut self, out: &mut [f32]) {
        self.render_interleaved(out, 1);
    }

    /// Fills `out` with `channels`-interleaved frames, the same signal on
    /// every channel. Output is clipped to `[-1, 1]`.
    pub fn render_interleaved(&mut self, out: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        for frame in out.chunks_mut(channels) {
            let mut mix = 0.0;
            for voice in self.voices.iter_mut() {
                if voice.finished() {
                    continue;
                }
                if let Some(sample) = self.samples.get(voice.sample) {
                    mix += voice.next_frame(sample) * voice.gain();
                }
                if let Some(fade) = voice.fade.as_mut() {
                    fade.remaining = fade.remaining.saturating_sub(1);
                }
            }
            frame.fill(mix.clamp(-1.0, 1.0));
        }

        self.voices.retain(|v| {
            if v.finished() {
                debug!("Voice {} faded out", v.id);
            }
            !v.finished()
        });
    }
}

impl AudioSink for Mixer {
    fn play_looped(&mut self, sample: SampleId) -> VoiceId {
        let id = self.next_id;
        self.next_id += 1;

        match self.samples.get(sample) {
            Some(s) => {
                self.voices.push(Voice {
                    id,
                    sample,
                    position: 0.0,
                    step: s.sample_rate as f64 / self.output_rate as f64,
                    volume: 0.0,
                    fade: None,
                });
                debug!("Voice {} looping sample {}", id, sample);
            }
            None => warn!("No sample {}, voice {} will be silent", sample, id),
        }
        id
    }

    fn set_volume(&mut self, voice: VoiceId, volume: f32) {
        if let Some(v) = self.voices.iter_mut().find(|v| v.id == voice) {
            v.volume = volume.clamp(0.0, 1.0);
        }
    }

    fn fade_out(&mut self, voice: VoiceId, duration: Duration) {
        let total = (duration.as_secs_f64() * self.output_rate as f64).round().max(1.0) as u64;
        if let Some(v) = self.voices.iter_mut().find(|v| v.id == voice) {
            // Fading an already fading voice keeps the shorter ramp.
            let remaining = v.fade.map_or(total, |f| f.remaining.min(total));
            v.fade = Some(Fade { remaining, total });
        }
    }
}
