//! Keeps the set of sounding voices in step with the keys being held.

use crate::{
    keyboard::{note_index, NOTE_MAP},
    mixer::{AudioSink, VoiceId},
    samples::SampleId,
};

use log::debug;
use std::{collections::HashMap, time::Duration};

/// Fade applied when a note key is let go.
pub const NOTE_FADE: Duration = Duration::from_millis(100);
/// Fade applied when the drone key is let go.
pub const DRONE_FADE: Duration = Duration::from_millis(300);
/// Drone volume relative to the notes.
pub const DRONE_GAIN: f32 = 0.6;
/// The drone plays the lowest note's sample.
pub const DRONE_SAMPLE: SampleId = 0;

/// Starts, stops and sets the volume of voices on an [`AudioSink`].
///
/// Holds at most one voice per note key plus an optional drone.
pub struct PlaybackController<S: AudioSink> {
    sink: S,
    active: HashMap<char, VoiceId>,
    drone: Option<VoiceId>,
}

impl<S: AudioSink> PlaybackController<S> {
    #[allow(missing_docs)]
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            active: HashMap::new(),
            drone: None,
        }
    }

    /// Starts a looping voice for `key` unless one is already playing.
    pub fn press_note(&mut self, key: char) {
        if self.active.contains_key(&key) {
            return;
        }
        if let Some(sample) = note_index(key) {
            let voice = self.sink.play_looped(sample);
            self.sink.set_volume(voice, 0.0);
            debug!("Note {} on (voice {})", key, voice);
            self.active.insert(key, voice);
        }
    }

    /// Fades out and forgets the voice for `key`, if any.
    pub fn release_note(&mut self, key: char) {
        if let Some(voice) = self.active.remove(&key) {
            self.sink.fade_out(voice, NOTE_FADE);
            debug!("Note {} off (voice {})", key, voice);
        }
    }

    /// Presses every note key for which `held` is true and releases the rest.
    pub fn sync_notes(&mut self, held: impl Fn(char) -> bool) {
        for binding in NOTE_MAP.iter() {
            if held(binding.key) {
                self.press_note(binding.key);
            } else {
                self.release_note(binding.key);
            }
        }
    }

    /// Starts the drone unless it is already sounding.
    pub fn start_drone(&mut self) {
        if self.drone.is_none() {
            let voice = self.sink.play_looped(DRONE_SAMPLE);
            self.sink.set_volume(voice, 0.0);
            debug!("Drone on (voice {})", voice);
            self.drone = Some(voice);
        }
    }

    /// Fades out the drone, if it is sounding.
    pub fn stop_drone(&mut self) {
        if let Some(voice) = self.drone.take() {
            self.sink.fade_out(voice, DRONE_FADE);
            debug!("Drone off (voice {})", voice);
        }
    }

    /// Starts or stops the drone to match `held`.
    pub fn sync_drone(&mut self, held: bool) {
        if held {
            self.start_drone();
        } else {
            self.stop_drone();
        }
    }

    /// Writes this frame's loudness to every active voice.
    pub fn set_loudness(&mut self, loudness: f32) {
        for &voice in self.active.values() {
            self.sink.set_volume(voice, loudness);
        }
        if let Some(voice) = self.drone {
            self.sink.set_volume(voice, loudness * DRONE_GAIN);
        }
    }

    /// Keys with a sounding note, in scale order.
    pub fn active_keys(&self) -> Vec<char> {
        NOTE_MAP
            .iter()
            .map(|b| b.key)
            .filter(|k| self.active.contains_key(k))
            .collect()
    }

    /// The voice playing `key`, if any.
    pub fn voice_for(&self, key: char) -> Option<VoiceId> {
        self.active.get(&key).copied()
    }

    #[allow(missing_docs)]
    pub fn drone_voice(&self) -> Option<VoiceId> {
        self.drone
    }

    /// The sink, for inspection.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    #[allow(missing_docs)]
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mixer::Mixer,
        samples::{Sample, SampleBank},
    };

    const RATE: u32 = 1000;

    fn controller() -> PlaybackController<Mixer> {
        let samples = NOTE_MAP
            .iter()
            .map(|_| Sample {
                frames: vec![0.25; 32].into(),
                sample_rate: RATE,
            })
            .collect();
        PlaybackController::new(Mixer::new(&SampleBank::from_samples(samples).unwrap(), RATE))
    }

    fn render(ctl: &mut PlaybackController<Mixer>, duration: Duration) {
        let frames = duration.as_millis() as usize * RATE as usize / 1000;
        let mut out = vec![0.0; frames];
        ctl.sink_mut().render(&mut out);
    }

    #[test]
    fn one_voice_per_held_key() {
        let mut ctl = controller();
        for _ in 0..10 {
            ctl.sync_notes(|k| k == 'a');
        }
        assert_eq!(ctl.active_keys(), vec!['a']);
        assert_eq!(ctl.sink().voice_count(), 1);
        assert_eq!(ctl.sink().volume(ctl.voice_for('a').unwrap()), Some(0.0));
    }

    #[test]
    fn release_fades_then_removes() {
        let mut ctl = controller();
        ctl.sync_notes(|k| k == 'd');
        let voice = ctl.voice_for('d').unwrap();

        ctl.sync_notes(|_| false);
        assert!(ctl.active_keys().is_empty());
        assert!(ctl.sink().is_fading(voice));
        assert_eq!(ctl.sink().voice_count(), 1);

        render(&mut ctl, NOTE_FADE);
        assert_eq!(ctl.sink().voice_count(), 0);
    }

    #[test]
    fn repress_during_fade_does_not_duplicate_the_entry() {
        let mut ctl = controller();
        ctl.press_note('f');
        let first = ctl.voice_for('f').unwrap();
        ctl.release_note('f');
        ctl.press_note('f');
        ctl.press_note('f');

        assert_eq!(ctl.active_keys(), vec!['f']);
        let second = ctl.voice_for('f').unwrap();
        assert_ne!(first, second);
        assert!(!ctl.sink().is_fading(second));

        render(&mut ctl, NOTE_FADE);
        assert_eq!(ctl.sink().voice_count(), 1);
        assert_eq!(ctl.active_keys(), vec!['f']);
    }

    #[test]
    fn loudness_reaches_notes_and_scaled_drone() {
        let mut ctl = controller();
        ctl.sync_notes(|k| k == 'a' || k == 'k');
        ctl.sync_drone(true);
        ctl.set_loudness(0.5);

        for key in ['a', 'k'] {
            let voice = ctl.voice_for(key).unwrap();
            assert_eq!(ctl.sink().volume(voice), Some(0.5));
        }
        let drone = ctl.drone_voice().unwrap();
        assert!((ctl.sink().volume(drone).unwrap() - 0.5 * DRONE_GAIN).abs() < 1e-6);
        assert_eq!(ctl.active_keys(), vec!['a', 'k']);
    }

    #[test]
    fn drone_toggles_with_its_own_fade() {
        let mut ctl = controller();
        ctl.sync_drone(true);
        ctl.sync_drone(true);
        assert_eq!(ctl.sink().voice_count(), 1);
        let drone = ctl.drone_voice().unwrap();

        ctl.sync_drone(false);
        assert!(ctl.drone_voice().is_none());
        render(&mut ctl, NOTE_FADE);
        assert!(ctl.sink().is_fading(drone));
        render(&mut ctl, DRONE_FADE - NOTE_FADE);
        assert_eq!(ctl.sink().voice_count(), 0);
    }

    #[test]
    fn non_note_keys_are_ignored() {
        let mut ctl = controller();
        ctl.press_note('z');
        ctl.release_note('q');
        assert!(ctl.active_keys().is_empty());
        assert_eq!(ctl.sink().voice_count(), 0);
    }
}
