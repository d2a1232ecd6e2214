//! One frame of the instrument, minus the drawing.
//!
//! [`Instrument`] takes input actions and a clock, and each frame turns the
//! latest hinge reading into bellows pressure and voice volumes. The terminal
//! front end in [`crate::gui`] only feeds it events and draws the [`Scene`]
//! it returns.

use crate::{
    bellows::Bellows,
    keyboard::{HeldKeys, InputAction, DRONE_KEY},
    mixer::AudioSink,
    mode::Mode,
    playback::PlaybackController,
};

use log::info;
use std::time::{Duration, Instant};

/// Everything the screen shows for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    /// Hinge angle in degrees.
    pub angle: f32,
    /// Bellows pressure, `[0, 1]`.
    pub pressure: f32,
    /// Hinge speed in degrees per second.
    pub velocity: f32,
    #[allow(missing_docs)]
    pub mode: Mode,
    /// Note keys with a sounding voice, in scale order.
    pub keys: Vec<char>,
    /// Whether the drone is sounding.
    pub drone: bool,
    /// Seconds since the instrument started, for animation.
    pub elapsed: f32,
}

/// The instrument's state between frames.
pub struct Instrument<S: AudioSink> {
    playback: PlaybackController<S>,
    bellows: Bellows,
    held: HeldKeys,
    mode: Mode,
    angle: f32,
    started: Instant,
    running: bool,
}

impl<S: AudioSink> Instrument<S> {
    /// A running instrument playing through `sink`.
    pub fn new(sink: S, hold_window: Option<Duration>, now: Instant) -> Self {
        Self {
            playback: PlaybackController::new(sink),
            bellows: Bellows::new(),
            held: HeldKeys::new(hold_window),
            mode: Mode::default(),
            angle: 0.0,
            started: now,
            running: true,
        }
    }

    /// Use when key releases are reported reliably.
    pub fn trust_key_releases(&mut self) {
        self.held.trust_releases();
    }

    /// False once a close has been requested.
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[allow(missing_docs)]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[allow(missing_docs)]
    pub fn playback(&self) -> &PlaybackController<S> {
        &self.playback
    }

    /// Applies one input action received at `now`.
    pub fn handle(&mut self, action: InputAction, now: Instant) {
        match action {
            InputAction::Close => {
                info!("Close requested");
                self.running = false;
            }
            InputAction::CycleMode => {
                self.mode = self.mode.next();
                info!("Mode: {}", self.mode.name());
            }
            InputAction::Press(key) => self.held.press(key, now),
            InputAction::Release(key) => self.held.release(key),
        }
    }

    /// Runs one frame.
    ///
    /// `reading` is the poller's latest angle; without one the previous angle
    /// is kept. `dt` is the time since the previous frame.
    pub fn frame(&mut self, reading: Option<f32>, dt: Duration, now: Instant) -> Scene {
        self.held.expire(now);
        let held = &self.held;
        self.playback.sync_notes(|k| held.is_held(k));
        self.playback.sync_drone(held.is_held(DRONE_KEY));

        self.angle = reading.unwrap_or(self.angle);
        let bellows = self.bellows.update(self.angle, dt.as_secs_f32());
        self.playback.set_loudness(bellows.loudness());

        Scene {
            angle: self.angle,
            pressure: bellows.pressure,
            velocity: bellows.velocity,
            mode: self.mode,
            keys: self.playback.active_keys(),
            drone: self.playback.drone_voice().is_some(),
            elapsed: now.saturating_duration_since(self.started).as_secs_f32(),
        }
    }
}
