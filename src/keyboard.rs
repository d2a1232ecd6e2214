//! Which keys play what, and which keys are currently held down.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

/// A musical key on the computer keyboard and the sample it plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteBinding {
    /// The key, always lowercase.
    pub key: char,
    /// Pitch name shown to the player.
    pub pitch: &'static str,
    /// Sample file name, relative to the asset directory.
    pub file: &'static str,
}

const fn binding(key: char, pitch: &'static str, file: &'static str) -> NoteBinding {
    NoteBinding { key, pitch, file }
}

/// The home row plays a C major scale, C4 up to C5.
pub const NOTE_MAP: [NoteBinding; 8] = [
    binding('a', "C4", "c4.wav"),
    binding('s', "D4", "d4.wav"),
    binding('d', "E4", "e4.wav"),
    binding('f', "F4", "f4.wav"),
    binding('g', "G4", "g4.wav"),
    binding('h', "A4", "a4.wav"),
    binding('j', "B4", "b4.wav"),
    binding('k', "C5", "c5.wav"),
];

/// Held for the drone.
pub const DRONE_KEY: char = ' ';
/// Cycles the display mode.
pub const MODE_KEY: char = 'm';

/// Index of `key` in [`NOTE_MAP`], if it is a musical key.
pub fn note_index(key: char) -> Option<usize> {
    NOTE_MAP.iter().position(|b| b.key == key)
}

/// The name a key is shown with in the status line.
pub fn key_name(key: char) -> String {
    match key {
        ' ' => "space".to_owned(),
        c => c.to_string(),
    }
}

/// What a key event means to the instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// The player asked to quit.
    Close,
    /// Advance to the next display mode.
    CycleMode,
    /// A held key (note or drone) went down, or is repeating.
    Press(char),
    /// A held key came up.
    Release(char),
}

/// Translates a terminal key event into an [`InputAction`].
///
/// `Esc` and `Ctrl+C` close the instrument. Auto-repeat of the mode key is
/// ignored so holding `m` does not spin through the modes.
pub fn translate_key(event: &KeyEvent) -> Option<InputAction> {
    match (event.code, event.kind) {
        (KeyCode::Esc, KeyEventKind::Press) => Some(InputAction::Close),
        (KeyCode::Char('c'), KeyEventKind::Press)
            if event.modifiers.contains(KeyModifiers::CONTROL) =>
        {
            Some(InputAction::Close)
        }
        (KeyCode::Char(c), kind) => {
            let c = c.to_ascii_lowercase();
            if c == MODE_KEY {
                (kind == KeyEventKind::Press).then_some(InputAction::CycleMode)
            } else if c == DRONE_KEY || note_index(c).is_some() {
                match kind {
                    KeyEventKind::Press | KeyEventKind::Repeat => Some(InputAction::Press(c)),
                    KeyEventKind::Release => Some(InputAction::Release(c)),
                }
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Tracks which keys are down.
///
/// Terminals that report key releases make this exact. Others only send
/// presses and auto-repeats, so with a hold window a key stays held until
/// that long has passed without another press.
#[derive(Debug, Clone)]
pub struct HeldKeys {
    held: HashMap<char, Instant>,
    hold_window: Option<Duration>,
}

impl HeldKeys {
    /// `hold_window` of `None` trusts release events completely.
    pub fn new(hold_window: Option<Duration>) -> Self {
        Self {
            held: HashMap::new(),
            hold_window,
        }
    }

    /// Stops expiring keys; from now on only releases end a hold.
    pub fn trust_releases(&mut self) {
        self.hold_window = None;
    }

    /// Records a press or repeat of `key` at `now`.
    pub fn press(&mut self, key: char, now: Instant) {
        self.held.insert(key, now);
    }

    /// Records that `key` came up.
    pub fn release(&mut self, key: char) {
        self.held.remove(&key);
    }

    /// Forgets keys whose hold window has run out.
    pub fn expire(&mut self, now: Instant) {
        if let Some(window) = self.hold_window {
            self.held
                .retain(|_, last| now.saturating_duration_since(*last) <= window);
        }
    }

    /// Whether `key` is down as of the last [`HeldKeys::expire`].
    pub fn is_held(&self, key: char) -> bool {
        self.held.contains_key(&key)
    }
}
