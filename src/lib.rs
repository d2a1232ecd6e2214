//! Harmonium turns a laptop into a small squeezebox. The lid hinge is the
//! bellows: opening it builds air pressure, and pressure sets how loud the
//! notes on the home row play. Swinging the lid quickly gives a burst of
//! extra air, like pumping a real harmonium.
//!
//! The pieces, from the bottom up:
//!
//! - [`lid_sensor`] asks the OS (or a stand-in) for the hinge angle as text,
//!   and [`angle_parser`] pulls the number out of it.
//! - [`poller`] runs that query on a background thread and keeps the latest
//!   reading in an [`poller::AngleCell`].
//! - [`bellows`] is the physical model: angle and frame time in, pressure and
//!   hinge velocity out.
//! - [`samples`], [`mixer`] and [`audio_engine`] load the note samples and
//!   play them as looping voices through cpal.
//! - [`playback`] keeps the voices in step with the held keys.
//! - [`instrument`] runs one frame of all of the above, and [`gui`] draws it
//!   in the terminal.

#![warn(missing_docs)]
pub mod angle_parser;
pub mod args;
pub mod audio_engine;
pub mod bellows;
pub mod config;
pub mod error;
pub mod gui;
pub mod instrument;
pub mod keyboard;
pub mod lid_sensor;
pub mod mixer;
pub mod mode;
pub mod playback;
pub mod poller;
pub mod samples;

/// Hinge angle, in degrees, at which the bellows are fully open.
pub const MAX_ANGLE: f32 = 135.0;
