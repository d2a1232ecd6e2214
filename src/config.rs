//! Instrument settings.
//!
//! Settings come from three layers: built-in defaults, an optional RON file,
//! then command-line flags. A config file looks like this; any field can be
//! left out:
//!
//! ```text
//! (
//!     asset_dir: "sounds",
//!     sensor: Command(program: "cat", args: ["/tmp/lid-angle"]),
//!     poll_interval_ms: 500,
//!     frame_rate: 120.0,
//!     hold_window_ms: 600,
//! )
//! ```

use crate::{
    args::{HarmoniumArgs, SensorKind},
    error::HarmoniumError,
};

use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

/// Where hinge readings come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SensorSource {
    /// The macOS `LidAngleSensor` helper app, read through `osascript`.
    Osascript,
    /// Any program whose output contains the angle.
    Command {
        #[allow(missing_docs)]
        program: String,
        #[allow(missing_docs)]
        #[serde(default)]
        args: Vec<String>,
    },
    /// A simulated hinge.
    Simulated {
        /// Where the simulated lid starts, in degrees.
        #[serde(default)]
        start_angle: f32,
    },
}

impl Default for SensorSource {
    fn default() -> Self {
        if cfg!(target_os = "macos") {
            SensorSource::Osascript
        } else {
            SensorSource::Simulated { start_angle: 0.0 }
        }
    }
}

/// Everything the instrument can be told at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarmoniumConfig {
    /// Directory holding the note samples.
    pub asset_dir: PathBuf,
    #[allow(missing_docs)]
    pub sensor: SensorSource,
    /// Pause between sensor queries.
    pub poll_interval_ms: u64,
    /// Frames per second the render loop is capped at.
    pub frame_rate: f32,
    /// How long a key stays held without a repeat when the terminal does not
    /// report releases.
    pub hold_window_ms: u64,
}

impl Default for HarmoniumConfig {
    fn default() -> Self {
        Self {
            asset_dir: PathBuf::from("."),
            sensor: SensorSource::default(),
            poll_interval_ms: 500,
            frame_rate: 120.0,
            hold_window_ms: 600,
        }
    }
}

impl HarmoniumConfig {
    /// Parses a RON config, filling gaps with defaults.
    pub fn from_ron_str(s: &str) -> Result<Self, HarmoniumError> {
        let config: Self = ron::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a RON config file.
    pub fn load(path: &Path) -> Result<Self, HarmoniumError> {
        Self::from_ron_str(&fs::read_to_string(path)?)
    }

    /// Pretty-printed RON, suitable for [`HarmoniumConfig::from_ron_str`].
    pub fn to_ron_string(&self) -> Result<String, HarmoniumError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// Defaults, then the file named by `--config`, then the other flags.
    pub fn from_args(args: &HarmoniumArgs) -> Result<Self, HarmoniumError> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_args(args)?;
        Ok(config)
    }

    /// Overrides fields with whatever flags were given.
    pub fn apply_args(&mut self, args: &HarmoniumArgs) -> Result<(), HarmoniumError> {
        if let Some(dir) = &args.asset_dir {
            self.asset_dir = dir.clone();
        }
        if let Some(ms) = args.poll_ms {
            self.poll_interval_ms = ms;
        }
        if let Some(fps) = args.frame_rate {
            self.frame_rate = fps;
        }
        if let Some(ms) = args.hold_ms {
            self.hold_window_ms = ms;
        }

        let kind = match (args.sensor, args.sensor_command.is_empty()) {
            (None, false) => Some(SensorKind::Command),
            (kind, _) => kind,
        };
        match kind {
            Some(SensorKind::Osascript) => self.sensor = SensorSource::Osascript,
            Some(SensorKind::Simulated) => {
                if !matches!(self.sensor, SensorSource::Simulated { .. }) {
                    self.sensor = SensorSource::Simulated { start_angle: 0.0 };
                }
            }
            Some(SensorKind::Command) => match args.sensor_command.split_first() {
                Some((program, rest)) => {
                    self.sensor = SensorSource::Command {
                        program: program.clone(),
                        args: rest.to_vec(),
                    }
                }
                None if matches!(self.sensor, SensorSource::Command { .. }) => {}
                None => {
                    return Err(HarmoniumError::InvalidConfig(
                        "--sensor command needs --sensor-command".to_owned(),
                    ))
                }
            },
            None => {}
        }

        self.validate()
    }

    fn validate(&self) -> Result<(), HarmoniumError> {
        if self.poll_interval_ms == 0 {
            return Err(HarmoniumError::InvalidConfig(
                "poll interval must be positive".to_owned(),
            ));
        }
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(HarmoniumError::InvalidConfig(format!(
                "frame rate {} is not a positive number",
                self.frame_rate
            )));
        }
        Ok(())
    }

    #[allow(missing_docs)]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// The time budget of one frame.
    pub fn frame_period(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.frame_rate)
    }

    /// `None` when the window is zero, meaning only release events end a hold.
    pub fn hold_window(&self) -> Option<Duration> {
        (self.hold_window_ms > 0).then(|| Duration::from_millis(self.hold_window_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn defaults_round_trip() {
        let config = HarmoniumConfig::default();
        let text = config.to_ron_string().unwrap();
        assert_eq!(HarmoniumConfig::from_ron_str(&text).unwrap(), config);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = HarmoniumConfig::from_ron_str(
            r#"(asset_dir: "sounds", sensor: Command(program: "cat", args: ["/tmp/angle"]))"#,
        )
        .unwrap();
        assert_eq!(config.asset_dir, PathBuf::from("sounds"));
        assert_eq!(
            config.sensor,
            SensorSource::Command {
                program: "cat".to_owned(),
                args: vec!["/tmp/angle".to_owned()],
            }
        );
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.frame_rate, 120.0);
    }

    #[test]
    fn flags_override_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "(poll_interval_ms: 250, frame_rate: 30.0)").unwrap();
        let path = file.path().to_str().unwrap().to_owned();

        let args = HarmoniumArgs::parse_from([
            "harmonium",
            "--config",
            &path,
            "--fps",
            "90",
            "--sensor",
            "simulated",
        ]);
        let config = HarmoniumConfig::from_args(&args).unwrap();
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.frame_rate, 90.0);
        assert!(matches!(config.sensor, SensorSource::Simulated { .. }));
    }

    #[test]
    fn sensor_command_implies_command_source() {
        let args = HarmoniumArgs::parse_from(["harmonium", "--sensor-command", "echo", "42"]);
        let config = HarmoniumConfig::from_args(&args).unwrap();
        assert_eq!(
            config.sensor,
            SensorSource::Command {
                program: "echo".to_owned(),
                args: vec!["42".to_owned()],
            }
        );
    }

    #[test]
    fn command_source_without_a_command_is_rejected() {
        let args = HarmoniumArgs::parse_from(["harmonium", "--sensor", "command"]);
        let mut config = HarmoniumConfig {
            sensor: SensorSource::Osascript,
            ..Default::default()
        };
        assert!(matches!(
            config.apply_args(&args),
            Err(HarmoniumError::InvalidConfig(_))
        ));
    }

    #[test]
    fn nonsense_rates_are_rejected() {
        assert!(HarmoniumConfig::from_ron_str("(frame_rate: 0.0)").is_err());
        assert!(HarmoniumConfig::from_ron_str("(poll_interval_ms: 0)").is_err());
        assert!(HarmoniumConfig::from_ron_str("(frame_rate: ").is_err());
    }

    #[test]
    fn zero_hold_window_trusts_releases() {
        let config = HarmoniumConfig {
            hold_window_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.hold_window(), None);
        assert_eq!(
            HarmoniumConfig::default().hold_window(),
            Some(Duration::from_millis(600))
        );
    }
}
