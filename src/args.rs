// Commandline argument parser using clap for the harmonium

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser, Clone, Default)]
#[clap(version, about)]
pub struct HarmoniumArgs {
    /// RON file with instrument settings; flags below override it
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Directory holding c4.wav through c5.wav
    #[arg(short = 'a', long = "assets")]
    pub asset_dir: Option<PathBuf>,

    /// Where the hinge angle comes from
    #[arg(short = 's', long = "sensor", value_enum)]
    pub sensor: Option<SensorKind>,

    /// Program (and its arguments) to run for each reading; implies `--sensor command`
    #[arg(long = "sensor-command")]
    #[clap(num_args = 1.., allow_hyphen_values = true)]
    pub sensor_command: Vec<String>,

    /// How often the sensor is queried, in milliseconds
    #[arg(short = 'p', long = "poll-ms")]
    pub poll_ms: Option<u64>,

    /// Frame rate cap, in frames per second
    #[arg(short = 'r', long = "fps")]
    pub frame_rate: Option<f32>,

    /// How long a key counts as held without a repeat, for terminals that do
    /// not report key releases, in milliseconds
    #[arg(long = "hold-ms")]
    pub hold_ms: Option<u64>,

    /// Write the log here instead of stderr
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SensorKind {
    /// The macOS LidAngleSensor helper, read through osascript
    Osascript,
    /// Any program that prints the angle
    Command,
    /// A pretend hinge that wanders around
    Simulated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_everything() {
        let args = HarmoniumArgs::parse_from([
            "harmonium",
            "--assets",
            "sounds",
            "--sensor",
            "simulated",
            "-p",
            "250",
            "--fps",
            "60",
            "--log-file",
            "harmonium.log",
        ]);
        assert_eq!(args.asset_dir, Some(PathBuf::from("sounds")));
        assert_eq!(args.sensor, Some(SensorKind::Simulated));
        assert_eq!(args.poll_ms, Some(250));
        assert_eq!(args.frame_rate, Some(60.0));
        assert_eq!(args.log_file, Some(PathBuf::from("harmonium.log")));
        assert!(args.sensor_command.is_empty());
    }

    #[test]
    fn sensor_command_takes_the_rest() {
        let args =
            HarmoniumArgs::parse_from(["harmonium", "--sensor-command", "cat", "/tmp/angle"]);
        assert_eq!(args.sensor_command, vec!["cat", "/tmp/angle"]);
    }

    #[test]
    fn no_flags_is_fine() {
        let args = HarmoniumArgs::parse_from(["harmonium"]);
        assert!(args.config.is_none());
        assert!(args.sensor.is_none());
    }
}
