//! Sources of raw hinge-angle text.
//!
//! A [`LidSensor`] only knows how to ask for a reading and hand back whatever
//! text came out. Turning that text into a number is the job of
//! [`crate::angle_parser`], so every sensor goes through the same parsing path.

use crate::{config::SensorSource, error::HarmoniumError, MAX_ANGLE};

use log::{debug, trace};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{
    process::{Command, Stdio},
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::Duration,
};

/// How often a running query checks whether it should give up.
const CANCEL_CHECK: Duration = Duration::from_millis(5);

/// AppleScript that reads the angle shown by the `LidAngleSensor` helper app.
pub const LID_ANGLE_SCRIPT: &str = r#"
tell application "System Events"
    tell application process "LidAngleSensor"
        try
            set v to value of static text 1 of window 1
            return v
        on error
            return ""
        end try
    end tell
end tell
"#;

/// Something that can be asked for the current hinge angle as text.
///
/// Queries may fail or return junk; the poller copes with both.
pub trait LidSensor: Send {
    /// Runs one query and returns its raw output.
    ///
    /// A query that can take a while must return soon after `cancel` is set.
    fn query(&mut self, cancel: &AtomicBool) -> Result<String, HarmoniumError>;
}

/// Runs an external program and captures its standard output.
#[derive(Debug, Clone)]
pub struct CommandSensor {
    program: String,
    args: Vec<String>,
}

impl CommandSensor {
    /// A sensor that runs `program` with `args` on every query.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// The macOS accessibility query, via `osascript`.
    pub fn osascript() -> Self {
        Self::new("osascript", vec!["-e".to_owned(), LID_ANGLE_SCRIPT.to_owned()])
    }
}

impl LidSensor for CommandSensor {
    /// Runs the program to completion, or kills it once `cancel` is set.
    fn query(&mut self, cancel: &AtomicBool) -> Result<String, HarmoniumError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        while child.try_wait()?.is_none() {
            if cancel.load(Ordering::Relaxed) {
                // It may have exited in the meantime; either way reap it.
                let _ = child.kill();
                let _ = child.wait();
                debug!("Killed {} mid-query", self.program);
                return Err(HarmoniumError::SensorError(format!(
                    "{} was cancelled",
                    self.program
                )));
            }
            thread::sleep(CANCEL_CHECK);
        }

        let output = child.wait_with_output()?;

        if !output.status.success() {
            return Err(HarmoniumError::SensorError(format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_owned();
        trace!("{} printed {:?}", self.program, text);
        Ok(text)
    }
}

/// A pretend hinge that wanders around, with the occasional fast swing.
///
/// Useful on machines without the sensor helper, and in tests.
pub struct SimulatedSensor {
    angle: f32,
    rng: StdRng,
}

impl SimulatedSensor {
    /// Starts the hinge at `angle` degrees.
    pub fn new(angle: f32) -> Self {
        Self {
            angle,
            rng: StdRng::from_entropy(),
        }
    }

    /// Same as [`SimulatedSensor::new`] but reproducible.
    pub fn with_seed(angle: f32, seed: u64) -> Self {
        Self {
            angle,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl LidSensor for SimulatedSensor {
    fn query(&mut self, _cancel: &AtomicBool) -> Result<String, HarmoniumError> {
        self.angle = if self.rng.gen_bool(0.1) {
            self.rng.gen_range(0.0..MAX_ANGLE)
        } else {
            (self.angle + self.rng.gen_range(-8.0..8.0)).clamp(0.0, MAX_ANGLE)
        };
        Ok(format!("{:.1}", self.angle))
    }
}

/// Builds the sensor a [`SensorSource`] describes.
pub fn from_source(source: &SensorSource) -> Box<dyn LidSensor> {
    match source {
        SensorSource::Osascript => Box::new(CommandSensor::osascript()),
        SensorSource::Command { program, args } => {
            Box::new(CommandSensor::new(program.clone(), args.clone()))
        }
        SensorSource::Simulated { start_angle } => Box::new(SimulatedSensor::new(*start_angle)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angle_parser::parse_angle;
    use std::time::Instant;

    static KEEP_GOING: AtomicBool = AtomicBool::new(false);

    #[test]
    fn simulated_readings_stay_in_range() {
        let mut sensor = SimulatedSensor::with_seed(60.0, 7);
        for _ in 0..500 {
            let angle = parse_angle(&sensor.query(&KEEP_GOING).unwrap()).unwrap();
            assert!((0.0..=MAX_ANGLE).contains(&angle));
        }
    }

    #[test]
    fn missing_program_is_an_error() {
        let mut sensor = CommandSensor::new("definitely-not-a-real-lid-sensor", vec![]);
        assert!(sensor.query(&KEEP_GOING).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn command_output_is_trimmed() {
        let mut sensor = CommandSensor::new("echo", vec!["  42.5 ".to_owned()]);
        assert_eq!(sensor.query(&KEEP_GOING).unwrap(), "42.5");
    }

    #[cfg(unix)]
    #[test]
    fn failing_command_is_an_error() {
        let mut sensor = CommandSensor::new("false", vec![]);
        assert!(matches!(
            sensor.query(&KEEP_GOING),
            Err(HarmoniumError::SensorError(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn cancelled_command_is_killed() {
        let mut sensor = CommandSensor::new("sleep", vec!["4".to_owned()]);
        let cancel = AtomicBool::new(true);
        let started = Instant::now();
        assert!(matches!(
            sensor.query(&cancel),
            Err(HarmoniumError::SensorError(_))
        ));
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
