//! The background thread that keeps the latest hinge angle fresh.

use crate::{angle_parser::parse_angle, error::HarmoniumError, lid_sensor::LidSensor};

use log::{debug, info, trace};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, RecvTimeoutError},
        Arc, Mutex,
    },
    thread,
    time::Duration,
};

/// A thread-safe cell holding the most recent angle reading.
///
/// Cloning the cell clones the handle, not the value; every clone sees the
/// same reading. `None` means no reading has been parsed yet.
#[derive(Debug, Clone, Default)]
pub struct AngleCell {
    angle: Arc<Mutex<Option<f32>>>,
}

impl AngleCell {
    /// An empty cell.
    pub fn new() -> Self {
        Self::default()
    }

    /// The last known angle. Never waits for a new sample.
    pub fn get(&self) -> Option<f32> {
        *self.angle.lock().unwrap()
    }

    /// Replaces the stored angle.
    pub fn set(&self, angle: f32) {
        *self.angle.lock().unwrap() = Some(angle);
    }
}

enum Signal {
    Stop,
}

/// Runs one query against `sensor` and stores the result in `cell`.
///
/// A failed query or output with no number in it leaves `cell` untouched.
/// Returns the angle that was stored, if any. Setting `cancel` cuts a slow
/// query short.
pub fn poll_once(
    sensor: &mut dyn LidSensor,
    cell: &AngleCell,
    cancel: &AtomicBool,
) -> Option<f32> {
    match sensor.query(cancel) {
        Ok(text) => match parse_angle(&text) {
            Some(angle) => {
                trace!("Lid angle {}", angle);
                cell.set(angle);
                Some(angle)
            }
            None => {
                debug!("No angle in sensor output {:?}", text);
                None
            }
        },
        Err(e) => {
            debug!("Sensor query failed: {}", e);
            None
        }
    }
}

/// Owns the polling thread. Stopping (or dropping) the poller cancels any
/// running query, signals the thread and joins it.
pub struct AnglePoller {
    handle: Option<thread::JoinHandle<()>>,
    tx: mpsc::Sender<Signal>,
    cancel: Arc<AtomicBool>,
    cell: AngleCell,
}

impl AnglePoller {
    /// Starts polling `sensor` every `interval`.
    pub fn spawn(
        mut sensor: Box<dyn LidSensor>,
        interval: Duration,
    ) -> Result<Self, HarmoniumError> {
        let (tx, rx) = mpsc::channel::<Signal>();
        let cell = AngleCell::new();
        let th_cell = cell.clone();
        let cancel = Arc::new(AtomicBool::new(false));
        let th_cancel = cancel.clone();

        let handle = thread::Builder::new()
            .name("lid-poller".to_owned())
            .spawn(move || {
                info!("Polling lid angle every {:?}", interval);
                loop {
                    poll_once(sensor.as_mut(), &th_cell, &th_cancel);
                    match rx.recv_timeout(interval) {
                        Ok(Signal::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                        Err(RecvTimeoutError::Timeout) => {}
                    }
                }
                info!("Lid angle poller stopped");
            })?;

        Ok(Self {
            handle: Some(handle),
            tx,
            cancel,
            cell,
        })
    }

    /// A handle to the shared reading, for the render loop.
    pub fn cell(&self) -> AngleCell {
        self.cell.clone()
    }

    /// Shorthand for `self.cell().get()`.
    pub fn latest(&self) -> Option<f32> {
        self.cell.get()
    }

    /// Tells the polling thread to finish and waits for it. An in-flight
    /// query is cancelled rather than waited out.
    pub fn stop(&mut self) -> Result<(), HarmoniumError> {
        if let Some(thread) = self.handle.take() {
            self.cancel.store(true, Ordering::Relaxed);
            // The thread may already be gone, in which case there is no one to tell.
            let _ = self.tx.send(Signal::Stop);
            thread.join().map_err(|_| HarmoniumError::JoinError)?;
        }
        Ok(())
    }
}

impl Drop for AnglePoller {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lid_sensor::SimulatedSensor;
    use std::{collections::VecDeque, time::Instant};

    struct ScriptedSensor {
        replies: VecDeque<Result<String, HarmoniumError>>,
    }

    impl ScriptedSensor {
        fn new(replies: Vec<Result<&str, &str>>) -> Self {
            Self {
                replies: replies
                    .into_iter()
                    .map(|r| {
                        r.map(str::to_owned)
                            .map_err(|e| HarmoniumError::SensorError(e.to_owned()))
                    })
                    .collect(),
            }
        }
    }

    impl LidSensor for ScriptedSensor {
        fn query(&mut self, _cancel: &AtomicBool) -> Result<String, HarmoniumError> {
            self.replies
                .pop_front()
                .unwrap_or_else(|| Err(HarmoniumError::SensorError("exhausted".to_owned())))
        }
    }

    #[test]
    fn junk_and_failures_keep_the_previous_angle() {
        let mut sensor = ScriptedSensor::new(vec![
            Ok("40.5"),
            Ok("not a number"),
            Err("osascript blew up"),
            Ok(""),
            Ok("Angle 90"),
        ]);
        let cell = AngleCell::new();
        let cancel = AtomicBool::new(false);

        assert_eq!(poll_once(&mut sensor, &cell, &cancel), Some(40.5));
        assert_eq!(poll_once(&mut sensor, &cell, &cancel), None);
        assert_eq!(cell.get(), Some(40.5));
        assert_eq!(poll_once(&mut sensor, &cell, &cancel), None);
        assert_eq!(cell.get(), Some(40.5));
        assert_eq!(poll_once(&mut sensor, &cell, &cancel), None);
        assert_eq!(cell.get(), Some(40.5));
        assert_eq!(poll_once(&mut sensor, &cell, &cancel), Some(90.0));
        assert_eq!(cell.get(), Some(90.0));
    }

    #[test]
    fn empty_cell_until_first_reading() {
        let cell = AngleCell::new();
        assert_eq!(cell.get(), None);
        let other = cell.clone();
        other.set(12.0);
        assert_eq!(cell.get(), Some(12.0));
    }

    #[test]
    fn poller_publishes_and_stops() {
        let sensor = Box::new(SimulatedSensor::with_seed(30.0, 1));
        let mut poller = AnglePoller::spawn(sensor, Duration::from_millis(5)).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while poller.latest().is_none() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(poller.latest().is_some());

        assert!(poller.stop().is_ok());
        assert!(poller.stop().is_ok());
    }

    #[test]
    fn stop_interrupts_a_long_wait() {
        let sensor = Box::new(ScriptedSensor::new(vec![Ok("10")]));
        let mut poller = AnglePoller::spawn(sensor, Duration::from_secs(3600)).unwrap();
        let started = Instant::now();
        poller.stop().unwrap();
        assert!(started.elapsed() < Duration::from_secs(60));
    }

    #[cfg(unix)]
    #[test]
    fn stop_kills_a_hung_query() {
        let sensor = Box::new(crate::lid_sensor::CommandSensor::new(
            "sleep",
            vec!["4".to_owned()],
        ));
        let mut poller = AnglePoller::spawn(sensor, Duration::from_millis(10)).unwrap();
        thread::sleep(Duration::from_millis(100));

        let started = Instant::now();
        poller.stop().unwrap();
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(poller.latest(), None);
    }
}
