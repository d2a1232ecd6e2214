//! The bellows: how the hinge angle becomes air pressure.
//!
//! Opening the lid raises the target pressure linearly up to the full
//! [`MAX_ANGLE`]. Actual pressure chases the target with a fixed gain each
//! frame, and moving the hinge quickly adds a short burst on top, like
//! squeezing a real bellows.

use crate::MAX_ANGLE;

/// Smallest frame time used when computing angular velocity.
pub const MIN_DT: f32 = 1e-4;
/// Fraction of the gap to the target pressure closed per frame.
pub const SMOOTHING: f32 = 0.25;
/// Angular speed (degrees per second) that produces one unit of burst.
pub const BURST_SPEED: f32 = 250.0;
/// Largest burst a single frame can add.
pub const MAX_BURST: f32 = 0.4;
/// Exponent of the pressure-to-volume curve.
pub const LOUDNESS_CURVE: f32 = 1.8;

/// Pressure target for a given hinge angle, in `[0, 1]`.
pub fn target_pressure(angle: f32) -> f32 {
    (angle / MAX_ANGLE).clamp(0.0, 1.0)
}

/// Maps pressure onto playback volume.
pub fn loudness(pressure: f32) -> f32 {
    pressure.clamp(0.0, 1.0).powf(LOUDNESS_CURVE)
}

/// What one [`Bellows::update`] produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BellowsReading {
    /// Smoothed air pressure, `[0, 1]`.
    pub pressure: f32,
    /// Hinge speed in degrees per second, signed.
    pub velocity: f32,
}

impl BellowsReading {
    /// Playback volume for this reading.
    pub fn loudness(&self) -> f32 {
        loudness(self.pressure)
    }
}

/// Physics state carried from one frame to the next.
#[derive(Debug, Clone, Default)]
pub struct Bellows {
    pressure: f32,
    target: f32,
    last_angle: f32,
}

impl Bellows {
    /// A closed bellows at rest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current smoothed pressure.
    pub fn pressure(&self) -> f32 {
        self.pressure
    }

    /// Advances the model by one frame.
    ///
    /// `dt` is the wall-clock time since the previous update, in seconds.
    /// A non-finite angle counts as "no movement".
    pub fn update(&mut self, angle: f32, dt: f32) -> BellowsReading {
        let angle = if angle.is_finite() {
            angle
        } else {
            self.last_angle
        };
        let dt = if dt.is_finite() { dt.max(MIN_DT) } else { MIN_DT };

        let velocity = (angle - self.last_angle) / dt;
        self.target = target_pressure(angle);
        self.pressure += (self.target - self.pressure) * SMOOTHING;

        let burst = (velocity.abs() / BURST_SPEED).clamp(0.0, MAX_BURST);
        self.pressure = (self.pressure + burst).clamp(0.0, 1.0);
        self.last_angle = angle;

        BellowsReading {
            pressure: self.pressure,
            velocity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f32 = 1.0 / 120.0;

    #[test]
    fn target_is_clamped() {
        for a in 0..=135 {
            let t = target_pressure(a as f32);
            assert!((0.0..=1.0).contains(&t));
        }
        assert_eq!(target_pressure(-20.0), 0.0);
        assert_eq!(target_pressure(200.0), 1.0);
    }

    #[test]
    fn silent_at_rest() {
        let mut bellows = Bellows::new();
        for _ in 0..100 {
            let reading = bellows.update(0.0, FRAME);
            assert_eq!(reading.loudness(), 0.0);
            assert_eq!(reading.velocity, 0.0);
        }
    }

    #[test]
    fn full_open_settles_at_full_volume() {
        let mut bellows = Bellows::new();
        let mut reading = bellows.update(MAX_ANGLE, FRAME);
        for _ in 0..200 {
            reading = bellows.update(MAX_ANGLE, FRAME);
        }
        assert_eq!(reading.velocity, 0.0);
        assert!((reading.pressure - 1.0).abs() < 1e-5);
        assert!((reading.loudness() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn fast_swing_saturates_the_burst() {
        let mut bellows = Bellows::new();
        // 2.5 degrees in 10ms is exactly 250 degrees per second.
        let reading = bellows.update(2.5, 0.01);
        assert!((reading.velocity - BURST_SPEED).abs() < 1e-2);
        let smoothed = target_pressure(2.5) * SMOOTHING;
        assert!((reading.pressure - (smoothed + MAX_BURST)).abs() < 1e-4);

        let mut faster = Bellows::new();
        let reading = faster.update(50.0, 0.01);
        let smoothed = target_pressure(50.0) * SMOOTHING;
        assert!((reading.pressure - (smoothed + MAX_BURST)).abs() < 1e-4);
    }

    #[test]
    fn zero_dt_does_not_divide_by_zero() {
        let mut bellows = Bellows::new();
        let reading = bellows.update(90.0, 0.0);
        assert!(reading.velocity.is_finite());
        assert!((reading.velocity - 90.0 / MIN_DT).abs() < 1.0);

        let reading = bellows.update(10.0, -3.0);
        assert!(reading.velocity.is_finite());
        let reading = bellows.update(20.0, f32::NAN);
        assert!(reading.velocity.is_finite());
    }

    #[test]
    fn pressure_stays_in_bounds() {
        let angles = [0.0, 135.0, -50.0, 400.0, 67.0, f32::NAN, 0.0, 135.0, 1e9];
        let dts = [0.0, 1e-6, FRAME, 1.0, f32::INFINITY];
        let mut bellows = Bellows::new();
        for (i, &angle) in angles.iter().cycle().take(200).enumerate() {
            let reading = bellows.update(angle, dts[i % dts.len()]);
            assert!((0.0..=1.0).contains(&reading.pressure));
            assert!(reading.velocity.is_finite());
        }
    }

    #[test]
    fn burst_only_pushes_upwards() {
        let mut bellows = Bellows::new();
        bellows.update(40.0, 1.0);
        let before = bellows.pressure();
        // Target above current pressure and a positive burst: never decreases.
        let reading = bellows.update(100.0, FRAME);
        assert!(reading.pressure >= before);
    }

    #[test]
    fn repeated_input_converges_without_oscillating() {
        let mut bellows = Bellows::new();
        bellows.update(60.0, MIN_DT);
        let target = target_pressure(60.0);
        let mut last_gap = f32::INFINITY;
        for _ in 0..50 {
            let reading = bellows.update(60.0, MIN_DT);
            let gap = (reading.pressure - target).abs();
            assert!(gap <= last_gap);
            last_gap = gap;
        }
        assert!(last_gap < 1e-4);
    }
}
