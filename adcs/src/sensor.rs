use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// One sensor delivery from the bus.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    /// body rates (rad/s)
    pub gyro: Vector3<f32>,
    pub magnetometer: Vector3<f32>,
    pub sun_angle: f32,
    pub timestamp: u32,
    pub valid: bool,
}

impl SensorSample {
    pub fn new(gyro: Vector3<f32>, magnetometer: Vector3<f32>, sun_angle: f32, timestamp: u32) -> Self {
        Self { gyro, magnetometer, sun_angle, timestamp, valid: true }
    }

    /// A sample flagged invalid by the sensor interface.
    pub fn invalid(timestamp: u32) -> Self {
        Self {
            gyro: Vector3::zeros(),
            magnetometer: Vector3::zeros(),
            sun_angle: 0.0,
            timestamp,
            valid: false,
        }
    }
}

/// Working copy of the last valid sample, owned by the supervisor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorState {
    pub gyro: Vector3<f32>,
    pub magnetometer: Vector3<f32>,
    pub sun_angle: f32,
}

impl SensorState {
    pub fn new(gyro: Vector3<f32>, magnetometer: Vector3<f32>, sun_angle: f32) -> Self {
        Self { gyro, magnetometer, sun_angle }
    }

    /// True when every gyro and magnetometer component is finite.
    /// The sun angle is not part of fault detection.
    pub fn is_finite(&self) -> bool {
        self.gyro.iter().all(|v| v.is_finite())
            && self
                .magnetometer
                .iter()
                .all(|v| v.is_finite())
    }
}

impl From<&SensorSample> for SensorState {
    fn from(sample: &SensorSample) -> Self {
        Self {
            gyro: sample.gyro,
            magnetometer: sample.magnetometer,
            sun_angle: sample.sun_angle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_from_sample() {
        let sample = SensorSample::new(
            Vector3::new(0.1, 0.2, 0.3),
            Vector3::new(1.0, 2.0, 3.0),
            0.5,
            42,
        );
        let state = SensorState::from(&sample);
        assert_eq!(state.gyro, sample.gyro);
        assert_eq!(state.magnetometer, sample.magnetometer);
        assert_eq!(state.sun_angle, 0.5);
    }

    #[test]
    fn test_is_finite() {
        let mut state = SensorState::default();
        assert!(state.is_finite());
        state.magnetometer[2] = f32::INFINITY;
        assert!(!state.is_finite());
        state.magnetometer[2] = 0.0;
        state.gyro[0] = f32::NAN;
        assert!(!state.is_finite());
    }

    #[test]
    fn test_sun_angle_ignored_by_is_finite() {
        let state = SensorState::new(Vector3::zeros(), Vector3::zeros(), f32::NAN);
        assert!(state.is_finite());
    }

    #[test]
    fn test_invalid_sample() {
        let sample = SensorSample::invalid(7);
        assert!(!sample.valid);
        assert_eq!(sample.timestamp, 7);
    }
}
