use bitflags::bitflags;

use crate::sensor::SensorState;

bitflags! {
    /// Per-cycle sensor fault mask.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct FaultFlags: u8 {
        /// |gyro x| above the fault threshold
        const GYRO_RATE_X = 1 << 0;
        /// |gyro y| above the fault threshold
        const GYRO_RATE_Y = 1 << 1;
        /// |gyro z| above the fault threshold
        const GYRO_RATE_Z = 1 << 2;
        /// NaN or Inf in any gyro or magnetometer component
        const NON_FINITE = 1 << 3;
    }
}

impl FaultFlags {
    /// Rate flag for body axis `axis` (0..3).
    pub fn gyro_rate(axis: usize) -> Self {
        match axis {
            0 => FaultFlags::GYRO_RATE_X,
            1 => FaultFlags::GYRO_RATE_Y,
            2 => FaultFlags::GYRO_RATE_Z,
            _ => FaultFlags::empty(),
        }
    }

    /// Evaluates the fault mask for one sensor snapshot.
    pub fn detect(sensors: &SensorState, rate_threshold: f32) -> Self {
        let mut flags = FaultFlags::empty();
        for i in 0..3 {
            if sensors.gyro[i].abs() > rate_threshold {
                flags |= FaultFlags::gyro_rate(i);
            }
        }
        if !sensors.is_finite() {
            flags |= FaultFlags::NON_FINITE;
        }
        flags
    }
}

/// Consecutive-event counters kept by the supervisor across cycles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FaultCounters {
    /// invalid samples in a row
    pub invalid_samples: u32,
    /// cycles in a row with a nonzero fault mask
    pub fault_cycles: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn sensors(gyro: [f32; 3], mag: [f32; 3]) -> SensorState {
        SensorState::new(Vector3::from(gyro), Vector3::from(mag), 0.0)
    }

    #[test]
    fn test_no_faults() {
        let flags = FaultFlags::detect(&sensors([0.1, -0.2, 0.5], [1.0, 2.0, 3.0]), 0.5);
        assert!(flags.is_empty());
    }

    #[test]
    fn test_rate_faults_per_axis() {
        let flags = FaultFlags::detect(&sensors([0.6, 0.0, -0.7], [0.0; 3]), 0.5);
        assert_eq!(flags, FaultFlags::GYRO_RATE_X | FaultFlags::GYRO_RATE_Z);
        assert_eq!(flags.bits(), 0b0101);
    }

    #[test]
    fn test_non_finite_magnetometer() {
        let flags = FaultFlags::detect(&sensors([0.0; 3], [0.0, f32::NAN, 0.0]), 0.5);
        assert_eq!(flags, FaultFlags::NON_FINITE);
        assert_eq!(flags.bits(), 0x08);
    }

    #[test]
    fn test_infinite_gyro_sets_rate_and_finite_bits() {
        let flags = FaultFlags::detect(&sensors([f32::INFINITY, 0.0, 0.0], [0.0; 3]), 0.5);
        assert_eq!(flags, FaultFlags::GYRO_RATE_X | FaultFlags::NON_FINITE);
    }

    #[test]
    fn test_nan_gyro_does_not_set_rate_bit() {
        let flags = FaultFlags::detect(&sensors([0.0, f32::NAN, 0.0], [0.0; 3]), 0.5);
        assert_eq!(flags, FaultFlags::NON_FINITE);
    }
}
