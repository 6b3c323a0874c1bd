use serde::{Deserialize, Serialize};
use std::fmt;

/// Operating mode of the attitude control system.
///
/// The raw encoding (`Safe = 0` .. `Science = 3`) is what a commanding
/// collaborator sends over the bus. Any raw value outside that range maps to
/// [`ControlMode::Safe`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlMode {
    /// All actuator outputs zeroed.
    #[default]
    Safe,
    /// B-dot rate damping with the magnetorquers.
    Detumble,
    /// Rate damping with the reaction wheels.
    Point,
    /// Point with a tighter wheel torque ceiling.
    Science,
}

impl ControlMode {
    pub const ALL: [ControlMode; 4] = [
        ControlMode::Safe,
        ControlMode::Detumble,
        ControlMode::Point,
        ControlMode::Science,
    ];

    /// Total mapping from the raw encoding, falling back to `Safe`.
    pub fn from_raw(raw: i32) -> Self {
        Self::try_from_raw(raw).unwrap_or(ControlMode::Safe)
    }

    /// Strict mapping, `None` for anything outside `0..=3`.
    pub fn try_from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(ControlMode::Safe),
            1 => Some(ControlMode::Detumble),
            2 => Some(ControlMode::Point),
            3 => Some(ControlMode::Science),
            _ => None,
        }
    }

    pub fn as_raw(self) -> i32 {
        match self {
            ControlMode::Safe => 0,
            ControlMode::Detumble => 1,
            ControlMode::Point => 2,
            ControlMode::Science => 3,
        }
    }

    pub fn is_safe(self) -> bool {
        self == ControlMode::Safe
    }
}

impl From<i32> for ControlMode {
    fn from(value: i32) -> Self {
        ControlMode::from_raw(value)
    }
}

impl From<ControlMode> for i32 {
    fn from(value: ControlMode) -> Self {
        value.as_raw()
    }
}

impl From<ControlMode> for &'static str {
    fn from(value: ControlMode) -> Self {
        match value {
            ControlMode::Safe => "safe",
            ControlMode::Detumble => "detumble",
            ControlMode::Point => "point",
            ControlMode::Science => "science",
        }
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: &'static str = (*self).into();
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_roundtrip() {
        for mode in ControlMode::ALL {
            assert_eq!(ControlMode::from_raw(mode.as_raw()), mode);
        }
    }

    #[test]
    fn test_out_of_range_is_safe() {
        for raw in [-1, 4, 17, i32::MIN, i32::MAX] {
            assert_eq!(ControlMode::from(raw), ControlMode::Safe);
            assert_eq!(ControlMode::try_from_raw(raw), None);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(ControlMode::Detumble.to_string(), "detumble");
        assert_eq!(ControlMode::default(), ControlMode::Safe);
    }
}
