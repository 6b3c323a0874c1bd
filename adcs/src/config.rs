use std::path::Path;

use ron::ser::{PrettyConfig, to_string_pretty};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{control::ControlGains, mode::ControlMode};

#[derive(Debug, Error)]
pub enum ConfigErrors {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("{0}")]
    Serialize(#[from] ron::Error),
    #[error("fault threshold must be positive, got {0}")]
    FaultThreshold(f32),
    #[error("max torque must be positive, got {0}")]
    MaxTorque(f32),
    #[error("control gains must be finite and non-negative: {0:?}")]
    Gains(ControlGains),
}

/// Startup configuration of the ADCS core.
///
/// Every field is optional in the RON document and falls back to the flight
/// defaults:
///
/// ```ron
/// (
///     initial_mode: Detumble,
///     gains: (kp_detumble: 0.1, kp_point: 0.05, kd_point: 0.01),
///     fault_threshold: 0.5,
///     max_torque: 0.1,
/// )
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdcsConfig {
    pub initial_mode: ControlMode,
    pub gains: ControlGains,
    /// gyro rate fault threshold (rad/s)
    pub fault_threshold: f32,
    /// wheel torque bound (Nm)
    pub max_torque: f32,
}

impl Default for AdcsConfig {
    fn default() -> Self {
        Self {
            initial_mode: ControlMode::Safe,
            gains: ControlGains::default(),
            fault_threshold: 0.5,
            max_torque: 0.1,
        }
    }
}

impl AdcsConfig {
    pub fn from_ron_str(content: &str) -> Result<Self, ConfigErrors> {
        let config: AdcsConfig = ron::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigErrors> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }

    pub fn to_ron_string(&self) -> Result<String, ConfigErrors> {
        Ok(to_string_pretty(self, PrettyConfig::new())?)
    }

    pub fn validate(&self) -> Result<(), ConfigErrors> {
        if !(self.fault_threshold.is_finite() && self.fault_threshold > 0.0) {
            return Err(ConfigErrors::FaultThreshold(self.fault_threshold));
        }
        if !(self.max_torque.is_finite() && self.max_torque > 0.0) {
            return Err(ConfigErrors::MaxTorque(self.max_torque));
        }
        if !self.gains.is_valid() {
            return Err(ConfigErrors::Gains(self.gains));
        }
        Ok(())
    }
}
