use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Symmetric bound on the normalized magnetorquer command.
pub const MAGNETORQUER_LIMIT: f32 = 1.0;

/// Raw actuator outputs of one control cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActuatorOutputs {
    /// reaction wheel torques (Nm)
    pub wheel_torques: Vector3<f32>,
    /// normalized magnetorquer commands
    pub magnetorquer: Vector3<f32>,
}

impl ActuatorOutputs {
    pub fn zeros() -> Self {
        Self::default()
    }

    /// Bounds wheel torques to `±max_torque` and the magnetorquer to
    /// `±MAGNETORQUER_LIMIT`. Non-finite components are zeroed.
    pub fn clamp(&mut self, max_torque: f32) {
        for i in 0..3 {
            self.wheel_torques[i] = clamp_finite(self.wheel_torques[i], max_torque);
            self.magnetorquer[i] = clamp_finite(self.magnetorquer[i], MAGNETORQUER_LIMIT);
        }
    }
}

fn clamp_finite(value: f32, limit: f32) -> f32 {
    if value.is_finite() {
        value.clamp(-limit, limit)
    } else {
        0.0
    }
}

/// Command snapshot handed to the actuator collaborator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActuatorCommand {
    pub wheel_torques: Vector3<f32>,
    pub magnetorquer: Vector3<f32>,
    /// control cycle count at the time of the snapshot
    pub timestamp: u32,
}

impl ActuatorCommand {
    pub fn new(outputs: &ActuatorOutputs, timestamp: u32) -> Self {
        Self {
            wheel_torques: outputs.wheel_torques,
            magnetorquer: outputs.magnetorquer,
            timestamp,
        }
    }
}
