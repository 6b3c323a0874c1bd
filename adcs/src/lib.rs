//! Attitude determination and control core.
//!
//! One [`Supervisor`] per spacecraft consumes a [`SensorSample`] per control
//! cycle and exposes the resulting [`ActuatorCommand`]. Transport, scheduling
//! and process lifecycle belong to the caller.

pub mod actuator;
pub mod axis_controller;
pub mod config;
pub mod control;
pub mod fault;
pub mod mode;
pub mod sensor;
pub mod supervisor;

pub use actuator::{ActuatorCommand, ActuatorOutputs};
pub use axis_controller::AxisController;
pub use config::{AdcsConfig, ConfigErrors};
pub use control::{ControlFsw, ControlGains};
pub use fault::FaultFlags;
pub use mode::ControlMode;
pub use sensor::{SensorSample, SensorState};
pub use supervisor::{AdcsTelemetry, Supervisor};
