use adcs_result::{AdcsResult, ResultErrors, ResultManager};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    actuator::{ActuatorOutputs, MAGNETORQUER_LIMIT},
    axis_controller::AxisController,
    mode::ControlMode,
    sensor::SensorState,
};

/// Nominal control period (s). Both the B-dot difference and the PID
/// derivative assume the caller runs at this cadence (10 Hz).
pub const CONTROL_PERIOD: f32 = 0.1;
/// Integral gain of the pointing controllers, not externally tunable.
pub const POINT_INTEGRAL_GAIN: f32 = 0.01;
/// Science mode scales the pointing torque by this factor ...
pub const SCIENCE_TORQUE_SCALE: f32 = 0.5;
/// ... and then bounds it to this ceiling (Nm).
pub const SCIENCE_TORQUE_LIMIT: f32 = 0.05;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlGains {
    pub kp_detumble: f32,
    pub kp_point: f32,
    pub kd_point: f32,
}

impl Default for ControlGains {
    fn default() -> Self {
        Self {
            kp_detumble: 0.1,
            kp_point: 0.05,
            kd_point: 0.01,
        }
    }
}

impl ControlGains {
    pub fn new(kp_detumble: f32, kp_point: f32, kd_point: f32) -> Self {
        Self { kp_detumble, kp_point, kd_point }
    }

    /// Gains must be finite and non-negative.
    pub fn is_valid(&self) -> bool {
        [self.kp_detumble, self.kp_point, self.kd_point]
            .iter()
            .all(|k| k.is_finite() && *k >= 0.0)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
struct Parameters {
    gains: ControlGains,
    max_torque: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetumbleState {
    pub previous_magnetometer: Vector3<f32>,
    pub first_reading: bool,
}

impl Default for DetumbleState {
    fn default() -> Self {
        Self {
            previous_magnetometer: Vector3::zeros(),
            first_reading: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct State {
    pub detumble: DetumbleState,
    pub outputs: ActuatorOutputs,
}

/// Attitude control law engine: one axis controller per body axis plus the
/// detumble memory, dispatched on the control mode.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ControlFsw {
    parameters: Parameters,
    axes: [AxisController; 3],
    pub state: State,
    #[serde(skip)]
    result_id: Option<u32>,
}

impl Default for ControlFsw {
    fn default() -> Self {
        Self::new(ControlGains::default(), 0.1)
    }
}

impl ControlFsw {
    pub fn new(gains: ControlGains, max_torque: f32) -> Self {
        Self {
            parameters: Parameters { gains, max_torque },
            axes: Self::build_axes(&gains, max_torque),
            state: State::default(),
            result_id: None,
        }
    }

    fn build_axes(gains: &ControlGains, max_torque: f32) -> [AxisController; 3] {
        let axis = AxisController::new(gains.kp_point, POINT_INTEGRAL_GAIN, gains.kd_point)
            .with_limits(-max_torque, max_torque);
        [axis; 3]
    }

    /// Computes the raw actuator outputs for one cycle.
    pub fn run(&mut self, mode: ControlMode, sensors: &SensorState) -> ActuatorOutputs {
        let mut outputs = ActuatorOutputs::zeros();

        match mode {
            ControlMode::Safe => {}
            ControlMode::Detumble => {
                outputs.magnetorquer = self.detumble(&sensors.magnetometer);
            }
            ControlMode::Point => {
                outputs.wheel_torques = self.point(&sensors.gyro);
            }
            ControlMode::Science => {
                outputs.wheel_torques = self.science(&sensors.gyro);
            }
        }

        self.state.outputs = outputs;
        outputs
    }

    /// Same as [`ControlFsw::run`] for a raw bus mode value; anything outside
    /// the known modes runs the safe law.
    pub fn run_raw(&mut self, raw_mode: i32, sensors: &SensorState) -> ActuatorOutputs {
        self.run(ControlMode::from_raw(raw_mode), sensors)
    }

    // B-dot
    fn detumble(&mut self, magnetometer: &Vector3<f32>) -> Vector3<f32> {
        let mut magnetorquer = Vector3::zeros();

        // keep the reference field clean, a NaN here would fault the next cycle too
        if !magnetometer.iter().all(|b| b.is_finite()) {
            return magnetorquer;
        }

        let detumble = &mut self.state.detumble;
        if detumble.first_reading {
            detumble.previous_magnetometer = *magnetometer;
            detumble.first_reading = false;
            return magnetorquer;
        }

        for i in 0..3 {
            let b_dot = (magnetometer[i] - detumble.previous_magnetometer[i]) / CONTROL_PERIOD;
            magnetorquer[i] = (-self.parameters.gains.kp_detumble * b_dot)
                .clamp(-MAGNETORQUER_LIMIT, MAGNETORQUER_LIMIT);
            detumble.previous_magnetometer[i] = magnetometer[i];
        }
        magnetorquer
    }

    // rate damping towards zero body rate
    fn point(&mut self, gyro: &Vector3<f32>) -> Vector3<f32> {
        let mut torques = Vector3::zeros();
        for (i, axis) in self.axes.iter_mut().enumerate() {
            torques[i] = axis.compute(0.0, gyro[i], CONTROL_PERIOD);
        }
        torques
    }

    fn science(&mut self, gyro: &Vector3<f32>) -> Vector3<f32> {
        self.point(gyro)
            .map(|torque| (torque * SCIENCE_TORQUE_SCALE).clamp(-SCIENCE_TORQUE_LIMIT, SCIENCE_TORQUE_LIMIT))
    }

    /// Replaces all three axis controllers with fresh ones built from `gains`,
    /// discarding their integral and derivative history. Invalid gains are
    /// ignored.
    pub fn set_gains(&mut self, gains: ControlGains) {
        if !gains.is_valid() {
            debug!(?gains, "rejected control gains");
            return;
        }
        self.parameters.gains = gains;
        self.axes = Self::build_axes(&gains, self.parameters.max_torque);
        info!(
            kp_detumble = gains.kp_detumble,
            kp_point = gains.kp_point,
            kd_point = gains.kd_point,
            "control gains updated"
        );
    }

    /// Moves the axis controllers' output bounds to `±max_torque`, keeping
    /// their history. Non-positive or non-finite values are ignored.
    pub fn set_max_torque(&mut self, max_torque: f32) {
        if !(max_torque.is_finite() && max_torque > 0.0) {
            debug!(max_torque, "rejected max torque");
            return;
        }
        self.parameters.max_torque = max_torque;
        for axis in self.axes.iter_mut() {
            axis.set_limits(-max_torque, max_torque);
        }
    }

    /// Re-arms the detumble bootstrap and clears the axis controllers.
    pub fn reset(&mut self) {
        self.state = State::default();
        for axis in self.axes.iter_mut() {
            axis.reset();
        }
    }

    pub fn gains(&self) -> ControlGains {
        self.parameters.gains
    }

    pub fn max_torque(&self) -> f32 {
        self.parameters.max_torque
    }

    pub fn axes(&self) -> &[AxisController; 3] {
        &self.axes
    }
}

impl AdcsResult for ControlFsw {
    fn new_result(&mut self, results: &mut ResultManager) -> Result<(), ResultErrors> {
        let headers = [
            "integral[x]",
            "integral[y]",
            "integral[z]",
            "previous_error[x]",
            "previous_error[y]",
            "previous_error[z]",
            "previous_magnetometer[x]",
            "previous_magnetometer[y]",
            "previous_magnetometer[z]",
            "wheel_torque[x]",
            "wheel_torque[y]",
            "wheel_torque[z]",
            "magnetorquer[x]",
            "magnetorquer[y]",
            "magnetorquer[z]",
        ];
        let id = results.new_writer("control", &headers)?;
        self.result_id = Some(id);
        Ok(())
    }

    fn write_result(&self, results: &mut ResultManager) -> Result<(), ResultErrors> {
        let Some(id) = self.result_id else {
            return Ok(());
        };
        let mut record = Vec::with_capacity(15);
        record.extend(
            self.axes
                .iter()
                .map(|axis| axis.state().integral.to_string()),
        );
        record.extend(
            self.axes
                .iter()
                .map(|axis| axis.state().previous_error.to_string()),
        );
        record.extend(
            self.state
                .detumble
                .previous_magnetometer
                .iter()
                .map(|b| b.to_string()),
        );
        record.extend(
            self.state
                .outputs
                .wheel_torques
                .iter()
                .map(|t| t.to_string()),
        );
        record.extend(
            self.state
                .outputs
                .magnetorquer
                .iter()
                .map(|m| m.to_string()),
        );
        results.write_record(id, &record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use utilities::{assert_equal, assert_vector_equal};

    fn sensors(gyro: [f32; 3], mag: [f32; 3]) -> SensorState {
        SensorState::new(Vector3::from(gyro), Vector3::from(mag), 0.0)
    }

    #[test]
    fn test_safe_is_zero() {
        let mut control = ControlFsw::default();
        let outputs = control.run(ControlMode::Safe, &sensors([0.3, -0.3, 0.2], [1.0, 2.0, 3.0]));
        assert_eq!(outputs, ActuatorOutputs::zeros());
    }

    #[test]
    fn test_unknown_raw_mode_matches_safe() {
        let input = sensors([0.3, -0.3, 0.2], [1.0, 2.0, 3.0]);
        for raw in [-5, -1, 4, 99] {
            let mut control = ControlFsw::default();
            assert_eq!(control.run_raw(raw, &input), ActuatorOutputs::zeros());
        }
    }

    #[test]
    fn test_detumble_bootstrap() {
        let mut control = ControlFsw::default();
        let outputs = control.run(ControlMode::Detumble, &sensors([0.0; 3], [40.0, -12.0, 7.0]));
        assert_eq!(outputs, ActuatorOutputs::zeros());
        assert!(!control.state.detumble.first_reading);
        assert_vector_equal(
            &control.state.detumble.previous_magnetometer,
            [40.0, -12.0, 7.0],
        );
    }

    #[test]
    fn test_detumble_bdot() {
        let mut control = ControlFsw::new(ControlGains::new(0.1, 0.05, 0.01), 0.1);
        control.run(ControlMode::Detumble, &sensors([0.0; 3], [1.0, 0.0, 0.0]));
        let outputs = control.run(ControlMode::Detumble, &sensors([0.0; 3], [2.0, 0.0, 0.0]));
        assert_vector_equal(&outputs.magnetorquer, [-1.0, 0.0, 0.0]);
        assert_vector_equal(&outputs.wheel_torques, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_detumble_unsaturated() {
        let mut control = ControlFsw::new(ControlGains::new(0.1, 0.05, 0.01), 0.1);
        control.run(ControlMode::Detumble, &sensors([0.0; 3], [1.0, 1.0, 1.0]));
        let outputs = control.run(ControlMode::Detumble, &sensors([0.0; 3], [1.0, 1.02, 0.95]));
        // bdot = (0, 0.2, -0.5)
        assert_equal(outputs.magnetorquer[0], 0.0);
        assert_equal(outputs.magnetorquer[1], -0.02);
        assert_equal(outputs.magnetorquer[2], 0.05);
    }

    #[test]
    fn test_detumble_skips_non_finite_reading() {
        let mut control = ControlFsw::default();
        control.run(ControlMode::Detumble, &sensors([0.0; 3], [1.0, 0.0, 0.0]));
        let outputs = control.run(ControlMode::Detumble, &sensors([0.0; 3], [f32::NAN, 0.0, 0.0]));
        assert_eq!(outputs, ActuatorOutputs::zeros());
        assert_vector_equal(&control.state.detumble.previous_magnetometer, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_point_damps_rate() {
        let mut control = ControlFsw::default();
        let outputs = control.run(ControlMode::Point, &sensors([0.01, -0.01, 0.0], [0.0; 3]));
        // error = -0.01: kp*e + ki*e*dt + kd*e/dt
        let expected = 0.05 * -0.01 + 0.01 * -0.001 + 0.01 * -0.1;
        assert_equal(outputs.wheel_torques[0], expected);
        assert_equal(outputs.wheel_torques[1], -expected);
        assert_equal(outputs.wheel_torques[2], 0.0);
        assert_eq!(outputs.magnetorquer, Vector3::zeros());
    }

    #[test]
    fn test_point_limited_by_max_torque() {
        let mut control = ControlFsw::default();
        let outputs = control.run(ControlMode::Point, &sensors([5.0, -5.0, 0.0], [0.0; 3]));
        assert_vector_equal(&outputs.wheel_torques, [-0.1, 0.1, 0.0]);
    }

    #[test]
    fn test_science_scales_and_limits() {
        // kp = 1 and a -0.2 rad/s rate gives 0.2 Nm before scaling
        let mut control = ControlFsw::new(ControlGains::new(0.1, 1.0, 0.0), 1.0);
        control.axes = [AxisController::new(1.0, 0.0, 0.0).with_limits(-1.0, 1.0); 3];
        let outputs = control.run(ControlMode::Science, &sensors([-0.2, 0.06, -0.04], [0.0; 3]));
        assert_equal(outputs.wheel_torques[0], 0.05);
        assert_equal(outputs.wheel_torques[1], -0.03);
        assert_equal(outputs.wheel_torques[2], 0.02);
    }

    #[test]
    fn test_set_gains_resets_integral() {
        let mut control = ControlFsw::default();
        for _ in 0..5 {
            control.run(ControlMode::Point, &sensors([0.02, 0.0, 0.0], [0.0; 3]));
        }
        assert!(control.axes()[0].state().integral != 0.0);

        control.set_gains(ControlGains::new(0.2, 0.1, 0.02));
        assert_eq!(control.axes()[0].state().integral, 0.0);
        assert_eq!(control.axes()[0].gains(), (0.1, POINT_INTEGRAL_GAIN, 0.02));
        assert_eq!(control.axes()[0].limits(), (-0.1, 0.1));
        assert_eq!(control.gains().kp_detumble, 0.2);
    }

    #[test]
    fn test_set_gains_rejects_invalid() {
        let mut control = ControlFsw::default();
        control.set_gains(ControlGains::new(f32::NAN, 0.1, 0.1));
        control.set_gains(ControlGains::new(0.1, -0.1, 0.1));
        assert_eq!(control.gains(), ControlGains::default());
    }

    #[test]
    fn test_set_max_torque_keeps_integral() {
        let mut control = ControlFsw::default();
        for _ in 0..5 {
            control.run(ControlMode::Point, &sensors([0.02, 0.0, 0.0], [0.0; 3]));
        }
        let integral = control.axes()[0].state().integral;

        control.set_max_torque(0.2);
        assert_eq!(control.axes()[0].state().integral, integral);
        assert_eq!(control.axes()[2].limits(), (-0.2, 0.2));
        assert_eq!(control.max_torque(), 0.2);

        control.set_max_torque(0.0);
        control.set_max_torque(-1.0);
        assert_eq!(control.max_torque(), 0.2);
    }

    #[test]
    fn test_reset_rearms_bootstrap() {
        let mut control = ControlFsw::default();
        control.run(ControlMode::Detumble, &sensors([0.0; 3], [1.0, 0.0, 0.0]));
        control.reset();
        let outputs = control.run(ControlMode::Detumble, &sensors([0.0; 3], [5.0, 0.0, 0.0]));
        assert_eq!(outputs, ActuatorOutputs::zeros());
    }

    #[test]
    fn test_detumble_state_survives_other_modes() {
        let mut control = ControlFsw::default();
        control.run(ControlMode::Detumble, &sensors([0.0; 3], [1.0, 0.0, 0.0]));
        control.run(ControlMode::Point, &sensors([0.0; 3], [9.0, 0.0, 0.0]));
        let outputs = control.run(ControlMode::Detumble, &sensors([0.0; 3], [1.5, 0.0, 0.0]));
        // reference is still the last detumble reading
        assert_equal(outputs.magnetorquer[0], -0.5);
    }
}
