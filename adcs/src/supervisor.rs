use adcs_result::{AdcsResult, ResultErrors, ResultManager};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    actuator::{ActuatorCommand, ActuatorOutputs},
    config::AdcsConfig,
    control::{ControlFsw, ControlGains},
    fault::{FaultCounters, FaultFlags},
    mode::ControlMode,
    sensor::{SensorSample, SensorState},
};

/// More invalid samples in a row than this forces safe mode.
pub const INVALID_SAMPLE_LIMIT: u32 = 5;
/// More faulted cycles in a row than this forces safe mode.
pub const FAULT_CYCLE_LIMIT: u32 = 3;
/// Control cycles per uptime tick (10 Hz cadence).
pub const CYCLES_PER_UPTIME_TICK: u32 = 10;

/// Read-only health snapshot of the most recently completed cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdcsTelemetry {
    pub mode: ControlMode,
    pub fault_flags: u8,
    pub control_cycles: u32,
    pub uptime_seconds: u32,
    pub consecutive_invalid_samples: u32,
    pub consecutive_fault_cycles: u32,
}

/// Safety layer around the control law engine.
///
/// Validates every delivered sample, runs fault detection ahead of the control
/// law so that a forced safe mode applies in the same cycle, bounds the
/// outputs and keeps the cycle/uptime counters. Callers own the instance and
/// serialize access to it.
#[derive(Debug)]
pub struct Supervisor {
    control: ControlFsw,
    sensors: SensorState,
    outputs: ActuatorOutputs,
    mode: ControlMode,
    fault_flags: FaultFlags,
    counters: FaultCounters,
    control_cycles: u32,
    uptime_seconds: u32,
    fault_threshold: f32,
    max_torque: f32,
    safe_mode_entries: u32,
    result_id: Option<u32>,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new(&AdcsConfig::default())
    }
}

impl Supervisor {
    /// Builds a supervisor from a startup configuration. Out-of-range values
    /// in `config` fall back to the defaults, the same way the runtime setters
    /// ignore them; use [`AdcsConfig::validate`] to reject them up front.
    pub fn new(config: &AdcsConfig) -> Self {
        let defaults = AdcsConfig::default();
        let mut supervisor = Self {
            control: ControlFsw::new(defaults.gains, defaults.max_torque),
            sensors: SensorState::default(),
            outputs: ActuatorOutputs::zeros(),
            mode: config.initial_mode,
            fault_flags: FaultFlags::empty(),
            counters: FaultCounters::default(),
            control_cycles: 0,
            uptime_seconds: 0,
            fault_threshold: defaults.fault_threshold,
            max_torque: defaults.max_torque,
            safe_mode_entries: 0,
            result_id: None,
        };
        supervisor.set_gains(config.gains);
        supervisor.set_max_torque(config.max_torque);
        supervisor.set_fault_threshold(config.fault_threshold);
        info!(mode = %supervisor.mode, "adcs supervisor initialized");
        supervisor
    }

    /// Runs one control cycle for a delivered sample.
    pub fn process_sample(&mut self, sample: &SensorSample) {
        if !sample.valid {
            self.counters.invalid_samples = self.counters.invalid_samples.saturating_add(1);
            debug!(
                timestamp = sample.timestamp,
                consecutive = self.counters.invalid_samples,
                "dropped invalid sensor sample"
            );
            if self.counters.invalid_samples > INVALID_SAMPLE_LIMIT {
                self.force_safe("repeated invalid sensor samples");
            }
            return;
        }

        self.sensors = SensorState::from(sample);
        self.counters.invalid_samples = 0;

        // must run before the control law reads the mode
        self.detect_faults();

        let mut outputs = self.control.run(self.mode, &self.sensors);
        outputs.clamp(self.max_torque);
        self.outputs = outputs;

        self.control_cycles = self.control_cycles.wrapping_add(1);
        self.update_health();
    }

    fn detect_faults(&mut self) {
        self.fault_flags = FaultFlags::detect(&self.sensors, self.fault_threshold);

        if self.fault_flags.is_empty() {
            self.counters.fault_cycles = 0;
            return;
        }

        self.counters.fault_cycles = self.counters.fault_cycles.saturating_add(1);
        if self.counters.fault_cycles > FAULT_CYCLE_LIMIT && !self.mode.is_safe() {
            self.force_safe("persistent sensor faults");
        }
    }

    fn force_safe(&mut self, cause: &str) {
        if self.mode.is_safe() {
            return;
        }
        warn!(
            cause,
            previous_mode = %self.mode,
            fault_flags = self.fault_flags.bits(),
            invalid_samples = self.counters.invalid_samples,
            fault_cycles = self.counters.fault_cycles,
            "entering safe mode"
        );
        self.mode = ControlMode::Safe;
        self.safe_mode_entries += 1;
    }

    fn update_health(&mut self) {
        if self.control_cycles != 0 && self.control_cycles % CYCLES_PER_UPTIME_TICK == 0 {
            self.uptime_seconds = self.uptime_seconds.wrapping_add(1);
        }
    }

    /// Copy of the last bounded outputs, stamped with the cycle count.
    pub fn actuator_commands(&self) -> ActuatorCommand {
        ActuatorCommand::new(&self.outputs, self.control_cycles)
    }

    /// Mode request in the raw bus encoding. Values outside `0..=3` are
    /// ignored.
    pub fn set_control_mode(&mut self, raw_mode: i32) {
        match ControlMode::try_from_raw(raw_mode) {
            Some(mode) => self.request_mode(mode),
            None => debug!(raw_mode, "rejected control mode request"),
        }
    }

    pub fn request_mode(&mut self, mode: ControlMode) {
        if mode != self.mode {
            info!(from = %self.mode, to = %mode, "control mode set");
        }
        self.mode = mode;
    }

    /// Ignored unless positive and finite.
    pub fn set_fault_threshold(&mut self, threshold: f32) {
        if !(threshold.is_finite() && threshold > 0.0) {
            debug!(threshold, "rejected fault threshold");
            return;
        }
        self.fault_threshold = threshold;
    }

    /// Rebuilds the pointing controllers with new gains, see
    /// [`ControlFsw::set_gains`].
    pub fn set_gains(&mut self, gains: ControlGains) {
        self.control.set_gains(gains);
    }

    /// Updates both the output bound and the pointing controllers' limits.
    /// Ignored unless positive and finite.
    pub fn set_max_torque(&mut self, max_torque: f32) {
        if !(max_torque.is_finite() && max_torque > 0.0) {
            debug!(max_torque, "rejected max torque");
            return;
        }
        self.max_torque = max_torque;
        self.control.set_max_torque(max_torque);
    }

    pub fn fault_flags(&self) -> FaultFlags {
        self.fault_flags
    }

    pub fn control_cycles(&self) -> u32 {
        self.control_cycles
    }

    pub fn control_mode(&self) -> ControlMode {
        self.mode
    }

    pub fn uptime_seconds(&self) -> u32 {
        self.uptime_seconds
    }

    pub fn consecutive_invalid_samples(&self) -> u32 {
        self.counters.invalid_samples
    }

    pub fn consecutive_fault_cycles(&self) -> u32 {
        self.counters.fault_cycles
    }

    /// Number of automatic transitions into safe mode so far.
    pub fn safe_mode_entries(&self) -> u32 {
        self.safe_mode_entries
    }

    pub fn fault_threshold(&self) -> f32 {
        self.fault_threshold
    }

    pub fn max_torque(&self) -> f32 {
        self.max_torque
    }

    pub fn sensors(&self) -> &SensorState {
        &self.sensors
    }

    pub fn control(&self) -> &ControlFsw {
        &self.control
    }

    pub fn telemetry(&self) -> AdcsTelemetry {
        AdcsTelemetry {
            mode: self.mode,
            fault_flags: self.fault_flags.bits(),
            control_cycles: self.control_cycles,
            uptime_seconds: self.uptime_seconds,
            consecutive_invalid_samples: self.counters.invalid_samples,
            consecutive_fault_cycles: self.counters.fault_cycles,
        }
    }
}

impl AdcsResult for Supervisor {
    fn new_result(&mut self, results: &mut ResultManager) -> Result<(), ResultErrors> {
        let headers = [
            "control_cycles",
            "uptime_seconds",
            "mode",
            "fault_flags",
            "invalid_samples",
            "fault_cycles",
            "wheel_torque[x]",
            "wheel_torque[y]",
            "wheel_torque[z]",
            "magnetorquer[x]",
            "magnetorquer[y]",
            "magnetorquer[z]",
        ];
        let id = results.new_writer("supervisor", &headers)?;
        self.result_id = Some(id);
        self.control.new_result(results)
    }

    fn write_result(&self, results: &mut ResultManager) -> Result<(), ResultErrors> {
        if let Some(id) = self.result_id {
            let command = self.actuator_commands();
            let mut record = vec![
                self.control_cycles.to_string(),
                self.uptime_seconds.to_string(),
                self.mode.to_string(),
                self.fault_flags.bits().to_string(),
                self.counters.invalid_samples.to_string(),
                self.counters.fault_cycles.to_string(),
            ];
            record.extend(command.wheel_torques.iter().map(|t| t.to_string()));
            record.extend(command.magnetorquer.iter().map(|m| m.to_string()));
            results.write_record(id, &record)?;
        }
        self.control.write_result(results)
    }
}
