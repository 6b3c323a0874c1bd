use std::io::Read;

use adcs::{ControlMode, SensorSample, Supervisor};
use adcs_result::{AdcsResult, ResultManager};
use nalgebra::Vector3;
use serde::Deserialize;
use tracing::{debug, info};

use crate::AppErrors;

/// One row of a sensor replay file.
///
/// `valid` follows the bus encoding (0 = invalid). A present `mode_request`
/// is handed to the supervisor before the row's sample.
#[derive(Clone, Debug, Deserialize)]
pub struct SampleRecord {
    pub timestamp: u32,
    pub gyro_x: f32,
    pub gyro_y: f32,
    pub gyro_z: f32,
    pub mag_x: f32,
    pub mag_y: f32,
    pub mag_z: f32,
    pub sun_angle: f32,
    pub valid: u8,
    #[serde(default)]
    pub mode_request: Option<i32>,
}

impl From<&SampleRecord> for SensorSample {
    fn from(record: &SampleRecord) -> Self {
        SensorSample {
            gyro: Vector3::new(record.gyro_x, record.gyro_y, record.gyro_z),
            magnetometer: Vector3::new(record.mag_x, record.mag_y, record.mag_z),
            sun_angle: record.sun_angle,
            timestamp: record.timestamp,
            valid: record.valid != 0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub rows: u32,
    pub valid_samples: u32,
    pub invalid_samples: u32,
    pub final_mode: ControlMode,
    pub final_fault_flags: u8,
    pub control_cycles: u32,
    pub uptime_seconds: u32,
    pub safe_mode_entries: u32,
}

/// Feeds every row of `reader` through `supervisor` as one control cycle,
/// recording telemetry after each row when `results` is given.
pub fn replay<R: Read>(
    reader: R,
    supervisor: &mut Supervisor,
    mut results: Option<&mut ResultManager>,
) -> Result<ReplaySummary, AppErrors> {
    if let Some(results) = results.as_deref_mut() {
        supervisor.new_result(results)?;
    }

    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut summary = ReplaySummary::default();
    for record in csv_reader.deserialize::<SampleRecord>() {
        let record = record?;
        summary.rows += 1;

        if let Some(mode) = record.mode_request {
            supervisor.set_control_mode(mode);
        }

        let sample = SensorSample::from(&record);
        if sample.valid {
            summary.valid_samples += 1;
        } else {
            summary.invalid_samples += 1;
        }
        supervisor.process_sample(&sample);

        let command = supervisor.actuator_commands();
        debug!(
            timestamp = record.timestamp,
            cycle = command.timestamp,
            mode = %supervisor.control_mode(),
            wheel_torques = ?command.wheel_torques.as_slice(),
            magnetorquer = ?command.magnetorquer.as_slice(),
            "cycle complete"
        );

        if let Some(results) = results.as_deref_mut() {
            supervisor.write_result(results)?;
        }
    }

    if let Some(results) = results {
        results.flush()?;
    }

    let telemetry = supervisor.telemetry();
    summary.final_mode = telemetry.mode;
    summary.final_fault_flags = telemetry.fault_flags;
    summary.control_cycles = telemetry.control_cycles;
    summary.uptime_seconds = telemetry.uptime_seconds;
    summary.safe_mode_entries = supervisor.safe_mode_entries();

    info!(
        rows = summary.rows,
        valid = summary.valid_samples,
        invalid = summary.invalid_samples,
        mode = %summary.final_mode,
        fault_flags = summary.final_fault_flags,
        cycles = summary.control_cycles,
        uptime = summary.uptime_seconds,
        safe_mode_entries = summary.safe_mode_entries,
        "replay finished"
    );
    Ok(summary)
}
