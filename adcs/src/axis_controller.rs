use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
struct Parameters {
    // Control gains
    k_p: f32,
    k_i: f32,
    k_d: f32,
    // Output bounds
    low: f32,
    high: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisControllerState {
    pub integral: f32,
    pub previous_error: f32,
}

/// Single-axis PID regulator with a clamped output.
///
/// The integral term is not limited: it keeps accumulating while the output
/// sits at a bound. Replace the controller (or call [`AxisController::reset`])
/// to clear it.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct AxisController {
    parameters: Parameters,
    state: AxisControllerState,
}

impl AxisController {
    /// Creates an unbounded controller with zeroed history.
    pub fn new(k_p: f32, k_i: f32, k_d: f32) -> Self {
        Self {
            parameters: Parameters {
                k_p,
                k_i,
                k_d,
                low: f32::NEG_INFINITY,
                high: f32::INFINITY,
            },
            state: AxisControllerState::default(),
        }
    }

    pub fn with_limits(mut self, low: f32, high: f32) -> Self {
        self.set_limits(low, high);
        self
    }

    /// Updates the output bounds in place. Accumulated state is untouched.
    /// Inverted or NaN bounds are ignored.
    pub fn set_limits(&mut self, low: f32, high: f32) {
        if low.is_nan() || high.is_nan() || low > high {
            return;
        }
        self.parameters.low = low;
        self.parameters.high = high;
    }

    pub fn compute(&mut self, setpoint: f32, measurement: f32, dt: f32) -> f32 {
        // a non-finite input would poison the integral for good
        if !setpoint.is_finite() || !measurement.is_finite() {
            return 0.0;
        }

        let error = setpoint - measurement;
        let derivative = if dt > 0.0 {
            self.state.integral += error * dt;
            (error - self.state.previous_error) / dt
        } else {
            0.0
        };

        let output = self.parameters.k_p * error
            + self.parameters.k_i * self.state.integral
            + self.parameters.k_d * derivative;

        self.state.previous_error = error;
        output.clamp(self.parameters.low, self.parameters.high)
    }

    /// Clears integral and derivative history.
    pub fn reset(&mut self) {
        self.state = AxisControllerState::default();
    }

    pub fn state(&self) -> &AxisControllerState {
        &self.state
    }

    pub fn limits(&self) -> (f32, f32) {
        (self.parameters.low, self.parameters.high)
    }

    pub fn gains(&self) -> (f32, f32, f32) {
        (self.parameters.k_p, self.parameters.k_i, self.parameters.k_d)
    }
}
