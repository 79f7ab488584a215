//! Ball odometry from the two sensors' motion stream.
//!
//! The two sensors sit on the ball at right angles. In **free-ball** mode
//! their X deltas are read as rotation about the vertical axis (heading) and
//! their Y deltas as rolling (travel), and the integrator dead-reckons a 2D
//! trajectory:
//!
//! ```text
//! rot_i    = last_dx[i] / cal_i          roll_i = last_dy[i] / cal_i
//! distance = C * sqrt(roll_0² + roll_1²)
//! x       += distance * cos(heading)
//! y       += distance * sin(heading)
//! heading += π * (rot_0 + rot_1)         (then one wrap step into [0, 2π])
//! ```
//!
//! In **per-sensor** mode no cross-sensor maths is done; each sensor's
//! accumulated position is reported as-is.
//!
//! Switching mode never resets the motion buffer or the pose, so flipping
//! back and forth loses nothing.

mod history;
mod integrator;

pub use history::{TracePoint, TrajectoryHistory};
pub use integrator::{Odometry, OdometryOutput, Pose};

use crate::protocol::SENSOR_COUNT;

/// Default number of trace points kept for rendering.
pub const TRACE_LENGTH: usize = 500;

/// Which odometry output the integrator produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputMode {
    /// Independent accumulated positions, one per sensor.
    #[default]
    PerSensor,
    /// One heading and position for the whole ball.
    FreeBall,
}

impl OutputMode {
    pub fn toggled(self) -> Self {
        match self {
            OutputMode::PerSensor => OutputMode::FreeBall,
            OutputMode::FreeBall => OutputMode::PerSensor,
        }
    }
}

/// Constants injected into the integrator.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OdometryConfig {
    /// Counts per full ball rotation, per sensor.
    pub calibration: [f64; SENSOR_COUNT],
    /// Ball circumference in millimetres.
    pub circumference_mm: f64,
    /// Scale applied to per-sensor trace points.
    pub sensitivity: f64,
}

impl Default for OdometryConfig {
    fn default() -> Self {
        Self {
            calibration: [1000.0, 1000.0],
            circumference_mm: 152.9955,
            sensitivity: 500.0,
        }
    }
}
