use core::f64::consts::PI;

use super::history::{TracePoint, TrajectoryHistory};
use super::{OdometryConfig, OutputMode};
use crate::motion::MotionBuffer;
use crate::protocol::SENSOR_COUNT;

const TWO_PI: f64 = 2.0 * PI;

/// Dead-reckoned ball pose.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pose {
    /// Radians, kept in `[0, 2π]` by a single wrap step per tick.
    pub heading: f64,
    pub x: f64,
    pub y: f64,
}

impl Pose {
    pub const ORIGIN: Pose = Pose {
        heading: 0.0,
        x: 0.0,
        y: 0.0,
    };

    /// Advance by one tick of motion.
    ///
    /// Travel is applied along the heading held *before* this tick's
    /// rotation. The wrap is one conditional add or subtract, not a modulo:
    /// a tick that swings the heading by more than a full turn leaves it
    /// outside `[0, 2π]`.
    pub fn advance(
        self,
        last_dx: [i32; SENSOR_COUNT],
        last_dy: [i32; SENSOR_COUNT],
        config: &OdometryConfig,
    ) -> Pose {
        let [cal0, cal1] = config.calibration;
        let rot0 = f64::from(last_dx[0]) / cal0;
        let rot1 = f64::from(last_dx[1]) / cal1;
        let roll0 = f64::from(last_dy[0]) / cal0;
        let roll1 = f64::from(last_dy[1]) / cal1;

        let distance = config.circumference_mm * libm::sqrt(roll0 * roll0 + roll1 * roll1);
        let delta_heading = PI * (rot0 + rot1);

        let x = self.x + distance * libm::cos(self.heading);
        let y = self.y + distance * libm::sin(self.heading);

        let mut heading = self.heading + delta_heading;
        if heading < 0.0 {
            heading += TWO_PI;
        }
        if heading > TWO_PI {
            heading -= TWO_PI;
        }

        Pose { heading, x, y }
    }

    /// Trace point for the free-ball trajectory (half-millimetre grid).
    pub fn trace_point(&self) -> TracePoint {
        TracePoint::new(round_to_i32(self.x * 2.0), round_to_i32(self.y * 2.0))
    }
}

/// Result of one integrator tick.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OdometryOutput {
    /// Accumulated position of each sensor, untouched.
    PerSensor {
        x: [i32; SENSOR_COUNT],
        y: [i32; SENSOR_COUNT],
    },
    FreeBall(Pose),
}

/// Consumes motion ticks and keeps the pose plus the trailing trace.
#[derive(Debug, Clone)]
pub struct Odometry {
    config: OdometryConfig,
    pose: Pose,
    history: TrajectoryHistory,
}

impl Default for Odometry {
    fn default() -> Self {
        Self::new(OdometryConfig::default())
    }
}

impl Odometry {
    pub fn new(config: OdometryConfig) -> Self {
        Self {
            config,
            pose: Pose::ORIGIN,
            history: TrajectoryHistory::new(),
        }
    }

    pub fn config(&self) -> &OdometryConfig {
        &self.config
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn history(&self) -> &TrajectoryHistory {
        &self.history
    }

    /// Run one tick against the buffer state after the latest motion query.
    pub fn update(&mut self, mode: OutputMode, motion: &MotionBuffer) -> OdometryOutput {
        match mode {
            OutputMode::FreeBall => {
                self.pose = self.pose.advance(motion.last_dx, motion.last_dy, &self.config);
                self.history.push_front(self.pose.trace_point());
                OdometryOutput::FreeBall(self.pose)
            }
            OutputMode::PerSensor => {
                self.history.push_front(self.sensor_trace_point(motion));
                OdometryOutput::PerSensor {
                    x: motion.x,
                    y: motion.y,
                }
            }
        }
    }

    /// Back to the origin with an empty trace.
    pub fn reset(&mut self) {
        self.pose = Pose::ORIGIN;
        self.history.clear();
    }

    // Each sensor's accumulated Y, scaled by the display sensitivity, drives
    // one axis of the trace.
    fn sensor_trace_point(&self, motion: &MotionBuffer) -> TracePoint {
        let [cal0, cal1] = self.config.calibration;
        let sens = self.config.sensitivity;
        TracePoint::new(
            round_to_i32(f64::from(motion.y[0]) * sens / cal0),
            round_to_i32(f64::from(motion.y[1]) * sens / cal1),
        )
    }
}

fn round_to_i32(value: f64) -> i32 {
    libm::round(value) as i32
}
