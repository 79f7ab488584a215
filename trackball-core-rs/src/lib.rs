//! Shared model for a two-sensor optical trackball.
//!
//! Both sides of the link build on this crate:
//!
//! - [`protocol`]: register addresses, command bytes and response lengths
//!   agreed between the sensor-bus firmware and the host driver.
//! - [`motion`]: decoding of motion responses and the accumulated
//!   per-sensor [`MotionBuffer`](motion::MotionBuffer).
//! - [`frame`]: 19×19 pixel frames and their assembler.
//! - [`odometry`]: per-sensor and free-ball integration plus the trailing
//!   trajectory history.
//!
//! # `no_std` Compatibility
//!
//! No heap allocation; all storage is fixed-size. Floating-point maths goes
//! through `libm`. The optional `defmt` feature derives `defmt::Format` for
//! the public types.

#![cfg_attr(not(test), no_std)]

pub mod error;
pub mod frame;
pub mod motion;
pub mod odometry;
pub mod protocol;

pub use error::FrameError;
pub use frame::{FrameAssembler, PixelFrame};
pub use motion::{MotionBuffer, MotionSample};
pub use odometry::{
    Odometry, OdometryConfig, OdometryOutput, OutputMode, Pose, TracePoint, TrajectoryHistory,
};
pub use protocol::{ChipModel, Command, ResponseLen};
