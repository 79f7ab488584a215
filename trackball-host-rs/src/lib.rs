//! Host side of a two-sensor optical trackball.
//!
//! Talks to the trackball's microcontroller over any byte [`Transport`],
//! keeps the latest motion and pixel data, and integrates sensor deltas
//! into per-sensor positions or a free-ball pose.
//!
//! # Architecture
//!
//! - **[`CommandDriver`]**: one query at a time. Writes a command byte and
//!   reads back the response length the command implies, with bounded
//!   waits on every step.
//! - **[`Trackball`]**: an acquisition session. Owns the driver, the motion
//!   buffer, the pixel frame and the odometry state.
//! - **[`acquisition_task`]**: periodic acquisition loop that publishes
//!   snapshots into a [`SharedTrackball`] for other contexts to read.
//!
//! # Quick start
//!
//! ```ignore
//! use trackball::{OdometryConfig, OutputMode};
//! use trackball_host::{DriverConfig, Trackball};
//!
//! let mut trackball = Trackball::new(transport, DriverConfig::default(), OdometryConfig::default());
//! trackball.prepare().await?;
//! let acquired = trackball.acquire(OutputMode::FreeBall).await?;
//! ```
//!
//! # Features
//!
//! - **`defmt`**: logging and [`defmt::Format`] implementations.

#![cfg_attr(not(test), no_std)]

pub use driver::{CommandDriver, DriverConfig, Response, SensorInfo};
pub use error::{HostError, PollTimeout};
pub use session::{AcquiredSample, Trackball, TrackballSnapshot};
pub use shared::SharedTrackball;
pub use task::{acquisition_task, AcquisitionConfig, AcquisitionSummary};
pub use transport::{poll_until, PollPolicy, Transport};

mod driver;
mod error;
mod session;
mod shared;
mod task;
mod transport;

#[cfg(test)]
mod loopback;
#[cfg(test)]
mod testing;
