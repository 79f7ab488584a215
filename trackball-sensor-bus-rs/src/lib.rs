//! Microcontroller side of a two-sensor optical trackball.
//!
//! Two optical chips share one clock, chip-select and data line and answer
//! on separate response lines. This crate bit-bangs that bus and serves the
//! host's one-byte commands over it.
//!
//! # Architecture
//!
//! The crate is split into two layers:
//!
//! - **[`ShiftBus`]**: bit-level primitives over `embedded-hal` GPIO pins
//!   (send a byte MSB-first, read one byte from each chip in lock-step,
//!   release the bus). Any other [`SensorBus`] implementation can stand in.
//! - **[`CommandDispatcher`]**: the command state machine. Decodes a host
//!   byte into a [`Command`](trackball::Command), runs the bus routine and
//!   relays the response over a [`HostLink`].
//!
//! # Quick start
//!
//! ```ignore
//! use sensor_bus::{BusPins, BusTiming, CommandDispatcher, DispatcherConfig, ShiftBus};
//!
//! let bus = ShiftBus::new(pins, delay, BusTiming::default());
//! let mut dispatcher = CommandDispatcher::new(bus, host_link, DispatcherConfig::default());
//! dispatcher.run().await;
//! ```
//!
//! # Features
//!
//! - **`defmt`**: logging and [`defmt::Format`] implementations.

#![cfg_attr(not(test), no_std)]

pub use bus::{BusTiming, SensorBus, SensorPair};
pub use dispatcher::{CommandDispatcher, DispatcherConfig, PixelPollPolicy};
pub use error::{BusError, DispatchError};
pub use link::HostLink;
pub use shift::{BusPins, ShiftBus};

mod bus;
mod dispatcher;
mod error;
mod link;
mod shift;
