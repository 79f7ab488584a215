//! Bus abstraction consumed by the dispatcher.

use trackball::protocol::{PIXEL_VALID, SENSOR_COUNT};

use crate::error::BusError;

/// Bytes clocked in from both sensors by one read, plus the auxiliary input
/// sampled straight after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorPair {
    /// One byte per sensor, sensor 0 first.
    pub bytes: [u8; SENSOR_COUNT],
    /// [`AUX_BUTTON_RELEASED`](trackball::protocol::AUX_BUTTON_RELEASED) or zero.
    pub aux: u8,
}

impl SensorPair {
    pub const fn new(bytes: [u8; SENSOR_COUNT], aux: u8) -> Self {
        Self { bytes, aux }
    }

    /// Both sensors flagged their pixel byte as valid.
    pub fn pixel_valid(&self) -> bool {
        self.bytes.iter().all(|b| b & PIXEL_VALID != 0)
    }

    /// Same rule as the host's decoder: any non-zero aux reads as released.
    pub fn button_released(&self) -> bool {
        self.aux != 0
    }
}

/// A synchronous shared bus to the two sensor chips.
///
/// Implemented by [`ShiftBus`](crate::ShiftBus) over GPIO pins; tests use a
/// scripted implementation.
pub trait SensorBus {
    /// Clock one byte out, most-significant bit first.
    fn send_byte(&mut self, value: u8) -> Result<(), BusError>;

    /// Clock eight bits in from both sensors at once.
    fn read_pair(&mut self) -> Result<SensorPair, BusError>;

    /// Return the lines to idle between commands.
    fn release(&mut self) -> Result<(), BusError>;

    /// Address a register and read the reply.
    fn transact(&mut self, register: u8) -> Result<SensorPair, BusError> {
        self.send_byte(register)?;
        self.read_pair()
    }
}

/// Tunable bus timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusTiming {
    /// Pause after every transmitted byte, in nanoseconds. Covers the
    /// sensors' address-to-data delay.
    pub settle_ns: u32,
}

impl Default for BusTiming {
    fn default() -> Self {
        Self { settle_ns: 4_000 }
    }
}
