//! Bit-banged shift engine.
//!
//! Drives a shared clock, chip-select and data line to both sensors and
//! samples each sensor's response line on every rising clock edge, so the
//! two bytes of a [`SensorPair`] always come from the same pulse train.
//!
//! ```text
//! per bit:  CLK=0 SEL=0 MOSI=0 → MOSI=bit → CLK=1 → (sample MISO0, MISO1)
//! idle:     CLK=1 SEL=1 MOSI=0
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{Error, InputPin, OutputPin};

use trackball::protocol::AUX_BUTTON_RELEASED;

use crate::bus::{BusTiming, SensorBus, SensorPair};
use crate::error::BusError;

/// The GPIO lines of the sensor bus.
pub struct BusPins<CLK, SEL, MOSI, MISO0, MISO1, BTN> {
    pub clock: CLK,
    /// Shared by both sensors; they answer on separate MISO lines.
    pub chip_select: SEL,
    pub mosi: MOSI,
    /// Response line of sensor 0.
    pub miso0: MISO0,
    /// Response line of sensor 1.
    pub miso1: MISO1,
    /// Operator push-button, high while released.
    pub button: BTN,
}

/// [`SensorBus`] implementation over `embedded-hal` pins.
pub struct ShiftBus<CLK, SEL, MOSI, MISO0, MISO1, BTN, D> {
    pins: BusPins<CLK, SEL, MOSI, MISO0, MISO1, BTN>,
    delay: D,
    timing: BusTiming,
}

fn pin_fault<E: Error>(error: E) -> BusError {
    BusError::Pin(error.kind())
}

impl<CLK, SEL, MOSI, MISO0, MISO1, BTN, D> ShiftBus<CLK, SEL, MOSI, MISO0, MISO1, BTN, D>
where
    CLK: OutputPin,
    SEL: OutputPin,
    MOSI: OutputPin,
    MISO0: InputPin,
    MISO1: InputPin,
    BTN: InputPin,
    D: DelayNs,
{
    pub fn new(pins: BusPins<CLK, SEL, MOSI, MISO0, MISO1, BTN>, delay: D, timing: BusTiming) -> Self {
        Self { pins, delay, timing }
    }

    pub fn timing(&self) -> BusTiming {
        self.timing
    }

    /// Give the pins and delay back.
    pub fn release_pins(self) -> (BusPins<CLK, SEL, MOSI, MISO0, MISO1, BTN>, D) {
        (self.pins, self.delay)
    }

    fn rising_edge(&mut self) -> Result<(), BusError> {
        self.pins.clock.set_high().map_err(pin_fault)
    }
}

impl<CLK, SEL, MOSI, MISO0, MISO1, BTN, D> SensorBus for ShiftBus<CLK, SEL, MOSI, MISO0, MISO1, BTN, D>
where
    CLK: OutputPin,
    SEL: OutputPin,
    MOSI: OutputPin,
    MISO0: InputPin,
    MISO1: InputPin,
    BTN: InputPin,
    D: DelayNs,
{
    fn send_byte(&mut self, value: u8) -> Result<(), BusError> {
        for bit in (0..8).rev() {
            self.pins.clock.set_low().map_err(pin_fault)?;
            self.pins.chip_select.set_low().map_err(pin_fault)?;
            self.pins.mosi.set_low().map_err(pin_fault)?;
            if value & (1 << bit) != 0 {
                self.pins.mosi.set_high().map_err(pin_fault)?;
            }
            self.rising_edge()?;
        }
        self.delay.delay_ns(self.timing.settle_ns);
        Ok(())
    }

    fn read_pair(&mut self) -> Result<SensorPair, BusError> {
        let mut bytes = [0u8; 2];
        for bit in (0..8).rev() {
            self.pins.clock.set_low().map_err(pin_fault)?;
            self.rising_edge()?;
            if self.pins.miso0.is_high().map_err(pin_fault)? {
                bytes[0] |= 1 << bit;
            }
            if self.pins.miso1.is_high().map_err(pin_fault)? {
                bytes[1] |= 1 << bit;
            }
        }

        let aux = if self.pins.button.is_high().map_err(pin_fault)? {
            AUX_BUTTON_RELEASED
        } else {
            0
        };

        Ok(SensorPair { bytes, aux })
    }

    fn release(&mut self) -> Result<(), BusError> {
        self.pins.mosi.set_low().map_err(pin_fault)?;
        self.pins.chip_select.set_high().map_err(pin_fault)?;
        self.pins.clock.set_high().map_err(pin_fault)
    }
}
