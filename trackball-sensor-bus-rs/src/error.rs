//! Error types for the sensor bus and dispatcher.

use core::fmt;

use embedded_hal::digital::ErrorKind;

/// Errors raised by the bit-banged bus.
///
/// The protocol itself cannot fail at this layer; only a GPIO fault can.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// A pin read or write was rejected by the HAL.
    Pin(ErrorKind),
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BusError::Pin(kind) => write!(f, "GPIO fault: {}", kind),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for BusError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            BusError::Pin(kind) => defmt::write!(f, "GPIO fault: {}", defmt::Debug2Format(kind)),
        }
    }
}

/// Errors that abort a single dispatched command.
#[derive(Debug)]
pub enum DispatchError<E> {
    /// Host link failed to receive or send.
    Link(E),

    /// Bus fault while talking to the sensors.
    Bus(BusError),

    /// A pixel never became valid on both sensors within the poll limit.
    PixelNotReady { pixel: usize },
}

// Bus faults propagate with `?`; link errors go through `map_err(DispatchError::Link)`.
impl<E> From<BusError> for DispatchError<E> {
    fn from(error: BusError) -> Self {
        DispatchError::Bus(error)
    }
}

impl<E: fmt::Debug> fmt::Display for DispatchError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DispatchError::Link(e) => write!(f, "Host link error: {:?}", e),
            DispatchError::Bus(e) => write!(f, "Bus error: {}", e),
            DispatchError::PixelNotReady { pixel } => {
                write!(f, "Pixel {} never became valid on both sensors", pixel)
            }
        }
    }
}

#[cfg(feature = "defmt")]
impl<E: defmt::Format> defmt::Format for DispatchError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            DispatchError::Link(e) => defmt::write!(f, "Host link error: {}", e),
            DispatchError::Bus(e) => defmt::write!(f, "Bus error: {}", e),
            DispatchError::PixelNotReady { pixel } => {
                defmt::write!(f, "Pixel {} not ready", pixel)
            }
        }
    }
}
