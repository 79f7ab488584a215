//! Error types for the host driver.

use core::fmt;

/// Errors that can occur while querying the trackball.
///
/// Every variant abandons the query; nothing from a failed query is
/// decoded or applied. After a timeout or transport error mid-response the
/// driver stays blocked until
/// [`CommandDriver::resync`](crate::CommandDriver::resync) succeeds.
#[derive(Debug)]
pub enum HostError<E> {
    /// Underlying transport error.
    Transport(E),

    /// The transport stayed busy past the poll timeout.
    BusyTimeout,

    /// A fixed-length response did not arrive in time.
    ResponseTimeout,

    /// A pixel-grab frame did not complete in time.
    FrameTimeout,

    /// The transport reported end of data mid-response.
    ShortResponse { expected: usize, received: usize },

    /// An earlier response was never fully read; resync first.
    ResponseOutstanding,

    /// The byte stream did not go quiet within the resync timeout.
    ResyncTimeout,

    /// The address is a dedicated command or carries the write flag.
    InvalidRegister(u8),
}

// Allow ergonomic `?` propagation from raw transport errors.
impl<E> From<E> for HostError<E> {
    fn from(error: E) -> Self {
        HostError::Transport(error)
    }
}

impl<E: fmt::Debug> fmt::Display for HostError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HostError::Transport(e) => write!(f, "Transport error: {:?}", e),
            HostError::BusyTimeout => write!(f, "Transport busy timeout"),
            HostError::ResponseTimeout => write!(f, "Response timeout"),
            HostError::FrameTimeout => write!(f, "Pixel frame timeout"),
            HostError::ShortResponse { expected, received } => {
                write!(f, "Short response: {} of {} bytes", received, expected)
            }
            HostError::ResponseOutstanding => write!(f, "Previous response still outstanding"),
            HostError::ResyncTimeout => write!(f, "Transport never went quiet"),
            HostError::InvalidRegister(r) => write!(f, "Not a readable register: 0x{:02X}", r),
        }
    }
}

#[cfg(feature = "defmt")]
impl<E: defmt::Format> defmt::Format for HostError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            HostError::Transport(e) => defmt::write!(f, "Transport error: {}", e),
            HostError::BusyTimeout => defmt::write!(f, "Transport busy timeout"),
            HostError::ResponseTimeout => defmt::write!(f, "Response timeout"),
            HostError::FrameTimeout => defmt::write!(f, "Pixel frame timeout"),
            HostError::ShortResponse { expected, received } => {
                defmt::write!(f, "Short response: {} of {} bytes", received, expected)
            }
            HostError::ResponseOutstanding => defmt::write!(f, "Response outstanding"),
            HostError::ResyncTimeout => defmt::write!(f, "Transport never went quiet"),
            HostError::InvalidRegister(r) => {
                defmt::write!(f, "Not a readable register: {=u8:#x}", *r)
            }
        }
    }
}

/// A bounded poll ran out of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollTimeout;

impl fmt::Display for PollTimeout {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Poll timed out")
    }
}
