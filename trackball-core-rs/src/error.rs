use core::fmt;

/// Errors raised while assembling a pixel frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// More than 361 pairs were pushed into one frame.
    Overflow,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FrameError::Overflow => write!(f, "Pixel frame already holds 361 pairs"),
        }
    }
}
