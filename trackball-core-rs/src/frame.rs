//! Pixel frames captured through the pixel-grab command.
//!
//! The dispatcher streams 361 pairs, one per pixel, each pair holding the
//! same pixel position from both sensors. Pairs arrive in raster order
//! (row-major over the 19×19 grid), so the `n`-th pair is stored at index `n`
//! of both images.

use crate::error::FrameError;
use crate::protocol::{FRAME_PIXELS, FRAME_SIDE, SENSOR_COUNT};

/// Two 19×19 sensor images, one per sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PixelFrame {
    pub images: [[u8; FRAME_PIXELS]; SENSOR_COUNT],
}

impl Default for PixelFrame {
    fn default() -> Self {
        Self::new()
    }
}

impl PixelFrame {
    pub const fn new() -> Self {
        Self {
            images: [[0; FRAME_PIXELS]; SENSOR_COUNT],
        }
    }

    /// Pixel intensity at `(row, col)` for one sensor, or `None` when out of
    /// range.
    pub fn pixel(&self, sensor: usize, row: usize, col: usize) -> Option<u8> {
        if sensor >= SENSOR_COUNT || row >= FRAME_SIDE || col >= FRAME_SIDE {
            return None;
        }
        Some(self.images[sensor][row * FRAME_SIDE + col])
    }

    /// One image as raster-ordered bytes.
    pub fn image(&self, sensor: usize) -> Option<&[u8; FRAME_PIXELS]> {
        self.images.get(sensor)
    }
}

/// Writes incoming pixel pairs into a [`PixelFrame`] in arrival order.
///
/// Every grab starts a new assembler, so the index always restarts at zero
/// and the resulting images depend only on the pair sequence.
pub struct FrameAssembler<'a> {
    frame: &'a mut PixelFrame,
    next: usize,
}

impl<'a> FrameAssembler<'a> {
    pub fn new(frame: &'a mut PixelFrame) -> Self {
        Self { frame, next: 0 }
    }

    /// Store the next pair.
    ///
    /// # Errors
    /// [`FrameError::Overflow`] once all 361 pixels have been written.
    pub fn push(&mut self, pair: [u8; SENSOR_COUNT]) -> Result<(), FrameError> {
        if self.next >= FRAME_PIXELS {
            return Err(FrameError::Overflow);
        }
        for (image, &value) in self.frame.images.iter_mut().zip(pair.iter()) {
            image[self.next] = value;
        }
        self.next += 1;
        Ok(())
    }

    /// Number of pixels written so far.
    pub fn filled(&self) -> usize {
        self.next
    }

    pub fn is_complete(&self) -> bool {
        self.next == FRAME_PIXELS
    }
}
