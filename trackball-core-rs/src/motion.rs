//! Motion response decoding and the accumulated motion buffer.
//!
//! A motion query returns seven bytes laid out per field, sensor 0 first:
//!
//! ```text
//! [ dx0 | dx1 | dy0 | dy1 | sq0 | sq1 | aux ]
//! ```
//!
//! Deltas are two's-complement `i8`, surface quality is an unscaled `u8`
//! magnitude, and `aux` carries the push-button state.

use crate::protocol::{MOTION_RESPONSE_LEN, SENSOR_COUNT};

/// One decoded motion response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionSample {
    pub dx: [i8; SENSOR_COUNT],
    pub dy: [i8; SENSOR_COUNT],
    pub quality: [u8; SENSOR_COUNT],
    pub aux: u8,
}

impl MotionSample {
    /// Decode a raw motion response. Every byte pattern is valid.
    pub fn decode(raw: &[u8; MOTION_RESPONSE_LEN]) -> Self {
        Self {
            dx: [raw[0] as i8, raw[1] as i8],
            dy: [raw[2] as i8, raw[3] as i8],
            quality: [raw[4], raw[5]],
            aux: raw[6],
        }
    }

    /// `true` unless the push-button was held during the read.
    ///
    /// The firmware reports
    /// [`AUX_BUTTON_RELEASED`](crate::protocol::AUX_BUTTON_RELEASED) for a released button and
    /// zero for a pressed one; any other non-zero value also reads as released.
    pub fn button_released(&self) -> bool {
        self.aux != 0
    }
}

/// Accumulated per-sensor motion for one acquisition session.
///
/// Positions are exact integer sums of every delta seen since the last
/// [`reset`](Self::reset).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionBuffer {
    pub x: [i32; SENSOR_COUNT],
    pub y: [i32; SENSOR_COUNT],
    pub last_dx: [i32; SENSOR_COUNT],
    pub last_dy: [i32; SENSOR_COUNT],
    pub quality: [i32; SENSOR_COUNT],
    /// Released unless the last motion read saw the button held.
    pub button_released: bool,
}

impl Default for MotionBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionBuffer {
    pub const fn new() -> Self {
        Self {
            x: [0; SENSOR_COUNT],
            y: [0; SENSOR_COUNT],
            last_dx: [0; SENSOR_COUNT],
            last_dy: [0; SENSOR_COUNT],
            quality: [0; SENSOR_COUNT],
            button_released: true,
        }
    }

    /// Fold one sample into the buffer.
    pub fn apply(&mut self, sample: &MotionSample) {
        for i in 0..SENSOR_COUNT {
            let dx = i32::from(sample.dx[i]);
            let dy = i32::from(sample.dy[i]);
            self.x[i] = self.x[i].wrapping_add(dx);
            self.y[i] = self.y[i].wrapping_add(dy);
            self.last_dx[i] = dx;
            self.last_dy[i] = dy;
            self.quality[i] = i32::from(sample.quality[i]);
        }
        self.button_released = sample.button_released();
    }

    /// Overwrite only the surface-quality fields (after a frame grab).
    pub fn set_quality(&mut self, quality: [u8; SENSOR_COUNT]) {
        for (q, &raw) in self.quality.iter_mut().zip(quality.iter()) {
            *q = i32::from(raw);
        }
    }

    /// Zero every field and mark the button as released.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Flat view in the order external readers expect:
    /// `[X0, X1, Y0, Y1, DX0, DX1, DY0, DY1, SQ0, SQ1]`.
    pub fn as_array(&self) -> [i32; 10] {
        [
            self.x[0],
            self.x[1],
            self.y[0],
            self.y[1],
            self.last_dx[0],
            self.last_dx[1],
            self.last_dy[0],
            self.last_dy[1],
            self.quality[0],
            self.quality[1],
        ]
    }
}
