//! Wire contract shared by the dispatcher firmware and the host driver.
//!
//! The host sends exactly one command byte per query. Most command bytes are
//! plain sensor register addresses; the two configuration commands are the
//! register address with the write flag set. The response length is fixed by
//! the command and must not change without versioning both sides.

// ---------------------------------------------------------------------------
// Sensor registers (shared by the ADNS-5090 and ADNS-3050)
// ---------------------------------------------------------------------------

/// Product identifier (read-only).
pub const PRODUCT_ID: u8 = 0x00;

/// Silicon revision (read-only).
pub const REV_ID: u8 = 0x01;

/// Motion status. Reading it latches the delta registers.
pub const MOTION_STATUS: u8 = 0x02;

/// Signed 8-bit X displacement since the last motion read.
pub const DELTA_X: u8 = 0x03;

/// Signed 8-bit Y displacement since the last motion read.
pub const DELTA_Y: u8 = 0x04;

/// Surface quality: upper 8 bits of the chip's 9-bit feature count.
pub const SURFACE_QUALITY: u8 = 0x05;

/// Pixel grabber. Writing any value resets the on-chip pixel counter.
pub const PIXEL_GRAB: u8 = 0x0B;

/// Navigation control 2 (rest-mode configuration).
pub const NAV_CTRL2: u8 = 0x22;

/// Chip reset.
pub const CHIP_RESET: u8 = 0x3A;

// ---------------------------------------------------------------------------
// Bus conventions
// ---------------------------------------------------------------------------

/// Top bit of an address byte; set for a register write.
pub const WRITE_FLAG: u8 = 0x80;

/// Payload written to [`CHIP_RESET`] to trigger a full reset.
pub const RESET_PAYLOAD: u8 = 0x5A;

/// Payload written to [`NAV_CTRL2`] to keep the LED out of rest mode.
pub const DISABLE_REST_PAYLOAD: u8 = 0x80;

/// Bit 7 of a pixel-grab byte; set once the pixel value is ready.
pub const PIXEL_VALID: u8 = 0x80;

/// Mask clearing [`PIXEL_VALID`] from a pixel byte.
pub const PIXEL_VALUE_MASK: u8 = 0x7F;

/// Auxiliary status value reported while the push-button is released.
pub const AUX_BUTTON_RELEASED: u8 = 0x10;

/// Side length of the square sensor image, in pixels.
pub const FRAME_SIDE: usize = 19;

/// Number of pixels per sensor image.
pub const FRAME_PIXELS: usize = FRAME_SIDE * FRAME_SIDE;

/// Length of a full motion response.
pub const MOTION_RESPONSE_LEN: usize = 7;

/// Length of a register-pair response (one byte per sensor).
pub const PAIR_RESPONSE_LEN: usize = 2;

/// Number of sensors on the shared bus.
pub const SENSOR_COUNT: usize = 2;

// ---------------------------------------------------------------------------
// Chip identification
// ---------------------------------------------------------------------------

/// [`PRODUCT_ID`] value reported by the ADNS-3050.
pub const ADNS3050_ID: u8 = 0x09;

/// [`PRODUCT_ID`] value reported by the ADNS-5090.
pub const ADNS5090_ID: u8 = 0x29;

/// Optical chip model derived from its product id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChipModel {
    Adns5090,
    Adns3050,
    Unknown(u8),
}

impl ChipModel {
    pub fn from_product_id(id: u8) -> Self {
        match id {
            ADNS5090_ID => ChipModel::Adns5090,
            ADNS3050_ID => ChipModel::Adns3050,
            other => ChipModel::Unknown(other),
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// A host command, one per transport query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Reset both chips (`CHIP_RESET | WRITE`).
    ChipReset,
    /// Disable LED rest mode on both chips (`NAV_CTRL2 | WRITE`).
    DisableRestMode,
    /// Stream a full 19×19 frame from both chips.
    PixelGrab,
    /// Read Δx, Δy, surface quality and the auxiliary status byte.
    Motion,
    /// Read one register from both chips.
    ReadRegister(u8),
}

/// Number of bytes the dispatcher emits for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResponseLen {
    /// Write-only command, nothing comes back.
    None,
    /// A single block of this many bytes.
    Fixed(usize),
    /// `count` consecutive pairs, each sent as its own transfer.
    Pairs { count: usize },
}

impl ResponseLen {
    /// Total number of bytes the host must read.
    pub fn total(self) -> usize {
        match self {
            ResponseLen::None => 0,
            ResponseLen::Fixed(n) => n,
            ResponseLen::Pairs { count } => count * PAIR_RESPONSE_LEN,
        }
    }
}

impl Command {
    /// Decode a received command byte. Total: unknown bytes are register reads.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            b if b == CHIP_RESET | WRITE_FLAG => Command::ChipReset,
            b if b == NAV_CTRL2 | WRITE_FLAG => Command::DisableRestMode,
            PIXEL_GRAB => Command::PixelGrab,
            MOTION_STATUS => Command::Motion,
            other => Command::ReadRegister(other),
        }
    }

    /// Build a register read, rejecting addresses that the dispatcher treats
    /// as dedicated commands or that carry the write flag.
    pub fn read(register: u8) -> Option<Self> {
        match Command::from_byte(register) {
            Command::ReadRegister(r) if r & WRITE_FLAG == 0 => Some(Command::ReadRegister(r)),
            _ => None,
        }
    }

    /// The byte written to the transport.
    pub fn byte(self) -> u8 {
        match self {
            Command::ChipReset => CHIP_RESET | WRITE_FLAG,
            Command::DisableRestMode => NAV_CTRL2 | WRITE_FLAG,
            Command::PixelGrab => PIXEL_GRAB,
            Command::Motion => MOTION_STATUS,
            Command::ReadRegister(r) => r,
        }
    }

    pub fn response_len(self) -> ResponseLen {
        match self {
            Command::ChipReset | Command::DisableRestMode => ResponseLen::None,
            Command::PixelGrab => ResponseLen::Pairs { count: FRAME_PIXELS },
            Command::Motion => ResponseLen::Fixed(MOTION_RESPONSE_LEN),
            Command::ReadRegister(_) => ResponseLen::Fixed(PAIR_RESPONSE_LEN),
        }
    }
}
