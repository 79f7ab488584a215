//! Host command driver.
//!
//! Writes one command byte per query and reads back the response length the
//! command implies. Queries never overlap: `&mut self` serialises callers,
//! and an outstanding marker stays set while the rest of a response may
//! still arrive (after a timeout, say). [`CommandDriver::resync`] drains the
//! stream and clears it.
//!
//! ```text
//! write [cmd] → poll !busy → read N bytes (N = 0, 2, 7 or 361 × 2)
//! ```

use embassy_time::{with_timeout, Duration, Instant};

use trackball::protocol::{
    ChipModel, Command, ResponseLen, MOTION_RESPONSE_LEN, PAIR_RESPONSE_LEN, PRODUCT_ID, REV_ID,
    SENSOR_COUNT, SURFACE_QUALITY,
};
use trackball::{FrameAssembler, PixelFrame};

use crate::error::HostError;
use crate::transport::{poll_until, PollPolicy, Transport};

/// Timeouts applied to every query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DriverConfig {
    /// Wait for the transport to stop reporting busy.
    pub busy: PollPolicy,
    /// Bound on reading a whole fixed-length response.
    pub response_timeout: Duration,
    /// Bound on reading all 361 pairs of a pixel grab.
    pub frame_timeout: Duration,
    /// Silence that ends a resync.
    pub resync_quiet: Duration,
    /// Bound on a whole resync.
    pub resync_timeout: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            busy: PollPolicy::default(),
            response_timeout: Duration::from_millis(1000),
            frame_timeout: Duration::from_millis(2000),
            resync_quiet: Duration::from_millis(50),
            resync_timeout: Duration::from_millis(3000),
        }
    }
}

/// Decoded-by-length response to a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Write-only command.
    Empty,
    /// One register byte per sensor.
    Pair([u8; PAIR_RESPONSE_LEN]),
    /// Raw motion response, see [`MotionSample::decode`](trackball::MotionSample::decode).
    Motion([u8; MOTION_RESPONSE_LEN]),
    Frame(PixelFrame),
}

/// Identity of one sensor chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorInfo {
    pub model: ChipModel,
    pub revision: u8,
}

pub struct CommandDriver<T> {
    transport: T,
    config: DriverConfig,
    outstanding: Option<Command>,
}

type Result<V, T> = core::result::Result<V, HostError<<T as Transport>::Error>>;

fn readable<E>(register: u8) -> core::result::Result<Command, HostError<E>> {
    Command::read(register).ok_or(HostError::InvalidRegister(register))
}

impl<T> CommandDriver<T>
where
    T: Transport,
{
    pub fn new(transport: T, config: DriverConfig) -> Self {
        Self {
            transport,
            config,
            outstanding: None,
        }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Generic query
    // -----------------------------------------------------------------------

    /// Issue `command` and read its whole response.
    ///
    /// # Errors
    /// * [`HostError::ResponseOutstanding`] if an earlier response was never
    ///   fully read and the driver has not been resynced
    /// * [`HostError::InvalidRegister`] for a [`Command::ReadRegister`] whose
    ///   address the dispatcher would run as another command
    /// * [`HostError::Transport`], [`HostError::BusyTimeout`],
    ///   [`HostError::ResponseTimeout`], [`HostError::FrameTimeout`] or
    ///   [`HostError::ShortResponse`] when the exchange fails
    pub async fn query(&mut self, command: Command) -> Result<Response, T> {
        if let Command::ReadRegister(register) = command {
            readable(register)?;
        }
        match command.response_len() {
            ResponseLen::None => {
                self.write_only(command).await?;
                Ok(Response::Empty)
            }
            ResponseLen::Pairs { .. } => {
                let mut frame = PixelFrame::new();
                self.grab_frame(&mut frame).await?;
                Ok(Response::Frame(frame))
            }
            ResponseLen::Fixed(MOTION_RESPONSE_LEN) => {
                let mut raw = [0u8; MOTION_RESPONSE_LEN];
                self.fixed(command, &mut raw).await?;
                Ok(Response::Motion(raw))
            }
            ResponseLen::Fixed(_) => {
                let mut raw = [0u8; PAIR_RESPONSE_LEN];
                self.fixed(command, &mut raw).await?;
                Ok(Response::Pair(raw))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Typed queries
    // -----------------------------------------------------------------------

    /// Read the raw 7-byte motion response.
    pub async fn read_motion(&mut self) -> Result<[u8; MOTION_RESPONSE_LEN], T> {
        let mut raw = [0u8; MOTION_RESPONSE_LEN];
        self.fixed(Command::Motion, &mut raw).await?;
        Ok(raw)
    }

    /// Read one register from both sensors.
    ///
    /// # Errors
    /// [`HostError::InvalidRegister`] for `PIXEL_GRAB`, `MOTION_STATUS` and
    /// any address with the write flag set; nothing is sent. Use
    /// [`query`](Self::query) for those commands.
    pub async fn read_register(&mut self, register: u8) -> Result<[u8; PAIR_RESPONSE_LEN], T> {
        let command = readable(register)?;
        let mut raw = [0u8; PAIR_RESPONSE_LEN];
        self.fixed(command, &mut raw).await?;
        Ok(raw)
    }

    /// Stream a full frame into `frame`.
    ///
    /// The whole grab is bounded by `frame_timeout`. On error `frame` may
    /// hold a partial image.
    pub async fn grab_frame(&mut self, frame: &mut PixelFrame) -> Result<(), T> {
        self.begin(Command::PixelGrab).await?;

        let timeout = self.config.frame_timeout;
        let result = match with_timeout(timeout, Self::read_frame(&mut self.transport, frame)).await {
            Ok(inner) => inner,
            Err(_) => Err(HostError::FrameTimeout),
        };
        self.settle(result)
    }

    // -----------------------------------------------------------------------
    // Multi-step operations
    // -----------------------------------------------------------------------

    /// Reset both chips, then keep their LEDs out of rest mode.
    pub async fn prepare_sensors(&mut self) -> Result<(), T> {
        self.write_only(Command::ChipReset).await?;
        self.write_only(Command::DisableRestMode).await
    }

    /// Product id and revision of both chips.
    pub async fn sensor_info(&mut self) -> Result<[SensorInfo; SENSOR_COUNT], T> {
        let ids = self.read_register(PRODUCT_ID).await?;
        let revisions = self.read_register(REV_ID).await?;

        let info = [0, 1].map(|i| SensorInfo {
            model: ChipModel::from_product_id(ids[i]),
            revision: revisions[i],
        });
        Ok(info)
    }

    pub async fn read_surface_quality(&mut self) -> Result<[u8; SENSOR_COUNT], T> {
        self.read_register(SURFACE_QUALITY).await
    }

    // -----------------------------------------------------------------------
    // Outstanding marker
    // -----------------------------------------------------------------------

    /// The command whose response was never fully read, if any.
    pub fn outstanding(&self) -> Option<Command> {
        self.outstanding
    }

    /// Discard whatever is left of an unfinished response, then accept new
    /// queries. The stream counts as drained once no byte has arrived for
    /// `resync_quiet`. Returns the number of bytes discarded.
    ///
    /// # Errors
    /// * [`HostError::ResyncTimeout`] if bytes are still arriving after
    ///   `resync_timeout`; the marker stays set
    /// * [`HostError::Transport`] if a read fails
    pub async fn resync(&mut self) -> Result<usize, T> {
        let deadline = Instant::now() + self.config.resync_timeout;
        let mut scratch = [0u8; 32];
        let mut drained = 0;

        loop {
            match with_timeout(self.config.resync_quiet, self.transport.read(&mut scratch)).await {
                Err(_) | Ok(Ok(0)) => break,
                Ok(Ok(n)) => drained += n,
                Ok(Err(e)) => return Err(HostError::Transport(e)),
            }
            if Instant::now() >= deadline {
                return Err(HostError::ResyncTimeout);
            }
        }

        #[cfg(feature = "defmt")]
        if let Some(command) = self.outstanding {
            defmt::debug!("Resynced after {}: {} stale bytes", command, drained);
        }

        self.outstanding = None;
        Ok(drained)
    }

    /// Clear the marker without draining. Only safe when the caller knows
    /// the stream is empty; prefer [`resync`](Self::resync).
    pub fn abandon_outstanding(&mut self) -> Option<Command> {
        self.outstanding.take()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn release(self) -> T {
        self.transport
    }

    // -----------------------------------------------------------------------
    // Primitives
    // -----------------------------------------------------------------------

    /// Mark `command` outstanding, write it and wait for the transport.
    async fn begin(&mut self, command: Command) -> Result<(), T> {
        if self.outstanding.is_some() {
            return Err(HostError::ResponseOutstanding);
        }
        self.outstanding = Some(command);

        let sent = self.send_command(command).await;
        if sent.is_err() {
            self.outstanding = None;
        }
        sent
    }

    async fn send_command(&mut self, command: Command) -> Result<(), T> {
        self.transport.write(&[command.byte()]).await?;

        let transport = &mut self.transport;
        poll_until(|| !transport.is_busy(), self.config.busy)
            .await
            .map_err(|_| HostError::BusyTimeout)
    }

    async fn write_only(&mut self, command: Command) -> Result<(), T> {
        self.begin(command).await?;
        self.outstanding = None;
        Ok(())
    }

    async fn fixed(&mut self, command: Command, buf: &mut [u8]) -> Result<(), T> {
        self.begin(command).await?;

        let timeout = self.config.response_timeout;
        let result = match with_timeout(timeout, Self::fill(&mut self.transport, buf)).await {
            Ok(inner) => inner,
            Err(_) => Err(HostError::ResponseTimeout),
        };
        self.settle(result)
    }

    /// Clear the marker unless more of the response may still arrive.
    fn settle(&mut self, result: Result<(), T>) -> Result<(), T> {
        match result {
            // A closed peer sends nothing more.
            Ok(()) | Err(HostError::ShortResponse { .. }) => self.outstanding = None,
            _ => {}
        }
        result
    }

    async fn read_frame(transport: &mut T, frame: &mut PixelFrame) -> Result<(), T> {
        let mut assembler = FrameAssembler::new(frame);
        while !assembler.is_complete() {
            let mut pair = [0u8; PAIR_RESPONSE_LEN];
            Self::fill(transport, &mut pair).await?;
            // Cannot overflow: the loop ends on a complete frame.
            let _ = assembler.push(pair);
        }
        Ok(())
    }

    /// Read until `buf` is full.
    async fn fill(transport: &mut T, buf: &mut [u8]) -> Result<(), T> {
        let mut received = 0;
        while received < buf.len() {
            let n = transport.read(&mut buf[received..]).await?;
            if n == 0 {
                return Err(HostError::ShortResponse {
                    expected: buf.len(),
                    received,
                });
            }
            received += n;
        }
        Ok(())
    }
}
