//! Command dispatcher running on the microcontroller.
//!
//! Receives one command byte from the host, runs the matching bus routine
//! and relays the response. The bus is released to idle after every
//! command, whether it succeeded or not.

use embassy_time::{Duration, Timer};

use trackball::protocol::{
    Command, CHIP_RESET, DELTA_X, DELTA_Y, DISABLE_REST_PAYLOAD, FRAME_PIXELS, MOTION_RESPONSE_LEN,
    MOTION_STATUS, NAV_CTRL2, PIXEL_GRAB, PIXEL_VALUE_MASK, RESET_PAYLOAD, SURFACE_QUALITY,
    WRITE_FLAG,
};

use crate::bus::{SensorBus, SensorPair};
use crate::error::DispatchError;
use crate::link::HostLink;

/// How long to wait for a pixel to become valid on both sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PixelPollPolicy {
    /// Poll until valid. The host's frame timeout is the only bound.
    #[default]
    Unbounded,
    /// Give up on a pixel after this many polls.
    Limit(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DispatcherConfig {
    pub pixel_poll: PixelPollPolicy,
    /// Pause after a motion response before the next command is taken.
    pub motion_holdoff: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            pixel_poll: PixelPollPolicy::Unbounded,
            motion_holdoff: Duration::from_micros(100),
        }
    }
}

/// Serves host commands over a [`HostLink`] using a [`SensorBus`].
pub struct CommandDispatcher<B, L> {
    bus: B,
    link: L,
    config: DispatcherConfig,
}

impl<B, L> CommandDispatcher<B, L>
where
    B: SensorBus,
    L: HostLink,
{
    pub fn new(bus: B, link: L, config: DispatcherConfig) -> Self {
        Self { bus, link, config }
    }

    /// Serve commands forever. Failed commands are logged and skipped.
    pub async fn run(&mut self) -> ! {
        loop {
            match self.handle_next().await {
                Ok(_command) => {
                    #[cfg(feature = "defmt")]
                    defmt::trace!("Served {}", _command);
                }
                Err(DispatchError::Link(_)) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("Host link error");
                }
                Err(DispatchError::Bus(_e)) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("Bus fault: {}", _e);
                }
                Err(DispatchError::PixelNotReady { pixel: _pixel }) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("Pixel {} never became valid, frame abandoned", _pixel);
                }
            }
        }
    }

    /// Wait for one command byte and execute it.
    ///
    /// # Errors
    /// * [`DispatchError::Link`] if the command cannot be received or the
    ///   response cannot be sent
    /// * [`DispatchError::Bus`] on a GPIO fault
    /// * [`DispatchError::PixelNotReady`] when a bounded pixel poll runs out
    pub async fn handle_next(&mut self) -> Result<Command, DispatchError<L::Error>> {
        let byte = self
            .link
            .receive_command()
            .await
            .map_err(DispatchError::Link)?;
        let command = Command::from_byte(byte);

        let result = self.execute(command).await;
        let released = self.bus.release();
        result?;
        released?;

        Ok(command)
    }

    pub fn into_parts(self) -> (B, L) {
        (self.bus, self.link)
    }

    async fn execute(&mut self, command: Command) -> Result<(), DispatchError<L::Error>> {
        match command {
            Command::ChipReset => {
                self.bus.send_byte(CHIP_RESET | WRITE_FLAG)?;
                self.bus.send_byte(RESET_PAYLOAD)?;
            }
            Command::DisableRestMode => {
                self.bus.send_byte(NAV_CTRL2 | WRITE_FLAG)?;
                self.bus.send_byte(DISABLE_REST_PAYLOAD)?;
            }
            Command::PixelGrab => self.grab_frame().await?,
            Command::Motion => self.read_motion().await?,
            Command::ReadRegister(register) => {
                let pair = self.bus.transact(register)?;
                self.send(&pair.bytes).await?;
            }
        }
        Ok(())
    }

    async fn grab_frame(&mut self) -> Result<(), DispatchError<L::Error>> {
        // Any write to the grab register restarts the chip's pixel counter.
        self.bus.send_byte(PIXEL_GRAB | WRITE_FLAG)?;
        self.bus.send_byte(0x00)?;

        for pixel in 0..FRAME_PIXELS {
            let pair = self.poll_pixel(pixel)?;
            let values = [
                pair.bytes[0] & PIXEL_VALUE_MASK,
                pair.bytes[1] & PIXEL_VALUE_MASK,
            ];
            self.send(&values).await?;
        }
        Ok(())
    }

    fn poll_pixel(&mut self, pixel: usize) -> Result<SensorPair, DispatchError<L::Error>> {
        let mut polls: u32 = 0;
        loop {
            let pair = self.bus.transact(PIXEL_GRAB)?;
            if pair.pixel_valid() {
                return Ok(pair);
            }
            polls = polls.saturating_add(1);
            if let PixelPollPolicy::Limit(limit) = self.config.pixel_poll {
                if polls >= limit {
                    return Err(DispatchError::PixelNotReady { pixel });
                }
            }
        }
    }

    async fn read_motion(&mut self) -> Result<(), DispatchError<L::Error>> {
        // Reading the status latches the delta registers; its value is unused.
        self.bus.transact(MOTION_STATUS)?;
        let dx = self.bus.transact(DELTA_X)?;
        let dy = self.bus.transact(DELTA_Y)?;
        let sq = self.bus.transact(SURFACE_QUALITY)?;

        let response: [u8; MOTION_RESPONSE_LEN] = [
            dx.bytes[0],
            dx.bytes[1],
            dy.bytes[0],
            dy.bytes[1],
            sq.bytes[0],
            sq.bytes[1],
            sq.aux,
        ];
        self.send(&response).await?;

        Timer::after(self.config.motion_holdoff).await;
        Ok(())
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<(), DispatchError<L::Error>> {
        self.link.send(bytes).await.map_err(DispatchError::Link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;

    use embassy_futures::block_on;
    use trackball::protocol::{AUX_BUTTON_RELEASED, PRODUCT_ID};

    use crate::error::BusError;

    // ── Test doubles ─────────────────────────────────────────────────

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Op {
        Send(u8),
        Read,
        Release,
    }

    /// Bus that records every operation and replays queued pairs.
    #[derive(Default)]
    struct ScriptedBus {
        ops: Vec<Op>,
        replies: VecDeque<SensorPair>,
        /// Reply once the queue is drained.
        fallback: SensorPair,
    }

    impl ScriptedBus {
        fn replying(replies: &[SensorPair]) -> Self {
            Self {
                replies: replies.iter().copied().collect(),
                ..Self::default()
            }
        }
    }

    impl SensorBus for ScriptedBus {
        fn send_byte(&mut self, value: u8) -> Result<(), BusError> {
            self.ops.push(Op::Send(value));
            Ok(())
        }

        fn read_pair(&mut self) -> Result<SensorPair, BusError> {
            self.ops.push(Op::Read);
            Ok(self.replies.pop_front().unwrap_or(self.fallback))
        }

        fn release(&mut self) -> Result<(), BusError> {
            self.ops.push(Op::Release);
            Ok(())
        }
    }

    #[derive(Debug, PartialEq, Eq)]
    struct LinkClosed;

    #[derive(Default)]
    struct MemoryLink {
        commands: VecDeque<u8>,
        sent: Vec<Vec<u8>>,
    }

    impl HostLink for MemoryLink {
        type Error = LinkClosed;

        async fn receive_command(&mut self) -> Result<u8, LinkClosed> {
            self.commands.pop_front().ok_or(LinkClosed)
        }

        async fn send(&mut self, bytes: &[u8]) -> Result<(), LinkClosed> {
            self.sent.push(bytes.to_vec());
            Ok(())
        }
    }

    fn dispatcher(
        bus: ScriptedBus,
        commands: &[u8],
        pixel_poll: PixelPollPolicy,
    ) -> CommandDispatcher<ScriptedBus, MemoryLink> {
        let link = MemoryLink {
            commands: commands.iter().copied().collect(),
            ..MemoryLink::default()
        };
        let config = DispatcherConfig {
            pixel_poll,
            motion_holdoff: Duration::from_ticks(0),
        };
        CommandDispatcher::new(bus, link, config)
    }

    fn pair(a: u8, b: u8) -> SensorPair {
        SensorPair::new([a, b], AUX_BUTTON_RELEASED)
    }

    // ── Configuration writes ─────────────────────────────────────────

    #[test]
    fn chip_reset_writes_payload_and_sends_nothing() {
        let mut d = dispatcher(ScriptedBus::default(), &[0xBA], PixelPollPolicy::Unbounded);
        assert_eq!(block_on(d.handle_next()).unwrap(), Command::ChipReset);

        let (bus, link) = d.into_parts();
        assert_eq!(bus.ops, [Op::Send(0xBA), Op::Send(0x5A), Op::Release]);
        assert!(link.sent.is_empty());
    }

    #[test]
    fn disable_rest_mode_writes_payload() {
        let mut d = dispatcher(ScriptedBus::default(), &[0xA2], PixelPollPolicy::Unbounded);
        assert_eq!(block_on(d.handle_next()).unwrap(), Command::DisableRestMode);

        let (bus, link) = d.into_parts();
        assert_eq!(bus.ops, [Op::Send(0xA2), Op::Send(0x80), Op::Release]);
        assert!(link.sent.is_empty());
    }

    // ── Register reads ───────────────────────────────────────────────

    #[test]
    fn default_branch_relays_one_pair() {
        let bus = ScriptedBus::replying(&[pair(0x29, 0x09)]);
        let mut d = dispatcher(bus, &[PRODUCT_ID], PixelPollPolicy::Unbounded);
        block_on(d.handle_next()).unwrap();

        let (bus, link) = d.into_parts();
        assert_eq!(bus.ops, [Op::Send(0x00), Op::Read, Op::Release]);
        assert_eq!(link.sent, [vec![0x29, 0x09]]);
    }

    // ── Motion ───────────────────────────────────────────────────────

    #[test]
    fn motion_sends_seven_bytes() {
        let bus = ScriptedBus::replying(&[
            pair(0x81, 0x81), // status, discarded
            pair(0xFF, 0x01),
            pair(0x00, 0xFE),
            SensorPair::new([0x32, 0x32], 0x00),
        ]);
        let mut d = dispatcher(bus, &[0x02], PixelPollPolicy::Unbounded);
        assert_eq!(block_on(d.handle_next()).unwrap(), Command::Motion);

        let (bus, link) = d.into_parts();
        assert_eq!(
            bus.ops,
            [
                Op::Send(0x02),
                Op::Read,
                Op::Send(0x03),
                Op::Read,
                Op::Send(0x04),
                Op::Read,
                Op::Send(0x05),
                Op::Read,
                Op::Release,
            ]
        );
        assert_eq!(link.sent, [vec![0xFF, 0x01, 0x00, 0xFE, 0x32, 0x32, 0x00]]);
    }

    // ── Pixel grab ───────────────────────────────────────────────────

    #[test]
    fn pixel_waits_for_both_sensors() {
        // Sensor 0 becomes valid first; nothing may be emitted until sensor 1 joins.
        let mut replies = vec![pair(0x85, 0x02), pair(0x85, 0x03), pair(0x85, 0x84)];
        replies.extend(core::iter::repeat(pair(0x81, 0x82)).take(FRAME_PIXELS - 1));

        let mut d = dispatcher(ScriptedBus::replying(&replies), &[0x0B], PixelPollPolicy::Unbounded);
        assert_eq!(block_on(d.handle_next()).unwrap(), Command::PixelGrab);

        let (bus, link) = d.into_parts();
        assert_eq!(&bus.ops[..4], &[Op::Send(0x8B), Op::Send(0x00), Op::Send(0x0B), Op::Read]);
        // Three polls for pixel 0, one for each remaining pixel.
        let polls = bus.ops.iter().filter(|op| **op == Op::Send(0x0B)).count();
        assert_eq!(polls, 3 + FRAME_PIXELS - 1);

        assert_eq!(link.sent.len(), FRAME_PIXELS);
        assert_eq!(link.sent[0], [0x05, 0x04]);
        assert!(link.sent[1..].iter().all(|p| p == &[0x01, 0x02]));
        assert_eq!(bus.ops.last(), Some(&Op::Release));
    }

    #[test]
    fn poll_limit_aborts_grab() {
        let replies = [pair(0x81, 0x81), pair(0x81, 0x01), pair(0x01, 0x81)];
        let bus = ScriptedBus {
            replies: replies.iter().copied().collect(),
            fallback: pair(0x00, 0x00),
            ..ScriptedBus::default()
        };
        let mut d = dispatcher(bus, &[0x0B], PixelPollPolicy::Limit(3));

        match block_on(d.handle_next()) {
            Err(DispatchError::PixelNotReady { pixel }) => assert_eq!(pixel, 1),
            other => panic!("unexpected result: {:?}", other),
        }

        let (bus, link) = d.into_parts();
        assert_eq!(link.sent.len(), 1);
        // Bus is still returned to idle.
        assert_eq!(bus.ops.last(), Some(&Op::Release));
    }

    // ── Link ─────────────────────────────────────────────────────────

    #[test]
    fn closed_link_is_reported() {
        let mut d = dispatcher(ScriptedBus::default(), &[], PixelPollPolicy::Unbounded);
        assert!(matches!(block_on(d.handle_next()), Err(DispatchError::Link(LinkClosed))));
    }

    #[test]
    fn commands_are_served_in_order() {
        let bus = ScriptedBus::replying(&[pair(1, 2), pair(3, 4)]);
        let mut d = dispatcher(bus, &[0x00, 0x01], PixelPollPolicy::Unbounded);
        block_on(d.handle_next()).unwrap();
        block_on(d.handle_next()).unwrap();

        let (_, link) = d.into_parts();
        assert_eq!(link.sent, [vec![1, 2], vec![3, 4]]);
    }
}
