//! Byte transport to the microcontroller and the bounded poll primitive.

use core::fmt;

use embassy_time::{Duration, Instant, Timer};

use crate::error::PollTimeout;

/// Duplex byte channel to the dispatcher.
///
/// No framing or addressing: the driver writes one command byte and reads
/// back exactly the number of bytes the command implies.
#[allow(async_fn_in_trait)]
pub trait Transport {
    type Error: fmt::Debug;

    async fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Read up to `buf.len()` bytes. `Ok(0)` means the peer closed.
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// A transfer is still in flight.
    fn is_busy(&mut self) -> bool;
}

/// Timeout and re-check interval for [`poll_until`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollPolicy {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(1000),
            interval: Duration::from_micros(100),
        }
    }
}

/// Re-check `ready` every `policy.interval` until it holds or
/// `policy.timeout` has passed. `ready` is always checked at least once.
pub async fn poll_until<F>(mut ready: F, policy: PollPolicy) -> Result<(), PollTimeout>
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + policy.timeout;
    loop {
        if ready() {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(PollTimeout);
        }
        Timer::after(policy.interval).await;
    }
}
