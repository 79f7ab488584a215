//! Acquisition loop.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};

use crate::error::HostError;
use crate::session::Trackball;
use crate::shared::SharedTrackball;
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AcquisitionConfig {
    /// Pause between motion queries.
    pub period: Duration,
    /// Grab a frame after every `frame_every`-th sample; 0 disables frames.
    pub frame_every: u32,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(5),
            frame_every: 0,
        }
    }
}

/// Counters returned when the loop stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AcquisitionSummary {
    pub samples: u32,
    pub frames: u32,
    pub faults: u32,
}

// Counters wrap like the session's sample count.
impl AcquisitionSummary {
    fn count_sample(&mut self) {
        self.samples = self.samples.wrapping_add(1);
    }

    fn count_frame(&mut self) {
        self.frames = self.frames.wrapping_add(1);
    }

    fn count_fault(&mut self) {
        self.faults = self.faults.wrapping_add(1);
    }
}

/// Acquire until `stop` is signalled.
///
/// This is a regular `async fn`, not an Embassy `#[task]`; wrap it in a
/// concrete task for the target transport.
///
/// # Control flow
///
/// 1. Leave if `stop` was signalled.
/// 2. Read the output mode from `shared` and run one acquisition.
/// 3. Every `frame_every` samples, grab a frame as well.
/// 4. Publish a snapshot, then wait `period` (or until `stop`).
///
/// # Errors
///
/// Query faults are logged, counted and skipped. When a fault leaves part
/// of a response unread, the stream is resynced before the next query.
pub async fn acquisition_task<T>(
    mut trackball: Trackball<T>,
    shared: &SharedTrackball,
    stop: &Signal<CriticalSectionRawMutex, ()>,
    config: AcquisitionConfig,
) -> (Trackball<T>, AcquisitionSummary)
where
    T: Transport,
{
    let mut summary = AcquisitionSummary::default();

    #[cfg(feature = "defmt")]
    defmt::info!("Acquisition started");

    loop {
        if stop.try_take().is_some() {
            break;
        }

        let mode = shared.mode();
        let acquired = match trackball.acquire(mode).await {
            Ok(_) => {
                summary.count_sample();
                true
            }
            Err(e) => {
                on_fault(&mut trackball, &mut summary, e).await;
                false
            }
        };

        if acquired && config.frame_every > 0 && summary.samples % config.frame_every == 0 {
            match trackball.sensor_view().await {
                Ok(_) => summary.count_frame(),
                Err(e) => on_fault(&mut trackball, &mut summary, e).await,
            }
        }

        shared.publish(&trackball.snapshot());

        if let Either::First(()) = select(stop.wait(), Timer::after(config.period)).await {
            break;
        }
    }

    #[cfg(feature = "defmt")]
    defmt::info!(
        "Acquisition stopped: {} samples, {} frames, {} faults",
        summary.samples,
        summary.frames,
        summary.faults
    );

    (trackball, summary)
}

async fn on_fault<T: Transport>(
    trackball: &mut Trackball<T>,
    summary: &mut AcquisitionSummary,
    _error: HostError<T::Error>,
) {
    summary.count_fault();

    #[cfg(feature = "defmt")]
    defmt::warn!("Query failed: {}", defmt::Debug2Format(&_error));

    if trackball.driver_mut().outstanding().is_none() {
        return;
    }
    match trackball.resync().await {
        Ok(_dropped) => {
            #[cfg(feature = "defmt")]
            defmt::info!("Resynced, {} stale bytes dropped", _dropped);
        }
        // Still streaming; the next tick tries again.
        Err(_e) => {
            #[cfg(feature = "defmt")]
            defmt::warn!("Resync failed: {}", defmt::Debug2Format(&_e));
        }
    }
}
