//! Acquisition session: driver, motion buffer, pixel frame and odometry.

use trackball::protocol::SENSOR_COUNT;
use trackball::{
    MotionBuffer, MotionSample, Odometry, OdometryConfig, OdometryOutput, OutputMode, PixelFrame,
    Pose, TrajectoryHistory,
};

use crate::driver::{CommandDriver, DriverConfig, SensorInfo};
use crate::error::HostError;
use crate::transport::Transport;

/// Copy of everything a reader needs, taken after a completed tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackballSnapshot {
    pub motion: MotionBuffer,
    pub pose: Pose,
    pub trace: TrajectoryHistory,
    pub sample_count: u32,
}

impl Default for TrackballSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackballSnapshot {
    pub const fn new() -> Self {
        Self {
            motion: MotionBuffer::new(),
            pose: Pose::ORIGIN,
            trace: TrajectoryHistory::new(),
            sample_count: 0,
        }
    }
}

/// One successful motion acquisition.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AcquiredSample {
    pub sample: MotionSample,
    pub output: OdometryOutput,
}

/// A trackball acquisition session.
///
/// Owns the command driver and all state derived from it. A failed query
/// leaves the motion buffer, pose and sample count as they were.
pub struct Trackball<T> {
    driver: CommandDriver<T>,
    motion: MotionBuffer,
    /// Created by the first [`sensor_view`](Self::sensor_view).
    frame: Option<PixelFrame>,
    odometry: Odometry,
    sample_count: u32,
}

impl<T> Trackball<T>
where
    T: Transport,
{
    pub fn new(transport: T, driver: DriverConfig, odometry: OdometryConfig) -> Self {
        Self {
            driver: CommandDriver::new(transport, driver),
            motion: MotionBuffer::new(),
            frame: None,
            odometry: Odometry::new(odometry),
            sample_count: 0,
        }
    }

    /// Reset the chips and disable LED rest mode.
    pub async fn prepare(&mut self) -> Result<(), HostError<T::Error>> {
        self.driver.prepare_sensors().await?;

        #[cfg(feature = "defmt")]
        defmt::info!("Sensors prepared");

        Ok(())
    }

    pub async fn sensor_info(&mut self) -> Result<[SensorInfo; SENSOR_COUNT], HostError<T::Error>> {
        let info = self.driver.sensor_info().await?;

        #[cfg(feature = "defmt")]
        for (i, chip) in info.iter().enumerate() {
            defmt::info!("Chip {}: {} rev. {}", i, chip.model, chip.revision);
        }

        Ok(info)
    }

    /// Query motion, fold it into the buffer and run one odometry tick.
    pub async fn acquire(&mut self, mode: OutputMode) -> Result<AcquiredSample, HostError<T::Error>> {
        let raw = self.driver.read_motion().await?;
        let sample = MotionSample::decode(&raw);

        self.motion.apply(&sample);
        let output = self.odometry.update(mode, &self.motion);
        self.sample_count = self.sample_count.wrapping_add(1);

        #[cfg(feature = "defmt")]
        defmt::trace!(
            "Sample {}: X={} Y={} SQ={}",
            self.sample_count,
            self.motion.x,
            self.motion.y,
            self.motion.quality
        );

        Ok(AcquiredSample { sample, output })
    }

    /// Grab a frame from both sensors, then refresh surface quality.
    ///
    /// The frame is kept only if the grab completes. A failed quality
    /// refresh is logged and does not fail the call.
    pub async fn sensor_view(&mut self) -> Result<&PixelFrame, HostError<T::Error>> {
        let mut grabbed = PixelFrame::new();
        self.driver.grab_frame(&mut grabbed).await?;
        let frame = self.frame.get_or_insert_with(PixelFrame::new);
        *frame = grabbed;

        match self.driver.read_surface_quality().await {
            Ok(quality) => self.motion.set_quality(quality),
            Err(_e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Surface quality refresh failed: {}", defmt::Debug2Format(&_e));
            }
        }

        self.sample_count = self.sample_count.wrapping_add(1);
        Ok(frame)
    }

    /// Drop the rest of an unfinished response so queries can resume.
    /// Returns the number of bytes discarded.
    pub async fn resync(&mut self) -> Result<usize, HostError<T::Error>> {
        self.driver.resync().await
    }

    /// Zero the motion buffer, pose, trace and sample count. The frame and
    /// the driver's connection are kept.
    pub fn reset(&mut self) {
        self.motion.reset();
        self.odometry.reset();
        self.sample_count = 0;
    }

    pub fn snapshot(&self) -> TrackballSnapshot {
        TrackballSnapshot {
            motion: self.motion,
            pose: self.odometry.pose(),
            trace: *self.odometry.history(),
            sample_count: self.sample_count,
        }
    }

    pub fn motion(&self) -> &MotionBuffer {
        &self.motion
    }

    pub fn frame(&self) -> Option<&PixelFrame> {
        self.frame.as_ref()
    }

    pub fn odometry(&self) -> &Odometry {
        &self.odometry
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn driver_mut(&mut self) -> &mut CommandDriver<T> {
        &mut self.driver
    }

    pub fn release(self) -> T {
        self.driver.release()
    }
}
