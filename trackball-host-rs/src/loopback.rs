//! End-to-end exchange between the dispatcher and the host session over
//! in-memory pipes.

use core::convert::Infallible;

use embassy_futures::block_on;
use embassy_futures::join::join;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::pipe::Pipe;

use sensor_bus::{BusError, CommandDispatcher, DispatcherConfig, HostLink, SensorBus, SensorPair};
use trackball::protocol::{
    AUX_BUTTON_RELEASED, CHIP_RESET, DELTA_X, DELTA_Y, DISABLE_REST_PAYLOAD, MOTION_STATUS,
    NAV_CTRL2, PIXEL_GRAB, PIXEL_VALID, PIXEL_VALUE_MASK, PRODUCT_ID, RESET_PAYLOAD, REV_ID,
    SURFACE_QUALITY, WRITE_FLAG,
};
use trackball::{ChipModel, Command, OdometryConfig, OdometryOutput, OutputMode};

use crate::driver::DriverConfig;
use crate::error::HostError;
use crate::session::Trackball;
use crate::transport::Transport;

type BytePipe = Pipe<CriticalSectionRawMutex, 64>;

struct PipeLink<'a> {
    commands: &'a BytePipe,
    responses: &'a BytePipe,
}

impl HostLink for PipeLink<'_> {
    type Error = Infallible;

    async fn receive_command(&mut self) -> Result<u8, Infallible> {
        let mut byte = [0u8; 1];
        self.commands.read(&mut byte).await;
        Ok(byte[0])
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<(), Infallible> {
        self.responses.write_all(bytes).await;
        Ok(())
    }
}

struct PipeTransport<'a> {
    commands: &'a BytePipe,
    responses: &'a BytePipe,
}

impl Transport for PipeTransport<'_> {
    type Error = Infallible;

    async fn write(&mut self, bytes: &[u8]) -> Result<(), Infallible> {
        self.commands.write_all(bytes).await;
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Infallible> {
        Ok(self.responses.read(buf).await)
    }

    fn is_busy(&mut self) -> bool {
        false
    }
}

/// Register file for two chips. Pixel reads alternate between not ready
/// and the next pixel.
struct EmulatedChips {
    registers: [[u8; 2]; 0x40],
    address: u8,
    pending_write: Option<u8>,
    writes: Vec<(u8, u8)>,
    next_pixel: usize,
    pixel_ready: bool,
}

impl EmulatedChips {
    fn new() -> Self {
        let mut registers = [[0u8; 2]; 0x40];
        registers[PRODUCT_ID as usize] = [0x29, 0x09];
        registers[REV_ID as usize] = [0x01, 0x02];
        registers[DELTA_X as usize] = [0xFF, 0x01];
        registers[DELTA_Y as usize] = [0x00, 0xFE];
        registers[SURFACE_QUALITY as usize] = [0x32, 0x33];
        Self {
            registers,
            address: 0,
            pending_write: None,
            writes: Vec::new(),
            next_pixel: 0,
            pixel_ready: false,
        }
    }

    fn pixel(n: usize) -> [u8; 2] {
        [(n % 128) as u8, ((n * 3) % 128) as u8]
    }

    fn read_pixel(&mut self) -> [u8; 2] {
        self.pixel_ready = !self.pixel_ready;
        if !self.pixel_ready {
            return [0, 0];
        }
        let [a, b] = Self::pixel(self.next_pixel);
        self.next_pixel += 1;
        [a | PIXEL_VALID, b | PIXEL_VALID]
    }
}

impl SensorBus for EmulatedChips {
    fn send_byte(&mut self, value: u8) -> Result<(), BusError> {
        if let Some(register) = self.pending_write.take() {
            self.writes.push((register, value));
            if register == PIXEL_GRAB {
                self.next_pixel = 0;
            }
        } else if value & WRITE_FLAG != 0 {
            self.pending_write = Some(value & !WRITE_FLAG);
        } else {
            self.address = value;
        }
        Ok(())
    }

    fn read_pair(&mut self) -> Result<SensorPair, BusError> {
        let bytes = match self.address {
            PIXEL_GRAB => self.read_pixel(),
            address => self.registers[address as usize],
        };
        Ok(SensorPair::new(bytes, AUX_BUTTON_RELEASED))
    }

    fn release(&mut self) -> Result<(), BusError> {
        Ok(())
    }
}

#[test]
fn session_against_dispatcher() {
    let commands = BytePipe::new();
    let responses = BytePipe::new();

    let link = PipeLink {
        commands: &commands,
        responses: &responses,
    };
    let mut dispatcher = CommandDispatcher::new(EmulatedChips::new(), link, DispatcherConfig::default());

    let transport = PipeTransport {
        commands: &commands,
        responses: &responses,
    };
    let mut tb = Trackball::new(transport, DriverConfig::default(), OdometryConfig::default());

    // prepare (2), sensor_info (2), acquire (1), sensor_view (2)
    let device = async {
        let mut served = Vec::new();
        for _ in 0..7 {
            served.push(dispatcher.handle_next().await.unwrap());
        }
        served
    };
    let host = async {
        tb.prepare().await.unwrap();
        let info = tb.sensor_info().await.unwrap();
        let acquired = tb.acquire(OutputMode::PerSensor).await.unwrap();
        let frame = *tb.sensor_view().await.unwrap();
        (info, acquired, frame)
    };
    let (served, (info, acquired, frame)) = block_on(join(device, host));

    assert_eq!(
        served,
        [
            Command::ChipReset,
            Command::DisableRestMode,
            Command::ReadRegister(PRODUCT_ID),
            Command::ReadRegister(REV_ID),
            Command::Motion,
            Command::PixelGrab,
            Command::ReadRegister(SURFACE_QUALITY),
        ]
    );

    assert_eq!(info[0].model, ChipModel::Adns5090);
    assert_eq!(info[1].model, ChipModel::Adns3050);
    assert_eq!([info[0].revision, info[1].revision], [1, 2]);

    assert_eq!(acquired.sample.dx, [-1, 1]);
    assert_eq!(acquired.sample.dy, [0, -2]);
    assert_eq!(acquired.output, OdometryOutput::PerSensor { x: [-1, 1], y: [0, -2] });

    for (row, col) in [(0, 0), (2, 3), (18, 18)] {
        let [a, b] = EmulatedChips::pixel(row * 19 + col);
        assert_eq!(frame.pixel(0, row, col), Some(a & PIXEL_VALUE_MASK));
        assert_eq!(frame.pixel(1, row, col), Some(b & PIXEL_VALUE_MASK));
    }

    assert_eq!(tb.motion().quality, [50, 51]);
    assert!(tb.motion().button_released);
    assert_eq!(tb.sample_count(), 2);

    let (chips, _) = dispatcher.into_parts();
    assert_eq!(
        chips.writes,
        [
            (CHIP_RESET, RESET_PAYLOAD),
            (NAV_CTRL2, DISABLE_REST_PAYLOAD),
            (PIXEL_GRAB, 0x00),
        ]
    );
}

#[test]
fn command_addresses_are_not_sent_as_register_reads() {
    let commands = BytePipe::new();
    let responses = BytePipe::new();

    let link = PipeLink {
        commands: &commands,
        responses: &responses,
    };
    let mut dispatcher = CommandDispatcher::new(EmulatedChips::new(), link, DispatcherConfig::default());

    let transport = PipeTransport {
        commands: &commands,
        responses: &responses,
    };
    let mut tb = Trackball::new(transport, DriverConfig::default(), OdometryConfig::default());

    let device = async {
        for _ in 0..2 {
            dispatcher.handle_next().await.unwrap();
        }
    };
    let host = async {
        let mut rejected = [false; 2];
        for (slot, register) in rejected.iter_mut().zip([MOTION_STATUS, PIXEL_GRAB]) {
            *slot = matches!(
                tb.driver_mut().read_register(register).await,
                Err(HostError::InvalidRegister(r)) if r == register
            );
        }
        let info = tb.sensor_info().await.unwrap();
        (rejected, info)
    };
    let ((), (rejected, info)) = block_on(join(device, host));

    assert_eq!(rejected, [true, true]);
    assert_eq!(info[0].model, ChipModel::Adns5090);
    assert_eq!(info[1].model, ChipModel::Adns3050);
}
