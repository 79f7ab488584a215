//! trackball-firmware
//!
//! Sensor-side firmware for a two-sensor optical trackball on the Raspberry
//! Pi Pico 2. Bit-bangs the shared sensor bus and serves the host's
//! one-byte commands over UART0:
//!
//! 1. The host writes a command byte.
//! 2. The dispatcher runs the matching bus routine (register read, motion
//!    burst or pixel grab) against both sensor chips at once.
//! 3. The response bytes go straight back over the UART.
//!
//! The host side lives in `trackball-host`.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::block::ImageDef;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{self, Async, Uart};
use embassy_time::Delay;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use sensor_bus::{
    BusPins, BusTiming, CommandDispatcher, DispatcherConfig, HostLink, PixelPollPolicy, ShiftBus,
};

// ---------------------------------------------------------------------------
// Boot block and interrupt binding
// ---------------------------------------------------------------------------

/// Tell the RP2350 Boot ROM about our application.
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = embassy_rp::block::ImageDef::secure_exe();

bind_interrupts!(struct Irqs {
    UART0_IRQ => uart::InterruptHandler<UART0>;
});

// ---------------------------------------------------------------------------
// Host link
// ---------------------------------------------------------------------------

const BAUD_RATE: u32 = 115_200;

/// UART0 as the dispatcher's host link.
struct UartLink {
    uart: Uart<'static, Async>,
}

impl HostLink for UartLink {
    type Error = uart::Error;

    async fn receive_command(&mut self) -> Result<u8, uart::Error> {
        let mut byte = [0u8; 1];
        self.uart.read(&mut byte).await?;
        Ok(byte[0])
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<(), uart::Error> {
        self.uart.write(bytes).await
    }
}

// ---------------------------------------------------------------------------
// Type aliases
// ---------------------------------------------------------------------------

type TrackballBus = ShiftBus<
    Output<'static>,
    Output<'static>,
    Output<'static>,
    Input<'static>,
    Input<'static>,
    Input<'static>,
    Delay,
>;

type Dispatcher = CommandDispatcher<TrackballBus, UartLink>;

static DISPATCHER: StaticCell<Dispatcher> = StaticCell::new();

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Serves host commands forever.
#[embassy_executor::task]
async fn dispatcher_task(dispatcher: &'static mut Dispatcher) {
    info!("Dispatcher task started");
    dispatcher.run().await
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    info!("trackball-firmware starting");

    // ---- Pin assignments ----------------------------------------------
    // UART_TX  → GP0
    // UART_RX  → GP1
    // CLK      → GP2   shared sensor clock
    // CHSEL    → GP3   shared chip select
    // MOSI     → GP4   shared data out
    // MISO0    → GP5   sensor 0 response
    // MISO1    → GP6   sensor 1 response
    // BUTTON   → GP7   pull-up, high while released
    // BTN_PWR  → GP8   driven high to supply the button
    // -------------------------------------------------------------------

    let mut config = uart::Config::default();
    config.baudrate = BAUD_RATE;
    let uart = Uart::new(
        p.UART0,
        p.PIN_0, // TX
        p.PIN_1, // RX
        Irqs,
        p.DMA_CH0,
        p.DMA_CH1,
        config,
    );

    // Lines start in the idle state: clock and select high, data low.
    let pins = BusPins {
        clock: Output::new(p.PIN_2, Level::High),
        chip_select: Output::new(p.PIN_3, Level::High),
        mosi: Output::new(p.PIN_4, Level::Low),
        miso0: Input::new(p.PIN_5, Pull::None),
        miso1: Input::new(p.PIN_6, Pull::None),
        button: Input::new(p.PIN_7, Pull::Up),
    };

    // Never driven again; dropping it would float the pin.
    let button_supply = Output::new(p.PIN_8, Level::High);
    core::mem::forget(button_supply);

    let bus = ShiftBus::new(pins, Delay, BusTiming::default());
    let config = DispatcherConfig {
        pixel_poll: PixelPollPolicy::Unbounded,
        ..DispatcherConfig::default()
    };
    info!("Dispatcher config: {}", config);

    let dispatcher = DISPATCHER.init(CommandDispatcher::new(bus, UartLink { uart }, config));

    spawner.spawn(unwrap!(dispatcher_task(dispatcher)));

    info!("All tasks spawned");
}
