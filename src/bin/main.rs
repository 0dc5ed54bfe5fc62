#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]

use core::{cell::RefCell, convert::Infallible};

use critical_section::Mutex;
use defmt::{error, info, trace};
use digit_matrix::{
    Button, Coordinator, DeviceState, Error, FAULT_BLINK_MS, Indicator, MatrixRenderer,
    UART_BAUD_RATE,
    drivers::{
        neopixel::LedDriver,
        oled::OledSurface,
        rmt::{RMT_SOURCE_MHZ, RmtPool},
    },
};
use embassy_executor::Spawner;
use embassy_time::{Delay, Duration, Instant, Timer};
use embedded_hal::digital::{ErrorType, InputPin};
use esp_hal::{
    Config,
    clock::CpuClock,
    delay::Delay as BusyDelay,
    gpio::{Event, Input, InputConfig, Io, Level, Output, OutputConfig, Pull},
    handler,
    i2c::master::{Config as I2cConfig, I2c},
    rmt::Rmt,
    time::Rate,
    timer::systimer::SystemTimer,
    uart::{Config as UartConfig, Uart},
};
use panic_rtt_target as _;
use ssd1306::{I2CDisplayInterface, Ssd1306, prelude::*};

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

/// Debounce state written by the GPIO interrupt handler. The handler takes no arguments, so this
/// is the one instance everything else borrows.
static DEVICE: DeviceState = DeviceState::new();

/// A button input shared between the interrupt handler (edge status) and the main loop (level).
type ButtonCell = Mutex<RefCell<Option<Input<'static>>>>;

static BUTTON_A: ButtonCell = Mutex::new(RefCell::new(None));
static BUTTON_B: ButtonCell = Mutex::new(RefCell::new(None));

/// Level access to a button that lives in a [`ButtonCell`].
struct SharedButton(&'static ButtonCell);

impl ErrorType for SharedButton {
    type Error = Infallible;
}

impl InputPin for SharedButton {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        // A pin that is not installed yet reads as released
        Ok(critical_section::with(|cs| {
            self.0.borrow_ref(cs).as_ref().is_none_or(|pin| pin.is_high())
        }))
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.is_high()?)
    }
}

#[handler]
fn on_button_edge() {
    let now_ms = Instant::now().as_millis() as u32;
    for (cell, button) in [(&BUTTON_A, Button::A), (&BUTTON_B, Button::B)] {
        let fired = critical_section::with(|cs| {
            let mut pin = cell.borrow_ref_mut(cs);
            let Some(pin) = pin.as_mut() else {
                return false;
            };
            let fired = pin.is_interrupt_set();
            if fired {
                pin.clear_interrupt();
            }
            fired
        });
        if fired && DEVICE.button(button).on_falling_edge(now_ms) {
            trace!("IRQ: Button {} pressed at {}ms", button, now_ms);
        }
    }
}

/// Nothing useful can run without the LED chain or the display. Blink the red LED forever.
async fn halt(e: Error, mut red: Output<'static>) -> ! {
    error!("MAIN: Halting, {}", e);
    loop {
        red.toggle();
        Timer::after(Duration::from_millis(FAULT_BLINK_MS)).await;
    }
}

#[esp_hal_embassy::main]
async fn main(_spawner: Spawner) {
    rtt_target::rtt_init_defmt!();

    let peripherals = esp_hal::init(Config::default().with_cpu_clock(CpuClock::max()));
    let timer0 = SystemTimer::new(peripherals.SYSTIMER);
    esp_hal_embassy::init(timer0.alarm0);

    // The red LED is only used to signal a fault
    let red = Output::new(peripherals.GPIO10, Level::Low, OutputConfig::default());
    let green = Output::new(peripherals.GPIO4, Level::Low, OutputConfig::default());
    let blue = Output::new(peripherals.GPIO7, Level::Low, OutputConfig::default());

    let rmt = Rmt::new(peripherals.RMT, Rate::from_mhz(RMT_SOURCE_MHZ))
        .expect("Failed to initialise RMT");
    let chain = match LedDriver::init(
        peripherals.GPIO2,
        RmtPool::new(rmt.channel0),
        RmtPool::new(rmt.channel1),
        BusyDelay::new(),
    ) {
        Ok(chain) => chain,
        Err(e) => halt(e, red).await,
    };
    let mut matrix = MatrixRenderer::new(chain);
    if let Err(e) = matrix.clear() {
        error!("MAIN: Blanking the matrix failed: {}", e);
    }

    let i2c = I2c::new(peripherals.I2C0, I2cConfig::default())
        .expect("Failed to initialise I2C0")
        .with_scl(peripherals.GPIO6)
        .with_sda(peripherals.GPIO5);
    let display = Ssd1306::new(
        I2CDisplayInterface::new(i2c),
        DisplaySize128x64,
        DisplayRotation::Rotate0,
    )
    .into_buffered_graphics_mode();
    let surface = match OledSurface::new(display) {
        Ok(surface) => surface,
        Err(e) => halt(e, red).await,
    };

    let serial = Uart::new(
        peripherals.UART1,
        UartConfig::default().with_baudrate(UART_BAUD_RATE),
    )
    .expect("Failed to initialise UART1")
    .with_rx(peripherals.GPIO1)
    .with_tx(peripherals.GPIO0);

    // Buttons are active low, pressed pulls the line to ground
    let mut io = Io::new(peripherals.IO_MUX);
    io.set_interrupt_handler(on_button_edge);
    let config = InputConfig::default().with_pull(Pull::Up);
    let mut button_a = Input::new(peripherals.GPIO9, config);
    let mut button_b = Input::new(peripherals.GPIO3, config);
    critical_section::with(|cs| {
        button_a.listen(Event::FallingEdge);
        button_b.listen(Event::FallingEdge);
        BUTTON_A.borrow_ref_mut(cs).replace(button_a);
        BUTTON_B.borrow_ref_mut(cs).replace(button_b);
    });

    let mut coordinator = Coordinator::new(
        serial,
        surface,
        matrix,
        Indicator::green(SharedButton(&BUTTON_A), green),
        Indicator::blue(SharedButton(&BUTTON_B), blue),
    );
    if let Err(e) = coordinator.show_banner() {
        error!("MAIN: Banner failed: {}", e);
    }

    info!("MAIN: Send 0-9 on UART1 at {} baud", UART_BAUD_RATE);
    coordinator.run(Delay).await
}
