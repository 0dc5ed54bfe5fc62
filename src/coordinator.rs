//! The main poll loop.
//!
//! One iteration takes at most one serial byte, mirrors both button levels onto their indicator
//! LEDs and status lines, then sleeps. The sleep is the only yield point.

use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal_async::delay::DelayNs;
use embedded_io::{Read, ReadReady};
use heapless::String;
use ufmt::uwrite;

use crate::{
    BANNER, BANNER_X, ECHO_POSITION, Error, LOOP_PERIOD_MS, STATUS_A_POSITION, STATUS_B_POSITION,
    drivers::{button::is_held, neopixel::FrameWriter},
    matrix::MatrixRenderer,
};

/// The character display as the loop sees it.
pub trait TextSurface {
    fn draw_string(&mut self, x: i32, y: i32, text: &str) -> Result<(), Error>;
    fn draw_char(&mut self, x: i32, y: i32, ch: char) -> Result<(), Error>;
    /// Push everything drawn so far to the panel.
    fn flush(&mut self) -> Result<(), Error>;
}

/// Wide enough for the longest label plus `": OFF"`.
pub type StatusLine = String<20>;

/// `"<label>: ON "` or `"<label>: OFF"`. Both are the same width so either overwrites the other.
pub fn status_line(label: &str, on: bool) -> StatusLine {
    let mut line = StatusLine::new();
    let state = if on { "ON " } else { "OFF" };
    let written = uwrite!(line, "{}: {}", label, state);
    debug_assert!(written.is_ok(), "status line label too long");
    line
}

/// A button whose level is mirrored on an indicator LED and a status line.
pub struct Indicator<I, O> {
    label: &'static str,
    position: (i32, i32),
    input: I,
    led: O,
}

impl<I: InputPin, O: OutputPin> Indicator<I, O> {
    /// Button A driving the green LED.
    pub fn green(input: I, led: O) -> Self {
        Self {
            label: "Green LED",
            position: STATUS_A_POSITION,
            input,
            led,
        }
    }

    /// Button B driving the blue LED.
    pub fn blue(input: I, led: O) -> Self {
        Self {
            label: "Blue LED",
            position: STATUS_B_POSITION,
            input,
            led,
        }
    }

    /// Mirror the button level on the LED, then redraw and flush the status line.
    ///
    /// The line is redrawn even when a pin fails. An unreadable button counts as released.
    fn service<S: TextSurface>(&mut self, surface: &mut S) -> Result<(), Error> {
        let held = is_held(&mut self.input);
        let on = held.unwrap_or(false);
        let lit = self.led.set_state(on.into()).map_err(|_| Error::Pin);
        let (x, y) = self.position;
        let drawn = surface
            .draw_string(x, y, &status_line(self.label, on))
            .and_then(|()| surface.flush());
        held.and(lit).and(drawn)
    }
}

pub struct Coordinator<R, S, W, I, O> {
    serial: R,
    surface: S,
    matrix: MatrixRenderer<W>,
    green: Indicator<I, O>,
    blue: Indicator<I, O>,
}

impl<R, S, W, I, O> Coordinator<R, S, W, I, O>
where
    R: Read + ReadReady,
    S: TextSurface,
    W: FrameWriter,
    I: InputPin,
    O: OutputPin,
{
    pub fn new(
        serial: R,
        surface: S,
        matrix: MatrixRenderer<W>,
        green: Indicator<I, O>,
        blue: Indicator<I, O>,
    ) -> Self {
        Self {
            serial,
            surface,
            matrix,
            green,
            blue,
        }
    }

    /// Draw the start-up lines, 8 pixels apart from the top of the surface.
    pub fn show_banner(&mut self) -> Result<(), Error> {
        for (row, line) in (0_i32..).zip(BANNER) {
            self.surface.draw_string(BANNER_X, row * 8, line)?;
        }
        self.surface.flush()
    }

    /// One pass of the loop, without the sleep.
    ///
    /// A failing step does not stop the ones after it. The first error is reported.
    pub fn poll(&mut self) -> Result<(), Error> {
        let serial = self.service_serial();
        let green = self.green.service(&mut self.surface);
        let blue = self.blue.service(&mut self.surface);
        serial.and(green).and(blue)
    }

    /// One full iteration: poll, then sleep `LOOP_PERIOD_MS`.
    ///
    /// The sleep happens whatever the poll returned, and it is the only await.
    pub async fn step<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error> {
        let polled = self.poll();
        delay.delay_ms(LOOP_PERIOD_MS).await;
        polled
    }

    /// Step forever.
    pub async fn run<D: DelayNs>(mut self, mut delay: D) -> ! {
        #[cfg(feature = "defmt")]
        defmt::info!("LOOP: Starting main loop");
        loop {
            if let Err(_e) = self.step(&mut delay).await {
                #[cfg(feature = "defmt")]
                defmt::warn!("LOOP: {}", _e);
            }
        }
    }

    pub fn matrix(&self) -> &MatrixRenderer<W> {
        &self.matrix
    }

    /// Consume at most one byte, echo it, and render it if it is a digit.
    fn service_serial(&mut self) -> Result<(), Error> {
        if !self.serial.read_ready().map_err(|_| Error::Serial)? {
            return Ok(());
        }
        let mut byte = [0_u8; 1];
        if self.serial.read(&mut byte).map_err(|_| Error::Serial)? == 0 {
            return Ok(());
        }
        let byte = byte[0];

        let (x, y) = ECHO_POSITION;
        let echoed = self
            .surface
            .draw_char(x, y, char::from(byte))
            .and_then(|()| self.surface.flush());
        if byte.is_ascii_digit() {
            self.matrix.display_digit(byte - b'0')?;
        }
        echoed
    }
}
