//! Serial bytes and button levels driven through the whole poll loop.

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    convert::Infallible,
    rc::Rc,
};

use digit_matrix::{
    Coordinator, Error, FRAME_BYTES, Indicator, MatrixRenderer, TextSurface,
    drivers::neopixel::{LedBuffer, LedDriver, TxQueue},
    glyphs::DIGITS,
    matrix::{LIT, UNLIT},
    ECHO_POSITION, LOOP_PERIOD_MS, MATRIX_SIDE, STATUS_A_POSITION, STATUS_B_POSITION,
};
use embassy_futures::block_on;
use embedded_hal::{
    delay::DelayNs,
    digital::{ErrorType as PinErrorType, InputPin, OutputPin},
};
use embedded_io::{ErrorType as IoErrorType, Read, ReadReady};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Str(i32, i32, String),
    Char(i32, i32, char),
    Flush,
    Sleep(u64),
}

#[derive(Clone, Default)]
struct Surface(Rc<RefCell<Vec<Call>>>);

impl Surface {
    fn take(&self) -> Vec<Call> {
        self.0.borrow_mut().drain(..).collect()
    }
}

impl TextSurface for Surface {
    fn draw_string(&mut self, x: i32, y: i32, text: &str) -> Result<(), Error> {
        self.0.borrow_mut().push(Call::Str(x, y, text.to_string()));
        Ok(())
    }

    fn draw_char(&mut self, x: i32, y: i32, ch: char) -> Result<(), Error> {
        self.0.borrow_mut().push(Call::Char(x, y, ch));
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Error> {
        self.0.borrow_mut().push(Call::Flush);
        Ok(())
    }
}

#[derive(Clone, Default)]
struct Serial(Rc<RefCell<VecDeque<u8>>>);

impl Serial {
    fn send(&self, bytes: &[u8]) {
        self.0.borrow_mut().extend(bytes);
    }

    fn pending(&self) -> usize {
        self.0.borrow().len()
    }
}

impl IoErrorType for Serial {
    type Error = Infallible;
}

impl ReadReady for Serial {
    fn read_ready(&mut self) -> Result<bool, Infallible> {
        Ok(!self.0.borrow().is_empty())
    }
}

impl Read for Serial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Infallible> {
        let mut queue = self.0.borrow_mut();
        let mut n = 0;
        while n < buf.len() {
            match queue.pop_front() {
                Some(byte) => buf[n] = byte,
                None => break,
            }
            n += 1;
        }
        Ok(n)
    }
}

#[derive(Clone, Default)]
struct Wire(Rc<RefCell<Vec<u8>>>);

impl TxQueue for Wire {
    fn put_blocking(&mut self, byte: u8) -> Result<(), Error> {
        self.0.borrow_mut().push(byte);
        Ok(())
    }
}

/// Loop sleeps, logged in nanoseconds alongside the surface calls.
struct Clock(Surface);

impl embedded_hal_async::delay::DelayNs for Clock {
    async fn delay_ns(&mut self, ns: u32) {
        self.0.0.borrow_mut().push(Call::Sleep(u64::from(ns)));
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.0.0.borrow_mut().push(Call::Sleep(u64::from(ms) * 1_000_000));
    }
}

struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

/// An active-low button. `true` means held.
#[derive(Clone, Default)]
struct Switch(Rc<Cell<bool>>);

impl PinErrorType for Switch {
    type Error = Infallible;
}

impl InputPin for Switch {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(!self.0.get())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.get())
    }
}

#[derive(Clone, Default)]
struct Lamp(Rc<Cell<bool>>);

impl PinErrorType for Lamp {
    type Error = Infallible;
}

impl OutputPin for Lamp {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.set(true);
        Ok(())
    }
}

/// A display that rejects everything.
struct Broken;

impl TextSurface for Broken {
    fn draw_string(&mut self, _: i32, _: i32, _: &str) -> Result<(), Error> {
        Err(Error::Display)
    }

    fn draw_char(&mut self, _: i32, _: i32, _: char) -> Result<(), Error> {
        Err(Error::Display)
    }

    fn flush(&mut self) -> Result<(), Error> {
        Err(Error::Display)
    }
}

type Rig = Coordinator<Serial, Surface, LedDriver<Wire, NoDelay>, Switch, Lamp>;

#[derive(Default)]
struct Board {
    serial: Serial,
    surface: Surface,
    wire: Wire,
    button_a: Switch,
    button_b: Switch,
    green: Lamp,
    blue: Lamp,
}

impl Board {
    fn coordinator(&self) -> Rig {
        Coordinator::new(
            self.serial.clone(),
            self.surface.clone(),
            MatrixRenderer::new(LedDriver::new(self.wire.clone(), NoDelay)),
            Indicator::green(self.button_a.clone(), self.green.clone()),
            Indicator::blue(self.button_b.clone(), self.blue.clone()),
        )
    }

    fn wire_bytes(&self) -> Vec<u8> {
        self.wire.0.borrow().clone()
    }
}

fn glyph_frame(digit: usize) -> LedBuffer {
    let mut frame = [UNLIT; 25];
    for (i, pixel) in frame.iter_mut().enumerate() {
        if DIGITS[digit][i / MATRIX_SIDE][i % MATRIX_SIDE] {
            *pixel = LIT;
        }
    }
    frame
}

fn status(position: (i32, i32), text: &str) -> Call {
    Call::Str(position.0, position.1, text.to_string())
}

#[test]
fn serial_digit_is_echoed_and_rendered() {
    let board = Board::default();
    let mut app = board.coordinator();
    board.serial.send(b"7");

    app.poll().unwrap();

    let calls = board.surface.take();
    assert_eq!(calls[0], Call::Char(ECHO_POSITION.0, ECHO_POSITION.1, '7'));
    assert_eq!(calls[1], Call::Flush);
    assert_eq!(*app.matrix().frame(), glyph_frame(7));

    let bytes = board.wire_bytes();
    assert_eq!(bytes.len(), FRAME_BYTES);
    for (i, grb) in bytes.chunks(3).enumerate() {
        let lit = DIGITS[7][i / MATRIX_SIDE][i % MATRIX_SIDE];
        let expected: [u8; 3] = if lit { [0, 255, 0] } else { [0, 0, 0] };
        assert_eq!(grb, expected, "pixel {i}");
    }
}

#[test]
fn non_digit_is_echoed_only() {
    let board = Board::default();
    let mut app = board.coordinator();
    board.serial.send(b"3");
    app.poll().unwrap();
    let frame = *app.matrix().frame();
    let written = board.wire_bytes().len();
    board.surface.take();

    board.serial.send(b"x");
    app.poll().unwrap();

    let calls = board.surface.take();
    assert_eq!(calls[0], Call::Char(ECHO_POSITION.0, ECHO_POSITION.1, 'x'));
    assert_eq!(*app.matrix().frame(), frame);
    assert_eq!(board.wire_bytes().len(), written);
}

#[test]
fn one_byte_per_iteration() {
    let board = Board::default();
    let mut app = board.coordinator();
    board.serial.send(b"12");

    app.poll().unwrap();
    assert_eq!(board.serial.pending(), 1);
    assert_eq!(*app.matrix().frame(), glyph_frame(1));

    app.poll().unwrap();
    assert_eq!(board.serial.pending(), 0);
    assert_eq!(*app.matrix().frame(), glyph_frame(2));
    assert_eq!(board.wire_bytes().len(), 2 * FRAME_BYTES);
}

#[test]
fn idle_serial_skips_straight_to_the_buttons() {
    let board = Board::default();
    let mut app = board.coordinator();

    app.poll().unwrap();

    assert_eq!(
        board.surface.take(),
        vec![
            status(STATUS_A_POSITION, "Green LED: OFF"),
            Call::Flush,
            status(STATUS_B_POSITION, "Blue LED: OFF"),
            Call::Flush,
        ]
    );
    assert!(board.wire_bytes().is_empty());
}

#[test]
fn button_a_level_follows_within_one_iteration() {
    let board = Board::default();
    let mut app = board.coordinator();

    board.button_a.0.set(true);
    app.poll().unwrap();
    assert!(board.green.0.get());
    assert!(!board.blue.0.get());
    assert!(board.surface.take().contains(&status(STATUS_A_POSITION, "Green LED: ON ")));

    board.button_a.0.set(false);
    app.poll().unwrap();
    assert!(!board.green.0.get());
    assert!(board.surface.take().contains(&status(STATUS_A_POSITION, "Green LED: OFF")));
}

#[test]
fn button_b_drives_blue_only() {
    let board = Board::default();
    let mut app = board.coordinator();

    board.button_b.0.set(true);
    app.poll().unwrap();

    assert!(board.blue.0.get());
    assert!(!board.green.0.get());
    let calls = board.surface.take();
    assert!(calls.contains(&status(STATUS_B_POSITION, "Blue LED: ON ")));
    assert!(calls.contains(&status(STATUS_A_POSITION, "Green LED: OFF")));
}

#[test]
fn status_is_redrawn_every_iteration() {
    let board = Board::default();
    let mut app = board.coordinator();
    board.button_a.0.set(true);

    for _ in 0..3 {
        app.poll().unwrap();
    }

    let calls = board.surface.take();
    assert_eq!(calls.iter().filter(|c| **c == Call::Flush).count(), 6);
    assert_eq!(
        calls
            .iter()
            .filter(|c| **c == status(STATUS_A_POSITION, "Green LED: ON "))
            .count(),
        3
    );
}

#[test]
fn banner_is_drawn_then_flushed() {
    let board = Board::default();
    let mut app = board.coordinator();

    app.show_banner().unwrap();

    let calls = board.surface.take();
    assert_eq!(calls.len(), digit_matrix::BANNER.len() + 1);
    for (row, line) in digit_matrix::BANNER.iter().enumerate() {
        assert_eq!(
            calls[row],
            Call::Str(digit_matrix::BANNER_X, row as i32 * 8, line.to_string())
        );
    }
    assert_eq!(calls.last(), Some(&Call::Flush));
}

#[test]
fn failed_echo_still_renders_and_services_buttons() {
    let board = Board::default();
    let mut app = Coordinator::new(
        board.serial.clone(),
        Broken,
        MatrixRenderer::new(LedDriver::new(board.wire.clone(), NoDelay)),
        Indicator::green(board.button_a.clone(), board.green.clone()),
        Indicator::blue(board.button_b.clone(), board.blue.clone()),
    );
    board.serial.send(b"5");
    board.button_b.0.set(true);

    assert_eq!(app.poll(), Err(Error::Display));
    assert_eq!(*app.matrix().frame(), glyph_frame(5));
    assert!(board.blue.0.get());
}

#[test]
fn each_step_polls_once_then_sleeps() {
    let board = Board::default();
    let mut app = board.coordinator();
    let mut clock = Clock(board.surface.clone());
    let sleep = Call::Sleep(u64::from(LOOP_PERIOD_MS) * 1_000_000);
    board.serial.send(b"42");

    for _ in 0..3 {
        block_on(app.step(&mut clock)).unwrap();
    }

    let calls = board.surface.take();
    let iterations: Vec<&[Call]> = calls.split_inclusive(|c| *c == sleep).collect();
    assert_eq!(iterations.len(), 3);
    assert_eq!(iterations[0][0], Call::Char(ECHO_POSITION.0, ECHO_POSITION.1, '4'));
    assert_eq!(iterations[1][0], Call::Char(ECHO_POSITION.0, ECHO_POSITION.1, '2'));
    assert_eq!(iterations[2][0], status(STATUS_A_POSITION, "Green LED: OFF"));
    for iteration in iterations {
        assert_eq!(iteration.last(), Some(&sleep));
        assert_eq!(iteration.iter().filter(|c| matches!(c, Call::Sleep(_))).count(), 1);
        assert_eq!(iteration[iteration.len() - 2], Call::Flush);
    }
    assert_eq!(*app.matrix().frame(), glyph_frame(2));
}

#[test]
fn failed_poll_still_sleeps() {
    let board = Board::default();
    let mut app = Coordinator::new(
        board.serial.clone(),
        Broken,
        MatrixRenderer::new(LedDriver::new(board.wire.clone(), NoDelay)),
        Indicator::green(board.button_a.clone(), board.green.clone()),
        Indicator::blue(board.button_b.clone(), board.blue.clone()),
    );
    let mut clock = Clock(board.surface.clone());

    assert_eq!(block_on(app.step(&mut clock)), Err(Error::Display));
    assert_eq!(
        board.surface.take(),
        vec![Call::Sleep(u64::from(LOOP_PERIOD_MS) * 1_000_000)]
    );
}
