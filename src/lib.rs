#![cfg_attr(not(test), no_std)]

pub mod coordinator;
pub mod drivers;
pub mod error;
pub mod glyphs;
pub mod matrix;

pub use coordinator::{Coordinator, Indicator, TextSurface};
pub use drivers::button::{Button, ButtonChannel, DeviceState};
pub use error::Error;
pub use matrix::MatrixRenderer;

/// Number of rows and columns in the LED matrix
pub const MATRIX_SIDE: usize = 5;

/// The number of LEDs in the chain we are driving
pub const LED_COUNT: usize = MATRIX_SIDE * MATRIX_SIDE;

/// Bytes on the wire for one full frame (green, red, blue per LED)
pub const FRAME_BYTES: usize = LED_COUNT * 3;

/// Bit rate mandated by the WS2812 protocol
pub const LED_BIT_RATE_HZ: u32 = 800_000;

/// Minimum idle time after a frame before the chain latches it
pub const RESET_GAP_US: u32 = 100;

/// Edges closer than this to the last accepted edge are bounce
pub const DEBOUNCE_MS: u32 = 200;

/// Sleep at the end of every main loop iteration
pub const LOOP_PERIOD_MS: u32 = 10;

/// Red LED toggle period while halted on a fatal bring-up error
pub const FAULT_BLINK_MS: u64 = 200;

/// Serial line speed
pub const UART_BAUD_RATE: u32 = 9600;

/// Text surface position of the echoed serial character
pub const ECHO_POSITION: (i32, i32) = (5, 16);

/// Text surface position of the button A (green) status line
pub const STATUS_A_POSITION: (i32, i32) = (5, 24);

/// Text surface position of the button B (blue) status line
pub const STATUS_B_POSITION: (i32, i32) = (5, 32);

/// Lines shown at boot, drawn 8 pixels apart starting at the top
pub const BANNER: [&str; 2] = ["  Digit Matrix", "  send 0-9"];

/// Horizontal offset of the banner lines
pub const BANNER_X: i32 = 5;
