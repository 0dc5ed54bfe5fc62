//! Debounced button edges and raw button levels.
//!
//! Both buttons are active low with the internal pull-up enabled. Falling
//! edges are filtered here from interrupt context; the main loop samples the
//! level separately and never looks at the filtered edges.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use embedded_hal::digital::InputPin;

use crate::{DEBOUNCE_MS, Error};

/// The two physical buttons on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Button {
    A,
    B,
}

/// Debounce state for one button.
///
/// Written only by that button's edge handler, read by anyone. Every field
/// is a single word and is only ever loaded or stored, never read-modify-written,
/// so it works on cores without atomic compare-and-swap.
pub struct ButtonChannel {
    last_accepted_ms: AtomicU32,
    accepted_any: AtomicBool,
    pressed: AtomicBool,
}

impl ButtonChannel {
    pub const fn new() -> Self {
        Self {
            last_accepted_ms: AtomicU32::new(0),
            accepted_any: AtomicBool::new(false),
            pressed: AtomicBool::new(false),
        }
    }

    /// Handle a falling edge seen at `now_ms` (milliseconds since boot, wrapping).
    ///
    /// Returns `true` if the edge was accepted. Rejected edges leave the state untouched.
    pub fn on_falling_edge(&self, now_ms: u32) -> bool {
        if self.accepted_any.load(Ordering::Acquire) {
            let last = self.last_accepted_ms.load(Ordering::Relaxed);
            if now_ms.wrapping_sub(last) < DEBOUNCE_MS {
                return false;
            }
        }
        self.last_accepted_ms.store(now_ms, Ordering::Relaxed);
        self.accepted_any.store(true, Ordering::Release);
        self.pressed.store(true, Ordering::Release);
        true
    }

    /// Latched once any edge has been accepted. Nothing clears it.
    pub fn is_latched(&self) -> bool {
        self.pressed.load(Ordering::Acquire)
    }

    /// Time of the last accepted edge, if there ever was one.
    pub fn last_accepted_ms(&self) -> Option<u32> {
        self.accepted_any
            .load(Ordering::Acquire)
            .then(|| self.last_accepted_ms.load(Ordering::Relaxed))
    }
}

impl Default for ButtonChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the edge handlers share with the rest of the firmware.
pub struct DeviceState {
    a: ButtonChannel,
    b: ButtonChannel,
}

impl DeviceState {
    pub const fn new() -> Self {
        Self {
            a: ButtonChannel::new(),
            b: ButtonChannel::new(),
        }
    }

    pub fn button(&self, button: Button) -> &ButtonChannel {
        match button {
            Button::A => &self.a,
            Button::B => &self.b,
        }
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::new()
    }
}

/// Instantaneous level of an active-low button, read straight from the pin.
pub fn is_held<P: InputPin>(pin: &mut P) -> Result<bool, Error> {
    pin.is_low().map_err(|_| Error::Pin)
}
