//! Unified error type.
//!
//! Every variant carries only fixed-size data so the type stays `Copy` and
//! can be logged with `defmt` on target.

/// Top-level error type used across the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// No timing generator was free in either pool for the LED chain.
    NoTimingResource,

    /// The LED chain transmit queue rejected a byte.
    Transmit,

    /// A digit outside 0..=9 reached the matrix renderer.
    DigitOutOfRange(u8),

    /// Drawing to or flushing the text surface failed.
    Display,

    /// The serial transport failed to report or deliver a byte.
    Serial,

    /// A GPIO level read or write failed.
    Pin,
}
