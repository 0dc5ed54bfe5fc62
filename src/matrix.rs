//! Digit rendering on the 5x5 LED matrix.
//!
//! Pixel `i` of the frame is row `i / 5`, column `i % 5`, rows running top
//! to bottom. Lit glyph cells are full red, everything else is off.

use smart_leds::RGB8;

use crate::{
    Error, LED_COUNT,
    drivers::neopixel::{FrameWriter, LedBuffer},
    glyphs,
};

/// Colour of a lit cell
pub const LIT: RGB8 = RGB8 { r: 255, g: 0, b: 0 };

/// Colour of an unlit cell
pub const UNLIT: RGB8 = RGB8 { r: 0, g: 0, b: 0 };

/// Owns the frame buffer and the chain it is flushed to.
pub struct MatrixRenderer<W> {
    frame: LedBuffer,
    chain: W,
}

impl<W: FrameWriter> MatrixRenderer<W> {
    pub fn new(chain: W) -> Self {
        Self {
            frame: [UNLIT; LED_COUNT],
            chain,
        }
    }

    /// Write an all-off frame, replacing whatever the chain powered up with.
    pub fn clear(&mut self) -> Result<(), Error> {
        self.frame.fill(UNLIT);
        self.chain.write(&self.frame)
    }

    /// Show `digit` on the matrix.
    ///
    /// Every cell is rewritten, then the whole frame goes to the chain in one write. Anything
    /// outside 0..=9 is rejected before the frame is touched.
    pub fn display_digit(&mut self, digit: u8) -> Result<(), Error> {
        let glyph = glyphs::glyph(digit).ok_or(Error::DigitOutOfRange(digit))?;
        for (i, pixel) in self.frame.iter_mut().enumerate() {
            *pixel = if glyphs::is_lit(glyph, i) { LIT } else { UNLIT };
        }
        #[cfg(feature = "defmt")]
        defmt::debug!("MATRIX: Showing digit {}", digit);
        self.chain.write(&self.frame)
    }

    /// The frame as last composed.
    pub fn frame(&self) -> &LedBuffer {
        &self.frame
    }
}
