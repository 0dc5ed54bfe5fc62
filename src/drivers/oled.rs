use embedded_graphics::{
    Drawable,
    mono_font::{MonoTextStyle, MonoTextStyleBuilder, ascii::FONT_5X8},
    pixelcolor::BinaryColor,
    prelude::Point,
    text::{Baseline, Text},
};
use ssd1306::{Ssd1306, mode::BufferedGraphicsMode, prelude::*};

use crate::{Error, TextSurface};

/// SSD1306 in buffered graphics mode, used as the character display.
///
/// Text is drawn with an opaque background so a shorter string fully
/// replaces whatever was under it.
pub struct OledSurface<DI, SIZE: DisplaySize> {
    display: Ssd1306<DI, SIZE, BufferedGraphicsMode<SIZE>>,
    style: MonoTextStyle<'static, BinaryColor>,
}

impl<DI, SIZE> OledSurface<DI, SIZE>
where
    DI: WriteOnlyDataCommand,
    SIZE: DisplaySize,
{
    /// Initialise the panel and blank it.
    pub fn new(mut display: Ssd1306<DI, SIZE, BufferedGraphicsMode<SIZE>>) -> Result<Self, Error> {
        display.init().map_err(|_| Error::Display)?;
        display.clear_buffer();
        display.flush().map_err(|_| Error::Display)?;
        let style = MonoTextStyleBuilder::new()
            .font(&FONT_5X8)
            .text_color(BinaryColor::On)
            .background_color(BinaryColor::Off)
            .build();
        Ok(Self { display, style })
    }
}

impl<DI, SIZE> TextSurface for OledSurface<DI, SIZE>
where
    DI: WriteOnlyDataCommand,
    SIZE: DisplaySize,
{
    fn draw_string(&mut self, x: i32, y: i32, text: &str) -> Result<(), Error> {
        Text::with_baseline(text, Point::new(x, y), self.style, Baseline::Top)
            .draw(&mut self.display)
            .map_err(|_| Error::Display)?;
        Ok(())
    }

    fn draw_char(&mut self, x: i32, y: i32, ch: char) -> Result<(), Error> {
        let mut utf8 = [0_u8; 4];
        self.draw_string(x, y, ch.encode_utf8(&mut utf8))
    }

    fn flush(&mut self) -> Result<(), Error> {
        self.display.flush().map_err(|_| Error::Display)
    }
}
