pub mod button;
pub mod neopixel;
pub mod oled;
#[cfg(feature = "embedded")]
pub mod rmt;
