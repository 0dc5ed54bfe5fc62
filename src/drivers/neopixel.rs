use embedded_hal::delay::DelayNs;
use smart_leds::RGB8;

use crate::{Error, LED_COUNT, RESET_GAP_US};

/// Convenience type so we speak the same language when dealing with frames etc.
pub type LedBuffer = [RGB8; LED_COUNT];

/// A hardware transmit queue that shifts whole bytes onto the LED data line.
pub trait TxQueue {
    /// Push one byte, most significant bit first, blocking while the queue is full.
    fn put_blocking(&mut self, byte: u8) -> Result<(), Error>;

    /// Block until every queued byte has left the data line.
    fn flush(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

/// A pool of timing generators that can be bound to the LED data pin.
pub trait TimingPool<P> {
    type Queue: TxQueue;

    /// Claims an unused generator, binds it to `pin` and configures it for `bit_rate_hz`.
    ///
    /// `Err(Some(pin))` means the pool had nothing free and hands the pin back untouched, so
    /// another pool can be tried. `Err(None)` means the pin was consumed by a failed
    /// configuration.
    fn claim(self, pin: P, bit_rate_hz: u32) -> Result<Self::Queue, Option<P>>;
}

/// Receives complete frames. The seam between the renderer and the chain driver.
pub trait FrameWriter {
    fn write(&mut self, frame: &LedBuffer) -> Result<(), Error>;
}

/// High and low durations of one protocol bit, in timing generator ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitTiming {
    pub zero: (u16, u16),
    pub one: (u16, u16),
}

impl BitTiming {
    /// WS2812 timing for a generator ticking at `tick_hz`.
    ///
    /// A bit period is 1.25 us at 800 kHz. A `0` is high for 8/25 of the period (0.4 us) and a
    /// `1` for 16/25 (0.8 us), low for the rest.
    pub const fn for_rate(tick_hz: u32, bit_rate_hz: u32) -> Self {
        let period = tick_hz / bit_rate_hz;
        let zero_high = period * 8 / 25;
        let one_high = period * 16 / 25;
        Self {
            zero: (zero_high as u16, (period - zero_high) as u16),
            one: (one_high as u16, (period - one_high) as u16),
        }
    }

    /// Tick pairs for the eight bits of `byte`, most significant first.
    pub fn encode(&self, byte: u8) -> [(u16, u16); 8] {
        let mut bits = [self.zero; 8];
        for (i, bit) in bits.iter_mut().enumerate() {
            if byte & (0x80 >> i) != 0 {
                *bit = self.one;
            }
        }
        bits
    }
}

/// Holds the state needed to drive the LED chain
pub struct LedDriver<Q, D> {
    queue: Q,
    delay: D,
}

impl<Q: TxQueue, D: DelayNs> LedDriver<Q, D> {
    /// Claim a timing generator for the chain on `pin`.
    ///
    /// # Parameters
    /// * `pin` - The GPIO pin to which the LED chain is connected
    /// * `primary` - Pool tried first
    /// * `secondary` - Pool tried when `primary` has nothing free
    /// * `delay` - Blocking delay used for the reset gap after every frame
    pub fn init<P, A, B>(pin: P, primary: A, secondary: B, delay: D) -> Result<Self, Error>
    where
        A: TimingPool<P, Queue = Q>,
        B: TimingPool<P, Queue = Q>,
    {
        let queue = match primary.claim(pin, crate::LED_BIT_RATE_HZ) {
            Ok(queue) => queue,
            Err(Some(pin)) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("LEDS: Primary timing pool exhausted, trying secondary");
                secondary
                    .claim(pin, crate::LED_BIT_RATE_HZ)
                    .map_err(|_| Error::NoTimingResource)?
            }
            Err(None) => return Err(Error::NoTimingResource),
        };
        Ok(Self::new(queue, delay))
    }

    /// Wrap an already claimed queue.
    pub fn new(queue: Q, delay: D) -> Self {
        Self { queue, delay }
    }

    /// Transmit `frame` to the chain and hold the line idle long enough for it to latch.
    ///
    /// Bytes go out green, red, blue for each LED in index order. The call returns only after
    /// every byte has left the queue and the reset gap has elapsed.
    pub fn write(&mut self, frame: &LedBuffer) -> Result<(), Error> {
        for pixel in frame {
            self.queue.put_blocking(pixel.g)?;
            self.queue.put_blocking(pixel.r)?;
            self.queue.put_blocking(pixel.b)?;
        }
        self.queue.flush()?;
        self.delay.delay_us(RESET_GAP_US);
        Ok(())
    }
}

impl<Q: TxQueue, D: DelayNs> FrameWriter for LedDriver<Q, D> {
    fn write(&mut self, frame: &LedBuffer) -> Result<(), Error> {
        LedDriver::write(self, frame)
    }
}
