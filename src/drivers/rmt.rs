//! WS2812 byte queue on the ESP32-C3 RMT peripheral.
//!
//! Bytes are encoded into pulse codes as they are queued. `flush` sends everything queued as one
//! blocking transaction, refilling the channel RAM as it drains, so the data line never idles
//! between bytes of the same frame.

use esp_hal::{
    Blocking,
    gpio::{Level, interconnect::PeripheralOutput},
    rmt::{
        AnyTxChannel, ChannelCreator, ConstChannelAccess, PulseCode, Tx, TxChannel as _,
        TxChannelConfig, TxChannelCreator,
    },
};
use heapless::Vec;

use crate::{
    Error, FRAME_BYTES,
    drivers::neopixel::{BitTiming, TimingPool, TxQueue},
};

/// Source clock handed to `Rmt::new`
pub const RMT_SOURCE_MHZ: u32 = 80;

const CLK_DIVIDER: u8 = 2;

/// Resulting tick rate of every channel: 40 MHz, 25 ns per tick
pub const RMT_TICK_HZ: u32 = RMT_SOURCE_MHZ * 1_000_000 / CLK_DIVIDER as u32;

/// One pulse code per bit of a whole frame, plus the end marker
const PULSE_CAPACITY: usize = FRAME_BYTES * 8 + 1;

/// One RMT transmit channel creator, offered as a timing pool.
pub struct RmtPool<const CH: u8> {
    creator: ChannelCreator<Blocking, CH>,
}

impl<const CH: u8> RmtPool<CH> {
    pub fn new(creator: ChannelCreator<Blocking, CH>) -> Self {
        Self { creator }
    }
}

impl<'d, P, const CH: u8> TimingPool<P> for RmtPool<CH>
where
    P: PeripheralOutput<'d>,
    ChannelCreator<Blocking, CH>:
        TxChannelCreator<'d, Blocking, Raw = ConstChannelAccess<Tx, CH>>,
{
    type Queue = RmtQueue;

    fn claim(self, pin: P, bit_rate_hz: u32) -> Result<RmtQueue, Option<P>> {
        let config = TxChannelConfig::default()
            .with_clk_divider(CLK_DIVIDER)
            .with_idle_output_level(Level::Low)
            .with_idle_output(true)
            .with_carrier_modulation(false);
        match self.creator.configure_tx(pin, config) {
            // Both pools hand out the same queue type
            Ok(channel) => Ok(RmtQueue {
                channel: Some(channel.degrade()),
                timing: BitTiming::for_rate(RMT_TICK_HZ, bit_rate_hz),
                pulses: Vec::new(),
            }),
            Err(e) => {
                defmt::error!("RMT: Channel {} configuration failed: {}", CH, e);
                Err(None)
            }
        }
    }
}

/// A configured RMT channel with the pulse codes of the bytes queued so far.
pub struct RmtQueue {
    channel: Option<AnyTxChannel<Blocking>>,
    timing: BitTiming,
    pulses: Vec<u32, PULSE_CAPACITY>,
}

impl RmtQueue {
    /// Room for one more byte while keeping a slot for the end marker.
    fn has_room(&self) -> bool {
        self.pulses.len() + 8 < PULSE_CAPACITY
    }
}

impl TxQueue for RmtQueue {
    fn put_blocking(&mut self, byte: u8) -> Result<(), Error> {
        if !self.has_room() {
            self.flush()?;
        }
        for (high, low) in self.timing.encode(byte) {
            // has_room() guarantees space for all eight codes
            let _ = self
                .pulses
                .push(<u32 as PulseCode>::new(Level::High, high, Level::Low, low));
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Error> {
        if self.pulses.is_empty() {
            return Ok(());
        }
        let Some(channel) = self.channel.take() else {
            defmt::error!("RMT: Channel lost during previous transmission");
            self.pulses.clear();
            return Err(Error::Transmit);
        };

        let _ = self.pulses.push(u32::empty());
        let result = match channel.transmit(&self.pulses) {
            Ok(transaction) => match transaction.wait() {
                Ok(channel) => {
                    self.channel = Some(channel);
                    Ok(())
                }
                Err((e, channel)) => {
                    defmt::error!("RMT: Transaction failed: {}", e);
                    self.channel = Some(channel);
                    Err(Error::Transmit)
                }
            },
            Err(e) => {
                defmt::error!("RMT: Transmit failed: {}", e);
                Err(Error::Transmit)
            }
        };
        self.pulses.clear();
        result
    }
}
