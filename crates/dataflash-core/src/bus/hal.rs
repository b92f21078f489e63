//! Adapters for `embedded-hal` 1.0
//!
//! Wrap a HAL SPI bus, output pins and a delay so they can be handed to
//! [`Dataflash::new`](crate::Dataflash::new):
//!
//! ```ignore
//! use dataflash_core::bus::hal::{HalDelay, HalPin, HalSpi};
//! use dataflash_core::{Dataflash, DataflashConfig, Pins};
//!
//! let lines = Pins::new(HalPin(cs), HalPin(reset), HalPin(wp));
//! let mut flash = Dataflash::new(HalSpi(spi), lines, HalDelay(delay), DataflashConfig::default());
//! ```
//!
//! The bus is flushed after every transfer so that chip-select never
//! changes while bits are still being shifted.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use super::{Delay, OutputLine, SpiTransport};

/// `SpiBus<u8>` as a byte-transfer primitive
pub struct HalSpi<S>(pub S);

impl<S: SpiBus<u8>> SpiTransport for HalSpi<S> {
    type Error = S::Error;

    fn transfer(&mut self, byte: u8) -> Result<u8, Self::Error> {
        let mut buf = [byte];
        self.0.transfer_in_place(&mut buf)?;
        self.0.flush()?;
        Ok(buf[0])
    }

    fn transfer_in_place(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.0.transfer_in_place(buf)?;
        self.0.flush()
    }

    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.0.write(data)?;
        self.0.flush()
    }
}

/// `OutputPin` as a control line
pub struct HalPin<P>(pub P);

impl<P: OutputPin> OutputLine for HalPin<P> {
    type Error = P::Error;

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set_high()
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set_low()
    }
}

/// `DelayNs` as a delay source
pub struct HalDelay<D>(pub D);

impl<D: DelayNs> Delay for HalDelay<D> {
    fn delay_us(&mut self, us: u32) {
        self.0.delay_us(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.delay_ms(ms);
    }
}
