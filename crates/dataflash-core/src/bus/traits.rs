//! Capability trait definitions
//!
//! These traits use `maybe_async` to support both sync and async modes.
//! - With the `is_sync` feature, the transfer and delay methods are blocking
//! - Without it, they are `async fn` (suitable for Embassy or DMA engines)
//!
//! Control lines are always synchronous: toggling a GPIO never waits.

use maybe_async::maybe_async;

/// Full-duplex, MSB-first byte transfer primitive
///
/// The bus must already be configured for a clock mode supported by the
/// chip (SPI mode 0 or 3). Chip-select is *not* driven by the transport;
/// the driver frames every command itself through [`ControlLines`].
///
/// ## Bulk transports
///
/// `transfer_in_place` and `write` default to one `transfer` per byte.
/// Transports with a FIFO or a DMA engine should override them: the driver
/// uses them for every header and for all streamed payloads, so the command
/// protocol is unchanged while the shifting happens in bulk.
#[maybe_async(AFIT)]
pub trait SpiTransport {
    /// Error reported by the host bus
    type Error;

    /// Shift out `byte` and return the byte shifted in at the same time
    async fn transfer(&mut self, byte: u8) -> Result<u8, Self::Error>;

    /// Shift out every byte of `buf`, replacing it with the byte received
    async fn transfer_in_place(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        for byte in buf.iter_mut() {
            *byte = self.transfer(*byte).await?;
        }
        Ok(())
    }

    /// Shift out `data`, discarding the received bytes
    async fn write(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        for &byte in data {
            self.transfer(byte).await?;
        }
        Ok(())
    }
}

#[maybe_async(AFIT)]
impl<T: SpiTransport + ?Sized> SpiTransport for &mut T {
    type Error = T::Error;

    async fn transfer(&mut self, byte: u8) -> Result<u8, Self::Error> {
        (**self).transfer(byte).await
    }

    async fn transfer_in_place(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        (**self).transfer_in_place(buf).await
    }

    async fn write(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        (**self).write(data).await
    }
}

/// A single digital output line
pub trait OutputLine {
    /// Error reported when the line cannot be driven
    type Error;

    /// Drive the line high
    fn set_high(&mut self) -> Result<(), Self::Error>;

    /// Drive the line low
    fn set_low(&mut self) -> Result<(), Self::Error>;
}

/// The chip's control lines: chip-select, reset and write-protect
///
/// All three are active low, so `active = true` drives the line low.
pub trait ControlLines {
    /// Error reported when a line cannot be driven
    type Error;

    /// Set chip select (`active = true` means CS=0)
    fn set_cs(&mut self, active: bool) -> Result<(), Self::Error>;

    /// Set the reset line (`active = true` holds the chip in reset)
    fn set_reset(&mut self, active: bool) -> Result<(), Self::Error>;

    /// Set the write-protect line (`active = true` enables protection)
    fn set_write_protect(&mut self, active: bool) -> Result<(), Self::Error>;
}

impl<L: ControlLines + ?Sized> ControlLines for &mut L {
    type Error = L::Error;

    fn set_cs(&mut self, active: bool) -> Result<(), Self::Error> {
        (**self).set_cs(active)
    }

    fn set_reset(&mut self, active: bool) -> Result<(), Self::Error> {
        (**self).set_reset(active)
    }

    fn set_write_protect(&mut self, active: bool) -> Result<(), Self::Error> {
        (**self).set_write_protect(active)
    }
}

/// Three separate output lines bound as the chip's control lines
pub struct Pins<CS, RST, WP> {
    /// Chip select (CS)
    pub cs: CS,
    /// Reset (RESET)
    pub reset: RST,
    /// Write protect (WP)
    pub wp: WP,
}

impl<CS, RST, WP> Pins<CS, RST, WP> {
    /// Bind the chip-select, reset and write-protect lines
    pub fn new(cs: CS, reset: RST, wp: WP) -> Self {
        Self { cs, reset, wp }
    }

    /// Give the lines back
    pub fn into_parts(self) -> (CS, RST, WP) {
        (self.cs, self.reset, self.wp)
    }
}

fn drive<P: OutputLine + ?Sized>(line: &mut P, active: bool) -> Result<(), P::Error> {
    if active {
        line.set_low()
    } else {
        line.set_high()
    }
}

impl<E, CS, RST, WP> ControlLines for Pins<CS, RST, WP>
where
    CS: OutputLine<Error = E>,
    RST: OutputLine<Error = E>,
    WP: OutputLine<Error = E>,
{
    type Error = E;

    fn set_cs(&mut self, active: bool) -> Result<(), E> {
        drive(&mut self.cs, active)
    }

    fn set_reset(&mut self, active: bool) -> Result<(), E> {
        drive(&mut self.reset, active)
    }

    fn set_write_protect(&mut self, active: bool) -> Result<(), E> {
        drive(&mut self.wp, active)
    }
}

/// Blocking or async delay source
#[maybe_async(AFIT)]
pub trait Delay {
    /// Delay for the specified number of microseconds
    async fn delay_us(&mut self, us: u32);

    /// Delay for the specified number of milliseconds
    async fn delay_ms(&mut self, ms: u32) {
        for _ in 0..ms {
            self.delay_us(1000).await;
        }
    }
}

#[maybe_async(AFIT)]
impl<D: Delay + ?Sized> Delay for &mut D {
    async fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us).await
    }

    async fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms).await
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::vec;
    use std::vec::Vec;

    use super::*;

    type Log = Rc<RefCell<Vec<(&'static str, bool)>>>;

    /// Output line recording `(name, level)` on every change
    struct RecordingLine {
        name: &'static str,
        log: Log,
    }

    impl OutputLine for RecordingLine {
        type Error = ();

        fn set_high(&mut self) -> Result<(), ()> {
            self.log.borrow_mut().push((self.name, true));
            Ok(())
        }

        fn set_low(&mut self) -> Result<(), ()> {
            self.log.borrow_mut().push((self.name, false));
            Ok(())
        }
    }

    fn pins(log: &Log) -> Pins<RecordingLine, RecordingLine, RecordingLine> {
        let line = |name| RecordingLine {
            name,
            log: log.clone(),
        };
        Pins::new(line("cs"), line("reset"), line("wp"))
    }

    #[test]
    fn test_pins_are_active_low() {
        let log = Log::default();
        let mut lines = pins(&log);

        lines.set_cs(true).unwrap();
        lines.set_cs(false).unwrap();
        lines.set_reset(true).unwrap();
        lines.set_reset(false).unwrap();
        lines.set_write_protect(true).unwrap();
        lines.set_write_protect(false).unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                ("cs", false),
                ("cs", true),
                ("reset", false),
                ("reset", true),
                ("wp", false),
                ("wp", true),
            ]
        );
    }

    fn protect<L: ControlLines>(mut lines: L) -> Result<(), L::Error> {
        lines.set_write_protect(true)
    }

    #[test]
    fn test_pins_through_mut_ref() {
        let log = Log::default();
        let mut lines = pins(&log);
        protect(&mut lines).unwrap();

        let (cs, reset, wp) = lines.into_parts();
        assert_eq!((cs.name, reset.name, wp.name), ("cs", "reset", "wp"));
        assert_eq!(*log.borrow(), vec![("wp", false)]);
    }
}
