//! Armed-stream guards
//!
//! Streaming commands (buffer read/write, page read, continuous read, page
//! program through buffer) leave chip-select asserted after the header: every
//! further byte on the bus is payload or response of that command. The
//! guards below hold the device for exactly that window. Finishing (or
//! dropping) a guard deselects the chip, which is the only way back to idle.

use maybe_async::maybe_async;

use super::Dataflash;
use crate::bus::{ControlLines, Delay, SpiTransport};
use crate::chip::Status;
use crate::error::{Error, Result};

/// An armed command streaming data to or from the chip
///
/// Reads wrap at the end of a buffer or page the way the chip does; the
/// driver keeps no count.
pub struct Stream<'a, T, L: ControlLines, D> {
    dev: &'a mut Dataflash<T, L, D>,
    armed: bool,
}

impl<'a, T, L: ControlLines, D> Stream<'a, T, L, D> {
    pub(crate) fn new(dev: &'a mut Dataflash<T, L, D>) -> Self {
        Self { dev, armed: true }
    }
}

#[maybe_async]
impl<T, L, D> Stream<'_, T, L, D>
where
    T: SpiTransport,
    L: ControlLines,
    D: Delay,
{
    /// Exchange one byte with the armed command
    pub async fn transfer(&mut self, byte: u8) -> Result<u8, T::Error, L::Error> {
        self.dev.spi.transfer(byte).await.map_err(Error::Transport)
    }

    /// Read `buf.len()` bytes
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<(), T::Error, L::Error> {
        self.dev.read_bytes(buf).await
    }

    /// Write `data`
    pub async fn write(&mut self, data: &[u8]) -> Result<(), T::Error, L::Error> {
        self.dev.spi.write(data).await.map_err(Error::Transport)
    }

    /// Deselect the chip and end the command
    pub fn finish(mut self) -> Result<(), T::Error, L::Error> {
        self.armed = false;
        self.dev.deselect()
    }
}

impl<T, L: ControlLines, D> Drop for Stream<'_, T, L, D> {
    fn drop(&mut self) {
        if self.armed {
            // No way to report the error from here; `finish` does.
            let _ = self.dev.lines.set_cs(false);
        }
    }
}

/// An armed page program through buffer
///
/// Bytes written land in the SRAM buffer; [`commit`](Self::commit) starts
/// the erase and program of the target page.
pub struct ProgramStream<'a, T, L: ControlLines, D> {
    stream: Stream<'a, T, L, D>,
}

impl<'a, T, L: ControlLines, D> ProgramStream<'a, T, L, D> {
    pub(crate) fn new(dev: &'a mut Dataflash<T, L, D>) -> Self {
        Self {
            stream: Stream::new(dev),
        }
    }
}

#[maybe_async]
impl<T, L, D> ProgramStream<'_, T, L, D>
where
    T: SpiTransport,
    L: ControlLines,
    D: Delay,
{
    /// Write one byte
    pub async fn transfer(&mut self, byte: u8) -> Result<u8, T::Error, L::Error> {
        self.stream.transfer(byte).await
    }

    /// Write `data`
    pub async fn write(&mut self, data: &[u8]) -> Result<(), T::Error, L::Error> {
        self.stream.write(data).await
    }

    /// End the data phase and block until the page is programmed
    ///
    /// Dropping the stream without committing also deselects, which starts
    /// the program cycle without waiting for it.
    pub async fn commit(mut self) -> Result<Status, T::Error, L::Error> {
        self.stream.armed = false;
        let dev = &mut *self.stream.dev;
        dev.start_internal_operation()?;
        dev.wait_ready().await
    }
}
