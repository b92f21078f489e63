//! Public operation surface
//!
//! Each operation composes the framer, the address encoder and (for
//! commands with an internal cycle) the synchronizer. Nothing here keeps
//! state between calls.
//!
//! Operations are not range checked: page, offset, block and sector values
//! are encoded as given and the chip interprets whatever bits result.

use maybe_async::maybe_async;

use super::{Dataflash, ProgramStream, Stream};
use crate::bus::{ControlLines, Delay, SpiTransport};
use crate::chip::{Buffer, Identification, Status};
use crate::error::{Error, Result};
use crate::spi::{opcodes, AddressField, Command};

/// Clock rate class of a buffer read
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ReadSpeed {
    /// Low frequency read (`D1`/`D3`), no don't care byte
    Low,
    /// Full speed read (`D4`/`D6`), one don't care byte
    #[default]
    High,
}

/// Variant of the continuous array read
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ContinuousReadMode {
    /// Low frequency (`03`), no don't care byte
    Low,
    /// High frequency (`0B`), one don't care byte
    #[default]
    High,
    /// Legacy command (`E8`), four don't care bytes
    Legacy,
}

impl ContinuousReadMode {
    fn command(self, address: AddressField) -> Command {
        match self {
            Self::Low => Command::addressed(opcodes::CONTINUOUS_READ_LOW_FREQ, address),
            Self::High => Command::addressed(opcodes::CONTINUOUS_READ_HIGH_FREQ, address)
                .with_dummy_bytes(1),
            Self::Legacy => {
                Command::addressed(opcodes::CONTINUOUS_READ_LEGACY, address).with_dummy_bytes(4)
            }
        }
    }
}

#[maybe_async]
impl<T, L, D> Dataflash<T, L, D>
where
    T: SpiTransport,
    L: ControlLines,
    D: Delay,
{
    // ========================================================================
    // Identification
    // ========================================================================

    /// Read the manufacturer and device id
    pub async fn read_id(&mut self) -> Result<Identification, T::Error, L::Error> {
        self.begin(&Command::simple(opcodes::READ_MANUFACTURER_AND_DEVICE_ID))
            .await?;
        let mut bytes = [0u8; 4];
        self.read_bytes(&mut bytes).await?;
        self.deselect()?;
        Ok(Identification::from_bytes(bytes))
    }

    /// Read the id and the extended device information string
    ///
    /// The extended bytes follow the id in the same transaction. At most
    /// `buf.len()` of them are read; returns the id and the number of
    /// extended bytes stored in `buf`.
    pub async fn read_id_extended(
        &mut self,
        buf: &mut [u8],
    ) -> Result<(Identification, usize), T::Error, L::Error> {
        self.begin(&Command::simple(opcodes::READ_MANUFACTURER_AND_DEVICE_ID))
            .await?;
        let mut bytes = [0u8; 4];
        self.read_bytes(&mut bytes).await?;
        let id = Identification::from_bytes(bytes);

        let len = core::cmp::min(id.extended_info_len as usize, buf.len());
        self.read_bytes(&mut buf[..len]).await?;
        self.deselect()?;
        Ok((id, len))
    }

    // ========================================================================
    // Streaming reads and writes
    // ========================================================================

    /// Arm a main memory page read at `offset` of `page`
    ///
    /// Bypasses both buffers and leaves their contents unchanged.
    pub async fn page_read(
        &mut self,
        page: u16,
        offset: u16,
    ) -> Result<Stream<'_, T, L, D>, T::Error, L::Error> {
        log::debug!("dataflash: page read {}+{}", page, offset);
        let cmd = Command::addressed(opcodes::PAGE_READ, AddressField::page_offset(page, offset))
            .with_dummy_bytes(4);
        self.begin(&cmd).await?;
        Ok(Stream::new(self))
    }

    /// Arm a continuous array read starting at `offset` of `page`
    ///
    /// The chip crosses page boundaries by itself; the stream may read any
    /// number of bytes.
    pub async fn continuous_read(
        &mut self,
        page: u16,
        offset: u16,
        mode: ContinuousReadMode,
    ) -> Result<Stream<'_, T, L, D>, T::Error, L::Error> {
        log::debug!("dataflash: continuous read {}+{} ({:?})", page, offset, mode);
        let cmd = mode.command(AddressField::page_offset(page, offset));
        self.begin(&cmd).await?;
        Ok(Stream::new(self))
    }

    /// Arm a read of one SRAM buffer starting at `offset`
    pub async fn buffer_read(
        &mut self,
        buffer: Buffer,
        offset: u16,
        speed: ReadSpeed,
    ) -> Result<Stream<'_, T, L, D>, T::Error, L::Error> {
        log::debug!("dataflash: {} read at {} ({:?})", buffer, offset, speed);
        let low = speed == ReadSpeed::Low;
        let cmd = Command::addressed(buffer.read_opcode(low), AddressField::buffer(offset))
            .with_dummy_bytes(if low { 0 } else { 1 });
        self.begin(&cmd).await?;
        Ok(Stream::new(self))
    }

    /// Arm a write to one SRAM buffer starting at `offset`
    ///
    /// The chip wraps to the start of the buffer after its last byte.
    pub async fn buffer_write(
        &mut self,
        buffer: Buffer,
        offset: u16,
    ) -> Result<Stream<'_, T, L, D>, T::Error, L::Error> {
        log::debug!("dataflash: {} write at {}", buffer, offset);
        let cmd = Command::addressed(buffer.write_opcode(), AddressField::buffer(offset));
        self.begin(&cmd).await?;
        Ok(Stream::new(self))
    }

    /// Arm a main memory page program through a buffer
    ///
    /// Combines buffer write and buffer to page with built-in erase. Data
    /// written to the stream goes into `buffer` starting at `offset`;
    /// [`ProgramStream::commit`] programs `page`.
    pub async fn begin_page_write_through_buffer(
        &mut self,
        page: u16,
        offset: u16,
        buffer: Buffer,
    ) -> Result<ProgramStream<'_, T, L, D>, T::Error, L::Error> {
        log::debug!(
            "dataflash: page {}+{} program through {}",
            page,
            offset,
            buffer
        );
        let opcode = buffer.select(opcodes::PAGE_THROUGH_BUFFER_1, opcodes::PAGE_THROUGH_BUFFER_2);
        let cmd = Command::addressed(opcode, AddressField::page_offset(page, offset));
        self.begin(&cmd).await?;
        Ok(ProgramStream::new(self))
    }

    // ========================================================================
    // Buffer <-> page transfers
    // ========================================================================

    /// Program `page` with the contents of `buffer`
    ///
    /// With `erase` the page is erased first. Without it the page must have
    /// been erased by a previous page, block, sector or chip erase. Blocks
    /// until the chip is ready.
    pub async fn buffer_to_page(
        &mut self,
        buffer: Buffer,
        page: u16,
        erase: bool,
    ) -> Result<(), T::Error, L::Error> {
        log::debug!(
            "dataflash: {} to page {} ({} erase)",
            buffer,
            page,
            if erase { "with" } else { "without" }
        );
        let cmd = Command::addressed(buffer.to_page_opcode(erase), AddressField::page(page));
        self.run_to_ready(&cmd).await?;
        Ok(())
    }

    /// Load `page` into `buffer`; blocks until the chip is ready
    pub async fn page_to_buffer(
        &mut self,
        page: u16,
        buffer: Buffer,
    ) -> Result<(), T::Error, L::Error> {
        log::debug!("dataflash: page {} to {}", page, buffer);
        let opcode = buffer.select(
            opcodes::TRANSFER_PAGE_TO_BUFFER_1,
            opcodes::TRANSFER_PAGE_TO_BUFFER_2,
        );
        self.run_to_ready(&Command::addressed(opcode, AddressField::page(page)))
            .await?;
        Ok(())
    }

    /// Compare `page` with the contents of `buffer`
    ///
    /// Returns `true` if they hold the same data (status bit 6 clear).
    pub async fn compare_page_to_buffer(
        &mut self,
        page: u16,
        buffer: Buffer,
    ) -> Result<bool, T::Error, L::Error> {
        let opcode = buffer.select(
            opcodes::COMPARE_PAGE_TO_BUFFER_1,
            opcodes::COMPARE_PAGE_TO_BUFFER_2,
        );
        let status = self
            .run_to_ready(&Command::addressed(opcode, AddressField::page(page)))
            .await?;
        let matched = status.compare_matched();
        log::debug!(
            "dataflash: page {} vs {}: {}",
            page,
            buffer,
            if matched { "match" } else { "mismatch" }
        );
        Ok(matched)
    }

    /// Rewrite `page` through `buffer` (page to buffer, then buffer to page
    /// with erase, as one internal operation)
    pub async fn auto_page_rewrite(
        &mut self,
        page: u16,
        buffer: Buffer,
    ) -> Result<(), T::Error, L::Error> {
        log::debug!("dataflash: auto rewrite page {} through {}", page, buffer);
        let opcode = buffer.select(
            opcodes::AUTO_PAGE_REWRITE_BUFFER_1,
            opcodes::AUTO_PAGE_REWRITE_BUFFER_2,
        );
        self.run_to_ready(&Command::addressed(opcode, AddressField::page(page)))
            .await?;
        Ok(())
    }

    // ========================================================================
    // Erase
    // ========================================================================

    /// Erase one page; blocks until the chip is ready
    pub async fn page_erase(&mut self, page: u16) -> Result<(), T::Error, L::Error> {
        log::debug!("dataflash: erase page {}", page);
        self.run_to_ready(&Command::addressed(
            opcodes::PAGE_ERASE,
            AddressField::page(page),
        ))
        .await?;
        Ok(())
    }

    /// Erase a block of eight pages; blocks until the chip is ready
    pub async fn block_erase(&mut self, block: u16) -> Result<(), T::Error, L::Error> {
        log::debug!("dataflash: erase block {}", block);
        self.run_to_ready(&Command::addressed(
            opcodes::BLOCK_ERASE,
            AddressField::block(block),
        ))
        .await?;
        Ok(())
    }

    /// Erase one sector; blocks until the chip is ready
    ///
    /// `sector` is 1-15, or [`SECTOR_0A`](crate::spi::address::SECTOR_0A) /
    /// [`SECTOR_0B`](crate::spi::address::SECTOR_0B) for the two parts of
    /// sector 0.
    pub async fn sector_erase(&mut self, sector: u8) -> Result<(), T::Error, L::Error> {
        log::debug!("dataflash: erase sector 0x{:02X}", sector);
        self.run_to_ready(&Command::addressed(
            opcodes::SECTOR_ERASE,
            AddressField::sector(sector),
        ))
        .await?;
        Ok(())
    }

    /// Erase the whole array
    ///
    /// Sectors that are protected or locked down are not erased. Refused
    /// unless the device was configured with
    /// [`DataflashConfig::allow_chip_erase`](crate::DataflashConfig::allow_chip_erase).
    pub async fn chip_erase(&mut self) -> Result<(), T::Error, L::Error> {
        if !self.config.allow_chip_erase {
            log::warn!("dataflash: chip erase requested but not enabled");
            return Err(Error::ChipEraseDisabled);
        }
        log::debug!("dataflash: chip erase");

        self.deselect()?;
        self.select()?;
        self.spi
            .write(&opcodes::CHIP_ERASE)
            .await
            .map_err(Error::Transport)?;
        self.start_internal_operation()?;
        self.wait_ready().await?;
        Ok(())
    }

    // ========================================================================
    // Convenience compositions
    // ========================================================================

    /// Write `data` into `buffer` at `offset` and deselect
    pub async fn write_buffer(
        &mut self,
        buffer: Buffer,
        offset: u16,
        data: &[u8],
    ) -> Result<(), T::Error, L::Error> {
        let mut stream = self.buffer_write(buffer, offset).await?;
        stream.write(data).await?;
        stream.finish()
    }

    /// Read `buf.len()` bytes of `buffer` from `offset` and deselect
    pub async fn read_buffer(
        &mut self,
        buffer: Buffer,
        offset: u16,
        buf: &mut [u8],
        speed: ReadSpeed,
    ) -> Result<(), T::Error, L::Error> {
        let mut stream = self.buffer_read(buffer, offset, speed).await?;
        stream.read(buf).await?;
        stream.finish()
    }

    /// Read `buf.len()` bytes of `page` from `offset` and deselect
    pub async fn read_page(
        &mut self,
        page: u16,
        offset: u16,
        buf: &mut [u8],
    ) -> Result<(), T::Error, L::Error> {
        let mut stream = self.page_read(page, offset).await?;
        stream.read(buf).await?;
        stream.finish()
    }

    /// Continuous read of `buf.len()` bytes starting at `offset` of `page`
    pub async fn read_continuous(
        &mut self,
        page: u16,
        offset: u16,
        buf: &mut [u8],
        mode: ContinuousReadMode,
    ) -> Result<(), T::Error, L::Error> {
        let mut stream = self.continuous_read(page, offset, mode).await?;
        stream.read(buf).await?;
        stream.finish()
    }

    /// Program `data` into `page` at `offset` through `buffer` and wait
    pub async fn write_page_through_buffer(
        &mut self,
        page: u16,
        offset: u16,
        buffer: Buffer,
        data: &[u8],
    ) -> Result<Status, T::Error, L::Error> {
        let mut stream = self
            .begin_page_write_through_buffer(page, offset, buffer)
            .await?;
        stream.write(data).await?;
        stream.commit().await
    }
}
