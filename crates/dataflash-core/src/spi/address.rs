//! Address field encoding
//!
//! Every addressed AT45DB161D command carries a 3-byte address field whose
//! layout depends on the addressing unit (page/offset, buffer offset, block,
//! sector). The layouts below are bit-exact; the chip silently mis-addresses
//! on any deviation.

/// First sub-sector of sector 0 (pages 0-7)
pub const SECTOR_0A: u8 = 0x0A;
/// Second sub-sector of sector 0 (pages 8-255)
pub const SECTOR_0B: u8 = 0x0B;

/// A 3-byte command address field
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AddressField(pub [u8; 3]);

impl AddressField {
    /// Page index plus byte offset within the page
    ///
    /// 2 don't care bits, 12 page bits (PA11-PA0), 10 offset bits (BA9-BA0).
    pub const fn page_offset(page: u16, offset: u16) -> Self {
        Self([
            (page >> 6) as u8,
            ((page << 2) as u8) | (((offset >> 8) as u8) & 0x03),
            offset as u8,
        ])
    }

    /// Page index only, offset bits are zero
    pub const fn page(page: u16) -> Self {
        Self([(page >> 6) as u8, (page << 2) as u8, 0x00])
    }

    /// Offset within an SRAM buffer, page bits are don't care (zero)
    pub const fn buffer(offset: u16) -> Self {
        Self([0x00, ((offset >> 8) as u8) & 0x03, offset as u8])
    }

    /// Block index (groups of 8 pages)
    ///
    /// 2 don't care bits, 9 block bits (PA11-PA3), 13 don't care bits.
    pub const fn block(block: u16) -> Self {
        Self([(block >> 3) as u8, (block << 5) as u8, 0x00])
    }

    /// Sector index
    ///
    /// Sectors 0x0A and 0x0B (the split first sector) select the sub-sector
    /// with bit 4 of the second byte; every other sector is shifted into the
    /// first byte.
    pub const fn sector(sector: u8) -> Self {
        if sector == SECTOR_0A || sector == SECTOR_0B {
            Self([0x00, (sector & 0x01) << 4, 0x00])
        } else {
            Self([sector << 1, 0x00, 0x00])
        }
    }

    /// Raw address bytes in transmission order
    pub const fn bytes(&self) -> [u8; 3] {
        self.0
    }

    /// Decode the page index of a page/offset field
    pub const fn decode_page(&self) -> u16 {
        ((self.0[0] as u16) << 6) | ((self.0[1] as u16) >> 2)
    }

    /// Decode the byte offset of a page/offset or buffer field
    pub const fn decode_offset(&self) -> u16 {
        (((self.0[1] & 0x03) as u16) << 8) | (self.0[2] as u16)
    }

    /// Decode the block index of a block field
    pub const fn decode_block(&self) -> u16 {
        ((self.0[0] as u16) << 3) | ((self.0[1] as u16) >> 5)
    }

    /// Decode the sector index of a sector field
    pub const fn decode_sector(&self) -> u8 {
        if self.0[0] == 0x00 && (self.0[1] == 0x00 || self.0[1] == 0x10) {
            SECTOR_0A | (self.0[1] >> 4)
        } else {
            self.0[0] >> 1
        }
    }
}
