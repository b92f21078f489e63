//! AT45DB161D memory organization

/// Number of main memory pages
pub const PAGE_COUNT: u16 = 4096;
/// Page size in standard DataFlash addressing
pub const PAGE_SIZE: u16 = 528;
/// Page size when the chip is configured for binary (power of two) pages
pub const BINARY_PAGE_SIZE: u16 = 512;
/// Size of each SRAM buffer
pub const BUFFER_SIZE: u16 = PAGE_SIZE;
/// Pages per erase block
pub const PAGES_PER_BLOCK: u16 = 8;
/// Number of erase blocks
pub const BLOCK_COUNT: u16 = PAGE_COUNT / PAGES_PER_BLOCK;
/// Pages per sector (sectors 1-15)
pub const PAGES_PER_SECTOR: u16 = 256;
/// Number of sectors, counting the split sector 0 once
pub const SECTOR_COUNT: u8 = 16;
/// Total size in bytes with 528 byte pages
pub const TOTAL_SIZE: u32 = PAGE_COUNT as u32 * PAGE_SIZE as u32;

/// Pages covered by a sector id (0x0A, 0x0B or 1-15)
///
/// Returns `None` for ids that do not name a sector.
pub const fn sector_pages(sector: u8) -> Option<core::ops::Range<u16>> {
    match sector {
        crate::spi::address::SECTOR_0A => Some(0..PAGES_PER_BLOCK),
        crate::spi::address::SECTOR_0B => Some(PAGES_PER_BLOCK..PAGES_PER_SECTOR),
        1..=15 => {
            let start = sector as u16 * PAGES_PER_SECTOR;
            Some(start..start + PAGES_PER_SECTOR)
        }
        _ => None,
    }
}
