//! AT45DB161D command opcodes
//!
//! Opcode values and status register bits as defined by the Atmel
//! AT45DB161D datasheet.

// ============================================================================
// Read commands
// ============================================================================

/// Main Memory Page Read (3 address bytes + 4 don't care bytes)
pub const PAGE_READ: u8 = 0xD2;
/// Continuous Array Read, legacy command (3 address bytes + 4 don't care bytes)
pub const CONTINUOUS_READ_LEGACY: u8 = 0xE8;
/// Continuous Array Read, low frequency (3 address bytes)
pub const CONTINUOUS_READ_LOW_FREQ: u8 = 0x03;
/// Continuous Array Read, high frequency (3 address bytes + 1 don't care byte)
pub const CONTINUOUS_READ_HIGH_FREQ: u8 = 0x0B;
/// Buffer 1 Read, low frequency
pub const BUFFER_1_READ_LOW_FREQ: u8 = 0xD1;
/// Buffer 2 Read, low frequency
pub const BUFFER_2_READ_LOW_FREQ: u8 = 0xD3;
/// Buffer 1 Read (1 don't care byte)
pub const BUFFER_1_READ: u8 = 0xD4;
/// Buffer 2 Read (1 don't care byte)
pub const BUFFER_2_READ: u8 = 0xD6;

// ============================================================================
// Program and erase commands
// ============================================================================

/// Buffer 1 Write
pub const BUFFER_1_WRITE: u8 = 0x84;
/// Buffer 2 Write
pub const BUFFER_2_WRITE: u8 = 0x87;
/// Buffer 1 to Main Memory Page Program with Built-in Erase
pub const BUFFER_1_TO_PAGE_WITH_ERASE: u8 = 0x83;
/// Buffer 2 to Main Memory Page Program with Built-in Erase
pub const BUFFER_2_TO_PAGE_WITH_ERASE: u8 = 0x86;
/// Buffer 1 to Main Memory Page Program without Built-in Erase
pub const BUFFER_1_TO_PAGE_WITHOUT_ERASE: u8 = 0x88;
/// Buffer 2 to Main Memory Page Program without Built-in Erase
pub const BUFFER_2_TO_PAGE_WITHOUT_ERASE: u8 = 0x89;
/// Page Erase
pub const PAGE_ERASE: u8 = 0x81;
/// Block Erase (8 pages)
pub const BLOCK_ERASE: u8 = 0x50;
/// Sector Erase
pub const SECTOR_ERASE: u8 = 0x7C;
/// Chip Erase, four byte sequence
pub const CHIP_ERASE: [u8; 4] = [0xC7, 0x94, 0x80, 0x9A];
/// Main Memory Page Program through Buffer 1
pub const PAGE_THROUGH_BUFFER_1: u8 = 0x82;
/// Main Memory Page Program through Buffer 2
pub const PAGE_THROUGH_BUFFER_2: u8 = 0x85;

// ============================================================================
// Additional commands
// ============================================================================

/// Main Memory Page to Buffer 1 Transfer
pub const TRANSFER_PAGE_TO_BUFFER_1: u8 = 0x53;
/// Main Memory Page to Buffer 2 Transfer
pub const TRANSFER_PAGE_TO_BUFFER_2: u8 = 0x55;
/// Main Memory Page to Buffer 1 Compare
pub const COMPARE_PAGE_TO_BUFFER_1: u8 = 0x60;
/// Main Memory Page to Buffer 2 Compare
pub const COMPARE_PAGE_TO_BUFFER_2: u8 = 0x61;
/// Auto Page Rewrite through Buffer 1
pub const AUTO_PAGE_REWRITE_BUFFER_1: u8 = 0x58;
/// Auto Page Rewrite through Buffer 2
pub const AUTO_PAGE_REWRITE_BUFFER_2: u8 = 0x59;
/// Deep Power-down
pub const DEEP_POWER_DOWN: u8 = 0xB9;
/// Resume from Deep Power-down
pub const RESUME_FROM_DEEP_POWER_DOWN: u8 = 0xAB;
/// Status Register Read
pub const STATUS_REGISTER_READ: u8 = 0xD7;
/// Manufacturer and Device ID Read
pub const READ_MANUFACTURER_AND_DEVICE_ID: u8 = 0x9F;

// ============================================================================
// Status register bit definitions
// ============================================================================

/// Status Register: device is ready (not busy)
pub const SR_READY: u8 = 0x80;
/// Status Register: last compare did not match
pub const SR_COMPARE: u8 = 0x40;
/// Status Register: density code (bits 5-2)
pub const SR_DENSITY_MASK: u8 = 0x3C;
/// Status Register: sector protection enabled
pub const SR_PROTECT: u8 = 0x02;
/// Status Register: binary (512 byte) page size configured
pub const SR_PAGE_SIZE: u8 = 0x01;
