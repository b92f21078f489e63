//! Chip description
//!
//! Geometry constants, the status register snapshot, the identification
//! record and the SRAM buffer selector of the AT45DB161D.

pub mod geometry;
mod id;
mod status;

pub use id::{Identification, DENSITY_16MBIT, FAMILY_DATAFLASH, MANUFACTURER_ATMEL};
pub use status::Status;

use crate::spi::opcodes;

/// One of the two SRAM scratch buffers
///
/// This only selects the opcode; the driver does not model buffer contents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Buffer {
    /// Buffer 1
    One,
    /// Buffer 2
    Two,
}

impl Buffer {
    /// Buffer number as printed in the datasheet (1 or 2)
    pub const fn number(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }

    /// Parse a buffer number (1 or 2)
    pub const fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::One),
            2 => Some(Self::Two),
            _ => None,
        }
    }

    /// Pick the opcode for this buffer
    pub(crate) const fn select(self, one: u8, two: u8) -> u8 {
        match self {
            Self::One => one,
            Self::Two => two,
        }
    }

    pub(crate) const fn write_opcode(self) -> u8 {
        self.select(opcodes::BUFFER_1_WRITE, opcodes::BUFFER_2_WRITE)
    }

    pub(crate) const fn read_opcode(self, low_frequency: bool) -> u8 {
        if low_frequency {
            self.select(opcodes::BUFFER_1_READ_LOW_FREQ, opcodes::BUFFER_2_READ_LOW_FREQ)
        } else {
            self.select(opcodes::BUFFER_1_READ, opcodes::BUFFER_2_READ)
        }
    }

    pub(crate) const fn to_page_opcode(self, erase: bool) -> u8 {
        if erase {
            self.select(
                opcodes::BUFFER_1_TO_PAGE_WITH_ERASE,
                opcodes::BUFFER_2_TO_PAGE_WITH_ERASE,
            )
        } else {
            self.select(
                opcodes::BUFFER_1_TO_PAGE_WITHOUT_ERASE,
                opcodes::BUFFER_2_TO_PAGE_WITHOUT_ERASE,
            )
        }
    }
}

impl core::fmt::Display for Buffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "buffer {}", self.number())
    }
}
