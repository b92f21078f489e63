//! Status register snapshot

use bitflags::bitflags;

use super::geometry::{BINARY_PAGE_SIZE, PAGE_SIZE};
use crate::spi::opcodes;

bitflags! {
    /// Status register value
    ///
    /// Only meaningful right after the status-read transaction that
    /// produced it; the driver never caches it.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status: u8 {
        /// Device is ready (no internal operation in progress)
        const READY            = opcodes::SR_READY;
        /// Last compare found a mismatch between page and buffer
        const COMPARE_MISMATCH = opcodes::SR_COMPARE;
        /// Density code (bits 5-2)
        const DENSITY          = opcodes::SR_DENSITY_MASK;
        /// Sector protection is enabled
        const PROTECT          = opcodes::SR_PROTECT;
        /// Binary (512 byte) page size is configured
        const BINARY_PAGES     = opcodes::SR_PAGE_SIZE;
    }
}

impl Status {
    /// Density code of the AT45DB161D (0b1011)
    pub const DENSITY_16MBIT: u8 = 0b1011;

    /// Wrap a raw status register byte
    pub const fn from_raw(raw: u8) -> Self {
        Self::from_bits_retain(raw)
    }

    /// Returns true if the chip can accept a new command
    pub fn is_ready(&self) -> bool {
        self.contains(Self::READY)
    }

    /// Returns true if the last compare matched (bit 6 clear)
    pub fn compare_matched(&self) -> bool {
        !self.contains(Self::COMPARE_MISMATCH)
    }

    /// Returns true if sector protection is enabled
    pub fn is_protected(&self) -> bool {
        self.contains(Self::PROTECT)
    }

    /// Density code from bits 5-2
    pub fn density_code(&self) -> u8 {
        (self.bits() & opcodes::SR_DENSITY_MASK) >> 2
    }

    /// Page size the chip is configured for
    pub fn page_size(&self) -> u16 {
        if self.contains(Self::BINARY_PAGES) {
            BINARY_PAGE_SIZE
        } else {
            PAGE_SIZE
        }
    }
}

impl core::fmt::Display for Status {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "0b{:08b} ({}, density 0x{:X}, {} byte pages{})",
            self.bits(),
            if self.is_ready() { "ready" } else { "busy" },
            self.density_code(),
            self.page_size(),
            if self.is_protected() { ", protected" } else { "" }
        )
    }
}
