//! Manufacturer and device identification

/// Atmel JEDEC manufacturer id
pub const MANUFACTURER_ATMEL: u8 = 0x1F;
/// DataFlash family code (bits 7-5 of the first device id byte)
pub const FAMILY_DATAFLASH: u8 = 0b001;
/// 16-Mbit density code (bits 4-0 of the first device id byte)
pub const DENSITY_16MBIT: u8 = 0b00110;

/// Identification record returned by the Manufacturer and Device ID Read
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Identification {
    /// Manufacturer id
    pub manufacturer: u8,
    /// Device id
    pub device: [u8; 2],
    /// Extended device information string length
    pub extended_info_len: u8,
}

impl Identification {
    /// Build from the four bytes clocked out after the opcode
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self {
            manufacturer: bytes[0],
            device: [bytes[1], bytes[2]],
            extended_info_len: bytes[3],
        }
    }

    /// Family code
    pub const fn family_code(&self) -> u8 {
        self.device[0] >> 5
    }

    /// Density code
    pub const fn density_code(&self) -> u8 {
        self.device[0] & 0x1F
    }

    /// MLC code (bits 7-5 of the second device id byte)
    pub const fn mlc_code(&self) -> u8 {
        self.device[1] >> 5
    }

    /// Product version (bits 4-0 of the second device id byte)
    pub const fn product_version(&self) -> u8 {
        self.device[1] & 0x1F
    }

    /// Returns true if this is an Atmel 16-Mbit DataFlash
    pub const fn is_at45db161d(&self) -> bool {
        self.manufacturer == MANUFACTURER_ATMEL
            && self.family_code() == FAMILY_DATAFLASH
            && self.density_code() == DENSITY_16MBIT
    }
}

impl core::fmt::Display for Identification {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "manufacturer 0x{:02X}, device 0x{:02X} 0x{:02X}, extended info {} bytes",
            self.manufacturer, self.device[0], self.device[1], self.extended_info_len
        )
    }
}
