//! Command header structure

use super::AddressField;

/// Longest header sent by any command: opcode, 3 address bytes and
/// 4 don't care bytes
pub const MAX_HEADER_LEN: usize = 8;

/// Opcode plus address and don't care bytes of a single command
///
/// This is everything the framer sends between the chip-select pulse and
/// the payload/response phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Command {
    /// The opcode byte
    pub opcode: u8,

    /// Address field (if any)
    pub address: Option<AddressField>,

    /// Number of don't care bytes after the address
    pub dummy_bytes: u8,
}

impl Command {
    /// Create a command with no address (e.g., status read, deep power-down)
    pub const fn simple(opcode: u8) -> Self {
        Self {
            opcode,
            address: None,
            dummy_bytes: 0,
        }
    }

    /// Create a command with a 3-byte address field
    pub const fn addressed(opcode: u8, address: AddressField) -> Self {
        Self {
            opcode,
            address: Some(address),
            dummy_bytes: 0,
        }
    }

    /// Set the number of don't care bytes
    pub const fn with_dummy_bytes(mut self, count: u8) -> Self {
        self.dummy_bytes = count;
        self
    }

    /// Number of header bytes (opcode + address + don't care)
    pub fn header_len(&self) -> usize {
        let address_len = if self.address.is_some() { 3 } else { 0 };
        1 + address_len + self.dummy_bytes as usize
    }

    /// Encode the header into `buf` and return the number of bytes written
    ///
    /// Don't care bytes are sent as 0x00.
    pub fn encode_header(&self, buf: &mut [u8; MAX_HEADER_LEN]) -> usize {
        buf[0] = self.opcode;
        let mut len = 1;
        if let Some(address) = self.address {
            buf[1..4].copy_from_slice(&address.bytes());
            len += 3;
        }
        let end = (len + self.dummy_bytes as usize).min(MAX_HEADER_LEN);
        for byte in &mut buf[len..end] {
            *byte = 0x00;
        }
        end
    }
}
