//! Command encoding
//!
//! This module provides the AT45DB161D opcode table, the address field
//! encoders and the command header structure handed to the framer.

pub mod address;
mod command;
pub mod opcodes;

pub use address::AddressField;
pub use command::{Command, MAX_HEADER_LEN};
