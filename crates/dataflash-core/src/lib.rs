//! dataflash-core - Command protocol driver for AT45DB161D DataFlash
//!
//! This crate translates memory operations (page reads, writes through the
//! SRAM buffers, erases, compares, power management) into the opcode and
//! address byte sequences understood by the AT45DB161D command decoder, and
//! synchronizes with the chip's ready/busy state after operations with an
//! internal write cycle. It is `no_std` and owns no hardware: the host
//! supplies a byte-transfer primitive, three active-low control lines and a
//! delay source through the traits in [`bus`].
//!
//! # Features
//!
//! - `is_sync` (default) - Compile the driver as blocking code. Without it
//!   every operation is an `async fn`.
//! - `std` - Implement `std::error::Error` for [`Error`]
//! - `embedded-hal` - Adapters for `embedded-hal` 1.0 buses, pins and delays
//!
//! # Example
//!
//! ```ignore
//! use dataflash_core::{Buffer, Dataflash, DataflashConfig};
//!
//! let mut flash = Dataflash::new(spi, lines, delay, DataflashConfig::default());
//! flash.init()?;
//!
//! flash.write_buffer(Buffer::One, 0, b"hello")?;
//! flash.buffer_to_page(Buffer::One, 10, true)?;
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
// Allow async fn in traits - we use maybe-async for dual sync/async support
#![allow(async_fn_in_trait)]

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod bus;
pub mod chip;
pub mod config;
pub mod error;
pub mod flash;
pub mod spi;

pub use bus::{ControlLines, Delay, OutputLine, Pins, SpiTransport};
pub use chip::{Buffer, Identification, Status};
pub use config::{DataflashConfig, PollMode};
pub use error::{Error, Result};
pub use flash::{ContinuousReadMode, Dataflash, ProgramStream, ReadSpeed, Stream};
