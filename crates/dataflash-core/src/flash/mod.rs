//! The DataFlash driver
//!
//! [`Dataflash`] owns the host capabilities for one chip and exposes the
//! command set. Its pieces live in separate modules:
//!
//! - `device` - construction, init/teardown and the command framer
//! - `ready` - status register reads and the ready/busy synchronizer
//! - `power` - deep power-down, hard reset and write protection
//! - `operations` - the public buffer/page/erase/compare surface
//! - `stream` - the armed-stream guards returned by streaming commands

mod device;
mod operations;
mod power;
mod ready;
mod stream;

#[cfg(all(test, feature = "is_sync"))]
mod mock;

pub use device::Dataflash;
pub use operations::{ContinuousReadMode, ReadSpeed};
pub use stream::{ProgramStream, Stream};
