//! Host capability traits
//!
//! The driver never touches hardware directly. The host binds a
//! byte-transfer primitive, the three active-low control lines and a delay
//! source once at construction; everything else is built on top of these.

#[cfg(feature = "embedded-hal")]
pub mod hal;
mod traits;

pub use traits::*;
