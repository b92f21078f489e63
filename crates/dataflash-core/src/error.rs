//! Error types for dataflash-core
//!
//! The chip itself signals almost nothing, so the driver only reports what
//! the host reports: transport and line failures are carried as-is. The one
//! driver-level refusal is the chip erase capability check.

use core::fmt;

/// Core error type
///
/// `E` is the transport error type and `P` the control line error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E, P> {
    /// The byte-transfer primitive failed
    Transport(E),
    /// Driving chip-select, reset or write-protect failed
    Line(P),
    /// Chip erase was requested on a device not configured to allow it
    ChipEraseDisabled,
}

impl<E, P> Error<E, P> {
    /// Returns true if this error came from the byte-transfer primitive
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl<E: fmt::Debug, P: fmt::Debug> fmt::Display for Error<E, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "SPI transfer failed: {:?}", e),
            Self::Line(e) => write!(f, "control line error: {:?}", e),
            Self::ChipEraseDisabled => write!(f, "chip erase is not enabled for this device"),
        }
    }
}

#[cfg(feature = "std")]
impl<E: fmt::Debug, P: fmt::Debug> std::error::Error for Error<E, P> {}

/// Result type alias using the core Error type
pub type Result<T, E, P> = core::result::Result<T, Error<E, P>>;
