//! Error types for the Linux host binding

use thiserror::Error;

/// Linux host specific errors
#[derive(Debug, Error)]
pub enum LinuxError {
    /// Failed to open the spidev device
    #[error("Failed to open {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to set SPI mode
    #[error("Failed to set SPI mode to {mode}: {source}")]
    SetModeFailed {
        mode: u8,
        #[source]
        source: std::io::Error,
    },

    /// Failed to set bits per word
    #[error("Failed to set bits per word to {bits}: {source}")]
    SetBitsPerWordFailed {
        bits: u8,
        #[source]
        source: std::io::Error,
    },

    /// Failed to set clock speed
    #[error("Failed to set clock speed to {speed} Hz: {source}")]
    SetSpeedFailed {
        speed: u32,
        #[source]
        source: std::io::Error,
    },

    /// SPI transfer failed
    #[error("SPI transfer failed: {0}")]
    TransferFailed(#[source] std::io::Error),

    /// Failed to request the control lines
    #[error("Failed to request GPIO lines on '{path}': {source}")]
    LineRequestFailed {
        path: String,
        #[source]
        source: gpiocdev::Error,
    },

    /// Failed to drive a control line
    #[error("Failed to set {line} line: {source}")]
    SetValueFailed {
        line: &'static str,
        #[source]
        source: gpiocdev::Error,
    },
}

/// Result type for Linux host operations
pub type Result<T> = std::result::Result<T, LinuxError>;
