//! Control lines through the GPIO character device
//!
//! Chip-select, reset and write-protect are requested as outputs on one
//! gpiochip. The lines are requested without the active-low flag, so
//! `Value::Active` is a high level on the pin.

use gpiocdev::line::{Offset, Value};
use gpiocdev::request::{Config, Request};

use dataflash_core::ControlLines;

use crate::error::{LinuxError, Result};

/// Line offsets on the gpiochip
///
/// Reset and write-protect are optional for boards that tie them high.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinuxGpioConfig {
    /// GPIO chip device path (e.g., "/dev/gpiochip0")
    pub device: String,
    /// Chip-select line
    pub cs: Offset,
    /// Reset line
    pub reset: Option<Offset>,
    /// Write-protect line
    pub wp: Option<Offset>,
}

impl Default for LinuxGpioConfig {
    fn default() -> Self {
        Self {
            device: "/dev/gpiochip0".to_string(),
            cs: 0,
            reset: None,
            wp: None,
        }
    }
}

/// The chip's control lines on a Linux gpiochip
pub struct LinuxGpioLines {
    request: Request,
    cs: Offset,
    reset: Option<Offset>,
    wp: Option<Offset>,
}

impl LinuxGpioLines {
    /// Request the lines, all starting high (inactive)
    pub fn open(config: &LinuxGpioConfig) -> Result<Self> {
        log::debug!("linux_gpio: Opening device {}", config.device);

        let mut req_config = Config::default();
        req_config.with_line(config.cs).as_output(Value::Active);
        for offset in [config.reset, config.wp].into_iter().flatten() {
            req_config.with_line(offset).as_output(Value::Active);
        }

        let request = Request::from_config(req_config)
            .on_chip(&config.device)
            .with_consumer("dataflash")
            .request()
            .map_err(|e| LinuxError::LineRequestFailed {
                path: config.device.clone(),
                source: e,
            })?;

        log::info!(
            "linux_gpio: Opened {} (cs={}, reset={}, wp={})",
            config.device,
            config.cs,
            describe(config.reset),
            describe(config.wp)
        );

        Ok(Self {
            request,
            cs: config.cs,
            reset: config.reset,
            wp: config.wp,
        })
    }

    fn drive(&mut self, line: &'static str, offset: Offset, active: bool) -> Result<()> {
        // Active low: asserting a line pulls the pin down
        let value = if active {
            Value::Inactive
        } else {
            Value::Active
        };
        self.request
            .set_value(offset, value)
            .map(|_| ())
            .map_err(|e| LinuxError::SetValueFailed { line, source: e })
    }
}

impl ControlLines for LinuxGpioLines {
    type Error = LinuxError;

    fn set_cs(&mut self, active: bool) -> Result<()> {
        self.drive("CS", self.cs, active)
    }

    fn set_reset(&mut self, active: bool) -> Result<()> {
        match self.reset {
            Some(offset) => self.drive("RESET", offset, active),
            None => Ok(()),
        }
    }

    fn set_write_protect(&mut self, active: bool) -> Result<()> {
        match self.wp {
            Some(offset) => self.drive("WP", offset, active),
            None => Ok(()),
        }
    }
}

fn describe(offset: Option<Offset>) -> String {
    offset.map_or_else(|| "none".to_string(), |o| o.to_string())
}
