//! dataflash-linux - Linux host binding for the DataFlash driver
//!
//! Binds the three host capabilities of `dataflash-core` on Linux:
//!
//! - [`LinuxSpi`] shifts bytes through `/dev/spidevX.Y`
//! - [`LinuxGpioLines`] drives chip-select, reset and write-protect through
//!   the GPIO character device (gpiocdev)
//! - [`StdDelay`] sleeps the calling thread
//!
//! # Usage with the dataflash CLI
//!
//! ```bash
//! # Chip-select on GPIO 8, reset on 25, write-protect on 24
//! dataflash -p linux:spidev=/dev/spidev0.0,gpiochip=0,cs=8,reset=25,wp=24 info
//!
//! # SPI speed in kHz and SPI mode
//! dataflash -p linux:spidev=/dev/spidev0.0,cs=8,spispeed=8000,mode=3 dump -o flash.bin
//! ```
//!
//! # Wiring
//!
//! | Flash Pin | Host            |
//! |-----------|-----------------|
//! | SCK       | SPI clock       |
//! | SI        | SPI MOSI        |
//! | SO        | SPI MISO        |
//! | CS#       | GPIO `cs`       |
//! | RESET#    | GPIO `reset` (or tie high) |
//! | WP#       | GPIO `wp` (or tie high) |

pub mod error;
pub mod gpio;
pub mod spi;

pub use error::{LinuxError, Result};
pub use gpio::{LinuxGpioConfig, LinuxGpioLines};
pub use spi::{LinuxSpi, LinuxSpiConfig};

use dataflash_core::{Dataflash, DataflashConfig, Delay};

/// Delay source sleeping the current thread
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

impl Delay for StdDelay {
    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(std::time::Duration::from_micros(us as u64));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(ms as u64));
    }
}

/// Driver handle bound to Linux devices
pub type LinuxHandle = Dataflash<LinuxSpi, LinuxGpioLines, StdDelay>;

/// Host configuration parsed from the programmer options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinuxHostConfig {
    /// spidev transport
    pub spi: LinuxSpiConfig,
    /// Control lines
    pub gpio: LinuxGpioConfig,
}

/// Open the spidev device and request the control lines
pub fn open(host: &LinuxHostConfig, config: DataflashConfig) -> Result<LinuxHandle> {
    let spi = LinuxSpi::open(&host.spi)?;
    let lines = LinuxGpioLines::open(&host.gpio)?;
    log::debug!("linux: SPI clock {} kHz", spi.speed_hz() / 1000);
    Ok(Dataflash::new(spi, lines, StdDelay, config))
}

/// Parse programmer options from a list of key-value pairs
///
/// # Options
///
/// - `spidev=/dev/spidev0.0` - Required: spidev device path (`dev` also accepted)
/// - `gpiochip=0` or `gpiochip=/dev/gpiochip0` - GPIO chip (default 0)
/// - `cs=8` - Required: chip-select line offset
/// - `reset=25` - Optional: reset line offset
/// - `wp=24` - Optional: write-protect line offset
/// - `spispeed=8000` - Optional: speed in kHz (default: 2000)
/// - `mode=0` - Optional: SPI mode 0 or 3 (default: 0)
/// - `nocs=1` - Optional: set `SPI_NO_CS` on the controller
pub fn parse_options(options: &[(&str, &str)]) -> std::result::Result<LinuxHostConfig, String> {
    let mut host = LinuxHostConfig::default();
    let mut have_cs = false;

    for (key, value) in options {
        match *key {
            "spidev" | "dev" => host.spi.device = value.to_string(),
            "gpiochip" => {
                host.gpio.device = if value.starts_with('/') {
                    value.to_string()
                } else {
                    let n: u32 = value
                        .parse()
                        .map_err(|_| format!("Invalid gpiochip value: {}", value))?;
                    format!("/dev/gpiochip{}", n)
                };
            }
            "cs" => {
                host.gpio.cs = parse_line("cs", value)?;
                have_cs = true;
            }
            "reset" => host.gpio.reset = Some(parse_line("reset", value)?),
            "wp" => host.gpio.wp = Some(parse_line("wp", value)?),
            "spispeed" => {
                let speed_khz: u32 = value
                    .parse()
                    .map_err(|_| format!("Invalid spispeed value: {}", value))?;
                if speed_khz == 0 {
                    return Err("spispeed must be non-zero".to_string());
                }
                host.spi.speed_hz = speed_khz.saturating_mul(1000);
            }
            "mode" => {
                let mode: u8 = value
                    .parse()
                    .map_err(|_| format!("Invalid mode value: {}", value))?;
                if mode != 0 && mode != 3 {
                    return Err(format!("Invalid SPI mode: {} (must be 0 or 3)", mode));
                }
                host.spi.mode = mode;
            }
            "nocs" => host.spi.no_cs = matches!(*value, "1" | "yes" | "true" | ""),
            _ => log::warn!("linux: Unknown option: {}={}", key, value),
        }
    }

    if host.spi.device.is_empty() {
        return Err("No device specified. Use spidev=/dev/spidevX.Y".to_string());
    }
    if !have_cs {
        return Err("Missing chip-select line. Use cs=N".to_string());
    }

    Ok(host)
}

fn parse_line(name: &str, value: &str) -> std::result::Result<u32, String> {
    value
        .parse()
        .map_err(|_| format!("Invalid {} line: {}", name, value))
}
