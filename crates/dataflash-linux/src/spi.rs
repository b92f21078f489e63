//! spidev byte transport
//!
//! Implements [`SpiTransport`] on top of `/dev/spidevX.Y`. Chip-select is
//! not part of the transport: the driver frames commands through the GPIO
//! lines, so every ioctl here is a plain full-duplex shift.

use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;

use dataflash_core::SpiTransport;

use crate::error::{LinuxError, Result};

/// Path to kernel spidev buffer size parameter
const BUF_SIZE_SYSFS: &str = "/sys/module/spidev/parameters/bufsiz";

/// Default SPI clock speed in Hz (2 MHz)
pub const DEFAULT_SPEED_HZ: u32 = 2_000_000;

/// `SPI_NO_CS` mode flag: the controller leaves its own chip-select alone
pub const SPI_NO_CS: u8 = 0x40;

/// Linux spidev ioctl constants
mod ioctl {
    use nix::ioctl_write_ptr;

    const SPI_IOC_MAGIC: u8 = b'k';

    const SPI_IOC_TYPE_MODE: u8 = 1;
    const SPI_IOC_TYPE_BITS_PER_WORD: u8 = 3;
    const SPI_IOC_TYPE_MAX_SPEED_HZ: u8 = 4;

    ioctl_write_ptr!(spi_ioc_wr_mode, SPI_IOC_MAGIC, SPI_IOC_TYPE_MODE, u8);
    ioctl_write_ptr!(
        spi_ioc_wr_bits_per_word,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_BITS_PER_WORD,
        u8
    );
    ioctl_write_ptr!(
        spi_ioc_wr_max_speed_hz,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_MAX_SPEED_HZ,
        u32
    );

    /// Size of struct spi_ioc_transfer
    pub const SPI_IOC_TRANSFER_SIZE: usize = 32;

    /// ioctl number of SPI_IOC_MESSAGE(n)
    pub fn spi_ioc_message(n: u8) -> libc::c_ulong {
        let size = (n as usize) * SPI_IOC_TRANSFER_SIZE;
        // _IOW(SPI_IOC_MAGIC, 0, char[size])
        ((1u32 << 30) | ((size as u32) << 16) | ((SPI_IOC_MAGIC as u32) << 8)) as libc::c_ulong
    }
}

/// Kernel `struct spi_ioc_transfer`
#[repr(C)]
#[derive(Debug, Default, Clone)]
struct SpiIocTransfer {
    tx_buf: u64,
    rx_buf: u64,
    len: u32,
    speed_hz: u32,
    delay_usecs: u16,
    bits_per_word: u8,
    cs_change: u8,
    tx_nbits: u8,
    rx_nbits: u8,
    word_delay_usecs: u8,
    _pad: u8,
}

/// Configuration for opening a spidev device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinuxSpiConfig {
    /// Device path (e.g., "/dev/spidev0.0")
    pub device: String,
    /// SPI clock speed in Hz
    pub speed_hz: u32,
    /// SPI mode; the AT45DB161D supports 0 and 3
    pub mode: u8,
    /// Ask the controller not to drive its own chip-select
    pub no_cs: bool,
}

impl Default for LinuxSpiConfig {
    fn default() -> Self {
        Self {
            device: String::new(),
            speed_hz: DEFAULT_SPEED_HZ,
            mode: 0,
            no_cs: false,
        }
    }
}

/// spidev transport
pub struct LinuxSpi {
    file: File,
    /// Largest single ioctl transfer the kernel accepts
    max_transfer: usize,
    speed_hz: u32,
}

impl LinuxSpi {
    /// Open a spidev device with the given configuration
    pub fn open(config: &LinuxSpiConfig) -> Result<Self> {
        log::debug!("linux_spi: Opening device {}", config.device);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&config.device)
            .map_err(|e| LinuxError::OpenFailed {
                path: config.device.clone(),
                source: e,
            })?;

        let fd = file.as_raw_fd();

        let mode = if config.no_cs {
            config.mode | SPI_NO_CS
        } else {
            config.mode
        };
        unsafe {
            ioctl::spi_ioc_wr_mode(fd, &mode).map_err(|e| LinuxError::SetModeFailed {
                mode,
                source: std::io::Error::from_raw_os_error(e as i32),
            })?;
        }

        let bits: u8 = 8;
        unsafe {
            ioctl::spi_ioc_wr_bits_per_word(fd, &bits).map_err(|e| {
                LinuxError::SetBitsPerWordFailed {
                    bits,
                    source: std::io::Error::from_raw_os_error(e as i32),
                }
            })?;
        }

        let speed = config.speed_hz;
        unsafe {
            ioctl::spi_ioc_wr_max_speed_hz(fd, &speed).map_err(|e| LinuxError::SetSpeedFailed {
                speed,
                source: std::io::Error::from_raw_os_error(e as i32),
            })?;
        }

        let max_transfer = get_max_kernel_buf_size();
        log::info!(
            "linux_spi: Opened {} (mode={}, speed={} kHz, bufsiz={})",
            config.device,
            config.mode,
            speed / 1000,
            max_transfer
        );

        Ok(Self {
            file,
            max_transfer,
            speed_hz: speed,
        })
    }

    /// Get current speed setting
    pub fn speed_hz(&self) -> u32 {
        self.speed_hz
    }

    /// Run one SPI_IOC_MESSAGE(1)
    ///
    /// `tx` and `rx` are either null or point to `len` bytes.
    fn message(&mut self, tx: *const u8, rx: *mut u8, len: usize) -> Result<()> {
        let transfer = SpiIocTransfer {
            tx_buf: tx as u64,
            rx_buf: rx as u64,
            len: len as u32,
            speed_hz: self.speed_hz,
            bits_per_word: 8,
            ..Default::default()
        };

        let ret = unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                ioctl::spi_ioc_message(1),
                &transfer as *const SpiIocTransfer,
            )
        };
        if ret < 0 {
            return Err(LinuxError::TransferFailed(std::io::Error::last_os_error()));
        }
        Ok(())
    }
}

impl SpiTransport for LinuxSpi {
    type Error = LinuxError;

    fn transfer(&mut self, byte: u8) -> Result<u8> {
        let mut buf = [byte];
        self.transfer_in_place(&mut buf)?;
        Ok(buf[0])
    }

    fn transfer_in_place(&mut self, buf: &mut [u8]) -> Result<()> {
        let max = self.max_transfer.max(1);
        for chunk in buf.chunks_mut(max) {
            // The kernel allows tx_buf and rx_buf to alias
            let ptr = chunk.as_mut_ptr();
            self.message(ptr, ptr, chunk.len())?;
        }
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        let max = self.max_transfer.max(1);
        for chunk in data.chunks(max) {
            self.message(chunk.as_ptr(), std::ptr::null_mut(), chunk.len())?;
        }
        Ok(())
    }
}

/// Read the maximum kernel buffer size from sysfs, or use page size as fallback
fn get_max_kernel_buf_size() -> usize {
    if let Ok(content) = std::fs::read_to_string(BUF_SIZE_SYSFS) {
        if let Ok(size) = content.trim().parse::<usize>() {
            if size > 0 {
                return size;
            }
        }
        log::warn!("linux_spi: Invalid buffer size in {}", BUF_SIZE_SYSFS);
    } else {
        log::debug!("linux_spi: Cannot read {}, using page size", BUF_SIZE_SYSFS);
    }

    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if page_size > 0 {
        page_size as usize
    } else {
        4096
    }
}
