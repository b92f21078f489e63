//! Device handle and command framer

use maybe_async::maybe_async;

use crate::bus::{ControlLines, Delay, SpiTransport};
use crate::config::DataflashConfig;
use crate::error::{Error, Result};
use crate::spi::{Command, MAX_HEADER_LEN};

/// Handle for one AT45DB161D
///
/// Holds the byte-transfer primitive, the control lines and the delay
/// source bound by the host. Pass `&mut` references instead of owned values
/// to keep ownership on the caller side.
///
/// The handle is not `Sync`-shared: one operation runs at a time, and each
/// one is a self-contained request/response sequence on the bus.
///
/// # Example
///
/// ```ignore
/// let mut flash = Dataflash::new(&mut spi, &mut lines, &mut delay, DataflashConfig::default());
/// flash.init()?;
/// let status = flash.read_status()?;
/// ```
pub struct Dataflash<T, L, D> {
    pub(crate) spi: T,
    pub(crate) lines: L,
    pub(crate) delay: D,
    pub(crate) config: DataflashConfig,
}

impl<T, L, D> Dataflash<T, L, D> {
    /// Bind the host capabilities
    ///
    /// No line is driven until [`init`](Self::init) is called.
    pub fn new(spi: T, lines: L, delay: D, config: DataflashConfig) -> Self {
        Self {
            spi,
            lines,
            delay,
            config,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &DataflashConfig {
        &self.config
    }

    /// Get a mutable reference to the configuration
    pub fn config_mut(&mut self) -> &mut DataflashConfig {
        &mut self.config
    }

    /// Get a mutable reference to the transport
    pub fn transport(&mut self) -> &mut T {
        &mut self.spi
    }

    /// Consume the handle and return the host capabilities
    ///
    /// Call [`end`](Self::end) first to release chip-select.
    pub fn release(self) -> (T, L, D) {
        (self.spi, self.lines, self.delay)
    }
}

impl<T, L, D> Dataflash<T, L, D>
where
    T: SpiTransport,
    L: ControlLines,
    D: Delay,
{
    /// Drive all control lines to their idle levels
    ///
    /// Reset is released, write-protect follows
    /// [`DataflashConfig::write_protect_on_init`] and chip-select is
    /// deasserted.
    pub fn init(&mut self) -> Result<(), T::Error, L::Error> {
        self.lines.set_reset(false).map_err(Error::Line)?;
        self.lines
            .set_write_protect(self.config.write_protect_on_init)
            .map_err(Error::Line)?;
        self.deselect()?;
        log::debug!(
            "dataflash: initialized (write protect {})",
            if self.config.write_protect_on_init {
                "on"
            } else {
                "off"
            }
        );
        Ok(())
    }

    /// Release chip-select
    pub fn end(&mut self) -> Result<(), T::Error, L::Error> {
        self.deselect()
    }

    pub(crate) fn select(&mut self) -> Result<(), T::Error, L::Error> {
        self.lines.set_cs(true).map_err(Error::Line)
    }

    pub(crate) fn deselect(&mut self) -> Result<(), T::Error, L::Error> {
        self.lines.set_cs(false).map_err(Error::Line)
    }
}

#[maybe_async]
impl<T, L, D> Dataflash<T, L, D>
where
    T: SpiTransport,
    L: ControlLines,
    D: Delay,
{
    /// Frame a command: deselect, select, then opcode, address and don't
    /// care bytes
    ///
    /// The deselect/select transition resets the chip's command decoder,
    /// so it is issued before every command. Chip-select stays asserted on
    /// return; anything the caller transfers next belongs to this command.
    pub(crate) async fn begin(&mut self, cmd: &Command) -> Result<(), T::Error, L::Error> {
        self.deselect()?;
        self.select()?;

        let mut header = [0u8; MAX_HEADER_LEN];
        let len = cmd.encode_header(&mut header);
        log::trace!("dataflash: command {:02X?}", &header[..len]);
        self.spi
            .write(&header[..len])
            .await
            .map_err(Error::Transport)
    }

    /// Frame a command that has no payload and return to idle
    pub(crate) async fn single_shot(&mut self, cmd: &Command) -> Result<(), T::Error, L::Error> {
        self.begin(cmd).await?;
        self.deselect()
    }

    /// Frame a command with an internal operation, start it and block until
    /// the chip reports ready
    ///
    /// The low-to-high chip-select transition after the address starts the
    /// internal operation (transfer, erase, compare).
    pub(crate) async fn run_to_ready(
        &mut self,
        cmd: &Command,
    ) -> Result<crate::chip::Status, T::Error, L::Error> {
        self.begin(cmd).await?;
        self.start_internal_operation()?;
        self.wait_ready().await
    }

    /// Chip-select pulse that ends a command and starts its internal cycle
    pub(crate) fn start_internal_operation(&mut self) -> Result<(), T::Error, L::Error> {
        self.deselect()?;
        self.select()
    }

    /// Clock out `buf.len()` bytes of 0xFF and store the bytes received
    pub(crate) async fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), T::Error, L::Error> {
        buf.fill(0xFF);
        self.spi
            .transfer_in_place(buf)
            .await
            .map_err(Error::Transport)
    }
}
