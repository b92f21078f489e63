//! Driver configuration

/// How the ready/busy synchronizer reads the status register
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PollMode {
    /// Issue a complete status-read transaction (with its own chip-select
    /// pulse) for every poll
    #[default]
    Reissue,
    /// Issue one status-read command and keep clocking; the chip returns a
    /// fresh status byte on every clock until chip-select is released
    Continuous,
}

/// Default delay after entering or leaving deep power-down (milliseconds)
///
/// The chip needs 3 us to enter and 35 us to resume.
pub const DEFAULT_POWER_SETTLE_MS: u32 = 100;
/// Default reset pulse width (microseconds)
pub const DEFAULT_RESET_HOLD_US: u32 = 10;
/// Default settle time around reset release (microseconds)
pub const DEFAULT_RESET_RECOVERY_US: u32 = 1;

/// Configuration for a [`Dataflash`](crate::Dataflash) handle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DataflashConfig {
    /// Status polling strategy
    pub poll_mode: PollMode,
    /// Delay between two status polls in microseconds (0 = no delay)
    pub poll_interval_us: u32,
    /// Allow the chip erase command
    pub allow_chip_erase: bool,
    /// Assert write-protect during `init`
    pub write_protect_on_init: bool,
    /// Delay after deep power-down entry and resume
    pub power_settle_ms: u32,
    /// Time the reset line is held low
    pub reset_hold_us: u32,
    /// Settle time before and after reset release
    pub reset_recovery_us: u32,
}

impl Default for DataflashConfig {
    fn default() -> Self {
        Self {
            poll_mode: PollMode::Reissue,
            poll_interval_us: 0,
            allow_chip_erase: false,
            write_protect_on_init: true,
            power_settle_ms: DEFAULT_POWER_SETTLE_MS,
            reset_hold_us: DEFAULT_RESET_HOLD_US,
            reset_recovery_us: DEFAULT_RESET_RECOVERY_US,
        }
    }
}

impl DataflashConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the status polling strategy
    pub fn with_poll_mode(mut self, mode: PollMode) -> Self {
        self.poll_mode = mode;
        self
    }

    /// Set the delay between status polls
    pub fn with_poll_interval_us(mut self, us: u32) -> Self {
        self.poll_interval_us = us;
        self
    }

    /// Opt in to the chip erase command
    pub fn with_chip_erase(mut self, allow: bool) -> Self {
        self.allow_chip_erase = allow;
        self
    }

    /// Choose whether `init` leaves write-protect asserted
    pub fn with_write_protect_on_init(mut self, protect: bool) -> Self {
        self.write_protect_on_init = protect;
        self
    }

    /// Set the deep power-down settle delay
    pub fn with_power_settle_ms(mut self, ms: u32) -> Self {
        self.power_settle_ms = ms;
        self
    }

    /// Set how long the reset line is held low
    pub fn with_reset_hold_us(mut self, us: u32) -> Self {
        self.reset_hold_us = us;
        self
    }

    /// Set the settle time around reset release
    pub fn with_reset_recovery_us(mut self, us: u32) -> Self {
        self.reset_recovery_us = us;
        self
    }
}
