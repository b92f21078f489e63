//! dataflash-dummy - In-memory AT45DB161D emulator for testing
//!
//! The emulator models the chip at the byte level: it decodes opcodes,
//! address and don't care bytes exactly as the hardware command decoder
//! does, runs internal operations on the chip-select rising edge and reports
//! busy for a configurable number of status polls. Every line change and
//! byte exchange is recorded so tests can check the framing on the wire.
//!
//! [`DummyDataflash`] owns the shared state; [`bus`](DummyDataflash::bus),
//! [`lines`](DummyDataflash::lines) and [`delay`](DummyDataflash::delay)
//! hand out the three host capabilities the driver needs.

use std::cell::{Ref, RefCell};
use std::convert::Infallible;
use std::rc::Rc;

use dataflash_core::chip::geometry::PAGE_COUNT;
use dataflash_core::{Buffer, ControlLines, Dataflash, DataflashConfig, Delay, SpiTransport};

mod state;

use state::ChipState;

/// Configuration for the emulated chip
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Status reads that report busy after each internal operation
    pub busy_polls: u32,
    /// Manufacturer and device id bytes; the fourth byte is replaced by the
    /// length of `extended_info`, capped at 255
    pub id: [u8; 4],
    /// Extended device information returned after the id
    pub extended_info: Vec<u8>,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            busy_polls: 2,
            id: [0x1F, 0x26, 0x00, 0x00], // Atmel AT45DB161D
            extended_info: Vec::new(),
        }
    }
}

impl DummyConfig {
    /// Parse emulator options from a list of key-value pairs
    ///
    /// - `busy=N` - status reads reporting busy after each internal operation
    pub fn from_options(options: &[(&str, &str)]) -> Result<Self, String> {
        let mut config = Self::default();
        for (key, value) in options {
            match *key {
                "busy" => {
                    config.busy_polls = value
                        .parse()
                        .map_err(|_| format!("Invalid busy value: {}", value))?;
                }
                _ => log::warn!("dummy: Unknown option: {}={}", key, value),
            }
        }
        Ok(config)
    }
}

/// One entry of the bus trace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    /// Chip-select driven low
    Select,
    /// Chip-select driven high
    Deselect,
    /// One full-duplex byte exchange
    Transfer {
        /// Byte sent by the host
        mosi: u8,
        /// Byte returned by the chip
        miso: u8,
    },
    /// Reset line change (`true` = held in reset)
    Reset(bool),
    /// Write-protect line change (`true` = asserted)
    WriteProtect(bool),
    /// Host delay in microseconds
    Delay(u32),
}

/// Emulated AT45DB161D
///
/// Cloning gives another handle to the same chip.
#[derive(Clone)]
pub struct DummyDataflash {
    state: Rc<RefCell<ChipState>>,
}

/// Driver handle bound to the emulator
pub type DummyHandle = Dataflash<DummyBus, DummyLines, DummyDelay>;

impl DummyDataflash {
    /// Create an erased chip
    pub fn new(config: DummyConfig) -> Self {
        log::info!(
            "dummy: emulating AT45DB161D ({} busy polls per operation)",
            config.busy_polls
        );
        Self {
            state: Rc::new(RefCell::new(ChipState::new(config))),
        }
    }

    /// Create an erased chip with the default configuration
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Byte transfer capability
    pub fn bus(&self) -> DummyBus {
        DummyBus(self.state.clone())
    }

    /// Control line capability
    pub fn lines(&self) -> DummyLines {
        DummyLines(self.state.clone())
    }

    /// Delay capability (records, does not sleep)
    pub fn delay(&self) -> DummyDelay {
        DummyDelay(self.state.clone())
    }

    /// Build a driver handle wired to this chip
    pub fn device(&self, config: DataflashConfig) -> DummyHandle {
        Dataflash::new(self.bus(), self.lines(), self.delay(), config)
    }

    fn state(&self) -> Ref<'_, ChipState> {
        self.state.borrow()
    }

    // ========================================================================
    // Memory inspection
    // ========================================================================

    /// Contents of a main memory page
    pub fn page(&self, page: u16) -> Vec<u8> {
        self.state().page(page).to_vec()
    }

    /// Overwrite a main memory page, bypassing the command decoder
    pub fn set_page(&self, page: u16, data: &[u8]) {
        let mut state = self.state.borrow_mut();
        let target = state.page_mut(page);
        let len = target.len().min(data.len());
        target[..len].copy_from_slice(&data[..len]);
    }

    /// Contents of an SRAM buffer
    pub fn buffer(&self, buffer: Buffer) -> Vec<u8> {
        self.state().buffers[buffer_index(buffer)].clone()
    }

    /// Whether every page is erased
    pub fn is_blank(&self) -> bool {
        (0..PAGE_COUNT).all(|page| self.state().page(page).iter().all(|&b| b == 0xFF))
    }

    /// Current status register value
    pub fn status(&self) -> u8 {
        self.state().status()
    }

    /// Whether chip-select is asserted
    pub fn is_selected(&self) -> bool {
        self.state().selected
    }

    /// Whether the chip is in deep power-down
    pub fn is_powered_down(&self) -> bool {
        self.state().powered_down
    }

    /// Whether the write-protect line is asserted
    pub fn is_write_protected(&self) -> bool {
        self.state().write_protect
    }

    /// Commands other than status read issued while the chip was busy
    pub fn violations(&self) -> u32 {
        self.state().violations
    }

    /// Opcodes the decoder did not recognise
    pub fn unknown_opcodes(&self) -> u32 {
        self.state().unknown_opcodes
    }

    // ========================================================================
    // Bus trace
    // ========================================================================

    /// Every event recorded since creation or the last [`clear_trace`](Self::clear_trace)
    pub fn trace(&self) -> Vec<BusEvent> {
        self.state().trace.clone()
    }

    /// Drop the recorded events
    pub fn clear_trace(&self) {
        self.state.borrow_mut().trace.clear();
    }

    /// Bytes sent by the host in each select/deselect window
    ///
    /// Windows without any byte are skipped.
    pub fn transactions(&self) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        let mut current: Option<Vec<u8>> = None;
        for event in self.state().trace.iter() {
            match *event {
                BusEvent::Select => {
                    current.get_or_insert_with(Vec::new);
                }
                BusEvent::Deselect => {
                    if let Some(bytes) = current.take().filter(|b| !b.is_empty()) {
                        out.push(bytes);
                    }
                }
                BusEvent::Transfer { mosi, .. } => {
                    if let Some(bytes) = current.as_mut() {
                        bytes.push(mosi);
                    }
                }
                _ => {}
            }
        }
        out
    }

    /// Number of status register read transactions
    pub fn status_reads(&self) -> usize {
        self.transactions()
            .iter()
            .filter(|t| t.first() == Some(&dataflash_core::spi::opcodes::STATUS_REGISTER_READ))
            .count()
    }

    /// Number of commands whose opcode was not preceded by a chip-select
    /// high-to-low pulse
    pub fn unframed_commands(&self) -> usize {
        let state = self.state();
        let trace = &state.trace;
        let mut unframed = 0;
        for (i, event) in trace.iter().enumerate() {
            if !matches!(event, BusEvent::Transfer { .. }) {
                continue;
            }
            let opens_window = i == 0 || trace[i - 1] == BusEvent::Select;
            if opens_window && (i < 2 || trace[i - 2] != BusEvent::Deselect) {
                unframed += 1;
            }
        }
        unframed
    }
}

fn buffer_index(buffer: Buffer) -> usize {
    match buffer {
        Buffer::One => 0,
        Buffer::Two => 1,
    }
}

/// Byte transfer handle of a [`DummyDataflash`]
pub struct DummyBus(Rc<RefCell<ChipState>>);

impl SpiTransport for DummyBus {
    type Error = Infallible;

    fn transfer(&mut self, byte: u8) -> Result<u8, Infallible> {
        Ok(self.0.borrow_mut().transfer(byte))
    }
}

/// Control line handle of a [`DummyDataflash`]
pub struct DummyLines(Rc<RefCell<ChipState>>);

impl ControlLines for DummyLines {
    type Error = Infallible;

    fn set_cs(&mut self, active: bool) -> Result<(), Infallible> {
        self.0.borrow_mut().set_cs(active);
        Ok(())
    }

    fn set_reset(&mut self, active: bool) -> Result<(), Infallible> {
        self.0.borrow_mut().set_reset(active);
        Ok(())
    }

    fn set_write_protect(&mut self, active: bool) -> Result<(), Infallible> {
        self.0.borrow_mut().set_write_protect(active);
        Ok(())
    }
}

/// Delay handle of a [`DummyDataflash`]
pub struct DummyDelay(Rc<RefCell<ChipState>>);

impl Delay for DummyDelay {
    fn delay_us(&mut self, us: u32) {
        self.0.borrow_mut().trace.push(BusEvent::Delay(us));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay_us(ms.saturating_mul(1000));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataflash_core::spi::address::{SECTOR_0A, SECTOR_0B};
    use dataflash_core::{ContinuousReadMode, Error, PollMode, ReadSpeed};

    fn setup(busy_polls: u32) -> (DummyDataflash, DummyHandle) {
        let chip = DummyDataflash::new(DummyConfig {
            busy_polls,
            ..DummyConfig::default()
        });
        let mut flash = chip.device(DataflashConfig::default());
        flash.init().unwrap();
        chip.clear_trace();
        (chip, flash)
    }

    fn pattern(seed: u8) -> Vec<u8> {
        (0..528u32).map(|i| (i as u8).wrapping_add(seed)).collect()
    }

    #[test]
    fn test_status_and_id() {
        let (_chip, mut flash) = setup(0);
        let status = flash.read_status().unwrap();
        assert_eq!(status.bits(), 0xAC);
        assert_eq!(status.density_code(), 0b1011);
        assert_eq!(status.page_size(), 528);

        let id = flash.read_id().unwrap();
        assert_eq!(id.manufacturer, 0x1F);
        assert_eq!(id.device, [0x26, 0x00]);
        assert_eq!(id.extended_info_len, 0);
        assert!(id.is_at45db161d());
    }

    #[test]
    fn test_extended_id() {
        let chip = DummyDataflash::new(DummyConfig {
            extended_info: vec![0x01, 0x02, 0x03],
            ..DummyConfig::default()
        });
        let mut flash = chip.device(DataflashConfig::default());
        flash.init().unwrap();

        let mut ext = [0u8; 8];
        let (id, len) = flash.read_id_extended(&mut ext).unwrap();
        assert_eq!(id.extended_info_len, 3);
        assert_eq!(&ext[..len], &[0x01, 0x02, 0x03]);
    }

    #[test]
    fn test_extended_id_caps_length() {
        let info: Vec<u8> = (0..300u32).map(|i| i as u8).collect();
        let chip = DummyDataflash::new(DummyConfig {
            extended_info: info.clone(),
            ..DummyConfig::default()
        });
        let mut flash = chip.device(DataflashConfig::default());
        flash.init().unwrap();

        let mut ext = [0u8; 300];
        let (id, len) = flash.read_id_extended(&mut ext).unwrap();
        assert_eq!(id.extended_info_len, 255);
        assert_eq!(len, 255);
        assert_eq!(&ext[..255], &info[..255]);
    }

    #[test]
    fn test_buffer_round_trip_through_page() {
        let (chip, mut flash) = setup(3);
        let data = pattern(0);

        flash.write_buffer(Buffer::One, 0, &data).unwrap();
        flash.buffer_to_page(Buffer::One, 10, true).unwrap();
        assert_eq!(chip.page(10), data);

        flash.page_to_buffer(10, Buffer::Two).unwrap();
        let mut back = vec![0u8; 528];
        flash
            .read_buffer(Buffer::Two, 0, &mut back, ReadSpeed::High)
            .unwrap();
        assert_eq!(back, data);
        assert_eq!(chip.violations(), 0);
        assert_eq!(chip.unframed_commands(), 0);
    }

    #[test]
    fn test_status_polls_match_busy_count() {
        let (chip, mut flash) = setup(3);
        flash.write_buffer(Buffer::One, 0, &[0x55]).unwrap();
        chip.clear_trace();

        flash.buffer_to_page(Buffer::One, 10, true).unwrap();
        assert_eq!(chip.status_reads(), 4);

        chip.clear_trace();
        flash.buffer_to_page(Buffer::One, 11, false).unwrap();
        assert_eq!(chip.status_reads(), 4);
        assert_eq!(chip.transactions()[0][0], 0x88);
    }

    #[test]
    fn test_continuous_polling_against_emulator() {
        let chip = DummyDataflash::new(DummyConfig {
            busy_polls: 5,
            ..DummyConfig::default()
        });
        let mut flash =
            chip.device(DataflashConfig::default().with_poll_mode(PollMode::Continuous));
        flash.init().unwrap();

        flash.page_erase(0).unwrap();
        assert_eq!(chip.status_reads(), 1);
        // Opcode plus five busy bytes and the ready byte
        let last = chip.transactions().pop().unwrap();
        assert_eq!(last.len(), 7);
        assert_eq!(chip.violations(), 0);
    }

    #[test]
    fn test_program_without_erase_clears_bits_only() {
        let (chip, mut flash) = setup(0);
        chip.set_page(3, &[0xF0; 528]);

        flash.write_buffer(Buffer::Two, 0, &[0x3C; 528]).unwrap();
        flash.buffer_to_page(Buffer::Two, 3, false).unwrap();
        assert!(chip.page(3).iter().all(|&b| b == 0x30));

        flash.buffer_to_page(Buffer::Two, 3, true).unwrap();
        assert!(chip.page(3).iter().all(|&b| b == 0x3C));
    }

    #[test]
    fn test_every_operation_is_framed() {
        let chip = DummyDataflash::new_default();
        let mut flash = chip.device(DataflashConfig::default().with_chip_erase(true));
        let mut buf = [0u8; 16];

        flash.init().unwrap();
        flash.read_status().unwrap();
        flash.read_id().unwrap();
        flash.write_buffer(Buffer::One, 0, &[1, 2, 3]).unwrap();
        flash
            .read_buffer(Buffer::One, 0, &mut buf, ReadSpeed::Low)
            .unwrap();
        flash
            .read_buffer(Buffer::Two, 0, &mut buf, ReadSpeed::High)
            .unwrap();
        flash.buffer_to_page(Buffer::One, 1, true).unwrap();
        flash.buffer_to_page(Buffer::Two, 2, false).unwrap();
        flash.page_to_buffer(1, Buffer::Two).unwrap();
        flash.compare_page_to_buffer(1, Buffer::Two).unwrap();
        flash.auto_page_rewrite(1, Buffer::One).unwrap();
        flash.read_page(1, 0, &mut buf).unwrap();
        for mode in [
            ContinuousReadMode::Low,
            ContinuousReadMode::High,
            ContinuousReadMode::Legacy,
        ] {
            flash.read_continuous(0, 0, &mut buf, mode).unwrap();
        }
        flash
            .write_page_through_buffer(5, 0, Buffer::Two, &[9; 4])
            .unwrap();
        flash.page_erase(1).unwrap();
        flash.block_erase(1).unwrap();
        flash.sector_erase(SECTOR_0B).unwrap();
        flash.chip_erase().unwrap();
        flash.deep_power_down().unwrap();
        flash.resume_from_deep_power_down().unwrap();

        assert_eq!(chip.unframed_commands(), 0);
        assert_eq!(chip.violations(), 0);
        assert_eq!(chip.unknown_opcodes(), 0);
        assert!(!chip.is_selected());
    }

    #[test]
    fn test_compare() {
        let (chip, mut flash) = setup(1);
        let data = pattern(7);
        chip.set_page(20, &data);

        flash.write_buffer(Buffer::One, 0, &data).unwrap();
        assert!(flash.compare_page_to_buffer(20, Buffer::One).unwrap());

        flash.write_buffer(Buffer::One, 100, &[0x00]).unwrap();
        assert!(!flash.compare_page_to_buffer(20, Buffer::One).unwrap());
        assert_ne!(chip.status() & 0x40, 0);
    }

    #[test]
    fn test_page_write_through_buffer() {
        let (chip, mut flash) = setup(2);
        flash.write_buffer(Buffer::One, 0, &[0xFF; 528]).unwrap();
        chip.set_page(8, &[0x00; 528]);

        let status = flash
            .write_page_through_buffer(8, 10, Buffer::One, b"hello")
            .unwrap();
        assert!(status.is_ready());

        let page = chip.page(8);
        assert_eq!(&page[10..15], b"hello");
        // Built-in erase: the rest of the page comes from the buffer
        assert!(page[..10].iter().all(|&b| b == 0xFF));
        assert_eq!(chip.status_reads(), 3);
    }

    #[test]
    fn test_program_stream_written_byte_by_byte() {
        let (chip, mut flash) = setup(0);
        let mut stream = flash
            .begin_page_write_through_buffer(4, 0, Buffer::Two)
            .unwrap();
        for b in 0..4u8 {
            stream.transfer(b).unwrap();
        }
        stream.commit().unwrap();
        assert_eq!(&chip.page(4)[..4], &[0, 1, 2, 3]);
        assert!(!chip.is_selected());
    }

    #[test]
    fn test_page_read_leaves_buffers_alone() {
        let (chip, mut flash) = setup(0);
        let data = pattern(3);
        chip.set_page(100, &data);
        let before = chip.buffer(Buffer::One);

        let mut back = vec![0u8; 528];
        flash.read_page(100, 0, &mut back).unwrap();
        assert_eq!(back, data);
        assert_eq!(chip.buffer(Buffer::One), before);

        // Reads wrap at the end of the page
        let mut tail = [0u8; 4];
        flash.read_page(100, 526, &mut tail).unwrap();
        assert_eq!(tail, [data[526], data[527], data[0], data[1]]);
    }

    #[test]
    fn test_continuous_read_crosses_pages() {
        let (chip, mut flash) = setup(0);
        chip.set_page(0, &pattern(0));
        chip.set_page(1, &pattern(100));

        for mode in [
            ContinuousReadMode::Low,
            ContinuousReadMode::High,
            ContinuousReadMode::Legacy,
        ] {
            let mut buf = [0u8; 4];
            flash.read_continuous(0, 526, &mut buf, mode).unwrap();
            assert_eq!(buf, [pattern(0)[526], pattern(0)[527], 100, 101]);
        }

        let mut stream = flash.continuous_read(0, 0, ContinuousReadMode::High).unwrap();
        let mut all = vec![0u8; 2 * 528];
        stream.read(&mut all).unwrap();
        stream.finish().unwrap();
        assert_eq!(&all[..528], &pattern(0)[..]);
        assert_eq!(&all[528..], &pattern(100)[..]);
    }

    #[test]
    fn test_buffer_write_wraps() {
        let (chip, mut flash) = setup(0);
        flash.write_buffer(Buffer::Two, 527, &[1, 2]).unwrap();
        let buffer = chip.buffer(Buffer::Two);
        assert_eq!(buffer[527], 1);
        assert_eq!(buffer[0], 2);
    }

    #[test]
    fn test_erase_granularity() {
        let (chip, mut flash) = setup(0);
        for page in [0u16, 7, 8, 15, 16, 255, 256, 511, 512] {
            chip.set_page(page, &[0x00; 528]);
        }

        flash.page_erase(7).unwrap();
        assert!(chip.page(7).iter().all(|&b| b == 0xFF));
        assert!(chip.page(8).iter().all(|&b| b == 0x00));

        flash.block_erase(1).unwrap();
        assert!(chip.page(8).iter().all(|&b| b == 0xFF));
        assert!(chip.page(15).iter().all(|&b| b == 0xFF));
        assert!(chip.page(16).iter().all(|&b| b == 0x00));
        assert!(chip.page(0).iter().all(|&b| b == 0x00));

        flash.sector_erase(SECTOR_0A).unwrap();
        assert!(chip.page(0).iter().all(|&b| b == 0xFF));
        assert!(chip.page(16).iter().all(|&b| b == 0x00));

        flash.sector_erase(SECTOR_0B).unwrap();
        assert!(chip.page(16).iter().all(|&b| b == 0xFF));
        assert!(chip.page(255).iter().all(|&b| b == 0xFF));
        assert!(chip.page(256).iter().all(|&b| b == 0x00));

        flash.sector_erase(1).unwrap();
        assert!(chip.page(256).iter().all(|&b| b == 0xFF));
        assert!(chip.page(511).iter().all(|&b| b == 0xFF));
        assert!(chip.page(512).iter().all(|&b| b == 0x00));
    }

    #[test]
    fn test_chip_erase_opt_in() {
        let chip = DummyDataflash::new_default();
        chip.set_page(4095, &[0x12; 528]);

        let mut flash = chip.device(DataflashConfig::default());
        flash.init().unwrap();
        assert_eq!(flash.chip_erase(), Err(Error::ChipEraseDisabled));
        assert!(!chip.is_blank());

        flash.config_mut().allow_chip_erase = true;
        flash.chip_erase().unwrap();
        assert!(chip.is_blank());
    }

    #[test]
    fn test_auto_page_rewrite_keeps_content() {
        let (chip, mut flash) = setup(1);
        let data = pattern(42);
        chip.set_page(9, &data);
        flash.auto_page_rewrite(9, Buffer::Two).unwrap();
        assert_eq!(chip.page(9), data);
        assert_eq!(chip.buffer(Buffer::Two), data);
    }

    #[test]
    fn test_deep_power_down_ignores_commands() {
        let (chip, mut flash) = setup(0);
        chip.set_page(0, &[0x5A; 528]);

        flash.deep_power_down().unwrap();
        assert!(chip.is_powered_down());
        assert!(chip.trace().contains(&BusEvent::Delay(100_000)));

        let mut buf = [0u8; 2];
        flash.read_page(0, 0, &mut buf).unwrap();
        assert_eq!(buf, [0x00, 0x00]);

        flash.resume_from_deep_power_down().unwrap();
        assert!(!chip.is_powered_down());
        flash.read_page(0, 0, &mut buf).unwrap();
        assert_eq!(buf, [0x5A, 0x5A]);
    }

    #[test]
    fn test_hard_reset_ordering() {
        let (chip, mut flash) = setup(0);
        flash.hard_reset().unwrap();
        assert_eq!(
            chip.trace(),
            vec![
                BusEvent::Reset(true),
                BusEvent::Delay(10),
                BusEvent::Deselect,
                BusEvent::Delay(1),
                BusEvent::Reset(false),
                BusEvent::Delay(1),
                BusEvent::Select,
            ]
        );

        // The next command still starts with its own pulse
        flash.read_status().unwrap();
        assert_eq!(chip.unframed_commands(), 0);
    }

    #[test]
    fn test_init_and_write_protect() {
        let chip = DummyDataflash::new_default();
        let mut flash = chip.device(DataflashConfig::default());
        flash.init().unwrap();
        assert!(chip.is_write_protected());
        assert!(!chip.is_selected());

        flash.disable_write_protection().unwrap();
        assert!(!chip.is_write_protected());
        flash.enable_write_protection().unwrap();
        assert!(chip.is_write_protected());
    }

    #[test]
    fn test_dropped_stream_releases_chip_select() {
        let (chip, mut flash) = setup(0);
        {
            let mut stream = flash.buffer_write(Buffer::One, 0).unwrap();
            stream.write(&[0xAA, 0xBB]).unwrap();
        }
        assert!(!chip.is_selected());
        assert_eq!(&chip.buffer(Buffer::One)[..2], &[0xAA, 0xBB]);
    }

    #[test]
    fn test_from_options() {
        assert_eq!(DummyConfig::from_options(&[]).unwrap().busy_polls, 2);
        assert_eq!(
            DummyConfig::from_options(&[("busy", "7")]).unwrap().busy_polls,
            7
        );
        assert!(DummyConfig::from_options(&[("busy", "x")]).is_err());
    }
}
