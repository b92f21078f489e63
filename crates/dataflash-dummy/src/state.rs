//! Byte-level model of the AT45DB161D command decoder

use dataflash_core::chip::geometry::{
    sector_pages, BUFFER_SIZE, PAGES_PER_BLOCK, PAGE_COUNT, PAGE_SIZE, TOTAL_SIZE,
};
use dataflash_core::spi::{opcodes, AddressField};

use crate::{BusEvent, DummyConfig};

const PAGE: usize = PAGE_SIZE as usize;
/// Status bits 5-2 of a 16 Mbit part
const STATUS_DENSITY: u8 = 0x2C;
/// Level the chip leaves on MISO outside a data phase
const IDLE_MISO: u8 = 0x00;

/// Command decoded from the opcode byte
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Op {
    PageRead,
    ContinuousRead,
    BufferRead(usize),
    BufferWrite(usize),
    BufferToPage { buffer: usize, erase: bool },
    PageToBuffer(usize),
    Compare(usize),
    AutoRewrite(usize),
    PageThroughBuffer(usize),
    PageErase,
    BlockErase,
    SectorErase,
    ChipErase,
    DeepPowerDown,
    Resume,
    Status,
    Id,
}

impl Op {
    /// Decode an opcode into the command and its address and don't care
    /// byte counts
    fn decode(opcode: u8) -> Option<(Self, usize, usize)> {
        let decoded = match opcode {
            opcodes::PAGE_READ => (Self::PageRead, 3, 4),
            opcodes::CONTINUOUS_READ_LEGACY => (Self::ContinuousRead, 3, 4),
            opcodes::CONTINUOUS_READ_LOW_FREQ => (Self::ContinuousRead, 3, 0),
            opcodes::CONTINUOUS_READ_HIGH_FREQ => (Self::ContinuousRead, 3, 1),
            opcodes::BUFFER_1_READ_LOW_FREQ => (Self::BufferRead(0), 3, 0),
            opcodes::BUFFER_2_READ_LOW_FREQ => (Self::BufferRead(1), 3, 0),
            opcodes::BUFFER_1_READ => (Self::BufferRead(0), 3, 1),
            opcodes::BUFFER_2_READ => (Self::BufferRead(1), 3, 1),
            opcodes::BUFFER_1_WRITE => (Self::BufferWrite(0), 3, 0),
            opcodes::BUFFER_2_WRITE => (Self::BufferWrite(1), 3, 0),
            opcodes::BUFFER_1_TO_PAGE_WITH_ERASE => (Self::buffer_to_page(0, true), 3, 0),
            opcodes::BUFFER_2_TO_PAGE_WITH_ERASE => (Self::buffer_to_page(1, true), 3, 0),
            opcodes::BUFFER_1_TO_PAGE_WITHOUT_ERASE => (Self::buffer_to_page(0, false), 3, 0),
            opcodes::BUFFER_2_TO_PAGE_WITHOUT_ERASE => (Self::buffer_to_page(1, false), 3, 0),
            opcodes::TRANSFER_PAGE_TO_BUFFER_1 => (Self::PageToBuffer(0), 3, 0),
            opcodes::TRANSFER_PAGE_TO_BUFFER_2 => (Self::PageToBuffer(1), 3, 0),
            opcodes::COMPARE_PAGE_TO_BUFFER_1 => (Self::Compare(0), 3, 0),
            opcodes::COMPARE_PAGE_TO_BUFFER_2 => (Self::Compare(1), 3, 0),
            opcodes::AUTO_PAGE_REWRITE_BUFFER_1 => (Self::AutoRewrite(0), 3, 0),
            opcodes::AUTO_PAGE_REWRITE_BUFFER_2 => (Self::AutoRewrite(1), 3, 0),
            opcodes::PAGE_THROUGH_BUFFER_1 => (Self::PageThroughBuffer(0), 3, 0),
            opcodes::PAGE_THROUGH_BUFFER_2 => (Self::PageThroughBuffer(1), 3, 0),
            opcodes::PAGE_ERASE => (Self::PageErase, 3, 0),
            opcodes::BLOCK_ERASE => (Self::BlockErase, 3, 0),
            opcodes::SECTOR_ERASE => (Self::SectorErase, 3, 0),
            // The three trailing bytes of the chip erase sequence take the
            // place of the address
            0xC7 => (Self::ChipErase, 3, 0),
            opcodes::DEEP_POWER_DOWN => (Self::DeepPowerDown, 0, 0),
            opcodes::RESUME_FROM_DEEP_POWER_DOWN => (Self::Resume, 0, 0),
            opcodes::STATUS_REGISTER_READ => (Self::Status, 0, 0),
            opcodes::READ_MANUFACTURER_AND_DEVICE_ID => (Self::Id, 0, 0),
            _ => return None,
        };
        Some(decoded)
    }

    fn buffer_to_page(buffer: usize, erase: bool) -> Self {
        Self::BufferToPage { buffer, erase }
    }

    /// Whether the chip-select rising edge starts an internal cycle
    fn is_internal(self) -> bool {
        matches!(
            self,
            Self::BufferToPage { .. }
                | Self::PageToBuffer(_)
                | Self::Compare(_)
                | Self::AutoRewrite(_)
                | Self::PageThroughBuffer(_)
                | Self::PageErase
                | Self::BlockErase
                | Self::SectorErase
                | Self::ChipErase
        )
    }
}

/// Command being clocked in between a select and a deselect
#[derive(Debug)]
struct Decoding {
    op: Op,
    address: [u8; 3],
    address_len: usize,
    dummy_len: usize,
    /// Bytes received after the opcode
    received: usize,
}

impl Decoding {
    fn header_len(&self) -> usize {
        self.address_len + self.dummy_len
    }

    fn header_complete(&self) -> bool {
        self.received >= self.header_len()
    }

    fn field(&self) -> AddressField {
        AddressField(self.address)
    }

    /// Position inside the data phase of the byte about to be clocked
    fn data_pos(&self) -> usize {
        self.received - self.header_len()
    }
}

#[derive(Debug)]
enum Phase {
    /// Chip-select high
    Idle,
    /// Selected, waiting for the opcode
    Opcode,
    /// Command accepted
    Command(Decoding),
    /// Command ignored until the next deselect
    Ignore,
}

pub(crate) struct ChipState {
    pub(crate) config: DummyConfig,
    pub(crate) memory: Vec<u8>,
    pub(crate) buffers: [Vec<u8>; 2],
    pub(crate) trace: Vec<BusEvent>,
    pub(crate) busy: u32,
    pub(crate) compare_mismatch: bool,
    pub(crate) powered_down: bool,
    pub(crate) in_reset: bool,
    pub(crate) write_protect: bool,
    pub(crate) selected: bool,
    pub(crate) violations: u32,
    pub(crate) unknown_opcodes: u32,
    phase: Phase,
}

impl ChipState {
    pub(crate) fn new(config: DummyConfig) -> Self {
        Self {
            config,
            memory: vec![0xFF; TOTAL_SIZE as usize],
            buffers: [vec![0xFF; BUFFER_SIZE as usize], vec![0xFF; BUFFER_SIZE as usize]],
            trace: Vec::new(),
            busy: 0,
            compare_mismatch: false,
            powered_down: false,
            in_reset: false,
            write_protect: false,
            selected: false,
            violations: 0,
            unknown_opcodes: 0,
            phase: Phase::Idle,
        }
    }

    pub(crate) fn status(&self) -> u8 {
        let mut status = STATUS_DENSITY;
        if self.busy == 0 {
            status |= opcodes::SR_READY;
        }
        if self.compare_mismatch {
            status |= opcodes::SR_COMPARE;
        }
        status
    }

    pub(crate) fn page(&self, page: u16) -> &[u8] {
        let start = page_start(page);
        &self.memory[start..start + PAGE]
    }

    pub(crate) fn page_mut(&mut self, page: u16) -> &mut [u8] {
        let start = page_start(page);
        &mut self.memory[start..start + PAGE]
    }

    // ------------------------------------------------------------------------
    // Line events
    // ------------------------------------------------------------------------

    pub(crate) fn set_cs(&mut self, active: bool) {
        self.trace.push(if active {
            BusEvent::Select
        } else {
            BusEvent::Deselect
        });

        if active && !self.selected {
            self.phase = Phase::Opcode;
        } else if !active && self.selected {
            let phase = core::mem::replace(&mut self.phase, Phase::Idle);
            if let Phase::Command(cmd) = phase {
                self.complete(cmd);
            }
        }
        self.selected = active;
    }

    pub(crate) fn set_reset(&mut self, active: bool) {
        self.trace.push(BusEvent::Reset(active));
        if active {
            // Reset aborts any command in progress and the internal cycle
            self.busy = 0;
            self.phase = if self.selected {
                Phase::Ignore
            } else {
                Phase::Idle
            };
        }
        self.in_reset = active;
    }

    pub(crate) fn set_write_protect(&mut self, active: bool) {
        self.trace.push(BusEvent::WriteProtect(active));
        self.write_protect = active;
    }

    // ------------------------------------------------------------------------
    // Byte exchange
    // ------------------------------------------------------------------------

    pub(crate) fn transfer(&mut self, mosi: u8) -> u8 {
        let miso = self.clock(mosi);
        self.trace.push(BusEvent::Transfer { mosi, miso });
        miso
    }

    fn clock(&mut self, mosi: u8) -> u8 {
        if !self.selected || self.in_reset {
            return IDLE_MISO;
        }

        match &mut self.phase {
            Phase::Idle | Phase::Ignore => IDLE_MISO,
            Phase::Opcode => {
                self.phase = self.accept(mosi);
                IDLE_MISO
            }
            Phase::Command(cmd) if !cmd.header_complete() => {
                if cmd.received < cmd.address_len {
                    cmd.address[cmd.received] = mosi;
                }
                cmd.received += 1;
                IDLE_MISO
            }
            Phase::Command(_) => self.data(mosi),
        }
    }

    fn accept(&mut self, opcode: u8) -> Phase {
        let Some((op, address_len, dummy_len)) = Op::decode(opcode) else {
            log::debug!("dummy dataflash: unknown opcode 0x{:02X}", opcode);
            self.unknown_opcodes += 1;
            return Phase::Ignore;
        };

        if self.powered_down && op != Op::Resume {
            log::trace!("dummy dataflash: 0x{:02X} ignored in deep power-down", opcode);
            return Phase::Ignore;
        }
        if self.busy > 0 && op != Op::Status {
            log::debug!("dummy dataflash: 0x{:02X} issued while busy", opcode);
            self.violations += 1;
            return Phase::Ignore;
        }

        Phase::Command(Decoding {
            op,
            address: [0; 3],
            address_len,
            dummy_len,
            received: 0,
        })
    }

    /// Clock one byte of a data phase
    fn data(&mut self, mosi: u8) -> u8 {
        let Phase::Command(cmd) = &mut self.phase else {
            return IDLE_MISO;
        };
        let pos = cmd.data_pos();
        cmd.received += 1;
        let op = cmd.op;
        let field = cmd.field();

        match op {
            Op::Status => {
                let status = self.status();
                self.busy = self.busy.saturating_sub(1);
                status
            }
            Op::Id => {
                // The length byte caps the extended info at 255 bytes
                let info = &self.config.extended_info;
                let len = info.len().min(u8::MAX as usize);
                match pos {
                    0..=3 => {
                        let mut id = self.config.id;
                        id[3] = len as u8;
                        id[pos]
                    }
                    _ if pos - 4 < len => info[pos - 4],
                    _ => IDLE_MISO,
                }
            }
            Op::PageRead => {
                let offset = (field.decode_offset() as usize + pos) % PAGE;
                self.page(field.decode_page())[offset]
            }
            Op::ContinuousRead => {
                let start = page_start(field.decode_page()) + field.decode_offset() as usize;
                self.memory[(start + pos) % self.memory.len()]
            }
            Op::BufferRead(buffer) => {
                self.buffers[buffer][(field.decode_offset() as usize + pos) % PAGE]
            }
            Op::BufferWrite(buffer) | Op::PageThroughBuffer(buffer) => {
                self.buffers[buffer][(field.decode_offset() as usize + pos) % PAGE] = mosi;
                IDLE_MISO
            }
            _ => IDLE_MISO,
        }
    }

    // ------------------------------------------------------------------------
    // Internal operations
    // ------------------------------------------------------------------------

    /// Chip-select rising edge at the end of a command
    fn complete(&mut self, cmd: Decoding) {
        if !cmd.header_complete() {
            if cmd.op.is_internal() {
                log::debug!("dummy dataflash: {:?} aborted before its address", cmd.op);
            }
            return;
        }

        let field = cmd.field();
        let page = field.decode_page();
        match cmd.op {
            Op::BufferToPage { buffer, erase } => self.program(page, buffer, erase),
            Op::PageThroughBuffer(buffer) => self.program(page, buffer, true),
            Op::PageToBuffer(buffer) => {
                let data = self.page(page).to_vec();
                self.buffers[buffer].copy_from_slice(&data);
            }
            Op::Compare(buffer) => {
                self.compare_mismatch = self.page(page) != &self.buffers[buffer][..];
            }
            Op::AutoRewrite(buffer) => {
                let data = self.page(page).to_vec();
                self.buffers[buffer].copy_from_slice(&data);
                self.program(page, buffer, true);
            }
            Op::PageErase => self.erase_pages(page..page + 1),
            Op::BlockErase => {
                let first = field.decode_block() * PAGES_PER_BLOCK;
                self.erase_pages(first..first + PAGES_PER_BLOCK);
            }
            Op::SectorErase => match sector_pages(field.decode_sector()) {
                Some(pages) => self.erase_pages(pages),
                None => log::debug!("dummy dataflash: sector address {:02X?} ignored", cmd.address),
            },
            Op::ChipErase => {
                if cmd.address == [0x94, 0x80, 0x9A] {
                    self.memory.fill(0xFF);
                } else {
                    log::debug!("dummy dataflash: bad chip erase sequence {:02X?}", cmd.address);
                    return;
                }
            }
            Op::DeepPowerDown => self.powered_down = true,
            Op::Resume => self.powered_down = false,
            _ => {}
        }

        if cmd.op.is_internal() {
            self.busy = self.config.busy_polls;
        }
    }

    fn program(&mut self, page: u16, buffer: usize, erase: bool) {
        let data = self.buffers[buffer].clone();
        let target = self.page_mut(page);
        if erase {
            target.copy_from_slice(&data);
        } else {
            // Programming without erase can only clear bits
            for (cell, byte) in target.iter_mut().zip(data) {
                *cell &= byte;
            }
        }
    }

    fn erase_pages(&mut self, pages: core::ops::Range<u16>) {
        for page in pages {
            self.page_mut(page).fill(0xFF);
        }
    }
}

fn page_start(page: u16) -> usize {
    (page % PAGE_COUNT) as usize * PAGE
}
