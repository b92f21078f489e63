//! Scripted bus for the inline tests
//!
//! One shared state backs the transport, the control lines and the delay so
//! their events end up in a single ordered log.

use core::cell::RefCell;
use core::convert::Infallible;
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use crate::bus::{ControlLines, Delay, SpiTransport};
use crate::config::DataflashConfig;
use crate::spi::opcodes;

use super::Dataflash;

/// Idle status of an AT45DB161D: ready, density 1011, 528 byte pages
pub(crate) const IDLE: u8 = 0xAC;
/// Same as [`IDLE`] with the busy bit set
pub(crate) const BUSY: u8 = 0x2C;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Event {
    Select,
    Deselect,
    Byte(u8),
    Reset(bool),
    WriteProtect(bool),
    DelayUs(u32),
    DelayMs(u32),
}

#[derive(Default)]
struct State {
    events: Vec<Event>,
    statuses: VecDeque<u8>,
    id: Vec<u8>,
    position: usize,
    opcode: Option<u8>,
}

#[derive(Clone, Default)]
pub(crate) struct Mock(Rc<RefCell<State>>);

pub(crate) type MockFlash = Dataflash<Mock, Mock, Mock>;

impl Mock {
    pub(crate) fn new() -> Self {
        let mock = Self::default();
        mock.0.borrow_mut().id = std::vec![0x1F, 0x26, 0x00, 0x00];
        mock
    }

    /// Build a handle whose three capabilities share this mock
    pub(crate) fn flash(&self, config: DataflashConfig) -> MockFlash {
        Dataflash::new(self.clone(), self.clone(), self.clone(), config)
    }

    /// Queue status bytes; once drained every status read returns [`IDLE`]
    pub(crate) fn push_statuses(&self, statuses: &[u8]) {
        self.0.borrow_mut().statuses.extend(statuses.iter().copied());
    }

    pub(crate) fn set_id(&self, id: &[u8]) {
        self.0.borrow_mut().id = id.to_vec();
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.0.borrow().events.clone()
    }

    pub(crate) fn clear(&self) {
        self.0.borrow_mut().events.clear();
    }

    /// Bytes sent between each select and the following deselect
    ///
    /// Select/deselect pairs that carried no byte are skipped.
    pub(crate) fn transactions(&self) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        let mut current: Option<Vec<u8>> = None;
        for event in self.events() {
            match event {
                Event::Select => current = Some(Vec::new()),
                Event::Deselect => {
                    if let Some(bytes) = current.take() {
                        if !bytes.is_empty() {
                            out.push(bytes);
                        }
                    }
                }
                Event::Byte(b) => {
                    if let Some(bytes) = current.as_mut() {
                        bytes.push(b);
                    }
                }
                _ => {}
            }
        }
        out
    }

    /// Number of status register transactions
    pub(crate) fn status_reads(&self) -> usize {
        self.transactions()
            .iter()
            .filter(|t| t.first() == Some(&opcodes::STATUS_REGISTER_READ))
            .count()
    }

    /// Whether chip-select is currently asserted
    pub(crate) fn selected(&self) -> bool {
        self.0
            .borrow()
            .events
            .iter()
            .rev()
            .find_map(|e| match e {
                Event::Select => Some(true),
                Event::Deselect => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }
}

impl SpiTransport for Mock {
    type Error = Infallible;

    fn transfer(&mut self, byte: u8) -> Result<u8, Infallible> {
        let mut state = self.0.borrow_mut();
        state.events.push(Event::Byte(byte));

        let position = state.position;
        state.position += 1;
        if position == 0 {
            state.opcode = Some(byte);
            return Ok(0xFF);
        }

        let reply = match state.opcode {
            Some(opcodes::STATUS_REGISTER_READ) => state.statuses.pop_front().unwrap_or(IDLE),
            Some(opcodes::READ_MANUFACTURER_AND_DEVICE_ID) => {
                state.id.get(position - 1).copied().unwrap_or(0xFF)
            }
            _ => position as u8,
        };
        Ok(reply)
    }
}

impl ControlLines for Mock {
    type Error = Infallible;

    fn set_cs(&mut self, active: bool) -> Result<(), Infallible> {
        let mut state = self.0.borrow_mut();
        state.position = 0;
        state.opcode = None;
        state
            .events
            .push(if active { Event::Select } else { Event::Deselect });
        Ok(())
    }

    fn set_reset(&mut self, active: bool) -> Result<(), Infallible> {
        self.0.borrow_mut().events.push(Event::Reset(active));
        Ok(())
    }

    fn set_write_protect(&mut self, active: bool) -> Result<(), Infallible> {
        self.0.borrow_mut().events.push(Event::WriteProtect(active));
        Ok(())
    }
}

impl Delay for Mock {
    fn delay_us(&mut self, us: u32) {
        self.0.borrow_mut().events.push(Event::DelayUs(us));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.borrow_mut().events.push(Event::DelayMs(ms));
    }
}
