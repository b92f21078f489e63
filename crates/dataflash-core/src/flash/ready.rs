//! Status register reads and the ready/busy synchronizer

use maybe_async::maybe_async;

use super::Dataflash;
use crate::bus::{ControlLines, Delay, SpiTransport};
use crate::chip::Status;
use crate::config::PollMode;
use crate::error::{Error, Result};
use crate::spi::{opcodes, Command};

#[maybe_async]
impl<T, L, D> Dataflash<T, L, D>
where
    T: SpiTransport,
    L: ControlLines,
    D: Delay,
{
    /// Read the status register
    ///
    /// One complete transaction: pulse, opcode, one status byte, deselect.
    pub async fn read_status(&mut self) -> Result<Status, T::Error, L::Error> {
        self.begin(&Command::simple(opcodes::STATUS_REGISTER_READ))
            .await?;
        let raw = self.spi.transfer(0x00).await.map_err(Error::Transport)?;
        self.deselect()?;
        Ok(Status::from_raw(raw))
    }

    /// Block until the chip reports ready and return the final status
    ///
    /// There is no timeout: a chip that never becomes ready (e.g. miswired
    /// hardware) blocks the caller forever. The poll strategy and the delay
    /// between polls come from the configuration.
    pub async fn wait_ready(&mut self) -> Result<Status, T::Error, L::Error> {
        let interval = self.config.poll_interval_us;
        let mut polls: u32 = 1;

        let status = match self.config.poll_mode {
            PollMode::Reissue => loop {
                let status = self.read_status().await?;
                if status.is_ready() {
                    break status;
                }
                if interval > 0 {
                    self.delay.delay_us(interval).await;
                }
                polls = polls.wrapping_add(1);
            },
            PollMode::Continuous => {
                self.begin(&Command::simple(opcodes::STATUS_REGISTER_READ))
                    .await?;
                let status = loop {
                    let raw = self.spi.transfer(0x00).await.map_err(Error::Transport)?;
                    let status = Status::from_raw(raw);
                    if status.is_ready() {
                        break status;
                    }
                    if interval > 0 {
                        self.delay.delay_us(interval).await;
                    }
                    polls = polls.wrapping_add(1);
                };
                self.deselect()?;
                status
            }
        };

        log::trace!("dataflash: ready after {} status polls", polls);
        Ok(status)
    }
}

#[cfg(all(test, feature = "is_sync"))]
mod tests {
    use std::vec;

    use crate::config::{DataflashConfig, PollMode};
    use crate::flash::mock::{Event, Mock, BUSY, IDLE};

    #[test]
    fn test_read_status_is_one_transaction() {
        let mock = Mock::new();
        let mut flash = mock.flash(DataflashConfig::default());
        let status = flash.read_status().unwrap();

        assert_eq!(status.bits(), IDLE);
        assert_eq!(mock.transactions(), vec![vec![0xD7, 0x00]]);
        assert!(!mock.selected());
    }

    #[test]
    fn test_wait_ready_reissues_each_poll() {
        let mock = Mock::new();
        let mut flash = mock.flash(DataflashConfig::default());
        mock.push_statuses(&[BUSY, BUSY, IDLE]);

        let status = flash.wait_ready().unwrap();
        assert!(status.is_ready());
        assert_eq!(mock.status_reads(), 3);
        // No delay between polls by default
        assert!(!mock.events().iter().any(|e| matches!(e, Event::DelayUs(_))));
    }

    #[test]
    fn test_wait_ready_on_ready_chip_reads_once() {
        let mock = Mock::new();
        let mut flash = mock.flash(DataflashConfig::default());
        flash.wait_ready().unwrap();
        assert_eq!(mock.status_reads(), 1);
    }

    #[test]
    fn test_wait_ready_waits_between_polls() {
        let mock = Mock::new();
        let mut flash = mock.flash(DataflashConfig::default().with_poll_interval_us(5));
        mock.push_statuses(&[BUSY, BUSY, IDLE]);

        flash.wait_ready().unwrap();
        let delays = mock
            .events()
            .iter()
            .filter(|e| **e == Event::DelayUs(5))
            .count();
        assert_eq!(delays, 2);
    }

    #[test]
    fn test_wait_ready_continuous_keeps_clocking() {
        let mock = Mock::new();
        let mut flash =
            mock.flash(DataflashConfig::default().with_poll_mode(PollMode::Continuous));
        mock.push_statuses(&[BUSY, BUSY, BUSY, IDLE]);

        let status = flash.wait_ready().unwrap();
        assert!(status.is_ready());
        assert_eq!(mock.transactions(), vec![vec![0xD7, 0x00, 0x00, 0x00, 0x00]]);
        assert!(!mock.selected());
    }
}
