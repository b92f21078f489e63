//! Deep power-down, hardware reset and write protection

use maybe_async::maybe_async;

use super::Dataflash;
use crate::bus::{ControlLines, Delay, SpiTransport};
use crate::error::{Error, Result};
use crate::spi::{opcodes, Command};

#[maybe_async]
impl<T, L, D> Dataflash<T, L, D>
where
    T: SpiTransport,
    L: ControlLines,
    D: Delay,
{
    /// Put the device into the lowest power consumption mode
    ///
    /// Once in deep power-down every command except
    /// [`resume_from_deep_power_down`](Self::resume_from_deep_power_down)
    /// is ignored by the chip.
    pub async fn deep_power_down(&mut self) -> Result<(), T::Error, L::Error> {
        log::debug!("dataflash: entering deep power-down");
        self.single_shot(&Command::simple(opcodes::DEEP_POWER_DOWN))
            .await?;
        self.delay.delay_ms(self.config.power_settle_ms).await;
        Ok(())
    }

    /// Take the device out of deep power-down
    ///
    /// Chip-select must stay high for t_RDPD (35 us) before the next
    /// command; the configured settle delay covers it.
    pub async fn resume_from_deep_power_down(&mut self) -> Result<(), T::Error, L::Error> {
        log::debug!("dataflash: resuming from deep power-down");
        self.single_shot(&Command::simple(opcodes::RESUME_FROM_DEEP_POWER_DOWN))
            .await?;
        self.delay.delay_ms(self.config.power_settle_ms).await;
        Ok(())
    }

    /// Reset the device through the reset line
    ///
    /// Chip-select must be high before reset is released (datasheet reset
    /// timing), so the order below is fixed.
    pub async fn hard_reset(&mut self) -> Result<(), T::Error, L::Error> {
        log::debug!("dataflash: hard reset");
        self.lines.set_reset(true).map_err(Error::Line)?;
        self.delay.delay_us(self.config.reset_hold_us).await;

        self.deselect()?;
        self.delay.delay_us(self.config.reset_recovery_us).await;

        self.lines.set_reset(false).map_err(Error::Line)?;
        self.delay.delay_us(self.config.reset_recovery_us).await;

        self.select()
    }

    /// Assert the write-protect line
    pub fn enable_write_protection(&mut self) -> Result<(), T::Error, L::Error> {
        self.lines.set_write_protect(true).map_err(Error::Line)
    }

    /// Release the write-protect line
    pub fn disable_write_protection(&mut self) -> Result<(), T::Error, L::Error> {
        self.lines.set_write_protect(false).map_err(Error::Line)
    }
}

#[cfg(all(test, feature = "is_sync"))]
mod tests {
    use std::vec;

    use crate::config::DataflashConfig;
    use crate::flash::mock::{Event, Mock};

    #[test]
    fn test_deep_power_down_and_resume() {
        let mock = Mock::new();
        let mut flash = mock.flash(DataflashConfig::default());

        flash.deep_power_down().unwrap();
        assert_eq!(mock.transactions(), vec![vec![0xB9]]);
        assert_eq!(mock.events().last(), Some(&Event::DelayMs(100)));
        assert!(!mock.selected());

        mock.clear();
        flash.resume_from_deep_power_down().unwrap();
        assert_eq!(mock.transactions(), vec![vec![0xAB]]);
        assert_eq!(mock.events().last(), Some(&Event::DelayMs(100)));
    }

    #[test]
    fn test_power_settle_is_configurable() {
        let mock = Mock::new();
        let mut flash = mock.flash(DataflashConfig::default().with_power_settle_ms(1));
        flash.deep_power_down().unwrap();
        assert_eq!(mock.events().last(), Some(&Event::DelayMs(1)));
    }

    #[test]
    fn test_hard_reset_sequence() {
        let mock = Mock::new();
        let mut flash = mock.flash(DataflashConfig::default());
        flash.hard_reset().unwrap();

        assert_eq!(
            mock.events(),
            vec![
                Event::Reset(true),
                Event::DelayUs(10),
                Event::Deselect,
                Event::DelayUs(1),
                Event::Reset(false),
                Event::DelayUs(1),
                Event::Select,
            ]
        );
        assert!(mock.transactions().is_empty());
    }

    #[test]
    fn test_hard_reset_timing_is_configurable() {
        let mock = Mock::new();
        let config = DataflashConfig::default()
            .with_reset_hold_us(250)
            .with_reset_recovery_us(20);
        let mut flash = mock.flash(config);
        flash.hard_reset().unwrap();

        let delays: vec::Vec<_> = mock
            .events()
            .into_iter()
            .filter(|e| matches!(e, Event::DelayUs(_)))
            .collect();
        assert_eq!(
            delays,
            vec![Event::DelayUs(250), Event::DelayUs(20), Event::DelayUs(20)]
        );
    }

    #[test]
    fn test_write_protection_lines() {
        let mock = Mock::new();
        let mut flash = mock.flash(DataflashConfig::default());
        flash.disable_write_protection().unwrap();
        flash.enable_write_protection().unwrap();
        assert_eq!(
            mock.events(),
            vec![Event::WriteProtect(false), Event::WriteProtect(true)]
        );
    }
}
