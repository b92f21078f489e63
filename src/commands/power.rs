//! Power-down and reset commands

use dataflash_core::{ControlLines, Dataflash, Delay, SpiTransport};

use super::{CmdResult, HostError};
use crate::cli::PowerCommands;

/// Enter or leave deep power-down
pub fn run<T, L, D>(flash: &mut Dataflash<T, L, D>, cmd: &PowerCommands) -> CmdResult
where
    T: SpiTransport,
    T::Error: HostError,
    L: ControlLines,
    L::Error: HostError,
    D: Delay,
{
    match cmd {
        PowerCommands::Down => {
            flash.deep_power_down()?;
            println!("Entered deep power-down (only resume is accepted now)");
        }
        PowerCommands::Resume => {
            flash.resume_from_deep_power_down()?;
            let status = flash.read_status()?;
            println!("Resumed, status register: 0b{:08b}", status.bits());
        }
    }
    Ok(())
}

/// Pulse the reset line, aborting any operation in progress
pub fn run_reset<T, L, D>(flash: &mut Dataflash<T, L, D>) -> CmdResult
where
    T: SpiTransport,
    T::Error: HostError,
    L: ControlLines,
    L::Error: HostError,
    D: Delay,
{
    flash.hard_reset()?;
    println!("Reset pulse sent");
    Ok(())
}
