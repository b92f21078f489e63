//! Info command implementation

use dataflash_core::{ControlLines, Dataflash, Delay, SpiTransport};

use super::{CmdResult, HostError};

/// Longest extended device information string we display
const MAX_EXTENDED_INFO: usize = 32;

/// Show the status register and the identification record
pub fn run<T, L, D>(flash: &mut Dataflash<T, L, D>) -> CmdResult
where
    T: SpiTransport,
    T::Error: HostError,
    L: ControlLines,
    L::Error: HostError,
    D: Delay,
{
    let status = flash.read_status()?;
    let mut extended = [0u8; MAX_EXTENDED_INFO];
    let (id, len) = flash.read_id_extended(&mut extended)?;

    println!("Status register: 0b{:08b}", status.bits());
    println!("  Ready:       {}", status.is_ready());
    println!("  Compare:     {}", if status.compare_matched() { "match" } else { "mismatch" });
    println!("  Density:     0b{:04b}", status.density_code());
    println!("  Protection:  {}", if status.is_protected() { "enabled" } else { "disabled" });
    println!("  Page size:   {} bytes", status.page_size());
    println!();
    println!("Manufacturer ID: 0x{:02X}", id.manufacturer);
    println!("Device ID:       0x{:02X} 0x{:02X}", id.device[0], id.device[1]);
    println!("  Family:      0b{:03b}", id.family_code());
    println!("  Density:     0b{:05b}", id.density_code());
    println!("  MLC code:    {}", id.mlc_code());
    println!("  Version:     {}", id.product_version());
    println!("Extended info:   {} byte(s)", id.extended_info_len);
    if len > 0 {
        let hex: Vec<String> = extended[..len].iter().map(|b| format!("{:02X}", b)).collect();
        println!("  {}", hex.join(" "));
    }

    if id.is_at45db161d() {
        println!();
        println!("Found AT45DB161D");
    } else {
        log::warn!("Unexpected identification {}, is an AT45DB161D connected?", id);
    }

    Ok(())
}
