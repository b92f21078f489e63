//! CLI command implementations
//!
//! Every command works on a [`Dataflash`] handle bound to any host, so the
//! dummy emulator and the Linux backend run the same code.

mod bench;
mod dump;
mod erase;
mod info;
mod page;
mod power;
mod test;

use std::fmt::Debug;

use dataflash_core::{ControlLines, Dataflash, Delay, SpiTransport};

use crate::cli::Commands;

/// Result type shared by all commands
pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Host error types the CLI can report
pub trait HostError: Debug + 'static {}

impl<E: Debug + 'static> HostError for E {}

/// Initialize the control lines, run one command and release chip-select
pub fn run<T, L, D>(flash: &mut Dataflash<T, L, D>, command: &Commands) -> CmdResult
where
    T: SpiTransport,
    T::Error: HostError,
    L: ControlLines,
    L::Error: HostError,
    D: Delay,
{
    flash.init()?;

    let result = match command {
        Commands::Info => info::run(flash),
        Commands::ReadPage {
            page,
            offset,
            length,
            via_buffer,
            output,
        } => page::run_read(flash, *page, *offset, *length, *via_buffer, output.as_deref()),
        Commands::WritePage {
            page,
            offset,
            input,
            data,
            buffer,
            no_erase,
            through_buffer,
            verify,
        } => {
            let payload = page::load_payload(input.as_deref(), data.as_deref())?;
            page::run_write(
                flash,
                page::WriteArgs {
                    page: *page,
                    offset: *offset,
                    buffer: *buffer,
                    erase: !no_erase,
                    through_buffer: *through_buffer,
                    verify: *verify,
                },
                &payload,
            )
        }
        Commands::Erase(cmd) => erase::run(flash, cmd),
        Commands::Dump {
            output,
            start,
            pages,
        } => dump::run(flash, output, *start, dump::page_count(*start, *pages)),
        Commands::Compare { page, buffer } => page::run_compare(flash, *page, *buffer),
        Commands::Power(cmd) => power::run(flash, cmd),
        Commands::Reset => power::run_reset(flash),
        Commands::PageTest { pages } => test::run(flash, *pages),
        Commands::Bench {
            start,
            pages,
            buffer,
        } => bench::run(flash, *start, *pages, *buffer),
        Commands::ListProgrammers => Ok(()),
    };

    flash.end()?;
    result
}

/// Print `data` as a hex dump with addresses starting at `base`
pub fn hexdump(base: usize, data: &[u8]) {
    for (i, chunk) in data.chunks(16).enumerate() {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
        let ascii: String = chunk
            .iter()
            .map(|&b| {
                if b.is_ascii_graphic() || b == b' ' {
                    b as char
                } else {
                    '.'
                }
            })
            .collect();
        println!("{:06x}  {:<47}  |{}|", base + i * 16, hex.join(" "), ascii);
    }
}
