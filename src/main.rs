//! dataflash - AT45DB161D DataFlash tool
//!
//! Drives an Atmel AT45DB161D through the `dataflash-core` command protocol
//! driver. The chip is reached through a programmer:
//! - **dummy** - a byte-level emulator of the chip, for trying commands
//!   without hardware
//! - **linux** - a spidev bus plus GPIO lines for chip-select, reset and
//!   write-protect
//!
//! Every command runs the same driver code regardless of the programmer.

mod cli;
mod commands;
mod programmers;

use clap::Parser;
use cli::{Cli, Commands};
use dataflash_core::DataflashConfig;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logger; RUST_LOG still overrides the verbosity flags
    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Commands::ListProgrammers = cli.command {
        print!("{}", programmers::programmer_help());
        return Ok(());
    }

    let config = DataflashConfig::new()
        .with_poll_mode(cli.poll.into())
        .with_poll_interval_us(cli.poll_interval)
        .with_write_protect_on_init(!cli.unprotect);
    log::debug!("Driver configuration: {:?}", config);

    let result = programmers::run_command(&cli.programmer, config, &cli.command);

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
