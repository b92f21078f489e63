//! CLI argument parsing

use crate::programmers;
use clap::{Parser, Subcommand, ValueEnum};
use dataflash_core::chip::geometry::{BLOCK_COUNT, PAGE_COUNT, PAGE_SIZE, SECTOR_COUNT};
use dataflash_core::spi::address::{SECTOR_0A, SECTOR_0B};
use dataflash_core::PollMode;
use std::path::PathBuf;

/// Parse a string as a hex or decimal u16
fn parse_hex_u16(s: &str) -> Result<u16, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u16>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Parse a page index (0-4095)
fn parse_page(s: &str) -> Result<u16, String> {
    let page = parse_hex_u16(s)?;
    if page >= PAGE_COUNT {
        return Err(format!("Page {} out of range (0-{})", page, PAGE_COUNT - 1));
    }
    Ok(page)
}

/// Parse a byte offset inside a page (0-527)
fn parse_offset(s: &str) -> Result<u16, String> {
    let offset = parse_hex_u16(s)?;
    if offset >= PAGE_SIZE {
        return Err(format!("Offset {} out of range (0-{})", offset, PAGE_SIZE - 1));
    }
    Ok(offset)
}

/// Parse a block index (0-511)
fn parse_block(s: &str) -> Result<u16, String> {
    let block = parse_hex_u16(s)?;
    if block >= BLOCK_COUNT {
        return Err(format!("Block {} out of range (0-{})", block, BLOCK_COUNT - 1));
    }
    Ok(block)
}

/// Parse a sector id: "0a", "0b" or 1-15
fn parse_sector(s: &str) -> Result<u8, String> {
    match s.to_ascii_lowercase().as_str() {
        "0a" => Ok(SECTOR_0A),
        "0b" => Ok(SECTOR_0B),
        other => match other.parse::<u8>() {
            Ok(n @ (SECTOR_0A | SECTOR_0B)) => Err(format!(
                "Sector {} shares its id with sector 0{}; erase its blocks instead",
                n,
                if n == SECTOR_0A { 'a' } else { 'b' }
            )),
            Ok(n) if (1..SECTOR_COUNT).contains(&n) => Ok(n),
            _ => Err(format!("Invalid sector '{}' (expected 0a, 0b or 1-15)", s)),
        },
    }
}

/// Parse a buffer number (1 or 2)
fn parse_buffer(s: &str) -> Result<dataflash_core::Buffer, String> {
    s.parse::<u8>()
        .ok()
        .and_then(dataflash_core::Buffer::from_number)
        .ok_or_else(|| format!("Invalid buffer '{}' (expected 1 or 2)", s))
}

/// Generate dynamic help text for the programmer argument
fn programmer_help() -> String {
    format!(
        "Programmer to use [available: {}]",
        programmers::programmer_names_short()
    )
}

/// Status polling strategy
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PollArg {
    /// One status read transaction per poll
    Reissue,
    /// One status read, re-clocked until ready
    Continuous,
}

impl From<PollArg> for PollMode {
    fn from(arg: PollArg) -> Self {
        match arg {
            PollArg::Reissue => PollMode::Reissue,
            PollArg::Continuous => PollMode::Continuous,
        }
    }
}

#[derive(Parser)]
#[command(name = "dataflash")]
#[command(author, version, about = "AT45DB161D DataFlash tool", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Programmer to use
    #[arg(short, long, global = true, default_value = "dummy", help = programmer_help())]
    pub programmer: String,

    /// Status polling strategy
    #[arg(long, global = true, value_enum, default_value = "reissue")]
    pub poll: PollArg,

    /// Delay between status polls in microseconds
    #[arg(long, global = true, default_value = "0")]
    pub poll_interval: u32,

    /// Leave the write-protect line released after initialization
    #[arg(long, global = true)]
    pub unprotect: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show status register and identification
    Info,

    /// Read (part of) a main memory page
    ReadPage {
        /// Page index (0-4095)
        #[arg(value_parser = parse_page)]
        page: u16,

        /// Start offset inside the page
        #[arg(long, default_value = "0", value_parser = parse_offset)]
        offset: u16,

        /// Number of bytes (reads wrap at the end of the page)
        #[arg(short, long, default_value = "528")]
        length: usize,

        /// Load the page into a buffer and read the buffer instead
        #[arg(long, value_parser = parse_buffer)]
        via_buffer: Option<dataflash_core::Buffer>,

        /// Output file (hex dump on stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write data into a main memory page through a buffer
    WritePage {
        /// Page index (0-4095)
        #[arg(value_parser = parse_page)]
        page: u16,

        /// Start offset inside the page
        #[arg(long, default_value = "0", value_parser = parse_offset)]
        offset: u16,

        /// Input file
        #[arg(short, long, conflicts_with = "data")]
        input: Option<PathBuf>,

        /// Literal data to write
        #[arg(short, long)]
        data: Option<String>,

        /// Buffer to stage the data in
        #[arg(long, default_value = "1", value_parser = parse_buffer)]
        buffer: dataflash_core::Buffer,

        /// Program without the built-in erase (page must be erased)
        #[arg(long, conflicts_with = "through_buffer")]
        no_erase: bool,

        /// Use the single main memory page program through buffer command
        #[arg(long)]
        through_buffer: bool,

        /// Compare the page with the buffer afterwards
        #[arg(long)]
        verify: bool,
    },

    /// Erase part or all of the array
    #[command(subcommand)]
    Erase(EraseCommands),

    /// Read the array with a continuous read
    Dump {
        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// First page
        #[arg(long, default_value = "0", value_parser = parse_page)]
        start: u16,

        /// Number of pages (default: up to the last page)
        #[arg(long)]
        pages: Option<u16>,
    },

    /// Compare a main memory page with a buffer
    Compare {
        /// Page index (0-4095)
        #[arg(value_parser = parse_page)]
        page: u16,

        /// Buffer to compare with
        #[arg(long, default_value = "1", value_parser = parse_buffer)]
        buffer: dataflash_core::Buffer,
    },

    /// Deep power-down control
    #[command(subcommand)]
    Power(PowerCommands),

    /// Pulse the reset line
    Reset,

    /// Write numbered message pages, then read them back alternately
    /// through a buffer and directly
    PageTest {
        /// Number of pages to write
        #[arg(long, default_value = "8", value_parser = clap::value_parser!(u16).range(1..=46))]
        pages: u16,
    },

    /// Measure write and read throughput
    Bench {
        /// First page
        #[arg(long, default_value = "0", value_parser = parse_page)]
        start: u16,

        /// Number of pages
        #[arg(long, default_value = "16")]
        pages: u16,

        /// Buffer to use
        #[arg(long, default_value = "1", value_parser = parse_buffer)]
        buffer: dataflash_core::Buffer,
    },

    /// List supported programmers
    ListProgrammers,
}

/// Erase subcommands
#[derive(Subcommand)]
pub enum EraseCommands {
    /// Erase one page
    Page {
        /// Page index (0-4095)
        #[arg(value_parser = parse_page)]
        page: u16,
    },

    /// Erase a block of 8 pages
    Block {
        /// Block index (0-511)
        #[arg(value_parser = parse_block)]
        block: u16,
    },

    /// Erase a sector (0a, 0b, 1-15)
    Sector {
        /// Sector id
        #[arg(value_parser = parse_sector)]
        sector: u8,
    },

    /// Erase the whole array
    Chip {
        /// Confirm the erase
        #[arg(long)]
        yes: bool,
    },
}

/// Deep power-down subcommands
#[derive(Subcommand)]
pub enum PowerCommands {
    /// Enter deep power-down
    Down,
    /// Resume from deep power-down
    Resume,
}
