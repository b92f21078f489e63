//! Page read, write and compare commands

use std::fs;
use std::path::Path;

use dataflash_core::chip::geometry::PAGE_SIZE;
use dataflash_core::{Buffer, ControlLines, Dataflash, Delay, ReadSpeed, SpiTransport};

use super::{hexdump, CmdResult, HostError};

/// Options of the write-page command
#[derive(Debug, Clone, Copy)]
pub struct WriteArgs {
    pub page: u16,
    pub offset: u16,
    pub buffer: Buffer,
    pub erase: bool,
    pub through_buffer: bool,
    pub verify: bool,
}

/// Load the data to write from a file or a literal string
pub fn load_payload(input: Option<&Path>, data: Option<&str>) -> Result<Vec<u8>, String> {
    match (input, data) {
        (Some(path), _) => fs::read(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e)),
        (None, Some(text)) => Ok(text.as_bytes().to_vec()),
        (None, None) => Err("Nothing to write. Use --input or --data".to_string()),
    }
}

/// Check that `len` bytes fit between `offset` and the end of a page
fn check_fits(offset: u16, len: usize) -> Result<(), String> {
    let room = (PAGE_SIZE - offset) as usize;
    if len > room {
        return Err(format!(
            "{} bytes do not fit at offset {} ({} bytes left in the page)",
            len, offset, room
        ));
    }
    Ok(())
}

/// Whether `len` bytes at `offset` replace the whole page
fn covers_page(offset: u16, len: usize) -> bool {
    offset == 0 && len == PAGE_SIZE as usize
}

/// Read `length` bytes of a page, directly or through a buffer
pub fn run_read<T, L, D>(
    flash: &mut Dataflash<T, L, D>,
    page: u16,
    offset: u16,
    length: usize,
    via_buffer: Option<Buffer>,
    output: Option<&Path>,
) -> CmdResult
where
    T: SpiTransport,
    T::Error: HostError,
    L: ControlLines,
    L::Error: HostError,
    D: Delay,
{
    let mut data = vec![0u8; length];

    match via_buffer {
        Some(buffer) => {
            log::info!("Loading page {} into {}", page, buffer);
            flash.page_to_buffer(page, buffer)?;
            flash.read_buffer(buffer, offset, &mut data, ReadSpeed::High)?;
        }
        None => flash.read_page(page, offset, &mut data)?,
    }

    match output {
        Some(path) => {
            fs::write(path, &data)?;
            println!("Read {} bytes from page {} to {}", data.len(), page, path.display());
        }
        None => hexdump(offset as usize, &data),
    }

    Ok(())
}

/// Write data into a page through an SRAM buffer
pub fn run_write<T, L, D>(flash: &mut Dataflash<T, L, D>, args: WriteArgs, data: &[u8]) -> CmdResult
where
    T: SpiTransport,
    T::Error: HostError,
    L: ControlLines,
    L::Error: HostError,
    D: Delay,
{
    check_fits(args.offset, data.len())?;

    // Keep the bytes of the page outside the written range
    if !covers_page(args.offset, data.len()) {
        log::debug!("Loading page {} into {} before a partial write", args.page, args.buffer);
        flash.page_to_buffer(args.page, args.buffer)?;
    }

    if args.through_buffer {
        flash.write_page_through_buffer(args.page, args.offset, args.buffer, data)?;
    } else {
        flash.write_buffer(args.buffer, args.offset, data)?;
        flash.buffer_to_page(args.buffer, args.page, args.erase)?;
    }
    println!(
        "Wrote {} bytes to page {} at offset {} through {}",
        data.len(),
        args.page,
        args.offset,
        args.buffer
    );

    if args.verify {
        if flash.compare_page_to_buffer(args.page, args.buffer)? {
            println!("Verify: page matches {}", args.buffer);
        } else {
            return Err(format!("Verify failed: page {} differs from {}", args.page, args.buffer).into());
        }
    }

    Ok(())
}

/// Compare a page with a buffer
pub fn run_compare<T, L, D>(flash: &mut Dataflash<T, L, D>, page: u16, buffer: Buffer) -> CmdResult
where
    T: SpiTransport,
    T::Error: HostError,
    L: ControlLines,
    L::Error: HostError,
    D: Delay,
{
    if flash.compare_page_to_buffer(page, buffer)? {
        println!("Page {} matches {}", page, buffer);
        Ok(())
    } else {
        Err(format!("Page {} differs from {}", page, buffer).into())
    }
}
