//! Page test: message pages written through buffer 1 and read back two ways

use dataflash_core::chip::geometry::PAGE_SIZE;
use dataflash_core::{Buffer, ControlLines, Dataflash, Delay, ReadSpeed, SpiTransport, Stream};

use super::{CmdResult, HostError};

const MESSAGE: &[u8] = b"@ write test ";
const DIGITS: &[u8] = b"0123456789 ";

/// Text written to `page`: the message, `page + 1` digit groups and a newline
fn page_text(page: u16) -> Vec<u8> {
    let mut text = MESSAGE.to_vec();
    for _ in 0..=page {
        text.extend_from_slice(DIGITS);
    }
    text.push(b'\n');
    text
}

/// Read bytes from an armed stream until the terminating NUL
///
/// Stops after one page worth of bytes if no terminator shows up.
fn read_text<T, L, D>(
    mut stream: Stream<'_, T, L, D>,
) -> Result<Vec<u8>, Box<dyn std::error::Error>>
where
    T: SpiTransport,
    T::Error: HostError,
    L: ControlLines,
    L::Error: HostError,
    D: Delay,
{
    let mut text = Vec::new();
    for _ in 0..PAGE_SIZE {
        match stream.transfer(0xFF)? {
            0 => break,
            byte => text.push(byte),
        }
    }
    stream.finish()?;
    Ok(text)
}

/// Write `pages` message pages, then read them back alternately with
/// page to buffer plus buffer read (odd pages) and page read (even pages)
pub fn run<T, L, D>(flash: &mut Dataflash<T, L, D>, pages: u16) -> CmdResult
where
    T: SpiTransport,
    T::Error: HostError,
    L: ControlLines,
    L::Error: HostError,
    D: Delay,
{
    for page in 0..pages {
        let mut stream = flash.buffer_write(Buffer::One, 0)?;
        stream.write(&page_text(page))?;
        stream.write(&[0])?;
        stream.finish()?;
        flash.buffer_to_page(Buffer::One, page, true)?;
    }
    println!("Wrote {} pages", pages);

    let mut failures = 0;
    for page in 0..pages {
        let text = if page & 1 == 1 {
            println!("Page to buffer");
            flash.page_to_buffer(page, Buffer::One)?;
            read_text(flash.buffer_read(Buffer::One, 0, ReadSpeed::High)?)?
        } else {
            println!("Page read");
            read_text(flash.page_read(page, 0)?)?
        };
        print!("{}", String::from_utf8_lossy(&text));

        if text != page_text(page) {
            log::error!("Page {} does not match what was written", page);
            failures += 1;
        }
    }

    if failures > 0 {
        return Err(format!("{} of {} pages failed", failures, pages).into());
    }
    println!("All {} pages match", pages);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_text_fits_every_page() {
        assert_eq!(page_text(0), b"@ write test 0123456789 \n");
        // Longest message plus its NUL terminator fills at most one page
        assert!(page_text(45).len() < PAGE_SIZE as usize);
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_page_test_on_dummy() {
        let chip = dataflash_dummy::DummyDataflash::new_default();
        let mut flash = chip.device(Default::default());
        flash.init().unwrap();

        run(&mut flash, 8).unwrap();

        assert_eq!(&chip.page(2)[..page_text(2).len()], page_text(2).as_slice());
        assert_eq!(chip.violations(), 0);
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_read_text_sees_corruption() {
        let chip = dataflash_dummy::DummyDataflash::new_default();
        let mut flash = chip.device(Default::default());
        flash.init().unwrap();

        run(&mut flash, 2).unwrap();
        chip.set_page(0, b"@ broken");
        let text = read_text(flash.page_read(0, 0).unwrap()).unwrap();
        assert!(text.starts_with(b"@ broken"));
        assert_ne!(text, page_text(0));
    }
}
