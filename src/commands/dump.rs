//! Dump command implementation

use std::fs;
use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};

use dataflash_core::chip::geometry::{PAGE_COUNT, PAGE_SIZE};
use dataflash_core::{ContinuousReadMode, ControlLines, Dataflash, Delay, SpiTransport};

use super::{CmdResult, HostError};

fn create_progress_bar(total: u64) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Pages to dump: `pages` if given, otherwise everything from `start` on
pub fn page_count(start: u16, pages: Option<u16>) -> u16 {
    pages.unwrap_or_else(|| PAGE_COUNT.saturating_sub(start))
}

/// Read `pages` pages starting at `start` with one continuous array read
pub fn run<T, L, D>(flash: &mut Dataflash<T, L, D>, output: &Path, start: u16, pages: u16) -> CmdResult
where
    T: SpiTransport,
    T::Error: HostError,
    L: ControlLines,
    L::Error: HostError,
    D: Delay,
{
    if pages == 0 || start as u32 + pages as u32 > PAGE_COUNT as u32 {
        return Err(format!(
            "Invalid page range {}+{} (chip has {} pages)",
            start, pages, PAGE_COUNT
        )
        .into());
    }

    let total = pages as usize * PAGE_SIZE as usize;
    let mut data = vec![0u8; total];
    println!("Reading {} pages ({} bytes) from page {}...", pages, total, start);

    let pb = create_progress_bar(total as u64)?;
    let mut stream = flash.continuous_read(start, 0, ContinuousReadMode::High)?;
    for chunk in data.chunks_mut(PAGE_SIZE as usize) {
        stream.read(chunk)?;
        pb.inc(chunk.len() as u64);
    }
    stream.finish()?;
    pb.finish_with_message("done");

    fs::write(output, &data)?;
    println!("Wrote {} bytes to {}", data.len(), output.display());

    Ok(())
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use dataflash_dummy::DummyDataflash;

    #[test]
    fn test_dump_spans_pages() {
        let chip = DummyDataflash::new_default();
        chip.set_page(3, &[0x33; 528]);
        chip.set_page(4, &[0x44; 528]);
        let mut flash = chip.device(Default::default());
        flash.init().unwrap();

        let path = std::env::temp_dir().join(format!("dataflash-dump-{}.bin", std::process::id()));
        run(&mut flash, &path, 3, 2).unwrap();
        let data = fs::read(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(data.len(), 2 * 528);
        assert!(data[..528].iter().all(|&b| b == 0x33));
        assert!(data[528..].iter().all(|&b| b == 0x44));
        assert!(!chip.is_selected());
    }

    #[test]
    fn test_default_page_count_reaches_last_page() {
        assert_eq!(page_count(0, None), 4096);
        assert_eq!(page_count(10, None), 4086);
        assert_eq!(page_count(10, Some(3)), 3);

        let chip = DummyDataflash::new_default();
        chip.set_page(4095, &[0x77; 528]);
        let mut flash = chip.device(Default::default());
        flash.init().unwrap();

        let path = std::env::temp_dir().join(format!("dataflash-tail-{}.bin", std::process::id()));
        run(&mut flash, &path, 4094, page_count(4094, None)).unwrap();
        let data = fs::read(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(data.len(), 2 * 528);
        assert!(data[528..].iter().all(|&b| b == 0x77));
    }

    #[test]
    fn test_dump_rejects_range_past_end() {
        let chip = DummyDataflash::new_default();
        let mut flash = chip.device(Default::default());
        let path = std::env::temp_dir().join("dataflash-dump-unused.bin");
        assert!(run(&mut flash, &path, 4090, 10).is_err());
        assert!(run(&mut flash, &path, 0, 0).is_err());
    }
}
