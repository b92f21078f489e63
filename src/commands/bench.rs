//! Throughput benchmark

use std::time::{Duration, Instant};

use dataflash_core::chip::geometry::{PAGE_COUNT, PAGE_SIZE};
use dataflash_core::{
    Buffer, ContinuousReadMode, ControlLines, Dataflash, Delay, ReadSpeed, SpiTransport,
};

use super::{CmdResult, HostError};

/// Outcome of one benchmark phase
#[derive(Debug, Clone, Copy)]
struct Phase {
    name: &'static str,
    elapsed: Duration,
    bytes: usize,
    errors: Option<usize>,
}

impl Phase {
    fn bytes_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.bytes as f64 / secs
        } else {
            0.0
        }
    }

    fn report(&self, index: usize) {
        println!("Benchmark {} - {}:", index, self.name);
        println!("    Time: {} uS.", self.elapsed.as_micros());
        println!("    Bytes: {} bytes.", self.bytes);
        if let Some(errors) = self.errors {
            println!("    Errors: {} errors.", errors);
        }
        println!("    Speed: {:.2} Bps.", self.bytes_per_sec());
        println!();
    }
}

/// Byte pattern: a counter running across all pages of the test
fn pattern(pages: u16) -> Vec<u8> {
    (0..pages as usize * PAGE_SIZE as usize)
        .map(|i| i as u8)
        .collect()
}

fn count_errors(expected: &[u8], actual: &[u8]) -> usize {
    expected.iter().zip(actual).filter(|(a, b)| a != b).count()
}

/// Write `pages` pages through `buffer`, then read them back via the
/// buffer, via main memory page read and via continuous array read
pub fn run<T, L, D>(flash: &mut Dataflash<T, L, D>, start: u16, pages: u16, buffer: Buffer) -> CmdResult
where
    T: SpiTransport,
    T::Error: HostError,
    L: ControlLines,
    L::Error: HostError,
    D: Delay,
{
    if pages == 0 || start as u32 + pages as u32 > PAGE_COUNT as u32 {
        return Err(format!("Invalid page range {}+{}", start, pages).into());
    }

    let page_size = PAGE_SIZE as usize;
    let expected = pattern(pages);
    let total = expected.len();
    let mut data = vec![0u8; total];
    let mut phases = Vec::with_capacity(4);

    println!("Benchmark running on pages {}-{}", start, start + pages - 1);

    println!("    Performing Write via Buffer Test.");
    let t = Instant::now();
    for (page, chunk) in (start..).zip(expected.chunks(page_size)) {
        flash.write_buffer(buffer, 0, chunk)?;
        flash.buffer_to_page(buffer, page, true)?;
    }
    phases.push(Phase {
        name: "Write via Buffer",
        elapsed: t.elapsed(),
        bytes: total,
        errors: None,
    });

    println!("    Performing Read via Buffer Test.");
    let t = Instant::now();
    for (page, chunk) in (start..).zip(data.chunks_mut(page_size)) {
        flash.page_to_buffer(page, buffer)?;
        flash.read_buffer(buffer, 0, chunk, ReadSpeed::High)?;
    }
    phases.push(Phase {
        name: "Read via Buffer",
        elapsed: t.elapsed(),
        bytes: total,
        errors: Some(count_errors(&expected, &data)),
    });

    println!("    Performing Read via Main Page Test.");
    data.fill(0);
    let t = Instant::now();
    for (page, chunk) in (start..).zip(data.chunks_mut(page_size)) {
        flash.read_page(page, 0, chunk)?;
    }
    phases.push(Phase {
        name: "Read via Memory Page",
        elapsed: t.elapsed(),
        bytes: total,
        errors: Some(count_errors(&expected, &data)),
    });

    println!("    Performing Read via Continuous Array Test.");
    data.fill(0);
    let t = Instant::now();
    flash.read_continuous(start, 0, &mut data, ContinuousReadMode::High)?;
    phases.push(Phase {
        name: "Read via Continuous Array",
        elapsed: t.elapsed(),
        bytes: total,
        errors: Some(count_errors(&expected, &data)),
    });

    println!("    Done.");
    println!();

    for (i, phase) in phases.iter().enumerate() {
        phase.report(i + 1);
    }

    let errors: usize = phases.iter().filter_map(|p| p.errors).sum();
    if errors > 0 {
        return Err(format!("{} read errors", errors).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_wraps() {
        let p = pattern(1);
        assert_eq!(p.len(), 528);
        assert_eq!(p[255], 255);
        assert_eq!(p[256], 0);
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_bench_on_dummy() {
        let chip = dataflash_dummy::DummyDataflash::new_default();
        let mut flash = chip.device(Default::default());
        flash.init().unwrap();

        run(&mut flash, 100, 3, Buffer::Two).unwrap();

        let expected = pattern(3);
        assert_eq!(chip.page(101), &expected[528..1056]);
        assert_eq!(chip.violations(), 0);
    }
}
