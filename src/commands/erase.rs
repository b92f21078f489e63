//! Erase command implementation

use dataflash_core::chip::geometry::{self, PAGES_PER_BLOCK};
use dataflash_core::{ControlLines, Dataflash, Delay, SpiTransport};

use super::{CmdResult, HostError};
use crate::cli::EraseCommands;

/// Run one erase subcommand
pub fn run<T, L, D>(flash: &mut Dataflash<T, L, D>, cmd: &EraseCommands) -> CmdResult
where
    T: SpiTransport,
    T::Error: HostError,
    L: ControlLines,
    L::Error: HostError,
    D: Delay,
{
    match *cmd {
        EraseCommands::Page { page } => {
            flash.page_erase(page)?;
            println!("Erased page {}", page);
        }
        EraseCommands::Block { block } => {
            flash.block_erase(block)?;
            let first = block * PAGES_PER_BLOCK;
            println!(
                "Erased block {} (pages {}-{})",
                block,
                first,
                first + PAGES_PER_BLOCK - 1
            );
        }
        EraseCommands::Sector { sector } => {
            flash.sector_erase(sector)?;
            let name = match sector {
                0x0A => "0a".to_string(),
                0x0B => "0b".to_string(),
                n => n.to_string(),
            };
            match geometry::sector_pages(sector) {
                Some(pages) => println!(
                    "Erased sector {} (pages {}-{})",
                    name,
                    pages.start,
                    pages.end - 1
                ),
                None => println!("Erased sector {}", name),
            }
        }
        EraseCommands::Chip { yes } => {
            if !yes {
                return Err("Chip erase wipes the whole array. Pass --yes to confirm".into());
            }
            flash.config_mut().allow_chip_erase = true;
            log::info!("Erasing the whole chip, this takes a while...");
            flash.chip_erase()?;
            println!("Chip erased");
        }
    }

    Ok(())
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use dataflash_dummy::DummyDataflash;

    #[test]
    fn test_erase_block() {
        let chip = DummyDataflash::new_default();
        for page in 15..=24 {
            chip.set_page(page, &[0u8; 528]);
        }
        let mut flash = chip.device(Default::default());
        flash.init().unwrap();

        run(&mut flash, &EraseCommands::Block { block: 2 }).unwrap();

        assert!(chip.page(15).iter().all(|&b| b == 0));
        assert!((16..24).all(|p| chip.page(p).iter().all(|&b| b == 0xFF)));
        assert!(chip.page(24).iter().all(|&b| b == 0));
    }

    #[test]
    fn test_chip_erase_needs_confirmation() {
        let chip = DummyDataflash::new_default();
        chip.set_page(100, &[0u8; 16]);
        let mut flash = chip.device(Default::default());
        flash.init().unwrap();

        assert!(run(&mut flash, &EraseCommands::Chip { yes: false }).is_err());
        assert_eq!(chip.page(100)[0], 0);

        run(&mut flash, &EraseCommands::Chip { yes: true }).unwrap();
        assert!(chip.is_blank());
    }
}
