//! Programmer registration and dispatch
//!
//! A programmer binds the driver's host capabilities (byte transfer, control
//! lines, delay) to something real. Each one is feature-gated.

use dataflash_core::DataflashConfig;

use crate::cli::Commands;
use crate::commands;

/// Information about a programmer
pub struct ProgrammerInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Get information about all available programmers (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_programmers() -> Vec<ProgrammerInfo> {
    let mut programmers = Vec::new();

    #[cfg(feature = "dummy")]
    programmers.push(ProgrammerInfo {
        name: "dummy",
        aliases: &["emulator"],
        description: "In-memory AT45DB161D emulator (busy=<polls>)",
    });

    #[cfg(feature = "linux")]
    programmers.push(ProgrammerInfo {
        name: "linux",
        aliases: &["linux_spi", "spidev"],
        description: "Linux spidev + GPIO lines (spidev=/dev/spidevX.Y,cs=<n>[,reset=<n>,wp=<n>,gpiochip=<n>,spispeed=<kHz>,mode=<0|3>])",
    });

    programmers
}

/// Generate help text listing all available programmers
pub fn programmer_help() -> String {
    let programmers = available_programmers();

    if programmers.is_empty() {
        return "No programmers available (recompile with programmer features enabled)".to_string();
    }

    let mut help = String::from("Available programmers:\n");
    for p in &programmers {
        help.push_str(&format!("  {:8} - {}\n", p.name, p.description));
        if !p.aliases.is_empty() {
            help.push_str(&format!("  {:8}   aliases: {}\n", "", p.aliases.join(", ")));
        }
    }
    help
}

/// Generate a short list of programmer names for CLI help
pub fn programmer_names_short() -> String {
    let programmers = available_programmers();
    let names: Vec<&str> = programmers.iter().map(|p| p.name).collect();
    names.join(", ")
}

/// Resolve a programmer name or alias to its primary name
pub fn find_programmer(name: &str) -> Option<&'static str> {
    available_programmers()
        .into_iter()
        .find(|p| p.name == name || p.aliases.iter().any(|a| *a == name))
        .map(|p| p.name)
}

/// Open the programmer and run `command` on the chip behind it
///
/// The programmer string can be just the name (e.g., "dummy") or include
/// parameters (e.g., "linux:spidev=/dev/spidev0.0,cs=8").
#[allow(unused_variables)]
pub fn run_command(
    programmer: &str,
    config: DataflashConfig,
    command: &Commands,
) -> Result<(), Box<dyn std::error::Error>> {
    let (name, options) = parse_programmer_string(programmer);

    let canonical_name = match find_programmer(name) {
        Some(n) => n,
        None => return Err(unknown_programmer_error(name)),
    };

    match canonical_name {
        #[cfg(feature = "dummy")]
        "dummy" => {
            use dataflash_dummy::{DummyConfig, DummyDataflash};

            let dummy_config = DummyConfig::from_options(&options)
                .map_err(|e| format!("Invalid dummy parameters: {}", e))?;
            let chip = DummyDataflash::new(dummy_config);
            let mut flash = chip.device(config);

            let result = commands::run(&mut flash, command);
            if chip.violations() > 0 {
                log::warn!(
                    "dummy: {} command(s) were issued while the chip was busy",
                    chip.violations()
                );
            }
            result
        }

        #[cfg(feature = "linux")]
        "linux" => {
            use dataflash_linux::parse_options;

            log::info!("Opening Linux spidev programmer...");

            let host = parse_options(&options)
                .map_err(|e| format!("Invalid linux parameters: {}", e))?;

            let mut flash = dataflash_linux::open(&host, config).map_err(|e| {
                format!(
                    "Failed to open Linux devices: {}\n\
                     Make sure the spidev and gpiochip devices exist and you have read/write permissions.",
                    e
                )
            })?;

            commands::run(&mut flash, command)
        }

        _ => Err(unknown_programmer_error(name)),
    }
}

/// Parse a programmer string into name and options
///
/// Format: "name" or "name:option1=value1,option2=value2"
pub fn parse_programmer_string(s: &str) -> (&str, Vec<(&str, &str)>) {
    if let Some((name, opts)) = s.split_once(':') {
        let options: Vec<_> = opts
            .split(',')
            .filter_map(|opt| opt.split_once('='))
            .collect();
        (name, options)
    } else {
        (s, Vec::new())
    }
}

fn unknown_programmer_error(name: &str) -> Box<dyn std::error::Error> {
    let mut msg = format!("Unknown programmer: {}\n\n", name);
    msg.push_str(&programmer_help());
    msg.push_str("\nUse 'dataflash list-programmers' for more details");
    msg.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_programmer_string() {
        assert_eq!(parse_programmer_string("dummy"), ("dummy", vec![]));
        assert_eq!(
            parse_programmer_string("linux:spidev=/dev/spidev0.0,cs=8"),
            ("linux", vec![("spidev", "/dev/spidev0.0"), ("cs", "8")])
        );
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_find_programmer_alias() {
        assert_eq!(find_programmer("emulator"), Some("dummy"));
        assert_eq!(find_programmer("nonexistent"), None);
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_run_on_dummy() {
        run_command("dummy:busy=4", DataflashConfig::default(), &Commands::Info).unwrap();
        assert!(run_command("nope", DataflashConfig::default(), &Commands::Info).is_err());
    }
}
