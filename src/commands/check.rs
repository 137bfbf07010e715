//! Check command implementation.
//!
//! Validates system requirements and configuration.

use herakles_vmamap::process::collect_proc_entries;
use herakles_vmamap::{LoadOptions, LoadReport, ProcError, Process};

use crate::config::{validate_effective_config, Config};

/// Entries tried when looking for a readable mapping table.
const MAPS_CHECK_LIMIT: usize = 32;

/// Loads discovered processes until one mapping table reads. Returns its pid
/// and line counts, or `None` when every tried table is unreadable.
pub(crate) fn first_readable_maps(
    opts: &LoadOptions,
    limit: usize,
) -> Result<Option<(u32, LoadReport)>, ProcError> {
    for entry in collect_proc_entries(&opts.proc_root, Some(limit))? {
        let mut process = Process::new(entry.pid);
        match process.load(opts) {
            Ok(report) => return Ok(Some((entry.pid, report))),
            Err(e) if e.is_recoverable() => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(None)
}

/// Validates system requirements and configuration.
pub fn command_check(
    maps: bool,
    proc: bool,
    all: bool,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Herakles VMA Map - System Check");
    println!("==================================");

    let opts = config.load_options();
    let mut all_ok = true;

    // Check process directory
    if proc || all {
        println!("\n📁 Checking {} ...", opts.proc_root.display());
        match collect_proc_entries(&opts.proc_root, Some(5)) {
            Ok(entries) if entries.is_empty() => {
                println!("   ❌ No process entries found");
                all_ok = false;
            }
            Ok(entries) => {
                println!("   ✅ Can read {} process entries", entries.len());
            }
            Err(e) => {
                println!("   ❌ {}", e);
                all_ok = false;
            }
        }
    }

    // Check mapping table accessibility
    if maps || all {
        println!("\n💾 Checking mapping table accessibility...");
        match first_readable_maps(&opts, MAPS_CHECK_LIMIT) {
            Ok(Some((pid, report))) => {
                println!(
                    "   ✅ Parsed mapping table of PID {}: {} vmas, {} malformed lines",
                    pid, report.parsed, report.dropped
                );
                if report.dropped > 0 {
                    println!("   ⚠️  Malformed lines found - check path_locator / path_column");
                }
            }
            Ok(None) => {
                println!("   ❌ No readable mapping table among discovered processes");
                all_ok = false;
            }
            Err(e) => {
                println!("   ❌ Mapping check failed: {}", e);
                all_ok = false;
            }
        }

        let mut init = Process::new(1);
        match init.load(&opts) {
            Ok(_) => println!("   ✅ PID 1 mapping table readable"),
            Err(e) => println!("   ⚠️  PID 1 mapping table not readable: {}", e),
        }
    }

    // Check configuration
    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => {
            println!("   ✅ Configuration is valid");
        }
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - system is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review warnings");
        std::process::exit(1);
    }
}
