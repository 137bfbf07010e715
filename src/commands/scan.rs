//! Scan command implementation.
//!
//! Runs one discovery + load pass and reports the resulting pool.

use chrono::Utc;
use herakles_vmamap::{ProcessCollection, ScanStats};
use serde::Serialize;
use std::time::Instant;

use crate::cli::OutputFormat;
use crate::commands::show::render_process;
use crate::config::Config;

/// Serializable scan report.
#[derive(Serialize)]
struct ScanReport<'a> {
    generated_at: String,
    proc_root: String,
    duration_ms: f64,
    stats: &'a ScanStats,
    processes: &'a ProcessCollection,
}

/// Loads every process and prints the pool.
pub fn command_scan(
    verbose: bool,
    format: OutputFormat,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let opts = config.load_options();

    let start = Instant::now();
    let pool = ProcessCollection::load(&opts)?;
    let duration = start.elapsed();

    if format != OutputFormat::Text {
        let report = ScanReport {
            generated_at: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            proc_root: opts.proc_root.display().to_string(),
            duration_ms: duration.as_secs_f64() * 1000.0,
            stats: pool.stats(),
            processes: &pool,
        };
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            _ => print!("{}", serde_yaml::to_string(&report)?),
        }
        return Ok(());
    }

    println!("🔎 Herakles VMA Map - Scan");
    println!("=========================");
    println!("   📁 Process directory: {}", opts.proc_root.display());

    println!();
    println!("{:>8} {:>6} {:>6}  CMDLINE", "PID", "VMAS", "FILES");
    for process in &pool {
        println!(
            "{:>8} {:>6} {:>6}  {}",
            process.pid(),
            process.vmas().len(),
            process.mapped_files().len(),
            process.cmdline()
        );
        if verbose {
            print!("{}", render_process(process));
        }
    }

    let stats = pool.stats();
    println!();
    println!("   ⏱️  Scan duration: {:.2}ms", duration.as_secs_f64() * 1000.0);
    println!("   📊 Loaded: {} of {} processes", stats.admitted, stats.discovered);
    println!("   🧩 VMAs: {}", stats.parsed_vmas);
    println!("   ⚠️  Malformed lines: {}", stats.malformed_lines);
    println!("   🚫 Unreadable: {}", stats.unreadable);
    if stats.filtered > 0 {
        println!("   🔕 Filtered: {}", stats.filtered);
    }

    Ok(())
}
