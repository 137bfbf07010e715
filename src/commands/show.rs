//! Show command implementation.
//!
//! Prints the VMA table of a single process.

use herakles_vmamap::{LoadOptions, ProcError, Process, Vma};
use tracing::debug;

use crate::cli::OutputFormat;
use crate::config::Config;

/// Formats a byte count for table output.
pub(crate) fn format_bytes(bytes: u64) -> String {
    if bytes >= 1024 * 1024 * 1024 {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    } else if bytes >= 1024 * 1024 {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}

/// One table row: range, permissions, offset, size and backing.
pub(crate) fn format_vma_row(vma: &Vma) -> String {
    format!(
        "{:016x}-{:016x} {:<4} {:08x} {:>10}  {}",
        vma.start(),
        vma.end(),
        vma.permissions(),
        vma.offset(),
        format_bytes(vma.vm_size()),
        vma.backing()
    )
}

/// Renders a process header and its VMA rows.
pub(crate) fn render_process(process: &Process) -> String {
    let mut out = format!(
        "PID {} ({}) - {} vmas\n",
        process.pid(),
        process.cmdline(),
        process.vmas().len()
    );
    for vma in process.vmas() {
        out.push_str("   ");
        out.push_str(&format_vma_row(vma));
        out.push('\n');
    }
    out
}

/// Loads a single process, bypassing discovery and the pool filters.
/// An unreadable mapping table yields `None`.
pub(crate) fn load_process(pid: u32, opts: &LoadOptions) -> Result<Option<Process>, ProcError> {
    let mut process = Process::new(pid);
    match process.load(opts) {
        Ok(_) => Ok(Some(process)),
        Err(e) if e.is_recoverable() => {
            debug!("pid {} not loadable: {}", pid, e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Shows the VMA table of one process.
pub fn command_show(
    pid: u32,
    format: OutputFormat,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let process = match load_process(pid, &config.load_options())? {
        Some(p) => p,
        None => {
            eprintln!("❌ PID {} not found or its mapping table is unreadable", pid);
            std::process::exit(1);
        }
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&process)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&process)?),
        OutputFormat::Text => print!("{}", render_process(&process)),
    }

    Ok(())
}
