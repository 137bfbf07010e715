//! Generate testdata command implementation.
//!
//! Writes a synthetic process directory (`<pid>/maps`, `comm`, `cmdline`)
//! that can be scanned with `--proc-root`.

use anyhow::Context;
use chrono::Utc;
use herakles_vmamap::PathLocator;
use rand::Rng;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::Config;

const FIRST_PID: u32 = 1000;
const BASE_ADDRESS: u64 = 0x0804_8000;
const ADDRESS_LIMIT: u64 = 0xffff_f000;
const PAGE_SIZE: u64 = 4096;

const PROCESS_NAMES: &[&str] = &[
    "nginx", "postgres", "sshd", "systemd", "dbus-daemon", "cron", "redis-server", "bash",
];

const SHARED_LIBS: &[&str] = &[
    "/usr/lib/libc.so.6",
    "/usr/lib/ld-linux.so.2",
    "/usr/lib/libm.so.6",
    "/usr/lib/libpthread.so.0",
];

const PERMISSIONS: &[&str] = &["r--p", "r-xp", "rw-p", "---p", "rw-s"];

/// Parameters for one synthetic tree.
#[derive(Debug, Clone, Serialize)]
pub struct TreeLayout {
    pub processes: usize,
    pub vmas: usize,
    pub malformed: usize,
    pub vanished: usize,
    /// Column the path field is padded to.
    pub path_column: usize,
}

/// Metadata written next to the generated process directories.
#[derive(Debug, Serialize)]
struct TreeManifest<'a> {
    generated_at: String,
    layout: &'a TreeLayout,
    pids: Vec<u32>,
    vanished_pids: Vec<u32>,
}

/// Formats one mapping line with the path padded to `path_column`.
pub fn format_maps_line(
    start: u64,
    end: u64,
    perms: &str,
    offset: u64,
    dev: &str,
    inode: u64,
    path: Option<&str>,
    path_column: usize,
) -> String {
    let mut line = format!(
        "{:08x}-{:08x} {} {:08x} {} {}",
        start, end, perms, offset, dev, inode
    );
    if let Some(p) = path {
        let pad = path_column.saturating_sub(line.len()).max(1);
        line.push_str(&" ".repeat(pad));
        line.push_str(p);
    }
    line
}

/// Builds the mapping table of one synthetic process.
fn generate_maps(
    rng: &mut impl Rng,
    name: &str,
    layout: &TreeLayout,
    malformed: usize,
) -> String {
    let binary = format!("/usr/bin/{name}");
    let mut lines = Vec::with_capacity(layout.vmas + malformed);
    let mut address = BASE_ADDRESS;

    for i in 0..layout.vmas {
        let pages: u64 = rng.gen_range(1..64);
        let end = address + pages * PAGE_SIZE;
        if end > ADDRESS_LIMIT {
            break;
        }

        let backing: Option<&str> = match i {
            0 | 1 => Some(binary.as_str()),
            2 => Some("[heap]"),
            _ if i + 2 == layout.vmas => Some("[stack]"),
            _ if i + 1 == layout.vmas => Some("[vdso]"),
            _ => match rng.gen_range(0..3) {
                0 => None,
                _ => Some(SHARED_LIBS[rng.gen_range(0..SHARED_LIBS.len())]),
            },
        };
        let file_backed = backing.is_some_and(|b| b.starts_with('/'));
        let (dev, inode) = if file_backed {
            ("08:01", rng.gen_range(1000..900_000))
        } else {
            ("00:00", 0)
        };
        let offset = if file_backed {
            rng.gen_range(0..16) * PAGE_SIZE
        } else {
            0
        };
        let perms = PERMISSIONS[rng.gen_range(0..PERMISSIONS.len())];

        lines.push(format_maps_line(
            address,
            end,
            perms,
            offset,
            dev,
            inode,
            backing,
            layout.path_column,
        ));
        address = end + rng.gen_range(0..4) * PAGE_SIZE;
    }

    for n in 0..malformed {
        let at = rng.gen_range(0..=lines.len());
        lines.insert(at, format!("corrupted mapping entry {n}"));
    }

    let mut content = lines.join("\n");
    content.push('\n');
    content
}

/// Writes a synthetic process tree under `output`. Returns the pids that
/// have a mapping table.
pub fn generate_proc_tree(
    rng: &mut impl Rng,
    output: &Path,
    layout: &TreeLayout,
) -> anyhow::Result<Vec<u32>> {
    fs::create_dir_all(output)
        .with_context(|| format!("creating output directory {}", output.display()))?;
    // Non-process entries like the real /proc has
    fs::create_dir_all(output.join("self"))
        .with_context(|| format!("creating {}/self", output.display()))?;

    // Spread malformed lines over the processes
    let mut malformed_per_proc = vec![0usize; layout.processes];
    if layout.processes > 0 {
        for _ in 0..layout.malformed {
            malformed_per_proc[rng.gen_range(0..layout.processes)] += 1;
        }
    }

    let mut pids = Vec::with_capacity(layout.processes);
    for (i, malformed) in malformed_per_proc.into_iter().enumerate() {
        let pid = FIRST_PID + i as u32;
        let name = PROCESS_NAMES[i % PROCESS_NAMES.len()];
        let dir = output.join(pid.to_string());
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

        fs::write(dir.join("comm"), format!("{name}\n"))?;
        fs::write(dir.join("cmdline"), format!("/usr/bin/{name}\0--synthetic\0"))?;
        fs::write(dir.join("maps"), generate_maps(rng, name, layout, malformed))
            .with_context(|| format!("writing {}/maps", dir.display()))?;
        pids.push(pid);
    }

    let mut vanished_pids = Vec::with_capacity(layout.vanished);
    for i in 0..layout.vanished {
        let pid = FIRST_PID + (layout.processes + i) as u32;
        let dir = output.join(pid.to_string());
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        fs::write(dir.join("comm"), "vanished\n")?;
        vanished_pids.push(pid);
    }

    let manifest = TreeManifest {
        generated_at: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        layout,
        pids: pids.clone(),
        vanished_pids,
    };
    fs::write(
        output.join("manifest.json"),
        serde_json::to_string_pretty(&manifest)?,
    )
    .context("writing manifest.json")?;

    Ok(pids)
}

/// Generates a synthetic process directory for testing purposes.
pub fn command_generate_testdata(
    output: PathBuf,
    processes: usize,
    vmas: usize,
    malformed: usize,
    vanished: usize,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let path_column = match config.load_options().path_locator {
        PathLocator::FixedColumn(column) => column,
        PathLocator::Tokens => herakles_vmamap::process::PATH_COLUMN,
    };
    let layout = TreeLayout {
        processes,
        vmas,
        malformed,
        vanished,
        path_column,
    };
    debug!("Generating test data: {:?} into {}", layout, output.display());

    let mut rng = rand::thread_rng();
    let pids = generate_proc_tree(&mut rng, &output, &layout)?;

    println!(
        "✅ Generated synthetic process directory: {} processes ({} without maps) in {}",
        pids.len(),
        vanished,
        output.display()
    );
    println!(
        "   Scan it with: herakles-vmamap --proc-root {} scan",
        output.display()
    );

    Ok(())
}
