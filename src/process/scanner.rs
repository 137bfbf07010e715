//! Process discovery in the process-information directory.
//!
//! This module lists candidate process directories (digit-leading names)
//! and reads best-effort identification data like names and command lines.

use crate::error::ProcError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Process entry representing a directory in /proc filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcEntry {
    pub pid: u32,
    pub proc_path: PathBuf,
}

/// Returns true for directory names that can name a process.
pub fn is_process_dir_name(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_digit())
}

/// Scans the process directory for entries whose names begin with a digit.
///
/// Failing to open the directory is fatal for the discovery pass. No ordering
/// is guaranteed.
pub fn collect_proc_entries(root: &Path, max: Option<usize>) -> Result<Vec<ProcEntry>, ProcError> {
    let entries = fs::read_dir(root).map_err(|source| ProcError::DirectoryUnavailable {
        path: root.to_path_buf(),
        source,
    })?;

    let mut out = Vec::new();
    for entry in entries.flatten() {
        let p = entry.path();
        let name = match p.file_name().and_then(|s| s.to_str()) {
            Some(v) => v,
            None => continue,
        };
        if !is_process_dir_name(name) {
            continue;
        }
        let pid: u32 = match name.parse() {
            Ok(v) => v,
            Err(_) => {
                debug!("Skipping non-numeric process entry {}", p.display());
                continue;
            }
        };
        out.push(ProcEntry { pid, proc_path: p });
        if let Some(maxp) = max {
            if out.len() >= maxp {
                break;
            }
        }
    }
    Ok(out)
}

/// Reads process name from comm file or extracts from cmdline.
pub fn read_process_name(proc_path: &Path) -> Option<String> {
    let comm = proc_path.join("comm");
    if let Ok(s) = fs::read_to_string(&comm) {
        let t = s.trim();
        if !t.is_empty() {
            return Some(t.into());
        }
    }

    let content = fs::read(proc_path.join("cmdline")).ok()?;
    let first = content.split(|&b| b == 0u8).next()?;
    let first = std::str::from_utf8(first).ok()?;
    Path::new(first)
        .file_name()
        .and_then(|name| name.to_str())
        .map(|s| s.to_string())
}

/// Reads the full command line with NUL separators rendered as spaces.
pub fn read_cmdline(proc_path: &Path) -> Option<String> {
    let content = fs::read(proc_path.join("cmdline")).ok()?;
    let parts: Vec<String> = content
        .split(|&b| b == 0u8)
        .filter(|s| !s.is_empty())
        .map(|s| String::from_utf8_lossy(s).into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

/// Substring filters on process names.
#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
}

impl NameFilter {
    pub fn is_empty(&self) -> bool {
        self.include.as_ref().map_or(true, |v| v.is_empty())
            && self.exclude.as_ref().map_or(true, |v| v.is_empty())
    }

    /// Determines if a process should be included. Exclusion wins.
    pub fn should_include(&self, name: &str) -> bool {
        if let Some(ex) = &self.exclude {
            if ex.iter().any(|s| name.contains(s)) {
                return false;
            }
        }
        if let Some(inc) = &self.include {
            if !inc.is_empty() {
                return inc.iter().any(|s| name.contains(s));
            }
        }
        true
    }
}
