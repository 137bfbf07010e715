//! Process discovery and VMA table modelling.
//!
//! This module provides:
//! - `scanner`: Process discovery in the process directory
//! - `vma`: Parsing of single `/proc/<pid>/maps` lines
//! - `loader`: Loading one process's mapping table
//! - `collection`: The pid-indexed pool of loaded processes

pub mod collection;
pub mod loader;
pub mod scanner;
pub mod vma;

use std::path::PathBuf;

// Re-export commonly used types
pub use collection::{ProcessCollection, ScanStats};
pub use loader::{LoadReport, Process, NO_CMDLINE};
pub use scanner::{collect_proc_entries, read_cmdline, read_process_name, NameFilter, ProcEntry};
pub use vma::{
    parse_vma_line, parse_vma_line_with, Backing, PathLocator, Vma, ANON_NAME, HEAP_NAME,
    PATH_COLUMN, VDSO_NAME,
};

pub const DEFAULT_PROC_ROOT: &str = "/proc";
pub const DEFAULT_MAPS_BUFFER_KB: usize = 64;
/// Upper bound for the mapping table read buffer (64 MiB).
pub const MAX_MAPS_BUFFER_KB: usize = 64 * 1024;

/// Settings for one discovery + load pass.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub proc_root: PathBuf,
    pub maps_buffer_kb: usize,
    pub path_locator: PathLocator,
    pub max_processes: Option<usize>,
    /// Leave the calling process out of the pool.
    pub skip_self: bool,
    pub names: NameFilter,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from(DEFAULT_PROC_ROOT),
            maps_buffer_kb: DEFAULT_MAPS_BUFFER_KB,
            path_locator: PathLocator::default(),
            max_processes: None,
            skip_self: false,
            names: NameFilter::default(),
        }
    }
}

impl LoadOptions {
    /// Options reading from an alternative process directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: root.into(),
            ..Self::default()
        }
    }
}
