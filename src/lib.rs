//! Herakles VMA Map Library
//!
//! This library discovers the running processes of a Linux host and parses
//! each process's `/proc/<pid>/maps` table into an in-memory model of its
//! address space. The model is meant to be consumed read-only by
//! presentation layers (process lists, treemaps, reports).
//!
//! # Features
//!
//! - **Process Discovery**: Digit-named entries of the process directory
//! - **VMA Parsing**: Address range, permissions, offset and backing per line
//! - **Fault Isolation**: Malformed lines and vanished processes are skipped
//! - **Indexed Pool**: Processes in discovery order with pid lookup
//!
//! # Usage
//!
//! ```rust,no_run
//! use herakles_vmamap::{LoadOptions, ProcessCollection};
//!
//! let pool = ProcessCollection::load(&LoadOptions::default())?;
//!
//! for process in &pool {
//!     println!("{} {} ({} vmas)", process.pid(), process.cmdline(), process.vmas().len());
//! }
//!
//! if let Some(init) = pool.get(1) {
//!     for vma in init.vmas() {
//!         println!("{:x}-{:x} {} {}", vma.start(), vma.end(), vma.permissions(), vma.backing());
//!     }
//! }
//! # Ok::<(), herakles_vmamap::ProcError>(())
//! ```

pub mod error;
pub mod process;

// Re-export main types for convenience
pub use error::{ProcError, VmaParseError};
pub use process::{
    parse_vma_line, parse_vma_line_with, Backing, LoadOptions, LoadReport, NameFilter,
    PathLocator, Process, ProcessCollection, ScanStats, Vma,
};
