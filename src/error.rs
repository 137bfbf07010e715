//! Error types for process discovery and VMA table parsing.
//!
//! Failures are split by granularity: a malformed mapping line only costs
//! that line, an unreadable mapping file only costs that process, while an
//! unreadable process directory or an internal invariant violation aborts
//! the whole load pass.

use std::io;
use std::path::PathBuf;

/// Errors raised while building a process collection.
#[derive(Debug, thiserror::Error)]
pub enum ProcError {
    #[error("cannot enumerate processes in {}: {source}", .path.display())]
    DirectoryUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read mapping table {}: {source}", .path.display())]
    MappingFileUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("internal invariant violated for pid {pid}: {source}")]
    InternalInvariant {
        pid: u32,
        #[source]
        source: VmaParseError,
    },
}

impl ProcError {
    /// True when the collection pass can continue without the affected process.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ProcError::MappingFileUnavailable { .. })
    }
}

/// Errors raised while parsing one mapping-table line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VmaParseError {
    /// The line does not have the `start-end perms offset` shape, or its
    /// values are out of range. The line is dropped.
    #[error("failed to parse vma line {line:?}")]
    MalformedLine { line: String },

    /// The line matched but a structural field was not captured. This is a
    /// parser defect, never an input problem.
    #[error("matched vma line is missing its {field} field")]
    MissingField { field: &'static str },
}

impl VmaParseError {
    pub fn is_malformed_line(&self) -> bool {
        matches!(self, VmaParseError::MalformedLine { .. })
    }
}
