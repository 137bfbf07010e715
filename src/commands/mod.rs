//! CLI command implementations for herakles-vmamap.
//!
//! This module provides implementations for all CLI subcommands:
//! - `scan`: Load every process and list the pool
//! - `show`: Print the VMA table of one process
//! - `check`: System validation
//! - `config`: Configuration file generation
//! - `generate`: Synthetic process directory generation

pub mod check;
pub mod config;
pub mod generate;
pub mod scan;
pub mod show;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use generate::command_generate_testdata;
pub use scan::command_scan;
pub use show::command_show;
