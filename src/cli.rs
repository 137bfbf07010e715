//! CLI arguments and subcommands for herakles-vmamap.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Output format for scan and show reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

/// How the path field of a mapping line is located
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LocatorArg {
    Column,
    Tokens,
}

impl LocatorArg {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocatorArg::Column => "column",
            LocatorArg::Tokens => "tokens",
        }
    }
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "herakles-vmamap",
    about = "Per-process virtual memory area inspector for Linux",
    long_about = "Per-process virtual memory area inspector for Linux.\n\n\
                  Discovers running processes and parses their /proc/<pid>/maps tables \
                  into an address-space model: address ranges, permissions, file offsets \
                  and backing files or kernel labels ([heap], [vdso], ...).",
    author = "Michael Moll <exporter@herakles.now> - Herakles",
    version = "0.1.0",
    propagate_version = true,
    after_help = "Project: https://github.com/cansp-dev/herakles-vmamap | More info: https://www.herakles.now"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Log level (default: config file, then warn)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Print only the loaded user config file + full path and exit
    #[arg(long)]
    pub show_user_config: bool,

    /// Output format for --show-config*
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Process directory to scan (default: /proc)
    #[arg(long)]
    pub proc_root: Option<PathBuf>,

    /// Override buffer size (KB) for /proc/<pid>/maps
    #[arg(long)]
    pub maps_buffer_kb: Option<usize>,

    /// How to locate the path field in mapping lines
    #[arg(long, value_enum)]
    pub path_locator: Option<LocatorArg>,

    /// Column of the path field for the column locator
    #[arg(long)]
    pub path_column: Option<usize>,

    /// Maximum number of processes to scan
    #[arg(long)]
    pub max_processes: Option<usize>,

    /// Leave this process out of the scan
    #[arg(long)]
    pub skip_self: bool,

    /// Keep this process in the scan even if the config file skips it
    #[arg(long, conflicts_with = "skip_self")]
    pub no_skip_self: bool,

    /// Include only processes matching these names (comma-separated)
    #[arg(long)]
    pub include_names: Option<String>,

    /// Exclude processes matching these names (comma-separated)
    #[arg(long)]
    pub exclude_names: Option<String>,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load all processes and list them
    Scan {
        /// Show every VMA of every process
        #[arg(long)]
        verbose: bool,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the VMA table of a single process
    Show {
        /// Process identifier
        pid: u32,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Validate configuration and system requirements
    Check {
        /// Check mapping table accessibility
        #[arg(long)]
        maps: bool,

        /// Check the process directory
        #[arg(long)]
        proc: bool,

        /// Check all system requirements
        #[arg(long)]
        all: bool,
    },

    /// Generate configuration files
    Config {
        /// Output file path
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },

    /// Generate a synthetic process directory for testing
    GenerateTestdata {
        /// Output directory
        #[arg(short = 'o', long, default_value = "testdata-proc")]
        output: PathBuf,

        /// Number of processes to generate
        #[arg(long, default_value_t = 12)]
        processes: usize,

        /// VMAs per process
        #[arg(long, default_value_t = 24)]
        vmas: usize,

        /// Malformed lines to scatter across the mapping tables
        #[arg(long, default_value_t = 0)]
        malformed: usize,

        /// Process directories to create without a mapping table
        #[arg(long, default_value_t = 0)]
        vanished: usize,
    },

    /// Check runtime requirements and permissions
    CheckRequirements,
}
