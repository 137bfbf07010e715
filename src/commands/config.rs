//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let output = output.unwrap_or_else(|| PathBuf::from("herakles-vmamap.yaml"));

    let mut content = render_config(&config, &format)?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# Herakles VMA Map Configuration
# ===============================
#
# Data Source
# -----------
# proc_root: "/proc"           # Process directory to scan
#
# Parsing
# -------
# maps_buffer_kb: 64           # Read buffer for /proc/<pid>/maps
# path_locator: "column"       # "column" (fixed column) or "tokens" (after inode field)
# path_column: 49              # Path column for the column locator
#
# Process Selection
# -----------------
# max_processes: null          # Maximum processes to scan
# skip_self: false             # Leave this process out
# include_names: null          # Include only processes matching these names
# exclude_names: null          # Exclude processes matching these names
#
# Logging
# -------
# log_level: "warn"            # off, error, warn, info, debug, trace
"#;

    format!("{comments}\n{yaml}")
}
