//! Configuration management for herakles-vmamap.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat};
use herakles_vmamap::process::{
    LoadOptions, NameFilter, PathLocator, DEFAULT_MAPS_BUFFER_KB, DEFAULT_PROC_ROOT,
    MAX_MAPS_BUFFER_KB, PATH_COLUMN,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

// Default configuration constants
pub const DEFAULT_PATH_LOCATOR: &str = "column";

/// Enhanced configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Data source
    #[serde(alias = "proc-root")]
    pub proc_root: Option<PathBuf>,

    // Parsing
    #[serde(alias = "maps-buffer-kb")]
    pub maps_buffer_kb: Option<usize>,
    /// "column" | "tokens"
    #[serde(alias = "path-locator")]
    pub path_locator: Option<String>,
    #[serde(alias = "path-column")]
    pub path_column: Option<usize>,

    // Process selection
    #[serde(alias = "max-processes")]
    pub max_processes: Option<usize>,
    #[serde(alias = "skip-self")]
    pub skip_self: Option<bool>,
    #[serde(alias = "include-names")]
    pub include_names: Option<Vec<String>>,
    #[serde(alias = "exclude-names")]
    pub exclude_names: Option<Vec<String>>,

    // Logging
    #[serde(alias = "log-level")]
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proc_root: Some(PathBuf::from(DEFAULT_PROC_ROOT)),
            maps_buffer_kb: Some(DEFAULT_MAPS_BUFFER_KB),
            path_locator: Some(DEFAULT_PATH_LOCATOR.into()),
            path_column: Some(PATH_COLUMN),
            max_processes: None,
            skip_self: Some(false),
            include_names: None,
            exclude_names: None,
            log_level: Some("warn".into()),
        }
    }
}

impl Config {
    /// Builds the library load options from the effective configuration.
    pub fn load_options(&self) -> LoadOptions {
        let path_locator = match self.path_locator.as_deref() {
            Some("tokens") => PathLocator::Tokens,
            _ => PathLocator::FixedColumn(self.path_column.unwrap_or(PATH_COLUMN)),
        };

        LoadOptions {
            proc_root: self
                .proc_root
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PROC_ROOT)),
            maps_buffer_kb: self.maps_buffer_kb.unwrap_or(DEFAULT_MAPS_BUFFER_KB),
            path_locator,
            max_processes: self.max_processes,
            skip_self: self.skip_self.unwrap_or(false),
            names: NameFilter {
                include: self.include_names.clone(),
                exclude: self.exclude_names.clone(),
            },
        }
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(locator) = cfg.path_locator.as_deref() {
        match locator {
            "column" | "tokens" => {}
            other => {
                return Err(format!(
                    "Invalid path_locator '{}', expected 'column' or 'tokens'",
                    other
                )
                .into());
            }
        }
    }

    if cfg.path_column == Some(0) {
        return Err("path_column must be greater than 0".into());
    }

    if let Some(kb) = cfg.maps_buffer_kb {
        if kb == 0 {
            return Err("maps_buffer_kb must be greater than 0".into());
        }
        if kb > MAX_MAPS_BUFFER_KB {
            return Err(format!(
                "maps_buffer_kb must be at most {} (got {})",
                MAX_MAPS_BUFFER_KB, kb
            )
            .into());
        }
    }

    if cfg.max_processes == Some(0) {
        return Err("max_processes must be greater than 0 when set".into());
    }

    if let Some(root) = &cfg.proc_root {
        if root.as_os_str().is_empty() {
            return Err("proc_root must not be empty".into());
        }
    }

    if let Some(level) = cfg.log_level.as_deref() {
        match level {
            "off" | "error" | "warn" | "info" | "debug" | "trace" => {}
            other => {
                return Err(format!("Invalid log_level '{}'", other).into());
            }
        }
    }

    Ok(())
}

/// Splits a comma-separated CLI list.
fn split_names(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(root) = &args.proc_root {
        config.proc_root = Some(root.clone());
    }
    if let Some(kb) = args.maps_buffer_kb {
        config.maps_buffer_kb = Some(kb);
    }
    if let Some(locator) = args.path_locator {
        config.path_locator = Some(locator.as_str().to_string());
    }
    if let Some(column) = args.path_column {
        config.path_column = Some(column);
    }
    if args.max_processes.is_some() {
        config.max_processes = args.max_processes;
    }
    if args.skip_self {
        config.skip_self = Some(true);
    } else if args.no_skip_self {
        config.skip_self = Some(false);
    }

    // Parse comma-separated include/exclude names
    if let Some(include_str) = &args.include_names {
        config.include_names = Some(split_names(include_str));
    }
    if let Some(exclude_str) = &args.exclude_names {
        config.exclude_names = Some(split_names(exclude_str));
    }

    Ok(config)
}

/// Enhanced configuration loading with multiple format support
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = if let Some(p) = path {
        PathBuf::from(p)
    } else {
        // Try default locations
        let defaults = [
            "/etc/herakles/vmamap.yaml",
            "/etc/herakles/vmamap.yml",
            "/etc/herakles/vmamap.json",
            "./herakles-vmamap.yaml",
            "./herakles-vmamap.yml",
            "./herakles-vmamap.json",
        ];

        defaults
            .iter()
            .find(|p| Path::new(p).exists())
            .map(PathBuf::from)
            .unwrap_or_default()
    };

    if path.as_os_str().is_empty() || !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config: Config = serde_json::from_str(&content)?;
            info!("Loaded JSON configuration from: {}", path.display());
            Ok(config)
        }
        Some("toml") => {
            let config: Config = toml::from_str(&content)?;
            info!("Loaded TOML configuration from: {}", path.display());
            Ok(config)
        }
        _ => {
            // Default to YAML
            let config: Config = serde_yaml::from_str(&content)?;
            info!("Loaded YAML configuration from: {}", path.display());
            Ok(config)
        }
    }
}

/// Shows configuration in requested format
pub fn show_config(
    config: &Config,
    format: ConfigFormat,
    user_config: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = render_config(config, &format)?;

    if user_config {
        println!("User configuration (effective values):");
    }
    println!("{output}");
    Ok(())
}

/// Serializes configuration in the requested format.
pub fn render_config(
    config: &Config,
    format: &ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = Config::default();
        assert!(validate_effective_config(&cfg).is_ok());

        let opts = cfg.load_options();
        assert_eq!(opts.proc_root, PathBuf::from("/proc"));
        assert_eq!(opts.path_locator, PathLocator::FixedColumn(49));
        assert_eq!(opts.maps_buffer_kb, DEFAULT_MAPS_BUFFER_KB);
        assert!(!opts.skip_self);
        assert!(opts.names.is_empty());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut cfg = Config::default();
        cfg.path_locator = Some("regex".into());
        assert!(validate_effective_config(&cfg).is_err());

        let mut cfg = Config::default();
        cfg.path_column = Some(0);
        assert!(validate_effective_config(&cfg).is_err());

        let mut cfg = Config::default();
        cfg.maps_buffer_kb = Some(0);
        assert!(validate_effective_config(&cfg).is_err());

        let mut cfg = Config::default();
        cfg.maps_buffer_kb = Some(MAX_MAPS_BUFFER_KB + 1);
        assert!(validate_effective_config(&cfg).is_err());
        cfg.maps_buffer_kb = Some(MAX_MAPS_BUFFER_KB);
        assert!(validate_effective_config(&cfg).is_ok());

        let mut cfg = Config::default();
        cfg.maps_buffer_kb = Some(usize::MAX / 512);
        assert!(validate_effective_config(&cfg).is_err());

        let mut cfg = Config::default();
        cfg.log_level = Some("verbose".into());
        assert!(validate_effective_config(&cfg).is_err());
    }

    #[test]
    fn test_tokens_locator_option() {
        let mut cfg = Config::default();
        cfg.path_locator = Some("tokens".into());
        assert_eq!(cfg.load_options().path_locator, PathLocator::Tokens);

        cfg.path_locator = Some("column".into());
        cfg.path_column = Some(73);
        assert_eq!(cfg.load_options().path_locator, PathLocator::FixedColumn(73));
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("vmamap.yaml");
        fs::write(
            &path,
            "proc_root: /srv/proc\nmaps_buffer_kb: 16\npath_locator: tokens\n",
        )
        .unwrap();

        let args = Args::parse_from([
            "herakles-vmamap",
            "--config",
            path.to_str().unwrap(),
            "--maps-buffer-kb",
            "128",
            "--include-names",
            "nginx, postgres",
        ]);
        let cfg = resolve_config(&args).expect("config resolves");

        assert_eq!(cfg.proc_root, Some(PathBuf::from("/srv/proc")));
        assert_eq!(cfg.maps_buffer_kb, Some(128));
        assert_eq!(cfg.path_locator.as_deref(), Some("tokens"));
        assert_eq!(
            cfg.include_names,
            Some(vec!["nginx".to_string(), "postgres".to_string()])
        );
    }

    #[test]
    fn test_cli_overrides_skip_self_both_ways() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("vmamap.yaml");
        fs::write(&path, "skip_self: true\n").unwrap();
        let path_arg = path.to_str().unwrap();

        let args = Args::parse_from(["herakles-vmamap", "--config", path_arg]);
        assert_eq!(resolve_config(&args).unwrap().skip_self, Some(true));

        let args = Args::parse_from(["herakles-vmamap", "--config", path_arg, "--no-skip-self"]);
        let cfg = resolve_config(&args).unwrap();
        assert_eq!(cfg.skip_self, Some(false));
        assert!(!cfg.load_options().skip_self);

        let conflicting =
            Args::try_parse_from(["herakles-vmamap", "--skip-self", "--no-skip-self"]);
        assert!(conflicting.is_err());
    }

    #[test]
    fn test_load_config_formats() {
        let dir = tempdir().unwrap();

        let json = dir.path().join("c.json");
        fs::write(&json, r#"{"path-column": 73, "skip_self": true}"#).unwrap();
        let cfg = load_config(Some(json.as_path())).unwrap();
        assert_eq!(cfg.path_column, Some(73));
        assert_eq!(cfg.skip_self, Some(true));

        let toml_path = dir.path().join("c.toml");
        fs::write(&toml_path, "max_processes = 10\n").unwrap();
        let cfg = load_config(Some(toml_path.as_path())).unwrap();
        assert_eq!(cfg.max_processes, Some(10));

        let missing = dir.path().join("missing.yaml");
        let cfg = load_config(Some(missing.as_path())).unwrap();
        assert_eq!(cfg.path_column, Some(PATH_COLUMN));
    }

    #[test]
    fn test_render_config_round_trips() {
        let cfg = Config::default();
        let yaml = render_config(&cfg, &ConfigFormat::Yaml).unwrap();
        let back: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.path_locator, cfg.path_locator);

        let toml_out = render_config(&cfg, &ConfigFormat::Toml).unwrap();
        assert!(toml_out.contains("path_column = 49"));
    }
}
