//! herakles-vmamap - version 0.1.0
//!
//! Per-process virtual memory area inspector with tracing logging.
//! This is the main entry point that resolves configuration and handles subcommands.

mod cli;
mod commands;
mod config;
mod startup_checks;

use clap::Parser;
use tracing::{error, info, Level};

use cli::{Args, Commands, LogLevel, OutputFormat};
use commands::{
    command_check, command_config, command_generate_testdata, command_scan, command_show,
};
use config::{resolve_config, show_config, validate_effective_config, Config};

/// Maps a config file log level onto the CLI enum.
fn parse_log_level(level: &str) -> Option<LogLevel> {
    match level {
        "off" => Some(LogLevel::Off),
        "error" => Some(LogLevel::Error),
        "warn" => Some(LogLevel::Warn),
        "info" => Some(LogLevel::Info),
        "debug" => Some(LogLevel::Debug),
        "trace" => Some(LogLevel::Trace),
        _ => None,
    }
}

/// Initializes tracing logging subsystem with configured log level.
/// Precedence: CLI flag, then config file, then warn.
fn setup_logging(config: &Config, args: &Args) {
    let level = args
        .log_level
        .clone()
        .or_else(|| config.log_level.as_deref().and_then(parse_log_level))
        .unwrap_or(LogLevel::Warn);

    let max_level = match level {
        LogLevel::Off => return,
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(max_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return;
    }

    info!("Logging initialized with level: {:?}", level);
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Main application entry point.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.show_user_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        if args.show_config {
            return show_config(&config, args.config_format, false);
        }

        if args.show_user_config {
            return show_config(&config, args.config_format, true);
        }
    }

    // Config generation doesn't need an effective config
    if let Some(Commands::Config {
        output,
        format,
        commented,
    }) = &args.command
    {
        return command_config(output.clone(), format.clone(), *commented);
    }

    let config = load_validated_config(&args)?;
    setup_logging(&config, &args);

    match &args.command {
        Some(Commands::CheckRequirements) => {
            println!("🔍 Checking Runtime Requirements");
            println!("================================\n");

            match startup_checks::validate_requirements(&config.load_options().proc_root) {
                Ok(_) => {
                    println!("\n✅ All requirements met");
                    Ok(())
                }
                Err(e) => {
                    eprintln!("\n❌ Requirements check failed: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Some(Commands::Scan { verbose, format }) => command_scan(*verbose, *format, &config),

        Some(Commands::Show { pid, format }) => command_show(*pid, *format, &config),

        Some(Commands::Check { maps, proc, all }) => command_check(*maps, *proc, *all, &config),

        Some(Commands::GenerateTestdata {
            output,
            processes,
            vmas,
            malformed,
            vanished,
        }) => command_generate_testdata(
            output.clone(),
            *processes,
            *vmas,
            *malformed,
            *vanished,
            &config,
        ),

        Some(Commands::Config { .. }) => unreachable!("Config handled above"),

        None => {
            // Default mode: one text scan
            if let Err(e) = startup_checks::validate_requirements(&config.load_options().proc_root)
            {
                error!("❌ Startup validation failed: {}", e);
                error!("   The scan will continue but may miss processes!");
            }
            command_scan(false, OutputFormat::Text, &config)
        }
    }
}
