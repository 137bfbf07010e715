//! Startup requirement validation for herakles-vmamap.
//!
//! This module validates that the process directory can be enumerated and
//! that mapping tables of foreign processes are readable before a scan.

use nix::unistd::geteuid;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{error, info, warn};

/// Validate all runtime requirements
pub fn validate_requirements(proc_root: &Path) -> Result<(), ValidationError> {
    info!("🔍 Validating runtime requirements...");

    check_user_privileges();
    check_proc_root(proc_root)?;
    check_maps_access(proc_root)?;

    info!("✅ All runtime requirements validated");
    Ok(())
}

/// Check if running with sufficient privileges
fn check_user_privileges() {
    if !geteuid().is_root() {
        warn!("⚠️  Not running as root - mapping tables of other users' processes will be skipped");
        warn!("   Recommendation: Run as root for a complete process list");
    } else {
        info!("✅ Running as root (uid=0)");
    }
}

/// Check that the process directory exists and can be listed
fn check_proc_root(proc_root: &Path) -> Result<(), ValidationError> {
    match fs::read_dir(proc_root) {
        Ok(_) => {
            info!("✅ {} is readable", proc_root.display());
            Ok(())
        }
        Err(e) => {
            error!("❌ Cannot list {}: {}", proc_root.display(), e);
            error!("   Is the proc filesystem mounted?");
            Err(ValidationError::ProcRootUnavailable(e.to_string()))
        }
    }
}

/// Check mapping table access for pid 1 (owned by root)
fn check_maps_access(proc_root: &Path) -> Result<(), ValidationError> {
    let test_file = proc_root.join("1").join("maps");

    match fs::File::open(&test_file) {
        Ok(_) => {
            info!("✅ maps access: Can read all processes");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            error!("❌ Cannot read {} - insufficient permissions", test_file.display());
            error!("   Only user-owned processes will be loaded!");
            error!("");
            error!("   Solutions:");
            error!("   1. Run as root");
            error!("   2. Grant capabilities:");
            error!("      setcap cap_sys_ptrace+ep /path/to/binary");
            Err(ValidationError::InsufficientPermissions(e.to_string()))
        }
        Err(e) => {
            warn!("⚠️  Could not test maps access: {}", e);
            Ok(()) // Continue but warn
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Process directory unavailable: {0}")]
    ProcRootUnavailable(String),

    #[error("Insufficient permissions: {0}")]
    InsufficientPermissions(String),
}
