//! Install directory resolution and the per-run configuration record.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::BridgeError;

use super::Settings;

/// Values every stage of a single exchange needs.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Directory containing the bridge executable; helpers are probed here.
    pub install_dir: PathBuf,
    /// Maximum size of the inbound message.
    pub max_inbound_size: usize,
    /// Maximum size of the outbound response.
    pub max_outbound_size: usize,
}

impl BridgeConfig {
    /// Build a config from loaded settings and a resolved install directory.
    pub fn new(install_dir: PathBuf, settings: &Settings) -> Self {
        Self {
            install_dir,
            max_inbound_size: settings.limits.max_inbound_size,
            max_outbound_size: settings.limits.max_outbound_size,
        }
    }
}

/// Resolve the directory containing the running executable.
///
/// There is no fallback: the result decides which helper gets executed, so
/// the working directory or anything the caller controls is never used.
pub fn resolve_install_dir() -> Result<PathBuf, BridgeError> {
    let exe = std::env::current_exe().map_err(|e| BridgeError::InstallDir {
        message: format!("Failed to determine executable path: {}", e),
    })?;

    let dir = install_dir_of(&exe)?;
    debug!(install_dir = %dir.display(), "Install directory resolved");
    Ok(dir)
}

fn install_dir_of(exe: &Path) -> Result<PathBuf, BridgeError> {
    if !exe.is_absolute() {
        return Err(BridgeError::InstallDir {
            message: format!("Executable path '{}' is not absolute", exe.display()),
        });
    }

    match exe.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => Ok(dir.to_path_buf()),
        _ => Err(BridgeError::InstallDir {
            message: format!("Executable path '{}' has no parent directory", exe.display()),
        }),
    }
}
