//! Helper discovery strategies.
//!
//! Unix-family installs ship a single script; Windows installs may ship a
//! compiled helper or a PowerShell script. The strategy is picked once at
//! startup and asked for the helper on each exchange.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::{is_plain_file_name, HelperConfig};

/// Fixed arguments placed before the script path when launching through PowerShell.
const POWERSHELL_ARGS: &[&str] = &["-ExecutionPolicy", "Bypass", "-NoProfile", "-File"];

/// How a discovered helper is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Launcher {
    /// Execute the file itself.
    Direct,
    /// Run the file as a script through `powershell`.
    PowerShell,
}

impl Launcher {
    fn for_path(path: &Path) -> Self {
        let is_ps1 = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("ps1"))
            .unwrap_or(false);

        if is_ps1 {
            Launcher::PowerShell
        } else {
            Launcher::Direct
        }
    }
}

/// A helper found in the install directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperProgram {
    pub path: PathBuf,
    pub launcher: Launcher,
}

impl HelperProgram {
    pub fn new(path: PathBuf) -> Self {
        let launcher = Launcher::for_path(&path);
        Self { path, launcher }
    }

    /// The program handed to the OS.
    pub fn program(&self) -> OsString {
        match self.launcher {
            Launcher::Direct => self.path.clone().into_os_string(),
            Launcher::PowerShell => OsString::from("powershell"),
        }
    }

    /// Arguments passed to [`HelperProgram::program`].
    pub fn args(&self) -> Vec<OsString> {
        match self.launcher {
            Launcher::Direct => Vec::new(),
            Launcher::PowerShell => POWERSHELL_ARGS
                .iter()
                .map(OsString::from)
                .chain(std::iter::once(self.path.clone().into_os_string()))
                .collect(),
        }
    }
}

/// Strategy for finding the helper in an install directory.
pub trait HelperDiscovery: Send + Sync {
    /// Return the helper to run, or `None` when no helper is installed.
    fn find(&self, install_dir: &Path) -> Option<HelperProgram>;
}

/// Probes a single script name (Unix family).
#[derive(Debug, Clone)]
pub struct ScriptDiscovery {
    script: String,
}

impl ScriptDiscovery {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
        }
    }
}

impl HelperDiscovery for ScriptDiscovery {
    fn find(&self, install_dir: &Path) -> Option<HelperProgram> {
        probe(install_dir, &self.script).map(|path| HelperProgram {
            path,
            launcher: Launcher::Direct,
        })
    }
}

/// Probes an ordered list of names, first match wins (Windows).
#[derive(Debug, Clone)]
pub struct CandidateDiscovery {
    candidates: Vec<String>,
}

impl CandidateDiscovery {
    pub fn new<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            candidates: candidates.into_iter().map(Into::into).collect(),
        }
    }
}

impl HelperDiscovery for CandidateDiscovery {
    fn find(&self, install_dir: &Path) -> Option<HelperProgram> {
        self.candidates
            .iter()
            .find_map(|name| probe(install_dir, name))
            .map(HelperProgram::new)
    }
}

fn probe(install_dir: &Path, name: &str) -> Option<PathBuf> {
    if !is_plain_file_name(name) {
        warn!(candidate = %name, "Ignoring helper name outside the install directory");
        return None;
    }

    let path = install_dir.join(name);
    if path.parent() != Some(install_dir) {
        warn!(candidate = %path.display(), "Ignoring helper outside the install directory");
        return None;
    }

    if path.is_file() {
        debug!(helper = %path.display(), "Helper found");
        Some(path)
    } else {
        debug!(candidate = %path.display(), "Helper candidate not present");
        None
    }
}

/// Select the discovery strategy for the platform the bridge is running on.
pub fn discovery_for_platform(config: &HelperConfig) -> Box<dyn HelperDiscovery> {
    if cfg!(windows) {
        Box::new(CandidateDiscovery::new(config.windows_candidates.iter().cloned()))
    } else {
        Box::new(ScriptDiscovery::new(config.unix_script.clone()))
    }
}
