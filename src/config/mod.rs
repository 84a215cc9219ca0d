//! Configuration module for the native messaging bridge.
//!
//! Settings have protocol defaults and can be overridden from a TOML file.
//! The install directory is resolved from the running executable and carried
//! alongside the limits in [`BridgeConfig`].

mod install;
mod settings;

pub use install::{resolve_install_dir, BridgeConfig};
pub use settings::*;
