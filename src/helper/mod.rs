//! Helper module.
//!
//! Locates the helper installed next to the bridge and runs it with the
//! original request on stdin.

mod delegate;
mod discovery;
mod subprocess;

pub use delegate::call_helper;
pub use discovery::{
    discovery_for_platform, CandidateDiscovery, HelperDiscovery, HelperProgram, Launcher,
    ScriptDiscovery,
};
pub use subprocess::{HelperCommand, HelperOutput};
