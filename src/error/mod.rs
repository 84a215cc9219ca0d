//! Error types for the native messaging bridge.
//!
//! Provides a unified error handling system using thiserror.

mod types;

pub use types::*;
