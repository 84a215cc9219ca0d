//! Native Messaging Bridge Library
//!
//! This crate provides the core functionality for a browser native messaging
//! host that answers liveness probes itself and forwards every other request
//! to a helper installed next to its executable.

pub mod bridge;
pub mod config;
pub mod error;
pub mod helper;
pub mod protocol;
