//! Native messaging protocol module.
//!
//! Defines request/response types and message framing for the browser channel.
//!
//! ## Wire Format
//!
//! Messages are length-prefixed JSON:
//! ```text
//! [4 bytes: length (native-endian u32)][JSON payload]
//! ```
//!
//! The browser writes the prefix in the host's byte order, so the bridge never
//! converts to network order.

mod message;
mod wire;

pub use message::{Request, Response, PING, PONG};
pub use wire::{
    read_message, write_message, DEFAULT_MAX_INBOUND_SIZE, DEFAULT_MAX_OUTBOUND_SIZE,
};
