//! Error types for the native messaging bridge.

use std::process::ExitStatus;

use thiserror::Error;

/// Main error type for the bridge.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Configuration-related errors.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The bridge could not determine where its own executable lives.
    #[error("Install directory error: {message}")]
    InstallDir { message: String },

    /// Framing and message format errors.
    #[error("Protocol error: {kind}")]
    Protocol { kind: ProtocolErrorKind },

    /// Helper discovery succeeded but running the helper did not.
    #[error("Helper error: {kind}")]
    Helper { kind: HelperErrorKind },

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Protocol error kinds.
#[derive(Error, Debug)]
pub enum ProtocolErrorKind {
    #[error("Message too large: {size} bytes exceeds maximum of {max} bytes")]
    MessageTooLarge { size: usize, max: usize },

    #[error("Stream ended before a complete message was read")]
    Truncated,

    #[error("invalid JSON: {message}")]
    InvalidMessageFormat { message: String },
}

/// Helper execution error kinds.
#[derive(Error, Debug)]
pub enum HelperErrorKind {
    #[error("Failed to start {program}: {message}")]
    SpawnFailed { program: String, message: String },

    #[error("{program} exited with {status}")]
    Failed { program: String, status: ExitStatus },

    #[error("helper returned invalid JSON: {message}")]
    InvalidOutput { message: String },

    #[error("I/O with {program} failed: {message}")]
    Io { program: String, message: String },
}

impl BridgeError {
    /// Whether this error came from running the helper.
    ///
    /// Delegation faults are reported to the caller as an error response and
    /// the exchange still completes; every other error is fatal.
    pub fn is_delegation_fault(&self) -> bool {
        matches!(self, BridgeError::Helper { .. })
    }
}

/// Result type alias for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delegation_fault_classification() {
        let helper = BridgeError::Helper {
            kind: HelperErrorKind::InvalidOutput {
                message: "expected value".to_string(),
            },
        };
        assert!(helper.is_delegation_fault());

        let protocol = BridgeError::Protocol {
            kind: ProtocolErrorKind::Truncated,
        };
        assert!(!protocol.is_delegation_fault());
    }

    #[test]
    fn test_error_messages() {
        let err = BridgeError::Protocol {
            kind: ProtocolErrorKind::MessageTooLarge { size: 10, max: 5 },
        };
        assert_eq!(
            err.to_string(),
            "Protocol error: Message too large: 10 bytes exceeds maximum of 5 bytes"
        );

        let kind = HelperErrorKind::InvalidOutput {
            message: "EOF while parsing".to_string(),
        };
        assert_eq!(kind.to_string(), "helper returned invalid JSON: EOF while parsing");
    }
}
