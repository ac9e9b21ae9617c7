use serde::{Deserialize, Serialize};

/// Failure to serve a request at all. Store outcomes travel as `ErrorInfo`
/// inside regular responses instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriverError {
    /// Connection or I/O error
    ConnectionError(String),
    /// Malformed or unsupported wire input
    ProtocolError(String),
    /// Numeric argument does not fit its native width
    ValidationError(String),
    /// Frame exceeds the maximum message size
    MessageTooLarge,
    /// Command not understood by this daemon
    InvalidCommand(String),
    /// Unexpected failure while serving the request
    InternalError(String),
}

impl std::fmt::Display for DriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriverError::ConnectionError(msg) => write!(f, "Connection error: {}", msg),
            DriverError::ProtocolError(msg) => write!(f, "Protocol error: {}", msg),
            DriverError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            DriverError::MessageTooLarge => write!(f, "Message too large"),
            DriverError::InvalidCommand(msg) => write!(f, "Invalid command: {}", msg),
            DriverError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for DriverError {}
