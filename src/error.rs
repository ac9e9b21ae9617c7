use kvproxy_client::protocol::DriverError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProxyError {
    /// Malformed or unsupported wire input
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Numeric argument that does not fit its native width or range
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ProxyResult<T> = Result<T, ProxyError>;

impl ProxyError {
    pub fn protocol(msg: impl Into<String>) -> Self {
        ProxyError::Protocol(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ProxyError::Validation(msg.into())
    }
}

impl From<ProxyError> for DriverError {
    fn from(err: ProxyError) -> Self {
        match err {
            ProxyError::Protocol(msg) => DriverError::ProtocolError(msg),
            ProxyError::Validation(msg) => DriverError::ValidationError(msg),
            ProxyError::Config(msg) => DriverError::InternalError(msg),
            ProxyError::Io(e) => DriverError::ConnectionError(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ProxyError::protocol("unknown map op");
        assert_eq!(err.to_string(), "Protocol error: unknown map op");

        let err = ProxyError::validation("index 4294967296 does not fit i32");
        assert_eq!(
            err.to_string(),
            "Validation error: index 4294967296 does not fit i32"
        );

        let err = ProxyError::Config("no clusters".to_string());
        assert_eq!(err.to_string(), "Configuration error: no clusters");
    }

    #[test]
    fn test_driver_error_conversion() {
        let err: DriverError = ProxyError::protocol("bad arity").into();
        assert_eq!(err, DriverError::ProtocolError("bad arity".to_string()));

        let err: DriverError = ProxyError::validation("overflow").into();
        assert_eq!(err, DriverError::ValidationError("overflow".to_string()));

        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        let err: DriverError = ProxyError::from(io).into();
        assert!(matches!(err, DriverError::ConnectionError(_)));
    }

    #[test]
    fn test_error_debug() {
        let err = ProxyError::protocol("x");
        let debug = format!("{:?}", err);
        assert!(debug.contains("Protocol"));
    }
}
