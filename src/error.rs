//! Error types for go-junit-report

use std::io;
use thiserror::Error;

/// Result type alias for go-junit-report operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for go-junit-report
///
/// Building and rendering a report never fails; errors only come from reading
/// input, loading configuration and writing the XML document.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file error or invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to parse a command-line value or input data.
    #[error("Parse error: {0}")]
    Parse(String),

    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Writing the XML document failed.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Other error with custom message.
    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Config("missing value".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing value");
    }

    #[test]
    fn test_error_from_string() {
        let err: Error = "custom error".into();
        assert_eq!(err.to_string(), "custom error");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
