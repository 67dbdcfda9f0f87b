//! Error handling for the operator panel
//!
//! This module defines the crate-level error type and a Result alias for use
//! throughout the application. Transport failures have their own type
//! ([`TransportError`](crate::backend::transport::TransportError)) because
//! they are classified for the operator rather than propagated.

use crate::backend::transport::TransportError;
use thiserror::Error;

/// Main error type for panel operations
#[derive(Error, Debug)]
pub enum PanelError {
    /// Errors related to configuration loading or validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// Channel selector outside the device's 1..=8 range
    #[error("Invalid channel {0}: expected 1..=8")]
    InvalidChannel(u8),

    /// Errors raised by the Modbus transport
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse errors
    #[error("Parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PanelError>,
    },
}

impl PanelError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PanelError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for panel operations
pub type Result<T> = std::result::Result<T, PanelError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<PanelError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PanelError::Config("tick interval must be positive".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: tick interval must be positive"
        );
    }

    #[test]
    fn test_invalid_channel_display() {
        let err = PanelError::InvalidChannel(9);
        assert!(err.to_string().contains("9"));
        assert!(err.to_string().contains("1..=8"));
    }

    #[test]
    fn test_error_with_context() {
        let err = PanelError::Config("bad".to_string());
        let with_ctx = err.with_context("Failed to load config.toml");
        assert!(with_ctx.to_string().starts_with("Failed to load config.toml"));
    }

    #[test]
    fn test_result_ext_on_io_error() {
        let res: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));
        let err = res.context("Reading config").unwrap_err();
        assert!(err.to_string().contains("Reading config"));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_transport_error_converts() {
        let err: PanelError = TransportError::Timeout("no reply".to_string()).into();
        assert!(matches!(err, PanelError::Transport(_)));
    }
}
