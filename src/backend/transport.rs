//! Modbus transport trait for a unified device interface
//!
//! This module provides a common trait for Modbus transport clients, enabling
//! both the real RTU client (via tokio-modbus) and the scripted mock transport
//! used in tests. Only the [`ConnectionManager`](super::connection::ConnectionManager)
//! holds a transport.

use crate::config::SerialConfig;
use std::time::Duration;
use thiserror::Error;

/// Modbus unit address of the analog input module
pub const DEVICE_UNIT_ID: u8 = 1;

/// Failures raised by a Modbus transport
///
/// The variants are disjoint; [`classify`](super::classifier::classify)
/// maps each to exactly one operator-facing category.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Operation exceeded its configured timeout
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Serial resource is held by another process or access was refused
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Failure while talking to the adapter
    #[error("I/O failure: {0}")]
    Io(String),

    /// Port identifier is empty or malformed
    #[error("Invalid port name: {0}")]
    InvalidPortName(String),

    /// Anything else (Modbus exception responses, protocol errors, ...)
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// The low-level message without the variant prefix
    pub fn detail(&self) -> &str {
        match self {
            TransportError::Timeout(msg)
            | TransportError::AccessDenied(msg)
            | TransportError::Io(msg)
            | TransportError::InvalidPortName(msg)
            | TransportError::Other(msg) => msg,
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::TimedOut => TransportError::Timeout(err.to_string()),
            ErrorKind::PermissionDenied => TransportError::AccessDenied(err.to_string()),
            ErrorKind::InvalidInput => TransportError::InvalidPortName(err.to_string()),
            _ => TransportError::Io(err.to_string()),
        }
    }
}

/// Whether a serial error text says the port is held by someone else
///
/// serialport reports a busy port as `NoDevice` on both Windows
/// (`ERROR_ACCESS_DENIED`) and Linux (`EBUSY`, failed exclusive lock).
pub(crate) fn describes_busy_port(description: &str) -> bool {
    let text = description.to_ascii_lowercase();
    ["busy", "lock", "access is denied", "in use"]
        .iter()
        .any(|needle| text.contains(needle))
}

impl From<tokio_serial::Error> for TransportError {
    fn from(err: tokio_serial::Error) -> Self {
        use tokio_serial::ErrorKind;
        match err.kind() {
            ErrorKind::InvalidInput => TransportError::InvalidPortName(err.description),
            ErrorKind::NoDevice | ErrorKind::Io(_) if describes_busy_port(&err.description) => {
                TransportError::AccessDenied(err.description)
            }
            ErrorKind::NoDevice => TransportError::Io(err.description),
            ErrorKind::Io(kind) => std::io::Error::new(kind, err.description).into(),
            #[allow(unreachable_patterns)]
            _ => TransportError::Other(err.description),
        }
    }
}

impl From<tokio_modbus::Error> for TransportError {
    fn from(err: tokio_modbus::Error) -> Self {
        match err {
            tokio_modbus::Error::Transport(io) => io.into(),
            other => TransportError::Other(other.to_string()),
        }
    }
}

/// Fixed serial line parameters for the analog input module
///
/// Parity None, one stop bit, eight data bits and unit id 1 are fixed;
/// only the port, baud rate and timeouts vary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    pub port: String,
    pub baud_rate: u32,
    pub unit_id: u8,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl SerialSettings {
    pub fn new(port: impl Into<String>, baud_rate: u32) -> Self {
        let defaults = SerialConfig::default();
        Self {
            port: port.into(),
            baud_rate,
            unit_id: DEVICE_UNIT_ID,
            connect_timeout: defaults.connect_timeout(),
            read_timeout: defaults.read_timeout(),
        }
    }

    /// Settings for `port`/`baud_rate` using the timeouts from `config`
    pub fn from_config(config: &SerialConfig, port: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            unit_id: DEVICE_UNIT_ID,
            connect_timeout: config.connect_timeout(),
            read_timeout: config.read_timeout(),
        }
    }

    /// Reject port identifiers the serial layer cannot open
    pub fn validate_port(&self) -> Result<(), TransportError> {
        let port = self.port.trim();
        if port.is_empty() {
            return Err(TransportError::InvalidPortName(
                "port name is empty".to_string(),
            ));
        }
        if port.len() != self.port.len() || port.chars().any(|c| c.is_control()) {
            return Err(TransportError::InvalidPortName(format!(
                "'{}' is not a valid port name",
                self.port.escape_debug()
            )));
        }
        Ok(())
    }
}

/// Unified interface for Modbus transport clients
///
/// Implementations must be `Send` so the connection manager can live on the
/// acquisition worker thread. Every blocking call is bounded by the timeouts
/// in [`SerialSettings`].
#[cfg_attr(test, mockall::automock)]
pub trait ModbusTransport: Send {
    /// Open the serial port
    fn open(&mut self) -> Result<(), TransportError>;

    /// Close the serial port
    fn close(&mut self) -> Result<(), TransportError>;

    /// Check whether the port is open
    fn is_open(&self) -> bool;

    /// Read `count` holding registers starting at zero-based `offset`
    fn read_holding_registers(&mut self, offset: u16, count: u16)
        -> Result<Vec<u16>, TransportError>;
}

/// Creates transport handles on connect
pub trait TransportFactory: Send {
    fn create(&self, settings: &SerialSettings) -> Box<dyn ModbusTransport>;
}

impl<F> TransportFactory for F
where
    F: Fn(&SerialSettings) -> Box<dyn ModbusTransport> + Send,
{
    fn create(&self, settings: &SerialSettings) -> Box<dyn ModbusTransport> {
        self(settings)
    }
}
