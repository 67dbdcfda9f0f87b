//! Core data types for the operator panel
//!
//! This module contains the fundamental data structures shared between the
//! acquisition backend and the frontend:
//!
//! - [`ConnectionState`] - Connection lifecycle held by the connection manager
//! - [`Mode`] - Live device or local signal emulation
//! - [`Channel`] - Validated analog input selector (1..=8)
//! - [`Reading`] - One immutable acquisition result
//! - [`StatusIndicator`] - The four state/mode combinations shown to the operator
//! - [`AcquisitionStats`] - Running counters for the status bar

use crate::backend::classifier::ClassifiedFailure;
use crate::error::{PanelError, Result};
use std::time::Duration;

/// First holding register of the analog input module (channel 1)
pub const BASE_REGISTER: u16 = 40001;

/// Number of analog input channels exposed by the module
pub const CHANNEL_COUNT: u8 = 8;

/// Connection lifecycle of the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No transport handle exists
    #[default]
    Disconnected,
    /// A transport handle exists and is being opened
    Connecting,
    /// Connected and ready (live) or emulation enabled
    Connected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "Disconnected"),
            ConnectionState::Connecting => write!(f, "Connecting..."),
            ConnectionState::Connected => write!(f, "Connected"),
        }
    }
}

/// Data source consulted by the acquisition loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Read the selected channel from the field device
    #[default]
    Live,
    /// Synthesize readings locally, no transport involved
    Emulated,
}

impl Mode {
    /// Build a mode from the emulation checkbox state
    pub fn from_emulation(enabled: bool) -> Self {
        if enabled {
            Mode::Emulated
        } else {
            Mode::Live
        }
    }

    pub fn is_emulated(&self) -> bool {
        matches!(self, Mode::Emulated)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Live => write!(f, "Live"),
            Mode::Emulated => write!(f, "Emulated"),
        }
    }
}

/// Analog input channel selector
///
/// Channel `n` maps to holding register `40000 + n`, which is read at
/// zero-based offset `n - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Channel(u8);

impl Channel {
    /// Create a channel, rejecting values outside 1..=8
    pub fn new(number: u8) -> Result<Self> {
        if (1..=CHANNEL_COUNT).contains(&number) {
            Ok(Self(number))
        } else {
            Err(PanelError::InvalidChannel(number))
        }
    }

    /// Channel number as shown to the operator
    pub fn number(&self) -> u8 {
        self.0
    }

    /// Holding register address in Modbus notation (40001..=40008)
    pub fn register_address(&self) -> u16 {
        BASE_REGISTER + u16::from(self.0) - 1
    }

    /// Zero-based offset passed to the register read
    pub fn register_offset(&self) -> u16 {
        self.register_address() - BASE_REGISTER
    }

    /// All selectable channels in order
    pub fn all() -> impl Iterator<Item = Channel> {
        (1..=CHANNEL_COUNT).map(Channel)
    }
}

impl Default for Channel {
    fn default() -> Self {
        Self(1)
    }
}

impl TryFrom<u8> for Channel {
    type Error = PanelError;

    fn try_from(value: u8) -> Result<Self> {
        Channel::new(value)
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AI{} ({})", self.0, self.register_address())
    }
}

/// Where the value of a [`Reading`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingSource {
    /// Converted from a holding register
    Device,
    /// Produced by the signal emulator
    Emulator,
    /// Live mode without an open transport; the value is 0.0 and no error is raised
    NotConnected,
}

/// What triggered an acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadTrigger {
    /// Fixed-interval timer; feeds the sample history
    Periodic,
    /// Operator "read now"; never touches the history
    Manual,
}

/// A single acquisition result
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Engineering value in volts (0.0 on failure or when not connected)
    pub value: f64,
    /// Monotonic sequence number across all triggers
    pub sequence: u64,
    /// Time since the acquisition loop was created
    pub timestamp: Duration,
    /// Wall-clock time of the acquisition, for display
    pub taken_at: chrono::DateTime<chrono::Local>,
    pub source: ReadingSource,
    pub trigger: ReadTrigger,
    /// Classified transport failure, if the read failed
    pub failure: Option<ClassifiedFailure>,
}

impl Reading {
    /// True unless a transport failure was classified for this reading
    pub fn ok(&self) -> bool {
        self.failure.is_none()
    }

    /// Value formatted the way the panel displays it
    pub fn display_value(&self, decimals: usize) -> String {
        format!("{:.*}", decimals, self.value)
    }
}

/// Status indicator text: connection state and mode combined
///
/// The indicator reflects state and mode only, never the latest read outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusIndicator {
    pub state: ConnectionState,
    pub mode: Mode,
}

impl StatusIndicator {
    pub fn new(state: ConnectionState, mode: Mode) -> Self {
        Self { state, mode }
    }
}

impl std::fmt::Display for StatusIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.state, self.mode) {
            (state, Mode::Live) => write!(f, "{}", state),
            (ConnectionState::Connecting, Mode::Emulated) => write!(f, "Connecting..."),
            (state, Mode::Emulated) => write!(f, "{} (emulation)", state),
        }
    }
}

/// Statistics about the acquisition
#[derive(Debug, Clone, Default)]
pub struct AcquisitionStats {
    /// Number of readings with a value from the device or the emulator
    pub successful_reads: u64,
    /// Number of readings carrying a classified failure
    pub failed_reads: u64,
    /// Number of live readings taken without an open transport
    pub no_data_reads: u64,
    /// Duration of the last acquisition in microseconds
    pub last_read_time_us: u64,
    /// Sum of all acquisition durations, for the average
    pub total_read_time_us: u64,
}

impl AcquisitionStats {
    /// Record the outcome of one acquisition
    pub fn record(&mut self, reading: &Reading, elapsed_us: u64) {
        match (reading.ok(), reading.source) {
            (false, _) => self.failed_reads += 1,
            (true, ReadingSource::NotConnected) => self.no_data_reads += 1,
            (true, _) => self.successful_reads += 1,
        }
        self.last_read_time_us = elapsed_us;
        self.total_read_time_us += elapsed_us;
    }

    pub fn total_reads(&self) -> u64 {
        self.successful_reads + self.failed_reads + self.no_data_reads
    }

    /// Average acquisition time in microseconds
    pub fn avg_read_time_us(&self) -> f64 {
        let total = self.total_reads();
        if total == 0 {
            0.0
        } else {
            self.total_read_time_us as f64 / total as f64
        }
    }

    /// Calculate the success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        let attempted = self.successful_reads + self.failed_reads;
        if attempted == 0 {
            100.0
        } else {
            (self.successful_reads as f64 / attempted as f64) * 100.0
        }
    }
}
