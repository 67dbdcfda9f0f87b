//! Frontend state and action types
//!
//! [`PanelState`] is the last snapshot received from the backend plus the
//! operator's pending selections. Widgets read it and return [`AppAction`]s
//! instead of mutating it directly; the app turns actions into backend
//! commands.

use crate::backend::{BackendMessage, ClassifiedFailure, FailureOperation};
use crate::config::AppConfig;
use crate::types::{AcquisitionStats, ConnectionState, Mode, Reading, StatusIndicator};

/// Actions that the panel widgets can emit
#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    /// Connect using the selected port and baud rate
    Connect,
    Disconnect,
    /// Toggle emulation mode
    SetEmulation(bool),
    /// Select an analog input channel (1..=8)
    SetChannel(u8),
    SelectPort(String),
    SetBaudRate(u32),
    StartSampling,
    StopSampling,
    ReadNow,
    ClearHistory,
    RefreshPorts,
}

/// Error label contents
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorDisplay {
    /// Operation that failed, e.g. "Connection error"
    pub title: &'static str,
    pub failure: ClassifiedFailure,
}

impl ErrorDisplay {
    /// "Error: {message}" followed by the low-level detail
    pub fn text(&self) -> String {
        self.failure.display_text()
    }
}

/// Everything the panel renders
#[derive(Debug, Clone)]
pub struct PanelState {
    pub connection_state: ConnectionState,
    pub mode: Mode,
    pub available_ports: Vec<String>,
    pub selected_port: String,
    pub baud_rate: u32,
    pub channel: u8,
    pub sampling: bool,
    pub last_reading: Option<Reading>,
    pub history: Vec<f64>,
    pub stats: AcquisitionStats,
    pub error: Option<ErrorDisplay>,
    pub value_decimals: usize,
    /// False once the backend reported shutdown
    pub backend_alive: bool,
}

impl PanelState {
    /// Initial state mirroring the startup configuration
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            connection_state: ConnectionState::Disconnected,
            mode: Mode::from_emulation(config.emulation.enabled),
            available_ports: Vec::new(),
            selected_port: config.serial.port.clone(),
            baud_rate: config.serial.baud_rate,
            channel: config.channel().number(),
            sampling: false,
            last_reading: None,
            history: Vec::new(),
            stats: AcquisitionStats::default(),
            error: None,
            value_decimals: config.ui.value_decimals,
            backend_alive: true,
        }
    }

    pub fn status(&self) -> StatusIndicator {
        StatusIndicator::new(self.connection_state, self.mode)
    }

    pub fn is_connected(&self) -> bool {
        self.connection_state == ConnectionState::Connected
    }

    /// Current value label; "---" until the first reading
    pub fn value_text(&self) -> String {
        match &self.last_reading {
            Some(reading) => reading.display_value(self.value_decimals),
            None => "---".to_string(),
        }
    }

    pub fn set_error(&mut self, operation: FailureOperation, failure: ClassifiedFailure) {
        self.error = Some(ErrorDisplay {
            title: operation.title(),
            failure,
        });
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Apply one backend message
    pub fn apply(&mut self, msg: BackendMessage) {
        match msg {
            BackendMessage::Status { state, mode } => {
                self.connection_state = state;
                self.mode = mode;
            }
            BackendMessage::Reading(reading) => {
                if reading.ok() {
                    self.clear_error();
                }
                self.last_reading = Some(reading);
            }
            BackendMessage::History(history) => {
                self.history = history;
            }
            BackendMessage::Failure { operation, failure } => {
                self.set_error(operation, failure);
            }
            BackendMessage::PortList(ports) => {
                if !ports.contains(&self.selected_port) {
                    self.selected_port = ports.first().cloned().unwrap_or_default();
                }
                self.available_ports = ports;
            }
            BackendMessage::Stats(stats) => {
                self.stats = stats;
            }
            BackendMessage::SamplingChanged(on) => {
                self.sampling = on;
            }
            BackendMessage::ChannelChanged(channel) => {
                self.channel = channel;
            }
            BackendMessage::Shutdown => {
                self.backend_alive = false;
                self.sampling = false;
            }
        }
    }
}
