//! Backend module for Modbus acquisition
//!
//! This module handles all serial communication in a separate thread to keep
//! the UI responsive. It uses crossbeam channels for thread-safe communication
//! with the frontend.
//!
//! # Architecture
//!
//! The backend runs in a separate thread from the UI, communicating via channels:
//!
//! - [`BackendCommand`] - Messages sent from UI to backend (connect, sample, read, etc.)
//! - [`BackendMessage`] - Messages sent from backend to UI (readings, status, failures)
//! - [`FrontendHandle`] - UI-side handle for sending commands and receiving messages
//! - [`PanelBackend`] - Main backend entry point run on the worker thread
//!
//! # Components
//!
//! - [`ConnectionManager`] - Owns the transport handle and the connection state
//! - [`AcquisitionLoop`] - Produces readings and feeds the sample history
//! - [`RtuTransport`] - Modbus RTU client over a serial port
//! - [`MockDevice`] - Scripted device for tests without hardware
//! - [`classify`] - Reduces transport failures to operator-facing categories
//!
//! # Example
//!
//! ```ignore
//! use modbus_ai_panel::backend::PanelBackend;
//! use modbus_ai_panel::config::AppConfig;
//!
//! let (backend, frontend) = PanelBackend::new(AppConfig::default());
//! std::thread::spawn(move || backend.run());
//!
//! frontend.connect("COM3".to_string(), 9600);
//! frontend.start_sampling();
//!
//! for msg in frontend.drain() {
//!     if let BackendMessage::Reading(reading) = msg {
//!         println!("{:.3} V", reading.value);
//!     }
//! }
//! ```

pub mod acquisition;
pub mod classifier;
pub mod connection;
pub mod history;
pub mod mock_transport;
pub mod rtu_transport;
pub mod signal;
pub mod transport;
pub mod worker;

pub use acquisition::AcquisitionLoop;
pub use classifier::{classify, ClassifiedFailure, FailureCategory};
pub use connection::{ChannelRead, ConnectionManager};
pub use history::{SampleHistory, HISTORY_CAPACITY};
pub use mock_transport::{MockDevice, MockTransport};
pub use rtu_transport::{list_ports, RtuTransport, RtuTransportFactory};
pub use signal::{to_voltage, SignalEmulator};
pub use transport::{ModbusTransport, SerialSettings, TransportError, TransportFactory};
pub use worker::BackendWorker;

use crate::config::AppConfig;
use crate::types::{AcquisitionStats, ConnectionState, Mode, Reading};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Message sent from the UI to the backend
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCommand {
    /// Open the serial port (or enter emulated connection)
    Connect {
        /// Port identifier
        port: String,
        /// Baud rate
        baud: u32,
    },
    /// Close the serial port
    Disconnect,
    /// Switch between live and emulated acquisition
    SetMode(Mode),
    /// Select the analog input channel (1..=8)
    SetChannel(u8),
    /// Start the periodic timer
    StartSampling,
    /// Stop the periodic timer
    StopSampling,
    /// Take one manual reading
    ReadNow,
    /// Clear the sample history and statistics
    ClearHistory,
    /// Request port list refresh
    RefreshPorts,
    /// Request current statistics
    RequestStats,
    /// Shutdown the backend
    Shutdown,
}

/// Operation that produced a failure, used as the error title
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOperation {
    Connect,
    PeriodicRead,
    ManualRead,
}

impl FailureOperation {
    pub fn title(&self) -> &'static str {
        match self {
            FailureOperation::Connect => "Connection error",
            FailureOperation::PeriodicRead => "Read error",
            FailureOperation::ManualRead => "Manual read error",
        }
    }
}

impl std::fmt::Display for FailureOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// Message sent from the backend to the UI
#[derive(Debug, Clone)]
pub enum BackendMessage {
    /// Connection state or mode changed
    Status { state: ConnectionState, mode: Mode },
    /// New reading, periodic or manual
    Reading(Reading),
    /// History snapshot after a periodic tick or a clear
    History(Vec<f64>),
    /// Classified failure of a connect or read
    Failure {
        operation: FailureOperation,
        failure: ClassifiedFailure,
    },
    /// Port list update (response to RefreshPorts)
    PortList(Vec<String>),
    /// Statistics update
    Stats(AcquisitionStats),
    /// Periodic timer started or stopped
    SamplingChanged(bool),
    /// Selected channel changed
    ChannelChanged(u8),
    /// Backend is shutting down
    Shutdown,
}

/// UI-side end of the backend channels
pub struct FrontendHandle {
    /// Receiver for backend messages
    pub receiver: Receiver<BackendMessage>,
    /// Sender for commands to the backend
    pub command_sender: Sender<BackendCommand>,
}

impl FrontendHandle {
    /// Try to receive a message without blocking
    pub fn try_recv(&self) -> Option<BackendMessage> {
        self.receiver.try_recv().ok()
    }

    /// Receive all pending messages
    pub fn drain(&self) -> Vec<BackendMessage> {
        self.receiver.try_iter().collect()
    }

    /// Send a command to the backend
    pub fn send_command(&self, cmd: BackendCommand) -> bool {
        self.command_sender.send(cmd).is_ok()
    }

    pub fn connect(&self, port: String, baud: u32) {
        let _ = self
            .command_sender
            .send(BackendCommand::Connect { port, baud });
    }

    pub fn disconnect(&self) {
        let _ = self.command_sender.send(BackendCommand::Disconnect);
    }

    pub fn set_mode(&self, mode: Mode) {
        let _ = self.command_sender.send(BackendCommand::SetMode(mode));
    }

    pub fn set_channel(&self, channel: u8) {
        let _ = self.command_sender.send(BackendCommand::SetChannel(channel));
    }

    pub fn start_sampling(&self) {
        let _ = self.command_sender.send(BackendCommand::StartSampling);
    }

    pub fn stop_sampling(&self) {
        let _ = self.command_sender.send(BackendCommand::StopSampling);
    }

    pub fn read_now(&self) {
        let _ = self.command_sender.send(BackendCommand::ReadNow);
    }

    pub fn clear_history(&self) {
        let _ = self.command_sender.send(BackendCommand::ClearHistory);
    }

    pub fn refresh_ports(&self) {
        let _ = self.command_sender.send(BackendCommand::RefreshPorts);
    }

    pub fn request_stats(&self) {
        let _ = self.command_sender.send(BackendCommand::RequestStats);
    }

    /// Request shutdown
    pub fn shutdown(&self) {
        let _ = self.command_sender.send(BackendCommand::Shutdown);
    }
}

/// The acquisition backend that runs in a separate thread
pub struct PanelBackend {
    config: AppConfig,
    factory: Box<dyn TransportFactory>,
    command_receiver: Receiver<BackendCommand>,
    message_sender: Sender<BackendMessage>,
    running: Arc<AtomicBool>,
}

impl PanelBackend {
    /// Create a backend talking to real serial ports
    pub fn new(config: AppConfig) -> (Self, FrontendHandle) {
        Self::with_factory(config, Box::new(RtuTransportFactory))
    }

    /// Create a backend using a custom transport factory
    pub fn with_factory(
        config: AppConfig,
        factory: Box<dyn TransportFactory>,
    ) -> (Self, FrontendHandle) {
        let (cmd_tx, cmd_rx) = bounded(256);
        // Bounded for backpressure; at 5 Hz this is minutes of readings
        let (msg_tx, msg_rx) = bounded(4096);

        let backend = Self {
            config,
            factory,
            command_receiver: cmd_rx,
            message_sender: msg_tx,
            running: Arc::new(AtomicBool::new(true)),
        };

        let frontend = FrontendHandle {
            receiver: msg_rx,
            command_sender: cmd_tx,
        };

        (backend, frontend)
    }

    /// Run the backend loop
    pub fn run(self) {
        let mut worker = BackendWorker::new(
            self.config,
            self.factory,
            self.command_receiver,
            self.message_sender,
            self.running,
        );
        worker.run();
    }

    /// Get a handle to stop the backend
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    #[cfg(test)]
    pub(crate) fn commands_for_test(&self) -> &Receiver<BackendCommand> {
        &self.command_receiver
    }

    #[cfg(test)]
    pub(crate) fn messages_for_test(&self) -> &Sender<BackendMessage> {
        &self.message_sender
    }
}
