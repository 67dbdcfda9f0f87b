//! Backend Worker Thread Implementation
//!
//! This module contains the main worker loop that runs in a separate thread
//! and owns the [`AcquisitionLoop`]. It communicates with the UI thread
//! through crossbeam channels.
//!
//! # Responsibilities
//!
//! - **Command processing**: Responds to UI commands (connect, start, stop, etc.)
//! - **Periodic sampling**: Runs one tick per interval while sampling is on
//! - **Failure reporting**: Forwards classified failures with their operation
//! - **Statistics tracking**: Sends acquisition statistics periodically
//!
//! # Scheduling
//!
//! The worker blocks on the command channel until the next tick is due
//! (`recv_timeout`). Ticks run one at a time on this thread, so they never
//! overlap. A tick that overruns its slot is not made up: the next one is
//! scheduled one interval from now.

use crate::backend::acquisition::AcquisitionLoop;
use crate::backend::connection::ConnectionManager;
use crate::backend::transport::{SerialSettings, TransportFactory};
use crate::backend::{BackendCommand, BackendMessage, FailureOperation};
use crate::config::AppConfig;
use crate::types::{Channel, ConnectionState, Mode, Reading};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Longest wait on the command channel while idle, so the stop handle is honored
const IDLE_WAIT: Duration = Duration::from_millis(100);

/// Interval between automatic statistics updates while sampling
const STATS_INTERVAL: Duration = Duration::from_millis(1000);

/// The backend worker that runs the sampling loop
pub struct BackendWorker {
    /// Application configuration
    config: AppConfig,
    /// Command receiver from the UI
    command_rx: Receiver<BackendCommand>,
    /// Message sender to the UI
    message_tx: Sender<BackendMessage>,
    /// Running flag
    running: Arc<AtomicBool>,
    acquisition: AcquisitionLoop,
    /// Deadline of the next periodic tick; `None` while sampling is stopped
    next_tick: Option<Instant>,
    tick_interval: Duration,
    /// Last time stats were sent to UI
    last_stats_time: Instant,
    /// Messages dropped because the UI queue was full
    dropped_messages: u64,
}

impl BackendWorker {
    /// Create a new backend worker
    pub fn new(
        config: AppConfig,
        factory: Box<dyn TransportFactory>,
        command_rx: Receiver<BackendCommand>,
        message_tx: Sender<BackendMessage>,
        running: Arc<AtomicBool>,
    ) -> Self {
        let mode = Mode::from_emulation(config.emulation.enabled);
        let connection = ConnectionManager::with_mode(factory, mode);
        let acquisition = AcquisitionLoop::new(connection, &config.acquisition);
        let tick_interval = config.acquisition.tick_interval();

        Self {
            config,
            command_rx,
            message_tx,
            running,
            acquisition,
            next_tick: None,
            tick_interval,
            last_stats_time: Instant::now(),
            dropped_messages: 0,
        }
    }

    /// Run the main worker loop
    pub fn run(&mut self) {
        tracing::info!(
            "Backend worker started ({} ms tick, {}, failed reads: {:?})",
            self.tick_interval.as_millis(),
            self.acquisition.channel(),
            self.acquisition.policy()
        );
        self.send_status();

        while self.running.load(Ordering::SeqCst) {
            self.wait_for_commands();

            if !self.running.load(Ordering::SeqCst) {
                break;
            }

            self.run_due_tick();
        }

        // Cleanup
        self.next_tick = None;
        self.acquisition.connection_mut().disconnect();
        self.send_message(BackendMessage::Shutdown);
        tracing::info!("Backend worker stopped");
    }

    /// Block until a command arrives or the next tick is due, then drain the queue
    fn wait_for_commands(&mut self) {
        let timeout = match self.next_tick {
            Some(deadline) => deadline.saturating_duration_since(Instant::now()),
            None => IDLE_WAIT,
        };

        match self.command_rx.recv_timeout(timeout) {
            Ok(cmd) => {
                self.handle_command(cmd);
                self.process_commands();
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                self.running.store(false, Ordering::SeqCst);
            }
        }
    }

    /// Process pending commands from the UI
    fn process_commands(&mut self) {
        while self.running.load(Ordering::SeqCst) {
            match self.command_rx.try_recv() {
                Ok(cmd) => self.handle_command(cmd),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.running.store(false, Ordering::SeqCst);
                    break;
                }
            }
        }
    }

    /// Handle a single command
    fn handle_command(&mut self, cmd: BackendCommand) {
        match cmd {
            BackendCommand::Connect { port, baud } => {
                self.handle_connect(port, baud);
            }
            BackendCommand::Disconnect => {
                self.handle_disconnect();
            }
            BackendCommand::SetMode(mode) => {
                self.acquisition.connection_mut().set_mode(mode);
                self.send_status();
            }
            BackendCommand::SetChannel(number) => match Channel::new(number) {
                Ok(channel) => {
                    self.acquisition.set_channel(channel);
                    self.send_message(BackendMessage::ChannelChanged(channel.number()));
                }
                Err(e) => {
                    tracing::warn!("Ignoring channel change: {}", e);
                }
            },
            BackendCommand::StartSampling => {
                self.start_sampling();
            }
            BackendCommand::StopSampling => {
                self.stop_sampling();
            }
            BackendCommand::ReadNow => {
                let reading = self.acquisition.read_once();
                self.report_reading(reading, FailureOperation::ManualRead);
            }
            BackendCommand::ClearHistory => {
                self.acquisition.clear();
                self.send_message(BackendMessage::History(Vec::new()));
                self.send_stats();
            }
            BackendCommand::RefreshPorts => {
                self.refresh_ports();
            }
            BackendCommand::RequestStats => {
                self.send_stats();
            }
            BackendCommand::Shutdown => {
                self.running.store(false, Ordering::SeqCst);
            }
        }
    }

    /// Handle connect command
    fn handle_connect(&mut self, port: String, baud: u32) {
        let settings = SerialSettings::from_config(&self.config.serial, port, baud);

        let mode = self.acquisition.connection().mode();
        if !mode.is_emulated() {
            self.send_message(BackendMessage::Status {
                state: ConnectionState::Connecting,
                mode,
            });
        }

        if let Err(failure) = self.acquisition.connection_mut().connect(&settings) {
            tracing::error!("Failed to connect to {}: {}", settings.port, failure);
            self.send_message(BackendMessage::Failure {
                operation: FailureOperation::Connect,
                failure,
            });
        }
        self.send_status();
    }

    /// Handle disconnect command
    fn handle_disconnect(&mut self) {
        self.acquisition.connection_mut().disconnect();
        self.send_status();
    }

    fn start_sampling(&mut self) {
        if self.next_tick.is_none() {
            self.next_tick = Some(Instant::now() + self.tick_interval);
            self.last_stats_time = Instant::now();
            tracing::info!("Started sampling every {} ms", self.tick_interval.as_millis());
        }
        self.send_message(BackendMessage::SamplingChanged(true));
    }

    fn stop_sampling(&mut self) {
        if self.next_tick.take().is_some() {
            tracing::info!("Stopped sampling");
        }
        self.send_message(BackendMessage::SamplingChanged(false));
    }

    /// Run one tick if it is due and schedule the next one
    fn run_due_tick(&mut self) {
        let Some(deadline) = self.next_tick else {
            return;
        };
        if Instant::now() < deadline {
            return;
        }

        let reading = self.acquisition.tick();
        self.report_reading(reading, FailureOperation::PeriodicRead);
        let snapshot = self.acquisition.history().snapshot();
        self.send_message(BackendMessage::History(snapshot));

        let now = Instant::now();
        let next = deadline + self.tick_interval;
        self.next_tick = Some(if next <= now {
            tracing::debug!("Tick overran its slot, rescheduling from now");
            now + self.tick_interval
        } else {
            next
        });

        if self.last_stats_time.elapsed() >= STATS_INTERVAL {
            self.send_stats();
            self.last_stats_time = Instant::now();
        }
    }

    fn report_reading(&mut self, reading: Reading, operation: FailureOperation) {
        if let Some(failure) = reading.failure.clone() {
            self.send_message(BackendMessage::Failure { operation, failure });
        }
        self.send_message(BackendMessage::Reading(reading));
    }

    /// Refresh the port list and send to UI
    fn refresh_ports(&mut self) {
        let ports = crate::backend::list_ports();
        tracing::debug!("Found {} serial port(s)", ports.len());
        self.send_message(BackendMessage::PortList(ports));
    }

    /// Send connection state and mode to UI
    fn send_status(&mut self) {
        let state = self.acquisition.connection().state();
        let mode = self.acquisition.connection().mode();
        self.send_message(BackendMessage::Status { state, mode });
    }

    /// Send statistics to UI
    fn send_stats(&mut self) {
        let stats = self.acquisition.stats().clone();
        self.send_message(BackendMessage::Stats(stats));
    }

    /// Try to send a message, counting it as dropped if the queue is full
    fn send_message(&mut self, msg: BackendMessage) {
        if self.message_tx.try_send(msg).is_err() {
            self.dropped_messages += 1;
            if self.dropped_messages.is_power_of_two() {
                tracing::warn!("UI queue full, {} message(s) dropped", self.dropped_messages);
            }
        }
    }
}
