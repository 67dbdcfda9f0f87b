//! Acquisition loop
//!
//! Produces one [`Reading`] per call. In emulated mode the value comes from
//! the [`SignalEmulator`]; in live mode the selected channel is read through
//! the [`ConnectionManager`] and converted to volts. Failures are classified
//! and attached to the reading, never raised.
//!
//! Periodic ticks feed the [`SampleHistory`]; manual reads share the same
//! acquisition path but leave the history alone.

use super::connection::{ChannelRead, ConnectionManager};
use super::history::SampleHistory;
use super::signal::{to_voltage, SignalEmulator};
use crate::config::{AcquisitionConfig, FailedReadPolicy};
use crate::types::{AcquisitionStats, Channel, ReadTrigger, Reading, ReadingSource};
use std::time::Instant;

/// Orchestrates connection, emulator and history for one panel
#[derive(Debug)]
pub struct AcquisitionLoop {
    connection: ConnectionManager,
    emulator: SignalEmulator,
    history: SampleHistory,
    channel: Channel,
    policy: FailedReadPolicy,
    sequence: u64,
    started: Instant,
    stats: AcquisitionStats,
}

impl AcquisitionLoop {
    /// Create a loop reading through `connection`
    ///
    /// An out-of-range channel in `config` falls back to channel 1.
    pub fn new(connection: ConnectionManager, config: &AcquisitionConfig) -> Self {
        let channel = Channel::new(config.channel).unwrap_or_default();
        Self {
            connection,
            emulator: SignalEmulator::new(),
            history: SampleHistory::new(config.history_capacity),
            channel,
            policy: config.failed_read_policy,
            sequence: 0,
            started: Instant::now(),
            stats: AcquisitionStats::default(),
        }
    }

    /// Replace the signal emulator (e.g. with a seeded one)
    pub fn with_emulator(mut self, emulator: SignalEmulator) -> Self {
        self.emulator = emulator;
        self
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut ConnectionManager {
        &mut self.connection
    }

    pub fn history(&self) -> &SampleHistory {
        &self.history
    }

    pub fn emulator(&self) -> &SignalEmulator {
        &self.emulator
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn set_channel(&mut self, channel: Channel) {
        if self.channel != channel {
            tracing::info!("Channel changed: {} -> {}", self.channel, channel);
            self.channel = channel;
        }
    }

    pub fn policy(&self) -> FailedReadPolicy {
        self.policy
    }

    pub fn stats(&self) -> &AcquisitionStats {
        &self.stats
    }

    /// Number of acquisitions performed so far, both triggers
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Clear the history and statistics
    pub fn clear(&mut self) {
        self.history.clear();
        self.stats = AcquisitionStats::default();
    }

    /// Periodic acquisition: read, then append to the history
    ///
    /// Failed readings are appended as 0.0 under
    /// [`FailedReadPolicy::AppendZero`] and skipped under
    /// [`FailedReadPolicy::SkipFailures`]. Not-connected readings are always
    /// appended.
    pub fn tick(&mut self) -> Reading {
        let reading = self.acquire(ReadTrigger::Periodic);
        if reading.ok() || self.policy == FailedReadPolicy::AppendZero {
            self.history.push(reading.value);
        }
        reading
    }

    /// Manual acquisition; the history is not touched
    pub fn read_once(&mut self) -> Reading {
        self.acquire(ReadTrigger::Manual)
    }

    fn acquire(&mut self, trigger: ReadTrigger) -> Reading {
        let start = Instant::now();

        let (value, source, failure) = if self.connection.mode().is_emulated() {
            (self.emulator.next_value(), ReadingSource::Emulator, None)
        } else {
            match self.connection.read_channel(self.channel) {
                Ok(ChannelRead::Raw(raw)) => (to_voltage(raw), ReadingSource::Device, None),
                Ok(ChannelRead::NotConnected) => (0.0, ReadingSource::NotConnected, None),
                Err(failure) => (0.0, ReadingSource::Device, Some(failure)),
            }
        };

        self.sequence += 1;
        let reading = Reading {
            value,
            sequence: self.sequence,
            timestamp: self.started.elapsed(),
            taken_at: chrono::Local::now(),
            source,
            trigger,
            failure,
        };

        let elapsed_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
        self.stats.record(&reading, elapsed_us);

        tracing::debug!(
            "#{} {:?} {} = {:.3} V ({:?})",
            reading.sequence,
            trigger,
            self.channel,
            reading.value,
            reading.source
        );
        reading
    }
}
