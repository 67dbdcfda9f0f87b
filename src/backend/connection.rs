//! Connection manager
//!
//! Owns the transport handle and the connection state machine:
//!
//! ```text
//! Disconnected --connect--> Connecting --ok------> Connected
//!                           Connecting --failure-> Disconnected
//! Connected --disconnect--> Disconnected
//! ```
//!
//! In emulated mode `connect` succeeds without creating a transport. Mode
//! and state are orthogonal: changing the mode never changes the state.

use super::classifier::{classify, ClassifiedFailure};
use super::transport::{ModbusTransport, SerialSettings, TransportError, TransportFactory};
use crate::types::{Channel, ConnectionState, Mode, StatusIndicator};

/// Outcome of a successful channel read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRead {
    /// Raw holding register value
    Raw(u16),
    /// No open transport; not an error, the value reads as zero
    NotConnected,
}

/// Holds the single transport handle and the connection state
pub struct ConnectionManager {
    factory: Box<dyn TransportFactory>,
    transport: Option<Box<dyn ModbusTransport>>,
    state: ConnectionState,
    mode: Mode,
}

impl ConnectionManager {
    /// Create a disconnected manager in live mode
    pub fn new(factory: Box<dyn TransportFactory>) -> Self {
        Self {
            factory,
            transport: None,
            state: ConnectionState::Disconnected,
            mode: Mode::Live,
        }
    }

    /// Create a disconnected manager in the given mode
    pub fn with_mode(factory: Box<dyn TransportFactory>, mode: Mode) -> Self {
        let mut manager = Self::new(factory);
        manager.mode = mode;
        manager
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// True while a transport handle exists and reports open
    pub fn has_open_handle(&self) -> bool {
        self.transport.as_ref().is_some_and(|t| t.is_open())
    }

    /// Status indicator combining state and mode
    pub fn status(&self) -> StatusIndicator {
        StatusIndicator::new(self.state, self.mode)
    }

    /// Switch between live and emulated acquisition
    ///
    /// The connection state and any open handle are left untouched.
    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            tracing::info!("Mode changed: {} -> {}", self.mode, mode);
            self.mode = mode;
        }
    }

    /// Connect using `settings`
    ///
    /// An existing handle is closed first. On failure the partially opened
    /// handle is torn down, the state returns to `Disconnected` and the
    /// classified failure is returned.
    pub fn connect(&mut self, settings: &SerialSettings) -> Result<(), ClassifiedFailure> {
        self.release_transport();

        if self.mode.is_emulated() {
            self.state = ConnectionState::Connected;
            tracing::info!("Connected (emulation)");
            return Ok(());
        }

        self.state = ConnectionState::Connecting;
        tracing::info!(
            "Connecting to {} at {} baud (unit {})",
            settings.port,
            settings.baud_rate,
            settings.unit_id
        );

        let mut transport = self.factory.create(settings);
        match transport.open() {
            Ok(()) => {
                self.transport = Some(transport);
                self.state = ConnectionState::Connected;
                tracing::info!("Connected to {}", settings.port);
                Ok(())
            }
            Err(err) => {
                if let Err(close_err) = transport.close() {
                    tracing::debug!("Ignoring close failure after failed open: {}", close_err);
                }
                drop(transport);
                self.state = ConnectionState::Disconnected;

                let failure = classify(&err);
                tracing::warn!("Connect to {} failed: {}", settings.port, failure);
                Err(failure)
            }
        }
    }

    /// Close the transport, if any, and enter `Disconnected`
    ///
    /// Close failures are swallowed. Calling this repeatedly is harmless.
    pub fn disconnect(&mut self) {
        let had_connection = self.state != ConnectionState::Disconnected;
        self.release_transport();
        self.state = ConnectionState::Disconnected;
        if had_connection {
            tracing::info!("Disconnected");
        }
    }

    /// Read the holding register of `channel`
    ///
    /// Returns [`ChannelRead::NotConnected`] when the manager is not
    /// connected or holds no open handle. A read failure is classified and
    /// returned; it never changes the connection state.
    pub fn read_channel(&mut self, channel: Channel) -> Result<ChannelRead, ClassifiedFailure> {
        if self.state != ConnectionState::Connected {
            return Ok(ChannelRead::NotConnected);
        }
        let Some(transport) = self.transport.as_mut().filter(|t| t.is_open()) else {
            return Ok(ChannelRead::NotConnected);
        };

        let offset = channel.register_offset();
        let result = transport
            .read_holding_registers(offset, 1)
            .and_then(|registers| {
                registers.first().copied().ok_or_else(|| {
                    TransportError::Other(format!("empty response for register {}", offset))
                })
            });

        match result {
            Ok(raw) => {
                tracing::trace!("Read {} = {}", channel, raw);
                Ok(ChannelRead::Raw(raw))
            }
            Err(err) => {
                let failure = classify(&err);
                tracing::warn!("Read of {} failed: {}", channel, failure);
                Err(failure)
            }
        }
    }

    fn release_transport(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            if transport.is_open() {
                if let Err(err) = transport.close() {
                    tracing::debug!("Ignoring close failure: {}", err);
                }
            }
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.release_transport();
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("state", &self.state)
            .field("mode", &self.mode)
            .field("has_transport", &self.transport.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::classifier::FailureCategory;
    use crate::backend::mock_transport::MockDevice;
    use crate::backend::transport::MockModbusTransport;
    use mockall::predicate::eq;
    use parking_lot::Mutex;

    fn factory_with(mock: MockModbusTransport) -> Box<dyn TransportFactory> {
        let slot = Mutex::new(Some(mock));
        Box::new(move |_settings: &SerialSettings| -> Box<dyn ModbusTransport> {
            Box::new(slot.lock().take().unwrap_or_default())
        })
    }

    fn settings() -> SerialSettings {
        SerialSettings::new("COM9", 9600)
    }

    #[test]
    fn test_connect_opens_transport() {
        let mut mock = MockModbusTransport::new();
        mock.expect_open().times(1).returning(|| Ok(()));
        mock.expect_is_open().return_const(true);
        mock.expect_close().times(1).returning(|| Ok(()));

        let mut manager = ConnectionManager::new(factory_with(mock));
        assert!(manager.connect(&settings()).is_ok());
        assert_eq!(manager.state(), ConnectionState::Connected);
        assert!(manager.has_open_handle());
    }

    #[test]
    fn test_connect_timeout_leaves_disconnected() {
        let mut mock = MockModbusTransport::new();
        mock.expect_open()
            .times(1)
            .returning(|| Err(TransportError::Timeout("no response".into())));
        mock.expect_close().returning(|| Ok(()));
        mock.expect_is_open().return_const(false);

        let mut manager = ConnectionManager::new(factory_with(mock));
        let failure = manager.connect(&settings()).unwrap_err();
        assert_eq!(failure.category, FailureCategory::Timeout);
        assert_eq!(failure.message, "Device not responding");
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(!manager.has_open_handle());
    }

    #[test]
    fn test_read_uses_zero_based_offset() {
        let mut mock = MockModbusTransport::new();
        mock.expect_open().returning(|| Ok(()));
        mock.expect_is_open().return_const(true);
        mock.expect_close().returning(|| Ok(()));
        mock.expect_read_holding_registers()
            .with(eq(2), eq(1))
            .times(1)
            .returning(|_, _| Ok(vec![32768]));

        let mut manager = ConnectionManager::new(factory_with(mock));
        manager.connect(&settings()).unwrap();
        let channel = Channel::new(3).unwrap();
        assert_eq!(manager.read_channel(channel), Ok(ChannelRead::Raw(32768)));
    }

    #[test]
    fn test_read_failure_keeps_state() {
        let mut mock = MockModbusTransport::new();
        mock.expect_open().returning(|| Ok(()));
        mock.expect_is_open().return_const(true);
        mock.expect_close().returning(|| Ok(()));
        mock.expect_read_holding_registers()
            .returning(|_, _| Err(TransportError::Io("cable unplugged".into())));

        let mut manager = ConnectionManager::new(factory_with(mock));
        manager.connect(&settings()).unwrap();
        let failure = manager.read_channel(Channel::default()).unwrap_err();
        assert_eq!(failure.category, FailureCategory::IoFailure);
        assert_eq!(failure.detail, "cable unplugged");
        assert_eq!(manager.state(), ConnectionState::Connected);
    }

    #[test]
    fn test_empty_response_is_unknown_failure() {
        let mut mock = MockModbusTransport::new();
        mock.expect_open().returning(|| Ok(()));
        mock.expect_is_open().return_const(true);
        mock.expect_close().returning(|| Ok(()));
        mock.expect_read_holding_registers()
            .returning(|_, _| Ok(Vec::new()));

        let mut manager = ConnectionManager::new(factory_with(mock));
        manager.connect(&settings()).unwrap();
        let failure = manager.read_channel(Channel::default()).unwrap_err();
        assert_eq!(failure.category, FailureCategory::Unknown);
    }

    #[test]
    fn test_read_when_disconnected_is_not_connected() {
        let device = MockDevice::new();
        let mut manager = ConnectionManager::new(Box::new(device.factory()));
        assert_eq!(
            manager.read_channel(Channel::default()),
            Ok(ChannelRead::NotConnected)
        );
        assert!(device.read_log().is_empty());
    }

    #[test]
    fn test_disconnect_is_idempotent_and_swallows_close_errors() {
        let device = MockDevice::new();
        device.fail_close(TransportError::Io("close failed".into()));
        let mut manager = ConnectionManager::new(Box::new(device.factory()));
        manager.connect(&settings()).unwrap();
        assert_eq!(device.open_handles(), 1);

        manager.disconnect();
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert_eq!(device.open_handles(), 0);

        manager.disconnect();
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert_eq!(device.close_count(), 1);
    }

    #[test]
    fn test_reconnect_closes_previous_handle() {
        let device = MockDevice::new();
        let mut manager = ConnectionManager::new(Box::new(device.factory()));
        manager.connect(&settings()).unwrap();
        manager
            .connect(&SerialSettings::new("COM3", 19200))
            .unwrap();

        assert_eq!(device.open_handles(), 1);
        assert_eq!(device.open_count(), 2);
        assert_eq!(device.last_settings().unwrap().baud_rate, 19200);
    }

    #[test]
    fn test_emulated_connect_skips_transport() {
        let device = MockDevice::new();
        let mut manager = ConnectionManager::with_mode(Box::new(device.factory()), Mode::Emulated);
        manager.connect(&SerialSettings::new("", 9600)).unwrap();

        assert_eq!(manager.state(), ConnectionState::Connected);
        assert_eq!(device.open_count(), 0);
        assert!(device.last_settings().is_none());
        assert_eq!(manager.status().to_string(), "Connected (emulation)");
    }

    #[test]
    fn test_mode_switch_keeps_state() {
        let device = MockDevice::new();
        let mut manager = ConnectionManager::new(Box::new(device.factory()));
        manager.connect(&settings()).unwrap();

        manager.set_mode(Mode::Emulated);
        assert_eq!(manager.state(), ConnectionState::Connected);
        assert!(manager.has_open_handle());

        manager.set_mode(Mode::Live);
        assert_eq!(manager.status().to_string(), "Connected");
    }

    #[test]
    fn test_live_after_emulated_connect_reads_not_connected() {
        let device = MockDevice::new();
        let mut manager = ConnectionManager::with_mode(Box::new(device.factory()), Mode::Emulated);
        manager.connect(&settings()).unwrap();
        manager.set_mode(Mode::Live);

        assert!(manager.is_connected());
        assert_eq!(
            manager.read_channel(Channel::default()),
            Ok(ChannelRead::NotConnected)
        );
    }

    #[test]
    fn test_drop_releases_handle() {
        let device = MockDevice::new();
        {
            let mut manager = ConnectionManager::new(Box::new(device.factory()));
            manager.connect(&settings()).unwrap();
            assert_eq!(device.open_handles(), 1);
        }
        assert_eq!(device.open_handles(), 0);
    }
}
