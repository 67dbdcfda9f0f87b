//! Mock Modbus Transport for Testing
//!
//! This module provides a simulated analog input module that can be used to
//! exercise the connection manager and the acquisition loop without a serial
//! adapter. It keeps eight holding registers in memory and can be scripted to
//! fail.
//!
//! # Features
//!
//! - **Register bank**: Eight holding registers at offsets 0..=7
//! - **Request log**: Every read records its `(offset, count)`
//! - **Failure injection**: Open, read (by read number) and close failures
//! - **Handle accounting**: Counts transports that are currently open
//!
//! # Example
//!
//! ```ignore
//! use modbus_ai_panel::backend::mock_transport::MockDevice;
//! use modbus_ai_panel::backend::transport::TransportError;
//!
//! let device = MockDevice::new();
//! device.set_register(2, 32768);
//! device.fail_read_number(10, TransportError::Io("cable unplugged".into()));
//!
//! let mut manager = ConnectionManager::new(Box::new(device.factory()));
//! manager.connect(&SerialSettings::new("COM9", 9600))?;
//! assert_eq!(device.read_log()[0], (2, 1));
//! ```

use super::transport::{ModbusTransport, SerialSettings, TransportError, TransportFactory};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Number of holding registers exposed by the simulated module
pub const MOCK_REGISTER_COUNT: usize = 8;

#[derive(Debug, Default)]
struct MockDeviceState {
    registers: [u16; MOCK_REGISTER_COUNT],
    next_open_error: Option<TransportError>,
    close_error: Option<TransportError>,
    /// Read failures keyed by 1-based read number
    read_errors: HashMap<usize, TransportError>,
    next_read_error: Option<TransportError>,
    read_log: Vec<(u16, u16)>,
    read_delay: Duration,
    open_handles: usize,
    opens: usize,
    closes: usize,
    last_settings: Option<SerialSettings>,
}

/// Shared handle to a simulated analog input module
///
/// Clones share the same device; transports created by [`MockDevice::factory`]
/// talk to it.
#[derive(Debug, Clone, Default)]
pub struct MockDevice {
    state: Arc<Mutex<MockDeviceState>>,
}

impl MockDevice {
    /// Create a device with all registers at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the simulated read delay
    pub fn with_read_delay(self, delay: Duration) -> Self {
        self.state.lock().read_delay = delay;
        self
    }

    /// Set a holding register by zero-based offset
    pub fn set_register(&self, offset: u16, value: u16) {
        if let Some(slot) = self.state.lock().registers.get_mut(usize::from(offset)) {
            *slot = value;
        }
    }

    /// Make the next `open()` fail
    pub fn fail_next_open(&self, error: TransportError) {
        self.state.lock().next_open_error = Some(error);
    }

    /// Make every `close()` fail
    pub fn fail_close(&self, error: TransportError) {
        self.state.lock().close_error = Some(error);
    }

    /// Make the `n`-th read (1-based, counted over the device lifetime) fail
    pub fn fail_read_number(&self, n: usize, error: TransportError) {
        self.state.lock().read_errors.insert(n, error);
    }

    /// Make the next read fail
    pub fn fail_next_read(&self, error: TransportError) {
        self.state.lock().next_read_error = Some(error);
    }

    /// All `(offset, count)` read requests received so far
    pub fn read_log(&self) -> Vec<(u16, u16)> {
        self.state.lock().read_log.clone()
    }

    /// Number of transports currently open against this device
    pub fn open_handles(&self) -> usize {
        self.state.lock().open_handles
    }

    /// Number of successful opens
    pub fn open_count(&self) -> usize {
        self.state.lock().opens
    }

    /// Number of close calls
    pub fn close_count(&self) -> usize {
        self.state.lock().closes
    }

    /// Settings passed to the most recently created transport
    pub fn last_settings(&self) -> Option<SerialSettings> {
        self.state.lock().last_settings.clone()
    }

    /// Factory creating transports bound to this device
    pub fn factory(&self) -> impl TransportFactory + Clone {
        let device = self.clone();
        move |settings: &SerialSettings| -> Box<dyn ModbusTransport> {
            Box::new(device.transport(settings))
        }
    }

    /// Create a closed transport bound to this device
    pub fn transport(&self, settings: &SerialSettings) -> MockTransport {
        self.state.lock().last_settings = Some(settings.clone());
        MockTransport {
            state: self.state.clone(),
            open: false,
        }
    }
}

/// Transport handle talking to a [`MockDevice`]
#[derive(Debug)]
pub struct MockTransport {
    state: Arc<Mutex<MockDeviceState>>,
    open: bool,
}

impl ModbusTransport for MockTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        if let Some(err) = state.next_open_error.take() {
            tracing::debug!("Mock transport open failed: {}", err);
            return Err(err);
        }
        if !self.open {
            self.open = true;
            state.open_handles += 1;
            state.opens += 1;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.closes += 1;
        if self.open {
            self.open = false;
            state.open_handles -= 1;
        }
        match &state.close_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn read_holding_registers(
        &mut self,
        offset: u16,
        count: u16,
    ) -> Result<Vec<u16>, TransportError> {
        if !self.open {
            return Err(TransportError::Io("port is not open".to_string()));
        }

        let delay = self.state.lock().read_delay;
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        let mut state = self.state.lock();
        state.read_log.push((offset, count));
        let read_number = state.read_log.len();

        if let Some(err) = state.next_read_error.take() {
            return Err(err);
        }
        if let Some(err) = state.read_errors.remove(&read_number) {
            return Err(err);
        }

        let start = usize::from(offset);
        let end = start + usize::from(count);
        state
            .registers
            .get(start..end)
            .map(|regs| regs.to_vec())
            .ok_or_else(|| TransportError::Other("Modbus exception: illegal data address".to_string()))
    }
}

impl Drop for MockTransport {
    fn drop(&mut self) {
        if self.open {
            self.state.lock().open_handles -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> SerialSettings {
        SerialSettings::new("COM1", 9600)
    }

    #[test]
    fn test_open_close_accounting() {
        let device = MockDevice::new();
        let mut transport = device.transport(&settings());
        assert!(!transport.is_open());

        transport.open().unwrap();
        assert!(transport.is_open());
        assert_eq!(device.open_handles(), 1);

        transport.close().unwrap();
        assert!(!transport.is_open());
        assert_eq!(device.open_handles(), 0);
        assert_eq!(device.close_count(), 1);
    }

    #[test]
    fn test_drop_releases_handle() {
        let device = MockDevice::new();
        {
            let mut transport = device.transport(&settings());
            transport.open().unwrap();
            assert_eq!(device.open_handles(), 1);
        }
        assert_eq!(device.open_handles(), 0);
    }

    #[test]
    fn test_register_read_and_log() {
        let device = MockDevice::new();
        device.set_register(2, 1234);
        let mut transport = device.transport(&settings());
        transport.open().unwrap();

        assert_eq!(transport.read_holding_registers(2, 1).unwrap(), vec![1234]);
        assert_eq!(device.read_log(), vec![(2, 1)]);
        assert!(transport.read_holding_registers(8, 1).is_err());
    }

    #[test]
    fn test_scripted_failures() {
        let device = MockDevice::new();
        device.fail_next_open(TransportError::Timeout("open".into()));
        device.fail_read_number(2, TransportError::Io("cable".into()));

        let mut transport = device.transport(&settings());
        assert!(transport.open().is_err());
        assert_eq!(device.open_handles(), 0);
        transport.open().unwrap();

        assert!(transport.read_holding_registers(0, 1).is_ok());
        assert_eq!(
            transport.read_holding_registers(0, 1),
            Err(TransportError::Io("cable".into()))
        );
        assert!(transport.read_holding_registers(0, 1).is_ok());
    }

    #[test]
    fn test_read_requires_open() {
        let device = MockDevice::new();
        let mut transport = device.transport(&settings());
        assert!(matches!(
            transport.read_holding_registers(0, 1),
            Err(TransportError::Io(_))
        ));
        assert!(device.read_log().is_empty());
    }
}
