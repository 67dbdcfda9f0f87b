//! Mock construction helpers

use modbus_ai_panel::backend::{
    AcquisitionLoop, BackendMessage, ConnectionManager, FrontendHandle, MockDevice, PanelBackend,
    SignalEmulator,
};
use modbus_ai_panel::config::AppConfig;
use modbus_ai_panel::types::Mode;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Create a device with the given `(offset, raw)` register values
pub fn device_with_registers(registers: &[(u16, u16)]) -> MockDevice {
    let device = MockDevice::new();
    for &(offset, raw) in registers {
        device.set_register(offset, raw);
    }
    device
}

/// Acquisition loop in live mode talking to `device`
pub fn live_loop(device: &MockDevice, config: &AppConfig) -> AcquisitionLoop {
    let connection = ConnectionManager::new(Box::new(device.factory()));
    AcquisitionLoop::new(connection, &config.acquisition)
}

/// Acquisition loop in emulated mode with a seeded emulator
pub fn emulated_loop(seed: u64) -> AcquisitionLoop {
    let connection =
        ConnectionManager::with_mode(Box::new(MockDevice::new().factory()), Mode::Emulated);
    AcquisitionLoop::new(connection, &AppConfig::default().acquisition)
        .with_emulator(SignalEmulator::with_seed(seed))
}

/// Spawn a backend thread using `device` for every connection
pub fn spawn_backend(config: AppConfig, device: &MockDevice) -> (JoinHandle<()>, FrontendHandle) {
    let (backend, frontend) = PanelBackend::with_factory(config, Box::new(device.factory()));
    let handle = std::thread::spawn(move || backend.run());
    (handle, frontend)
}

/// Collect messages until `done` matches one or `timeout` elapses
pub fn wait_for<F>(frontend: &FrontendHandle, timeout: Duration, mut done: F) -> Vec<BackendMessage>
where
    F: FnMut(&BackendMessage) -> bool,
{
    let deadline = Instant::now() + timeout;
    let mut messages = Vec::new();
    while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
        match frontend.receiver.recv_timeout(remaining) {
            Ok(msg) => {
                let finished = done(&msg);
                messages.push(msg);
                if finished {
                    break;
                }
            }
            Err(_) => break,
        }
    }
    messages
}
