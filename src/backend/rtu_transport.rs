//! Modbus RTU transport over a serial port
//!
//! Wraps a tokio-modbus RTU client behind the blocking [`ModbusTransport`]
//! trait. The transport owns a single-threaded tokio runtime; every request is
//! driven with `block_on` and bounded by `tokio::time::timeout`, so no call
//! can block longer than the configured connect or read timeout.

use super::transport::{ModbusTransport, SerialSettings, TransportError, TransportFactory};
use tokio::runtime::Runtime;
use tokio_modbus::client::Context;
use tokio_modbus::prelude::*;
use tokio_serial::SerialStream;

/// Modbus RTU client bound to one serial port
pub struct RtuTransport {
    settings: SerialSettings,
    runtime: Option<Runtime>,
    context: Option<Context>,
}

impl RtuTransport {
    /// Create a closed transport for the given settings
    pub fn new(settings: SerialSettings) -> Self {
        Self {
            settings,
            runtime: None,
            context: None,
        }
    }

    pub fn settings(&self) -> &SerialSettings {
        &self.settings
    }

    fn serial_builder(&self) -> tokio_serial::SerialPortBuilder {
        tokio_serial::new(&self.settings.port, self.settings.baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .timeout(self.settings.read_timeout)
    }
}

impl ModbusTransport for RtuTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        if self.context.is_some() {
            return Ok(());
        }

        self.settings.validate_port()?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let builder = self.serial_builder();
        let connect_timeout = self.settings.connect_timeout;
        let port_name = self.settings.port.clone();

        // Opening a serial port is a blocking syscall; run it off the runtime
        // thread so the timeout can fire.
        let opened = runtime.block_on(async move {
            let open = tokio::task::spawn_blocking(move || SerialStream::open(&builder));
            match tokio::time::timeout(connect_timeout, open).await {
                Ok(Ok(result)) => result.map_err(|err| open_error(err, &port_name)),
                Ok(Err(join_err)) => Err(TransportError::Other(join_err.to_string())),
                Err(_) => Err(TransportError::Timeout(format!(
                    "opening {} took longer than {} ms",
                    port_name,
                    connect_timeout.as_millis()
                ))),
            }
        });
        let stream = match opened {
            Ok(stream) => stream,
            Err(err) => {
                // A timed-out open may still be blocked in the OS; don't wait for it
                runtime.shutdown_background();
                return Err(err);
            }
        };

        let context = rtu::attach_slave(stream, Slave(self.settings.unit_id));
        tracing::debug!(
            "Opened {} at {} baud (unit {})",
            self.settings.port,
            self.settings.baud_rate,
            self.settings.unit_id
        );

        self.runtime = Some(runtime);
        self.context = Some(context);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        let context = self.context.take();
        let runtime = self.runtime.take();

        match (runtime, context) {
            (Some(runtime), Some(mut context)) => {
                let timeout = self.settings.read_timeout;
                let result = runtime.block_on(async move {
                    tokio::time::timeout(timeout, context.disconnect()).await
                });
                match result {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(TransportError::from(e)),
                    Err(_) => Err(TransportError::Timeout("close timed out".to_string())),
                }
            }
            _ => Ok(()),
        }
    }

    fn is_open(&self) -> bool {
        self.context.is_some()
    }

    fn read_holding_registers(
        &mut self,
        offset: u16,
        count: u16,
    ) -> Result<Vec<u16>, TransportError> {
        let (Some(runtime), Some(context)) = (self.runtime.as_ref(), self.context.as_mut()) else {
            return Err(TransportError::Io("port is not open".to_string()));
        };

        let timeout = self.settings.read_timeout;
        let result = runtime.block_on(async {
            tokio::time::timeout(timeout, context.read_holding_registers(offset, count)).await
        });

        match result {
            Ok(Ok(Ok(registers))) => Ok(registers),
            Ok(Ok(Err(exception))) => Err(TransportError::Other(format!(
                "Modbus exception: {:?}",
                exception
            ))),
            Ok(Err(err)) => Err(TransportError::from(err)),
            Err(_) => Err(TransportError::Timeout(format!(
                "no response from unit {} within {} ms",
                self.settings.unit_id,
                timeout.as_millis()
            ))),
        }
    }
}

/// Map a failed open, telling a busy port apart from a missing one
///
/// A `NoDevice` error for a port the system still lists means the port
/// exists but someone else holds it.
fn open_error(err: tokio_serial::Error, port: &str) -> TransportError {
    if err.kind() == tokio_serial::ErrorKind::NoDevice && list_ports().iter().any(|p| p == port) {
        return TransportError::AccessDenied(err.description);
    }
    TransportError::from(err)
}

impl Drop for RtuTransport {
    fn drop(&mut self) {
        if self.context.is_some() {
            let _ = self.close();
        }
    }
}

/// Factory producing [`RtuTransport`] handles
#[derive(Debug, Clone, Copy, Default)]
pub struct RtuTransportFactory;

impl TransportFactory for RtuTransportFactory {
    fn create(&self, settings: &SerialSettings) -> Box<dyn ModbusTransport> {
        Box::new(RtuTransport::new(settings.clone()))
    }
}

/// List serial ports available on this machine, sorted by name
pub fn list_ports() -> Vec<String> {
    match tokio_serial::available_ports() {
        Ok(ports) => {
            let mut names: Vec<String> = ports.into_iter().map(|p| p.port_name).collect();
            names.sort();
            names
        }
        Err(e) => {
            tracing::warn!("Serial port enumeration failed: {}", e);
            Vec::new()
        }
    }
}
