//! # Modbus AI Panel: operator panel for an 8-channel analog input module
//!
//! Reads one analog input channel of a Modbus RTU module over a serial port,
//! converts it to volts and plots a rolling history. An emulation mode
//! synthesizes a signal so the panel can be exercised without hardware.
//!
//! ## Architecture
//!
//! - **Backend**: Owns the serial transport and the acquisition loop on a
//!   worker thread
//! - **Frontend**: Renders the panel using eframe/egui with egui_plot for the chart
//! - **Communication**: Crossbeam channels for thread-safe data transfer
//!
//! Channel `n` (1..=8) is holding register `40000 + n`, read at zero-based
//! offset `n - 1`. Raw values map linearly onto 0–10 V.
//!
//! ## Configuration
//!
//! An optional `config.toml` is read at startup from the platform config
//! directory under `dev.modbus-ai-panel`; see [`config`].
//!
//! ## Example
//!
//! ```ignore
//! use modbus_ai_panel::{backend::PanelBackend, config::AppConfig, frontend::PanelApp};
//!
//! fn main() -> eframe::Result<()> {
//!     let config = AppConfig::load_or_default();
//!     let (backend, frontend) = PanelBackend::new(config.clone());
//!
//!     std::thread::spawn(move || backend.run());
//!
//!     eframe::run_native(
//!         "Modbus AI Panel",
//!         eframe::NativeOptions::default(),
//!         Box::new(|cc| Ok(Box::new(PanelApp::new(cc, frontend, config)))),
//!     )
//! }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod frontend;
pub mod types;

// Re-export commonly used types
pub use backend::{AcquisitionLoop, ConnectionManager, PanelBackend};
pub use config::AppConfig;
pub use error::{PanelError, Result};
pub use frontend::PanelApp;
pub use types::{Channel, ConnectionState, Mode, Reading};
