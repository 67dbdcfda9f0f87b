//! Frontend module for egui UI
//!
//! This module provides the operator panel using eframe/egui. It receives
//! readings from the backend through crossbeam channels and renders them
//! in real-time.
//!
//! # Main Types
//!
//! - [`PanelApp`] - Main application state implementing [`eframe::App`]
//! - [`PanelState`] - Last backend snapshot plus operator selections
//! - [`HistoryPlot`] - History chart rendering
//!
//! # Submodules
//!
//! - `toolbar` - Port, baud, emulation, connect and sampling controls
//! - `status_bar` - Status indicator and read statistics
//! - `plot` - History chart with egui_plot
//! - `state` - View state and [`AppAction`]

mod plot;
pub mod state;
mod status_bar;
mod toolbar;

pub use plot::{history_points, HistoryPlot};
pub use state::{AppAction, ErrorDisplay, PanelState};

use crate::backend::FrontendHandle;
use crate::config::AppConfig;
use crate::types::Mode;
use egui::{Color32, RichText};
use std::time::Duration;

/// Repaint interval while the backend may push data
const REPAINT_INTERVAL: Duration = Duration::from_millis(50);

/// Main application state
pub struct PanelApp {
    frontend: FrontendHandle,
    state: PanelState,
    plot: HistoryPlot,
}

impl PanelApp {
    /// Create the app and ask the backend for the initial port list
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        frontend: FrontendHandle,
        config: AppConfig,
    ) -> Self {
        Self::with_state(frontend, PanelState::from_config(&config))
    }

    fn with_state(frontend: FrontendHandle, state: PanelState) -> Self {
        frontend.refresh_ports();
        Self {
            frontend,
            state,
            plot: HistoryPlot::default(),
        }
    }

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    /// Apply all pending backend messages, returning true if any arrived
    fn process_backend_messages(&mut self) -> bool {
        let messages = self.frontend.drain();
        let had_messages = !messages.is_empty();

        for msg in messages {
            self.state.apply(msg);
        }

        had_messages
    }

    /// Turn a widget action into state changes and backend commands
    fn handle_action(&mut self, action: AppAction) {
        match action {
            AppAction::Connect => {
                self.state.clear_error();
                self.frontend
                    .connect(self.state.selected_port.clone(), self.state.baud_rate);
            }
            AppAction::Disconnect => {
                self.state.clear_error();
                self.frontend.disconnect();
            }
            AppAction::SetEmulation(enabled) => {
                self.frontend.set_mode(Mode::from_emulation(enabled));
            }
            AppAction::SetChannel(channel) => {
                self.frontend.set_channel(channel);
            }
            AppAction::SelectPort(port) => {
                self.state.selected_port = port;
            }
            AppAction::SetBaudRate(baud) => {
                self.state.baud_rate = baud;
            }
            AppAction::StartSampling => self.frontend.start_sampling(),
            AppAction::StopSampling => self.frontend.stop_sampling(),
            AppAction::ReadNow => self.frontend.read_now(),
            AppAction::ClearHistory => self.frontend.clear_history(),
            AppAction::RefreshPorts => self.frontend.refresh_ports(),
        }
    }

    fn render_value(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(RichText::new(format!("AI{}", self.state.channel)).size(18.0));
            ui.label(
                RichText::new(self.state.value_text())
                    .monospace()
                    .size(32.0)
                    .strong(),
            );
            ui.label(RichText::new("V").size(18.0));
        });

        if let Some(error) = &self.state.error {
            ui.colored_label(Color32::LIGHT_RED, RichText::new(error.title).strong());
            ui.colored_label(Color32::RED, error.text());
        }
    }
}

impl eframe::App for PanelApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_backend_messages();

        if self.state.backend_alive {
            ctx.request_repaint_after(REPAINT_INTERVAL);
        }

        let mut actions = Vec::new();

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            actions = toolbar::render_toolbar(ui, &self.state);
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            status_bar::render_status_bar(ui, &self.state);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_value(ui);
            ui.separator();
            self.plot
                .render(ui, &self.state.history, self.state.channel);
        });

        for action in actions {
            self.handle_action(action);
        }
    }
}
