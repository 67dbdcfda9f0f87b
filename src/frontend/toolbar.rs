//! Toolbar panel — connection, channel and sampling controls.
//!
//! Sits at the top of the window, above the value display and the chart.

use egui::{Color32, RichText, Ui};

use crate::config::SUPPORTED_BAUD_RATES;
use crate::frontend::state::{AppAction, PanelState};
use crate::types::{ConnectionState, CHANNEL_COUNT};

/// Render the main application toolbar.
///
/// Returns the actions triggered this frame.
pub fn render_toolbar(ui: &mut Ui, state: &PanelState) -> Vec<AppAction> {
    let mut actions = Vec::new();

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 6.0;
        ui.add_enabled_ui(state.backend_alive, |ui| {
            render_connection_group(ui, state, &mut actions);
            ui.separator();
            render_acquisition_group(ui, state, &mut actions);
        });
    });

    actions
}

fn render_connection_group(ui: &mut Ui, state: &PanelState, actions: &mut Vec<AppAction>) {
    let idle = state.connection_state == ConnectionState::Disconnected;

    ui.label("Port:");
    let port_text = if state.selected_port.is_empty() {
        "Select port...".to_string()
    } else {
        state.selected_port.clone()
    };
    ui.add_enabled_ui(idle && !state.mode.is_emulated(), |ui| {
        egui::ComboBox::from_id_salt("toolbar_port_selector")
            .selected_text(port_text)
            .width(120.0)
            .show_ui(ui, |ui| {
                if state.available_ports.is_empty() {
                    ui.label("No ports found");
                }
                for port in &state.available_ports {
                    if ui
                        .selectable_label(*port == state.selected_port, port)
                        .clicked()
                    {
                        actions.push(AppAction::SelectPort(port.clone()));
                    }
                }
            });

        if ui.button("Refresh").on_hover_text("Refresh port list").clicked() {
            actions.push(AppAction::RefreshPorts);
        }

        ui.label("Baud:");
        let mut baud = state.baud_rate;
        egui::ComboBox::from_id_salt("toolbar_baud_selector")
            .selected_text(baud.to_string())
            .width(80.0)
            .show_ui(ui, |ui| {
                for rate in SUPPORTED_BAUD_RATES {
                    ui.selectable_value(&mut baud, rate, rate.to_string());
                }
            });
        if baud != state.baud_rate {
            actions.push(AppAction::SetBaudRate(baud));
        }
    });

    let mut emulation = state.mode.is_emulated();
    if ui.checkbox(&mut emulation, "Emulation").changed() {
        actions.push(AppAction::SetEmulation(emulation));
    }

    match state.connection_state {
        ConnectionState::Connected => {
            ui.colored_label(Color32::GREEN, "●");
            let btn = egui::Button::new(RichText::new("Disconnect").color(Color32::WHITE))
                .fill(Color32::from_rgb(50, 120, 50));
            if ui.add(btn).clicked() {
                actions.push(AppAction::Disconnect);
            }
        }
        ConnectionState::Connecting => {
            ui.colored_label(Color32::YELLOW, "●");
            ui.add_enabled(false, egui::Button::new("Connecting..."));
        }
        ConnectionState::Disconnected => {
            ui.colored_label(Color32::GRAY, "●");
            if ui.button("Connect").clicked() {
                actions.push(AppAction::Connect);
            }
        }
    }
}

fn render_acquisition_group(ui: &mut Ui, state: &PanelState, actions: &mut Vec<AppAction>) {
    ui.label("Channel:");
    let mut channel = state.channel;
    ui.add(egui::DragValue::new(&mut channel).range(1..=CHANNEL_COUNT).prefix("AI"));
    if channel != state.channel {
        actions.push(AppAction::SetChannel(channel));
    }

    ui.separator();

    if state.sampling {
        if ui.button("⏹ Stop").clicked() {
            actions.push(AppAction::StopSampling);
        }
    } else if ui.button("▶ Start").clicked() {
        actions.push(AppAction::StartSampling);
    }

    if ui.button("Read now").clicked() {
        actions.push(AppAction::ReadNow);
    }

    if ui.button("Clear").on_hover_text("Clear the chart").clicked() {
        actions.push(AppAction::ClearHistory);
    }
}
