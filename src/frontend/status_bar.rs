//! Status bar panel — bottom bar showing connection status and read statistics.

use egui::{Color32, RichText, Ui};

use crate::frontend::state::PanelState;
use crate::types::ConnectionState;

/// Render the status bar.
pub fn render_status_bar(ui: &mut Ui, state: &PanelState) {
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        // === Status indicator ===
        let status_color = match state.connection_state {
            ConnectionState::Connected => Color32::GREEN,
            ConnectionState::Connecting => Color32::YELLOW,
            ConnectionState::Disconnected => Color32::GRAY,
        };
        ui.colored_label(status_color, "●");
        ui.label(RichText::new(state.status().to_string()).small());

        ui.separator();

        let stats = &state.stats;

        ui.label(RichText::new(format!("Samples: {}", stats.successful_reads)).small());

        ui.separator();

        let error_color = if stats.failed_reads > 0 {
            Color32::LIGHT_RED
        } else {
            Color32::GRAY
        };
        ui.colored_label(
            error_color,
            RichText::new(format!("Errors: {}", stats.failed_reads)).small(),
        );

        ui.separator();

        ui.label(RichText::new(format!("Success: {:.1}%", stats.success_rate())).small());

        ui.separator();

        ui.label(RichText::new(format!("Avg: {:.1} μs", stats.avg_read_time_us())).small());

        if !state.backend_alive {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.colored_label(Color32::RED, RichText::new("Backend stopped").small());
            });
        } else if let Some(reading) = &state.last_reading {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(
                    RichText::new(format!(
                        "#{} at {}",
                        reading.sequence,
                        reading.taken_at.format("%H:%M:%S%.3f")
                    ))
                    .small(),
                );
            });
        }
    });
}
