//! History chart using egui_plot

use egui::{Color32, Ui};
use egui_plot::{Corner, Legend, Line, Plot, PlotPoints};

use crate::backend::signal::FULL_SCALE_VOLTS;

/// Line chart of the sample history
#[derive(Debug, Clone)]
pub struct HistoryPlot {
    pub line_width: f32,
    pub color: Color32,
    pub show_grid: bool,
}

impl Default for HistoryPlot {
    fn default() -> Self {
        Self {
            line_width: 1.5,
            color: Color32::from_rgb(80, 160, 255),
            show_grid: true,
        }
    }
}

impl HistoryPlot {
    /// Render `history` as a line, x = sample index, y = volts
    pub fn render(&self, ui: &mut Ui, history: &[f64], channel: u8) {
        let plot = Plot::new("history_plot")
            .allow_zoom(true)
            .allow_drag(true)
            .show_axes(true)
            .show_grid(self.show_grid)
            .include_y(0.0)
            .include_y(FULL_SCALE_VOLTS)
            .x_axis_label("Sample")
            .y_axis_label("Volts")
            .legend(Legend::default().position(Corner::RightTop));

        plot.show(ui, |plot_ui| {
            if history.is_empty() {
                return;
            }

            let points = PlotPoints::from(history_points(history));
            let line = Line::new(format!("AI{}", channel), points)
                .color(self.color)
                .width(self.line_width);

            plot_ui.line(line);
        });
    }
}

/// Pair each value with its position in the history
pub fn history_points(history: &[f64]) -> Vec<[f64; 2]> {
    history
        .iter()
        .enumerate()
        .map(|(i, v)| [i as f64, *v])
        .collect()
}
