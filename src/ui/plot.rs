use eframe::egui::{Color32, Ui};
use egui_plot::{HLine, Legend, Line, Plot, PlotPoints};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Spectrum plot (central panel)
// ---------------------------------------------------------------------------

/// Render the extracted spectra against Doppler velocity.
pub fn spectrum_plot(ui: &mut Ui, state: &AppState) {
    if state.cube.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a cube to extract spectra  (File → Open cube…)");
        });
        return;
    }

    let [vmin, vmax] = state.config.velocity_range;

    Plot::new("spectrum_plot")
        .legend(Legend::default())
        .x_axis_label("Doppler Velocity (km/s)")
        .y_axis_label("Brightness")
        .include_x(vmin)
        .include_x(vmax)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            if state.show_baseline {
                plot_ui.hline(HLine::new(0.0).color(Color32::GRAY).width(1.0));
            }

            for trace in state.traces.iter().filter(|t| t.visible) {
                // blank channels are skipped
                let points: PlotPoints = trace
                    .extraction
                    .spectrum
                    .points()
                    .filter(|(v, y)| *v >= vmin && *v <= vmax && y.is_finite())
                    .map(|(v, y)| [v, y])
                    .collect();

                let line = Line::new(points)
                    .name(&trace.label)
                    .color(trace.color)
                    .width(1.5);

                plot_ui.line(line);
            }
        });
}
