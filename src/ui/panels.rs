use std::path::PathBuf;

use eframe::egui::{self, Color32, DragValue, RichText, ScrollArea, Ui};

use hi_observe::{load_cube, save_spectrum};

use crate::color::label_color;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – position entry, strategy and traces
// ---------------------------------------------------------------------------

/// Render the left extraction panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Position");
    ui.separator();

    if state.cube.is_none() {
        ui.label("No cube loaded.");
        return;
    }

    ui.label("GLON GLAT  |  -X -Y  |  RAH RAM RAS DEC");
    let response = ui.text_edit_singleline(&mut state.location_input);
    let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
    if ui.button("Extract").clicked() || submitted {
        state.extract_input();
    }

    ui.add_space(4.0);
    ui.checkbox(&mut state.use_neighborhood, "3x3 weighted neighbourhood");
    ui.add_enabled_ui(state.use_neighborhood, |ui: &mut Ui| {
        ui.horizontal(|ui: &mut Ui| {
            ui.label("b (pixels)");
            ui.add(
                DragValue::new(&mut state.neighborhood_b)
                    .speed(0.05)
                    .range(0.1..=10.0),
            );
        });
    });

    ui.separator();
    ui.strong("Velocity range (km/s)");
    ui.horizontal(|ui: &mut Ui| {
        let [lo, hi] = &mut state.config.velocity_range;
        ui.add(DragValue::new(lo).speed(1.0));
        ui.label("to");
        ui.add(DragValue::new(hi).speed(1.0));
        if *lo >= *hi {
            *hi = *lo + 1.0;
        }
    });

    ui.separator();
    ui.strong(format!("Spectra ({})", state.traces.len()));

    let mut remove = None;
    let mut export = None;
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (i, trace) in state.traces.iter_mut().enumerate() {
                let text = RichText::new(&trace.label).color(label_color(trace.color, trace.visible));
                egui::CollapsingHeader::new(text)
                    .id_salt(i)
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        let s = &trace.stats;
                        let px = trace.extraction.pixel;
                        let gal = trace.extraction.galactic;
                        ui.label(format!("Pixel: {} {}", px.x, px.y));
                        ui.label(format!("GLON/GLAT: {:.4} {:.4}", gal.lon_degrees, gal.lat_degrees));
                        ui.label(format!(
                            "MinMax in velocities: {:.2} {:.2}",
                            s.velocity_min, s.velocity_max
                        ));
                        ui.label(format!("Total flux: {:.4}", s.integrated_flux));
                        ui.label(format!(
                            "Mean and RMS of {} points: {:.4} {:.4}",
                            s.n_channels, s.mean, s.rms
                        ));
                        if let Some((v, peak)) = s.peak {
                            ui.label(format!("Peak: {peak:.4} at {v:.2} km/s"));
                        }
                        ui.horizontal(|ui: &mut Ui| {
                            ui.checkbox(&mut trace.visible, "Show");
                            if ui.small_button("Export…").clicked() {
                                export = Some(i);
                            }
                            if ui.small_button("Remove").clicked() {
                                remove = Some(i);
                            }
                        });
                    });
            }
        });

    if let Some(i) = export {
        export_dialog(state, i);
    }
    if let Some(i) = remove {
        state.remove_trace(i);
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open cube…").clicked() {
                open_cube_dialog(state);
                ui.close_menu();
            }
            let last = state.traces.len().checked_sub(1);
            if ui
                .add_enabled(last.is_some(), egui::Button::new("Export spectrum…"))
                .clicked()
            {
                if let Some(i) = last {
                    export_dialog(state, i);
                }
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(cube), Some(path)) = (&state.cube, &state.cube_path) {
            let (n_vel, height, width) = cube.shape();
            ui.label(format!(
                "{}  {width}×{height} pixels, {n_vel} channels",
                path.display()
            ));
        }

        ui.separator();

        if ui
            .selectable_label(state.show_baseline, "Baseline")
            .clicked()
        {
            state.show_baseline = !state.show_baseline;
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_cube_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open data cube")
        .add_filter("Supported files", &["fits", "fit", "fts", "json"])
        .add_filter("FITS", &["fits", "fit", "fts"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        match load_cube(&path) {
            Ok(cube) => {
                log::info!("Loaded cube {} with shape {:?}", path.display(), cube.shape());
                state.set_cube(cube, path);
            }
            Err(e) => {
                log::error!("Failed to load cube: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

pub fn export_dialog(state: &mut AppState, index: usize) {
    let Some(trace) = state.traces.get(index) else {
        return;
    };
    let file: Option<PathBuf> = rfd::FileDialog::new()
        .set_title("Export spectrum")
        .set_file_name("spectrum.csv")
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .save_file();

    if let Some(path) = file {
        match save_spectrum(&path, &trace.extraction, state.rest_frequency_mhz()) {
            Ok(()) => {
                log::info!("Exported {} to {}", trace.label, path.display());
                state.status_message = None;
            }
            Err(e) => {
                log::error!("Failed to export spectrum: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
