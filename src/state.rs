use std::path::PathBuf;

use eframe::egui::Color32;

use hi_observe::{
    Cube, Extraction, ExtractionStrategy, Extractor, Location, LogSink, ObserveConfig,
    SpectrumStats, HI_REST_FREQUENCY_MHZ,
};

use crate::color::trace_color;

// ---------------------------------------------------------------------------
// Plotted spectra
// ---------------------------------------------------------------------------

/// One extracted spectrum on the plot.
pub struct Trace {
    pub label: String,
    pub extraction: Extraction,
    pub stats: SpectrumStats,
    pub color: Color32,
    pub visible: bool,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full viewer state, independent of rendering.
pub struct AppState {
    /// Loaded cube (None until the user opens one).
    pub cube: Option<Cube>,
    pub cube_path: Option<PathBuf>,

    pub config: ObserveConfig,

    /// Spectra extracted so far, in extraction order.
    pub traces: Vec<Trace>,

    /// Position typed into the side panel, same grammar as the command line.
    pub location_input: String,

    /// Neighbourhood averaging toggle and its width in pixels.
    pub use_neighborhood: bool,
    pub neighborhood_b: f64,

    /// Draw the zero-brightness line.
    pub show_baseline: bool,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    next_color: usize,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ObserveConfig::default())
    }
}

impl AppState {
    pub fn new(config: ObserveConfig) -> Self {
        let (use_neighborhood, neighborhood_b) = match config.strategy {
            ExtractionStrategy::SinglePixel => (false, 1.0),
            ExtractionStrategy::WeightedNeighborhood { b } => (true, b),
        };
        Self {
            cube: None,
            cube_path: None,
            config,
            traces: Vec::new(),
            location_input: String::new(),
            use_neighborhood,
            neighborhood_b,
            show_baseline: true,
            status_message: None,
            next_color: 0,
        }
    }

    /// State for a viewer opened on an extraction already made from the command line.
    pub fn with_cube(
        cube: Cube,
        path: PathBuf,
        config: ObserveConfig,
        label: String,
        extraction: Extraction,
    ) -> Self {
        let mut state = Self::new(config);
        state.set_cube(cube, path);
        state.location_input = label.clone();
        state.add_extraction(label, extraction);
        state
    }

    /// Ingest a newly loaded cube; spectra of the previous cube are dropped.
    pub fn set_cube(&mut self, cube: Cube, path: PathBuf) {
        self.cube = Some(cube);
        self.cube_path = Some(path);
        self.traces.clear();
        self.next_color = 0;
        self.status_message = None;
    }

    pub fn strategy(&self) -> ExtractionStrategy {
        if self.use_neighborhood {
            ExtractionStrategy::WeightedNeighborhood {
                b: self.neighborhood_b,
            }
        } else {
            ExtractionStrategy::SinglePixel
        }
    }

    /// Rest frequency used when exporting: configuration first, then the cube header.
    pub fn rest_frequency_mhz(&self) -> f64 {
        self.config
            .rest_frequency_mhz
            .or_else(|| self.cube.as_ref().map(|c| c.header().rest_frequency_mhz()))
            .unwrap_or(HI_REST_FREQUENCY_MHZ)
    }

    /// Parse `location_input` and extract its spectrum from the loaded cube.
    pub fn extract_input(&mut self) {
        let Some(cube) = &self.cube else {
            self.status_message = Some("No cube loaded".to_string());
            return;
        };
        let location = match Location::parse_line(&self.location_input) {
            Ok(location) => location,
            Err(e) => {
                self.status_message = Some(format!("Bad position: {e}"));
                return;
            }
        };

        let sink = LogSink;
        let extractor = Extractor::new(self.strategy()).with_log(&sink);
        match extractor.extract(&location, cube) {
            Ok(extraction) => {
                log::info!(
                    "Extracted {} channels at pixel ({}, {})",
                    extraction.spectrum.len(),
                    extraction.pixel.x,
                    extraction.pixel.y
                );
                let label = format!("{location} ({})", extractor.strategy());
                self.add_extraction(label, extraction);
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Extraction failed: {e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    pub fn add_extraction(&mut self, label: String, extraction: Extraction) {
        let stats = SpectrumStats::compute(&extraction.spectrum);
        let color = trace_color(self.next_color);
        self.next_color += 1;
        self.traces.push(Trace {
            label,
            extraction,
            stats,
            color,
            visible: true,
        });
    }

    pub fn remove_trace(&mut self, index: usize) {
        if index < self.traces.len() {
            self.traces.remove(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hi_observe::{AxisCalibration, CubeHeader, WcsModel};
    use ndarray::{ArrayD, IxDyn};

    fn cube() -> Cube {
        let wcs = WcsModel::new(
            AxisCalibration::new(1.0, 80.0, 0.5),
            AxisCalibration::new(1.0, -5.0, 0.5),
            AxisCalibration::new(1.0, -100_000.0, 1000.0),
        );
        let data = ArrayD::from_elem(IxDyn(&[8, 5, 5]), 3.0);
        Cube::new(data, wcs, CubeHeader::new()).unwrap()
    }

    #[test]
    fn strategy_follows_toggle() {
        let mut state = AppState::default();
        assert_eq!(state.strategy(), ExtractionStrategy::SinglePixel);
        state.use_neighborhood = true;
        state.neighborhood_b = 2.0;
        assert_eq!(state.strategy(), ExtractionStrategy::WeightedNeighborhood { b: 2.0 });
    }

    #[test]
    fn extract_input_adds_traces_with_distinct_colors() {
        let mut state = AppState::default();
        state.set_cube(cube(), PathBuf::from("test.fits"));

        state.location_input = "-1 -2".to_string();
        state.extract_input();
        state.location_input = "81 -4".to_string();
        state.extract_input();

        assert_eq!(state.traces.len(), 2);
        assert!(state.status_message.is_none());
        assert_ne!(state.traces[0].color, state.traces[1].color);
        assert_eq!(state.traces[0].stats.mean, 3.0);

        state.remove_trace(0);
        assert_eq!(state.traces.len(), 1);
    }

    #[test]
    fn bad_input_sets_status() {
        let mut state = AppState::default();
        state.extract_input();
        assert_eq!(state.status_message.as_deref(), Some("No cube loaded"));

        state.set_cube(cube(), PathBuf::from("test.fits"));
        state.location_input = "1 2 3".to_string();
        state.extract_input();
        assert!(state.traces.is_empty());
        assert!(state.status_message.is_some());

        state.location_input = "-9 -9".to_string();
        state.extract_input();
        assert!(state.traces.is_empty());
    }

    #[test]
    fn rest_frequency_prefers_config() {
        let mut state = AppState::default();
        assert_eq!(state.rest_frequency_mhz(), HI_REST_FREQUENCY_MHZ);
        state.config.rest_frequency_mhz = Some(1665.4018);
        assert_eq!(state.rest_frequency_mhz(), 1665.4018);
    }
}
