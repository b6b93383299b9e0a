use serde::{Deserialize, Serialize};

use super::model::SpectrumResult;

// ---------------------------------------------------------------------------
// Summary statistics of an extracted spectrum
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectrumStats {
    pub n_channels: usize,
    pub mean: f64,
    /// Population standard deviation of the intensities.
    pub rms: f64,
    /// Rectangle-rule integral: `sum(intensity) * channel_width`.
    pub integrated_flux: f64,
    pub velocity_min: f64,
    pub velocity_max: f64,
    /// Brightest channel as `(velocity, intensity)`.
    pub peak: Option<(f64, f64)>,
}

impl SpectrumStats {
    pub fn compute(spectrum: &SpectrumResult) -> Self {
        let n = spectrum.len();
        if n == 0 {
            return Self {
                n_channels: 0,
                mean: 0.0,
                rms: 0.0,
                integrated_flux: 0.0,
                velocity_min: 0.0,
                velocity_max: 0.0,
                peak: None,
            };
        }

        let sum: f64 = spectrum.intensity.iter().sum();
        let mean = sum / n as f64;
        let variance = spectrum
            .intensity
            .iter()
            .map(|&v| (v - mean).powi(2))
            .sum::<f64>()
            / n as f64;

        let velocity_min = spectrum.velocity.iter().copied().fold(f64::INFINITY, f64::min);
        let velocity_max = spectrum
            .velocity
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);

        let peak = spectrum
            .points()
            .filter(|(_, y)| !y.is_nan())
            .max_by(|a, b| a.1.total_cmp(&b.1));

        Self {
            n_channels: n,
            mean,
            rms: variance.sqrt(),
            integrated_flux: sum * spectrum.channel_width,
            velocity_min,
            velocity_max,
            peak,
        }
    }
}

impl From<&SpectrumResult> for SpectrumStats {
    fn from(spectrum: &SpectrumResult) -> Self {
        Self::compute(spectrum)
    }
}
